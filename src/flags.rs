//! Short and long flag name allocation for optional parameters.

use crate::signature::{CallableSignature, ParamKind, Value};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Short name reserved for the built-in help flag.
pub const HELP_SHORT: char = 'h';
/// Long name reserved for the built-in help flag.
pub const HELP_LONG: &str = "help";

/// Errors that can occur while allocating flag names.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AllocationError {
    #[error("no free short name for parameter '{0}': every character is already taken")]
    ShortNamesExhausted(String),

    #[error("short name '-{short}' requested by parameter '{param}' is already taken")]
    ShortTaken { param: String, short: char },

    #[error("long name '--{long}' for parameter '{param}' is already taken")]
    LongTaken { param: String, long: String },

    #[error("parameter '{0}' leaves an empty long name after its short prefix")]
    EmptyLongName(String),

    #[error("long name '--{long}' for parameter '{param}' starts with a hyphen")]
    LeadingHyphen { param: String, long: String },
}

/// Whether a flag carries a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    /// Presence sets `true`; never consumes a following token
    Toggle,
    /// Takes exactly one value
    Value,
}

/// The allocated names of one optional parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagName {
    pub short: char,
    pub long: String,
    /// Key the parser stores the value under
    pub dest: String,
    /// The parameter this flag belongs to
    pub param: String,
    pub kind: FlagKind,
    /// Value used when the flag is absent
    pub default: Value,
}

/// All flags of one parser, plus the table restoring true parameter names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagSet {
    pub flags: Vec<FlagName>,
    /// dest -> parameter name, for parameters using the short-prefix convention
    pub renames: HashMap<String, String>,
}

impl FlagSet {
    /// The parameter name a stored value belongs to.
    pub fn param_for<'a>(&'a self, dest: &'a str) -> &'a str {
        self.renames.get(dest).map(String::as_str).unwrap_or(dest)
    }
}

/// Split `x_rest` into `('x', "rest")` when the name follows the short-prefix convention.
fn split_short_prefix(name: &str) -> Option<(char, &str)> {
    let mut chars = name.chars();
    let first = chars.next()?;
    if first.is_ascii_alphanumeric() && chars.next() == Some('_') {
        Some((first, &name[2..]))
    } else {
        None
    }
}

/// Allocate short and long names for every optional parameter, in declaration order.
pub fn allocate(signature: &CallableSignature) -> Result<FlagSet, AllocationError> {
    let mut shorts: HashSet<char> = HashSet::from([HELP_SHORT]);
    let mut longs: HashSet<String> = HashSet::from([HELP_LONG.to_string()]);
    let mut set = FlagSet::default();

    for param in signature.optional() {
        let name = param.name.as_str();

        let (short, dest) = match split_short_prefix(name) {
            Some((short, rest)) => {
                if rest.is_empty() {
                    return Err(AllocationError::EmptyLongName(name.to_string()));
                }
                if shorts.contains(&short) {
                    return Err(AllocationError::ShortTaken {
                        param: name.to_string(),
                        short,
                    });
                }
                set.renames.insert(rest.to_string(), name.to_string());
                (short, rest)
            }
            None => {
                let short = name
                    .chars()
                    .find(|c| !shorts.contains(c))
                    .ok_or_else(|| AllocationError::ShortNamesExhausted(name.to_string()))?;
                (short, name)
            }
        };

        let long = dest.replace('_', "-");
        if long.starts_with('-') {
            return Err(AllocationError::LeadingHyphen {
                param: name.to_string(),
                long,
            });
        }
        if !longs.insert(long.clone()) {
            return Err(AllocationError::LongTaken {
                param: name.to_string(),
                long,
            });
        }
        shorts.insert(short);

        let kind = match param.kind {
            ParamKind::ToggleFlag => FlagKind::Toggle,
            _ => FlagKind::Value,
        };
        let default = param
            .default
            .as_ref()
            .map(|d| d.absent_value())
            .unwrap_or(Value::Null);

        set.flags.push(FlagName {
            short,
            long,
            dest: dest.to_string(),
            param: name.to_string(),
            kind,
            default,
        });
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::{inspect, Param, Signature};

    fn allocate_for(params: Vec<Param>) -> Result<FlagSet, AllocationError> {
        let sig = params
            .into_iter()
            .fold(Signature::new("test"), |sig, p| sig.param(p));
        allocate(&inspect(&sig).unwrap())
    }

    fn shorts(set: &FlagSet) -> Vec<(String, char)> {
        set.flags.iter().map(|f| (f.param.clone(), f.short)).collect()
    }

    #[test]
    fn test_first_letter_is_short() {
        let set = allocate_for(vec![Param::optional("verbose", false)]).unwrap();
        let flag = &set.flags[0];
        assert_eq!(flag.short, 'v');
        assert_eq!(flag.long, "verbose");
        assert_eq!(flag.kind, FlagKind::Toggle);
        assert_eq!(flag.default, Value::Bool(false));
        assert!(set.renames.is_empty());
    }

    #[test]
    fn test_shared_leading_char_gets_distinct_shorts() {
        let set = allocate_for(vec![
            Param::optional("verbose", false),
            Param::optional("version", "1"),
        ])
        .unwrap();
        assert_eq!(
            shorts(&set),
            vec![("verbose".to_string(), 'v'), ("version".to_string(), 'e')]
        );
    }

    #[test]
    fn test_allocation_is_deterministic() {
        let params = || {
            vec![
                Param::optional("alpha", 1i64),
                Param::optional("all", false),
                Param::optional("also", "x"),
            ]
        };
        let first = allocate_for(params()).unwrap();
        let second = allocate_for(params()).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            shorts(&first),
            vec![
                ("alpha".to_string(), 'a'),
                ("all".to_string(), 'l'),
                ("also".to_string(), 's')
            ]
        );
    }

    #[test]
    fn test_help_short_is_reserved() {
        let set = allocate_for(vec![Param::optional("host", "localhost")]).unwrap();
        assert_eq!(set.flags[0].short, 'o');
        assert_eq!(set.flags[0].long, "host");
    }

    #[test]
    fn test_underscores_become_hyphens() {
        let set = allocate_for(vec![Param::optional("dry_run", false)]).unwrap();
        assert_eq!(set.flags[0].long, "dry-run");
        assert_eq!(set.flags[0].dest, "dry_run");
    }

    #[test]
    fn test_short_prefix_convention() {
        let set = allocate_for(vec![Param::optional("x_verbose", false)]).unwrap();
        let flag = &set.flags[0];
        assert_eq!(flag.short, 'x');
        assert_eq!(flag.long, "verbose");
        assert_eq!(flag.dest, "verbose");
        assert_eq!(flag.param, "x_verbose");
        assert_eq!(set.param_for("verbose"), "x_verbose");
        assert_eq!(set.param_for("other"), "other");
    }

    #[test]
    fn test_short_prefix_claims_before_scan() {
        let set = allocate_for(vec![
            Param::optional("v_loud", false),
            Param::optional("verbose", false),
        ])
        .unwrap();
        assert_eq!(
            shorts(&set),
            vec![("v_loud".to_string(), 'v'), ("verbose".to_string(), 'e')]
        );
    }

    #[test]
    fn test_value_flag_keeps_declared_default() {
        let set = allocate_for(vec![
            Param::optional("limit", 10i64),
            Param::optional("label", Value::Null),
        ])
        .unwrap();
        assert_eq!(set.flags[0].kind, FlagKind::Value);
        assert_eq!(set.flags[0].default, Value::Int(10));
        assert_eq!(set.flags[1].default, Value::Null);
    }

    #[test]
    fn test_true_default_is_toggle() {
        let set = allocate_for(vec![Param::optional("color", true)]).unwrap();
        assert_eq!(set.flags[0].kind, FlagKind::Toggle);
        assert_eq!(set.flags[0].default, Value::Bool(true));
    }

    #[test]
    fn test_error_short_names_exhausted() {
        let result = allocate_for(vec![
            Param::optional("ab", false),
            Param::optional("ba", false),
            Param::optional("abba", false),
        ]);
        assert_eq!(
            result,
            Err(AllocationError::ShortNamesExhausted("abba".to_string()))
        );
    }

    #[test]
    fn test_error_only_help_char() {
        let result = allocate_for(vec![Param::optional("h", false)]);
        assert!(matches!(
            result,
            Err(AllocationError::ShortNamesExhausted(_))
        ));
    }

    #[test]
    fn test_error_forced_short_taken() {
        let result = allocate_for(vec![
            Param::optional("verbose", false),
            Param::optional("v_quiet", false),
        ]);
        assert_eq!(
            result,
            Err(AllocationError::ShortTaken {
                param: "v_quiet".to_string(),
                short: 'v'
            })
        );
    }

    #[test]
    fn test_error_forced_help_short() {
        let result = allocate_for(vec![Param::optional("h_host", "x")]);
        assert!(matches!(result, Err(AllocationError::ShortTaken { .. })));
    }

    #[test]
    fn test_error_duplicate_long() {
        let result = allocate_for(vec![
            Param::optional("verbose", false),
            Param::optional("x_verbose", false),
        ]);
        assert_eq!(
            result,
            Err(AllocationError::LongTaken {
                param: "x_verbose".to_string(),
                long: "verbose".to_string()
            })
        );
    }

    #[test]
    fn test_error_help_long_reserved() {
        let result = allocate_for(vec![Param::optional("help", false)]);
        assert!(matches!(result, Err(AllocationError::LongTaken { .. })));
    }

    #[test]
    fn test_error_empty_long() {
        let result = allocate_for(vec![Param::optional("x_", false)]);
        assert_eq!(result, Err(AllocationError::EmptyLongName("x_".to_string())));
    }

    #[test]
    fn test_error_leading_underscore() {
        let result = allocate_for(vec![Param::optional("_private", false)]);
        assert_eq!(
            result,
            Err(AllocationError::LeadingHyphen {
                param: "_private".to_string(),
                long: "-private".to_string()
            })
        );
    }

    #[test]
    fn test_error_double_underscore_after_prefix() {
        let result = allocate_for(vec![Param::optional("x__y", "1")]);
        assert_eq!(
            result,
            Err(AllocationError::LeadingHyphen {
                param: "x__y".to_string(),
                long: "-y".to_string()
            })
        );
    }

    #[test]
    fn test_inner_double_underscore_is_allowed() {
        let set = allocate_for(vec![Param::optional("dry__run", false)]).unwrap();
        assert_eq!(set.flags[0].long, "dry--run");
    }
}
