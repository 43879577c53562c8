//! Declared callable signatures and their inspection.

use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Errors found while inspecting a declared signature.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("failed to parse signature JSON: {0}")]
    Json(String),

    #[error("invalid parameter name '{0}': must be non-empty ASCII alphanumerics or '_'")]
    InvalidName(String),

    #[error("duplicate parameter name: {0}")]
    DuplicateParam(String),

    #[error("required parameter '{0}' follows a parameter with a default")]
    RequiredAfterDefault(String),

    #[error("parameter '{0}' sets both a default and the bool marker")]
    ConflictingDefault(String),
}

impl From<serde_json::Error> for SignatureError {
    fn from(err: serde_json::Error) -> Self {
        SignatureError::Json(err.to_string())
    }
}

/// A value handed to a target, either parsed from a token or declared as a default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value; also pads missing positionals.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    /// The text content, if this is a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean content, if this is a `Bool` value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

/// The default declared for an optional parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamDefault {
    /// A concrete default value.
    Value(Value),
    /// The boolean type itself: a toggle that is `false` when absent.
    BoolType,
}

impl ParamDefault {
    /// Whether this default turns the parameter into a toggle flag.
    pub fn is_toggle(&self) -> bool {
        matches!(self, ParamDefault::BoolType | ParamDefault::Value(Value::Bool(_)))
    }

    /// The value a parameter resolves to when its flag is absent.
    pub fn absent_value(&self) -> Value {
        match self {
            ParamDefault::Value(v) => v.clone(),
            ParamDefault::BoolType => Value::Bool(false),
        }
    }
}

/// Whether the callable is a plain function or a constructor with a receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallableKind {
    #[default]
    Function,
    /// The first declared parameter is the instance receiver and is skipped.
    Constructor,
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawParam")]
pub struct Param {
    pub name: String,
    pub default: Option<ParamDefault>,
}

impl Param {
    /// A parameter without a default.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    /// A parameter with a default value.
    pub fn optional(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: Some(ParamDefault::Value(default.into())),
        }
    }

    /// A parameter defaulting to the boolean type marker.
    pub fn toggle(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: Some(ParamDefault::BoolType),
        }
    }
}

/// JSON shape of a parameter. `"default": null` is a declared null default,
/// which is why presence is tracked separately from the value.
#[derive(Deserialize)]
struct RawParam {
    name: String,
    #[serde(default, deserialize_with = "present")]
    default: Option<Value>,
    #[serde(default)]
    toggle: bool,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl TryFrom<RawParam> for Param {
    type Error = SignatureError;

    fn try_from(raw: RawParam) -> Result<Self, Self::Error> {
        let default = match (raw.default, raw.toggle) {
            (Some(_), true) => return Err(SignatureError::ConflictingDefault(raw.name)),
            (Some(value), false) => Some(ParamDefault::Value(value)),
            (None, true) => Some(ParamDefault::BoolType),
            (None, false) => None,
        };
        Ok(Param {
            name: raw.name,
            default,
        })
    }
}

/// Declarative description of a callable, published by each target.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Signature {
    /// Name used for routing, metadata lookup and error prefixes
    pub name: String,
    /// Documentation; doubles as the usage text
    #[serde(default)]
    pub doc: Option<String>,
    /// Parameters in declaration order
    #[serde(default)]
    pub params: Vec<Param>,
    /// Whether trailing positionals are captured
    #[serde(default)]
    pub variadic: bool,
    #[serde(default)]
    pub kind: CallableKind,
}

impl Signature {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            params: Vec::new(),
            variadic: false,
            kind: CallableKind::Function,
        }
    }

    /// Parse a JSON descriptor into a Signature.
    pub fn from_json(json: &str) -> Result<Signature, SignatureError> {
        let signature: Signature = serde_json::from_str(json)?;
        Ok(signature)
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }

    pub fn constructor(mut self) -> Self {
        self.kind = CallableKind::Constructor;
        self
    }
}

/// How an inspected parameter is exposed on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    RequiredPositional,
    ValueFlag,
    ToggleFlag,
}

/// An inspected parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub name: String,
    /// Zero-based position after the receiver is skipped
    pub position: usize,
    pub default: Option<ParamDefault>,
    pub kind: ParamKind,
}

/// The result of inspecting a declared signature.
#[derive(Debug, Clone, PartialEq)]
pub struct CallableSignature {
    pub name: String,
    pub doc: Option<String>,
    pub params: Vec<ParameterDescriptor>,
    pub variadic: bool,
}

impl CallableSignature {
    /// Names of the required parameters, in order.
    pub fn required(&self) -> Vec<String> {
        self.params
            .iter()
            .filter(|p| p.kind == ParamKind::RequiredPositional)
            .map(|p| p.name.clone())
            .collect()
    }

    /// The parameters that carry a default, in order.
    pub fn optional(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.params
            .iter()
            .filter(|p| p.kind != ParamKind::RequiredPositional)
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split a declared signature into required positionals and optional flags.
pub fn inspect(signature: &Signature) -> Result<CallableSignature, SignatureError> {
    let skip = match signature.kind {
        CallableKind::Constructor => 1,
        CallableKind::Function => 0,
    };

    let mut seen = HashSet::new();
    let mut saw_default = false;
    let mut params = Vec::with_capacity(signature.params.len());

    for (position, param) in signature.params.iter().skip(skip).enumerate() {
        if !is_valid_name(&param.name) {
            return Err(SignatureError::InvalidName(param.name.clone()));
        }
        if !seen.insert(param.name.as_str()) {
            return Err(SignatureError::DuplicateParam(param.name.clone()));
        }

        let kind = match &param.default {
            None if saw_default => {
                return Err(SignatureError::RequiredAfterDefault(param.name.clone()))
            }
            None => ParamKind::RequiredPositional,
            Some(default) => {
                saw_default = true;
                if default.is_toggle() {
                    ParamKind::ToggleFlag
                } else {
                    ParamKind::ValueFlag
                }
            }
        };

        params.push(ParameterDescriptor {
            name: param.name.clone(),
            position,
            default: param.default.clone(),
            kind,
        });
    }

    Ok(CallableSignature {
        name: signature.name.clone(),
        doc: signature.doc.clone(),
        params,
        variadic: signature.variadic,
    })
}
