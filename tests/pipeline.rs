//! End-to-end runs through the public API.

use sigopt::{
    command, Command, Invocation, Outcome, Param, Registry, Runner, Signature, Target, Value,
};
use std::cell::RefCell;
use std::rc::Rc;

type Calls = Rc<RefCell<Vec<Invocation>>>;

fn recorder(signature: Signature, calls: &Calls) -> impl Command {
    let calls = calls.clone();
    command(signature, move |invocation, _| {
        calls.borrow_mut().push(invocation);
        Ok(Value::Null)
    })
}

fn run(registry: &Registry, target: Target<'_>, input: &[&str]) -> (Outcome, String) {
    let mut runner = Runner::new(Vec::new(), Vec::new()).prog("prog");
    let tokens = input.iter().map(|s| s.to_string()).collect();
    let outcome = runner.run(registry, target, Some(tokens));
    let (_, err) = runner.into_parts();
    (outcome, String::from_utf8(err).unwrap())
}

fn file_command(name: &str) -> Signature {
    Signature::new(name)
        .param(Param::required("filename"))
        .param(Param::optional("verbose", false))
}

#[test]
fn test_required_only_dispatches_in_order() {
    let calls = Calls::default();
    let mut registry = Registry::new();
    let sig = Signature::new("join")
        .param(Param::required("a"))
        .param(Param::required("b"))
        .param(Param::required("c"));
    registry.register(recorder(sig, &calls)).unwrap();

    let (outcome, err) = run(&registry, Target::Command("join"), &["1", "2", "3"]);

    assert_eq!(outcome, Outcome::Completed(Value::Null));
    assert!(err.is_empty());
    assert_eq!(
        calls.borrow()[0].positional,
        vec![Value::from("1"), Value::from("2"), Value::from("3")]
    );
}

#[test]
fn test_too_few_is_one_error_and_no_call() {
    let calls = Calls::default();
    let mut registry = Registry::new();
    registry
        .register(recorder(file_command("upper"), &calls))
        .unwrap();

    let (outcome, err) = run(&registry, Target::Command("upper"), &[]);

    assert_eq!(outcome, Outcome::Rejected);
    assert_eq!(err.lines().count(), 1);
    assert_eq!(err, "Required 1 arguments, got 0\n");
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_not_strict_command_is_called_with_padding() {
    let calls = Calls::default();
    let mut registry = Registry::new();
    registry
        .register(recorder(file_command("upper"), &calls))
        .unwrap()
        .not_strict();

    let (outcome, _) = run(&registry, Target::Command("upper"), &[]);

    assert_eq!(outcome, Outcome::Completed(Value::Null));
    assert_eq!(calls.borrow()[0].positional, vec![Value::Null]);
}

#[test]
fn test_toggle_flag_states() {
    let calls = Calls::default();
    let mut registry = Registry::new();
    registry
        .register(recorder(file_command("upper"), &calls))
        .unwrap();

    run(&registry, Target::Command("upper"), &["f.txt"]);
    run(&registry, Target::Command("upper"), &["--verbose", "f.txt"]);

    let calls = calls.borrow();
    assert_eq!(calls[0].keyword("verbose"), &Value::Bool(false));
    assert_eq!(calls[1].keyword("verbose"), &Value::Bool(true));
    assert_eq!(calls[1].positional, vec![Value::from("f.txt")]);
}

#[test]
fn test_short_prefix_keyword_is_declared_name() {
    let calls = Calls::default();
    let mut registry = Registry::new();
    let sig = Signature::new("t").param(Param::optional("x_verbose", false));
    registry.register(recorder(sig, &calls)).unwrap();

    run(&registry, Target::Command("t"), &["-x"]);

    let calls = calls.borrow();
    assert!(calls[0].flag("x_verbose"));
    assert!(!calls[0].keywords.contains_key("verbose"));
}

#[test]
fn test_subcommand_routing() {
    let calls = Calls::default();
    let mut registry = Registry::new();
    registry
        .register(recorder(file_command("upper"), &calls))
        .unwrap();
    registry
        .register(recorder(file_command("lower"), &calls))
        .unwrap();

    let (outcome, err) = run(
        &registry,
        Target::Subcommands,
        &["upper", "file.txt", "--verbose"],
    );

    assert_eq!(outcome, Outcome::Completed(Value::Null));
    assert!(err.is_empty(), "stderr: {}", err);
    let calls = calls.borrow();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].positional, vec![Value::from("file.txt")]);
    assert!(calls[0].flag("verbose"));
}

#[test]
fn test_unknown_subcommand() {
    let calls = Calls::default();
    let mut registry = Registry::new();
    registry
        .register(recorder(file_command("upper"), &calls))
        .unwrap();
    registry
        .register(recorder(file_command("lower"), &calls))
        .unwrap();

    let (outcome, err) = run(&registry, Target::Subcommands, &["frobnicate", "file.txt"]);

    assert_eq!(outcome, Outcome::Rejected);
    assert!(err.contains("'upper' or 'lower'"), "stderr: {}", err);
    assert!(calls.borrow().is_empty());
}

#[test]
fn test_target_error_stays_inside_dispatcher() {
    let mut registry = Registry::new();
    registry
        .register(command(file_command("upper"), |invocation, _| {
            anyhow::bail!("cannot open {}", invocation.arg(0))
        }))
        .unwrap();

    let (outcome, err) = run(&registry, Target::Subcommands, &["upper", "missing.txt"]);

    assert_eq!(outcome, Outcome::Failed);
    assert_eq!(outcome.value(), None);
    assert_eq!(err, "upper: cannot open missing.txt\n");
}

#[test]
fn test_signature_from_json_runs() {
    let calls = Calls::default();
    let mut registry = Registry::new();
    let sig = Signature::from_json(
        r#"{"name": "fetch", "params": [
            {"name": "url"},
            {"name": "retries", "default": 3},
            {"name": "d_verbose", "toggle": true}
        ]}"#,
    )
    .unwrap();
    registry.register(recorder(sig, &calls)).unwrap();

    let (outcome, err) = run(
        &registry,
        Target::Command("fetch"),
        &["-d", "--retries", "5", "http://example.test"],
    );

    assert_eq!(outcome, Outcome::Completed(Value::Null), "stderr: {}", err);
    let calls = calls.borrow();
    assert_eq!(calls[0].arg(0), &Value::from("http://example.test"));
    assert_eq!(calls[0].keyword("retries"), &Value::from("5"));
    assert!(calls[0].flag("d_verbose"));
}
