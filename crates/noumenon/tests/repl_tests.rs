//! Behavior of `ReplSession`, the persistent line-at-a-time session used by
//! interactive mode. Lines need no trailing semicolon (the session injects
//! the driver's semicolons) and only `return` surfaces a value.

use noumenon::{CollectPrint, NoPrint, Object, ReplSession};
use pretty_assertions::assert_eq;

/// A fresh session has no user variables.
#[test]
fn fresh_session_has_no_variables() {
    let session = ReplSession::new();
    assert!(session.list_variables().is_empty());
}

/// A plain statement produces no value.
#[test]
fn statements_produce_no_value() {
    let mut session = ReplSession::new();
    let result = session.execute("var x = 42", &mut NoPrint).unwrap();
    assert_eq!(result, None);
}

/// A `return` line surfaces its value.
#[test]
fn return_surfaces_a_value() {
    let mut session = ReplSession::new();
    let result = session.execute("return 1 + 2", &mut NoPrint).unwrap();
    assert_eq!(result, Some(Object::Int(3)));
}

/// Variables persist across lines.
#[test]
fn state_persists_across_lines() {
    let mut session = ReplSession::new();
    session.execute("var x = 41", &mut NoPrint).unwrap();
    let result = session.execute("return x + 1", &mut NoPrint).unwrap();
    assert_eq!(result, Some(Object::Int(42)));
}

/// Functions defined on one line are callable on the next.
#[test]
fn functions_persist_across_lines() {
    let mut session = ReplSession::new();
    session
        .execute("var twice = function(n) { return n * 2; }", &mut NoPrint)
        .unwrap();
    let result = session.execute("return twice(21)", &mut NoPrint).unwrap();
    assert_eq!(result, Some(Object::Int(42)));
}

/// A parse error leaves the session usable and its variables intact.
#[test]
fn parse_errors_do_not_poison_the_session() {
    let mut session = ReplSession::new();
    session.execute("var x = 7", &mut NoPrint).unwrap();

    let error = session.execute("var = 1", &mut NoPrint).unwrap_err();
    assert!(error.message().contains("unexpected token"));

    let result = session.execute("return x", &mut NoPrint).unwrap();
    assert_eq!(result, Some(Object::Int(7)));
}

/// Print output goes to the supplied writer.
#[test]
fn print_output_is_captured() {
    let mut session = ReplSession::new();
    let mut out = CollectPrint::new();
    let result = session.execute("println(\"hi\")", &mut out).unwrap();
    assert_eq!(result, None);
    assert_eq!(out.output(), "hi\n");
}

/// Diagnostics go to the stderr channel and honor the quiet flag.
#[test]
fn diagnostics_honor_the_quiet_flag() {
    let mut session = ReplSession::new();
    let mut out = CollectPrint::new();
    session.execute("y = 1", &mut out).unwrap();
    assert_eq!(out.diagnostics(), "no such variable: \"y\"\n");

    let mut quiet_session = ReplSession::new().quiet(true);
    let mut out = CollectPrint::new();
    quiet_session.execute("y = 1", &mut out).unwrap();
    assert_eq!(out.diagnostics(), "");
}

/// `list_variables` reports bindings in declaration order with their
/// printed form.
#[test]
fn list_variables_reports_bindings() {
    let mut session = ReplSession::new();
    session.execute("var x = 41", &mut NoPrint).unwrap();
    session.execute("var s = \"hi\"", &mut NoPrint).unwrap();
    assert_eq!(
        session.list_variables(),
        vec![
            ("x".to_owned(), "41".to_owned()),
            ("s".to_owned(), "hi".to_owned()),
        ]
    );
}

/// Multiple statements on one line run in order.
#[test]
fn multiple_statements_per_line() {
    let mut session = ReplSession::new();
    let result = session
        .execute("var a = 1; var b = 2; return a + b;", &mut NoPrint)
        .unwrap();
    assert_eq!(result, Some(Object::Int(3)));
}
