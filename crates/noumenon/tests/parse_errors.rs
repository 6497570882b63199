//! Parse-error surfacing: positions, messages, and the degradation of
//! lexical problems into `UNKNOWN`/`EOF` tokens that the parser reports.

use noumenon::{NoPrint, ParseError, Runner};

fn parse_error(source: &str) -> ParseError {
    Runner::new(source)
        .run(&mut NoPrint)
        .expect_err("program should fail to parse")
}

#[test]
fn unexpected_token_message_names_both_tokens() {
    let error = parse_error("var x 1;");
    assert_eq!(error.message(), "unexpected token \"integer\" instead of \"=\"");
    assert_eq!(error.row(), 1);
}

#[test]
fn missing_semicolon_is_reported_at_end_of_input() {
    let error = parse_error("var x = 1");
    assert_eq!(error.message(), "unexpected token \"EOF\" instead of \";\"");
}

#[test]
fn row_tracks_newlines() {
    let error = parse_error("var x = 1;\nvar y = ;");
    assert_eq!(error.row(), 2);
    assert_eq!(
        error.message(),
        "unexpected token \";\" instead of \"identifier\""
    );
}

#[test]
fn stray_ampersand_becomes_unknown_token() {
    let error = parse_error("var x = 1 & 2;");
    assert!(error.message().contains("UNKNOWN TOKEN"));
}

#[test]
fn unterminated_string_becomes_unknown_token() {
    let error = parse_error("var s = \"abc");
    assert!(error.message().contains("UNKNOWN TOKEN"));
}

#[test]
fn bad_escape_becomes_unknown_token() {
    let error = parse_error("var s = \"a\\q\";");
    assert!(error.message().contains("UNKNOWN TOKEN"));
}

#[test]
fn unterminated_block_comment_ends_the_input() {
    // mid-statement the resulting EOF token is an error...
    let error = parse_error("var x = /* no end");
    assert!(error.message().contains("\"EOF\""));

    // ...but at a statement boundary the program just ends
    assert!(Runner::new("var x = 1; /* no end").run(&mut NoPrint).is_ok());
}

#[test]
fn no_operator_chaining_without_parentheses() {
    let error = parse_error("var x = 1 + 2 + 3;");
    assert_eq!(error.message(), "unexpected token \"+\" instead of \";\"");
}

#[test]
fn integer_literal_overflow() {
    let error = parse_error("var x = 9223372036854775808;");
    assert_eq!(error.message(), "integer literal out of range");
    assert!(error.to_string().starts_with("1:"));
}

#[test]
fn display_includes_position_prefix() {
    let error = parse_error("var x = 1\nvar");
    assert_eq!(
        error.to_string(),
        format!("{}:{}: {}", error.row(), error.col(), error.message())
    );
}
