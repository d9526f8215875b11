use super::*;
use crate::script::parse;

fn errors(text: &str) -> Vec<String> {
    parse(text).errors().iter().map(|e| e.to_string()).collect()
}

#[test]
fn test_error_shows_surrounding_tokens() {
    assert_eq!(errors("(1 + 2"), vec!["expected ')' to close the parenthesis: `+ 2`".to_string()]);
    assert_eq!(errors("3 = 4"), vec!["cannot assign to a number expression: `3 = 4`".to_string()]);
    assert_eq!(errors("1 +"), vec!["unexpected end of input: `1 +`".to_string()]);

    // Syntax errors surface as the value of the script
    Tester::eval_single("unclosed", "(1 + 2")
        .assert_error_has("expected ')' to close the parenthesis");
}

#[test]
fn test_statement_errors() {
    let found = errors("for 3, x, { 1 }");
    assert_eq!(found.len(), 1);
    assert!(found[0].starts_with("expected a loop variable after 'for'"), "got {:?}", found);

    assert_eq!(errors("1 2"), vec!["unexpected token: `1 2`".to_string()]);
    Tester::eval_single("trailing", "1 2").assert_error_has("unexpected token");

    let found = errors("[1, 2");
    assert!(found[0].starts_with("expected ',' or ']' in array"), "got {:?}", found);

    let found = errors("1 + 2 ^ 3");
    assert!(found[0].starts_with("unexpected token"), "got {:?}", found);
}

#[test]
fn test_root_kinds() {
    assert_eq!(parse("x = 1; x + 1").root().kind_name(), "sequence");
    assert_eq!(parse("1 | 2").root().kind_name(), "pipe");
    assert_eq!(parse("x += 2").root().kind_name(), "assignment");
    assert_eq!(parse("a[0] = 2").root().kind_name(), "assignment");
    assert_eq!(parse("").root().kind_name(), "empty");
    assert_eq!(parse("4d6h3 * 2").root().kind_name(), "dice multiplier");
    assert_eq!(parse("4d6h3 % 2").root().kind_name(), "binary");
}

#[test]
fn test_if_statement_or_builtin() {
    assert_eq!(parse("if (x) { 1 }").root().kind_name(), "if");
    assert_eq!(parse("if x > 1 { 1 } else { 2 }").root().kind_name(), "if");
    assert_eq!(parse("if(1, 5)").root().kind_name(), "call");

    Tester::eval_single("builtin if", "if(1, 5)").assert_int(5);
    Tester::eval_single("builtin if false", "if(2, 5)").assert_int(0);
}

#[test]
fn test_recovery_continues_with_next_statement() {
    Tester::eval_single("recovery", "1 +; 2")
        .assert_int(2)
        .assert_log_has("unexpected ';'");

    Tester::eval_single("recovery after junk", "x = 1 1 1; x + 1")
        .assert_int(2)
        .assert_log_has("unexpected token");
}

#[test]
fn test_lambda_parameter_lists() {
    assert_eq!(parse("(a, b) => { a + b }").root().kind_name(), "function");
    assert_eq!(parse("() => { 1 }").root().kind_name(), "function");
    assert_eq!(parse("=> { _ }").root().kind_name(), "function");

    let found = errors("(a, 1) => { a }");
    assert!(found[0].starts_with("invalid parameter list"), "got {:?}", found);
}
