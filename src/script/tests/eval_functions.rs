use super::*;

#[test]
fn test_lambdas() {
    Tester::eval_single("call", "f = (a, b) => { a + b }; f(2, 3)").assert_int(5);
    Tester::eval_single("no params", "f = () => { 7 }; f()").assert_int(7);
    Tester::eval_single("implicit params", "f = => { _ * I }; f(3, 4)").assert_int(12);
    Tester::eval_single("from array", "fs = [(x) => { x + 1 }]; fs[0](2)").assert_int(3);
    Tester::eval_single("immediate", "((x) => { x * x })(5)").assert_int(25);
    Tester::eval_single("not callable", "[1][0](2)").assert_error_has("integer is not callable");
}

#[test]
fn test_argument_count_is_strict() {
    Tester::eval_single("too few", "f = (a, b) => { a + b }; f(1)")
        .assert_error_has("F expects 2 arguments but got 1");
    Tester::eval_single("too many", "f = => { _ }; f(1, 2, 3)")
        .assert_error_has("F expects 2 arguments but got 3");
}

#[test]
fn test_arguments_are_copied_back() {
    Tester::eval_single("copy back", "inc = (n) => { n += 1 }; x = 1; inc(x); x")
        .assert_int(2)
        .assert_var_int("x", 2);

    // Only bare variables receive the new value
    Tester::eval_single("expression argument", "inc = (n) => { n += 1 }; x = 1; inc(x + 0); x")
        .assert_int(1);

    Tester::eval_single("unchanged parameter", "f = (n) => { n + 1 }; x = 1; f(x); x").assert_int(1);
}

#[test]
fn test_recursion() {
    Tester::eval_single("factorial", "fact = (n) => { n <= 1 ? 1 : n * fact(n - 1) }; fact(5)")
        .assert_int(120);
}

#[test]
fn test_function_values() {
    Tester::eval_single("rendering", "f = (a, b) => { a + b }; f")
        .assert_str("(a, b) => { a + b }")
        .assert_kind("function");
    Tester::eval_single("params", "f = (a, b) => { a + b }; f.params").assert_str("[\"a\", \"b\"]");
    Tester::eval_single("equality", "f = (a) => { a }; g = f; f == g").assert_int(1);
}

#[test]
fn test_builtins() {
    Tester::eval_single("max", "max(3, 9, 4)").assert_int(9);
    Tester::eval_single("min", "MIN(3, 9, 4)").assert_int(3);
    Tester::eval_single("abs", "abs(-5)").assert_int(5);
    Tester::eval_single("clamp", "clamp(15, 0, 10)").assert_int(10);
    Tester::eval_single("clamp order", "clamp(1, 10, 0)").assert_error_has("clamp: minimum 10 is greater than maximum 0");
    Tester::eval_single("mod high", "mod(16)").assert_int(3);
    Tester::eval_single("mod low", "mod(9)").assert_int(-1);
    Tester::eval_single("mod floor", "mod(1)").assert_int(-5);
    Tester::eval_single("th", "th(10)").assert_int(15);
    Tester::eval_single("oh", "oh(9)").assert_int(4);
    Tester::eval_single("tq", "tq(10)").assert_int(7);
    Tester::eval_single("good", "good(6)").assert_int(5);
    Tester::eval_single("bad", "bad(9)").assert_int(3);
    Tester::eval_single("unknown", "nosuch(1)").assert_int(0);
    Tester::eval_single("arity", "max()").assert_error_has("max expects at least 1 arguments but got 0");
    Tester::eval_single("types", "abs(\"x\")").assert_error_has("abs expects integer arguments, got string");
    Tester::new("stat argument")
        .with_stat("str", 14, &[])
        .eval("mod(str)")
        .assert_int(2);
}

#[test]
fn test_bound_function_shadows_builtin() {
    Tester::eval_single("shadow", "max = (a, b) => { 0 }; max(1, 2)").assert_int(0);
}
