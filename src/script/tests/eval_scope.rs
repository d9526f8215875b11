use super::*;

#[test]
fn test_names_are_normalized() {
    Tester::eval_single("case", "Gold = 5; GOLD + gold").assert_int(10).assert_var_int("GoLd", 5);
    Tester::new("host names")
        .with_var("hit points", Value::Int(30))
        .eval("hit_points - 5")
        .assert_int(25);
}

#[test]
fn test_values_persist_between_runs() {
    Tester::eval_single("persist", "x = 41")
        .then("x + 1")
        .assert_int(42)
        .then("f = (a) => { a * x }")
        .then("f(2)")
        .assert_int(82);
}

#[test]
fn test_function_locals() {
    Tester::eval_single("locals do not leak", "f = () => { tmp = 5; tmp }; f(); tmp")
        .assert_int(0)
        .assert_log_has("TMP not found.")
        .assert_no_var("tmp");

    // Plain assignment inside a function binds a local
    Tester::new("shadowing")
        .with_var("gold", Value::Int(5))
        .eval("f = () => { gold = 9 }; f(); gold")
        .assert_int(5);
    Tester::new("compound shadowing")
        .with_var("gold", Value::Int(5))
        .eval("f = () => { gold += 1; gold }; f() + gold")
        .assert_int(11)
        .assert_var_int("gold", 5);
}

#[test]
fn test_elevated_assignment() {
    Tester::new("elevate")
        .with_var("gold", Value::Int(5))
        .eval("f = () => { gold ^= 7 }; f(); gold")
        .assert_int(7);
    Tester::eval_single("no global", "missing ^= 1").assert_error_has("no global found for MISSING");
    Tester::eval_single("elevate through index", "a = [1]; a[0] ^= 2").assert_error_has("'^=' only applies to variables");
    Tester::eval_single("local parameter", "f = (a) => { a ^= 3 }; f(1)").assert_error_has("no global found for A");
}

#[test]
fn test_elevated_global_and_local_stay_apart() {
    Tester::new("local read")
        .with_var("gold", Value::Int(5))
        .eval("f = () => { gold = 1; gold ^= 9; gold }; f()")
        .assert_int(1)
        .assert_var_int("gold", 9)
        .then("gold")
        .assert_int(9);
    Tester::eval_single("shadowed parameter", "x = 1; f = (x) => { x ^= 3; x }; f(5)")
        .assert_int(5)
        .assert_var_int("x", 3);
}

#[test]
fn test_stored_expressions() {
    Tester::eval_single("reduced on read", "x = 2; e = `x * 10`; x = 3; e").assert_int(30);
    Tester::eval_single("wrapped", "e = `1 + 1`; #e").assert_str("`1 + 1`").assert_kind("expression");
    Tester::eval_single("text", "e = `1 + 1`; e.text").assert_str("1 + 1");
    Tester::eval_single("eval", "e = `1 + 1`; e.eval").assert_int(2);
    Tester::eval_single("wrap string", "(#\"2 * 4\").eval").assert_int(8);
    Tester::eval_single("wrap value", "#(3 + 4)").assert_str("`7`");
    Tester::eval_single("reduced member", "e = `[1, 2, 3]`; e.len").assert_int(3);
    Tester::eval_single("compound", "e = `5`; e += 1; e").assert_int(6).assert_var_int("e", 6);
    Tester::eval_single("reassigned", "e = `5`; e = `6`; e").assert_int(6);
    Tester::eval_single("in function", "x = 1; e = `x + 1`; f = (x) => { e }; f(10)").assert_int(11);
}
