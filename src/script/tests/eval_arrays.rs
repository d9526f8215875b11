use super::*;

#[test]
fn test_indexing() {
    Tester::eval_single("ends", "a = [1, 2, 3]; a[0] + a[-1]").assert_int(4);
    Tester::eval_single("out of bounds", "a = [1, 2, 3]; a[5]")
        .assert_error_has("index 5 is out of bounds: array length is 3");
    Tester::eval_single("slice", "[1, 2, 3, 4][1..2]").assert_str("[2, 3]");
    Tester::eval_single("reversed slice", "[1, 2, 3, 4][-1..-2]").assert_str("[4, 3]");
    Tester::eval_single("count", "[5, 6, 7][#]").assert_int(3);
    Tester::eval_single("char", "\"hello\"[1]").assert_str("e");
    Tester::eval_single("substring", "\"hello\"[1..3]").assert_str("ell");
    Tester::eval_single("bad index", "[1][[0]]").assert_error_has("cannot index array with array");
}

#[test]
fn test_keyed_arrays() {
    Tester::eval_single("string key", "s = [\"hp\": 10, \"ac\": 15]; s[\"AC\"]").assert_int(15);
    Tester::eval_single("bare key", "s = [hp: 10]; s[\"hp\"]").assert_int(10);
    Tester::eval_single("rendering", "[\"hp\": 10]").assert_str("[\"hp\": 10]");
    Tester::eval_single("positional", "s = [\"hp\": 10, 3]; s[1] + s[\"hp\"]").assert_int(13);
    Tester::eval_single("keys", "s = [\"hp\": 10, 3, \"ac\": 15]; s.keys").assert_str("[\"hp\", \"ac\"]");
    Tester::eval_single("values", "s = [\"hp\": 10, \"ac\": 15]; s.values").assert_str("[10, 15]");
    Tester::eval_single("missing key", "s = [\"hp\": 10]; s[\"mp\"]").assert_error_has("key mp not found");
    Tester::eval_single("pair members", "p = \"hp\": 10; p.key + p.value").assert_str("hp10");
}

#[test]
fn test_array_operators() {
    Tester::eval_single("push value", "[1, 2, 3] << 10").assert_str("[11, 12, 13]");
    Tester::eval_single("push function", "[1, 2, 3] << (x) => { x * 2 }").assert_str("[2, 4, 6]");
    Tester::eval_single("push with index", "[10, 20] << => { _ + I }").assert_str("[10, 21]");
    Tester::eval_single("push keeps keys", "[\"a\": 1, 2] << 1").assert_str("[\"a\": 2, 3]");
    Tester::eval_single("pull function", "[1, 2, 3, 4] >> (x) => { x % 2 == 0 }").assert_str("[2, 4]");
    Tester::eval_single("pull value", "[1, 2, 1] >> 1").assert_str("[1, 1]");
    Tester::eval_single("append arrays", "[1, 2] >>* [3]").assert_str("[1, 2, 3]");
    Tester::eval_single("prepend", "0 >>* [1]").assert_str("[0, 1]");
    Tester::eval_single("arrange up", "[3, 1, 2] <> 1").assert_str("[1, 2, 3]");
    Tester::eval_single("arrange down", "[3, 1, 2] <> -1").assert_str("[3, 2, 1]");
    Tester::eval_single("arrange mixed", "[\"b\", 2, \"a\", 1] <> 1").assert_str("[1, 2, \"a\", \"b\"]");
    Tester::eval_single("arrange pairs", "[\"a\": 3, \"b\": 1, \"c\": 2] <> 1").assert_str("[\"b\": 1, \"c\": 2, \"a\": 3]");
    Tester::eval_single("arrange pairs down", "[\"a\": 3, \"b\": 1, \"c\": 2] <> -1")
        .assert_str("[\"a\": 3, \"c\": 2, \"b\": 1]");
    Tester::eval_single("arrange pairs and values", "[\"a\": 3, 2] <> 1").assert_str("[2, \"a\": 3]");
    Tester::eval_single("arranged keys", "s = [\"a\": 3, \"b\": 1] <> 1; s[\"a\"] * 10 + s[\"b\"]")
        .assert_int(31)
        .then("s.keys")
        .assert_str("[\"b\", \"a\"]");
    Tester::eval_single("plus array", "[1] + [2] + 3").assert_str("[1, 2, 3]");
    Tester::eval_single("too many params", "[1] << (a, b, c) => { a }")
        .assert_error_has("function for '<<' takes at most 2 parameters but has 3");
    Tester::eval_single("not an array", "1 << 2").assert_error_has("cannot apply '<<' to integer and integer");
}

#[test]
fn test_array_members() {
    Tester::eval_single("len", "a = [1, 2, 3]; a.len").assert_int(3);
    Tester::eval_single("sum", "a = [1, 2, 3]; a.sum").assert_int(6);
    Tester::eval_single("keyed sum", "[\"a\": 4, 5].sum").assert_int(9);
    Tester::eval_single("first and last", "a = [4, 5, 6]; a.first * a.last").assert_int(24);
    Tester::eval_single("has", "a = [1, 2, 3]; a.has(2)").assert_int(1);
    Tester::eval_single("has not", "a = [1, 2, 3]; a.HAS(7)").assert_int(0);
    Tester::eval_single("unknown member", "[1].size").assert_error_has("size is not a member of array");
    Tester::eval_single("member args", "[1].len(2)").assert_error_has("len expects 0 arguments but got 1");
    Tester::eval_single("empty first", "[].first").assert_error_has("first of an empty array");
}

#[test]
fn test_mutating_members_write_back() {
    Tester::eval_single("insert", "a = [1]; a.insert(2); a").assert_str("[1, 2]").assert_var_str("a", "[1, 2]");
    Tester::eval_single("append", "a = [1]; a.append([2, 3]); a").assert_str("[1, 2, 3]");
    Tester::eval_single("remove", "a = [1, 2, 3]; a.remove(0); a").assert_str("[2, 3]");
    Tester::eval_single("remove last", "a = [1, 2, 3]; a.remove(-1)").assert_str("[1, 2]");
    Tester::eval_single("keyed insert", "a = []; a.insert(\"hp\": 3); a[\"hp\"]").assert_int(3);
}

#[test]
fn test_assignment_through_indices() {
    Tester::eval_single("element", "a = [1, 2]; a[0] = 9; a").assert_str("[9, 2]");
    Tester::eval_single("nested compound", "party = [[\"hp\": 10]]; party[0][\"hp\"] -= 4; party[0][\"hp\"]")
        .assert_int(6);
    Tester::eval_single("new key", "s = [\"hp\": 10]; s[\"ac\"] = 15; s")
        .assert_str("[\"hp\": 10, \"ac\": 15]");
    Tester::eval_single("keeps key", "s = [\"hp\": 10]; s[0] = 4; s").assert_str("[\"hp\": 4]");
    Tester::eval_single("replaces pair", "s = [\"hp\": 10]; s[0] = \"mp\": 2; s").assert_str("[\"mp\": 2]");
    Tester::eval_single("out of bounds", "a = [1]; a[3] = 2").assert_error_has("index 3 is out of bounds");
    Tester::eval_single("missing root", "a[0] = 1").assert_error_has("A not found");
    Tester::eval_single("not a container", "a = 3; a[0] = 1").assert_error_has("cannot assign into integer");
}

#[test]
fn test_error_elements_propagate() {
    Tester::eval_single("error element", "[1, 1 / 0, 3]").assert_error_has("division by zero");
}
