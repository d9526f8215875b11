use super::*;

#[test]
fn test_plain_dice() {
    Tester::new("2d6").with_rolls(&[3, 4]).eval("2d6").assert_int(7);
    Tester::new("implicit count").with_rolls(&[12]).eval("d20 + 5").assert_int(17);
    Tester::new("clamped to sides").with_rolls(&[9]).eval("1d6").assert_int(6);
}

#[test]
fn test_keep_and_reroll() {
    Tester::new("keep highest").with_rolls(&[1, 4, 6, 3]).eval("4d6h3").assert_int(13);
    Tester::new("keep lowest").with_rolls(&[15, 3]).eval("2d20l1").assert_int(3);
    Tester::new("reroll once").with_rolls(&[1, 5]).eval("1d6r2").assert_int(5);
    Tester::new("reroll keeps second").with_rolls(&[2, 1]).eval("1d6r2").assert_int(1);
}

#[test]
fn test_multiplied_dice() {
    // With a keep modifier the whole roll is repeated
    Tester::new("repeated")
        .with_rolls(&[1, 4, 6, 3, 2, 2, 2, 2])
        .eval("4d6h3 * 2")
        .assert_int(19);
    Tester::new("repeated by division")
        .with_rolls(&[1, 4, 6, 3, 2, 2, 2, 2])
        .eval("4d6h3 / 2")
        .assert_int(19);

    // Without one the total is scaled
    Tester::new("scaled").with_rolls(&[3, 4]).eval("2d6 * 3").assert_int(21);
    Tester::new("divided").with_rolls(&[6, 5]).eval("2d6 / 2").assert_int(5);
    Tester::new("repeat by error").eval("4d6h3 * (1 / 0)").assert_error_has("division by zero");
    Tester::new("negative repeat").eval("4d6h3 * -1").assert_error_has("cannot repeat 4d6h3 -1 times");
}

#[test]
fn test_invalid_dice() {
    Tester::eval_single("no sides", "1d0").assert_error_has("cannot roll 1d0");
}

#[test]
fn test_random_sources() {
    Tester::new("rand").with_rolls(&[5]).eval("rand(3, 8)").assert_int(5);
    Tester::new("rand bounds").eval("rand(8, 3)").assert_error_has("rand: lower bound 8 is greater than upper bound 3");
    Tester::new("random index").with_rolls(&[2]).eval("[10, 20, 30][~]").assert_int(30);
    Tester::new("random char").with_rolls(&[1]).eval("\"xyz\"[~]").assert_str("y");
    Tester::new("empty pick").eval("[][~]").assert_error_has("cannot pick from an empty array");
}

#[test]
fn test_seeded_rolls_stay_in_range() {
    let mut tester = Tester::new("seeded").eval("0");
    for _ in 0..50 {
        tester = tester.then("3d6");
        let value = tester.value().as_int().unwrap();
        assert!(value >= 3 && value <= 18, "3d6 rolled {}", value);
    }
}
