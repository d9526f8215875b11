/**
 * script/tests
 *
 * Tests that run scripts end to end: text goes in through a `Session`, and the
 * value plus the output log come out. Unit tests of the individual stages
 * live next to the code they test.
 *
 * Dice in these tests are fed through a fixed roller, see `Tester::with_rolls`.
 */

mod utils;
mod tokenizer;
mod parser_errors;
mod eval_dice;
mod eval_arrays;
mod eval_functions;
mod eval_scope;

pub(crate) use utils::Tester; // the testing harness
pub(crate) use crate::script::eval::Value;
