/// eval
///
/// Evaluator of the parsed script tree. Evaluation is a direct walk over the
/// tree in `Heap`: every `Expression` variant is evaluated by one rule in the
/// executor and produces a `Value`. Nothing unwinds. Failures become
/// `Value::Error` and travel upwards like any other value, so a sequence of
/// statements keeps going after one of them failed.
///
/// Values are plain data. Reading a variable copies its value out of the
/// `Context` and assigning copies it back in. Function calls are the only
/// exception: a call may copy a parameter's final value back into the
/// caller's variable that was passed for it.
///
/// Function bodies and stored expressions are kept as text and parsed again
/// every time they are evaluated.

mod builtins;
mod dice;
mod error;
mod executor;
mod store;
mod value;

pub use dice::{Roller, StdRoller};
pub use error::Caller;
pub use store::{normalize_name, Context};
pub use value::{ArrayValue, FunctionValue, KeyValuePair, RangeValue, Value, compare_values, values_equal};

pub(crate) use executor::Executor;
