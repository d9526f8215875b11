#[macro_use]
mod macros;

pub mod runtime;
pub mod script;
pub mod stats;

pub use runtime::error::{ContextError, SessionError};
pub use runtime::logging::{DummyLogger, FileLogger, Logger, VecLogger};
pub use runtime::{ScriptOutput, Session, SessionConfig};
pub use script::{evaluate, parse, Context, Roller, StdRoller, Value};
pub use stats::{Bonus, BonusType, Stat};
