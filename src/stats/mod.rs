/// stats
///
/// Character statistics with stacking bonuses. A `Stat` is a plain value: the
/// script evaluator copies it around like any other value and only mutates it
/// through `add_bonus`/`remove_bonus` when a script assigns to a variable.

mod bonus;
mod stat;

pub use bonus::{Bonus, BonusType};
pub use stat::{checked_stacking_total, stacking_total, Stat};
