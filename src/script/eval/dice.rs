use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::script::ast::DiceSpec;

/// Source of randomness for dice, `rand(lo, hi)` and random indexing. It is
/// handed to the evaluator explicitly so tests can supply fixed rolls.
pub trait Roller {
    /// Returns an integer in `[lower, upper]`, both inclusive.
    fn roll(&mut self, lower: i64, upper: i64) -> i64;
}

/// The default roller, backed by a `StdRng`.
pub struct StdRoller {
    rng: StdRng,
}

impl StdRoller {
    /// Seeds from the operating system. Falls back to the clock if the system
    /// source is unavailable.
    pub fn new() -> Self {
        let mut seed = [0u8; 32];
        if getrandom::getrandom(&mut seed).is_err() {
            let nanos = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0);
            return Self::from_seed(nanos);
        }
        Self{ rng: StdRng::from_seed(seed) }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self{ rng: StdRng::seed_from_u64(seed) }
    }
}

impl Default for StdRoller {
    fn default() -> Self {
        Self::new()
    }
}

impl Roller for StdRoller {
    fn roll(&mut self, lower: i64, upper: i64) -> i64 {
        if lower >= upper {
            return lower;
        }
        self.rng.gen_range(lower..=upper)
    }
}

/// The outcome of rolling a dice literal once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DiceRoll {
    pub rolls: Vec<i64>,
    pub kept: Vec<i64>,
    pub total: i64,
}

/// Rolls `spec.count` dice. A die showing at most the reroll threshold is
/// rerolled once. Keep-highest is applied first, then keep-lowest on the
/// dice that remain.
pub(crate) fn roll_dice(spec: &DiceSpec, roller: &mut dyn Roller) -> Result<DiceRoll, String> {
    if spec.sides == 0 {
        return Err(format!("cannot roll {}: a die needs at least one side", spec));
    }

    let sides = spec.sides as i64;
    let mut rolls = Vec::with_capacity(spec.count as usize);
    for _ in 0..spec.count {
        let mut value = roller.roll(1, sides);
        if let Some(threshold) = spec.reroll {
            if value <= threshold as i64 {
                value = roller.roll(1, sides);
            }
        }
        rolls.push(value);
    }

    let mut kept = rolls.clone();
    if let Some(highest) = spec.keep_highest {
        kept.sort_unstable_by(|a, b| b.cmp(a));
        kept.truncate(highest as usize);
    }
    if let Some(lowest) = spec.keep_lowest {
        kept.sort_unstable();
        kept.truncate(lowest as usize);
    }

    let total = kept.iter().sum();
    Ok(DiceRoll{ rolls, kept, total })
}
