use std::collections::VecDeque;

use crate::runtime::{ScriptOutput, Session, SessionConfig};
use crate::script::eval::{Roller, Value};
use crate::stats::{Bonus, Stat};

/// Hands out queued rolls, clamped into the requested range. Falls back to
/// the lower bound once the queue is empty.
pub(crate) struct FixedRoller {
    rolls: VecDeque<i64>,
}

impl FixedRoller {
    pub(crate) fn new(rolls: &[i64]) -> Self {
        Self{ rolls: rolls.iter().copied().collect() }
    }
}

impl Roller for FixedRoller {
    fn roll(&mut self, lower: i64, upper: i64) -> i64 {
        match self.rolls.pop_front() {
            Some(roll) => roll.max(lower).min(upper),
            None => lower,
        }
    }
}

//------------------------------------------------------------------------------
// Interface for setting up a session
//------------------------------------------------------------------------------

pub(crate) struct Tester {
    test_name: String,
    config: SessionConfig,
    variables: Vec<(String, Value)>,
    rolls: Option<Vec<i64>>,
}

impl Tester {
    pub(crate) fn new<S: ToString>(test_name: S) -> Self {
        Self{
            test_name: test_name.to_string(),
            config: SessionConfig{ seed: Some(0), ..SessionConfig::default() },
            variables: Vec::new(),
            rolls: None,
        }
    }

    /// Utility for tests that evaluate a single script without any setup.
    pub(crate) fn eval_single<T: ToString, S: AsRef<str>>(test_name: T, script: S) -> EvalTester {
        Self::new(test_name).eval(script)
    }

    pub(crate) fn with_var<V: Into<Value>>(mut self, name: &str, value: V) -> Self {
        self.variables.push((name.to_string(), value.into()));
        self
    }

    pub(crate) fn with_stat(mut self, name: &str, base: i64, bonuses: &[Bonus]) -> Self {
        let mut stat = Stat::new(base);
        for bonus in bonuses {
            stat.add_bonus(bonus.clone());
        }
        self.variables.push((name.to_string(), Value::Stat(stat)));
        self
    }

    /// Dice, `rand` and random indexing use these rolls in order.
    pub(crate) fn with_rolls(mut self, rolls: &[i64]) -> Self {
        self.rolls = Some(rolls.to_vec());
        self
    }

    pub(crate) fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    pub(crate) fn without_pipe_echo(mut self) -> Self {
        self.config.echo_pipes = false;
        self
    }

    pub(crate) fn eval<S: AsRef<str>>(self, script: S) -> EvalTester {
        let mut session = Session::with_config(0, self.config);
        if let Some(rolls) = &self.rolls {
            session = session.with_roller(Box::new(FixedRoller::new(rolls)));
        }
        for (name, value) in self.variables {
            session.set_variable(&name, value);
        }

        EvalTester::run(self.test_name, session, script.as_ref())
    }
}

//------------------------------------------------------------------------------
// Interface for checking the outcome of a script
//------------------------------------------------------------------------------

pub(crate) struct EvalTester {
    test_name: String,
    session: Session,
    script: String,
    output: ScriptOutput,
}

impl EvalTester {
    fn run(test_name: String, mut session: Session, script: &str) -> Self {
        let output = match session.run(script) {
            Ok(output) => output,
            Err(error) => panic!("[{}] Failed to run `{}`: {}", test_name, script, error),
        };
        Self{ test_name, session, script: script.to_string(), output }
    }

    /// Runs another script in the same session.
    pub(crate) fn then<S: AsRef<str>>(self, script: S) -> Self {
        Self::run(self.test_name, self.session, script.as_ref())
    }

    pub(crate) fn value(&self) -> &Value {
        &self.output.value
    }

    pub(crate) fn assert_int(self, expected: i64) -> Self {
        assert_eq!(
            self.output.value.as_int(), Some(expected),
            "[{}] Expected `{}` to evaluate to {}, got {} ({}){}",
            self.test_name, self.script, expected, self.output.value, self.output.value.kind_name(),
            self.log_postfix()
        );
        self
    }

    /// Compares the rendered value.
    pub(crate) fn assert_str(self, expected: &str) -> Self {
        assert_eq!(
            self.output.value.to_string(), expected,
            "[{}] Expected `{}` to render as '{}', got '{}'{}",
            self.test_name, self.script, expected, self.output.value, self.log_postfix()
        );
        self
    }

    pub(crate) fn assert_kind(self, expected: &str) -> Self {
        assert_eq!(
            self.output.value.kind_name(), expected,
            "[{}] Expected `{}` to evaluate to a {}, got {} ({})",
            self.test_name, self.script, expected, self.output.value, self.output.value.kind_name()
        );
        self
    }

    pub(crate) fn assert_error_has(self, fragment: &str) -> Self {
        match &self.output.value {
            Value::Error(message) => assert!(
                message.contains(fragment),
                "[{}] Expected the error of `{}` to contain '{}', got '{}'",
                self.test_name, self.script, fragment, message
            ),
            other => panic!(
                "[{}] Expected `{}` to fail with '{}', got {} ({}){}",
                self.test_name, self.script, fragment, other, other.kind_name(), self.log_postfix()
            ),
        }
        self
    }

    pub(crate) fn assert_log_has(self, fragment: &str) -> Self {
        assert!(
            self.output.log.iter().any(|line| line.contains(fragment)),
            "[{}] Expected the log of `{}` to contain '{}'{}",
            self.test_name, self.script, fragment, self.log_postfix()
        );
        self
    }

    pub(crate) fn assert_log_empty(self) -> Self {
        assert!(
            self.output.log.is_empty(),
            "[{}] Expected `{}` to log nothing{}",
            self.test_name, self.script, self.log_postfix()
        );
        self
    }

    pub(crate) fn assert_var_int(self, name: &str, expected: i64) -> Self {
        let actual = self.session.variable(name).and_then(|v| v.as_int());
        assert_eq!(
            actual, Some(expected),
            "[{}] Expected variable {} to be {} after `{}`, got {:?}",
            self.test_name, name, expected, self.script, self.session.variable(name)
        );
        self
    }

    pub(crate) fn assert_var_str(self, name: &str, expected: &str) -> Self {
        let actual = self.session.variable(name).map(|v| v.to_string());
        assert_eq!(
            actual.as_deref(), Some(expected),
            "[{}] Expected variable {} to render as '{}' after `{}`",
            self.test_name, name, expected, self.script
        );
        self
    }

    pub(crate) fn assert_no_var(self, name: &str) -> Self {
        assert!(
            self.session.variable(name).is_none(),
            "[{}] Expected variable {} to be unbound after `{}`",
            self.test_name, name, self.script
        );
        self
    }

    fn log_postfix(&self) -> String {
        if self.output.log.is_empty() {
            String::new()
        } else {
            format!("\nLog:\n{}", self.output.log.join("\n"))
        }
    }
}
