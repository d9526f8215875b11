/// runtime
///
/// Hosting scripts. A `Session` owns the global context of one user (or one
/// character sheet, or one chat channel) and runs scripts against it one at a
/// time. Everything a script needs is owned by the session, so independent
/// sessions can live on independent threads.

pub mod error;
pub mod logging;


use crate::script::{self, Context, Roller, StdRoller, Value};
use error::SessionError;
use logging::{DummyLogger, Logger, VecLogger};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SessionConfig {
    /// Nesting depth at which evaluation stops with an error.
    pub max_depth: u32,
    /// Whether the left side of every `|` is written to the output log.
    pub echo_pipes: bool,
    /// Seed for the default dice roller. `None` seeds from the system.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self{ max_depth: 10_000, echo_pipes: true, seed: None }
    }
}

/// What a script evaluated to, plus everything it wrote to the output log.
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    pub value: Value,
    pub log: Vec<String>,
}

pub struct Session {
    id: u32,
    context: Context,
    roller: Box<dyn Roller + Send>,
    trace: Box<dyn Logger + Send>,
    config: SessionConfig,
}

impl Session {
    pub fn new(id: u32) -> Self {
        Self::with_config(id, SessionConfig::default())
    }

    pub fn with_config(id: u32, config: SessionConfig) -> Self {
        let roller: Box<dyn Roller + Send> = match config.seed {
            Some(seed) => Box::new(StdRoller::from_seed(seed)),
            None => Box::new(StdRoller::new()),
        };
        Self{ id, context: Context::new(), roller, trace: Box::new(DummyLogger), config }
    }

    /// Starts from an existing context, e.g. one the host deserialized.
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn with_roller(mut self, roller: Box<dyn Roller + Send>) -> Self {
        self.roller = roller;
        self
    }

    /// Sets the logger that traces every script run.
    pub fn with_trace(mut self, trace: Box<dyn Logger + Send>) -> Self {
        self.trace = trace;
        self
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    pub fn into_context(self) -> Context {
        self.context
    }

    pub fn set_variable<V: Into<Value>>(&mut self, name: &str, value: V) {
        self.context.set_global(name, value.into());
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.context.lookup_global(name)
    }

    /// Runs one script. See `script::evaluate_with_config` for where it runs.
    pub fn run(&mut self, text: &str) -> Result<ScriptOutput, SessionError> {
        log!(self.trace, "session {} running `{}`", self.id, text);

        let mut output = VecLogger::new();
        let value = script::evaluate_with_config(text, &mut self.context, &mut output, &mut *self.roller, &self.config)?;

        let log = output.lines();
        log!(self.trace, "session {} produced {} ({} log lines)", self.id, value, log.len());
        Ok(ScriptOutput{ value, log })
    }
}
