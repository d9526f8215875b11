#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ContextError {
    #[display(fmt = "no global found for {}", _0)]
    NoGlobal(String),
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SessionError {
    #[display(fmt = "evaluation thread could not be started")]
    SpawnFailed,
    #[display(fmt = "evaluation thread panicked")]
    EvaluationPanicked,
}

impl std::error::Error for ContextError {}
impl std::error::Error for SessionError {}
