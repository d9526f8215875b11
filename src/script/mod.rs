/// script
///
/// The macro language. Text goes through three stages:
///
/// 1. `tokenizer`: bytes to a flat `TokenBuffer`,
/// 2. `parser`: tokens to an `Ast`, a heap of `Expression` nodes addressed by
///    id. Syntax errors are nodes in the tree,
/// 3. `eval`: a walk over the tree against a `Context`, producing a `Value`
///    and writing notices to an output log.
///
/// None of the stages fail. Whatever goes wrong ends up as an error node or
/// an error value.

mod arena;
pub mod ast;
pub mod eval;
pub mod input_source;
pub mod parser;
pub mod tokenizer;

#[cfg(test)]
mod tests;

pub use ast::Ast;
pub use eval::{Context, Roller, StdRoller, Value};
pub use parser::parse;
pub use tokenizer::tokenize;

use crate::runtime::error::SessionError;
use crate::runtime::logging::Logger;
use crate::runtime::SessionConfig;

// Scripts recurse on the evaluation thread, one frame per nested node
const EVAL_STACK_SIZE: usize = 256 << 20;

/// Parses and evaluates `text` against `ctx` with the default configuration.
pub fn evaluate(
    text: &str, ctx: &mut Context, log: &mut (dyn Logger + Send), roller: &mut (dyn Roller + Send),
) -> Result<Value, SessionError> {
    evaluate_with_config(text, ctx, log, roller, &SessionConfig::default())
}

/// Evaluation runs on a scoped thread with a large stack, so the depth
/// limit is reached long before the stack runs out. The thread borrows the
/// context, log and roller for the duration of the run.
pub fn evaluate_with_config(
    text: &str, ctx: &mut Context, log: &mut (dyn Logger + Send), roller: &mut (dyn Roller + Send),
    config: &SessionConfig,
) -> Result<Value, SessionError> {
    let result = crossbeam_utils::thread::scope(|s| {
        let handle = s.builder()
            .name("gelly-eval".to_string())
            .stack_size(EVAL_STACK_SIZE)
            .spawn(move |_| evaluate_on_current_thread(text, ctx, log, roller, config));
        match handle {
            Ok(handle) => handle.join().map_err(|_| SessionError::EvaluationPanicked),
            Err(_) => Err(SessionError::SpawnFailed),
        }
    });
    match result {
        Ok(value) => value,
        Err(_) => Err(SessionError::EvaluationPanicked),
    }
}

pub(crate) fn evaluate_on_current_thread(
    text: &str, ctx: &mut Context, log: &mut dyn Logger, roller: &mut dyn Roller, config: &SessionConfig,
) -> Value {
    let ast = parse(text);
    eval::Executor::new(ctx, log, roller, config).run(&ast)
}
