mod compiling;
mod interpreted;

pub use compiling::CompilingEvaluator;
pub use interpreted::InterpretedEvaluator;

use crate::{Context, EelResult, EelValue};

/// Evaluates Eel expression text against a context.
///
/// Implementations agree on results for every expression; they differ in what they
/// keep between calls.
pub trait EelEvaluator: Send + Sync {
    fn evaluate(&self, expression: &str, context: &Context) -> EelResult<EelValue>;
}
