use std::sync::Arc;

use super::EelEvaluator;
use crate::{Context, EelResult, EelValue, ProgramCache};

/// Compiles each distinct expression once into a [`crate::Program`] and runs the cached
/// program on later calls.
#[derive(Clone)]
pub struct CompilingEvaluator {
    cache: Arc<ProgramCache>,
}

impl CompilingEvaluator {
    /// Evaluator with its own in memory cache.
    pub fn new() -> CompilingEvaluator {
        CompilingEvaluator::with_cache(Arc::new(ProgramCache::new()))
    }

    pub fn with_cache(cache: Arc<ProgramCache>) -> CompilingEvaluator {
        CompilingEvaluator { cache }
    }

    pub fn cache(&self) -> &Arc<ProgramCache> {
        &self.cache
    }
}

impl Default for CompilingEvaluator {
    fn default() -> Self {
        CompilingEvaluator::new()
    }
}

impl EelEvaluator for CompilingEvaluator {
    fn evaluate(&self, expression: &str, context: &Context) -> EelResult<EelValue> {
        self.cache.get_or_compile(expression)?.run(context)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use serde_json::json;

    use super::CompilingEvaluator;
    use crate::{Context, EelEvaluator, ProgramCache};

    #[test]
    fn test_shared_cache() {
        let cache = Arc::new(ProgramCache::new());
        let first = CompilingEvaluator::with_cache(cache.clone());
        let second = CompilingEvaluator::with_cache(cache.clone());
        let ctx = Context::new(json!({"n": 4}));

        assert_eq!(first.evaluate("n % 3", &ctx).unwrap(), 1.into());
        assert_eq!(second.evaluate("n % 3", &ctx).unwrap(), 1.into());
        assert_eq!(cache.codegen_passes(), 1);
    }
}
