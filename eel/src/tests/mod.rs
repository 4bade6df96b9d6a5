
use std::{
    any::Any,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use crate::{
    CompilingEvaluator, EelError, EelEvaluator, EelObject, EelResult, EelValue,
    InterpretedEvaluator,
};

pub(crate) fn evaluators() -> Vec<Box<dyn EelEvaluator>> {
    vec![
        Box::new(InterpretedEvaluator::new()),
        Box::new(CompilingEvaluator::new()),
    ]
}

/// Host object counting how often its methods run.
#[derive(Debug, Default)]
pub(crate) struct Calls {
    count: AtomicUsize,
}

impl Calls {
    pub(crate) fn new() -> Arc<Calls> {
        Arc::new(Calls::default())
    }

    pub(crate) fn count(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl EelObject for Calls {
    fn type_name(&self) -> &str {
        "Calls"
    }

    fn property(&self, name: &str) -> Option<EelValue> {
        match name {
            "count" => Some(self.count().into()),
            _ => None,
        }
    }

    fn call_method(&self, method: &str, args: Vec<EelValue>) -> EelResult<EelValue> {
        match method {
            "sideEffect" => {
                self.count.fetch_add(1, Ordering::SeqCst);
                Ok(args.into_iter().next().unwrap_or(EelValue::Bool(true)))
            }
            _ => Err(EelError::Evaluation(format!("Calls has no method {}", method))),
        }
    }

    fn any_ref(&self) -> &dyn Any {
        self
    }
}
