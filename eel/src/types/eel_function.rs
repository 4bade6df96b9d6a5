use std::{fmt, sync::Arc};

use crate::{EelResult, EelValue};

type FunctionImpl = dyn Fn(Vec<EelValue>) -> EelResult<EelValue> + Send + Sync;

/// A host callable stored as a value, e.g. under a map key so that `helpers.format(x)`
/// can call it.
#[derive(Clone)]
pub struct EelFunction {
    name: String,
    inner: Arc<FunctionImpl>,
}

impl EelFunction {
    pub fn new<F>(name: &str, func: F) -> EelFunction
    where
        F: Fn(Vec<EelValue>) -> EelResult<EelValue> + Send + Sync + 'static,
    {
        EelFunction {
            name: name.to_owned(),
            inner: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: Vec<EelValue>) -> EelResult<EelValue> {
        (self.inner)(args)
    }

    pub fn same_as(&self, other: &EelFunction) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for EelFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function({})", self.name)
    }
}

#[cfg(test)]
mod test {
    use super::EelFunction;
    use crate::EelValue;

    #[test]
    fn test_call_and_identity() {
        let f = EelFunction::new("count", |args| Ok((args.len() as i64).into()));
        let g = f.clone();
        let h = EelFunction::new("count", |args| Ok((args.len() as i64).into()));

        assert_eq!(f.call(vec![1.into(), 2.into()]).unwrap(), EelValue::Int(2));
        assert!(f.same_as(&g));
        assert!(!f.same_as(&h));
        assert_eq!(format!("{:?}", f), "Function(count)");
    }
}
