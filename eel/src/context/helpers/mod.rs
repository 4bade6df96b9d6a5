//! Helper objects exposed to expressions through the default context, e.g.
//! `String.toUpperCase(name)` or `Math.max(a, b)`.

mod array_helper;
mod json_helper;
mod math_helper;
mod string_helper;

use std::{any::Any, sync::Arc};

use crate::{EelError, EelObject, EelResult, EelValue};

pub type HelperMethod = fn(Vec<EelValue>) -> EelResult<EelValue>;

/// Names under which the built in helpers can be registered.
pub const HELPER_NAMES: &[&str] = &["String", "Array", "Math", "Json"];

/// A table driven helper object. All of its methods are pure, so it allows being called
/// from protected contexts.
pub struct Helper {
    name: &'static str,
    methods: &'static [(&'static str, HelperMethod)],
    properties: &'static [(&'static str, f64)],
}

impl Helper {
    pub const fn new(
        name: &'static str,
        methods: &'static [(&'static str, HelperMethod)],
        properties: &'static [(&'static str, f64)],
    ) -> Helper {
        Helper {
            name,
            methods,
            properties,
        }
    }

    pub fn method_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.methods.iter().map(|(name, _)| *name)
    }

    fn method(&self, name: &str) -> Option<HelperMethod> {
        self.methods
            .iter()
            .find(|(method, _)| *method == name)
            .map(|(_, func)| *func)
    }
}

impl std::fmt::Debug for Helper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}Helper", self.name)
    }
}

impl EelObject for Helper {
    fn type_name(&self) -> &str {
        self.name
    }

    fn property(&self, name: &str) -> Option<EelValue> {
        self.properties
            .iter()
            .find(|(prop, _)| *prop == name)
            .map(|(_, val)| EelValue::Float(*val))
    }

    fn call_method(&self, method: &str, args: Vec<EelValue>) -> EelResult<EelValue> {
        match self.method(method) {
            Some(func) => func(args),
            None => Err(EelError::Evaluation(format!(
                "{} helper has no method \"{}\"",
                self.name, method
            ))),
        }
    }

    fn allows_call_of(&self, method: &str) -> bool {
        self.method(method).is_some()
    }

    fn any_ref(&self) -> &dyn Any {
        self
    }
}

/// Looks up a built in helper by the name it is registered under.
pub fn by_name(name: &str) -> Option<Arc<dyn EelObject>> {
    let helper: Arc<dyn EelObject> = match name {
        "String" => Arc::new(string_helper::helper()),
        "Array" => Arc::new(array_helper::helper()),
        "Math" => Arc::new(math_helper::helper()),
        "Json" => Arc::new(json_helper::helper()),
        _ => return None,
    };

    Some(helper)
}

static NULL: EelValue = EelValue::Null;

/// Argument `i`, `null` when it was not passed.
pub(crate) fn arg(args: &[EelValue], i: usize) -> &EelValue {
    args.get(i).unwrap_or(&NULL)
}

pub(crate) fn string_arg(args: &[EelValue], i: usize) -> EelResult<String> {
    arg(args, i).to_string_value()
}

pub(crate) fn int_arg(args: &[EelValue], i: usize) -> EelResult<i64> {
    arg(args, i).to_int()
}

pub(crate) fn opt_int_arg(args: &[EelValue], i: usize) -> EelResult<Option<i64>> {
    match arg(args, i) {
        EelValue::Null => Ok(None),
        other => other.to_int().map(Some),
    }
}

pub(crate) fn float_arg(args: &[EelValue], i: usize) -> EelResult<f64> {
    arg(args, i).to_float()
}

pub(crate) fn list_arg(args: &[EelValue], i: usize, method: &str) -> EelResult<Vec<EelValue>> {
    match arg(args, i) {
        EelValue::List(list) => Ok(list.clone()),
        EelValue::Map(map) => Ok(map.values().cloned().collect()),
        EelValue::Null => Ok(Vec::new()),
        other => Err(EelError::Evaluation(format!(
            "{}() expects a list, got {}",
            method,
            other.type_name()
        ))),
    }
}

/// Resolves a relative offset as used by `substr` and `slice`: negative values count from
/// the end. The result is clamped to `0..=len`.
pub(crate) fn resolve_offset(offset: i64, len: usize) -> usize {
    let len = len as i64;
    let resolved = if offset < 0 { len + offset } else { offset };
    resolved.clamp(0, len) as usize
}

#[cfg(test)]
mod test {
    use super::{by_name, resolve_offset, HELPER_NAMES};
    use crate::EelValue;

    #[test]
    fn test_by_name() {
        for name in HELPER_NAMES {
            let helper = by_name(name).unwrap();
            assert_eq!(helper.type_name(), *name);
        }

        assert!(by_name("Date").is_none());
    }

    #[test]
    fn test_helper_allows_only_known_methods() {
        let helper = by_name("String").unwrap();

        assert!(helper.allows_call_of("toUpperCase"));
        assert!(!helper.allows_call_of("exec"));
        assert!(helper.call_method("exec", vec![]).is_err());
    }

    #[test]
    fn test_properties() {
        let math = by_name("Math").unwrap();

        assert_eq!(math.property("PI"), Some(EelValue::Float(std::f64::consts::PI)));
        assert_eq!(math.property("TAU"), None);
    }

    #[test]
    fn test_resolve_offset() {
        assert_eq!(resolve_offset(2, 5), 2);
        assert_eq!(resolve_offset(-2, 5), 3);
        assert_eq!(resolve_offset(-10, 5), 0);
        assert_eq!(resolve_offset(10, 5), 5);
    }
}
