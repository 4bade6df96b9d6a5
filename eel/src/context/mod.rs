mod default_context;
pub mod helpers;
mod whitelist;

pub use default_context::{DefaultContext, DefaultContextConfig};
pub use whitelist::{Whitelist, WhitelistEntry, WILDCARD};

use crate::{EelError, EelResult, EelValue};

const LOG_TARGET: &str = "eel::context";

/// Safe navigation wrapper around one value.
///
/// Reading a missing key, a property of `null` or a property of a scalar yields `null`
/// instead of an error, so expressions can walk optional data without guards. A context
/// carrying a [`Whitelist`] is *protected*: method calls are only allowed when the
/// whitelist (or the called object itself) says so.
#[derive(Debug, Clone, PartialEq)]
pub struct Context {
    value: EelValue,
    whitelist: Option<Whitelist>,
}

impl Context {
    pub fn new<T: Into<EelValue>>(value: T) -> Context {
        Context {
            value: value.into(),
            whitelist: None,
        }
    }

    pub fn protected<T: Into<EelValue>>(value: T, whitelist: Whitelist) -> Context {
        Context {
            value: value.into(),
            whitelist: Some(whitelist),
        }
    }

    pub fn empty_list() -> Context {
        Context::new(EelValue::empty_list())
    }

    pub fn empty_map() -> Context {
        Context::new(EelValue::empty_map())
    }

    pub fn is_protected(&self) -> bool {
        self.whitelist.is_some()
    }

    pub fn whitelist(&self) -> Option<&Whitelist> {
        self.whitelist.as_ref()
    }

    /// Allows a dotted method path, turning a trusted context into a protected one.
    pub fn allow(&mut self, path: &str) -> &mut Context {
        self.whitelist.get_or_insert_with(Whitelist::new).allow(path);
        self
    }

    pub fn value(&self) -> &EelValue {
        &self.value
    }

    pub fn unwrap(&self) -> EelValue {
        self.value.clone()
    }

    pub fn into_value(self) -> EelValue {
        self.value
    }

    fn key_string(path: &EelValue) -> EelResult<String> {
        match path {
            EelValue::String(s) => Ok(s.clone()),
            EelValue::Int(i) => Ok(i.to_string()),
            other => Err(EelError::Evaluation(format!(
                "Path must be a string or integer, got {}",
                other.type_name()
            ))),
        }
    }

    /// Reads `path` from the wrapped value. Missing data is `null`, a path that is neither
    /// a string nor an integer is an error.
    pub fn get(&self, path: &EelValue) -> EelResult<EelValue> {
        if self.value.is_null() {
            return Ok(EelValue::Null);
        }

        let key = Context::key_string(path)?;

        Ok(match &self.value {
            EelValue::List(list) => key
                .parse::<usize>()
                .ok()
                .and_then(|i| list.get(i))
                .cloned()
                .unwrap_or(EelValue::Null),
            EelValue::Map(map) => map.get(&key).cloned().unwrap_or(EelValue::Null),
            EelValue::Object(obj) => obj.property(&key).unwrap_or(EelValue::Null),
            _ => EelValue::Null,
        })
    }

    /// [`Context::get`], wrapped. A protected context hands the child the part of its
    /// whitelist nested under `path`.
    pub fn get_and_wrap(&self, path: &EelValue) -> EelResult<Context> {
        let value = self.get(path)?;

        Ok(Context {
            value,
            whitelist: match &self.whitelist {
                Some(wl) => Some(wl.narrow(&Context::key_string(path)?)),
                None => None,
            },
        })
    }

    fn check_allowed(&self, method: &str) -> EelResult<()> {
        let Some(wl) = &self.whitelist else {
            return Ok(());
        };

        let allowed = match &self.value {
            EelValue::Null => true,
            EelValue::Object(obj) => wl.allows(method) || obj.allows_call_of(method),
            _ => wl.allows(method),
        };

        if allowed {
            Ok(())
        } else {
            log::debug!(
                target: LOG_TARGET,
                "Denied call of \"{}\" on {} in protected context",
                method,
                self.value.type_name()
            );
            Err(EelError::not_allowed(method))
        }
    }

    /// Calls `method` on the wrapped value with the unwrapped `arguments`.
    pub fn call(&self, method: &str, arguments: Vec<Context>) -> EelResult<EelValue> {
        self.check_allowed(method)?;

        let args: Vec<EelValue> = arguments.into_iter().map(Context::into_value).collect();

        match &self.value {
            EelValue::Null => Ok(EelValue::Null),
            EelValue::Map(map) => match map.get(method) {
                Some(EelValue::Function(func)) => func.call(args),
                _ => Err(EelError::Evaluation(format!(
                    "Array has no function \"{}\"",
                    method
                ))),
            },
            EelValue::Object(obj) => obj.call_method(method, args),
            other => Err(EelError::Evaluation(format!(
                "Needs object or array to call method \"{}\", got {}",
                method,
                other.type_name()
            ))),
        }
    }

    pub fn call_and_wrap(&self, method: &str, arguments: Vec<Context>) -> EelResult<Context> {
        let value = self.call(method, arguments)?;
        Ok(self.wrap(value))
    }

    /// Wraps a value produced from this context. Values wrapped by a protected context are
    /// protected with an empty whitelist.
    pub fn wrap(&self, value: EelValue) -> Context {
        Context {
            value,
            whitelist: self.whitelist.as_ref().map(|_| Whitelist::new()),
        }
    }

    /// Appends `value` to a wrapped list, or sets it under `key`. Setting a key on a list
    /// turns it into a map keyed by the former indices.
    pub fn push(&mut self, value: Context, key: Option<&str>) -> EelResult<()> {
        let value = value.into_value();

        match (&mut self.value, key) {
            (EelValue::List(list), None) => list.push(value),
            (EelValue::List(list), Some(key)) => {
                let mut map: crate::EelValueMap = std::mem::take(list)
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (i.to_string(), v))
                    .collect();
                map.insert(key.to_owned(), value);
                self.value = EelValue::Map(map);
            }
            (EelValue::Map(map), Some(key)) => {
                map.insert(key.to_owned(), value);
            }
            (EelValue::Map(map), None) => {
                let key = map.len().to_string();
                map.insert(key, value);
            }
            (other, _) => {
                return Err(EelError::Evaluation(format!(
                    "Push is not supported on {}",
                    other.type_name()
                )))
            }
        }

        Ok(())
    }
}

impl From<EelValue> for Context {
    fn from(value: EelValue) -> Context {
        Context::new(value)
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use serde_json::json;

    use super::{Context, Whitelist};
    use crate::{EelFunction, EelObject, EelResult, EelValue};

    #[derive(Debug)]
    struct Person;

    impl EelObject for Person {
        fn type_name(&self) -> &str {
            "Person"
        }

        fn property(&self, name: &str) -> Option<EelValue> {
            match name {
                "name" => Some("Ada".into()),
                _ => None,
            }
        }

        fn call_method(&self, method: &str, args: Vec<EelValue>) -> EelResult<EelValue> {
            match method {
                "greet" => Ok(format!("hi {}", args.len()).into()),
                _ => Ok(EelValue::Null),
            }
        }

        fn allows_call_of(&self, method: &str) -> bool {
            method == "greet"
        }

        fn any_ref(&self) -> &dyn std::any::Any {
            self
        }
    }

    fn person() -> EelValue {
        EelValue::Object(Arc::new(Person))
    }

    #[test]
    fn test_get() {
        let ctx = Context::new(json!({"a": {"b": null}, "list": [1, 2]}));

        assert_eq!(ctx.get(&"missing".into()).unwrap(), EelValue::Null);
        let a = ctx.get_and_wrap(&"a".into()).unwrap();
        let b = a.get_and_wrap(&"b".into()).unwrap();
        assert_eq!(b.get(&"c".into()).unwrap(), EelValue::Null);

        let list = ctx.get_and_wrap(&"list".into()).unwrap();
        assert_eq!(list.get(&1.into()).unwrap(), EelValue::Int(2));
        assert_eq!(list.get(&"0".into()).unwrap(), EelValue::Int(1));
        assert_eq!(list.get(&5.into()).unwrap(), EelValue::Null);
        assert_eq!(list.get(&(-1).into()).unwrap(), EelValue::Null);
    }

    #[test]
    fn test_get_rejects_bad_paths() {
        let ctx = Context::new(json!({"a": 1}));

        assert!(ctx.get(&1.5.into()).is_err());
        assert!(ctx.get(&EelValue::empty_list()).is_err());
        assert_eq!(
            Context::new(EelValue::Null).get(&1.5.into()).unwrap(),
            EelValue::Null
        );
    }

    #[test]
    fn test_object_property_and_scalars() {
        let ctx = Context::new(person());

        assert_eq!(ctx.get(&"name".into()).unwrap(), EelValue::from("Ada"));
        assert_eq!(ctx.get(&"age".into()).unwrap(), EelValue::Null);
        assert_eq!(
            Context::new("text").get(&"length".into()).unwrap(),
            EelValue::Null
        );
    }

    #[test]
    fn test_call() {
        let mut map = crate::EelValueMap::new();
        map.insert(
            "double".to_owned(),
            EelFunction::new("double", |args| {
                Ok(match args.first() {
                    Some(EelValue::Int(i)) => EelValue::Int(i * 2),
                    _ => EelValue::Null,
                })
            })
            .into(),
        );
        map.insert("plain".to_owned(), 1.into());
        let ctx = Context::new(map);

        assert_eq!(
            ctx.call("double", vec![Context::new(21)]).unwrap(),
            EelValue::Int(42)
        );
        assert!(ctx.call("plain", vec![]).is_err());
        assert!(ctx.call("missing", vec![]).is_err());
        assert_eq!(
            Context::new(EelValue::Null).call("x", vec![]).unwrap(),
            EelValue::Null
        );
        assert!(Context::new(1).call("x", vec![]).is_err());
    }

    #[test]
    fn test_protected_call() {
        let mut map = crate::EelValueMap::new();
        for name in ["foo", "bar"] {
            map.insert(
                name.to_owned(),
                EelFunction::new(name, |_| Ok(true.into())).into(),
            );
        }

        let ctx = Context::protected(map.clone(), Whitelist::new().with("foo"));
        assert_eq!(ctx.call("foo", vec![]).unwrap(), EelValue::Bool(true));
        assert!(ctx.call("bar", vec![]).unwrap_err().is_not_allowed());

        let ctx = Context::protected(map, Whitelist::everything());
        assert!(ctx.call("bar", vec![]).is_ok());
    }

    #[test]
    fn test_protected_object_escape_hatch() {
        let ctx = Context::protected(person(), Whitelist::new());

        assert_eq!(
            ctx.call("greet", vec![Context::new(1)]).unwrap(),
            EelValue::from("hi 1")
        );
        assert!(ctx.call("other", vec![]).unwrap_err().is_not_allowed());
    }

    #[test]
    fn test_protected_narrowing() {
        let ctx = Context::protected(
            json!({"a": {"b": {}}}),
            Whitelist::from_json(json!({"a": {"b": {"c": true}}, "x": true})).unwrap(),
        );

        let a = ctx.get_and_wrap(&"a".into()).unwrap();
        assert!(a.whitelist().unwrap().allows("b"));
        assert!(!a.whitelist().unwrap().allows("x"));

        let b = a.get_and_wrap(&"b".into()).unwrap();
        assert!(b.whitelist().unwrap().allows("c"));

        let c = b.get_and_wrap(&"c".into()).unwrap();
        assert!(c.whitelist().unwrap().is_empty());
        assert!(ctx.wrap(1.into()).whitelist().unwrap().is_empty());
        assert!(Context::new(1).wrap(2.into()).whitelist().is_none());
    }

    #[test]
    fn test_allow_makes_protected() {
        let mut ctx = Context::new(json!({}));
        assert!(!ctx.is_protected());

        ctx.allow("String.format");
        assert!(ctx.is_protected());
        assert!(ctx.whitelist().unwrap().narrow("String").allows("format"));
    }

    #[test]
    fn test_push() {
        let mut list = Context::empty_list();
        list.push(Context::new(1), None).unwrap();
        list.push(Context::new("a"), None).unwrap();
        assert_eq!(list.unwrap(), EelValue::from(json!([1, "a"])));

        list.push(Context::new(true), Some("k")).unwrap();
        assert_eq!(list.unwrap(), EelValue::from(json!({"0": 1, "1": "a", "k": true})));

        let mut map = Context::empty_map();
        map.push(Context::new(1), Some("x")).unwrap();
        map.push(Context::new(2), None).unwrap();
        assert_eq!(map.unwrap(), EelValue::from(json!({"x": 1, "1": 2})));

        assert!(Context::new(1).push(Context::new(2), None).is_err());
    }
}
