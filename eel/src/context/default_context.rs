use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::helpers;
use crate::{EelError, EelFunction, EelObject, EelResult, EelValue, EelValueMap};

/// Configuration form of a default context: dotted variable path to helper name.
///
/// ```json
/// {"String": "String", "Neos.Math": "Math"}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DefaultContextConfig {
    helpers: IndexMap<String, String>,
}

impl DefaultContextConfig {
    pub fn new() -> DefaultContextConfig {
        DefaultContextConfig::default()
    }

    pub fn with(mut self, path: &str, helper: &str) -> DefaultContextConfig {
        self.helpers.insert(path.to_owned(), helper.to_owned());
        self
    }

    pub fn from_json(value: serde_json::Value) -> EelResult<DefaultContextConfig> {
        serde_json::from_value(value).map_err(|err| EelError::Config(err.to_string()))
    }
}

/// Variables every whitelisted evaluation starts from: helper objects and functions
/// registered under dotted paths, assembled into one nested variable map.
#[derive(Debug, Clone, Default)]
pub struct DefaultContext {
    variables: EelValueMap,
    function_paths: Vec<String>,
}

impl DefaultContext {
    pub fn new() -> DefaultContext {
        DefaultContext::default()
    }

    /// All built in helpers under their own names.
    pub fn standard() -> DefaultContext {
        let mut ctx = DefaultContext::new();
        for name in helpers::HELPER_NAMES {
            if let Some(helper) = helpers::by_name(name) {
                ctx.variables
                    .insert((*name).to_owned(), EelValue::Object(helper));
            }
        }
        ctx
    }

    pub fn from_config(config: &DefaultContextConfig) -> EelResult<DefaultContext> {
        let mut ctx = DefaultContext::new();

        for (path, name) in config.helpers.iter() {
            let helper = helpers::by_name(name).ok_or_else(|| {
                EelError::Config(format!("Unknown helper \"{}\" for \"{}\"", name, path))
            })?;
            ctx.register_object(path, helper)?;
        }

        Ok(ctx)
    }

    pub fn register_object(
        &mut self,
        path: &str,
        object: Arc<dyn EelObject>,
    ) -> EelResult<&mut DefaultContext> {
        self.insert(path, EelValue::Object(object))?;
        Ok(self)
    }

    /// Registers a function. Function paths are callable from protected contexts.
    pub fn register_function(
        &mut self,
        path: &str,
        function: EelFunction,
    ) -> EelResult<&mut DefaultContext> {
        self.insert(path, EelValue::Function(function))?;
        self.function_paths.push(path.to_owned());
        Ok(self)
    }

    pub fn variables(&self) -> &EelValueMap {
        &self.variables
    }

    pub fn function_paths(&self) -> &[String] {
        &self.function_paths
    }

    fn insert(&mut self, path: &str, value: EelValue) -> EelResult<()> {
        if path.is_empty() || path.split('.').any(str::is_empty) {
            return Err(EelError::Config(format!("Invalid variable path \"{}\"", path)));
        }

        let mut segments: Vec<&str> = path.split('.').collect();
        let last = segments.pop().unwrap_or(path);
        let mut node = &mut self.variables;

        for segment in segments {
            let entry = node
                .entry(segment.to_owned())
                .or_insert_with(EelValue::empty_map);

            node = match entry {
                EelValue::Map(map) => map,
                _ => {
                    return Err(EelError::Config(format!(
                        "\"{}\" in \"{}\" is already registered as a value",
                        segment, path
                    )))
                }
            };
        }

        if node.contains_key(last) {
            return Err(EelError::Config(format!(
                "\"{}\" is already registered",
                path
            )));
        }

        node.insert(last.to_owned(), value);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::{DefaultContext, DefaultContextConfig};
    use crate::{EelError, EelFunction, EelValue};

    #[test]
    fn test_standard() {
        let ctx = DefaultContext::standard();

        for name in ["String", "Array", "Math", "Json"] {
            assert!(matches!(ctx.variables().get(name), Some(EelValue::Object(_))));
        }
        assert!(ctx.function_paths().is_empty());
    }

    #[test]
    fn test_from_config() {
        let config =
            DefaultContextConfig::from_json(json!({"Str": "String", "Neos.Math": "Math"}))
                .unwrap();
        let ctx = DefaultContext::from_config(&config).unwrap();

        assert!(matches!(ctx.variables().get("Str"), Some(EelValue::Object(_))));
        match ctx.variables().get("Neos") {
            Some(EelValue::Map(neos)) => assert!(neos.contains_key("Math")),
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_helper() {
        let config = DefaultContextConfig::new().with("Date", "Date");

        assert!(matches!(
            DefaultContext::from_config(&config),
            Err(EelError::Config(_))
        ));
    }

    #[test]
    fn test_register_conflicts() {
        let mut ctx = DefaultContext::new();
        let f = EelFunction::new("q", |_| Ok(EelValue::Null));

        ctx.register_function("q", f.clone()).unwrap();
        ctx.register_function("util.q", f.clone()).unwrap();

        assert_eq!(ctx.function_paths(), &["q".to_owned(), "util.q".to_owned()]);
        assert!(ctx.register_function("q", f.clone()).is_err());
        assert!(ctx.register_function("q.inner", f.clone()).is_err());
        assert!(ctx.register_function("a..b", f).is_err());
    }
}
