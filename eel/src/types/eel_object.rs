use std::{any::Any, fmt};

use crate::{EelError, EelResult, EelValue};

/// A host object exposed to expressions.
///
/// Objects are navigated with `obj.property`, called with `obj.method(args)` and are
/// otherwise opaque to the language. Every method has a default so an implementor only
/// provides what it actually supports; a missing property reads as `null` and a missing
/// method is an evaluation error.
///
/// ```
/// use std::any::Any;
/// use eel::{EelObject, EelResult, EelValue, EelError};
///
/// #[derive(Debug)]
/// struct Greeter;
///
/// impl EelObject for Greeter {
///     fn type_name(&self) -> &str {
///         "Greeter"
///     }
///
///     fn call_method(&self, method: &str, args: Vec<EelValue>) -> EelResult<EelValue> {
///         match method {
///             "greet" => Ok(format!("hello {}", args.len()).into()),
///             other => Err(EelError::evaluation(&format!("no method {}", other))),
///         }
///     }
///
///     fn any_ref(&self) -> &dyn Any {
///         self
///     }
/// }
/// ```
pub trait EelObject: fmt::Debug + Send + Sync {
    fn type_name(&self) -> &str;

    fn property(&self, _name: &str) -> Option<EelValue> {
        None
    }

    fn call_method(&self, method: &str, _args: Vec<EelValue>) -> EelResult<EelValue> {
        Err(EelError::Evaluation(format!(
            "Method \"{}\" is not callable on object of type {}",
            method,
            self.type_name()
        )))
    }

    /// Capability check consulted by protected contexts when the method is not on the
    /// whitelist. Objects that are safe to call from untrusted expressions return true.
    fn allows_call_of(&self, _method: &str) -> bool {
        false
    }

    fn any_ref(&self) -> &dyn Any;
}
