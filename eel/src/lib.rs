//! Eel is a small embeddable expression language: arithmetic, comparison, boolean logic,
//! ternaries, array and object literals, and null safe navigation through properties,
//! offsets and method calls.
//!
//! Expressions are evaluated against a [`Context`]. Missing data navigates to `null`
//! instead of failing. A protected context only allows method calls that its
//! [`Whitelist`] names, which makes it usable for untrusted template expressions.
//!
//! Two evaluators share the same semantics:
//!   * [`InterpretedEvaluator`] parses and walks the expression on every call
//!   * [`CompilingEvaluator`] compiles each distinct expression once into a [`Program`]
//!     kept in a [`ProgramCache`], optionally mirrored to an [`ExpressionStore`]
//!
//! ```
//! use eel::{Context, EelEvaluator, InterpretedEvaluator, serde_json::json};
//!
//! let ctx = Context::new(json!({"user": {"name": "Ada", "age": 36}}));
//! let eval = InterpretedEvaluator::new();
//!
//! assert_eq!(eval.evaluate("user.name + ' ' + user.age", &ctx).unwrap(), "Ada 36".into());
//! assert_eq!(eval.evaluate("user.address.city", &ctx).unwrap(), eel::EelValue::Null);
//! ```
//!
//! Template strings embed expressions as `${...}`:
//! ```
//! use eel::{evaluate_eel_expression, CompilingEvaluator, DefaultContext, EelValueMap};
//!
//! let eval = CompilingEvaluator::new();
//! let mut vars = EelValueMap::new();
//! vars.insert("title".to_owned(), " hello ".into());
//!
//! let res = evaluate_eel_expression(
//!     "${String.toUpperCase(String.trim(title))}",
//!     &eval,
//!     vars,
//!     &DefaultContext::standard(),
//! )
//! .unwrap();
//! assert_eq!(res, "HELLO".into());
//! ```
mod compiler;
mod context;
mod evaluator;
mod interp;
pub mod parser;
mod program;
mod types;
mod utility;
mod utils;

pub use compiler::CodeGenerator;
pub use context::{
    helpers, Context, DefaultContext, DefaultContextConfig, Whitelist, WhitelistEntry, WILDCARD,
};
pub use evaluator::{CompilingEvaluator, EelEvaluator, InterpretedEvaluator};
pub use interp::{ByteCode, Interpreter, JmpWhen};
pub use parser::{ParseError, SourceLocation};
pub use program::{
    ExpressionKey, ExpressionStore, FileExpressionStore, MemoryExpressionStore, Program,
    ProgramCache,
};
pub use types::{
    EelError, EelFunction, EelObject, EelResult, EelValue, EelValueMap, EelValueVec,
};
pub use utility::{evaluate_eel_expression, is_eel_expression, parse_eel_expression};

// Some re-exports to allow a consistent use of serde
pub use serde;
pub use serde_json;

#[cfg(test)]
mod tests;
