use thiserror::Error;

use crate::parser::ParseError;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EelError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Evaluation(String),

    #[error("Method \"{method}\" is not callable in untrusted context")]
    NotAllowed { method: String },

    #[error("Compile error: {0}")]
    Compile(String),

    #[error("Expression store error: {0}")]
    Store(String),

    #[error("The expression \"{0}\" is not a valid Eel expression, perhaps it is not wrapped in ${{...}}?")]
    NotAnExpression(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type EelResult<T> = Result<T, EelError>;

impl EelError {
    pub fn evaluation(msg: &str) -> EelError {
        EelError::Evaluation(msg.to_owned())
    }

    pub fn not_allowed(method: &str) -> EelError {
        EelError::NotAllowed {
            method: method.to_owned(),
        }
    }

    pub fn compile(msg: &str) -> EelError {
        EelError::Compile(msg.to_owned())
    }

    pub fn store(msg: &str) -> EelError {
        EelError::Store(msg.to_owned())
    }

    pub fn config(msg: &str) -> EelError {
        EelError::Config(msg.to_owned())
    }

    pub fn internal(msg: &str) -> EelError {
        EelError::Internal(msg.to_owned())
    }

    pub fn type_string(&self) -> &'static str {
        use EelError::*;

        match self {
            Parse(_) => "PARSE",
            Evaluation(_) => "EVALUATION",
            NotAllowed { .. } => "NOT_ALLOWED",
            Compile(_) => "COMPILE",
            Store(_) => "STORE",
            NotAnExpression(_) => "NOT_AN_EXPRESSION",
            Config(_) => "CONFIG",
            Internal(_) => "INTERNAL",
        }
    }

    /// True for denials raised by a protected context.
    pub fn is_not_allowed(&self) -> bool {
        matches!(self, EelError::NotAllowed { .. })
    }
}

impl From<std::io::Error> for EelError {
    fn from(err: std::io::Error) -> Self {
        EelError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for EelError {
    fn from(err: serde_json::Error) -> Self {
        EelError::Store(err.to_string())
    }
}
