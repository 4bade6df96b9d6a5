use serde::{Deserialize, Serialize};
use std::fmt;

use super::source_location::SourceLocation;

/// The expression did not match the grammar or matched only a prefix of it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ParseError {
    expression: String,
    offset: usize,
    loc: SourceLocation,
    message: Option<String>,
}

impl ParseError {
    pub fn at_offset(expression: &str, offset: usize) -> ParseError {
        ParseError {
            expression: expression.to_owned(),
            offset,
            loc: SourceLocation::from_offset(expression, offset),
            message: None,
        }
    }

    pub fn with_message(mut self, msg: String) -> ParseError {
        self.message = Some(msg);
        self
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn loc(&self) -> SourceLocation {
        self.loc
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Remaining input from the failing offset on.
    pub fn rest(&self) -> &str {
        self.expression.get(self.offset..).unwrap_or("")
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Expression \"{}\" could not be parsed, {}: line {}, column {}",
            self.expression,
            self.message().unwrap_or("syntax error"),
            self.loc.line(),
            self.loc.col()
        )
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod test {
    use super::ParseError;
    use crate::parser::SourceLocation;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::at_offset("1 + 2 extra", 6)
            .with_message("Unexpected input \"extra\"".to_owned());

        assert_eq!(err.offset(), 6);
        assert_eq!(err.loc(), SourceLocation::new(0, 6));
        assert_eq!(err.rest(), "extra");
        assert_eq!(
            err.to_string(),
            "Expression \"1 + 2 extra\" could not be parsed, Unexpected input \"extra\": line 0, column 6"
        );
    }
}
