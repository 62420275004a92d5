use std::error::Error as StdError;

use thiserror::Error;

use super::parser::ParseResult;
use super::position::Position;

/// A positioned syntax or definition error.
#[derive(Error, Debug)]
#[error("{message} at {position}{}", .cause.as_ref().map(|c| format!(": {c}")).unwrap_or_default())]
pub struct ParseError {
    message: String,
    position: Position,
    #[source]
    cause: Option<Box<dyn StdError + Send + Sync>>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, position: Position) -> Self {
        Self {
            message: message.into(),
            position,
            cause: None,
        }
    }

    pub fn with_cause(mut self, cause: impl StdError + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn line(&self) -> usize {
        self.position.line
    }

    pub fn column(&self) -> usize {
        self.position.column
    }
}

/// Every error recorded while parsing one source, along with what could still be salvaged.
#[derive(Error, Debug)]
#[error("parsing errors: {}", .errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
pub struct ParseErrors {
    errors: Vec<ParseError>,
    salvaged: ParseResult,
}

impl ParseErrors {
    pub(crate) fn new(errors: Vec<ParseError>, salvaged: ParseResult) -> Self {
        Self { errors, salvaged }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Rules and variables that parsed despite the errors.
    pub fn salvaged(&self) -> &ParseResult {
        &self.salvaged
    }

    pub fn into_salvaged(self) -> ParseResult {
        self.salvaged
    }
}

#[test]
fn test_display() {
    let plain = ParseError::new("expected THEN after premise", Position::new(3, 24));

    assert_eq!(plain.to_string(), "expected THEN after premise at line 3, column 24");
    assert!(plain.source().is_none());

    let caused = ParseError::new("invalid number: 1.2.3", Position::new(1, 30))
        .with_cause("1.2.3".parse::<f64>().expect_err("not a float"));

    assert_eq!(caused.to_string(), "invalid number: 1.2.3 at line 1, column 30: invalid float literal");
    assert!(caused.source().is_some());
}

#[test]
fn test_joined() {
    let errors = ParseErrors::new(
        vec![
            ParseError::new("expected THEN after premise", Position::new(1, 24)),
            ParseError::new("missing semicolon at end of rule", Position::new(2, 40)),
        ],
        ParseResult::default(),
    );

    assert_eq!(
        errors.to_string(),
        "parsing errors: expected THEN after premise at line 1, column 24; \
         missing semicolon at end of rule at line 2, column 40"
    );
    assert_eq!(errors.errors()[1].line(), 2);
}
