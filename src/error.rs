use thiserror::Error;

use crate::dsl::ParseErrors;

#[derive(Error, Debug)]
pub enum FuzzyError {
    #[error("undefined variable '{name}'")]
    UndefinedVariable { name: String },
    #[error("undefined term '{term}' for variable '{variable}'")]
    UndefinedTerm { variable: String, term: String },
    #[error("value not found for variable '{variable}'")]
    ValueNotFound { variable: String },
    #[error("variable '{name}' already exists")]
    VariableAlreadyExists { name: String },
    #[error("term '{term}' already exists in variable '{variable}'")]
    TermAlreadyExists { variable: String, term: String },
    #[error("missing arguments: AND/OR need at least one operand")]
    MissingArguments,
    #[error(transparent)]
    Parse(#[from] ParseErrors),
}

pub type Result<T, E = FuzzyError> = std::result::Result<T, E>;
