//! Error types for docqa

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types shared by every docqa crate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Rerank error: {0}")]
    Rerank(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Document loader error: {0}")]
    DocumentLoader(String),

    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Failure to parse or evaluate an arithmetic expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("expression is empty")]
    Empty,

    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unexpected token '{token}' at position {pos}")]
    UnexpectedToken { token: String, pos: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("invalid number literal '{0}'")]
    InvalidNumber(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("numeric overflow")]
    Overflow,

    #[error("result is not a real number")]
    NotReal,
}
