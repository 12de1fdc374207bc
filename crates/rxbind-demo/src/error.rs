#![forbid(unsafe_code)]

use rxbind_runtime::RuntimeError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DemoError>;

/// A payload that did not decode as the expected JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("decode failed at line {line}, column {column}: {message}")]
pub struct DecodeError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self {
            message: err.to_string(),
            line: err.line(),
            column: err.column(),
        }
    }
}

/// Failures of the fetch collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("invalid url: {url}")]
    InvalidUrl { url: String },

    #[error("transport error: {message}")]
    Transport { message: String },

    #[error("unexpected HTTP status {code}")]
    Status { code: u16 },

    #[error("no response registered for {url}")]
    NotFound { url: String },

    #[error("fetching {url} needs the `http` feature")]
    Unsupported { url: String },
}

/// Terminal failure of a load pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("invalid validation pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("load failed: {0}")]
    Load(#[from] LoadError),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("logging setup failed: {message}")]
    Logging { message: String },
}

impl DemoError {
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidPattern { .. } => 2,
            Self::Load(_) => 3,
            Self::Runtime(_) => 4,
            Self::Logging { .. } => 1,
        }
    }
}
