//! Error types for knnmap

use thiserror::Error;

/// Main error type for knnmap operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(String),

    #[error("Invalid argument: {name} = {value} ({reason})")]
    InvalidArgument {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Process failed: {0}")]
    Process(#[source] Box<Error>),
}

impl Error {
    /// Shorthand for an [`Error::InvalidArgument`].
    pub fn invalid_argument(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Error::InvalidArgument {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Wrap into a process-level error. Already-wrapped errors are not nested twice.
    pub fn into_process(self) -> Self {
        match self {
            Error::Process(_) => self,
            other => Error::Process(Box::new(other)),
        }
    }

    /// The innermost error, looking through any [`Error::Process`] wrapper.
    pub fn root(&self) -> &Error {
        match self {
            Error::Process(inner) => inner.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::GeoJson(e.to_string())
    }
}

/// Result type alias for knnmap operations
pub type Result<T> = std::result::Result<T, Error>;
