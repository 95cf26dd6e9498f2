use thiserror::Error;

/// Top-level error type for the Medbook system.
///
/// Subsystem crates define their own error types and convert into or out of
/// `MedbookError` where they cross crate boundaries.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MedbookError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unknown doctor: {0}")]
    UnknownDoctor(String),

    #[error("Doctor directory is empty")]
    EmptyDirectory,
}

impl From<toml::de::Error> for MedbookError {
    fn from(err: toml::de::Error) -> Self {
        MedbookError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for MedbookError {
    fn from(err: toml::ser::Error) -> Self {
        MedbookError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for MedbookError {
    fn from(err: serde_json::Error) -> Self {
        MedbookError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Medbook operations.
pub type Result<T> = std::result::Result<T, MedbookError>;
