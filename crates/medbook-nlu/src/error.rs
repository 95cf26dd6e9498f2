use thiserror::Error;

/// Errors raised while building a classifier.
#[derive(Debug, Error)]
pub enum NluError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}
