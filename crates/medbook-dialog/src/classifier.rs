//! Seam to the natural-language-understanding layer.

use async_trait::async_trait;
use medbook_core::Classification;

use crate::error::DialogError;

/// Produces an intent label and entities for one utterance.
///
/// Implementations may call out to a remote model; failures surface as
/// [`DialogError::Classifier`] and abort the turn.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, text: &str, language: &str) -> Result<Classification, DialogError>;
}
