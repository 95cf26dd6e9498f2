//! Outbound message delivery.

use async_trait::async_trait;
use medbook_core::UserId;

use crate::error::DialogError;

/// Delivers an answer to the user on whatever channel they wrote from.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, user_id: &UserId, text: &str) -> Result<(), DialogError>;
}

/// Transport that only records outbound messages in the log. Used by the
/// HTTP server, where the answer is also returned in the response body.
pub struct LogTransport;

#[async_trait]
impl Transport for LogTransport {
    async fn deliver(&self, user_id: &UserId, text: &str) -> Result<(), DialogError> {
        tracing::info!(user_id = %user_id, chars = text.chars().count(), "Answer delivered");
        tracing::debug!(user_id = %user_id, text = %text, "Answer text");
        Ok(())
    }
}
