//! Booking backend: receives completed bookings and handoff requests.

use async_trait::async_trait;
use medbook_core::UserId;

use crate::error::DialogError;
use crate::types::BookingRequest;

/// Downstream system the dialog reports to. Calls are dispatched
/// fire-and-forget; errors are logged, never shown to the user.
#[async_trait]
pub trait BookingBackend: Send + Sync {
    async fn submit(&self, request: BookingRequest) -> Result<(), DialogError>;

    async fn hand_off(&self, user_id: &UserId) -> Result<(), DialogError>;
}

/// Backend that records requests as structured log events.
pub struct LoggingBackend;

#[async_trait]
impl BookingBackend for LoggingBackend {
    async fn submit(&self, request: BookingRequest) -> Result<(), DialogError> {
        let payload =
            serde_json::to_string(&request).map_err(|e| DialogError::Backend(e.to_string()))?;
        tracing::info!(
            booking_id = %request.id,
            user_id = %request.user_id,
            doctor = %request.doctor_id,
            at = %request.at,
            payload = %payload,
            "Booking request sent"
        );
        Ok(())
    }

    async fn hand_off(&self, user_id: &UserId) -> Result<(), DialogError> {
        tracing::info!(user_id = %user_id, "Passing the chat over to a human manager");
        Ok(())
    }
}
