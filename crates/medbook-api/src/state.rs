//! State shared by every route handler.

use std::sync::Arc;
use std::time::Instant;

use medbook_core::config::ApiConfig;
use medbook_core::DoctorDirectory;
use medbook_dialog::DialogService;

/// Shared application state. Cloned per request; everything heavy is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Turn pipeline serving every user.
    pub service: Arc<DialogService>,
    /// Doctors offered for booking.
    pub directory: Arc<DoctorDirectory>,
    /// HTTP settings (bind address, rate limit).
    pub api: ApiConfig,
    /// Bearer token for protected routes. `None` disables authentication.
    pub api_token: Option<String>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    pub fn new(service: DialogService, api: ApiConfig, api_token: Option<String>) -> Self {
        let directory = Arc::clone(&service.registry().context().directory);
        Self {
            service: Arc::new(service),
            directory,
            api,
            api_token,
            start_time: Instant::now(),
        }
    }
}
