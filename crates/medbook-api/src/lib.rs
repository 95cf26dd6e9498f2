//! HTTP transport for the booking dialog.
//!
//! Exposes the doctor directory and a health check publicly, and the chat
//! and session management endpoints behind bearer token authentication.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod rate_limit;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
