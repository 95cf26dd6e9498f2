pub mod config;
pub mod error;
pub mod types;

pub use config::MedbookConfig;
pub use error::{MedbookError, Result};
pub use types::*;
