pub mod classifier;
pub mod error;

pub use classifier::{PatternClassifier, GREETING_BYE, GREETING_HELLO};
pub use error::NluError;
