pub mod agent;
pub mod config;
pub mod error;
pub mod form;
pub mod linking;
pub mod protocol;
pub mod record;
pub mod session;

// Re-export common error type
pub use error::{FormChatError, Result};
