//! Session domain module.
//!
//! # Module Structure
//!
//! - `message`: Conversation message types (`MessageRole`, `ChatMessage`)
//! - `model`: The per-visitor chat state machine (`ChatSession`, `TurnPlan`)

mod message;
mod model;

pub use message::{ChatMessage, MessageRole};
pub use model::{ChatSession, PendingSave, TurnPlan};
