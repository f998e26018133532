//! Application layer for FormChat.
//!
//! This crate provides the chat use case that coordinates the domain model,
//! record storage and the completion agent.

pub mod context_loader;
pub mod form_chat_service;
pub mod prompt;
pub mod session;

pub use context_loader::{ContextLoader, LoadedContext};
pub use form_chat_service::{
    FormChatService, FormView, LinkingToken, NextForm, ServiceSettings, TranscriptEntry, TurnReply,
};
pub use session::{SessionCache, SessionKey};
