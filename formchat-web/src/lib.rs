//! FormChat web server.
//!
//! Serves the form pages and the chat endpoint on top of
//! [`formchat_application::FormChatService`].

pub mod cookies;
pub mod error;
pub mod pages;
pub mod qr;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::AppState;
