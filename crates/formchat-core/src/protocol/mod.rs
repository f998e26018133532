//! The line protocol the model answers in.
//!
//! ```text
//! SET FirstName John
//! SET License 555-55-5555
//! SAY Thanks, John. Your registration is saved.
//! SAVE
//! ```
//!
//! Anything else in a reply is ignored.

mod directive;
mod outcome;

pub use directive::{Directive, interpret, serialize};
pub use outcome::TurnOutcome;
