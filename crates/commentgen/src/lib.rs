//! Draft a blog comment by chaining a term suggestion service and a text
//! completion service.
//!
//! The entry point is [`orchestrator::CommentOrchestrator`]; the
//! [`action`] module shapes its outcome for the comment form.

mod error;
pub mod utils;
pub use error::{Error, ErrorKind, Result};

pub mod action;
pub mod clients;
pub mod completions;
pub mod config;
pub mod content;
pub mod orchestrator;
pub mod permission;
pub mod selection;
pub mod suggestions;
pub mod transport;
