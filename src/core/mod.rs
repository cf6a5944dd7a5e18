//! Core types - pure abstractions shared across the codebase.

mod kind;
mod token;

pub use kind::FileKind;
pub use token::{RequestToken, TokenCounter};
