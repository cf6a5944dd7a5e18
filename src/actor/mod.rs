//! Scheduling Layer
//!
//! One engine actor owns the session; everything else talks to it through
//! messages:
//!
//! ```text
//! FsActor ──┐
//!           ├──EngineMsg──> EngineActor ──> Surface / ResourceStore
//! stdin  ───┘                   │  ^
//!                        spawn  v  │ JobFinished
//!                          remote job tasks
//! ```
//!
//! # Module Structure
//!
//! - `messages` - message and error types
//! - `debouncer` - trailing debounce timing
//! - `session` - the context object the engine owns
//! - `engine` - the event loop and its handle
//! - `fs` - file system watcher feeding the engine

pub mod debouncer;
pub mod engine;
pub mod fs;
pub mod messages;
pub mod session;


pub use engine::{EngineActor, EngineHandle};
pub use fs::FsActor;
pub use messages::{EngineError, EngineMsg, RerunError};
pub use session::Session;
