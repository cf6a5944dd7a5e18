//! Configuration sections of `codepad.toml`.

mod compile;
mod output;
mod remote;
mod schedule;

pub use compile::CompileConfig;
pub use output::OutputConfig;
pub use remote::{RemoteConfig, RerunPolicy};
pub use schedule::ScheduleConfig;
