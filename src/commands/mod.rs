pub mod activity;
pub mod config;
pub mod group;
pub mod pull;
pub mod scan;
pub mod stats;
pub mod status;
pub mod tag;

pub use activity::*;
pub use config::*;
pub use group::*;
pub use pull::*;
pub use scan::*;
pub use stats::*;
pub use status::*;
pub use tag::*;

/// How a command that ran to completion went
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    /// At least one repository failed; the process should exit non-zero
    Failed,
}

impl CommandStatus {
    pub fn from_success(success: bool) -> Self {
        if success {
            CommandStatus::Success
        } else {
            CommandStatus::Failed
        }
    }
}
