//! Error types for multiwatch-sync.

use thiserror::Error;

/// Failure of a single external sync invocation.
///
/// These never escape the watch loop; the trigger logs them and moves on.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The executable could not be started at all.
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The executable ran and exited unsuccessfully.
    #[error("sync {domain} failed: `{command}` exited with {status}: {output}")]
    InvocationFailed {
        domain: &'static str,
        command: String,
        status: String,
        output: String,
    },

    /// The spawned sync task panicked or was aborted.
    #[error("sync task join error: {0}")]
    Join(String),
}
