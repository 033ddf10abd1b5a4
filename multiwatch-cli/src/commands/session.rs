//! `multiwatch session`: lifecycle events from the debugger host.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Subcommand;

use multiwatch_daemon::{request_session, DaemonError};

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// A debug session with this configuration name started.
    Start { name: String },
    /// A debug session with this configuration name ended.
    Stop { name: String },
}

pub fn run(root: &Path, command: SessionCommand) -> Result<()> {
    let (name, started) = match command {
        SessionCommand::Start { name } => (name, true),
        SessionCommand::Stop { name } => (name, false),
    };

    match request_session(root, &name, started) {
        Ok(_) => Ok(()),
        Err(DaemonError::DaemonNotRunning { socket }) => {
            bail!("daemon is not running (no socket at {})", socket.display())
        }
        Err(err) => Err(err).with_context(|| format!("failed to report session '{name}'")),
    }
}
