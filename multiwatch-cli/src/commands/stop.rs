use std::path::Path;

use anyhow::{Context, Result};

use multiwatch_daemon::{request_stop, DaemonError};

pub fn run(root: &Path) -> Result<()> {
    match request_stop(root) {
        Ok(()) => println!("daemon stop requested"),
        Err(DaemonError::DaemonNotRunning { .. }) => println!("daemon is not running"),
        Err(err) => return Err(err).context("failed to stop daemon"),
    }
    Ok(())
}
