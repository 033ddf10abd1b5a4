//! `multiwatch watch`: run the daemon in the foreground.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use multiwatch_daemon::{start_blocking, SettingsOverrides};

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Sync executable. Overrides `cursorMulti.executablePath` in settings.json.
    #[arg(long, env = "MULTIWATCH_EXECUTABLE")]
    pub executable: Option<String>,

    /// Suppress repeat events for the same watch root within this window.
    #[arg(long, env = "MULTIWATCH_DEBOUNCE_MS")]
    pub debounce_ms: Option<u64>,

    /// Emit log lines as JSON.
    #[arg(long)]
    pub log_json: bool,
}

impl WatchArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let overrides = SettingsOverrides {
            executable: self.executable,
            debounce_ms: self.debounce_ms,
            log_json: self.log_json,
        };
        start_blocking(root, overrides).context("daemon exited with error")
    }
}
