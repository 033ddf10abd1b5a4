//! `multiwatch sync`: run the external sync command.
//!
//! Goes through the daemon when one is listening so invocations stay
//! serialized per domain; otherwise runs the command directly and waits.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use multiwatch_core::WorkspaceLayout;
use multiwatch_daemon::{request_sync, DaemonError, Settings, SettingsOverrides};
use multiwatch_sync::{SyncCommand, SyncDomain};

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Domain to sync: vscode or rules. Omit for everything.
    pub domain: Option<SyncDomain>,

    /// Sync executable for a direct run. Ignored when the daemon is running.
    #[arg(long, env = "MULTIWATCH_EXECUTABLE")]
    pub executable: Option<String>,
}

impl SyncArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        match request_sync(root, self.domain) {
            Ok(_) => {
                println!(
                    "queued {} sync on the daemon",
                    SyncDomain::label(self.domain).bold()
                );
                return Ok(());
            }
            Err(DaemonError::DaemonNotRunning { .. }) => {}
            Err(err) => return Err(err).context("failed to queue sync on daemon"),
        }

        let layout = WorkspaceLayout::load(root)
            .with_context(|| format!("failed to resolve workspace at {}", root.display()))?;
        let settings = Settings::resolve(
            &layout,
            &SettingsOverrides {
                executable: self.executable,
                ..SettingsOverrides::default()
            },
        );
        let command = SyncCommand::new(settings.executable, layout.root());

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to build tokio runtime")?;
        let report = runtime
            .block_on(command.run(self.domain))
            .with_context(|| format!("`{}` failed", command.describe(self.domain)))?;

        if !report.stdout.is_empty() {
            println!("{}", report.stdout);
        }
        println!(
            "{} {} ({} ms)",
            "synced".green().bold(),
            report.domain,
            report.duration_ms
        );
        Ok(())
    }
}
