//! `multiwatch status`: session counter and watch registrations.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Deserialize;
use serde_json::{json, Value};
use tabled::{settings::Style, Table, Tabled};

use multiwatch_daemon::paths::socket_path;
use multiwatch_daemon::{request_status, DaemonError, DisplayPayload, DisplayState};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl StatusArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let payload = match request_status(root) {
            Ok(payload) => payload,
            Err(DaemonError::DaemonNotRunning { .. }) => {
                if self.json {
                    print_json(&json!({
                        "running": false,
                        "socket": socket_path(root).display().to_string(),
                    }))?;
                } else {
                    println!("{}", "daemon is not running".bright_black());
                }
                return Ok(());
            }
            Err(err) => return Err(err).context("failed to query daemon status"),
        };

        if self.json {
            return print_json(&payload);
        }

        let snapshot: SnapshotView = serde_json::from_value(
            payload.get("status").cloned().unwrap_or(Value::Null),
        )
        .context("daemon returned an unexpected status payload")?;
        print_snapshot(snapshot);
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SnapshotView {
    compound: Option<String>,
    members: Vec<String>,
    launch_manifest: String,
    display: DisplayPayload,
    executable: String,
    watches: Vec<WatchView>,
}

#[derive(Debug, Deserialize)]
struct WatchView {
    root: String,
    domain: String,
    recursive: bool,
    file_name: Option<String>,
    active: bool,
}

#[derive(Tabled)]
struct WatchRow {
    #[tabled(rename = "domain")]
    domain: String,
    #[tabled(rename = "root")]
    root: String,
    #[tabled(rename = "filter")]
    filter: String,
    #[tabled(rename = "state")]
    state: String,
}

fn print_snapshot(snapshot: SnapshotView) {
    println!("{}  {}", indicator(&snapshot.display), snapshot.display.tooltip);
    match snapshot.compound.as_deref() {
        Some(name) => println!("compound: {name}"),
        None if snapshot.members.is_empty() => println!("compound: none"),
        None => println!("compound: (unnamed)"),
    }
    if !snapshot.members.is_empty() {
        println!("members:  {}", snapshot.members.join(", "));
    }
    println!("manifest: {}", snapshot.launch_manifest);
    println!("sync:     {}", snapshot.executable);

    if snapshot.watches.is_empty() {
        return;
    }
    let rows: Vec<WatchRow> = snapshot
        .watches
        .into_iter()
        .map(|watch| WatchRow {
            domain: watch.domain,
            root: watch.root,
            filter: match (watch.file_name, watch.recursive) {
                (Some(name), _) => name,
                (None, true) => "**/*".to_string(),
                (None, false) => "*".to_string(),
            },
            state: if watch.active {
                "active".green().to_string()
            } else {
                "inactive".red().to_string()
            },
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
}

fn indicator(display: &DisplayPayload) -> String {
    match display.state {
        DisplayState::Idle => display.text.bright_black().bold().to_string(),
        DisplayState::Partial => display.text.yellow().bold().to_string(),
        DisplayState::FullyRunning => display.text.black().on_yellow().bold().to_string(),
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("failed to serialize status JSON")?
    );
    Ok(())
}
