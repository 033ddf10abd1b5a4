//! Multiwatch: multi-repository workspace watcher.
//!
//! # Usage
//!
//! ```text
//! multiwatch [--root <path>] watch [--executable <path>] [--debounce-ms <ms>] [--log-json]
//! multiwatch [--root <path>] status [--json]
//! multiwatch [--root <path>] session start|stop <name>
//! multiwatch [--root <path>] sync [vscode|rules]
//! multiwatch [--root <path>] stop
//! multiwatch [--root <path>] repos
//! multiwatch [--root <path>] config-dir [<path>]
//! ```

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{
    config_dir::ConfigDirArgs, session::SessionCommand, status::StatusArgs, sync::SyncArgs,
    watch::WatchArgs,
};

#[derive(Parser, Debug)]
#[command(
    name = "multiwatch",
    version,
    about = "Watch a multi-repository workspace and keep its shared config in sync",
    long_about = None,
)]
struct Cli {
    /// Workspace root containing `multi.json`. Defaults to the current directory.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the watcher daemon in the foreground.
    Watch(WatchArgs),

    /// Show the running/total session counter of the daemon.
    Status(StatusArgs),

    /// Report debug session lifecycle events to the daemon.
    Session {
        #[command(subcommand)]
        command: SessionCommand,
    },

    /// Run the external sync command for one domain or everything.
    Sync(SyncArgs),

    /// Request graceful daemon shutdown.
    Stop,

    /// List repositories resolved from `multi.json`.
    Repos,

    /// Show the nearest config directory for a path.
    ConfigDir(ConfigDirArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir().context("could not determine current directory")?,
    };

    match cli.command {
        Commands::Watch(args) => args.run(&root),
        Commands::Status(args) => args.run(&root),
        Commands::Session { command } => commands::session::run(&root, command),
        Commands::Sync(args) => args.run(&root),
        Commands::Stop => commands::stop::run(&root),
        Commands::Repos => commands::repos::run(&root),
        Commands::ConfigDir(args) => args.run(&root),
    }
}
