//! `multiwatch config-dir`: nearest `.vscode` lookup.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use multiwatch_core::layout::{resolve_nearest_config_dir, SETTINGS_FILE};

#[derive(Args, Debug)]
pub struct ConfigDirArgs {
    /// File or directory to start from, relative to the root. Defaults to the root.
    pub path: Option<PathBuf>,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct ConfigDirJson {
    config_dir: String,
    settings: String,
}

impl ConfigDirArgs {
    pub fn run(self, root: &Path) -> Result<()> {
        let start = self.path.unwrap_or_else(|| root.to_path_buf());
        let config_dir = resolve_nearest_config_dir(root, &start);
        let settings = config_dir.join(SETTINGS_FILE);

        if self.json {
            let payload = ConfigDirJson {
                config_dir: config_dir.display().to_string(),
                settings: settings.display().to_string(),
            };
            println!(
                "{}",
                serde_json::to_string_pretty(&payload)
                    .context("failed to serialize config-dir JSON")?
            );
            return Ok(());
        }

        println!("config dir: {}", config_dir.display());
        println!("settings:   {}", settings.display());
        Ok(())
    }
}
