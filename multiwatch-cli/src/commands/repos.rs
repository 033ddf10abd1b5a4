//! `multiwatch repos`: repositories from `multi.json` and their watch roots.

use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use multiwatch_core::layout::{config_dir, rules_dir};
use multiwatch_core::WorkspaceLayout;

#[derive(Tabled)]
struct RepoRow {
    #[tabled(rename = "folder")]
    folder: String,
    #[tabled(rename = "url")]
    url: String,
    #[tabled(rename = ".vscode")]
    config: String,
    #[tabled(rename = ".cursor/rules")]
    rules: String,
}

pub fn run(root: &Path) -> Result<()> {
    let layout = WorkspaceLayout::load(root)
        .with_context(|| format!("failed to resolve workspace at {}", root.display()))?;

    println!(
        "Multiwatch v{} | {} | {} repositories",
        env!("CARGO_PKG_VERSION"),
        root.display(),
        layout.repository_folders().len(),
    );
    if layout.repository_folders().is_empty() {
        println!("No repositories listed in multi.json.");
        return Ok(());
    }

    let rows: Vec<RepoRow> = layout
        .repositories()
        .iter()
        .zip(layout.repository_folders())
        .map(|(descriptor, folder)| RepoRow {
            folder: descriptor.folder_name().unwrap_or_default().to_string(),
            url: descriptor.url.clone(),
            config: presence(&config_dir(folder)),
            rules: rules_presence(folder),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    Ok(())
}

fn presence(dir: &Path) -> String {
    if dir.is_dir() {
        "watched".green().to_string()
    } else {
        "missing".bright_black().to_string()
    }
}

/// Rules are only watched alongside a repository's `.vscode` dir.
fn rules_presence(folder: &Path) -> String {
    if !config_dir(folder).is_dir() && rules_dir(folder).is_dir() {
        return "skipped (no .vscode)".yellow().to_string();
    }
    presence(&rules_dir(folder))
}
