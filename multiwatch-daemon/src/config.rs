//! Daemon settings.
//!
//! Precedence, highest first: explicit overrides (CLI flags or environment,
//! parsed by the CLI), the workspace `settings.json`, built-in defaults.

use std::time::Duration;

use multiwatch_core::{store, WorkspaceLayout};
use multiwatch_sync::DEFAULT_EXECUTABLE;
use serde_json::Value;

/// Key under which the workspace `settings.json` names the sync executable.
pub const EXECUTABLE_SETTING: &str = "cursorMulti.executablePath";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub executable: String,
    /// Per watch root; zero disables debouncing.
    pub debounce: Duration,
    pub log_json: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            executable: DEFAULT_EXECUTABLE.to_string(),
            debounce: Duration::ZERO,
            log_json: false,
        }
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub executable: Option<String>,
    pub debounce_ms: Option<u64>,
    pub log_json: bool,
}

impl Settings {
    pub fn resolve(layout: &WorkspaceLayout, overrides: &SettingsOverrides) -> Self {
        let mut settings = Settings::default();

        if let Some(executable) = executable_from_workspace(layout) {
            settings.executable = executable;
        }
        if let Some(executable) = overrides.executable.as_ref().filter(|e| !e.trim().is_empty()) {
            settings.executable = executable.clone();
        }
        if let Some(ms) = overrides.debounce_ms {
            settings.debounce = Duration::from_millis(ms);
        }
        settings.log_json = overrides.log_json;
        settings
    }
}

fn executable_from_workspace(layout: &WorkspaceLayout) -> Option<String> {
    let path = layout.settings_path(layout.root());
    match store::read_json(&path, false) {
        Ok(Some(doc)) => doc
            .get(EXECUTABLE_SETTING)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
        Ok(None) => None,
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "ignoring unreadable workspace settings",
            );
            None
        }
    }
}
