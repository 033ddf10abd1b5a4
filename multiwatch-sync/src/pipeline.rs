//! The external sync command: `<executable> sync [vscode|rules]`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::SyncError;

/// Executable used when nothing is configured.
pub const DEFAULT_EXECUTABLE: &str = "multi";

/// Sync domain passed to the external command. `None` means "sync everything".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncDomain {
    Vscode,
    Rules,
}

impl SyncDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncDomain::Vscode => "vscode",
            SyncDomain::Rules => "rules",
        }
    }

    /// Log label for an optional domain.
    pub fn label(domain: Option<SyncDomain>) -> &'static str {
        domain.map(SyncDomain::as_str).unwrap_or("all")
    }
}

impl fmt::Display for SyncDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncDomain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vscode" => Ok(SyncDomain::Vscode),
            "rules" => Ok(SyncDomain::Rules),
            other => Err(format!(
                "unknown sync domain '{other}'; expected: vscode, rules"
            )),
        }
    }
}

/// Outcome of a successful invocation.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub domain: &'static str,
    pub command: String,
    pub stdout: String,
    pub duration_ms: u128,
}

/// A configured sync command bound to the workspace root.
#[derive(Debug, Clone)]
pub struct SyncCommand {
    executable: String,
    cwd: PathBuf,
}

impl SyncCommand {
    pub fn new(executable: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            cwd: cwd.into(),
        }
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    pub fn args(domain: Option<SyncDomain>) -> Vec<&'static str> {
        match domain {
            Some(domain) => vec!["sync", domain.as_str()],
            None => vec!["sync"],
        }
    }

    /// Human-readable command line, e.g. `multi sync rules`.
    pub fn describe(&self, domain: Option<SyncDomain>) -> String {
        let mut parts = vec![self.executable.as_str()];
        parts.extend(Self::args(domain));
        parts.join(" ")
    }

    /// Run the command to completion and capture its output.
    pub async fn run(&self, domain: Option<SyncDomain>) -> Result<SyncReport, SyncError> {
        let started = Instant::now();
        let command = self.describe(domain);

        let output = Command::new(&self.executable)
            .args(Self::args(domain))
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| SyncError::Spawn {
                command: command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(SyncError::InvocationFailed {
                domain: SyncDomain::label(domain),
                command,
                status: output.status.to_string(),
                output: if stderr.is_empty() { stdout } else { stderr },
            });
        }

        Ok(SyncReport {
            domain: SyncDomain::label(domain),
            command,
            stdout,
            duration_ms: started.elapsed().as_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_omit_domain_for_full_sync() {
        assert_eq!(SyncCommand::args(None), vec!["sync"]);
        assert_eq!(SyncCommand::args(Some(SyncDomain::Rules)), vec!["sync", "rules"]);
    }

    #[test]
    fn describe_uses_configured_executable() {
        let cmd = SyncCommand::new("/opt/bin/multi", "/ws");
        assert_eq!(cmd.describe(Some(SyncDomain::Vscode)), "/opt/bin/multi sync vscode");
        assert_eq!(cmd.describe(None), "/opt/bin/multi sync");
    }

    #[test]
    fn domain_parses_case_insensitively() {
        assert_eq!("VSCode".parse::<SyncDomain>(), Ok(SyncDomain::Vscode));
        assert!("settings".parse::<SyncDomain>().is_err());
    }

    #[tokio::test]
    async fn missing_executable_is_a_spawn_error() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let cmd = SyncCommand::new("multiwatch-definitely-not-installed", dir.path());
        let err = cmd.run(None).await.unwrap_err();
        assert!(matches!(err, SyncError::Spawn { .. }), "got: {err}");
    }
}
