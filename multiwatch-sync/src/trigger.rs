//! Fire-and-forget sync invocations.
//!
//! Every call to [`SyncTrigger::trigger`] spawns one invocation; nothing is
//! coalesced here. Invocations of the same domain run one after another,
//! different domains run side by side.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::pipeline::{SyncCommand, SyncDomain, SyncReport};
use crate::SyncError;

#[derive(Debug, Default)]
struct DomainLocks {
    all: Mutex<()>,
    vscode: Mutex<()>,
    rules: Mutex<()>,
}

impl DomainLocks {
    fn for_domain(&self, domain: Option<SyncDomain>) -> &Mutex<()> {
        match domain {
            None => &self.all,
            Some(SyncDomain::Vscode) => &self.vscode,
            Some(SyncDomain::Rules) => &self.rules,
        }
    }
}

/// Spawns external sync invocations without blocking the caller.
#[derive(Debug, Clone)]
pub struct SyncTrigger {
    command: Arc<SyncCommand>,
    locks: Arc<DomainLocks>,
}

impl SyncTrigger {
    pub fn new(command: SyncCommand) -> Self {
        Self {
            command: Arc::new(command),
            locks: Arc::new(DomainLocks::default()),
        }
    }

    pub fn command(&self) -> &SyncCommand {
        &self.command
    }

    /// Spawn one invocation for `domain` (`None` = full sync).
    ///
    /// Must be called from within a tokio runtime. The outcome is logged
    /// inside the task; the returned handle may be dropped.
    pub fn trigger(&self, domain: Option<SyncDomain>) -> JoinHandle<Result<SyncReport, SyncError>> {
        let command = self.command.clone();
        let locks = self.locks.clone();
        tokio::spawn(async move {
            let _guard = locks.for_domain(domain).lock().await;
            let result = command.run(domain).await;
            match &result {
                Ok(report) => tracing::info!(
                    domain = report.domain,
                    command = %report.command,
                    duration_ms = report.duration_ms,
                    "sync succeeded",
                ),
                Err(err) => tracing::error!(
                    domain = SyncDomain::label(domain),
                    error = %err,
                    "sync failed",
                ),
            }
            result
        })
    }

    /// Trigger and wait for the outcome. Used by the one-shot CLI path.
    pub async fn run(&self, domain: Option<SyncDomain>) -> Result<SyncReport, SyncError> {
        self.trigger(domain)
            .await
            .map_err(|err| SyncError::Join(err.to_string()))?
    }
}
