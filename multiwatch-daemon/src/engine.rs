//! The single loop that owns compound, counter and display state.
//!
//! Watcher callbacks, socket clients and startup all post [`EngineEvent`]s;
//! only [`Engine::handle`] mutates state, one event at a time.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use multiwatch_core::SessionName;
use multiwatch_sync::{SyncDomain, SyncError, SyncReport, SyncTrigger};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use crate::compound::CompoundResolver;
use crate::status::{DisplayPayload, StatusReporter};
use crate::tracker::{SessionCounters, SessionTracker};
use crate::watch::{Change, WatchDomain, WatchRegistration};

#[derive(Debug)]
pub enum EngineEvent {
    Changed(Change),
    SessionStarted(SessionName),
    SessionStopped(SessionName),
    Sync {
        domain: Option<SyncDomain>,
    },
    Status {
        respond_to: oneshot::Sender<StatusSnapshot>,
    },
}

/// What the engine did with one event.
#[derive(Debug)]
pub enum Dispatch {
    Recomputed(SessionCounters),
    Counters(SessionCounters),
    Sync(JoinHandle<Result<SyncReport, SyncError>>),
    Status,
    /// Held until its watch root has been quiet for the debounce window.
    Deferred,
    Ignored,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub running: usize,
    pub total: usize,
    pub compound: Option<String>,
    pub members: Vec<String>,
    pub launch_manifest: PathBuf,
    pub display: DisplayPayload,
    pub executable: String,
    pub watches: Vec<WatchRegistration>,
}

pub struct Engine {
    resolver: CompoundResolver,
    tracker: SessionTracker,
    reporter: StatusReporter,
    trigger: SyncTrigger,
    watches: Vec<WatchRegistration>,
    pending: HashMap<(WatchDomain, PathBuf), PendingChange>,
    debounce_window: Duration,
}

/// Latest change seen for one watch root and when it becomes due.
#[derive(Debug)]
struct PendingChange {
    change: Change,
    due: Instant,
}

impl Engine {
    pub fn new(
        resolver: CompoundResolver,
        reporter: StatusReporter,
        trigger: SyncTrigger,
        debounce_window: Duration,
    ) -> Self {
        Self {
            resolver,
            tracker: SessionTracker::new(),
            reporter,
            trigger,
            watches: Vec::new(),
            pending: HashMap::new(),
            debounce_window,
        }
    }

    pub fn with_watches(mut self, watches: Vec<WatchRegistration>) -> Self {
        self.watches = watches;
        self
    }

    /// Initial compound resolution; makes the display visible.
    pub fn start(&mut self) -> SessionCounters {
        self.recompute()
    }

    pub fn counters(&self) -> SessionCounters {
        self.tracker.counters()
    }

    pub fn handle(&mut self, event: EngineEvent) -> Dispatch {
        match event {
            EngineEvent::Changed(change) => {
                if self.debounce_window.is_zero() {
                    return self.apply_change(change);
                }
                self.defer(change, Instant::now());
                Dispatch::Deferred
            }
            EngineEvent::SessionStarted(name) => match self.tracker.on_session_start(&name) {
                Some(counters) => {
                    self.reporter.publish(counters);
                    Dispatch::Counters(counters)
                }
                None => Dispatch::Ignored,
            },
            EngineEvent::SessionStopped(name) => match self.tracker.on_session_stop(&name) {
                Some(counters) => {
                    self.reporter.publish(counters);
                    Dispatch::Counters(counters)
                }
                None => Dispatch::Ignored,
            },
            EngineEvent::Sync { domain } => Dispatch::Sync(self.trigger.trigger(domain)),
            EngineEvent::Status { respond_to } => {
                let _ = respond_to.send(self.snapshot());
                Dispatch::Status
            }
        }
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        let counters = self.tracker.counters();
        let definition = self.resolver.definition();
        StatusSnapshot {
            running: counters.running,
            total: counters.total,
            compound: definition.name,
            members: definition.members.into_iter().map(|m| m.0).collect(),
            launch_manifest: self.resolver.manifest_path().to_path_buf(),
            display: self.reporter.latest().clone(),
            executable: self.trigger.command().executable().to_string(),
            watches: self.watches.clone(),
        }
    }

    /// Every recompute resets the running count, even if nothing changed.
    fn recompute(&mut self) -> SessionCounters {
        let definition = self.resolver.recompute();
        let counters = self.tracker.on_compound_recomputed(&definition);
        self.reporter.publish(counters);
        counters
    }

    /// Earliest instant at which a held change becomes due.
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.values().map(|pending| pending.due).min()
    }

    /// Apply every held change whose root has been quiet until `now`.
    pub fn flush_due(&mut self, now: Instant) -> Vec<Dispatch> {
        let keys: Vec<(WatchDomain, PathBuf)> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.due <= now)
            .map(|(key, _)| key.clone())
            .collect();
        let mut due: Vec<PendingChange> = keys
            .iter()
            .filter_map(|key| self.pending.remove(key))
            .collect();
        due.sort_by_key(|pending| pending.due);
        due.into_iter()
            .map(|pending| self.apply_change(pending.change))
            .collect()
    }

    /// Every new change pushes its root's deadline out by one full window.
    fn defer(&mut self, change: Change, now: Instant) {
        tracing::debug!(path = %change.path.display(), "holding change until root is quiet");
        let due = now + self.debounce_window;
        self.pending.insert(
            (change.domain, change.root.clone()),
            PendingChange { change, due },
        );
    }

    fn apply_change(&mut self, change: Change) -> Dispatch {
        let path = change.path.display();
        match change.domain {
            WatchDomain::Launch => {
                tracing::info!(path = %path, "root launch configuration changed");
                Dispatch::Recomputed(self.recompute())
            }
            WatchDomain::Vscode => {
                tracing::info!(path = %path, "changes detected");
                Dispatch::Sync(self.trigger.trigger(Some(SyncDomain::Vscode)))
            }
            WatchDomain::Rules => {
                tracing::info!(path = %path, "changes detected");
                Dispatch::Sync(self.trigger.trigger(Some(SyncDomain::Rules)))
            }
        }
    }
}

/// Drain events until shutdown. Sync handles are dropped: the trigger logs
/// their outcome itself.
pub async fn engine_task(
    mut engine: Engine,
    mut events: mpsc::UnboundedReceiver<EngineEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        let next_due = engine.next_due();
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            event = events.recv() => {
                let Some(event) = event else { break };
                engine.handle(event);
            }
            _ = sleep_until(next_due.unwrap_or_else(Instant::now)), if next_due.is_some() => {
                engine.flush_due(Instant::now());
            }
        }
    }
}

pub(crate) fn workspace_label(root: &Path) -> String {
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string())
}
