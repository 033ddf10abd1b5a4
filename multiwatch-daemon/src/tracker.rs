//! Running/total counter for members of the active compound.

use std::collections::BTreeSet;

use multiwatch_core::{CompoundDefinition, SessionName};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionCounters {
    pub running: usize,
    pub total: usize,
}

/// All counter mutation goes through these methods so `running` only ever
/// moves for names in the current member set and never drops below zero.
#[derive(Debug, Default)]
pub struct SessionTracker {
    members: BTreeSet<SessionName>,
    counters: SessionCounters,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn counters(&self) -> SessionCounters {
        self.counters
    }

    pub fn is_member(&self, name: &SessionName) -> bool {
        self.members.contains(name)
    }

    /// Returns the new counters when they changed.
    pub fn on_session_start(&mut self, name: &SessionName) -> Option<SessionCounters> {
        if !self.is_member(name) {
            tracing::debug!(session = %name, "ignoring start of non-member session");
            return None;
        }
        self.counters.running += 1;
        tracing::info!(
            session = %name,
            running = self.counters.running,
            "debug session started",
        );
        Some(self.counters)
    }

    /// Returns the new counters when they changed.
    pub fn on_session_stop(&mut self, name: &SessionName) -> Option<SessionCounters> {
        if !self.is_member(name) {
            tracing::debug!(session = %name, "ignoring stop of non-member session");
            return None;
        }
        if self.counters.running == 0 {
            return None;
        }
        self.counters.running -= 1;
        tracing::info!(
            session = %name,
            running = self.counters.running,
            "debug session ended",
        );
        Some(self.counters)
    }

    /// Replace the member set and reset `running` to zero, unconditionally.
    pub fn on_compound_recomputed(&mut self, definition: &CompoundDefinition) -> SessionCounters {
        self.members = definition.members.clone();
        self.counters = SessionCounters {
            running: 0,
            total: definition.total,
        };
        tracing::info!(total = definition.total, "total configurations in largest compound");
        self.counters
    }
}
