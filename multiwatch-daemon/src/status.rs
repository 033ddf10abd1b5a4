//! "N of M running" display payload and the sinks it is pushed to.

use std::path::PathBuf;

use multiwatch_core::store;
use serde::{Deserialize, Serialize};

use crate::tracker::SessionCounters;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayState {
    /// No compound resolved.
    Idle,
    Partial,
    FullyRunning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayPayload {
    pub text: String,
    pub tooltip: String,
    pub emphasis: bool,
    pub state: DisplayState,
}

pub fn render(counters: SessionCounters) -> DisplayPayload {
    let SessionCounters { running, total } = counters;
    let state = if total == 0 {
        DisplayState::Idle
    } else if running == total {
        DisplayState::FullyRunning
    } else {
        DisplayState::Partial
    };
    DisplayPayload {
        text: format!("{running}/{total}"),
        tooltip: format!("Running {running} out of {total}"),
        emphasis: state == DisplayState::FullyRunning,
        state,
    }
}

/// Destination for rendered payloads.
pub trait DisplaySink: Send {
    fn show(&mut self, payload: &DisplayPayload);
}

/// Writes every payload to the daemon log.
#[derive(Debug, Default)]
pub struct LogSink;

impl DisplaySink for LogSink {
    fn show(&mut self, payload: &DisplayPayload) {
        tracing::info!(
            text = %payload.text,
            emphasis = payload.emphasis,
            "updating status indicator",
        );
    }
}

/// Persists the latest payload as JSON so other tools can render it.
#[derive(Debug)]
pub struct StatusFileSink {
    path: PathBuf,
}

impl StatusFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DisplaySink for StatusFileSink {
    fn show(&mut self, payload: &DisplayPayload) {
        if let Err(err) = store::write_json(&self.path, payload) {
            tracing::warn!(
                path = %self.path.display(),
                error = %err,
                "failed to write status file",
            );
        }
    }
}

/// Renders counters and fans the payload out to every sink.
pub struct StatusReporter {
    sinks: Vec<Box<dyn DisplaySink>>,
    latest: DisplayPayload,
}

impl StatusReporter {
    pub fn new(sinks: Vec<Box<dyn DisplaySink>>) -> Self {
        Self {
            sinks,
            latest: render(SessionCounters::default()),
        }
    }

    pub fn publish(&mut self, counters: SessionCounters) -> &DisplayPayload {
        self.latest = render(counters);
        for sink in &mut self.sinks {
            sink.show(&self.latest);
        }
        &self.latest
    }

    pub fn latest(&self) -> &DisplayPayload {
        &self.latest
    }
}
