//! Workspace watcher daemon: file watches, compound session counting,
//! sync invocation and the control socket.

pub mod compound;
pub mod config;
pub mod engine;
mod error;
pub mod paths;
pub mod protocol;
mod runtime;
pub mod status;
pub mod tracker;
pub mod watch;

pub use compound::{CompoundResolver, CompoundState};
pub use config::{Settings, SettingsOverrides};
pub use engine::{Engine, EngineEvent, StatusSnapshot};
pub use error::DaemonError;
pub use protocol::{
    request_session, request_status, request_stop, request_sync, send_request, DaemonRequest,
    DaemonResponse,
};
pub use runtime::{run, start_blocking};
pub use status::{DisplayPayload, DisplaySink, DisplayState, StatusReporter};
pub use tracker::{SessionCounters, SessionTracker};
