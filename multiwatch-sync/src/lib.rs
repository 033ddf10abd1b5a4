//! # multiwatch-sync
//!
//! Invocation of the external workspace sync command.
//!
//! [`SyncCommand`] knows how to run `<executable> sync [domain]` in the
//! workspace root; [`SyncTrigger`] spawns those runs as background tasks.

pub mod error;
pub mod pipeline;
pub mod trigger;

pub use error::SyncError;
pub use pipeline::{SyncCommand, SyncDomain, SyncReport, DEFAULT_EXECUTABLE};
pub use trigger::SyncTrigger;
