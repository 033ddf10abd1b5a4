//! Multiwatch core library: manifest types, the JSON store and workspace layout.
//!
//! - [`types`]: newtypes and manifest structs
//! - [`store`]: missing-file-tolerant JSON read/write
//! - [`layout`]: repository folders and config-dir resolution
//! - [`error`]: [`StoreError`], [`LayoutError`]

pub mod error;
pub mod layout;
pub mod store;
pub mod types;

pub use error::{LayoutError, StoreError};
pub use layout::WorkspaceLayout;
pub use types::{
    CompoundDefinition, CompoundEntry, CompoundMember, LaunchManifest, RepositoryDescriptor,
    RepositoryManifest, SessionName,
};
