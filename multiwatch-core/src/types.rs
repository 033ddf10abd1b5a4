//! Domain types for the workspace manifests.
//!
//! All path fields use `PathBuf`. Manifest structs are deserialized with
//! serde_json and are tolerant of fields the watcher does not care about.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of a debug/launch session as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionName(pub String);

impl fmt::Display for SessionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for SessionName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Repository manifest (multi.json)
// ---------------------------------------------------------------------------

/// One entry of the `repos` list in `multi.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryDescriptor {
    pub url: String,
}

impl RepositoryDescriptor {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Last non-empty `/`-separated segment of the url.
    ///
    /// `https://github.com/acme/api` and `https://github.com/acme/api/` both
    /// yield `api`. Returns `None` when no segment can be extracted or the
    /// segment is `.` or `..`.
    pub fn folder_name(&self) -> Option<&str> {
        self.url
            .split('/')
            .map(str::trim)
            .filter(|segment| !segment.is_empty())
            .last()
            .filter(|segment| !matches!(*segment, "." | ".."))
    }
}

/// Shape of `multi.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryManifest {
    pub repos: Vec<RepositoryDescriptor>,
}

// ---------------------------------------------------------------------------
// Launch manifest (.vscode/launch.json)
// ---------------------------------------------------------------------------

/// Root launch manifest. Only `compounds` is interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchManifest {
    #[serde(default)]
    pub compounds: Vec<CompoundEntry>,
}

/// A `compounds[]` entry as written in the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub configurations: Vec<CompoundMember>,
}

/// A member reference inside a compound.
///
/// Editors accept both a bare configuration name and a folder-scoped object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CompoundMember {
    Name(String),
    Scoped {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        folder: Option<String>,
    },
}

impl CompoundMember {
    pub fn session_name(&self) -> SessionName {
        match self {
            CompoundMember::Name(name) | CompoundMember::Scoped { name, .. } => {
                SessionName::from(name.as_str())
            }
        }
    }
}

/// The active compound: the one whose member list is longest.
///
/// `total` is the length of the manifest's `configurations` list, which can
/// exceed `members.len()` when a name is listed twice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompoundDefinition {
    pub name: Option<String>,
    pub members: BTreeSet<SessionName>,
    pub total: usize,
}

impl CompoundDefinition {
    /// The definition used when no manifest or no compound exists.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_entry(entry: &CompoundEntry) -> Self {
        Self {
            name: Some(entry.name.clone()),
            members: entry
                .configurations
                .iter()
                .map(CompoundMember::session_name)
                .collect(),
            total: entry.configurations.len(),
        }
    }

    pub fn contains(&self, session: &SessionName) -> bool {
        self.members.contains(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_member_accepts_plain_and_scoped_forms() {
        let entry: CompoundEntry = serde_json::from_str(
            r#"{"name":"All","configurations":["api",{"name":"web","folder":"frontend"}]}"#,
        )
        .expect("parse");
        let def = CompoundDefinition::from_entry(&entry);
        assert_eq!(def.total, 2);
        assert!(def.contains(&SessionName::from("api")));
        assert!(def.contains(&SessionName::from("web")));
    }

    #[test]
    fn duplicate_member_counts_towards_total() {
        let entry = CompoundEntry {
            name: "dup".into(),
            configurations: vec![
                CompoundMember::Name("x".into()),
                CompoundMember::Name("x".into()),
            ],
        };
        let def = CompoundDefinition::from_entry(&entry);
        assert_eq!(def.total, 2);
        assert_eq!(def.members.len(), 1);
    }
}
