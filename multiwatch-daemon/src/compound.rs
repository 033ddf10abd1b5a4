//! Active-compound resolution from the root launch manifest.

use std::path::{Path, PathBuf};

use multiwatch_core::{store, CompoundDefinition, CompoundEntry, LaunchManifest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompoundState {
    /// No manifest, an unreadable manifest, or no compound with members.
    Empty,
    Resolved(CompoundDefinition),
}

/// Pick the compound with the strictly longest member list; earlier entries
/// win ties. `None` when every member list is empty.
pub fn select_largest(manifest: &LaunchManifest) -> Option<CompoundDefinition> {
    let mut largest: Option<&CompoundEntry> = None;
    let mut max_members = 0;
    for entry in &manifest.compounds {
        if entry.configurations.len() > max_members {
            max_members = entry.configurations.len();
            largest = Some(entry);
        }
    }
    largest.map(CompoundDefinition::from_entry)
}

/// Holds the current [`CompoundState`] for one launch manifest path.
#[derive(Debug)]
pub struct CompoundResolver {
    manifest_path: PathBuf,
    state: CompoundState,
}

impl CompoundResolver {
    pub fn new(manifest_path: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            state: CompoundState::Empty,
        }
    }

    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    pub fn state(&self) -> &CompoundState {
        &self.state
    }

    /// The active definition, or the empty one.
    pub fn definition(&self) -> CompoundDefinition {
        match &self.state {
            CompoundState::Resolved(definition) => definition.clone(),
            CompoundState::Empty => CompoundDefinition::empty(),
        }
    }

    /// Re-read the manifest. Never fails: read and parse errors are logged
    /// and leave the resolver Empty.
    pub fn recompute(&mut self) -> CompoundDefinition {
        let path = &self.manifest_path;
        self.state = match store::read_json_as::<LaunchManifest>(path) {
            Ok(Some(manifest)) => match select_largest(&manifest) {
                Some(definition) => {
                    tracing::info!(
                        compound = definition.name.as_deref().unwrap_or_default(),
                        total = definition.total,
                        "found largest compound in root launch manifest",
                    );
                    CompoundState::Resolved(definition)
                }
                None => {
                    tracing::info!(
                        path = %path.display(),
                        "launch manifest has no compound members",
                    );
                    CompoundState::Empty
                }
            },
            Ok(None) => {
                tracing::info!(path = %path.display(), "launch manifest absent");
                CompoundState::Empty
            }
            Err(err) => {
                tracing::error!(error = %err, "error reading root launch manifest");
                CompoundState::Empty
            }
        };
        self.definition()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiwatch_core::SessionName;
    use std::fs;
    use tempfile::TempDir;

    fn resolver_with(body: Option<&str>) -> (TempDir, CompoundResolver) {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("launch.json");
        if let Some(body) = body {
            fs::write(&path, body).expect("write");
        }
        (dir, CompoundResolver::new(path))
    }

    #[test]
    fn largest_compound_is_selected() {
        let (_dir, mut resolver) = resolver_with(Some(
            r#"{"compounds": [
                {"name": "A", "configurations": ["x", "y"]},
                {"name": "B", "configurations": ["x", "y", "z"]}
            ]}"#,
        ));

        let def = resolver.recompute();
        assert_eq!(def.name.as_deref(), Some("B"));
        assert_eq!(def.total, 3);
        assert!(def.contains(&SessionName::from("z")));
        assert!(matches!(resolver.state(), CompoundState::Resolved(_)));
    }

    #[test]
    fn first_seen_wins_ties() {
        let (_dir, mut resolver) = resolver_with(Some(
            r#"{"compounds": [
                {"name": "small", "configurations": ["a"]},
                {"name": "first", "configurations": ["x", "y"]},
                {"name": "second", "configurations": ["p", "q"]}
            ]}"#,
        ));
        assert_eq!(resolver.recompute().name.as_deref(), Some("first"));
    }

    #[test]
    fn recompute_is_idempotent() {
        let (_dir, mut resolver) = resolver_with(Some(
            r#"{"compounds": [{"name": "all", "configurations": ["api", "web"]}]}"#,
        ));
        let first = resolver.recompute();
        let second = resolver.recompute();
        assert_eq!(first, second);
    }

    #[test]
    fn missing_manifest_is_empty() {
        let (_dir, mut resolver) = resolver_with(None);
        let def = resolver.recompute();
        assert_eq!(def, CompoundDefinition::empty());
        assert_eq!(resolver.state(), &CompoundState::Empty);
    }

    #[test]
    fn malformed_manifest_is_empty() {
        let (_dir, mut resolver) = resolver_with(Some("{ \"compounds\": [ oops"));
        assert_eq!(resolver.recompute().total, 0);
        assert_eq!(resolver.state(), &CompoundState::Empty);
    }

    #[test]
    fn manifest_without_compounds_or_members_is_empty() {
        let (_dir, mut resolver) = resolver_with(Some(r#"{"configurations": []}"#));
        assert_eq!(resolver.recompute().total, 0);

        let (_dir, mut resolver) =
            resolver_with(Some(r#"{"compounds": [{"name": "none", "configurations": []}]}"#));
        assert_eq!(resolver.state(), &CompoundState::Empty);
        assert_eq!(resolver.recompute().total, 0);
        assert_eq!(resolver.state(), &CompoundState::Empty);
    }

    #[test]
    fn deleting_manifest_transitions_back_to_empty() {
        let (dir, mut resolver) = resolver_with(Some(
            r#"{"compounds": [{"name": "all", "configurations": ["api"]}]}"#,
        ));
        assert_eq!(resolver.recompute().total, 1);

        fs::remove_file(dir.path().join("launch.json")).expect("remove");
        assert_eq!(resolver.recompute().total, 0);
        assert_eq!(resolver.state(), &CompoundState::Empty);
    }
}
