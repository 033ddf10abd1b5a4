//! Watch registration and event classification.
//!
//! The set of watched directories is a snapshot taken at startup: a
//! directory that does not exist then is skipped and never picked up later.
//! Every create/modify/remove event under a registration maps to one
//! [`Change`] for that registration's domain, regardless of the event kind.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use multiwatch_core::layout::{self, WorkspaceLayout, EXTENSIONS_MANIFEST, LAUNCH_MANIFEST};
use notify::{recommended_watcher, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::engine::EngineEvent;
use crate::error::DaemonError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchDomain {
    /// Root launch manifest; drives compound recomputation.
    Launch,
    Vscode,
    Rules,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchRegistration {
    pub root: PathBuf,
    pub domain: WatchDomain,
    pub recursive: bool,
    /// Restricts a non-recursive registration to one file in `root`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<&'static str>,
    pub active: bool,
}

impl WatchRegistration {
    fn matches(&self, path: &Path) -> bool {
        if !self.active {
            return false;
        }
        match self.file_name {
            Some(name) => path == self.root.join(name),
            None if self.recursive => path.starts_with(&self.root),
            None => path.parent() == Some(self.root.as_path()),
        }
    }
}

/// One classified filesystem change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub domain: WatchDomain,
    pub root: PathBuf,
    pub path: PathBuf,
}

/// Dispatch table from watched roots to domains.
#[derive(Debug, Clone, Default)]
pub struct WatchTable {
    registrations: Vec<WatchRegistration>,
}

impl WatchTable {
    /// Build the table from the directories that exist right now.
    pub fn plan(layout: &WorkspaceLayout) -> Self {
        let mut table = Self::default();

        if let Some(dir) = existing_dir(&layout.root_config_dir(), WatchDomain::Launch) {
            table.push(dir.clone(), WatchDomain::Launch, false, Some(LAUNCH_MANIFEST));
            table.push(dir, WatchDomain::Vscode, false, Some(EXTENSIONS_MANIFEST));
        }

        // Rules are only watched for repositories that carry a `.vscode` dir.
        for repo in layout.repository_folders() {
            let Some(dir) = existing_dir(&layout::config_dir(repo), WatchDomain::Vscode) else {
                continue;
            };
            table.push(dir, WatchDomain::Vscode, true, None);
            if let Some(dir) = existing_dir(&layout::rules_dir(repo), WatchDomain::Rules) {
                table.push(dir, WatchDomain::Rules, true, None);
            }
        }

        table
    }

    fn push(
        &mut self,
        root: PathBuf,
        domain: WatchDomain,
        recursive: bool,
        file_name: Option<&'static str>,
    ) {
        self.registrations.push(WatchRegistration {
            root,
            domain,
            recursive,
            file_name,
            active: true,
        });
    }

    pub fn registrations(&self) -> &[WatchRegistration] {
        &self.registrations
    }

    pub fn classify(&self, path: &Path) -> Option<&WatchRegistration> {
        self.registrations.iter().find(|r| r.matches(path))
    }

    /// Distinct directories to hand to the watcher; recursive wins on overlap.
    fn watch_roots(&self) -> BTreeMap<PathBuf, RecursiveMode> {
        let mut roots = BTreeMap::new();
        for registration in self.registrations.iter().filter(|r| r.active) {
            let mode = if registration.recursive {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };
            roots
                .entry(registration.root.clone())
                .and_modify(|existing| {
                    if mode == RecursiveMode::Recursive {
                        *existing = mode;
                    }
                })
                .or_insert(mode);
        }
        roots
    }

    fn mark_inactive(&mut self, root: &Path) {
        for registration in self.registrations.iter_mut().filter(|r| r.root == root) {
            registration.active = false;
        }
    }
}

/// Changes carried by one watcher event, at most one per registration.
pub fn changes_for_event(table: &WatchTable, event: &Event) -> Vec<Change> {
    if !is_change_event(&event.kind) {
        return Vec::new();
    }

    let mut changes: Vec<Change> = Vec::new();
    for path in &event.paths {
        let Some(registration) = table.classify(path) else {
            continue;
        };
        let seen = changes
            .iter()
            .any(|c| c.domain == registration.domain && c.root == registration.root);
        if !seen {
            changes.push(Change {
                domain: registration.domain,
                root: registration.root.clone(),
                path: path.clone(),
            });
        }
    }
    changes
}

fn is_change_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

fn existing_dir(dir: &Path, domain: WatchDomain) -> Option<PathBuf> {
    if !dir.is_dir() {
        tracing::debug!(
            path = %dir.display(),
            domain = ?domain,
            "watch registration skipped: directory absent",
        );
        return None;
    }
    // Canonicalize so event paths (which arrive as real paths, e.g.
    // /private/var/... on macOS) match the `starts_with` checks.
    Some(fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf()))
}

/// Live watcher plus the table it dispatches through.
pub struct WatchEngine {
    _watcher: RecommendedWatcher,
    table: WatchTable,
}

impl WatchEngine {
    /// Register watches for every existing root and forward classified
    /// changes into the engine loop.
    pub fn start(
        layout: &WorkspaceLayout,
        events: mpsc::UnboundedSender<EngineEvent>,
    ) -> Result<Self, DaemonError> {
        let mut table = WatchTable::plan(layout);

        let dispatch = table.clone();
        let mut watcher = recommended_watcher(move |result: notify::Result<Event>| {
            match result {
                Ok(event) => {
                    for change in changes_for_event(&dispatch, &event) {
                        let _ = events.send(EngineEvent::Changed(change));
                    }
                }
                Err(err) => tracing::warn!(error = %err, "watcher event error"),
            }
        })?;

        for (dir, mode) in table.watch_roots() {
            match watcher.watch(&dir, mode) {
                Ok(()) => tracing::info!(path = %dir.display(), ?mode, "watching directory"),
                Err(err) => {
                    tracing::warn!(
                        path = %dir.display(),
                        error = %err,
                        "failed to watch directory",
                    );
                    table.mark_inactive(&dir);
                }
            }
        }

        Ok(Self {
            _watcher: watcher,
            table,
        })
    }

    pub fn registrations(&self) -> &[WatchRegistration] {
        self.table.registrations()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use multiwatch_core::RepositoryDescriptor;
    use notify::event::{AccessKind, CreateKind, ModifyKind, RemoveKind, RenameMode};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Root with `.vscode`; `api` with config and rules; `docs` with rules
    /// only; `web` with neither.
    fn workspace() -> (TempDir, PathBuf, WorkspaceLayout) {
        let tmp = TempDir::new().expect("tempdir");
        let root = fs::canonicalize(tmp.path()).expect("canonical");
        for dir in [
            ".vscode",
            "api/.vscode",
            "api/.cursor/rules",
            "docs/.cursor/rules",
            "web",
        ] {
            fs::create_dir_all(root.join(dir)).expect("mkdir");
        }
        let layout = WorkspaceLayout::from_descriptors(
            &root,
            ["api", "docs", "web"]
                .iter()
                .map(|name| RepositoryDescriptor::new(format!("https://git.example/acme/{name}")))
                .collect(),
        )
        .expect("layout");
        (tmp, root, layout)
    }

    #[test]
    fn plan_registers_only_existing_directories() {
        let (_tmp, root, layout) = workspace();
        let table = WatchTable::plan(&layout);

        let summary: Vec<_> = table
            .registrations()
            .iter()
            .map(|r| (r.root.clone(), r.domain, r.recursive, r.file_name))
            .collect();
        assert_eq!(
            summary,
            vec![
                (root.join(".vscode"), WatchDomain::Launch, false, Some("launch.json")),
                (root.join(".vscode"), WatchDomain::Vscode, false, Some("extensions.json")),
                (root.join("api/.vscode"), WatchDomain::Vscode, true, None),
                (root.join("api/.cursor/rules"), WatchDomain::Rules, true, None),
            ]
        );
        assert_eq!(table.watch_roots().len(), 3);
    }

    #[test]
    fn rules_without_config_dir_are_not_watched() {
        let (_tmp, root, layout) = workspace();
        let table = WatchTable::plan(&layout);

        assert!(table
            .registrations()
            .iter()
            .all(|r| !r.root.starts_with(root.join("docs"))));
        assert!(table.classify(&root.join("docs/.cursor/rules/style.mdc")).is_none());
    }

    #[test]
    fn classify_routes_paths_to_domains() {
        let (_tmp, root, layout) = workspace();
        let table = WatchTable::plan(&layout);
        let domain = |p: &str| table.classify(&root.join(p)).map(|r| r.domain);

        assert_eq!(domain(".vscode/launch.json"), Some(WatchDomain::Launch));
        assert_eq!(domain(".vscode/extensions.json"), Some(WatchDomain::Vscode));
        assert_eq!(domain(".vscode/settings.json"), None);
        assert_eq!(domain("api/.vscode/settings.json"), Some(WatchDomain::Vscode));
        assert_eq!(domain("api/.cursor/rules/style.mdc"), Some(WatchDomain::Rules));
        assert_eq!(domain("docs/.cursor/rules/deep/nested.mdc"), None);
        assert_eq!(domain("web/.vscode/settings.json"), None);
        assert_eq!(domain("api/src/main.rs"), None);
    }

    #[test]
    fn create_modify_remove_are_equivalent_and_access_is_ignored() {
        let (_tmp, root, layout) = workspace();
        let table = WatchTable::plan(&layout);
        let path = root.join("api/.cursor/rules/style.mdc");

        for kind in [
            EventKind::Create(CreateKind::File),
            EventKind::Modify(ModifyKind::Any),
            EventKind::Remove(RemoveKind::File),
        ] {
            let changes = changes_for_event(&table, &Event::new(kind).add_path(path.clone()));
            assert_eq!(changes.len(), 1, "{kind:?}");
            assert_eq!(changes[0].domain, WatchDomain::Rules);
        }

        let access = Event::new(EventKind::Access(AccessKind::Any)).add_path(path);
        assert!(changes_for_event(&table, &access).is_empty());
    }

    #[test]
    fn rename_within_one_root_yields_one_change() {
        let (_tmp, root, layout) = workspace();
        let table = WatchTable::plan(&layout);
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(root.join("api/.vscode/a.json"))
            .add_path(root.join("api/.vscode/b.json"));

        assert_eq!(changes_for_event(&table, &event).len(), 1);
    }

    #[test]
    fn inactive_registrations_do_not_match() {
        let (_tmp, root, layout) = workspace();
        let mut table = WatchTable::plan(&layout);
        table.mark_inactive(&root.join("api/.cursor/rules"));

        assert!(table.classify(&root.join("api/.cursor/rules/x.mdc")).is_none());
        assert_eq!(table.watch_roots().len(), 2);
    }

    #[tokio::test]
    async fn live_watcher_forwards_rules_change() {
        let (_tmp, root, layout) = workspace();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let engine = WatchEngine::start(&layout, tx).expect("start watcher");
        assert!(engine.registrations().iter().all(|r| r.active));

        fs::write(root.join("api/.cursor/rules/new.mdc"), "rule").expect("write rule");

        let event = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("change within timeout")
            .expect("channel open");
        match event {
            EngineEvent::Changed(change) => {
                assert_eq!(change.domain, WatchDomain::Rules);
                assert_eq!(change.root, root.join("api/.cursor/rules"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
