//! Workspace layout resolution.
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   multi.json                 (repository manifest)
//!   .vscode/
//!     launch.json              (compound definitions)
//!     extensions.json
//!     settings.json
//!   <repo>/
//!     .vscode/                 (per-repo editor config fragments)
//!     .cursor/rules/           (per-repo assistant rules)
//! ```
//!
//! The layout is computed once at startup. `multi.json` is not hot-reloaded.

use std::path::{Component, Path, PathBuf};

use crate::error::{LayoutError, StoreError};
use crate::store;
use crate::types::{RepositoryDescriptor, RepositoryManifest};

pub const REPOSITORY_MANIFEST: &str = "multi.json";
pub const CONFIG_DIR: &str = ".vscode";
pub const LAUNCH_MANIFEST: &str = "launch.json";
pub const EXTENSIONS_MANIFEST: &str = "extensions.json";
pub const SETTINGS_FILE: &str = "settings.json";

// ---------------------------------------------------------------------------
// 1. Path helpers (pure, no I/O)
// ---------------------------------------------------------------------------

/// `<dir>/.vscode`
pub fn config_dir(dir: &Path) -> PathBuf {
    dir.join(CONFIG_DIR)
}

/// `<repo>/.cursor/rules`
pub fn rules_dir(repo: &Path) -> PathBuf {
    repo.join(".cursor").join("rules")
}

// ---------------------------------------------------------------------------
// 2. Repository manifest
// ---------------------------------------------------------------------------

/// Read `multi.json` and return `<root>/<folder_name>` for each repository,
/// in manifest order. `<root>` is the directory containing the manifest.
pub fn resolve_repository_folders(manifest_path: &Path) -> Result<Vec<PathBuf>, LayoutError> {
    let manifest = read_repository_manifest(manifest_path)?;
    let root = manifest_path.parent().unwrap_or_else(|| Path::new(""));
    folders_for(root, &manifest.repos)
}

fn read_repository_manifest(path: &Path) -> Result<RepositoryManifest, LayoutError> {
    match store::read_json_as::<RepositoryManifest>(path) {
        Ok(Some(manifest)) => Ok(manifest),
        Ok(None) => Err(LayoutError::ManifestMissing {
            path: path.to_path_buf(),
        }),
        Err(StoreError::Parse { path, source }) => Err(LayoutError::ManifestMalformed {
            path,
            reason: source.to_string(),
        }),
        Err(StoreError::Io { path, source }) => Err(LayoutError::Io { path, source }),
        Err(StoreError::Json(source)) => Err(LayoutError::ManifestMalformed {
            path: path.to_path_buf(),
            reason: source.to_string(),
        }),
    }
}

fn folders_for(root: &Path, repos: &[RepositoryDescriptor]) -> Result<Vec<PathBuf>, LayoutError> {
    repos
        .iter()
        .map(|repo| {
            repo.folder_name()
                .map(|name| root.join(name))
                .ok_or_else(|| LayoutError::DescriptorInvalid {
                    url: repo.url.clone(),
                })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// 3. Nearest config dir
// ---------------------------------------------------------------------------

/// Walk upward from `start` (inclusive) and return the first `<ancestor>/.vscode`
/// that exists, without leaving `root`.
///
/// Falls back to `root` itself when nothing matches. Callers must tolerate a
/// returned directory that holds no config files. `..` components are
/// resolved lexically first, so a start that climbs out of `root` gets the
/// fallback.
pub fn resolve_nearest_config_dir(root: &Path, start: &Path) -> PathBuf {
    let start = if start.is_relative() {
        root.join(start)
    } else {
        start.to_path_buf()
    };
    let bound = normalize(root);
    let start = normalize(&start);

    for ancestor in start.ancestors() {
        if !ancestor.starts_with(&bound) {
            break;
        }
        let candidate = config_dir(ancestor);
        if candidate.is_dir() {
            return candidate;
        }
    }
    root.to_path_buf()
}

/// Drop `.` and fold `..` into its parent without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// 4. WorkspaceLayout
// ---------------------------------------------------------------------------

/// Resolved workspace: root plus the ordered repository folders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceLayout {
    root: PathBuf,
    repositories: Vec<RepositoryDescriptor>,
    folders: Vec<PathBuf>,
}

impl WorkspaceLayout {
    /// Load `<root>/multi.json`. Any failure here aborts startup.
    pub fn load(root: &Path) -> Result<Self, LayoutError> {
        let manifest = read_repository_manifest(&root.join(REPOSITORY_MANIFEST))?;
        Self::from_descriptors(root, manifest.repos)
    }

    pub fn from_descriptors(
        root: &Path,
        repositories: Vec<RepositoryDescriptor>,
    ) -> Result<Self, LayoutError> {
        let folders = folders_for(root, &repositories)?;
        Ok(Self {
            root: root.to_path_buf(),
            repositories,
            folders,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn repositories(&self) -> &[RepositoryDescriptor] {
        &self.repositories
    }

    /// `<root>/<folder_name>` per repository, manifest order.
    pub fn repository_folders(&self) -> &[PathBuf] {
        &self.folders
    }

    pub fn root_config_dir(&self) -> PathBuf {
        config_dir(&self.root)
    }

    pub fn launch_manifest_path(&self) -> PathBuf {
        self.root_config_dir().join(LAUNCH_MANIFEST)
    }

    pub fn extensions_manifest_path(&self) -> PathBuf {
        self.root_config_dir().join(EXTENSIONS_MANIFEST)
    }

    pub fn nearest_config_dir(&self, start: &Path) -> PathBuf {
        resolve_nearest_config_dir(&self.root, start)
    }

    /// `settings.json` inside the nearest config dir for `start`.
    pub fn settings_path(&self, start: &Path) -> PathBuf {
        self.nearest_config_dir(start).join(SETTINGS_FILE)
    }
}
