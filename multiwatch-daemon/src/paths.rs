use std::path::{Path, PathBuf};

pub const RUNTIME_DIR: &str = ".multiwatch";
pub const DAEMON_SOCKET: &str = "daemon.sock";
pub const STATUS_FILE: &str = "status.json";

/// `<root>/.multiwatch`
pub fn runtime_dir(root: &Path) -> PathBuf {
    root.join(RUNTIME_DIR)
}

pub fn socket_path(root: &Path) -> PathBuf {
    runtime_dir(root).join(DAEMON_SOCKET)
}

/// JSON snapshot of the latest display payload, rewritten on every change.
pub fn status_path(root: &Path) -> PathBuf {
    runtime_dir(root).join(STATUS_FILE)
}
