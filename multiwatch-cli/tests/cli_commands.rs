use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn multiwatch_cmd(root: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_multiwatch"));
    cmd.arg("--root")
        .arg(root)
        .env_remove("MULTIWATCH_EXECUTABLE")
        .env_remove("MULTIWATCH_DEBOUNCE_MS");
    cmd
}

fn write_manifest(root: &Path, urls: &[&str]) {
    let repos: Vec<_> = urls
        .iter()
        .map(|url| serde_json::json!({ "url": url }))
        .collect();
    fs::write(
        root.join("multi.json"),
        serde_json::to_string(&serde_json::json!({ "repos": repos })).expect("encode"),
    )
    .expect("write multi.json");
}

#[test]
fn repos_lists_manifest_folders_in_order() {
    let root = TempDir::new().expect("root");
    write_manifest(
        root.path(),
        &["https://github.com/acme/api", "https://github.com/acme/web/"],
    );
    fs::create_dir_all(root.path().join("api").join(".vscode")).expect("mkdir");

    multiwatch_cmd(root.path())
        .arg("repos")
        .assert()
        .success()
        .stdout(contains("2 repositories"))
        .stdout(contains("https://github.com/acme/api"))
        .stdout(contains("web"))
        .stdout(contains("watched"))
        .stdout(contains("missing"));
}

#[test]
fn repos_marks_rules_without_vscode_as_skipped() {
    let root = TempDir::new().expect("root");
    write_manifest(root.path(), &["https://github.com/acme/docs"]);
    fs::create_dir_all(root.path().join("docs").join(".cursor").join("rules")).expect("mkdir");

    multiwatch_cmd(root.path())
        .arg("repos")
        .assert()
        .success()
        .stdout(contains("skipped (no .vscode)"));
}

#[test]
fn repos_fails_without_manifest() {
    let root = TempDir::new().expect("root");

    multiwatch_cmd(root.path())
        .arg("repos")
        .assert()
        .failure()
        .stderr(contains("multi.json"));
}

#[test]
fn config_dir_prefers_closest_vscode_dir() {
    let root = TempDir::new().expect("root");
    let nested = root.path().join("api").join("src");
    fs::create_dir_all(&nested).expect("mkdir nested");
    fs::create_dir_all(root.path().join(".vscode")).expect("mkdir root vscode");
    fs::create_dir_all(root.path().join("api").join(".vscode")).expect("mkdir api vscode");

    let output = multiwatch_cmd(root.path())
        .args(["config-dir", "api/src", "--json"])
        .output()
        .expect("run config-dir");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    let config_dir = value["config_dir"].as_str().expect("config_dir");
    assert!(config_dir.ends_with("api/.vscode"), "got {config_dir}");
    let settings = value["settings"].as_str().expect("settings");
    assert!(settings.ends_with("api/.vscode/settings.json"), "got {settings}");
}

#[test]
fn config_dir_falls_back_to_root() {
    let root = TempDir::new().expect("root");

    multiwatch_cmd(root.path())
        .arg("config-dir")
        .assert()
        .success()
        .stdout(contains(root.path().display().to_string()))
        .stdout(contains(".vscode").not());
}

#[test]
fn config_dir_does_not_climb_out_of_root() {
    let outer = TempDir::new().expect("outer");
    fs::create_dir_all(outer.path().join(".vscode")).expect("mkdir outer vscode");
    let root = outer.path().join("ws");
    fs::create_dir_all(&root).expect("mkdir root");

    let output = multiwatch_cmd(&root)
        .args(["config-dir", "../x", "--json"])
        .output()
        .expect("run config-dir");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["config_dir"], serde_json::json!(root.display().to_string()));
}

#[test]
fn status_reports_not_running_as_json() {
    let root = TempDir::new().expect("root");

    let output = multiwatch_cmd(root.path())
        .args(["status", "--json"])
        .output()
        .expect("run status");
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["running"], serde_json::Value::Bool(false));
    assert!(value["socket"]
        .as_str()
        .expect("socket")
        .ends_with(".multiwatch/daemon.sock"));
}

#[test]
fn stop_without_daemon_is_not_an_error() {
    let root = TempDir::new().expect("root");

    multiwatch_cmd(root.path())
        .arg("stop")
        .assert()
        .success()
        .stdout(contains("daemon is not running"));
}

#[test]
fn session_event_without_daemon_fails() {
    let root = TempDir::new().expect("root");

    multiwatch_cmd(root.path())
        .args(["session", "start", "api"])
        .assert()
        .failure()
        .stderr(contains("daemon is not running"));
}

#[test]
fn sync_rejects_unknown_domain() {
    let root = TempDir::new().expect("root");

    multiwatch_cmd(root.path())
        .args(["sync", "extensions"])
        .assert()
        .failure()
        .stderr(contains("unknown sync domain"));
}

#[cfg(unix)]
mod direct_sync {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    fn fake_multi(dir: &Path, log: &Path, exit_code: i32) -> std::path::PathBuf {
        let script = dir.join("fake-multi");
        fs::write(
            &script,
            format!(
                "#!/bin/sh\necho \"$@\" >> '{}'\necho synced-output\nexit {exit_code}\n",
                log.display()
            ),
        )
        .expect("write script");
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).expect("chmod");
        script
    }

    #[test]
    fn sync_runs_directly_when_daemon_is_absent() {
        let root = TempDir::new().expect("root");
        let bin = TempDir::new().expect("bin");
        let log = bin.path().join("calls.log");
        let script = fake_multi(bin.path(), &log, 0);
        write_manifest(root.path(), &["https://github.com/acme/api"]);

        multiwatch_cmd(root.path())
            .args(["sync", "rules", "--executable"])
            .arg(&script)
            .assert()
            .success()
            .stdout(contains("synced-output"))
            .stdout(contains("rules"));

        let calls = fs::read_to_string(&log).expect("log");
        assert_eq!(calls.trim(), "sync rules");
    }

    #[test]
    fn sync_uses_executable_from_workspace_settings() {
        let root = TempDir::new().expect("root");
        let bin = TempDir::new().expect("bin");
        let log = bin.path().join("calls.log");
        let script = fake_multi(bin.path(), &log, 0);
        write_manifest(root.path(), &[]);
        fs::create_dir_all(root.path().join(".vscode")).expect("mkdir");
        fs::write(
            root.path().join(".vscode").join("settings.json"),
            serde_json::to_string(&serde_json::json!({
                "cursorMulti.executablePath": script.display().to_string(),
            }))
            .expect("encode"),
        )
        .expect("write settings");

        multiwatch_cmd(root.path()).arg("sync").assert().success();

        let calls = fs::read_to_string(&log).expect("log");
        assert_eq!(calls.trim(), "sync");
    }

    #[test]
    fn failing_sync_exits_non_zero() {
        let root = TempDir::new().expect("root");
        let bin = TempDir::new().expect("bin");
        let log = bin.path().join("calls.log");
        let script = fake_multi(bin.path(), &log, 3);
        write_manifest(root.path(), &[]);

        multiwatch_cmd(root.path())
            .args(["sync", "vscode"])
            .env("MULTIWATCH_EXECUTABLE", &script)
            .assert()
            .failure()
            .stderr(contains("sync vscode"));
    }
}
