use std::fs;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream as StdUnixStream;
use std::path::{Path, PathBuf};

use multiwatch_core::{SessionName, WorkspaceLayout};
use multiwatch_sync::{SyncCommand, SyncDomain, SyncTrigger};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::compound::CompoundResolver;
use crate::config::{Settings, SettingsOverrides};
use crate::engine::{engine_task, workspace_label, Engine, EngineEvent};
use crate::error::{io_err, DaemonError};
use crate::paths::{runtime_dir, socket_path, status_path};
use crate::protocol::{
    DaemonRequest, DaemonResponse, CMD_SESSION_START, CMD_SESSION_STOP, CMD_STATUS, CMD_STOP,
    CMD_SYNC,
};
use crate::status::{LogSink, StatusFileSink, StatusReporter};
use crate::watch::WatchEngine;

/// Start the daemon runtime for `root` and block the current thread until it exits.
pub fn start_blocking(root: &Path, overrides: SettingsOverrides) -> Result<(), DaemonError> {
    init_tracing(overrides.log_json);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(root.to_path_buf(), overrides))
}

/// Run the daemon runtime.
///
/// Layout resolution failures abort before any watch is registered. After
/// that, per-event failures are logged and never end the loop.
pub async fn run(root: PathBuf, overrides: SettingsOverrides) -> Result<(), DaemonError> {
    let layout = WorkspaceLayout::load(&root).map_err(|err| {
        tracing::error!(error = %err, "error activating workspace watcher");
        err
    })?;
    let settings = Settings::resolve(&layout, &overrides);
    ensure_runtime_dirs(&root)?;

    let (event_tx, event_rx) = mpsc::unbounded_channel::<EngineEvent>();
    let (shutdown_tx, _) = broadcast::channel::<()>(16);

    let watcher = WatchEngine::start(&layout, event_tx.clone())?;

    let reporter = StatusReporter::new(vec![
        Box::new(LogSink),
        Box::new(StatusFileSink::new(status_path(&root))),
    ]);
    let trigger = SyncTrigger::new(SyncCommand::new(
        settings.executable.clone(),
        layout.root(),
    ));
    let mut engine = Engine::new(
        CompoundResolver::new(layout.launch_manifest_path()),
        reporter,
        trigger,
        settings.debounce,
    )
    .with_watches(watcher.registrations().to_vec());
    engine.start();

    tracing::info!(
        workspace = %workspace_label(layout.root()),
        repositories = layout.repository_folders().len(),
        watches = watcher.registrations().len(),
        executable = %settings.executable,
        "workspace watcher activated",
    );

    // Converge once on startup.
    let _ = event_tx.send(EngineEvent::Sync { domain: None });

    let engine_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            engine_task(engine, event_rx, shutdown.subscribe()).await;
            let _ = shutdown.send(());
            Ok(())
        })
    };

    let socket_handle = {
        let shutdown = shutdown_tx.clone();
        let root = root.clone();
        let event_tx = event_tx.clone();
        tokio::spawn(async move {
            let result =
                socket_server_task(root, event_tx, shutdown.clone(), shutdown.subscribe()).await;
            let _ = shutdown.send(());
            result
        })
    };

    let signal_handle = {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            let mut shutdown_rx = shutdown.subscribe();
            tokio::select! {
                _ = shutdown_rx.recv() => Ok(()),
                signal = tokio::signal::ctrl_c() => {
                    match signal {
                        Ok(()) => {
                            tracing::info!("received ctrl-c, shutting down daemon");
                            let _ = shutdown.send(());
                            Ok(())
                        }
                        Err(err) => Err(DaemonError::Protocol(format!("ctrl-c handler failed: {err}"))),
                    }
                }
            }
        })
    };

    let (engine_result, socket_result, signal_result) =
        tokio::join!(engine_handle, socket_handle, signal_handle);

    drop(watcher);
    handle_join("engine", engine_result)?;
    handle_join("socket_server", socket_result)?;
    handle_join("signal_handler", signal_result)?;
    Ok(())
}

async fn socket_server_task(
    root: PathBuf,
    event_tx: mpsc::UnboundedSender<EngineEvent>,
    shutdown_tx: broadcast::Sender<()>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let socket = socket_path(&root);
    prepare_socket_for_bind(&socket)?;

    let listener = UnixListener::bind(&socket).map_err(|e| io_err(&socket, e))?;
    set_socket_permissions(&socket)?;

    loop {
        tokio::select! {
            _ = shutdown_rx.recv() => break,
            accepted = listener.accept() => {
                let (stream, _) = accepted.map_err(|e| io_err(&socket, e))?;
                let event_tx = event_tx.clone();
                let shutdown_tx = shutdown_tx.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_socket_client(stream, event_tx, shutdown_tx).await {
                        tracing::error!(error = %err, "socket client error");
                    }
                });
            }
        }
    }

    if socket.exists() {
        let _ = fs::remove_file(&socket);
    }
    Ok(())
}

async fn handle_socket_client(
    stream: UnixStream,
    event_tx: mpsc::UnboundedSender<EngineEvent>,
    shutdown_tx: broadcast::Sender<()>,
) -> Result<(), DaemonError> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| io_err("daemon socket read", e))?
    {
        if line.trim().is_empty() {
            continue;
        }

        let request: DaemonRequest = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(err) => {
                write_response(
                    &mut writer,
                    &DaemonResponse::error(format!("invalid request JSON: {err}")),
                )
                .await?;
                continue;
            }
        };

        let response = dispatch_request(&request, &event_tx, &shutdown_tx).await;
        write_response(&mut writer, &response).await?;
        if request.cmd == CMD_STOP {
            break;
        }
    }

    Ok(())
}

async fn dispatch_request(
    request: &DaemonRequest,
    event_tx: &mpsc::UnboundedSender<EngineEvent>,
    shutdown_tx: &broadcast::Sender<()>,
) -> DaemonResponse {
    match request.cmd.as_str() {
        CMD_STATUS => {
            let (tx, rx) = oneshot::channel();
            if event_tx.send(EngineEvent::Status { respond_to: tx }).is_err() {
                return DaemonResponse::error(DaemonError::ChannelClosed("engine").to_string());
            }
            match rx.await {
                Ok(snapshot) => DaemonResponse::ok(json!({ "running": true, "status": snapshot })),
                Err(_) => DaemonResponse::error(DaemonError::ChannelClosed("status").to_string()),
            }
        }
        CMD_SESSION_START | CMD_SESSION_STOP => {
            let Some(name) = request.name.clone().filter(|n| !n.is_empty()) else {
                return DaemonResponse::error(format!("'{}' requires a session name", request.cmd));
            };
            let name = SessionName::from(name);
            let event = if request.cmd == CMD_SESSION_START {
                EngineEvent::SessionStarted(name.clone())
            } else {
                EngineEvent::SessionStopped(name.clone())
            };
            post(event_tx, event, json!({ "accepted": name.0 }))
        }
        CMD_SYNC => post(
            event_tx,
            EngineEvent::Sync {
                domain: request.domain,
            },
            json!({ "queued": SyncDomain::label(request.domain) }),
        ),
        CMD_STOP => {
            let _ = shutdown_tx.send(());
            DaemonResponse::ok(json!({ "stopping": true }))
        }
        other => DaemonResponse::error(format!("unknown command '{other}'")),
    }
}

fn post(
    event_tx: &mpsc::UnboundedSender<EngineEvent>,
    event: EngineEvent,
    data: serde_json::Value,
) -> DaemonResponse {
    match event_tx.send(event) {
        Ok(()) => DaemonResponse::ok(data),
        Err(_) => DaemonResponse::error(DaemonError::ChannelClosed("engine").to_string()),
    }
}

fn prepare_socket_for_bind(socket: &Path) -> Result<(), DaemonError> {
    if !socket.exists() {
        return Ok(());
    }

    match StdUnixStream::connect(socket) {
        Ok(_) => {
            return Err(DaemonError::Protocol(format!(
                "daemon socket already in use: {}",
                socket.display()
            )));
        }
        Err(err) => {
            tracing::warn!(
                socket = %socket.display(),
                error = %err,
                "removing stale daemon socket before bind",
            );
        }
    }

    match fs::remove_file(socket) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
        Err(err) => Err(io_err(socket, err)),
    }
}

fn ensure_runtime_dirs(root: &Path) -> Result<(), DaemonError> {
    let run = runtime_dir(root);
    if !run.exists() {
        fs::create_dir_all(&run).map_err(|e| io_err(&run, e))?;
    }
    Ok(())
}

async fn write_response(
    writer: &mut OwnedWriteHalf,
    response: &DaemonResponse,
) -> Result<(), DaemonError> {
    let payload = serde_json::to_string(response)?;
    writer
        .write_all(payload.as_bytes())
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .write_all(b"\n")
        .await
        .map_err(|e| io_err("daemon socket write", e))?;
    writer
        .flush()
        .await
        .map_err(|e| io_err("daemon socket flush", e))?;
    Ok(())
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Protocol(format!(
            "{task} task join failure: {err}"
        ))),
    }
}

fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        let _ = fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    } else {
        let _ = fmt().with_env_filter(filter).with_target(false).try_init();
    }
}

#[cfg(unix)]
fn set_socket_permissions(path: &Path) -> Result<(), DaemonError> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600)).map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_socket_permissions(_path: &Path) -> Result<(), DaemonError> {
    Ok(())
}
