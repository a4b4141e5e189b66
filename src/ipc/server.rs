//! Control socket server
//!
//! Accepts one request per connection, answers it, and moves on. Submitted
//! push events go straight into the dispatch queue; a shutdown request is
//! forwarded to the dispatch loop.

use flume::Sender;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

use super::{read_frame, write_frame, RelayMessage, RelayResponse};
use crate::errors::{AppError, AppResult};
use crate::push::PushEvent;

pub struct IpcServer {
    listener: UnixListener,
    socket_path: PathBuf,
    push_tx: Sender<PushEvent>,
    shutdown_tx: Sender<()>,
    started_at: Instant,
}

impl IpcServer {
    /// Bind the control socket, replacing a stale file from a previous run
    pub fn bind(
        socket_path: &Path,
        push_tx: Sender<PushEvent>,
        shutdown_tx: Sender<()>,
    ) -> AppResult<Self> {
        if socket_path.exists() {
            fs::remove_file(socket_path)
                .map_err(|e| AppError::io_with_source(socket_path, "remove stale socket", e))?;
        }

        let listener = UnixListener::bind(socket_path).map_err(|e| {
            AppError::daemon_with_source(
                format!("failed to bind control socket at {}", socket_path.display()),
                e,
            )
        })?;

        info!("control socket listening at {}", socket_path.display());

        Ok(IpcServer {
            listener,
            socket_path: socket_path.to_path_buf(),
            push_tx,
            shutdown_tx,
            started_at: Instant::now(),
        })
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((stream, _addr)) => {
                    if let Err(e) = self.handle_connection(stream).await {
                        warn!("control connection failed: {e}");
                    }
                }
                Err(e) => {
                    warn!("control socket accept failed: {e}");
                    break;
                }
            }
        }
    }

    async fn handle_connection(&self, mut stream: UnixStream) -> AppResult<()> {
        let message: RelayMessage = read_frame(&mut stream).await?;
        debug!("control request: {message:?}");

        let response = self.respond(message).await;
        write_frame(&mut stream, &response).await
    }

    async fn respond(&self, message: RelayMessage) -> RelayResponse {
        match message {
            RelayMessage::Submit(event) => match self.push_tx.send_async(event).await {
                Ok(()) => RelayResponse::Ok,
                Err(_) => RelayResponse::Error("dispatch queue closed".to_string()),
            },
            RelayMessage::Ping => RelayResponse::Ok,
            RelayMessage::Status => RelayResponse::Status {
                queue_size: self.push_tx.len(),
                uptime_secs: self.started_at.elapsed().as_secs(),
            },
            RelayMessage::Shutdown => {
                // Full queue means a shutdown is already pending.
                let _ = self.shutdown_tx.try_send(());
                RelayResponse::Ok
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::{convenience, IpcClient};
    use std::time::Duration;
    use tempfile::TempDir;

    struct TestServer {
        socket_path: PathBuf,
        push_rx: flume::Receiver<PushEvent>,
        shutdown_rx: flume::Receiver<()>,
        _dir: TempDir,
    }

    fn start_server() -> TestServer {
        let dir = TempDir::new().unwrap();
        let socket_path = dir.path().join("relay.sock");
        let (push_tx, push_rx) = flume::unbounded();
        let (shutdown_tx, shutdown_rx) = flume::bounded(1);

        let server = IpcServer::bind(&socket_path, push_tx, shutdown_tx).unwrap();
        tokio::spawn(server.run());

        TestServer {
            socket_path,
            push_rx,
            shutdown_rx,
            _dir: dir,
        }
    }

    #[tokio::test]
    async fn test_ping_answers_ok() {
        let server = start_server();
        let response = IpcClient::new()
            .send(&server.socket_path, RelayMessage::Ping)
            .await
            .unwrap();
        assert!(matches!(response, RelayResponse::Ok));
    }

    #[tokio::test]
    async fn test_submitted_event_reaches_dispatch_queue() {
        let server = start_server();

        let event = PushEvent::new(Some(br#"{"title":"T"}"#.to_vec()));
        convenience::submit_push_event(&server.socket_path, event)
            .await
            .unwrap();

        let received = tokio::time::timeout(Duration::from_secs(5), server.push_rx.recv_async())
            .await
            .expect("event should arrive")
            .unwrap();
        assert_eq!(received.data.as_deref(), Some(br#"{"title":"T"}"#.as_slice()));
    }

    #[tokio::test]
    async fn test_status_reports_queue_size() {
        let server = start_server();

        let response = convenience::relay_status(&server.socket_path).await.unwrap();
        match response {
            RelayResponse::Status { queue_size, .. } => assert_eq!(queue_size, 0),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_shutdown_forwards_to_dispatcher() {
        let server = start_server();

        convenience::shutdown_relay(&server.socket_path).await.unwrap();

        tokio::time::timeout(Duration::from_secs(5), server.shutdown_rx.recv_async())
            .await
            .expect("shutdown should be forwarded")
            .unwrap();
    }

    #[tokio::test]
    async fn test_bind_replaces_stale_socket() {
        let dir = TempDir::new().unwrap();
        let socket_path = dir.path().join("relay.sock");
        fs::write(&socket_path, b"stale").unwrap();

        let (push_tx, _push_rx) = flume::unbounded();
        let (shutdown_tx, _shutdown_rx) = flume::bounded(1);
        let server = IpcServer::bind(&socket_path, push_tx, shutdown_tx).unwrap();
        assert_eq!(server.socket_path(), socket_path.as_path());
    }
}
