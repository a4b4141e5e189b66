//! Local control socket
//!
//! Length-prefixed bincode frames over a unix domain socket. The CLI uses
//! this to inject push events into a running relay, query status, and stop
//! the daemon.

pub mod server;

pub use server::IpcServer;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::push::PushEvent;

/// Requests accepted on the control socket
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RelayMessage {
    Submit(PushEvent),
    Ping,
    Status,
    Shutdown,
}

/// Responses written back for each request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RelayResponse {
    Ok,
    Error(String),
    Status { queue_size: usize, uptime_secs: u64 },
}

/// Upper bound on accepted frames; a push payload is tiny, anything beyond
/// this is a protocol violation.
const MAX_FRAME_SIZE: usize = 1024 * 1024;

pub(crate) async fn write_frame<T, S>(stream: &mut S, value: &T) -> AppResult<()>
where
    T: Serialize,
    S: AsyncWrite + Unpin,
{
    let payload = bincode::serialize(value).map_err(|e| AppError::ipc("frame encode", e))?;
    let length = payload.len() as u32;

    stream
        .write_all(&length.to_le_bytes())
        .await
        .map_err(|e| AppError::ipc("frame length write", e))?;
    stream
        .write_all(&payload)
        .await
        .map_err(|e| AppError::ipc("frame write", e))?;
    stream
        .flush()
        .await
        .map_err(|e| AppError::ipc("frame flush", e))?;
    Ok(())
}

pub(crate) async fn read_frame<T, S>(stream: &mut S) -> AppResult<T>
where
    T: DeserializeOwned,
    S: AsyncRead + Unpin,
{
    let mut length_bytes = [0u8; 4];
    stream
        .read_exact(&mut length_bytes)
        .await
        .map_err(|e| AppError::ipc("frame length read", e))?;

    let length = u32::from_le_bytes(length_bytes) as usize;
    if length > MAX_FRAME_SIZE {
        return Err(AppError::Ipc {
            operation: format!("read of oversized frame ({length} bytes)"),
            source: None,
        });
    }

    let mut payload = vec![0u8; length];
    stream
        .read_exact(&mut payload)
        .await
        .map_err(|e| AppError::ipc("frame read", e))?;

    bincode::deserialize(&payload).map_err(|e| AppError::ipc("frame decode", e))
}

/// Client side of the control socket
#[derive(Default)]
pub struct IpcClient;

impl IpcClient {
    pub fn new() -> Self {
        IpcClient
    }

    /// Send one request and wait for its response
    ///
    /// A connect failure maps to [`AppError::DaemonNotRunning`]; everything
    /// past the connect is a real protocol error.
    pub async fn send(
        &self,
        socket_path: &Path,
        message: RelayMessage,
    ) -> AppResult<RelayResponse> {
        debug!("sending control message to {}", socket_path.display());

        let mut stream = UnixStream::connect(socket_path)
            .await
            .map_err(|_| AppError::DaemonNotRunning)?;

        write_frame(&mut stream, &message).await?;
        read_frame(&mut stream).await
    }
}

/// Convenience wrappers for the common control operations
pub mod convenience {
    use super::*;

    /// Hand a push event to the running relay
    pub async fn submit_push_event(socket_path: &Path, event: PushEvent) -> AppResult<()> {
        match IpcClient::new()
            .send(socket_path, RelayMessage::Submit(event))
            .await?
        {
            RelayResponse::Ok => Ok(()),
            RelayResponse::Error(reason) => Err(AppError::daemon(reason)),
            other => Err(AppError::daemon(format!(
                "unexpected submit response: {other:?}"
            ))),
        }
    }

    pub async fn relay_status(socket_path: &Path) -> AppResult<RelayResponse> {
        IpcClient::new().send(socket_path, RelayMessage::Status).await
    }

    pub async fn shutdown_relay(socket_path: &Path) -> AppResult<RelayResponse> {
        IpcClient::new()
            .send(socket_path, RelayMessage::Shutdown)
            .await
    }
}
