// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for daemon communication.
//!
//! Each frame is a 4-byte big-endian length followed by one JSON-encoded
//! [`Request`] or [`Response`]. One request per connection; only `JobWatch`
//! answers with more than one frame.

use std::collections::HashMap;
use std::time::Duration;

use isk_core::{JobSnapshot, TranslateRequest, TranslateResponse};
use isk_service::{HeartbeatOutcome, Registration, TitleCheck};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Protocol version (from Cargo.toml)
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Largest accepted frame (64 MB); documents are chunked far below this.
pub const MAX_FRAME_BYTES: usize = 64 * 1024 * 1024;

/// Default timeout for one frame read or write
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Request from a client to the daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Get daemon status
    Status,

    /// Synchronous translation; blocks until the job finishes
    Translate { request: TranslateRequest },

    /// Queue a translation job, returning its id immediately
    Submit { request: TranslateRequest },

    /// Fetch one job snapshot
    JobStatus { job_id: String },

    /// Stream job snapshots on every change until the job is terminal
    JobWatch { job_id: String },

    /// Pre-flight readiness check with title only
    CheckTitle {
        title: String,
        source_language: String,
        language_tag: String,
    },

    /// Register a client connection
    RegisterClient {
        client_name: String,
        #[serde(default)]
        client_version: String,
        #[serde(default)]
        namespace: String,
        #[serde(default)]
        metadata: HashMap<String, String>,
    },

    /// Client keepalive
    Heartbeat {
        client_id: String,
        client_name: String,
    },

    /// Prometheus metrics in text exposition format
    Metrics,

    /// Request daemon shutdown
    Shutdown,
}

/// Response from the daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    Pong,

    Status {
        version: String,
        engine: String,
        uptime_secs: u64,
        total_workers: usize,
        active_workers: usize,
        busy_workers: usize,
        jobs: usize,
        clients: usize,
    },

    Translate { response: TranslateResponse },

    JobCreated { job_id: String },

    /// One job snapshot; `JobWatch` sends a sequence of these, ending with
    /// a terminal one.
    Job { snapshot: JobSnapshot },

    TitleCheck { check: TitleCheck },

    Registered { registration: Registration },

    Heartbeat { outcome: HeartbeatOutcome },

    Metrics { text: String },

    ShuttingDown,

    Error { message: String },
}

/// Framing errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed")]
    Closed,

    #[error("frame too large: {0} bytes")]
    Oversize(usize),

    #[error("frame timed out")]
    TimedOut,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub async fn read_request<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Request, ProtocolError> {
    recv_frame(reader, timeout).await
}

pub async fn read_response<R: AsyncReadExt + Unpin>(
    reader: &mut R,
    timeout: Duration,
) -> Result<Response, ProtocolError> {
    recv_frame(reader, timeout).await
}

pub async fn write_request<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    request: &Request,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    send_frame(writer, request, timeout).await
}

pub async fn write_response<W: AsyncWriteExt + Unpin>(
    writer: &mut W,
    response: &Response,
    timeout: Duration,
) -> Result<(), ProtocolError> {
    send_frame(writer, response, timeout).await
}

/// Write one length-prefixed JSON frame within `timeout`.
async fn send_frame<W, T>(writer: &mut W, msg: &T, timeout: Duration) -> Result<(), ProtocolError>
where
    W: AsyncWriteExt + Unpin,
    T: Serialize,
{
    let payload = serde_json::to_vec(msg)?;
    if payload.len() > MAX_FRAME_BYTES {
        return Err(ProtocolError::Oversize(payload.len()));
    }

    let io = async {
        writer.write_all(&(payload.len() as u32).to_be_bytes()).await?;
        writer.write_all(&payload).await?;
        writer.flush().await
    };
    tokio::time::timeout(timeout, io)
        .await
        .map_err(|_| ProtocolError::TimedOut)??;
    Ok(())
}

/// Read one length-prefixed JSON frame within `timeout`. A stream that
/// ends cleanly before the header surfaces as [`ProtocolError::Closed`].
async fn recv_frame<R, T>(reader: &mut R, timeout: Duration) -> Result<T, ProtocolError>
where
    R: AsyncReadExt + Unpin,
    T: DeserializeOwned,
{
    let io = async {
        let mut header = [0u8; 4];
        reader.read_exact(&mut header).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                ProtocolError::Closed
            } else {
                ProtocolError::Io(e)
            }
        })?;

        let len = u32::from_be_bytes(header) as usize;
        if len > MAX_FRAME_BYTES {
            return Err(ProtocolError::Oversize(len));
        }

        let mut payload = vec![0u8; len];
        reader.read_exact(&mut payload).await?;
        Ok(payload)
    };
    let payload = tokio::time::timeout(timeout, io)
        .await
        .map_err(|_| ProtocolError::TimedOut)??;

    Ok(serde_json::from_slice(&payload)?)
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
