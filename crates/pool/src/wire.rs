// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire format for the worker socket protocol.
//!
//! One request/response exchange per connection: a single JSON object
//! terminated by a newline in each direction. The worker may close the
//! connection right after replying; connections are never reused.

use isk_core::TranslateError;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Request sent to a worker subprocess.
#[derive(Debug, Serialize)]
pub struct WorkerRequest<'a> {
    pub text: &'a str,
    pub source_lang: &'a str,
    pub target_lang: &'a str,
}

/// Reply read back from a worker subprocess.
#[derive(Debug, Deserialize)]
pub struct WorkerReply {
    pub success: bool,
    #[serde(default)]
    pub translated_text: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Write one newline-terminated JSON request.
pub async fn send_request<W: AsyncWrite + Unpin>(
    writer: &mut W,
    request: &WorkerRequest<'_>,
) -> Result<(), TranslateError> {
    let mut payload = serde_json::to_vec(request)
        .map_err(|e| TranslateError::Transport(format!("failed to encode request: {}", e)))?;
    payload.push(b'\n');
    writer
        .write_all(&payload)
        .await
        .map_err(|e| TranslateError::Transport(format!("failed to send request: {}", e)))?;
    writer
        .flush()
        .await
        .map_err(|e| TranslateError::Transport(format!("failed to send request: {}", e)))?;
    Ok(())
}

/// Read exactly one JSON reply, terminated by a newline or end-of-stream.
///
/// A stream that ends before any payload arrives surfaces as a
/// worker-closed transport error.
pub async fn read_reply<R: AsyncRead + Unpin>(reader: R) -> Result<WorkerReply, TranslateError> {
    let mut line = String::new();
    let mut reader = BufReader::new(reader);
    let n = reader
        .read_line(&mut line)
        .await
        .map_err(|e| TranslateError::Transport(format!("failed to read response: {}", e)))?;

    if n == 0 {
        return Err(TranslateError::Transport(
            "worker connection closed".to_string(),
        ));
    }

    serde_json::from_str(line.trim_end())
        .map_err(|e| TranslateError::Transport(format!("failed to decode response: {}", e)))
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
