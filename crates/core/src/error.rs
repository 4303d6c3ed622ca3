// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types shared across the translation core.

use thiserror::Error;

/// Errors surfaced by the worker pool and job processor.
///
/// No layer below the supervisor retries: a failed translate call is not
/// re-dispatched to another worker, and a failed chunk fails the whole job.
#[derive(Debug, Error)]
pub enum TranslateError {
    /// Required request field missing or empty. No job is created.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The 10 s worker acquisition timer elapsed.
    #[error("timeout waiting for available worker")]
    AcquireTimeout,

    /// Caller deadline expired or the request was abandoned.
    #[error("translation cancelled: {0}")]
    Cancelled(String),

    /// Connect, write, read, decode or premature end-of-stream on the
    /// worker socket. The worker is not quarantined — its supervisor
    /// detects a dead subprocess independently.
    #[error("worker transport failure: {0}")]
    Transport(String),

    /// The worker replied `success=false`.
    #[error("translation failed: {0}")]
    Worker(String),

    /// A single chunk of a chunked document failed. Index is 1-based.
    #[error("chunk {index} translation failed: {source}")]
    Chunk {
        index: usize,
        #[source]
        source: Box<TranslateError>,
    },

    /// Worker subprocess could not be started.
    #[error("worker startup failed: {0}")]
    Startup(String),
}

impl TranslateError {
    /// Wrap an error as a chunk failure at the given 1-based index.
    pub fn chunk(index: usize, source: TranslateError) -> Self {
        TranslateError::Chunk {
            index,
            source: Box::new(source),
        }
    }
}
