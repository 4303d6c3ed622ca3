// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! isk-pool: Supervised pool of translation worker subprocesses.
//!
//! Each worker is a long-lived subprocess listening on its own Unix socket.
//! The pool spawns them, watches them, restarts them when they die, and
//! multiplexes translate calls across them with one short-lived connection
//! per request. Model load cost is paid once per worker process, not once
//! per request.

pub mod engine;
pub mod metrics;
pub mod pool;
pub mod translator;
pub mod wire;
pub mod worker;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeCall, FakeTranslator};

pub use engine::Engine;
pub use metrics::MetricsCollector;
pub use pool::{PoolConfig, PoolStats, WorkerPool, DEFAULT_MAX_WORKERS, DEFAULT_WORKER_DIR};
pub use translator::{Translator, SUPPORTED_LANGUAGES};
