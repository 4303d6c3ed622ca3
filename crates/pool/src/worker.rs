// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One translation worker subprocess.
//!
//! A worker keeps its `id` and socket path for its whole pool lifetime;
//! restarts replace the subprocess (and the list entry) but never the
//! identity. The `busy` flag strictly serializes requests: a worker has at
//! most one in-flight request at any moment.

use std::path::{Path, PathBuf};
use std::time::Instant;

use parking_lot::Mutex;

/// Point-in-time view of a worker's mutable state, for the metrics sampler.
#[derive(Debug, Clone, Copy)]
pub(crate) struct WorkerStats {
    pub busy: bool,
    pub alive: bool,
    pub pid: Option<u32>,
    pub started_at: Option<Instant>,
}

#[derive(Debug)]
struct WorkerState {
    busy: bool,
    alive: bool,
    pid: Option<u32>,
    last_used: Instant,
    started_at: Option<Instant>,
}

/// A single worker in the pool.
#[derive(Debug)]
pub(crate) struct Worker {
    pub id: usize,
    pub socket_path: PathBuf,
    state: Mutex<WorkerState>,
}

impl Worker {
    pub fn new(id: usize, worker_dir: &Path) -> Self {
        Self {
            id,
            socket_path: worker_dir.join(format!("worker-{}.sock", id)),
            state: Mutex::new(WorkerState {
                busy: false,
                alive: false,
                pid: None,
                last_used: Instant::now(),
                started_at: None,
            }),
        }
    }

    /// Claim the worker for one request. Fails for busy or dead workers so
    /// stale ready tokens are simply dropped by the acquirer.
    pub fn try_claim(&self) -> bool {
        let mut state = self.state.lock();
        if state.busy || !state.alive {
            return false;
        }
        state.busy = true;
        state.last_used = Instant::now();
        true
    }

    /// Release after a request. Returns whether the subprocess is still
    /// live, which decides if the ready token goes back on the channel —
    /// dead workers become eligible again only through the restart path.
    pub fn release(&self) -> bool {
        let mut state = self.state.lock();
        state.busy = false;
        state.alive
    }

    /// Record a successful subprocess start.
    pub fn mark_started(&self, pid: Option<u32>) {
        let mut state = self.state.lock();
        state.alive = true;
        state.pid = pid;
        state.started_at = Some(Instant::now());
    }

    /// Record subprocess death. Busy is cleared before any restart.
    pub fn mark_dead(&self) {
        let mut state = self.state.lock();
        state.busy = false;
        state.alive = false;
        state.pid = None;
    }

    pub fn is_alive(&self) -> bool {
        self.state.lock().alive
    }

    pub fn is_busy(&self) -> bool {
        self.state.lock().busy
    }

    pub fn last_used(&self) -> Instant {
        self.state.lock().last_used
    }

    pub fn stats(&self) -> WorkerStats {
        let state = self.state.lock();
        WorkerStats {
            busy: state.busy,
            alive: state.alive,
            pid: state.pid,
            started_at: state.started_at,
        }
    }
}

/// Resident set size of a process in bytes, read from the `VmRSS:` line of
/// `/proc/<pid>/status`. Returns None where the platform or the process
/// doesn't offer it; callers skip absent readings silently.
pub(crate) fn proc_rss_bytes(pid: u32) -> Option<u64> {
    let status = std::fs::read_to_string(format!("/proc/{}/status", pid)).ok()?;
    for line in status.lines() {
        if let Some(rest) = line.strip_prefix("VmRSS:") {
            let kb: u64 = rest.split_whitespace().next()?.parse().ok()?;
            return Some(kb * 1024);
        }
    }
    None
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
