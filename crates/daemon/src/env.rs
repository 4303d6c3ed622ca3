// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

/// Resolve state directory: ISKOCES_STATE_DIR > XDG_STATE_HOME/iskoces >
/// ~/.local/state/iskoces
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("ISKOCES_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("iskoces"));
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".local/state/iskoces"))
}

pub fn engine() -> Option<String> {
    std::env::var("ISKOCES_ENGINE").ok()
}

pub fn max_workers() -> Option<String> {
    std::env::var("ISKOCES_MAX_WORKERS").ok()
}

pub fn chunk_size_bytes() -> Option<String> {
    std::env::var("ISKOCES_CHUNK_SIZE_BYTES").ok()
}

pub fn worker_dir() -> Option<PathBuf> {
    std::env::var("ISKOCES_WORKER_DIR").ok().map(PathBuf::from)
}

pub fn worker_command() -> Option<String> {
    std::env::var("ISKOCES_WORKER_COMMAND").ok()
}

pub fn worker_script() -> Option<PathBuf> {
    std::env::var("ISKOCES_WORKER_SCRIPT").ok().map(PathBuf::from)
}

pub fn job_max_age_secs() -> Option<String> {
    std::env::var("ISKOCES_JOB_MAX_AGE_SECS").ok()
}
