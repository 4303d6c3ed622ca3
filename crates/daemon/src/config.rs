// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration, assembled from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use isk_pool::{Engine, PoolConfig, DEFAULT_MAX_WORKERS, DEFAULT_WORKER_DIR};
use isk_service::DEFAULT_CHUNK_SIZE;
use thiserror::Error;

use crate::env;

/// Default retention for terminal jobs before GC.
const DEFAULT_JOB_MAX_AGE: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine state directory (set ISKOCES_STATE_DIR or HOME)")]
    NoStateDir,

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolved daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub log_path: PathBuf,
    pub engine: Engine,
    pub max_workers: usize,
    pub chunk_size: usize,
    pub worker_dir: PathBuf,
    pub worker_command: String,
    pub worker_script: PathBuf,
    pub job_max_age: Duration,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let state_dir = env::state_dir().ok_or(ConfigError::NoStateDir)?;

        let engine = match env::engine() {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: "ISKOCES_ENGINE",
                value: raw,
            })?,
            None => Engine::Argos,
        };

        let max_workers = parse_positive("ISKOCES_MAX_WORKERS", env::max_workers())?
            .unwrap_or(DEFAULT_MAX_WORKERS);
        let chunk_size = parse_positive("ISKOCES_CHUNK_SIZE_BYTES", env::chunk_size_bytes())?
            .unwrap_or(DEFAULT_CHUNK_SIZE);
        let job_max_age = parse_positive("ISKOCES_JOB_MAX_AGE_SECS", env::job_max_age_secs())?
            .map(|secs| Duration::from_secs(secs as u64))
            .unwrap_or(DEFAULT_JOB_MAX_AGE);

        Ok(Self {
            socket_path: state_dir.join("iskocesd.sock"),
            log_path: state_dir.join("logs").join("iskocesd.log"),
            state_dir,
            engine,
            max_workers,
            chunk_size,
            worker_dir: env::worker_dir().unwrap_or_else(|| PathBuf::from(DEFAULT_WORKER_DIR)),
            worker_command: env::worker_command().unwrap_or_else(|| "python3".to_string()),
            worker_script: env::worker_script()
                .unwrap_or_else(|| PathBuf::from("/app/scripts/translate_worker.py")),
            job_max_age,
        })
    }

    /// Pool configuration slice of the daemon config.
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            engine: self.engine,
            max_workers: self.max_workers,
            worker_dir: self.worker_dir.clone(),
            command: self.worker_command.clone(),
            script: self.worker_script.clone(),
        }
    }
}

fn parse_positive(
    key: &'static str,
    raw: Option<String>,
) -> Result<Option<usize>, ConfigError> {
    match raw {
        None => Ok(None),
        Some(raw) => match raw.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _ => Err(ConfigError::InvalidValue { key, value: raw }),
        },
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
