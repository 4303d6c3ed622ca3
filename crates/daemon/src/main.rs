// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Iskoces Daemon (iskocesd)
//!
//! Translation gateway: a pool of supervised translator subprocesses
//! behind a Unix-socket request interface with an asynchronous job queue.
//!
//! Architecture:
//! - Listener Task: spawned task handling socket I/O, one task per connection
//! - Worker Pool: subprocess supervision and request multiplexing
//! - Job Processor: background tasks driving long translations with progress

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod config;
mod env;
mod listener;
mod protocol;

use std::sync::Arc;
use std::time::{Duration, Instant};

use isk_pool::{Translator, WorkerPool};
use isk_service::{JobProcessor, JobRegistry, TranslationHandler};
use tokio::net::UnixListener;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::Notify;
use tracing::info;

use crate::config::Config;
use crate::listener::{ListenCtx, Listener};

/// Cadence of the job/client cleanup task.
const GC_INTERVAL: Duration = Duration::from_secs(60);

/// Clients idle past this are dropped by the cleanup task.
const CLIENT_MAX_IDLE: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Handle info flags before any config or socket setup
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("iskocesd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("iskocesd {}", env!("CARGO_PKG_VERSION"));
                println!("Iskoces translation gateway daemon");
                println!();
                println!("USAGE:");
                println!("    iskocesd");
                println!();
                println!("Listens on a Unix socket for translation requests and manages");
                println!("the translator worker subprocesses. Configuration comes from");
                println!("ISKOCES_* environment variables.");
                println!();
                println!("OPTIONS:");
                println!("    -h, --help       Print help information");
                println!("    -v, --version    Print version information");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: iskocesd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;

    rotate_log_if_needed(&config.log_path);
    let _log_guard = setup_logging(&config)?;

    info!(
        engine = %config.engine,
        max_workers = config.max_workers,
        chunk_size = config.chunk_size,
        "starting iskocesd"
    );

    std::fs::create_dir_all(&config.state_dir)?;
    let _ = std::fs::remove_file(&config.socket_path);
    let unix_listener = UnixListener::bind(&config.socket_path)?;

    // Pool → processor → registry → handler
    let pool = WorkerPool::new(config.pool_config()).await?;
    let translator: Arc<dyn Translator> = Arc::clone(&pool) as Arc<dyn Translator>;
    let processor = Arc::new(JobProcessor::with_chunk_size(
        Arc::clone(&translator),
        config.chunk_size,
    ));
    let registry = Arc::new(JobRegistry::new(Arc::clone(&processor)));
    let handler = Arc::new(TranslationHandler::new(
        translator,
        processor,
        Arc::clone(&registry),
    ));

    let shutdown = Arc::new(Notify::new());
    let ctx = Arc::new(ListenCtx {
        handler: Arc::clone(&handler),
        registry: Arc::clone(&registry),
        pool: Arc::clone(&pool),
        engine: config.engine,
        start_time: Instant::now(),
        shutdown: Arc::clone(&shutdown),
    });
    tokio::spawn(Listener::new(unix_listener, ctx).run());

    spawn_gc(Arc::clone(&registry), Arc::clone(&handler), config.job_max_age);

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    info!("daemon ready, listening on {}", config.socket_path.display());

    // Signal ready for parent process (e.g. systemd, container entrypoint)
    println!("READY");

    tokio::select! {
        _ = shutdown.notified() => info!("shutdown requested via command"),
        _ = sigterm.recv() => info!("received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("received SIGINT, shutting down..."),
    }

    pool.shutdown().await;
    let _ = std::fs::remove_file(&config.socket_path);
    info!("daemon stopped");
    Ok(())
}

/// Spawn the periodic cleanup of terminal jobs and idle clients.
fn spawn_gc(
    registry: Arc<JobRegistry>,
    handler: Arc<TranslationHandler>,
    job_max_age: Duration,
) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(GC_INTERVAL);
        loop {
            interval.tick().await;
            registry.gc(job_max_age);
            handler.clients().cleanup_expired(CLIENT_MAX_IDLE);
        }
    });
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep.
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Shifts `iskocesd.log` → `.1` → `.2` → `.3`, deleting the oldest.
/// Best-effort: rotation failures are silently ignored so the daemon
/// still starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();

    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(config: &Config) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = config
        .log_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("log path has no parent directory"))?;
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::never(
        log_dir,
        config
            .log_path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("log path has no file name"))?,
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
