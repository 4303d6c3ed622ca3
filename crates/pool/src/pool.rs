// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pool: spawning, supervising and multiplexing translation workers.
//!
//! Architecture:
//! - One watcher task per worker owns the subprocess handle, blocks on its
//!   exit and restarts it indefinitely with a short backoff.
//! - A bounded ready channel of worker ids doubles as the idle queue and
//!   the concurrency semaphore; capacity equals `max_workers`.
//! - A periodic supervisor restarts dead workers that lost their watcher,
//!   and a metrics task refreshes gauges every few seconds.
//!
//! `translate` is the sole hot path that touches workers: acquire a ready
//! worker, open one short-lived socket connection, exchange one JSON
//! request/response, release. Crash recovery reduces to "the next connect
//! fails; the watcher restarts; life continues".

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use isk_core::TranslateError;
use parking_lot::{Mutex, RwLock};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::UnixStream;
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::engine::Engine;
use crate::metrics::MetricsCollector;
use crate::translator::Translator;
use crate::wire::{self, WorkerRequest};
use crate::worker::{proc_rss_bytes, Worker};

/// Default number of worker subprocesses.
pub const DEFAULT_MAX_WORKERS: usize = 4;

/// Default rendezvous directory for worker sockets.
pub const DEFAULT_WORKER_DIR: &str = "/tmp/iskoces-workers";

/// Poll cadence while waiting for the subprocess to create its socket.
const STARTUP_POLL: Duration = Duration::from_millis(25);

/// Bound on the whole startup wait.
const STARTUP_WAIT: Duration = Duration::from_secs(1);

/// Backoff between a worker death and its restart attempt.
const RESTART_BACKOFF: Duration = Duration::from_secs(1);

/// Hard ceiling on waiting for a ready worker.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-request I/O deadline on the worker socket.
const IO_DEADLINE: Duration = Duration::from_secs(5 * 60);

/// Supervisor sweep interval for workers missed by their watcher.
const SUPERVISOR_INTERVAL: Duration = Duration::from_secs(30);

/// Gauge refresh interval.
const METRICS_INTERVAL: Duration = Duration::from_secs(5);

/// Configuration for the worker pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Engine tag for metric labels; pool behavior is identical across engines.
    pub engine: Engine,
    /// Number of worker subprocesses to maintain.
    pub max_workers: usize,
    /// Directory holding the per-worker rendezvous sockets.
    pub worker_dir: PathBuf,
    /// Interpreter executed per worker.
    pub command: String,
    /// Worker script, passed `--socket <path>` as its argument.
    pub script: PathBuf,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            engine: Engine::Argos,
            max_workers: DEFAULT_MAX_WORKERS,
            worker_dir: PathBuf::from(DEFAULT_WORKER_DIR),
            command: "python3".to_string(),
            script: PathBuf::from("/app/scripts/translate_worker.py"),
        }
    }
}

/// Aggregate view of the pool, for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub total: usize,
    pub active: usize,
    pub busy: usize,
    pub idle: usize,
}

/// A pool of supervised translation worker subprocesses.
pub struct WorkerPool {
    config: PoolConfig,
    workers: RwLock<Vec<Arc<Worker>>>,
    /// True per id while a watcher task is running for it.
    watched: Mutex<Vec<bool>>,
    ready_tx: mpsc::Sender<usize>,
    ready_rx: tokio::sync::Mutex<mpsc::Receiver<usize>>,
    shutdown_tx: watch::Sender<bool>,
    metrics: Arc<MetricsCollector>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Create the pool and start `max_workers` workers plus the supervisor
    /// and metrics tasks. Inability to create the rendezvous directory is
    /// fatal; individual worker startup failures are retried by the
    /// supervisor.
    pub async fn new(config: PoolConfig) -> Result<Arc<Self>, TranslateError> {
        std::fs::create_dir_all(&config.worker_dir).map_err(|e| {
            TranslateError::Startup(format!(
                "failed to create worker directory {}: {}",
                config.worker_dir.display(),
                e
            ))
        })?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = std::fs::set_permissions(
                &config.worker_dir,
                std::fs::Permissions::from_mode(0o755),
            );
        }

        let metrics = Arc::new(
            MetricsCollector::new(config.engine.as_str())
                .map_err(|e| TranslateError::Startup(format!("failed to register metrics: {}", e)))?,
        );

        let (ready_tx, ready_rx) = mpsc::channel(config.max_workers);
        let (shutdown_tx, _) = watch::channel(false);
        let workers = (0..config.max_workers)
            .map(|id| Arc::new(Worker::new(id, &config.worker_dir)))
            .collect();

        info!(
            engine = %config.engine,
            max_workers = config.max_workers,
            worker_dir = %config.worker_dir.display(),
            "initializing worker pool"
        );

        let pool = Arc::new(Self {
            watched: Mutex::new(vec![false; config.max_workers]),
            config,
            workers: RwLock::new(workers),
            ready_tx,
            ready_rx: tokio::sync::Mutex::new(ready_rx),
            shutdown_tx,
            metrics,
            tasks: Mutex::new(Vec::new()),
        });

        for id in 0..pool.config.max_workers {
            if let Err(e) = pool.start_worker(id).await {
                warn!(worker_id = id, error = %e, "failed to start initial worker, will retry");
            }
        }

        let supervisor = tokio::spawn(supervisor_loop(Arc::clone(&pool)));
        let sampler = tokio::spawn(metrics_loop(Arc::clone(&pool)));
        pool.tasks.lock().extend([supervisor, sampler]);

        Ok(pool)
    }

    pub fn metrics(&self) -> &Arc<MetricsCollector> {
        &self.metrics
    }

    pub fn stats(&self) -> PoolStats {
        let workers = self.workers.read();
        let mut stats = PoolStats {
            total: workers.len(),
            active: 0,
            busy: 0,
            idle: 0,
        };
        for worker in workers.iter() {
            let s = worker.stats();
            if s.alive {
                stats.active += 1;
            }
            if s.busy {
                stats.busy += 1;
            } else {
                stats.idle += 1;
            }
        }
        stats
    }

    /// Translate with an optional caller deadline applied to worker
    /// acquisition. The hard acquisition timeout and the per-request I/O
    /// deadline are enforced regardless.
    pub async fn translate_deadline(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        deadline: Option<tokio::time::Instant>,
    ) -> Result<String, TranslateError> {
        let start = Instant::now();
        let result = self
            .translate_inner(text, source_lang, target_lang, deadline)
            .await;
        match &result {
            Ok(out) => self
                .metrics
                .record_request(start.elapsed(), true, text.len(), out.len()),
            Err(_) => self
                .metrics
                .record_request(start.elapsed(), false, text.len(), 0),
        }
        result
    }

    async fn translate_inner(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
        deadline: Option<tokio::time::Instant>,
    ) -> Result<String, TranslateError> {
        let lease = self.acquire(deadline).await?;
        let worker = lease.worker();

        let connect_start = Instant::now();
        let stream = UnixStream::connect(&worker.socket_path).await;
        self.metrics
            .record_socket_connection(worker.id, connect_start.elapsed(), stream.is_ok());
        let mut stream = stream.map_err(|e| {
            TranslateError::Transport(format!("failed to connect to worker socket: {}", e))
        })?;

        let request = WorkerRequest {
            text,
            source_lang,
            target_lang,
        };
        let exchange = async {
            let (read_half, mut write_half) = stream.split();
            wire::send_request(&mut write_half, &request).await?;
            wire::read_reply(read_half).await
        };
        let reply = tokio::time::timeout(IO_DEADLINE, exchange)
            .await
            .map_err(|_| {
                TranslateError::Transport("worker request deadline exceeded".to_string())
            })??;

        if reply.success {
            Ok(reply.translated_text.unwrap_or_default())
        } else {
            Err(TranslateError::Worker(
                reply
                    .error
                    .unwrap_or_else(|| "worker reported an unknown error".to_string()),
            ))
        }
        // Lease drops here: busy cleared, ready token returned if the
        // worker is still live.
    }

    /// Take a worker off the ready channel. First of ready token, caller
    /// deadline and the hard timeout wins; both failure paths observe the
    /// queue wait. Stale tokens for busy or dead workers are dropped and
    /// the wait continues.
    async fn acquire(
        &self,
        deadline: Option<tokio::time::Instant>,
    ) -> Result<WorkerLease, TranslateError> {
        let wait_start = Instant::now();

        // An already-expired deadline never observes a worker, even when a
        // ready token is immediately available.
        if let Some(at) = deadline {
            if at <= tokio::time::Instant::now() {
                self.metrics.record_queue_wait(wait_start.elapsed());
                return Err(TranslateError::Cancelled(
                    "deadline expired while waiting for a worker".to_string(),
                ));
            }
        }

        let hard_timeout = tokio::time::sleep(ACQUIRE_TIMEOUT);
        tokio::pin!(hard_timeout);

        loop {
            let next_token = async {
                let mut rx = self.ready_rx.lock().await;
                rx.recv().await
            };
            let caller_deadline = async {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                token = next_token => match token {
                    Some(id) => {
                        let worker = self.worker(id);
                        if worker.try_claim() {
                            self.metrics.record_queue_wait(wait_start.elapsed());
                            return Ok(WorkerLease {
                                worker,
                                ready_tx: self.ready_tx.clone(),
                            });
                        }
                        debug!(worker_id = id, "dropping stale ready token");
                    }
                    None => {
                        return Err(TranslateError::Transport(
                            "worker pool is shut down".to_string(),
                        ))
                    }
                },
                _ = &mut hard_timeout => {
                    self.metrics.record_queue_wait(wait_start.elapsed());
                    return Err(TranslateError::AcquireTimeout);
                }
                _ = caller_deadline => {
                    self.metrics.record_queue_wait(wait_start.elapsed());
                    return Err(TranslateError::Cancelled(
                        "deadline expired while waiting for a worker".to_string(),
                    ));
                }
            }
        }
    }

    fn worker(&self, id: usize) -> Arc<Worker> {
        Arc::clone(&self.workers.read()[id])
    }

    fn is_watched(&self, id: usize) -> bool {
        self.watched.lock()[id]
    }

    fn set_watched(&self, id: usize, value: bool) {
        self.watched.lock()[id] = value;
    }

    /// Start worker `id` and its watcher, and make it eligible for requests.
    async fn start_worker(self: &Arc<Self>, id: usize) -> Result<(), TranslateError> {
        let child = self.respawn(id).await?;
        let _ = self.ready_tx.try_send(id);
        self.set_watched(id, true);
        let handle = tokio::spawn(watch_worker(Arc::clone(self), id, child));
        self.tasks.lock().push(handle);
        Ok(())
    }

    /// Replace the list entry for `id` with a fresh worker and spawn its
    /// subprocess. Restart preserves id and socket path.
    async fn respawn(&self, id: usize) -> Result<Child, TranslateError> {
        let fresh = Arc::new(Worker::new(id, &self.config.worker_dir));
        self.workers.write()[id] = Arc::clone(&fresh);

        let child = self.spawn_subprocess(id, &fresh.socket_path).await?;
        fresh.mark_started(child.id());
        self.metrics.record_worker_start(id);
        info!(worker_id = id, pid = ?child.id(), "worker started");
        Ok(child)
    }

    async fn spawn_subprocess(
        &self,
        id: usize,
        socket_path: &std::path::Path,
    ) -> Result<Child, TranslateError> {
        // Remove any stale rendezvous file before the subprocess binds.
        let _ = tokio::fs::remove_file(socket_path).await;

        let mut cmd = Command::new(&self.config.command);
        cmd.arg(&self.config.script)
            .arg("--socket")
            .arg(socket_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            TranslateError::Startup(format!("failed to start worker {}: {}", id, e))
        })?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_worker_stderr(id, stderr));
        }

        // Give the subprocess a short bounded window to bind its socket.
        let deadline = Instant::now() + STARTUP_WAIT;
        while tokio::fs::metadata(socket_path).await.is_err() {
            if Instant::now() >= deadline {
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Err(TranslateError::Startup(format!(
                    "worker {} socket not created at {}",
                    id,
                    socket_path.display()
                )));
            }
            tokio::time::sleep(STARTUP_POLL).await;
        }

        Ok(child)
    }

    /// Stop everything: supervisor and metrics loops, every subprocess,
    /// every rendezvous file. Waits for all watcher tasks to exit.
    pub async fn shutdown(&self) {
        info!("shutting down worker pool");
        let _ = self.shutdown_tx.send(true);

        let handles: Vec<_> = self.tasks.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }

        // Workers that never got a watcher still leave socket files behind.
        for worker in self.workers.read().iter() {
            let _ = std::fs::remove_file(&worker.socket_path);
        }
    }

    /// Refresh pool gauges and per-worker uptime/memory readings.
    fn sample_metrics(&self) {
        let _guard = self.metrics.sampler_guard();
        let workers: Vec<Arc<Worker>> = self.workers.read().iter().map(Arc::clone).collect();

        let mut active = 0;
        let mut busy = 0;
        let mut idle = 0;
        for worker in &workers {
            let stats = worker.stats();
            if stats.busy {
                busy += 1;
            } else {
                idle += 1;
            }
            if stats.alive {
                active += 1;
                if let Some(started_at) = stats.started_at {
                    self.metrics
                        .set_worker_uptime(worker.id, started_at.elapsed());
                }
                if let Some(rss) = stats.pid.and_then(proc_rss_bytes) {
                    self.metrics.set_worker_memory(worker.id, rss);
                }
            }
        }

        let queue_len = self.ready_tx.max_capacity() - self.ready_tx.capacity();
        self.metrics
            .set_pool_gauges(workers.len(), active, busy, idle, queue_len);
    }
}

#[async_trait]
impl Translator for WorkerPool {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError> {
        self.translate_deadline(text, source_lang, target_lang, None)
            .await
    }

    /// One synthetic translation with known-good inputs.
    async fn check_health(&self) -> Result<(), TranslateError> {
        self.translate_deadline("test", "en", "fr", None).await?;
        Ok(())
    }
}

/// Exclusive hold on one worker for one request.
///
/// Dropping the lease — on success, error or cancellation — clears the busy
/// flag and puts the ready token back while the subprocess is live. Dead
/// workers get their token back from the restart path instead.
struct WorkerLease {
    worker: Arc<Worker>,
    ready_tx: mpsc::Sender<usize>,
}

impl WorkerLease {
    fn worker(&self) -> &Arc<Worker> {
        &self.worker
    }
}

impl Drop for WorkerLease {
    fn drop(&mut self) {
        if self.worker.release() {
            let _ = self.ready_tx.try_send(self.worker.id);
        }
    }
}

/// Per-worker watcher: owns the subprocess handle, restarts on death,
/// kills and cleans up on shutdown.
async fn watch_worker(pool: Arc<WorkerPool>, id: usize, mut child: Child) {
    let mut shutdown = pool.shutdown_tx.subscribe();

    loop {
        tokio::select! {
            status = child.wait() => {
                warn!(worker_id = id, status = ?status.ok(), "worker process exited");
                pool.worker(id).mark_dead();
                pool.metrics.record_worker_restart(id);

                // Restart loop: back off, respawn, repeat until it sticks.
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(RESTART_BACKOFF) => {}
                        _ = shutdown.changed() => {
                            finish_watcher(&pool, id).await;
                            return;
                        }
                    }
                    match pool.respawn(id).await {
                        Ok(new_child) => {
                            child = new_child;
                            // Eligible again only now that the restart succeeded.
                            let _ = pool.ready_tx.try_send(id);
                            break;
                        }
                        Err(e) => {
                            error!(worker_id = id, error = %e, "failed to restart worker");
                        }
                    }
                }
            }
            _ = shutdown.changed() => {
                let _ = child.start_kill();
                let _ = child.wait().await;
                finish_watcher(&pool, id).await;
                return;
            }
        }
    }
}

async fn finish_watcher(pool: &Arc<WorkerPool>, id: usize) {
    let worker = pool.worker(id);
    worker.mark_dead();
    let _ = tokio::fs::remove_file(&worker.socket_path).await;
    pool.set_watched(id, false);
}

/// Periodic sweep restarting dead workers whose watcher is gone (for
/// example after a failed initial start).
async fn supervisor_loop(pool: Arc<WorkerPool>) {
    let mut shutdown = pool.shutdown_tx.subscribe();
    let mut interval = tokio::time::interval(SUPERVISOR_INTERVAL);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                for id in 0..pool.config.max_workers {
                    if !pool.worker(id).is_alive() && !pool.is_watched(id) {
                        warn!(worker_id = id, "worker is dead, restarting");
                        if let Err(e) = pool.start_worker(id).await {
                            warn!(worker_id = id, error = %e, "restart attempt failed");
                        }
                    }
                }
            }
            _ = shutdown.changed() => return,
        }
    }
}

async fn metrics_loop(pool: Arc<WorkerPool>) {
    let mut shutdown = pool.shutdown_tx.subscribe();
    let mut interval = tokio::time::interval(METRICS_INTERVAL);

    loop {
        tokio::select! {
            _ = interval.tick() => pool.sample_metrics(),
            _ = shutdown.changed() => return,
        }
    }
}

/// Forward a worker's stderr into tracing, tagged with its id.
async fn forward_worker_stderr(id: usize, stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        let lower = line.to_lowercase();
        if lower.contains("error") {
            warn!(worker_id = id, "{}", line);
        } else {
            debug!(worker_id = id, "{}", line);
        }
    }
}

#[cfg(test)]
#[path = "pool_tests.rs"]
mod tests;
