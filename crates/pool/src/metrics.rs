// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prometheus instruments for the worker pool.
//!
//! Every instrument carries the engine label; per-worker instruments add
//! the worker id, and request instruments add the outcome. Pool gauges and
//! the per-worker uptime/memory gauges are refreshed by the 5-second
//! sampler; everything else is observed synchronously at the call site.

use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use prometheus::{
    histogram_opts, opts, Encoder, GaugeVec, HistogramVec, IntCounterVec, IntGaugeVec, Registry,
    TextEncoder,
};

/// Collects and updates metrics for one worker pool.
pub struct MetricsCollector {
    engine: String,
    registry: Registry,

    pool_total_workers: IntGaugeVec,
    pool_active_workers: IntGaugeVec,
    pool_busy_workers: IntGaugeVec,
    pool_idle_workers: IntGaugeVec,
    queue_length: IntGaugeVec,

    requests_total: IntCounterVec,
    request_duration: HistogramVec,
    request_size: HistogramVec,
    response_size: HistogramVec,

    worker_starts: IntCounterVec,
    worker_restarts: IntCounterVec,
    worker_uptime: GaugeVec,
    worker_memory: IntGaugeVec,

    queue_wait: HistogramVec,

    socket_connections: IntCounterVec,
    socket_connection_duration: HistogramVec,

    // Serializes the periodic sampler against itself; instrument updates
    // are otherwise lock-free.
    sampler: Mutex<()>,
}

impl MetricsCollector {
    pub fn new(engine: &str) -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let pool_total_workers = IntGaugeVec::new(
            opts!(
                "iskoces_worker_pool_total_workers",
                "Total number of workers (active + idle) in the pool"
            ),
            &["engine"],
        )?;
        let pool_active_workers = IntGaugeVec::new(
            opts!(
                "iskoces_worker_pool_active_workers",
                "Number of workers with a live subprocess"
            ),
            &["engine"],
        )?;
        let pool_busy_workers = IntGaugeVec::new(
            opts!(
                "iskoces_worker_pool_busy_workers",
                "Number of workers currently processing requests"
            ),
            &["engine"],
        )?;
        let pool_idle_workers = IntGaugeVec::new(
            opts!(
                "iskoces_worker_pool_idle_workers",
                "Number of idle workers available for requests"
            ),
            &["engine"],
        )?;
        let queue_length = IntGaugeVec::new(
            opts!(
                "iskoces_worker_queue_length",
                "Number of ready tokens waiting in the worker channel"
            ),
            &["engine"],
        )?;

        let requests_total = IntCounterVec::new(
            opts!(
                "iskoces_translation_requests_total",
                "Total number of translation requests"
            ),
            &["engine", "status"],
        )?;
        let request_duration = HistogramVec::new(
            histogram_opts!(
                "iskoces_translation_request_duration_seconds",
                "Duration of translation requests in seconds",
                vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]
            ),
            &["engine", "status"],
        )?;
        let request_size = HistogramVec::new(
            histogram_opts!(
                "iskoces_translation_request_size_bytes",
                "Size of translation request text in bytes",
                vec![100.0, 500.0, 1000.0, 5000.0, 10000.0, 50000.0, 100000.0, 500000.0]
            ),
            &["engine"],
        )?;
        let response_size = HistogramVec::new(
            histogram_opts!(
                "iskoces_translation_response_size_bytes",
                "Size of translation response text in bytes",
                vec![100.0, 500.0, 1000.0, 5000.0, 10000.0, 50000.0, 100000.0, 500000.0]
            ),
            &["engine"],
        )?;

        let worker_starts = IntCounterVec::new(
            opts!(
                "iskoces_worker_starts_total",
                "Total number of worker process starts"
            ),
            &["engine", "worker_id"],
        )?;
        let worker_restarts = IntCounterVec::new(
            opts!(
                "iskoces_worker_restarts_total",
                "Total number of worker process restarts"
            ),
            &["engine", "worker_id"],
        )?;
        let worker_uptime = GaugeVec::new(
            opts!(
                "iskoces_worker_uptime_seconds",
                "Uptime of each worker in seconds"
            ),
            &["engine", "worker_id"],
        )?;
        let worker_memory = IntGaugeVec::new(
            opts!(
                "iskoces_worker_memory_usage_bytes",
                "Memory usage of worker processes in bytes"
            ),
            &["engine", "worker_id"],
        )?;

        let queue_wait = HistogramVec::new(
            histogram_opts!(
                "iskoces_worker_queue_wait_seconds",
                "Time spent waiting for an available worker",
                vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0]
            ),
            &["engine"],
        )?;

        let socket_connections = IntCounterVec::new(
            opts!(
                "iskoces_socket_connections_total",
                "Total number of Unix socket connections to workers"
            ),
            &["engine", "worker_id", "status"],
        )?;
        let socket_connection_duration = HistogramVec::new(
            histogram_opts!(
                "iskoces_socket_connection_duration_seconds",
                "Duration of socket connection opens in seconds",
                vec![0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]
            ),
            &["engine", "worker_id"],
        )?;

        registry.register(Box::new(pool_total_workers.clone()))?;
        registry.register(Box::new(pool_active_workers.clone()))?;
        registry.register(Box::new(pool_busy_workers.clone()))?;
        registry.register(Box::new(pool_idle_workers.clone()))?;
        registry.register(Box::new(queue_length.clone()))?;
        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(request_size.clone()))?;
        registry.register(Box::new(response_size.clone()))?;
        registry.register(Box::new(worker_starts.clone()))?;
        registry.register(Box::new(worker_restarts.clone()))?;
        registry.register(Box::new(worker_uptime.clone()))?;
        registry.register(Box::new(worker_memory.clone()))?;
        registry.register(Box::new(queue_wait.clone()))?;
        registry.register(Box::new(socket_connections.clone()))?;
        registry.register(Box::new(socket_connection_duration.clone()))?;

        Ok(Self {
            engine: engine.to_string(),
            registry,
            pool_total_workers,
            pool_active_workers,
            pool_busy_workers,
            pool_idle_workers,
            queue_length,
            requests_total,
            request_duration,
            request_size,
            response_size,
            worker_starts,
            worker_restarts,
            worker_uptime,
            worker_memory,
            queue_wait,
            socket_connections,
            socket_connection_duration,
            sampler: Mutex::new(()),
        })
    }

    /// Guard held by the periodic sampler for the duration of one pass.
    pub fn sampler_guard(&self) -> MutexGuard<'_, ()> {
        self.sampler.lock()
    }

    pub fn set_pool_gauges(
        &self,
        total: usize,
        active: usize,
        busy: usize,
        idle: usize,
        queue_len: usize,
    ) {
        let e = self.engine.as_str();
        self.pool_total_workers
            .with_label_values(&[e])
            .set(total as i64);
        self.pool_active_workers
            .with_label_values(&[e])
            .set(active as i64);
        self.pool_busy_workers
            .with_label_values(&[e])
            .set(busy as i64);
        self.pool_idle_workers
            .with_label_values(&[e])
            .set(idle as i64);
        self.queue_length
            .with_label_values(&[e])
            .set(queue_len as i64);
    }

    pub fn record_request(
        &self,
        duration: Duration,
        success: bool,
        request_bytes: usize,
        response_bytes: usize,
    ) {
        let e = self.engine.as_str();
        let status = outcome(success);
        self.requests_total.with_label_values(&[e, status]).inc();
        self.request_duration
            .with_label_values(&[e, status])
            .observe(duration.as_secs_f64());
        self.request_size
            .with_label_values(&[e])
            .observe(request_bytes as f64);
        self.response_size
            .with_label_values(&[e])
            .observe(response_bytes as f64);
    }

    pub fn record_worker_start(&self, worker_id: usize) {
        self.worker_starts
            .with_label_values(&[self.engine.as_str(), &worker_id.to_string()])
            .inc();
    }

    pub fn record_worker_restart(&self, worker_id: usize) {
        self.worker_restarts
            .with_label_values(&[self.engine.as_str(), &worker_id.to_string()])
            .inc();
    }

    pub fn record_queue_wait(&self, wait: Duration) {
        self.queue_wait
            .with_label_values(&[self.engine.as_str()])
            .observe(wait.as_secs_f64());
    }

    pub fn record_socket_connection(&self, worker_id: usize, duration: Duration, success: bool) {
        let e = self.engine.as_str();
        let id = worker_id.to_string();
        self.socket_connections
            .with_label_values(&[e, &id, outcome(success)])
            .inc();
        self.socket_connection_duration
            .with_label_values(&[e, &id])
            .observe(duration.as_secs_f64());
    }

    pub fn set_worker_uptime(&self, worker_id: usize, uptime: Duration) {
        self.worker_uptime
            .with_label_values(&[self.engine.as_str(), &worker_id.to_string()])
            .set(uptime.as_secs_f64());
    }

    pub fn set_worker_memory(&self, worker_id: usize, bytes: u64) {
        self.worker_memory
            .with_label_values(&[self.engine.as_str(), &worker_id.to_string()])
            .set(bytes as i64);
    }

    /// Current value accessors, used by status reporting and tests.
    pub fn worker_starts_total(&self, worker_id: usize) -> u64 {
        self.worker_starts
            .with_label_values(&[self.engine.as_str(), &worker_id.to_string()])
            .get()
    }

    pub fn worker_restarts_total(&self, worker_id: usize) -> u64 {
        self.worker_restarts
            .with_label_values(&[self.engine.as_str(), &worker_id.to_string()])
            .get()
    }

    pub fn requests_total(&self, success: bool) -> u64 {
        self.requests_total
            .with_label_values(&[self.engine.as_str(), outcome(success)])
            .get()
    }

    pub fn queue_wait_count(&self) -> u64 {
        self.queue_wait
            .with_label_values(&[self.engine.as_str()])
            .get_sample_count()
    }

    pub fn queue_wait_sum(&self) -> f64 {
        self.queue_wait
            .with_label_values(&[self.engine.as_str()])
            .get_sample_sum()
    }

    /// Render all instruments in the Prometheus text exposition format.
    pub fn export(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            tracing::warn!(error = %e, "failed to encode metrics");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}

fn outcome(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "error"
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
