// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn request_outcomes_are_counted_separately() {
    let metrics = MetricsCollector::new("argos").unwrap();

    metrics.record_request(Duration::from_millis(120), true, 100, 120);
    metrics.record_request(Duration::from_millis(80), true, 50, 60);
    metrics.record_request(Duration::from_secs(10), false, 500, 0);

    assert_eq!(metrics.requests_total(true), 2);
    assert_eq!(metrics.requests_total(false), 1);
}

#[test]
fn worker_lifecycle_counters_are_per_worker() {
    let metrics = MetricsCollector::new("argos").unwrap();

    metrics.record_worker_start(0);
    metrics.record_worker_start(1);
    metrics.record_worker_restart(1);

    assert_eq!(metrics.worker_starts_total(0), 1);
    assert_eq!(metrics.worker_starts_total(1), 1);
    assert_eq!(metrics.worker_restarts_total(0), 0);
    assert_eq!(metrics.worker_restarts_total(1), 1);
}

#[test]
fn queue_wait_observations_accumulate() {
    let metrics = MetricsCollector::new("libretranslate").unwrap();

    metrics.record_queue_wait(Duration::from_millis(5));
    metrics.record_queue_wait(Duration::from_secs(10));

    assert_eq!(metrics.queue_wait_count(), 2);
    assert!(metrics.queue_wait_sum() >= 10.0);
}

#[test]
fn export_renders_text_format() {
    let metrics = MetricsCollector::new("argos").unwrap();
    metrics.set_pool_gauges(4, 4, 1, 3, 3);
    metrics.record_request(Duration::from_millis(10), true, 10, 12);

    let text = metrics.export();
    assert!(text.contains("iskoces_worker_pool_total_workers{engine=\"argos\"} 4"));
    assert!(text.contains("iskoces_worker_pool_busy_workers{engine=\"argos\"} 1"));
    assert!(text.contains("iskoces_translation_requests_total"));
}

#[test]
fn separate_collectors_do_not_share_state() {
    // Instance registries: two pools (or two tests) never collide.
    let a = MetricsCollector::new("argos").unwrap();
    let b = MetricsCollector::new("argos").unwrap();

    a.record_worker_start(0);
    assert_eq!(a.worker_starts_total(0), 1);
    assert_eq!(b.worker_starts_total(0), 0);
}

#[test]
fn socket_connection_outcomes() {
    let metrics = MetricsCollector::new("argos").unwrap();
    metrics.record_socket_connection(2, Duration::from_millis(1), true);
    metrics.record_socket_connection(2, Duration::from_millis(1), false);

    let text = metrics.export();
    assert!(text.contains(
        "iskoces_socket_connections_total{engine=\"argos\",status=\"error\",worker_id=\"2\"} 1"
    ));
    assert!(text.contains(
        "iskoces_socket_connections_total{engine=\"argos\",status=\"success\",worker_id=\"2\"} 1"
    ));
}
