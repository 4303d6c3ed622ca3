// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::protocol::{read_response, write_request};
use isk_core::{JobStatus, Primitive, TranslateRequest};
use isk_pool::{FakeTranslator, PoolConfig};
use isk_service::JobProcessor;
use std::collections::HashMap;

/// Context wired to a fake translator. The pool exists only so Status and
/// Metrics have something to report; its workers are unstartable stubs.
async fn test_ctx(fake: Arc<FakeTranslator>) -> (Arc<ListenCtx>, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let pool = isk_pool::WorkerPool::new(PoolConfig {
        max_workers: 1,
        worker_dir: dir.path().join("sockets"),
        command: dir.path().join("missing-interpreter").display().to_string(),
        script: dir.path().join("worker.py"),
        ..PoolConfig::default()
    })
    .await
    .unwrap();

    let translator: Arc<dyn isk_pool::Translator> = Arc::clone(&fake) as _;
    let processor = Arc::new(JobProcessor::new(translator.clone()));
    let registry = Arc::new(JobRegistry::new(Arc::clone(&processor)));
    let handler = Arc::new(TranslationHandler::new(
        translator,
        processor,
        Arc::clone(&registry),
    ));

    let ctx = Arc::new(ListenCtx {
        handler,
        registry,
        pool,
        engine: Engine::Argos,
        start_time: Instant::now(),
        shutdown: Arc::new(Notify::new()),
    });
    (ctx, dir)
}

fn title_request(id: &str) -> TranslateRequest {
    TranslateRequest {
        job_id: id.to_string(),
        primitive: Primitive::Title,
        source_language: "EN".to_string(),
        target_language: "fr-CA".to_string(),
        title: Some("Hello".to_string()),
        doc: None,
    }
}

#[tokio::test]
async fn ping_pong() {
    let (ctx, _dir) = test_ctx(Arc::new(FakeTranslator::new())).await;
    let response = handle_request(Request::Ping, &ctx).await;
    assert_eq!(response, Response::Pong);
    ctx.pool.shutdown().await;
}

#[tokio::test]
async fn status_reports_pool_and_jobs() {
    let (ctx, _dir) = test_ctx(Arc::new(FakeTranslator::new())).await;

    match handle_request(Request::Status, &ctx).await {
        Response::Status {
            engine,
            total_workers,
            active_workers,
            jobs,
            ..
        } => {
            assert_eq!(engine, "argos");
            assert_eq!(total_workers, 1);
            assert_eq!(active_workers, 0);
            assert_eq!(jobs, 0);
        }
        other => panic!("unexpected response: {:?}", other),
    }
    ctx.pool.shutdown().await;
}

#[tokio::test]
async fn translate_success_and_validation_error() {
    let fake = Arc::new(FakeTranslator::new());
    fake.enqueue(Ok("Bonjour".to_string()));
    let (ctx, _dir) = test_ctx(fake).await;

    match handle_request(
        Request::Translate {
            request: title_request("req-1"),
        },
        &ctx,
    )
    .await
    {
        Response::Translate { response } => {
            assert!(response.success);
            assert_eq!(response.translated_title.as_deref(), Some("Bonjour"));
        }
        other => panic!("unexpected response: {:?}", other),
    }

    // Empty correlation id is a typed validation failure.
    match handle_request(
        Request::Translate {
            request: TranslateRequest {
                job_id: String::new(),
                ..title_request("x")
            },
        },
        &ctx,
    )
    .await
    {
        Response::Error { message } => assert!(message.contains("invalid argument")),
        other => panic!("unexpected response: {:?}", other),
    }
    ctx.pool.shutdown().await;
}

#[tokio::test]
async fn submit_then_poll_job_status() {
    let (ctx, _dir) = test_ctx(Arc::new(FakeTranslator::new())).await;

    let job_id = match handle_request(
        Request::Submit {
            request: title_request("req-7"),
        },
        &ctx,
    )
    .await
    {
        Response::JobCreated { job_id } => job_id,
        other => panic!("unexpected response: {:?}", other),
    };

    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        match handle_request(
            Request::JobStatus {
                job_id: job_id.clone(),
            },
            &ctx,
        )
        .await
        {
            Response::Job { snapshot } => {
                if snapshot.status.is_terminal() {
                    assert_eq!(snapshot.status, JobStatus::Completed);
                    assert_eq!(snapshot.translated_title, "HELLO");
                    break;
                }
            }
            other => panic!("unexpected response: {:?}", other),
        }
        assert!(Instant::now() < deadline, "job never finished");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    ctx.pool.shutdown().await;
}

#[tokio::test]
async fn unknown_job_status_is_error() {
    let (ctx, _dir) = test_ctx(Arc::new(FakeTranslator::new())).await;

    match handle_request(
        Request::JobStatus {
            job_id: "missing".to_string(),
        },
        &ctx,
    )
    .await
    {
        Response::Error { message } => assert!(message.contains("job not found")),
        other => panic!("unexpected response: {:?}", other),
    }
    ctx.pool.shutdown().await;
}

#[tokio::test]
async fn metrics_exposes_pool_instruments() {
    let (ctx, _dir) = test_ctx(Arc::new(FakeTranslator::new())).await;

    // The pool's sampler refreshes gauges shortly after startup.
    let deadline = Instant::now() + Duration::from_secs(2);
    loop {
        match handle_request(Request::Metrics, &ctx).await {
            Response::Metrics { text } => {
                if text.contains("iskoces_worker_pool_total_workers") {
                    break;
                }
            }
            other => panic!("unexpected response: {:?}", other),
        }
        assert!(Instant::now() < deadline, "gauges never sampled");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    ctx.pool.shutdown().await;
}

#[tokio::test]
async fn shutdown_notifies() {
    let (ctx, _dir) = test_ctx(Arc::new(FakeTranslator::new())).await;

    let notified = ctx.shutdown.notified();
    tokio::pin!(notified);

    let response = handle_request(Request::Shutdown, &ctx).await;
    assert_eq!(response, Response::ShuttingDown);
    notified.await;
    ctx.pool.shutdown().await;
}

#[tokio::test]
async fn register_and_heartbeat() {
    let (ctx, _dir) = test_ctx(Arc::new(FakeTranslator::new())).await;

    let registration = match handle_request(
        Request::RegisterClient {
            client_name: "nanabush".to_string(),
            client_version: "1.0".to_string(),
            namespace: "default".to_string(),
            metadata: HashMap::new(),
        },
        &ctx,
    )
    .await
    {
        Response::Registered { registration } => registration,
        other => panic!("unexpected response: {:?}", other),
    };

    match handle_request(
        Request::Heartbeat {
            client_id: registration.client_id,
            client_name: "nanabush".to_string(),
        },
        &ctx,
    )
    .await
    {
        Response::Heartbeat { outcome } => {
            assert_eq!(outcome, isk_service::HeartbeatOutcome::Acknowledged)
        }
        other => panic!("unexpected response: {:?}", other),
    }
    ctx.pool.shutdown().await;
}

#[tokio::test]
async fn job_watch_streams_until_terminal() {
    let fake = Arc::new(FakeTranslator::new());
    fake.set_delay(Duration::from_millis(300));
    let (ctx, _dir) = test_ctx(fake).await;

    let job_id = match handle_request(
        Request::Submit {
            request: title_request("req-w"),
        },
        &ctx,
    )
    .await
    {
        Response::JobCreated { job_id } => job_id,
        other => panic!("unexpected response: {:?}", other),
    };

    // Drive a watch over a real socket pair.
    let (client, server) = tokio::net::UnixStream::pair().unwrap();
    let watch_ctx = Arc::clone(&ctx);
    let server_task = tokio::spawn(handle_connection(server, watch_ctx));

    let (mut read_half, mut write_half) = client.into_split();
    write_request(
        &mut write_half,
        &Request::JobWatch {
            job_id: job_id.clone(),
        },
        DEFAULT_TIMEOUT,
    )
    .await
    .unwrap();

    let mut frames = Vec::new();
    loop {
        let response =
            read_response(&mut read_half, Duration::from_secs(5)).await.unwrap();
        match response {
            Response::Job { snapshot } => {
                let terminal = snapshot.status.is_terminal();
                frames.push(snapshot);
                if terminal {
                    break;
                }
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    server_task.await.unwrap().unwrap();

    // Progress frames arrive in order and end terminal.
    assert!(frames.len() >= 2, "expected several frames, got {}", frames.len());
    assert_eq!(frames.last().unwrap().status, JobStatus::Completed);
    assert_eq!(frames.last().unwrap().progress_percent, 100);
    ctx.pool.shutdown().await;
}

#[tokio::test]
async fn job_watch_unknown_job_errors() {
    let (ctx, _dir) = test_ctx(Arc::new(FakeTranslator::new())).await;

    let (client, server) = tokio::net::UnixStream::pair().unwrap();
    let server_task = tokio::spawn(handle_connection(server, Arc::clone(&ctx)));

    let (mut read_half, mut write_half) = client.into_split();
    write_request(
        &mut write_half,
        &Request::JobWatch {
            job_id: "missing".to_string(),
        },
        DEFAULT_TIMEOUT,
    )
    .await
    .unwrap();

    match read_response(&mut read_half, Duration::from_secs(5)).await.unwrap() {
        Response::Error { message } => assert!(message.contains("job not found")),
        other => panic!("unexpected response: {:?}", other),
    }
    server_task.await.unwrap().unwrap();
    ctx.pool.shutdown().await;
}
