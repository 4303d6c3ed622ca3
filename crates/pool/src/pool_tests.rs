// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn default_config() {
    let config = PoolConfig::default();
    assert_eq!(config.max_workers, DEFAULT_MAX_WORKERS);
    assert_eq!(config.max_workers, 4);
    assert_eq!(config.worker_dir, PathBuf::from(DEFAULT_WORKER_DIR));
    assert_eq!(config.engine, Engine::Argos);
    assert_eq!(config.command, "python3");
}

#[tokio::test]
async fn pool_survives_unstartable_workers() {
    // A missing interpreter must not abort pool construction; the
    // supervisor keeps retrying dead workers.
    let dir = tempfile::tempdir().unwrap();
    let config = PoolConfig {
        engine: Engine::Argos,
        max_workers: 2,
        worker_dir: dir.path().to_path_buf(),
        command: dir.path().join("no-such-interpreter").display().to_string(),
        script: dir.path().join("worker.py"),
    };

    let pool = WorkerPool::new(config).await.unwrap();
    let stats = pool.stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.active, 0);
    assert_eq!(stats.busy, 0);

    pool.shutdown().await;
}

#[tokio::test]
async fn unwritable_worker_dir_is_fatal() {
    let config = PoolConfig {
        worker_dir: PathBuf::from("/proc/definitely/not/writable"),
        ..PoolConfig::default()
    };

    let err = WorkerPool::new(config).await.err().unwrap();
    assert!(err.to_string().contains("worker directory"));
}
