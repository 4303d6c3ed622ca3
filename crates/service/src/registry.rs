// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory job registry.
//!
//! The map is guarded by one lock; each job guards its own fields. No lock
//! is ever held across a call into the pool — the processor runs on its
//! own task with nothing but the job Arc.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use isk_core::{JobId, TranslateRequest, TranslationJob};
use parking_lot::RwLock;
use tracing::info;

use crate::processor::JobProcessor;

/// Registry of in-flight and recently finished translation jobs.
pub struct JobRegistry {
    jobs: RwLock<HashMap<JobId, Arc<TranslationJob>>>,
    processor: Arc<JobProcessor>,
}

impl JobRegistry {
    pub fn new(processor: Arc<JobProcessor>) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            processor,
        }
    }

    /// Create a job for the request and hand it to the processor on a
    /// background task. Returns the fresh job id immediately.
    pub fn create(&self, req: &TranslateRequest) -> JobId {
        let id = JobId::generate();
        let job = Arc::new(TranslationJob::from_request(id.clone(), req));

        self.jobs.write().insert(id.clone(), Arc::clone(&job));

        info!(
            job_id = %id,
            request_id = %req.job_id,
            primitive = ?req.primitive,
            "created translation job"
        );

        let processor = Arc::clone(&self.processor);
        tokio::spawn(async move {
            processor.process(job).await;
        });

        id
    }

    pub fn get(&self, id: &JobId) -> Option<Arc<TranslationJob>> {
        self.jobs.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    /// Delete terminal jobs older than `max_age`. Returns how many were
    /// removed. Running jobs are never touched.
    pub fn gc(&self, max_age: Duration) -> usize {
        let now = SystemTime::now();
        let mut jobs = self.jobs.write();
        let before = jobs.len();
        jobs.retain(|_, job| match job.terminal_age(now) {
            Some(age) => age < max_age,
            None => true,
        });
        let removed = before - jobs.len();

        if removed > 0 {
            info!(removed, remaining = jobs.len(), "cleaned up old translation jobs");
        }
        removed
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
