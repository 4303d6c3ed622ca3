// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Asynchronous job execution.
//!
//! `process` is total with respect to the job: whatever happens — worker
//! errors, a lost subprocess, the overall deadline — the job ends either
//! Completed with its result set or Failed with an error message.

use std::sync::Arc;
use std::time::{Duration, Instant};

use isk_core::{
    split_chunks, to_backend_code, JobStatus, Primitive, TranslateError, TranslationJob,
};
use isk_pool::Translator;
use tracing::{error, info};

/// Default maximum chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 10 * 1024;

/// Overall deadline for one job, enforced independently of any caller.
const JOB_DEADLINE: Duration = Duration::from_secs(10 * 60);

/// Drives translation jobs through the translator backend.
pub struct JobProcessor {
    translator: Arc<dyn Translator>,
    chunk_size: usize,
}

impl JobProcessor {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self::with_chunk_size(translator, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(translator: Arc<dyn Translator>, chunk_size: usize) -> Self {
        Self {
            translator,
            chunk_size,
        }
    }

    /// Run a job to completion. Chunks within one job are translated
    /// strictly in order; output assembly and progress both depend on it.
    pub async fn process(&self, job: Arc<TranslationJob>) {
        let start = Instant::now();

        info!(
            job_id = %job.id,
            request_id = %job.request_id,
            primitive = ?job.primitive,
            "starting translation job"
        );

        job.update_status(JobStatus::Processing, "Starting translation...");

        let outcome = tokio::time::timeout(JOB_DEADLINE, self.run(&job)).await;
        match outcome {
            Ok(Ok((title, markdown))) => {
                let inference_seconds = start.elapsed().as_secs_f64();
                job.set_result(&title, &markdown, 0, inference_seconds);
                info!(
                    job_id = %job.id,
                    request_id = %job.request_id,
                    inference_seconds,
                    "translation job completed"
                );
            }
            Ok(Err(e)) => {
                error!(job_id = %job.id, error = %e, "translation job failed");
                job.set_error(&e.to_string());
            }
            Err(_) => {
                let e = TranslateError::Cancelled(format!(
                    "job deadline exceeded after {}s",
                    JOB_DEADLINE.as_secs()
                ));
                error!(job_id = %job.id, error = %e, "translation job failed");
                job.set_error(&e.to_string());
            }
        }
    }

    async fn run(&self, job: &TranslationJob) -> Result<(String, String), TranslateError> {
        let source = to_backend_code(&job.source_lang);
        let target = to_backend_code(&job.target_lang);

        match job.primitive {
            Primitive::Title => {
                job.update_progress(10, "Translating title...");
                let title = self
                    .translator
                    .translate(&job.title, &source, &target)
                    .await
                    .map_err(|e| prefixed("title translation failed", e))?;
                Ok((title, String::new()))
            }
            Primitive::Document => {
                let doc = job.document.as_ref().ok_or_else(|| {
                    TranslateError::InvalidArgument(
                        "document is required for document translation".to_string(),
                    )
                })?;

                let mut title = String::new();
                if !doc.title.is_empty() {
                    job.update_progress(5, "Translating title...");
                    title = self
                        .translator
                        .translate(&doc.title, &source, &target)
                        .await
                        .map_err(|e| prefixed("title translation failed", e))?;
                }

                let mut markdown = String::new();
                if !doc.markdown.is_empty() {
                    job.update_progress(10, "Translating content...");
                    if doc.markdown.len() > self.chunk_size {
                        markdown = self
                            .translate_chunked(job, &doc.markdown, &source, &target)
                            .await?;
                    } else {
                        markdown = self
                            .translator
                            .translate(&doc.markdown, &source, &target)
                            .await
                            .map_err(|e| prefixed("markdown translation failed", e))?;
                    }
                }

                Ok((title, markdown))
            }
        }
    }

    /// Translate a large document chunk by chunk, advancing progress
    /// linearly through the 10–90% band.
    async fn translate_chunked(
        &self,
        job: &TranslationJob,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, TranslateError> {
        let chunks = split_chunks(text, self.chunk_size);
        let total = chunks.len();

        info!(
            job_id = %job.id,
            text_len = text.len(),
            chunk_size = self.chunk_size,
            total_chunks = total,
            "translating document in chunks"
        );

        let mut translated = String::with_capacity(text.len());
        for (i, chunk) in chunks.iter().enumerate() {
            job.update_progress(
                chunk_progress(i + 1, total),
                &format!("Translating chunk {}/{}...", i + 1, total),
            );

            let out = self
                .translator
                .translate(chunk, source, target)
                .await
                .map_err(|e| TranslateError::chunk(i + 1, e))?;
            // Chunk boundaries already carry their separators; assembly is
            // plain concatenation.
            translated.push_str(&out);
        }

        Ok(translated)
    }
}

/// Percentage after finishing chunk `done` of `total`, inside the 10–90 band.
fn chunk_progress(done: usize, total: usize) -> u8 {
    10 + ((done as f64 / total as f64) * 80.0) as u8
}

fn prefixed(context: &str, e: TranslateError) -> TranslateError {
    match e {
        TranslateError::InvalidArgument(m) => {
            TranslateError::InvalidArgument(format!("{}: {}", context, m))
        }
        TranslateError::Worker(m) => TranslateError::Worker(format!("{}: {}", context, m)),
        TranslateError::Transport(m) => TranslateError::Transport(format!("{}: {}", context, m)),
        other => other,
    }
}

#[cfg(test)]
#[path = "processor_tests.rs"]
mod tests;
