// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request handling: validation, dispatch, error mapping.
//!
//! The handler is what the RPC adapters call. Validation failures surface
//! as typed invalid-argument errors before any job exists; translator-level
//! failures on the synchronous path are folded into a failure response with
//! the caller's correlation id, never an error.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use isk_core::{
    JobId, JobSnapshot, JobStatus, Primitive, TranslateError, TranslateRequest, TranslateResponse,
    TranslationJob,
};
use isk_pool::Translator;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clients::{ClientRegistry, HeartbeatOutcome, Registration};
use crate::processor::JobProcessor;
use crate::registry::JobRegistry;

/// Pre-flight readiness check result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TitleCheck {
    pub ready: bool,
    pub message: String,
    pub estimated_seconds: u32,
}

/// The translation request surface.
pub struct TranslationHandler {
    translator: Arc<dyn Translator>,
    processor: Arc<JobProcessor>,
    registry: Arc<JobRegistry>,
    clients: ClientRegistry,
}

impl TranslationHandler {
    pub fn new(
        translator: Arc<dyn Translator>,
        processor: Arc<JobProcessor>,
        registry: Arc<JobRegistry>,
    ) -> Self {
        Self {
            translator,
            processor,
            registry,
            clients: ClientRegistry::new(),
        }
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    /// Synchronous translation: run the processor to completion and answer
    /// from the finished job. Never errors for translator failures — those
    /// become a failure response carrying the correlation id.
    pub async fn translate(
        &self,
        req: TranslateRequest,
    ) -> Result<TranslateResponse, TranslateError> {
        validate(&req)?;

        info!(
            request_id = %req.job_id,
            primitive = ?req.primitive,
            source_lang = %req.source_language,
            target_lang = %req.target_language,
            "translate request received"
        );

        let job = Arc::new(TranslationJob::from_request(JobId::generate(), &req));
        self.processor.process(Arc::clone(&job)).await;

        Ok(response_from(&job.snapshot()))
    }

    /// Job-queued translation: returns the fresh job id immediately while
    /// the processor runs in the background.
    pub fn submit(&self, req: TranslateRequest) -> Result<JobId, TranslateError> {
        validate(&req)?;
        Ok(self.registry.create(&req))
    }

    pub fn job_status(&self, id: &JobId) -> Option<JobSnapshot> {
        self.registry.get(id).map(|job| job.snapshot())
    }

    /// Lightweight pre-flight: is the backend ready for this title?
    pub async fn check_title(
        &self,
        title: &str,
        source_language: &str,
        language_tag: &str,
    ) -> Result<TitleCheck, TranslateError> {
        if title.is_empty() {
            return Err(TranslateError::InvalidArgument("title is required".to_string()));
        }
        if language_tag.is_empty() {
            return Err(TranslateError::InvalidArgument(
                "language_tag is required".to_string(),
            ));
        }
        if source_language.is_empty() {
            return Err(TranslateError::InvalidArgument(
                "source_language is required".to_string(),
            ));
        }

        if let Err(e) = self.translator.check_health().await {
            warn!(error = %e, "translator health check failed");
            return Ok(TitleCheck {
                ready: false,
                message: format!("Translator not ready: {}", e),
                estimated_seconds: 0,
            });
        }

        Ok(TitleCheck {
            ready: true,
            message: "Ready to handle translation request".to_string(),
            estimated_seconds: estimate_seconds(title.len()),
        })
    }

    pub async fn check_health(&self) -> Result<(), TranslateError> {
        self.translator.check_health().await
    }

    /// The streaming primitive has no real contract yet; reject it at the
    /// boundary rather than echo placeholders.
    pub fn translate_stream(&self) -> Result<(), TranslateError> {
        Err(TranslateError::InvalidArgument(
            "streaming translation is not supported".to_string(),
        ))
    }

    pub fn register_client(
        &self,
        client_name: &str,
        client_version: &str,
        namespace: &str,
        metadata: HashMap<String, String>,
    ) -> Result<Registration, TranslateError> {
        if client_name.is_empty() {
            return Err(TranslateError::InvalidArgument(
                "client_name is required".to_string(),
            ));
        }
        Ok(self
            .clients
            .register(client_name, client_version, namespace, metadata))
    }

    pub fn heartbeat(
        &self,
        client_id: &str,
        client_name: &str,
    ) -> Result<HeartbeatOutcome, TranslateError> {
        if client_id.is_empty() {
            return Err(TranslateError::InvalidArgument(
                "client_id is required".to_string(),
            ));
        }
        if client_name.is_empty() {
            return Err(TranslateError::InvalidArgument(
                "client_name is required".to_string(),
            ));
        }
        Ok(self.clients.heartbeat(client_id, client_name))
    }
}

/// Require the correlation id and both languages; payload checks happen in
/// the processor where they fail the job instead.
fn validate(req: &TranslateRequest) -> Result<(), TranslateError> {
    if req.job_id.is_empty() {
        return Err(TranslateError::InvalidArgument("job_id is required".to_string()));
    }
    if req.source_language.is_empty() {
        return Err(TranslateError::InvalidArgument(
            "source_language is required".to_string(),
        ));
    }
    if req.target_language.is_empty() {
        return Err(TranslateError::InvalidArgument(
            "target_language is required".to_string(),
        ));
    }
    if req.primitive == Primitive::Title && req.title.as_deref().unwrap_or("").is_empty() {
        return Err(TranslateError::InvalidArgument(
            "title is required for title translation".to_string(),
        ));
    }
    Ok(())
}

fn response_from(snapshot: &JobSnapshot) -> TranslateResponse {
    let completed_at_ms = snapshot.completed_at_ms.unwrap_or_else(now_ms);
    if snapshot.status == JobStatus::Completed {
        TranslateResponse {
            job_id: snapshot.request_id.clone(),
            success: true,
            translated_title: non_empty(&snapshot.translated_title),
            translated_markdown: non_empty(&snapshot.translated_markdown),
            error_message: None,
            completed_at_ms,
            tokens_used: snapshot.tokens_used,
            inference_seconds: snapshot.inference_seconds,
        }
    } else {
        TranslateResponse {
            job_id: snapshot.request_id.clone(),
            success: false,
            translated_title: None,
            translated_markdown: None,
            error_message: Some(format!("Translation failed: {}", snapshot.error)),
            completed_at_ms,
            tokens_used: 0,
            inference_seconds: 0.0,
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Simple length heuristic, clamped to a sane range. Lightweight MT is
/// fast; this only feeds client-side progress hints.
fn estimate_seconds(title_len: usize) -> u32 {
    ((2 + title_len / 20) as u32).clamp(2, 30)
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
