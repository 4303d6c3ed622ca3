// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translation job state machine.
//!
//! A job is created Queued, moves to Processing when the processor picks it
//! up, and ends Completed or Failed. Status only moves forward. The request
//! half of the job is immutable; everything the processor mutates lives
//! behind the per-job lock, so concurrent status readers (the watch
//! side-channel) never observe a half-written update.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::request::TranslateRequest;

/// Unique identifier for a translation job.
///
/// Minted by the registry; distinct from the caller-supplied correlation
/// id, which is echoed back in responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh random id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Status of a translation job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Completed and Failed are terminal; a terminal job never changes again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

/// The kind of translation requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    /// Translate a standalone title string.
    Title,
    /// Translate a full document (title + markdown body).
    Document,
}

/// A document to translate.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentContent {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub markdown: String,
}

/// Mutable half of a job, guarded by the per-job lock.
#[derive(Debug)]
struct JobState {
    status: JobStatus,
    started_at: Option<SystemTime>,
    completed_at: Option<SystemTime>,
    error: String,
    translated_title: String,
    translated_markdown: String,
    tokens_used: i64,
    inference_seconds: f64,
    progress_percent: u8,
    progress_message: String,
}

/// An asynchronous translation job.
#[derive(Debug)]
pub struct TranslationJob {
    pub id: JobId,
    /// Caller-supplied correlation id.
    pub request_id: String,
    pub primitive: Primitive,
    pub title: String,
    pub document: Option<DocumentContent>,
    pub source_lang: String,
    pub target_lang: String,
    pub created_at: SystemTime,
    state: Mutex<JobState>,
}

impl TranslationJob {
    /// Create a Queued job from a request.
    pub fn from_request(id: JobId, req: &TranslateRequest) -> Self {
        let (title, document) = match req.primitive {
            Primitive::Title => (req.title.clone().unwrap_or_default(), None),
            Primitive::Document => {
                let doc = req.doc.clone();
                let title = doc.as_ref().map(|d| d.title.clone()).unwrap_or_default();
                (title, doc)
            }
        };

        Self {
            id,
            request_id: req.job_id.clone(),
            primitive: req.primitive,
            title,
            document,
            source_lang: req.source_language.clone(),
            target_lang: req.target_language.clone(),
            created_at: SystemTime::now(),
            state: Mutex::new(JobState {
                status: JobStatus::Queued,
                started_at: None,
                completed_at: None,
                error: String::new(),
                translated_title: String::new(),
                translated_markdown: String::new(),
                tokens_used: 0,
                inference_seconds: 0.0,
                progress_percent: 0,
                progress_message: String::new(),
            }),
        }
    }

    pub fn status(&self) -> JobStatus {
        self.state.lock().status
    }

    pub fn is_terminal(&self) -> bool {
        self.status().is_terminal()
    }

    /// Move the job forward. Terminal states are sticky: updates after
    /// completion are dropped so status only ever advances.
    pub fn update_status(&self, status: JobStatus, message: &str) {
        let mut state = self.state.lock();
        if state.status.is_terminal() {
            return;
        }
        state.status = status;
        state.progress_message = message.to_string();
        match status {
            JobStatus::Processing => {
                if state.started_at.is_none() {
                    state.started_at = Some(SystemTime::now());
                }
            }
            JobStatus::Completed | JobStatus::Failed => {
                if state.completed_at.is_none() {
                    state.completed_at = Some(SystemTime::now());
                }
            }
            JobStatus::Queued => {}
        }
    }

    pub fn update_progress(&self, percent: u8, message: &str) {
        let mut state = self.state.lock();
        if state.status.is_terminal() {
            return;
        }
        state.progress_percent = percent;
        state.progress_message = message.to_string();
    }

    /// Fail the job. Sets the error, the terminal status and `completed_at`.
    pub fn set_error(&self, error: &str) {
        let mut state = self.state.lock();
        if state.status.is_terminal() {
            return;
        }
        state.error = error.to_string();
        state.status = JobStatus::Failed;
        state.completed_at = Some(SystemTime::now());
    }

    /// Complete the job with its result. Progress is forced to 100.
    pub fn set_result(&self, title: &str, markdown: &str, tokens: i64, inference_seconds: f64) {
        let mut state = self.state.lock();
        if state.status.is_terminal() {
            return;
        }
        state.translated_title = title.to_string();
        state.translated_markdown = markdown.to_string();
        state.tokens_used = tokens;
        state.inference_seconds = inference_seconds;
        state.status = JobStatus::Completed;
        state.completed_at = Some(SystemTime::now());
        state.progress_percent = 100;
        state.progress_message = "Translation completed".to_string();
    }

    /// Age since the job reached a terminal state, or None while running.
    pub fn terminal_age(&self, now: SystemTime) -> Option<Duration> {
        let state = self.state.lock();
        if !state.status.is_terminal() {
            return None;
        }
        let completed = state.completed_at?;
        now.duration_since(completed).ok()
    }

    /// Consistent point-in-time view of the job, for responses and the
    /// status side-channel.
    pub fn snapshot(&self) -> JobSnapshot {
        let state = self.state.lock();
        JobSnapshot {
            job_id: self.id.clone(),
            request_id: self.request_id.clone(),
            status: state.status,
            progress_percent: state.progress_percent,
            progress_message: state.progress_message.clone(),
            error: state.error.clone(),
            translated_title: state.translated_title.clone(),
            translated_markdown: state.translated_markdown.clone(),
            tokens_used: state.tokens_used,
            inference_seconds: state.inference_seconds,
            started_at_ms: state.started_at.map(epoch_ms),
            completed_at_ms: state.completed_at.map(epoch_ms),
        }
    }
}

/// Serializable point-in-time view of a job.
///
/// Streamed on the status side-channel: a transition from non-terminal to
/// terminal is the consumer's signal to stop streaming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub job_id: JobId,
    pub request_id: String,
    pub status: JobStatus,
    pub progress_percent: u8,
    pub progress_message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub error: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub translated_title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub translated_markdown: String,
    pub tokens_used: i64,
    pub inference_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
}

fn epoch_ms(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
