// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::{Duration, SystemTime};

fn title_request() -> TranslateRequest {
    TranslateRequest {
        job_id: "req-1".to_string(),
        primitive: Primitive::Title,
        source_language: "EN".to_string(),
        target_language: "fr-CA".to_string(),
        title: Some("Hello".to_string()),
        doc: None,
    }
}

fn doc_request() -> TranslateRequest {
    TranslateRequest {
        job_id: "req-2".to_string(),
        primitive: Primitive::Document,
        source_language: "en".to_string(),
        target_language: "de".to_string(),
        title: None,
        doc: Some(DocumentContent {
            title: "Doc title".to_string(),
            markdown: "Body text.".to_string(),
        }),
    }
}

#[test]
fn job_id_display_and_access() {
    let id = JobId::new("job-1");
    assert_eq!(id.to_string(), "job-1");
    assert_eq!(id.as_str(), "job-1");
    assert_eq!(id, JobId::new("job-1"));
    assert_ne!(id, JobId::new("job-2"));
}

#[test]
fn job_id_generate_is_unique() {
    assert_ne!(JobId::generate(), JobId::generate());
}

#[test]
fn job_id_serde() {
    let id = JobId::new("my-job");
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"my-job\"");

    let parsed: JobId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn new_job_is_queued() {
    let job = TranslationJob::from_request(JobId::new("j-1"), &title_request());

    assert_eq!(job.status(), JobStatus::Queued);
    assert!(!job.is_terminal());
    assert_eq!(job.request_id, "req-1");
    assert_eq!(job.title, "Hello");
    assert!(job.document.is_none());
}

#[test]
fn document_request_carries_doc_title() {
    let job = TranslationJob::from_request(JobId::new("j-2"), &doc_request());

    assert_eq!(job.title, "Doc title");
    assert_eq!(job.document.as_ref().unwrap().markdown, "Body text.");
}

#[test]
fn processing_records_started_at() {
    let job = TranslationJob::from_request(JobId::new("j-3"), &title_request());
    job.update_status(JobStatus::Processing, "Starting translation...");

    let snap = job.snapshot();
    assert_eq!(snap.status, JobStatus::Processing);
    assert_eq!(snap.progress_message, "Starting translation...");
    assert!(snap.started_at_ms.is_some());
    assert!(snap.completed_at_ms.is_none());
}

#[test]
fn set_result_completes_with_full_progress() {
    let job = TranslationJob::from_request(JobId::new("j-4"), &title_request());
    job.update_status(JobStatus::Processing, "working");
    job.update_progress(10, "Translating title...");
    job.set_result("Bonjour", "", 0, 1.5);

    let snap = job.snapshot();
    assert_eq!(snap.status, JobStatus::Completed);
    assert_eq!(snap.progress_percent, 100);
    assert_eq!(snap.translated_title, "Bonjour");
    assert_eq!(snap.tokens_used, 0);
    assert!((snap.inference_seconds - 1.5).abs() < f64::EPSILON);
    assert!(snap.completed_at_ms.is_some());
    assert!(job.is_terminal());
}

#[test]
fn set_error_fails_with_completed_at() {
    let job = TranslationJob::from_request(JobId::new("j-5"), &doc_request());
    job.update_status(JobStatus::Processing, "working");
    job.set_error("chunk 2 translation failed: worker closed connection");

    let snap = job.snapshot();
    assert_eq!(snap.status, JobStatus::Failed);
    assert!(snap.error.contains("chunk 2"));
    assert!(snap.completed_at_ms.is_some());
}

#[test]
fn terminal_status_is_sticky() {
    let job = TranslationJob::from_request(JobId::new("j-6"), &title_request());
    job.set_result("done", "", 0, 0.1);

    // Late updates from a racing task must not regress a terminal job.
    job.update_status(JobStatus::Processing, "late");
    job.update_progress(50, "late");
    job.set_error("late error");

    let snap = job.snapshot();
    assert_eq!(snap.status, JobStatus::Completed);
    assert_eq!(snap.progress_percent, 100);
    assert!(snap.error.is_empty());
}

#[test]
fn terminal_age_only_for_terminal_jobs() {
    let job = TranslationJob::from_request(JobId::new("j-7"), &title_request());
    let now = SystemTime::now();
    assert!(job.terminal_age(now).is_none());

    job.set_error("boom");
    let later = now + Duration::from_secs(120);
    let age = job.terminal_age(later).unwrap();
    assert!(age >= Duration::from_secs(119));
}

#[test]
fn status_display_and_terminal() {
    assert_eq!(JobStatus::Queued.to_string(), "queued");
    assert_eq!(JobStatus::Processing.to_string(), "processing");
    assert_eq!(JobStatus::Completed.to_string(), "completed");
    assert_eq!(JobStatus::Failed.to_string(), "failed");

    assert!(!JobStatus::Queued.is_terminal());
    assert!(!JobStatus::Processing.is_terminal());
    assert!(JobStatus::Completed.is_terminal());
    assert!(JobStatus::Failed.is_terminal());
}

#[test]
fn snapshot_serde_round_trip() {
    let job = TranslationJob::from_request(JobId::new("j-8"), &doc_request());
    job.set_result("Titel", "Körper.", 0, 2.0);

    let snap = job.snapshot();
    let json = serde_json::to_string(&snap).unwrap();
    let parsed: JobSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, snap);
    assert_eq!(parsed.status, JobStatus::Completed);
}

#[test]
fn status_serde_uses_snake_case() {
    assert_eq!(
        serde_json::to_string(&JobStatus::Processing).unwrap(),
        "\"processing\""
    );
    assert_eq!(
        serde_json::to_string(&Primitive::Title).unwrap(),
        "\"title\""
    );
    assert_eq!(
        serde_json::to_string(&Primitive::Document).unwrap(),
        "\"document\""
    );
}
