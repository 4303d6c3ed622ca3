// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translation request/response contract.
//!
//! These DTOs are what the RPC layer hands to the handler and what it gets
//! back. The `job_id` field is the caller's correlation id and is echoed in
//! every response, success or failure.

use serde::{Deserialize, Serialize};

use crate::job::{DocumentContent, Primitive};

/// An incoming translation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateRequest {
    /// Caller-supplied correlation id. Required.
    pub job_id: String,
    pub primitive: Primitive,
    /// Source language, external form ("EN", "fr-CA"). Required.
    pub source_language: String,
    /// Target language, external form. Required.
    pub target_language: String,
    /// Title payload for [`Primitive::Title`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Document payload for [`Primitive::Document`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<DocumentContent>,
}

/// Outcome of a synchronous translation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslateResponse {
    /// Echo of the request correlation id.
    pub job_id: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_markdown: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub completed_at_ms: u64,
    /// Always zero for this backend class.
    pub tokens_used: i64,
    pub inference_seconds: f64,
}
