// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake translator for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use isk_core::TranslateError;
use parking_lot::Mutex;

use crate::translator::Translator;

/// One recorded call to the fake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeCall {
    pub text: String,
    pub source: String,
    pub target: String,
}

/// Scripted [`Translator`] that records every call.
///
/// With nothing scripted it echoes the input uppercased, which keeps
/// separators intact so chunk-assembly assertions stay exact. Scripted
/// results are consumed in FIFO order before falling back to the echo.
#[derive(Default)]
pub struct FakeTranslator {
    calls: Mutex<Vec<FakeCall>>,
    scripted: Mutex<VecDeque<Result<String, TranslateError>>>,
    delay: Mutex<Option<std::time::Duration>>,
    unhealthy: AtomicBool,
}

impl FakeTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a result for an upcoming call.
    pub fn enqueue(&self, result: Result<String, TranslateError>) {
        self.scripted.lock().push_back(result);
    }

    /// Make `check_health` fail.
    pub fn set_unhealthy(&self) {
        self.unhealthy.store(true, Ordering::SeqCst);
    }

    /// Delay every call, to keep jobs observably in flight.
    pub fn set_delay(&self, delay: std::time::Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl Translator for FakeTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, TranslateError> {
        self.calls.lock().push(FakeCall {
            text: text.to_string(),
            source: source_lang.to_string(),
            target: target_lang.to_string(),
        });
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(result) = self.scripted.lock().pop_front() {
            return result;
        }
        Ok(text.to_uppercase())
    }

    async fn check_health(&self) -> Result<(), TranslateError> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(TranslateError::Worker("translator unhealthy".to_string()));
        }
        Ok(())
    }
}
