// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Translation engine tag.
//!
//! The engine is an opaque label as far as the pool is concerned: the
//! worker subprocess decides which backend it loads, and pool behavior is
//! identical across engines. The tag only feeds metric labels and logs.

use std::fmt;
use std::str::FromStr;

use isk_core::TranslateError;

/// The machine-translation backend a worker subprocess runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Engine {
    LibreTranslate,
    Argos,
}

impl Engine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::LibreTranslate => "libretranslate",
            Engine::Argos => "argos",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = TranslateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "libretranslate" => Ok(Engine::LibreTranslate),
            "argos" => Ok(Engine::Argos),
            other => Err(TranslateError::InvalidArgument(format!(
                "unknown engine type: {} (supported: libretranslate, argos)",
                other
            ))),
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
