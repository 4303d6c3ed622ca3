// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Language code normalization.
//!
//! Callers hand us codes in whatever form their client emits — uppercase
//! ISO 639-1 ("EN") or BCP 47 tags with a region ("fr-CA", "pt_BR"). The
//! translation backends want the lowercase base code. Unknown codes are
//! forwarded as-is; the worker is authoritative about what it supports.

/// Convert an external language code to the backend form.
///
/// Lowercases and keeps only the prefix before the first `-` or `_`:
/// `"EN"` → `"en"`, `"fr-CA"` → `"fr"`, `"pt_BR"` → `"pt"`.
pub fn to_backend_code(code: &str) -> String {
    let lang = code.to_lowercase();
    match lang.find(['-', '_']) {
        Some(idx) => lang[..idx].to_string(),
        None => lang,
    }
}

#[cfg(test)]
#[path = "language_tests.rs"]
mod tests;
