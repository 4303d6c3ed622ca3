// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document chunking for bounded translation requests.
//!
//! Large documents are split into byte-bounded chunks so each worker call
//! stays within a manageable size. The split descends three levels:
//! paragraphs (`"\n\n"`), then sentences (`.`/`!`/`?` followed by
//! whitespace) inside an oversized paragraph, then gives up and emits the
//! sentence whole. A chunk only exceeds the budget when it holds a single
//! indivisible sentence longer than the budget.
//!
//! Each chunk carries the separator that joined it to its successor
//! (trailing `"\n\n"` at a paragraph boundary, trailing `" "` at a sentence
//! boundary), so concatenating translated chunks with no extra glue
//! reproduces the document structure.

/// Split `text` into ordered chunks of at most `max_bytes` each.
///
/// Empty input yields no chunks. Input already within the budget is
/// returned as a single chunk.
pub fn split_chunks(text: &str, max_bytes: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    if text.len() <= max_bytes {
        return vec![text.to_string()];
    }

    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();

    for para in text.split("\n\n") {
        if para.len() > max_bytes {
            // Paragraph alone blows the budget: close the running chunk at
            // the paragraph boundary, then pack its sentences.
            flush(&mut chunks, &mut current, "\n\n");
            for sentence in split_sentences(para) {
                let sep = usize::from(!current.is_empty());
                if !current.is_empty() && current.len() + sep + sentence.len() + 2 > max_bytes {
                    flush(&mut chunks, &mut current, " ");
                }
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(&sentence);
            }
        } else {
            let sep = if current.is_empty() { 0 } else { 2 };
            if !current.is_empty() && current.len() + sep + para.len() + 2 > max_bytes {
                flush(&mut chunks, &mut current, "\n\n");
            }
            if !current.is_empty() {
                current.push_str("\n\n");
            }
            current.push_str(para);
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Close the running chunk, carrying the separator that joined it to
/// whatever comes next.
fn flush(chunks: &mut Vec<String>, current: &mut String, sep: &str) {
    if !current.is_empty() {
        current.push_str(sep);
        chunks.push(std::mem::take(current));
    }
}

/// Split a paragraph at sentence boundaries: a terminator (`.`, `!`, `?`)
/// followed by a space, tab or newline. Sentences are trimmed. Text with no
/// terminator comes back as one sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut iter = text.chars().peekable();

    while let Some(c) = iter.next() {
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            if let Some(&next) = iter.peek() {
                if matches!(next, ' ' | '\t' | '\n') {
                    let trimmed = current.trim();
                    if !trimmed.is_empty() {
                        sentences.push(trimmed.to_string());
                    }
                    current.clear();
                }
            }
        }
    }

    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    sentences
}

#[cfg(test)]
#[path = "chunk_tests.rs"]
mod tests;
