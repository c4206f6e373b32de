//! Paragraph-boundary text chunker.
//!
//! Splits page texts into [`Chunk`]s that respect a configurable
//! `max_tokens` limit. Splitting occurs on paragraph boundaries (`\n\n`)
//! to preserve semantic coherence within each chunk.
//!
//! Chunk boundaries are a pure function of the input text and the limit:
//! re-running ingestion over the same document yields the same chunks in
//! the same order. Each chunk carries a SHA-256 hash of its text.
//!
//! # Algorithm
//!
//! 1. Convert `max_tokens` to `max_chars` using a 4 chars/token ratio.
//! 2. Split each page on `\n\n` paragraph boundaries.
//! 3. Accumulate paragraphs into a buffer until adding the next paragraph
//!    would exceed `max_chars`, then flush the buffer as a chunk.
//! 4. If a single paragraph exceeds `max_chars`, hard-split it at the
//!    nearest newline or space boundary (UTF-8 safe).
//! 5. Whitespace-only pages produce no chunks; chunk indices stay
//!    contiguous across the whole document.

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::models::{Chunk, Page};

/// Approximate characters-per-token ratio (4 chars ≈ 1 token).
const CHARS_PER_TOKEN: usize = 4;

/// Split all pages into a flat, document-ordered chunk sequence.
///
/// # Guarantees
///
/// - Chunk indices are contiguous across pages: `0, 1, 2, …, N-1`.
/// - Each chunk's text is at most `max_tokens × 4` characters.
/// - Boundaries depend only on the input, never on run-to-run state.
pub fn chunk_pages(pages: &[Page], max_tokens: usize) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut next_index: i64 = 0;

    for page in pages {
        for text in split_text(&page.text, max_tokens) {
            chunks.push(make_chunk(page.page_index, next_index, &text));
            next_index += 1;
        }
    }

    chunks
}

/// Split one body of text into bounded pieces on paragraph boundaries.
fn split_text(text: &str, max_tokens: usize) -> Vec<String> {
    let max_chars = max_tokens * CHARS_PER_TOKEN;
    let mut pieces = Vec::new();
    let mut current_buf = String::new();

    for para in text.split("\n\n") {
        let trimmed = para.trim();
        if trimmed.is_empty() {
            continue;
        }

        let would_be = if current_buf.is_empty() {
            trimmed.len()
        } else {
            current_buf.len() + 2 + trimmed.len()
        };

        if would_be > max_chars && !current_buf.is_empty() {
            pieces.push(std::mem::take(&mut current_buf));
        }

        if trimmed.len() > max_chars {
            if !current_buf.is_empty() {
                pieces.push(std::mem::take(&mut current_buf));
            }
            hard_split(trimmed, max_chars, &mut pieces);
        } else {
            if !current_buf.is_empty() {
                current_buf.push_str("\n\n");
            }
            current_buf.push_str(trimmed);
        }
    }

    if !current_buf.is_empty() {
        pieces.push(current_buf);
    }

    pieces
}

/// Break an oversized paragraph at newline/space boundaries, staying on
/// valid UTF-8 char boundaries throughout.
fn hard_split(paragraph: &str, max_chars: usize, out: &mut Vec<String>) {
    let mut remaining = paragraph;
    while !remaining.is_empty() {
        let mut split_at = snap_to_char_boundary(remaining, remaining.len().min(max_chars));
        if split_at < remaining.len() {
            split_at = remaining[..split_at]
                .rfind('\n')
                .or_else(|| remaining[..split_at].rfind(' '))
                .map(|pos| pos + 1)
                .unwrap_or(split_at);
            split_at = snap_to_char_boundary(remaining, split_at);
        }
        if split_at == 0 {
            // No usable boundary; take at least one char to make progress.
            split_at = remaining
                .char_indices()
                .nth(1)
                .map(|(i, _)| i)
                .unwrap_or(remaining.len());
        }
        let piece = remaining[..split_at].trim();
        if !piece.is_empty() {
            out.push(piece.to_string());
        }
        remaining = &remaining[split_at..];
    }
}

/// Snap a byte index back to the nearest valid UTF-8 char boundary.
fn snap_to_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    let mut i = index;
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

fn make_chunk(page_index: i64, chunk_index: i64, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        id: Uuid::new_v4().to_string(),
        page_index,
        chunk_index,
        text: text.to_string(),
        hash,
    }
}
