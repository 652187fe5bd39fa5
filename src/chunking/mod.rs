//! Sliding-window text chunker with sentence-boundary snapping.
//!
//! Documents are split into overlapping windows of at most `chunk_size`
//! characters. When a window edge falls mid-text, the chunker looks up to
//! [`BOUNDARY_WINDOW`] characters to either side of the raw cut for the
//! nearest sentence terminator (`". "`, `"! "`, `"? "`) and snaps the cut to
//! just after it. The heuristic is approximate (abbreviations, missing
//! spacing) and deliberately kept instead of a full sentence tokenizer.

use crate::errors::{RagError, Result};

/// Search radius around a raw window edge for a sentence terminator.
pub const BOUNDARY_WINDOW: usize = 30;

const TERMINATORS: [char; 3] = ['.', '!', '?'];

/// Splits raw document text into bounded, overlapping chunks.
#[derive(Debug, Clone)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Chunker {
    /// Create a chunker, rejecting parameter combinations that could never
    /// terminate.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::InvalidChunking {
                chunk_size,
                overlap,
                reason: "chunk_size must be positive".to_string(),
            });
        }
        if overlap >= chunk_size {
            return Err(RagError::InvalidChunking {
                chunk_size,
                overlap,
                reason: "overlap must be smaller than chunk_size".to_string(),
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into trimmed, non-empty chunks in document order.
    ///
    /// A document shorter than `chunk_size` yields exactly one chunk; empty
    /// input yields none.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();
        let mut chunks = Vec::new();

        let mut start = 0usize;
        while start < len {
            let raw_end = (start + self.chunk_size).min(len);
            let end = if raw_end < len {
                self.snap_boundary(&chars, start, raw_end)
            } else {
                raw_end
            };

            let piece: String = chars[start..end].iter().collect();
            let trimmed = piece.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }

            if end >= len {
                break;
            }

            let next = end.saturating_sub(self.overlap);
            // Snapping can pull the cut back far enough that the overlap
            // would rewind past `start`; force forward progress.
            start = if next > start { next } else { end };
        }

        chunks
    }

    /// Find the sentence boundary nearest to `raw_end`, or keep the raw cut.
    ///
    /// Candidate cuts sit immediately after a terminator followed by a space,
    /// within `BOUNDARY_WINDOW` characters of the raw edge and strictly
    /// inside `(start, len)`.
    fn snap_boundary(&self, chars: &[char], start: usize, raw_end: usize) -> usize {
        let len = chars.len();
        let lo = raw_end.saturating_sub(BOUNDARY_WINDOW).max(start);
        let hi = (raw_end + BOUNDARY_WINDOW).min(len);

        let mut best: Option<usize> = None;
        for i in lo..hi.saturating_sub(1) {
            if TERMINATORS.contains(&chars[i]) && chars[i + 1] == ' ' {
                let cut = i + 2;
                if cut <= start || cut > len {
                    continue;
                }
                let closer = match best {
                    Some(b) => cut.abs_diff(raw_end) < b.abs_diff(raw_end),
                    None => true,
                };
                if closer {
                    best = Some(cut);
                }
            }
        }

        best.unwrap_or(raw_end)
    }
}
