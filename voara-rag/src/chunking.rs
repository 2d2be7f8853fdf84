//! Document chunking.
//!
//! This module provides the [`Chunker`] trait and [`MarkdownChunker`], a
//! splitter that prefers natural boundaries (paragraph breaks, then line
//! breaks) before falling back to hard character cuts, and records the
//! nearest enclosing markdown heading on each chunk.

use crate::document::{Chunk, Document, chunk_id};
use crate::error::{RagError, Result};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and metadata; embeddings
/// are attached later by the ingestion pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has empty text.
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>>;
}

/// Splits text into overlapping windows of at most `chunk_size` characters,
/// cutting at paragraph or line breaks when one falls inside the window.
///
/// Chunk text is always a verbatim slice of the source: concatenating the
/// first chunk with every subsequent chunk minus its first `chunk_overlap`
/// characters reconstructs the document exactly. Headings are recorded as
/// metadata, never spliced into the text.
///
/// Sizes are measured in characters, not bytes, so multi-byte text chunks
/// cleanly.
#[derive(Debug, Clone)]
pub struct MarkdownChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl MarkdownChunker {
    /// Create a new `MarkdownChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — maximum number of characters per chunk
    /// * `chunk_overlap` — number of overlapping characters between
    ///   consecutive chunks
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Chunking`] if `chunk_size` is zero or
    /// `chunk_overlap >= chunk_size`, which would prevent the window from
    /// advancing.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(RagError::Chunking("chunk_size must be greater than zero".to_string()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::Chunking(format!(
                "chunk_overlap ({chunk_overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self { chunk_size, chunk_overlap })
    }
}

/// Byte offsets and texts of markdown heading lines (`#`-prefixed).
fn scan_headings(text: &str) -> Vec<(usize, String)> {
    let mut headings = Vec::new();
    let mut offset = 0;
    for line in text.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            let level = trimmed.chars().take_while(|c| *c == '#').count();
            headings.push((offset, trimmed[level..].trim().to_string()));
        }
        offset += line.len();
    }
    headings
}

/// The most recent heading at or before the given byte offset.
fn heading_at(headings: &[(usize, String)], byte_offset: usize) -> String {
    let idx = headings.partition_point(|(o, _)| *o <= byte_offset);
    if idx == 0 { String::new() } else { headings[idx - 1].1.clone() }
}

impl Chunker for MarkdownChunker {
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>> {
        let text = &document.text;
        if text.is_empty() {
            return Ok(Vec::new());
        }

        // Byte offset of every character, for slicing by character count.
        let offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        let total_chars = offsets.len();
        let byte_at = |c: usize| if c == total_chars { text.len() } else { offsets[c] };
        let char_at = |b: usize| offsets.partition_point(|&o| o < b);

        let headings = scan_headings(text);

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total_chars {
            let window_end = (start + self.chunk_size).min(total_chars);
            let end = if window_end < total_chars {
                self.natural_cut(text, &byte_at, &char_at, start, window_end).unwrap_or(window_end)
            } else {
                window_end
            };

            let start_byte = byte_at(start);
            let position = chunks.len();
            chunks.push(Chunk {
                id: chunk_id(&document.source, position),
                text: text[start_byte..byte_at(end)].to_string(),
                source: document.source.clone(),
                header: heading_at(&headings, start_byte),
                position,
            });

            if end == total_chars {
                break;
            }
            // The next window re-reads exactly `chunk_overlap` characters.
            start = end - self.chunk_overlap;
        }

        Ok(chunks)
    }
}

impl MarkdownChunker {
    /// Find a natural cut point inside `(start, window_end]`: the end of the
    /// last paragraph break if any, otherwise the end of the last line
    /// break. Cuts at or before `start + chunk_overlap` are rejected so the
    /// window always advances past the overlap region.
    fn natural_cut(
        &self,
        text: &str,
        byte_at: &impl Fn(usize) -> usize,
        char_at: &impl Fn(usize) -> usize,
        start: usize,
        window_end: usize,
    ) -> Option<usize> {
        let window = &text[byte_at(start)..byte_at(window_end)];
        let min_cut = start + self.chunk_overlap + 1;

        for (separator, len) in [("\n\n", 2), ("\n", 1)] {
            if let Some(pos) = window.rfind(separator) {
                let cut = char_at(byte_at(start) + pos + len);
                if cut >= min_cut {
                    return Some(cut);
                }
            }
        }
        None
    }
}
