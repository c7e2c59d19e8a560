#[cfg(test)]
mod tests;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::documents::Page;

/// Separators tried in order when choosing where a chunk should end
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

/// Represents a chunk of page text ready for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Position of this chunk in build order, unique within one index
    pub id: usize,
    /// The chunk text
    pub text: String,
    /// The PDF this chunk was cut from
    pub source: PathBuf,
    /// 1-based page number within `source`
    pub page_number: u32,
    /// Offset of the first character of this chunk within the page text
    pub start_char: usize,
    /// Estimated token count
    pub token_count: usize,
}

/// A window of text with its character offset in the original string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSpan {
    pub start: usize,
    pub text: String,
}

/// Configuration for text chunking, in characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Maximum chunk length
    pub chunk_size: usize,
    /// Characters shared between the end of one chunk and the start of the next
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Split every page into chunks, numbering them in page order
#[inline]
pub fn chunk_pages<'a, I>(pages: I, config: &ChunkingConfig) -> Vec<Chunk>
where
    I: IntoIterator<Item = &'a Page>,
{
    let mut chunks = Vec::new();
    let mut page_count = 0usize;

    for page in pages {
        page_count += 1;
        for span in split_text(&page.text, config.chunk_size, config.chunk_overlap) {
            chunks.push(Chunk {
                id: chunks.len(),
                token_count: estimate_token_count(&span.text),
                text: span.text,
                source: page.source.clone(),
                page_number: page.number,
                start_char: span.start,
            });
        }
    }

    debug!(
        "Chunked {} pages into {} chunks (avg {} tokens)",
        page_count,
        chunks.len(),
        chunks.iter().map(|c| c.token_count).sum::<usize>() / chunks.len().max(1)
    );

    chunks
}

/// Split `text` into windows of at most `chunk_size` characters.
///
/// Each window after the first starts exactly `overlap` characters before the
/// previous one ends, so dropping the first `overlap` characters of every
/// window but the first and concatenating reproduces `text`. Window ends are
/// pulled back to the last paragraph break, line break or space that still
/// leaves room past the overlap, and fall back to a hard cut otherwise.
#[inline]
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<TextSpan> {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();
    if len == 0 {
        return Vec::new();
    }

    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size - 1);

    let mut spans = Vec::new();
    let mut start = 0;
    loop {
        let window_end = start + chunk_size;
        if window_end >= len {
            spans.push(span(&chars, start, len));
            break;
        }

        let end = find_break(&chars, start, start + overlap + 1, window_end).unwrap_or(window_end);
        spans.push(span(&chars, start, end));
        start = end - overlap;
    }

    spans
}

fn span(chars: &[char], start: usize, end: usize) -> TextSpan {
    TextSpan {
        start,
        text: chars[start..end].iter().collect(),
    }
}

/// Find the latest end position in `min_end..=max_end` that falls right after
/// a separator lying entirely inside the chunk starting at `start`
fn find_break(chars: &[char], start: usize, min_end: usize, max_end: usize) -> Option<usize> {
    SEPARATORS.iter().find_map(|separator| {
        let separator: Vec<char> = separator.chars().collect();
        let width = separator.len();
        (min_end..=max_end)
            .rev()
            .find(|&end| end >= start + width && chars[end - width..end] == separator[..])
    })
}

/// Estimate token count using a simple heuristic
/// This is a rough approximation - actual tokenization would be more accurate
#[inline]
pub fn estimate_token_count(text: &str) -> usize {
    // Rough heuristic: 1 token ≈ 0.75 words for English text
    // Add extra tokens for punctuation and special characters
    let word_count = text.split_whitespace().count();
    let punct_count = text.chars().filter(|c| c.is_ascii_punctuation()).count();

    (punct_count as f64).mul_add(0.1, word_count as f64 / 0.75) as usize
}
