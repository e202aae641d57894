//! Fixed-step character windowing for document text.
//!
//! Long texts are split into overlapping windows of at most `max_chars`
//! characters. The step between window starts is `max_chars - overlap`,
//! clamped so it always advances; windows are trimmed and empty ones dropped.

use thiserror::Error;

/// Errors produced while turning raw text into chunks.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// Caller configured an impossible window size.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
}

/// Split text into overlapping fixed-step character windows.
///
/// The overlap is clamped below `max_chars` so the step stays positive; an
/// all-whitespace input yields no chunks.
pub fn chunk_text(
    text: &str,
    max_chars: usize,
    overlap: usize,
) -> Result<Vec<String>, ChunkingError> {
    if max_chars == 0 {
        return Err(ChunkingError::InvalidChunkSize);
    }

    let overlap = if overlap >= max_chars {
        tracing::warn!(
            overlap,
            max_chars,
            "Chunk overlap >= chunk size; clamping overlap"
        );
        max_chars - 1
    } else {
        overlap
    };

    let chars: Vec<char> = text.chars().collect();
    let length = chars.len();
    let step = (max_chars - overlap).max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < length {
        let end = (start + max_chars).min(length);
        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }
        start += step;
    }

    tracing::debug!(
        characters = length,
        max_chars,
        overlap,
        step,
        chunks = chunks.len(),
        "Chunked text"
    );

    Ok(chunks)
}
