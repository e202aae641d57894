//! Pure helpers for the retrieval step: candidate mapping, exact post-filtering,
//! and truncation.
//!
//! The vector index is asked for more candidates than the caller wants (the
//! over-fetch) because the exact filter pass may reject most of them;
//! under-fetching would starve the result set. Similarity-rank order is
//! preserved through every step, so truncating to `k` keeps the closest
//! matches.

use crate::index::{FragmentMetadata, ScoredPoint};
use crate::query::filters::FilterSet;
use serde_json::Value;

/// One retrieved unit of text plus its provenance metadata. Fragments are
/// produced by the retrieval step and read-only downstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    /// Chunk text.
    pub text: String,
    /// Provenance metadata stored alongside the chunk.
    pub metadata: FragmentMetadata,
}

/// Candidate count requested from the vector index when the caller wants `k` results.
pub fn overfetch_limit(k: usize) -> usize {
    k.saturating_mul(4).max(k)
}

/// Map scored index points into fragments, preserving similarity-rank order.
///
/// Points without a text payload are skipped; missing metadata fields default
/// to empty values so the filter pass can still evaluate them.
pub fn fragments_from_points(points: Vec<ScoredPoint>) -> Vec<Fragment> {
    points
        .into_iter()
        .filter_map(|point| {
            let mut payload = point.payload?;
            let text = match payload.remove("text") {
                Some(Value::String(text)) => text,
                _ => return None,
            };

            let metadata = FragmentMetadata {
                source: string_field(&mut payload, "source"),
                chunk_index: payload
                    .remove("chunk_index")
                    .and_then(|value| value.as_u64())
                    .unwrap_or(0),
                ext: string_field(&mut payload, "ext"),
                folder: string_field(&mut payload, "folder"),
                date: match payload.remove("date") {
                    Some(Value::String(date)) if !date.is_empty() => Some(date),
                    _ => None,
                },
            };

            Some(Fragment { text, metadata })
        })
        .collect()
}

fn string_field(payload: &mut serde_json::Map<String, Value>, key: &str) -> String {
    match payload.remove(key) {
        Some(Value::String(value)) => value,
        _ => String::new(),
    }
}

/// Apply the filter set as an exact, order-preserving pass, then truncate to `k`.
pub fn filter_fragments(candidates: Vec<Fragment>, filters: &FilterSet, k: usize) -> Vec<Fragment> {
    if candidates.is_empty() {
        return Vec::new();
    }

    candidates
        .into_iter()
        .filter(|fragment| filters.matches(&fragment.metadata))
        .take(k)
        .collect()
}
