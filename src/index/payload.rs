//! Helpers for constructing and hashing index payloads.

use crate::index::types::FragmentMetadata;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Build the payload object stored alongside each indexed chunk.
pub(crate) fn build_payload(text: &str, chunk_hash: &str, metadata: &FragmentMetadata) -> Value {
    let mut payload = Map::new();
    payload.insert("text".into(), Value::String(text.to_string()));
    payload.insert("chunk_hash".into(), Value::String(chunk_hash.to_string()));
    payload.insert("source".into(), Value::String(metadata.source.clone()));
    payload.insert("chunk_index".into(), Value::from(metadata.chunk_index));
    payload.insert("ext".into(), Value::String(metadata.ext.clone()));
    payload.insert("folder".into(), Value::String(metadata.folder.clone()));

    if let Some(date) = metadata.date.as_ref().filter(|value| !value.is_empty()) {
        payload.insert("date".into(), Value::String(date.clone()));
    }

    Value::Object(payload)
}

/// Compute a deterministic SHA-256 hash for the chunk text.
pub fn compute_chunk_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Construct an identifier suitable for index points.
pub(crate) fn generate_point_id() -> String {
    Uuid::new_v4().to_string()
}
