//! Qdrant vector index integration.

pub mod client;
pub mod payload;
pub mod types;

pub use client::VectorIndexService;
pub use payload::compute_chunk_hash;
pub use types::{FragmentMetadata, IndexError, PointInsert, ScoredPoint};
