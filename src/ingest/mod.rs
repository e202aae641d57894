//! Document ingestion pipeline: loading, chunking, embedding, and index writes.

pub mod chunking;
pub mod loader;
mod service;

pub use chunking::{ChunkingError, chunk_text};
pub use loader::{DocumentLoader, LoadError, PlainTextLoader, default_loader};
pub use service::{IngestError, IngestReport, IngestService};
