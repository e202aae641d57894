#![deny(missing_docs)]

//! Core library for the ragtag local RAG pipeline.

/// Ollama chat client for grounded and direct model calls.
pub mod chat;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Qdrant vector index integration.
pub mod index;
/// Document ingestion pipeline: loading, chunking, and indexing.
pub mod ingest;
/// Structured logging and tracing setup.
pub mod logging;
/// Pipeline activity counters.
pub mod metrics;
/// Query-time retrieval and routing pipeline.
pub mod query;
