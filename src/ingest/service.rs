//! Ingestion service coordinating loading, chunking, embedding, and index writes.

use crate::{
    config::get_config,
    embedding::{EmbeddingClient, EmbeddingClientError},
    index::{FragmentMetadata, IndexError, PointInsert, VectorIndexService, compute_chunk_hash},
    ingest::{
        chunking::{ChunkingError, chunk_text},
        loader::{DocumentLoader, extension_of},
    },
    metrics::PipelineMetrics,
};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use time::OffsetDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use walkdir::WalkDir;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

// Oversized files are skipped rather than loaded into memory.
const MAX_FILE_SIZE_BYTES: u64 = 200 * 1024 * 1024;
const EMBED_BATCH_SIZE: usize = 16;

/// Errors emitted by the ingestion pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Chunking step failed to segment a document.
    #[error("Failed to chunk document: {0}")]
    Chunking(#[from] ChunkingError),
    /// Embedding provider failed to produce vectors.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Vector index interaction failed.
    #[error("Vector index request failed: {0}")]
    Index(#[from] IndexError),
}

/// Summary of a completed directory ingestion.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestReport {
    /// Documents successfully chunked and indexed.
    pub files_indexed: usize,
    /// Documents skipped (unreadable, empty, or oversized).
    pub files_skipped: usize,
    /// Total chunks written to the index.
    pub chunks_indexed: usize,
}

/// Coordinates the ingestion pipeline over shared collaborator handles.
pub struct IngestService {
    embedding_client: Arc<dyn EmbeddingClient>,
    index: Arc<VectorIndexService>,
    loader: Arc<dyn DocumentLoader>,
    metrics: Arc<PipelineMetrics>,
}

impl IngestService {
    /// Build an ingestion service over handles constructed once at startup.
    pub fn new(
        embedding_client: Arc<dyn EmbeddingClient>,
        index: Arc<VectorIndexService>,
        loader: Arc<dyn DocumentLoader>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            embedding_client,
            index,
            loader,
            metrics,
        }
    }

    /// Ensure the configured collection exists with the configured vector size.
    pub async fn ensure_collection(&self) -> Result<(), IngestError> {
        let config = get_config();
        self.index
            .create_collection_if_not_exists(
                &config.qdrant_collection_name,
                config.embedding_dimension as u64,
            )
            .await?;
        Ok(())
    }

    /// Walk the docs directory and index every supported document.
    pub async fn ingest_directory(&self, docs_dir: &Path) -> Result<IngestReport, IngestError> {
        let config = get_config();
        self.ensure_collection().await?;

        let files: Vec<_> = WalkDir::new(docs_dir)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| self.loader.supports(&extension_of(entry.path())))
            .map(|entry| entry.into_path())
            .collect();

        tracing::info!(
            docs_dir = %docs_dir.display(),
            files = files.len(),
            "Scanning documents"
        );

        let mut report = IngestReport::default();

        for path in files {
            match self.ingest_file(&path, docs_dir).await? {
                Some(chunks) => {
                    report.files_indexed += 1;
                    report.chunks_indexed += chunks;
                }
                None => report.files_skipped += 1,
            }
        }

        tracing::info!(
            collection = %config.qdrant_collection_name,
            files_indexed = report.files_indexed,
            files_skipped = report.files_skipped,
            chunks_indexed = report.chunks_indexed,
            "Ingestion complete"
        );
        Ok(report)
    }

    /// Drop all indexed data and re-ingest the docs directory from scratch.
    pub async fn reingest(&self, docs_dir: &Path) -> Result<IngestReport, IngestError> {
        self.clear().await?;
        self.ingest_directory(docs_dir).await
    }

    /// Count the chunks currently stored in the configured collection.
    pub async fn count(&self) -> Result<u64, IngestError> {
        let config = get_config();
        Ok(self
            .index
            .count_points(&config.qdrant_collection_name)
            .await?)
    }

    /// Drop and recreate the configured collection, leaving it empty.
    pub async fn clear(&self) -> Result<(), IngestError> {
        let config = get_config();
        self.index
            .reset_collection(
                &config.qdrant_collection_name,
                config.embedding_dimension as u64,
            )
            .await?;
        Ok(())
    }

    /// Index a single document; `Ok(None)` means the file was skipped.
    async fn ingest_file(
        &self,
        path: &Path,
        docs_dir: &Path,
    ) -> Result<Option<usize>, IngestError> {
        let config = get_config();

        let file_size = std::fs::metadata(path).map(|meta| meta.len()).unwrap_or(0);
        if file_size > MAX_FILE_SIZE_BYTES {
            tracing::warn!(path = %path.display(), file_size, "File too large; skipping");
            return Ok(None);
        }

        let text = match self.loader.load(path) {
            Ok(text) => text,
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %error, "Failed to load document; skipping");
                return Ok(None);
            }
        };
        if text.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Document has no usable text; skipping");
            return Ok(None);
        }

        let chunks = chunk_text(&text, config.chunk_size, config.chunk_overlap)?;
        let (chunks, skipped_duplicates) = dedupe_chunks(chunks);
        if chunks.is_empty() {
            tracing::debug!(path = %path.display(), "No chunks produced; skipping");
            return Ok(None);
        }

        let metadata = derive_metadata(path, docs_dir);
        let mut indexed = 0;

        for (batch_start, batch) in chunks
            .chunks(EMBED_BATCH_SIZE)
            .enumerate()
            .map(|(i, batch)| (i * EMBED_BATCH_SIZE, batch))
        {
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let embeddings = self.embedding_client.generate_embeddings(texts).await?;

            let points: Vec<PointInsert> = batch
                .iter()
                .zip(embeddings)
                .enumerate()
                .map(|(offset, (chunk, vector))| PointInsert {
                    text: chunk.text.clone(),
                    chunk_hash: chunk.chunk_hash.clone(),
                    vector,
                    metadata: FragmentMetadata {
                        chunk_index: (batch_start + offset) as u64,
                        ..metadata.clone()
                    },
                })
                .collect();

            indexed += self
                .index
                .upsert_points(&config.qdrant_collection_name, points)
                .await?;
        }

        self.metrics.record_document(indexed as u64);
        tracing::info!(
            path = %path.display(),
            chunks = indexed,
            skipped_duplicates,
            "Document indexed"
        );
        Ok(Some(indexed))
    }
}

/// Chunk text with its dedupe hash, ready for embedding.
#[derive(Debug, Clone)]
struct PreparedChunk {
    text: String,
    chunk_hash: String,
}

/// Remove duplicate chunks within a document, keeping the first occurrence.
fn dedupe_chunks(chunks: Vec<String>) -> (Vec<PreparedChunk>, usize) {
    let mut seen = HashSet::new();
    let mut prepared = Vec::new();
    let mut skipped = 0;

    for text in chunks {
        if text.trim().is_empty() {
            continue;
        }
        let hash = compute_chunk_hash(&text);
        if seen.insert(hash.clone()) {
            prepared.push(PreparedChunk {
                text,
                chunk_hash: hash,
            });
        } else {
            skipped += 1;
        }
    }

    (prepared, skipped)
}

/// Derive the fragment metadata shared by every chunk of a document.
fn derive_metadata(path: &Path, docs_dir: &Path) -> FragmentMetadata {
    let folder = path
        .strip_prefix(docs_dir)
        .ok()
        .and_then(|relative| relative.parent())
        .map(|parent| parent.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let date = std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .map(OffsetDateTime::from)
        .and_then(|modified| modified.date().format(DATE_FORMAT).ok());

    FragmentMetadata {
        source: path.to_string_lossy().into_owned(),
        chunk_index: 0,
        ext: extension_of(path),
        folder,
        date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn dedupe_chunks_removes_duplicates_and_counts_skips() {
        let chunks = vec![
            "alpha".to_string(),
            "beta".to_string(),
            "alpha".to_string(),
            "beta".to_string(),
        ];
        let (deduped, skipped) = dedupe_chunks(chunks);
        let texts: Vec<_> = deduped.iter().map(|chunk| chunk.text.as_str()).collect();
        assert_eq!(texts, vec!["alpha", "beta"]);
        assert_eq!(skipped, 2);
        assert_ne!(deduped[0].chunk_hash, deduped[1].chunk_hash);
    }

    #[test]
    fn metadata_derives_folder_relative_to_docs_root() {
        let docs_dir = PathBuf::from("docs");
        let path = docs_dir.join("Seguridad/politicas.txt");
        let metadata = derive_metadata(&path, &docs_dir);
        assert_eq!(metadata.folder, "seguridad");
        assert_eq!(metadata.ext, ".txt");
        assert!(metadata.source.ends_with("politicas.txt"));
    }

    #[test]
    fn metadata_folder_is_empty_at_docs_root() {
        let docs_dir = PathBuf::from("docs");
        let path = docs_dir.join("nota.md");
        let metadata = derive_metadata(&path, &docs_dir);
        assert_eq!(metadata.folder, "");
    }
}
