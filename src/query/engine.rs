//! Query orchestration: filter parsing, routing, retrieval, prompt assembly,
//! and the model call.
//!
//! The engine is the only component that talks to the embedding, vector-index,
//! and chat collaborators. Handles are built once at process start and injected
//! here, so every query reuses the same connections. A failed query surfaces
//! its error to the caller and leaves the shared handles untouched.

use crate::{
    chat::{ChatClient, ChatClientError, ChatMessage},
    config::get_config,
    embedding::{EmbeddingClient, EmbeddingClientError},
    index::{IndexError, VectorIndexService},
    metrics::PipelineMetrics,
    query::{
        classify::{QueryCategory, classify},
        filters::{FilterSet, parse_filters},
        prompt::{GROUNDED_SYSTEM_PROMPT, build_prompt},
        retrieve::{Fragment, filter_fragments, fragments_from_points, overfetch_limit},
        router::{ModelTier, route},
    },
};
use std::sync::Arc;
use thiserror::Error;

/// Errors emitted while orchestrating a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Question was empty after stripping directives.
    #[error("La pregunta no puede estar vacía.")]
    EmptyQuestion,
    /// Embedding provider failed to return vectors for the query text.
    #[error("Failed to generate embeddings: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// Embedding provider returned no vectors.
    #[error("Embedding provider returned no vectors for the query")]
    EmptyEmbedding,
    /// Vector index request returned an error response.
    #[error("Vector index request failed: {0}")]
    Index(#[from] IndexError),
    /// Chat model call failed.
    #[error("Chat request failed: {0}")]
    Chat(#[from] ChatClientError),
}

/// Result of a full grounded orchestration pass.
#[derive(Debug, Clone)]
pub struct GroundedAnswer {
    /// Tier selected by the router.
    pub tier: ModelTier,
    /// Concrete model the tier resolved to.
    pub model: String,
    /// Answer text returned by the model.
    pub text: String,
    /// Distinct fragment sources in first-seen order.
    pub sources: Vec<String>,
}

/// Result of the classifier-driven entry point.
#[derive(Debug, Clone)]
pub struct SmartAnswer {
    /// Category assigned by the classifier.
    pub category: QueryCategory,
    /// Concrete model that produced the answer.
    pub model: String,
    /// Answer text returned by the model.
    pub text: String,
    /// Distinct fragment sources; empty for paths that skip retrieval.
    pub sources: Vec<String>,
}

/// Coordinates the query pipeline over shared collaborator handles.
pub struct QueryEngine {
    embedding_client: Arc<dyn EmbeddingClient>,
    index: Arc<VectorIndexService>,
    chat_client: Arc<dyn ChatClient>,
    metrics: Arc<PipelineMetrics>,
}

impl QueryEngine {
    /// Build an engine over handles constructed once at startup.
    pub fn new(
        embedding_client: Arc<dyn EmbeddingClient>,
        index: Arc<VectorIndexService>,
        chat_client: Arc<dyn ChatClient>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            embedding_client,
            index,
            chat_client,
            metrics,
        }
    }

    /// Answer a raw query through the full grounded pipeline: parse inline
    /// filters, route a model tier, retrieve fragments, assemble the prompt,
    /// and call the model.
    pub async fn answer(&self, raw_query: &str) -> Result<GroundedAnswer, QueryError> {
        let config = get_config();
        let (filters, question) = parse_filters(raw_query);
        if question.is_empty() {
            return Err(QueryError::EmptyQuestion);
        }

        let tier = route(&question);
        let model = config.model_for(tier).to_string();
        tracing::info!(?tier, model = %model, filters_empty = filters.is_empty(), "Routed query");

        let fragments = self.retrieve(&question, &filters, config.top_k).await?;
        let sources = distinct_sources(&fragments);
        tracing::info!(
            fragments = fragments.len(),
            sources = sources.len(),
            "Retrieved context"
        );

        let prompt = build_prompt(&fragments, &question);
        let messages = [
            ChatMessage::system(GROUNDED_SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ];
        let text = self.chat_client.chat(&model, &messages).await?;

        self.metrics.record_query();
        Ok(GroundedAnswer {
            tier,
            model,
            text,
            sources,
        })
    }

    /// Answer a raw query through the classifier-driven path: small talk and
    /// code questions go straight to chat; document questions run the full
    /// grounded pipeline.
    pub async fn smart_answer(&self, raw_query: &str) -> Result<SmartAnswer, QueryError> {
        let config = get_config();
        let classification = classify(raw_query);
        if classification.text.is_empty() {
            return Err(QueryError::EmptyQuestion);
        }

        tracing::info!(category = ?classification.category, "Classified query");

        if classification.category == QueryCategory::Documents {
            let grounded = self.answer(&classification.text).await?;
            return Ok(SmartAnswer {
                category: QueryCategory::Documents,
                model: grounded.model,
                text: grounded.text,
                sources: grounded.sources,
            });
        }

        let model = match classification.category {
            QueryCategory::Code => config.model_code.clone(),
            _ => config.model_balanced.clone(),
        };
        let messages = [ChatMessage::user(classification.text)];
        let text = self.chat_client.chat(&model, &messages).await?;

        self.metrics.record_query();
        Ok(SmartAnswer {
            category: classification.category,
            model,
            text,
            sources: Vec::new(),
        })
    }

    /// Retrieve at most `k` fragments relevant to the question, applying the
    /// filter set as an exact post-filter over the over-fetched candidates.
    pub async fn retrieve(
        &self,
        question: &str,
        filters: &FilterSet,
        k: usize,
    ) -> Result<Vec<Fragment>, QueryError> {
        let config = get_config();
        let mut vectors = self
            .embedding_client
            .generate_embeddings(vec![question.to_string()])
            .await?;
        let vector = vectors.pop().ok_or(QueryError::EmptyEmbedding)?;

        let points = self
            .index
            .query_points(
                &config.qdrant_collection_name,
                vector,
                overfetch_limit(k),
            )
            .await?;

        let candidates = fragments_from_points(points);
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        Ok(filter_fragments(candidates, filters, k))
    }

    /// Return the engine's metrics handle for reporting.
    pub fn metrics(&self) -> &PipelineMetrics {
        &self.metrics
    }
}

/// Collect fragment sources in first-seen order, deduplicated.
fn distinct_sources(fragments: &[Fragment]) -> Vec<String> {
    let mut sources = Vec::new();
    for fragment in fragments {
        let source = &fragment.metadata.source;
        if !source.is_empty() && !sources.contains(source) {
            sources.push(source.clone());
        }
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::FragmentMetadata;

    fn fragment(source: &str) -> Fragment {
        Fragment {
            text: "texto".into(),
            metadata: FragmentMetadata {
                source: source.into(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn sources_are_deduplicated_in_first_seen_order() {
        let fragments = vec![
            fragment("docs/b.pdf"),
            fragment("docs/a.pdf"),
            fragment("docs/b.pdf"),
            fragment(""),
        ];
        assert_eq!(
            distinct_sources(&fragments),
            vec!["docs/b.pdf".to_string(), "docs/a.pdf".to_string()]
        );
    }
}
