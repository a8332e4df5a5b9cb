//! Semantic retrieval over scraped page text.
//!
//! A page is split into overlapping chunks, each chunk is embedded, and a
//! query selects the `k` chunks closest to it by cosine similarity. Stages
//! feed those chunks to the LLM instead of the whole page.

pub mod embed;
pub mod splitter;

pub use embed::{Embedder, LexicalEmbedder, OpenAiEmbedder};
pub use splitter::TextSplitter;

use crate::error::Result;
use crate::fetch::is_error_marker;
use crate::PipelineError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// One piece of split page text.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub content: String,
}

/// Chunks of one page and their embeddings, index-aligned.
#[derive(Debug, Clone)]
pub struct ChunkIndex {
    pub chunks: Vec<Chunk>,
    pub embeddings: Vec<Vec<f32>>,
}

impl ChunkIndex {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

/// Chunk-and-rank retrieval as used by the pricing and news stages.
#[async_trait]
pub trait Retrieval: Send + Sync {
    /// Split and embed `text`. `None` for empty text or an error marker.
    async fn chunk_and_embed(&self, text: &str) -> Result<Option<ChunkIndex>>;

    /// The `k` chunks most similar to `query`, best first.
    async fn top_k_similar(&self, index: &ChunkIndex, query: &str, k: usize) -> Result<Vec<Chunk>>;
}

/// [`Retrieval`] backed by a [`TextSplitter`] and an [`Embedder`].
#[derive(Clone)]
pub struct SemanticRetriever {
    embedder: Arc<dyn Embedder>,
    splitter: TextSplitter,
}

impl std::fmt::Debug for SemanticRetriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticRetriever")
            .field("embedder", &self.embedder.name())
            .field("splitter", &self.splitter)
            .finish()
    }
}

impl SemanticRetriever {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            splitter: TextSplitter::default(),
        }
    }

    /// Retriever using the offline [`LexicalEmbedder`].
    pub fn lexical() -> Self {
        Self::new(Arc::new(LexicalEmbedder::new()))
    }

    pub fn with_splitter(mut self, splitter: TextSplitter) -> Self {
        self.splitter = splitter;
        self
    }
}

#[async_trait]
impl Retrieval for SemanticRetriever {
    async fn chunk_and_embed(&self, text: &str) -> Result<Option<ChunkIndex>> {
        if text.trim().is_empty() || is_error_marker(text) {
            return Ok(None);
        }
        let pieces = self.splitter.split(text);
        if pieces.is_empty() {
            return Ok(None);
        }
        let embeddings = self.embedder.embed(&pieces).await?;
        debug!(chunks = pieces.len(), embedder = self.embedder.name(), "page indexed");

        Ok(Some(ChunkIndex {
            chunks: pieces.into_iter().map(|content| Chunk { content }).collect(),
            embeddings,
        }))
    }

    async fn top_k_similar(&self, index: &ChunkIndex, query: &str, k: usize) -> Result<Vec<Chunk>> {
        if index.embeddings.len() != index.chunks.len() {
            return Err(PipelineError::Other(format!(
                "chunk index misaligned: {} chunks, {} embeddings",
                index.chunks.len(),
                index.embeddings.len()
            )));
        }
        let query_vec = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::Other("no embedding returned for query".into()))?;

        let mut scored: Vec<(usize, f32)> = index
            .embeddings
            .iter()
            .enumerate()
            .map(|(i, emb)| (i, cosine_similarity(&query_vec, emb)))
            .collect();
        // Stable sort keeps page order among ties.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(i, _)| index.chunks[i].clone())
            .collect())
    }
}

/// Cosine similarity; 0.0 for mismatched or zero-length vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Chunk contents joined with a horizontal-rule separator, for prompt context.
pub fn join_chunks(chunks: &[Chunk]) -> String {
    chunks
        .iter()
        .map(|c| c.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[tokio::test]
    async fn test_empty_or_error_text_yields_none() {
        let retriever = SemanticRetriever::lexical();
        assert!(retriever.chunk_and_embed("").await.unwrap().is_none());
        assert!(retriever
            .chunk_and_embed("Error: Status code 404")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_top_k_prefers_matching_chunk() {
        let retriever = SemanticRetriever::lexical().with_splitter(TextSplitter::new(80, 0));
        let text = "Our team loves building rockets and anvils.\n\n\
                    Pricing: Pro plan costs $9 per month, Enterprise contact sales.\n\n\
                    Read our blog about customer stories.";
        let index = retriever.chunk_and_embed(text).await.unwrap().unwrap();
        assert_eq!(index.len(), 3);

        let top = retriever.top_k_similar(&index, "pricing plan per month $", 1).await.unwrap();
        assert_eq!(top.len(), 1);
        assert!(top[0].content.starts_with("Pricing: Pro plan"));
    }

    #[tokio::test]
    async fn test_top_k_caps_at_chunk_count() {
        let retriever = SemanticRetriever::lexical();
        let index = retriever.chunk_and_embed("one small page").await.unwrap().unwrap();
        let top = retriever.top_k_similar(&index, "anything", 5).await.unwrap();
        assert_eq!(top, vec![Chunk { content: "one small page".into() }]);
    }

    #[test]
    fn test_join_chunks() {
        let chunks = vec![Chunk { content: "a".into() }, Chunk { content: "b".into() }];
        assert_eq!(join_chunks(&chunks), "a\n\n---\n\nb");
    }
}
