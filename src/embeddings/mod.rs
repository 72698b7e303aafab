//! Embedding capability: text to fixed-length vector.
//!
//! Consumed opaquely by course-name resolution and semantic search. The
//! [`Embedder`] trait is the seam; [`OpenAiEmbedder`] speaks the
//! OpenAI-compatible `/embeddings` endpoint.

pub mod openai;

pub use openai::OpenAiEmbedder;

use crate::config::Config;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Opaque "text → vector" capability.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, preserving order. The default implementation
    /// embeds one at a time; backends with a batch endpoint should override.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    /// The name of this embedder implementation.
    fn name(&self) -> &str;
}

/// Factory: create the embedder from config. The API key resolves the same
/// way as for the chat provider, environment overrides included.
pub fn create_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let key = crate::providers::resolve_credential(config);
    Ok(Arc::new(OpenAiEmbedder::new(
        config.api_url.as_deref(),
        key.as_deref(),
        &config.embedding_model,
    )))
}
