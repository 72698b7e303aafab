//! OpenAI-compatible embeddings backend.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Embedder;
use crate::providers::sanitize_api_error;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// An embedder that speaks the OpenAI-compatible `/embeddings` API.
pub struct OpenAiEmbedder {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: Client,
}

impl OpenAiEmbedder {
    pub fn new(base_url: Option<&str>, api_key: Option<&str>, model: &str) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.map(ToString::to_string),
            model: model.to_string(),
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .connect_timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.base_url)
    }

    async fn request(&self, input: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingsRequest {
            model: &self.model,
            input,
        };

        let mut request = self.client.post(self.embeddings_url()).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read error body>".to_string());
            return Err(anyhow!(
                "embeddings API error ({status}): {}",
                sanitize_api_error(&text)
            ));
        }

        let parsed: EmbeddingsResponse = response.json().await?;
        let mut data = parsed.data;
        // The API may return entries out of order; index is authoritative.
        data.sort_by_key(|d| d.index);
        if data.len() != input.len() {
            return Err(anyhow!(
                "embeddings API returned {} vectors for {} inputs",
                data.len(),
                input.len()
            ));
        }
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.request(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| anyhow!("embeddings API returned no vector"))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }

    fn name(&self) -> &str {
        "openai"
    }
}
