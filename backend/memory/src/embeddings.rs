/// Embedding providers for Parley memory.
///
/// All providers implement the `EmbeddingProvider` trait.
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Return the embedding dimension for this provider/model.
    fn dimension(&self) -> usize;
    /// Embed a single text string.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    /// Embed a batch of texts (default: sequential).
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// OpenAI
// ---------------------------------------------------------------------------

pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-ada-002";

pub struct OpenAIEmbeddings {
    api_key: String,
    model: String,
    base_url: String,
    dimension: usize,
    client: Client,
}

impl OpenAIEmbeddings {
    pub fn new(api_key: impl Into<String>, model: Option<String>) -> Self {
        let model = model.unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());
        let dimension = if model.contains("3-large") { 3072 } else { 1536 };
        Self {
            api_key: api_key.into(),
            model,
            base_url: "https://api.openai.com/v1".to_string(),
            dimension,
            client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Serialize)]
struct OpenAIEmbedRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(Deserialize)]
struct OpenAIEmbedResponse {
    data: Vec<OpenAIEmbedData>,
}

#[derive(Deserialize)]
struct OpenAIEmbedData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAIEmbeddings {
    async fn request(&self, input: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        let expected = input.len();
        let body = OpenAIEmbedRequest { model: &self.model, input };
        let res: OpenAIEmbedResponse = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("Embedding HTTP request failed")?
            .error_for_status()?
            .json()
            .await
            .context("Failed to parse embedding response")?;

        let mut data = res.data;
        if data.len() != expected {
            anyhow::bail!("Expected {} embeddings, got {}", expected, data.len());
        }
        data.sort_by_key(|d| d.index);
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddings {
    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(vec![text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }
        self.request(texts.to_vec()).await
    }
}
