//! Hugging Face Inference API adapters for embeddings and answer generation.
//!
//! Credentials and endpoints come from an explicit [`HuggingFaceConfig`]; nothing
//! is read from the environment here. Both clients hold a single
//! `reqwest::Client` and can be shared across sessions behind an `Arc`.

use crate::embeddings::validate_batch;
use crate::traits::{AnswerGenerator, Embedder};
use crate::{EmbeddingError, GenerationError, GenerationRequest};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 384;
pub const DEFAULT_GENERATION_MODEL: &str = "google/flan-t5-large";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct HuggingFaceConfig {
    pub api_token: Option<String>,
    pub base_url: String,
    pub embedding_model: String,
    pub embedding_dimensions: usize,
    pub generation_model: String,
    pub timeout: Duration,
}

impl Default for HuggingFaceConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            generation_model: DEFAULT_GENERATION_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HuggingFaceConfig {
    fn endpoint(&self, path: &str) -> Result<Url, url::ParseError> {
        let base = Url::parse(&format!("{}/", self.base_url.trim_end_matches('/')))?;
        base.join(path.trim_start_matches('/'))
    }

    fn http_client(&self) -> Result<Client, reqwest::Error> {
        Client::builder()
            .user_agent(concat!("docqa/", env!("CARGO_PKG_VERSION")))
            .timeout(self.timeout)
            .build()
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.api_token.as_deref().map(str::trim) {
            Some(token) if !token.is_empty() => request.bearer_auth(token),
            _ => request,
        }
    }
}

async fn provider_failure(response: Response) -> (u16, String) {
    let status = response.status().as_u16();
    let details = response.text().await.unwrap_or_default();
    (status, details)
}

pub struct HuggingFaceEmbedder {
    config: HuggingFaceConfig,
    client: Client,
    endpoint: Url,
}

impl HuggingFaceEmbedder {
    pub fn new(config: HuggingFaceConfig) -> Result<Self, EmbeddingError> {
        let endpoint = config.endpoint(&format!(
            "pipeline/feature-extraction/{}",
            config.embedding_model
        ))?;
        let client = config.http_client()?;
        Ok(Self {
            config,
            client,
            endpoint,
        })
    }
}

#[async_trait]
impl Embedder for HuggingFaceEmbedder {
    fn dimensions(&self) -> usize {
        self.config.embedding_dimensions
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Err(EmbeddingError::EmptyBatch);
        }

        debug!(
            model = %self.config.embedding_model,
            batch = texts.len(),
            "requesting embeddings"
        );

        let request = self
            .client
            .post(self.endpoint.clone())
            .json(&json!({ "inputs": texts }));
        let response = self.config.authorize(request).send().await?;

        if !response.status().is_success() {
            let (status, details) = provider_failure(response).await;
            return Err(EmbeddingError::Provider { status, details });
        }

        let body = response.text().await?;
        let vectors: Vec<Vec<f32>> = serde_json::from_str(&body)
            .map_err(|error| EmbeddingError::InvalidResponse(error.to_string()))?;

        validate_batch(&vectors, texts.len(), Some(self.config.embedding_dimensions))?;
        Ok(vectors)
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedText {
    generated_text: String,
}

pub struct HuggingFaceGenerator {
    config: HuggingFaceConfig,
    client: Client,
    endpoint: Url,
}

impl HuggingFaceGenerator {
    pub fn new(config: HuggingFaceConfig) -> Result<Self, GenerationError> {
        let endpoint = config.endpoint(&format!("models/{}", config.generation_model))?;
        let client = config.http_client()?;
        Ok(Self {
            config,
            client,
            endpoint,
        })
    }
}

#[async_trait]
impl AnswerGenerator for HuggingFaceGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        debug!(
            model = %self.config.generation_model,
            context_chars = request.context.chars().count(),
            "requesting answer"
        );

        let payload = json!({
            "inputs": request.prompt(),
            "parameters": {
                "max_length": request.max_output_length,
                "temperature": request.temperature,
            },
        });

        let http = self.client.post(self.endpoint.clone()).json(&payload);
        let response = self.config.authorize(http).send().await?;

        if !response.status().is_success() {
            let (status, details) = provider_failure(response).await;
            return Err(GenerationError::Provider { status, details });
        }

        let body = response.text().await?;
        let generated: Vec<GeneratedText> = serde_json::from_str(&body)
            .map_err(|error| GenerationError::InvalidResponse(error.to_string()))?;

        generated
            .into_iter()
            .next()
            .map(|item| item.generated_text.trim().to_string())
            .ok_or_else(|| GenerationError::InvalidResponse("no generations returned".to_string()))
    }
}
