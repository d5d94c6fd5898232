// Embeddings module
// HTTP client for the embedding backend with shape normalization


use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::EmbeddingConfig;
use crate::{AssistError, Result};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Client for a remote embedding endpoint. Failures degrade to an empty
/// vector so callers can skip the affected item instead of aborting.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    url: String,
    model: String,
    headers: HashMap<String, String>,
    agent: ureq::Agent,
}

#[derive(Debug, Serialize)]
struct EmbedRequest {
    model: String,
    input: String,
}

/// The two response shapes the embedding backend may return, resolved once
/// at the boundary into a plain list of vectors.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum EmbedResponse {
    /// OpenAI shape: `{ "data": [{ "embedding": [..] }] }`
    OpenAi { data: Vec<EmbeddingObject> },
    /// Ollama shape: `{ "embeddings": [[..]] }`
    Ollama { embeddings: Vec<Vec<f32>> },
}

#[derive(Debug, Deserialize)]
struct EmbeddingObject {
    embedding: Vec<f32>,
}

impl EmbedResponse {
    fn into_vectors(self) -> Vec<Vec<f32>> {
        match self {
            EmbedResponse::OpenAi { data } => data.into_iter().map(|o| o.embedding).collect(),
            EmbedResponse::Ollama { embeddings } => embeddings,
        }
    }
}

impl EmbeddingClient {
    #[inline]
    pub fn new(config: &EmbeddingConfig) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Self {
            url: config.url.clone(),
            model: config.model.clone(),
            headers: config.headers.clone(),
            agent,
        }
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    /// Embed a single text. Returns an empty vector when the backend is
    /// unreachable or replies with an unexpected shape; callers must treat
    /// an empty vector as "embedding unavailable" and skip that item.
    #[inline]
    pub fn embed(&self, text: &str) -> Vec<f32> {
        match self.request_embeddings(text) {
            Ok(mut vectors) if !vectors.is_empty() => vectors.swap_remove(0),
            Ok(_) => {
                warn!("Embedding backend returned no vectors");
                Vec::new()
            }
            Err(e) => {
                warn!("Embedding unavailable: {}", e);
                Vec::new()
            }
        }
    }

    /// Embed several texts, one request per text. Failed texts yield an
    /// empty vector at their position.
    #[inline]
    pub fn embed_many(&self, texts: &[String]) -> Vec<Vec<f32>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn request_embeddings(&self, text: &str) -> Result<Vec<Vec<f32>>> {
        debug!(
            "Requesting embedding from {} (text length: {})",
            self.url,
            text.len()
        );

        let request = EmbedRequest {
            model: self.model.clone(),
            input: text.to_string(),
        };
        let request_json = serde_json::to_string(&request).map_err(|e| {
            AssistError::Format(format!("failed to serialize embedding request: {}", e))
        })?;

        let mut builder = self
            .agent
            .post(&self.url)
            .header("Content-Type", "application/json");
        for (name, value) in &self.headers {
            builder = builder.header(name, value);
        }

        let response_text = builder
            .send(&request_json)
            .and_then(|mut resp| resp.body_mut().read_to_string())
            .map_err(|e| AssistError::Network(format!("embedding request failed: {}", e)))?;

        let response: EmbedResponse = serde_json::from_str(&response_text).map_err(|e| {
            AssistError::Format(format!("unexpected embedding response shape: {}", e))
        })?;

        let vectors = response.into_vectors();
        debug!(
            "Received {} embedding vector(s) of dimension {}",
            vectors.len(),
            vectors.first().map_or(0, Vec::len)
        );

        Ok(vectors)
    }
}
