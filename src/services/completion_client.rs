use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

use crate::config::DiscoveryConfig;

#[derive(Debug)]
pub enum GenerativeError {
    Environment(String),
    Http(reqwest::Error),
    Response(String),
}

impl fmt::Display for GenerativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerativeError::Environment(msg) => write!(f, "Environment error: {}", msg),
            GenerativeError::Http(err) => write!(f, "HTTP error: {}", err),
            GenerativeError::Response(msg) => write!(f, "Response error: {}", msg),
        }
    }
}

impl Error for GenerativeError {}

impl From<reqwest::Error> for GenerativeError {
    fn from(err: reqwest::Error) -> Self {
        GenerativeError::Http(err)
    }
}

/// Free-text completion. Nothing about the returned text is guaranteed.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GenerativeError>;
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Clone)]
pub struct GeminiCompletionClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl GeminiCompletionClient {
    pub fn new(api_url: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }

    pub fn from_config(config: &DiscoveryConfig) -> Result<Self, GenerativeError> {
        let api_key = config.generative_api_key.as_deref().ok_or_else(|| {
            GenerativeError::Environment("GENERATIVE_API_KEY not set".to_string())
        })?;
        Ok(Self::new(
            &config.generative_api_url,
            api_key,
            &config.generative_model,
        ))
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.api_url, self.model)
    }
}

#[async_trait]
impl CompletionClient for GeminiCompletionClient {
    async fn complete(&self, prompt: &str) -> Result<String, GenerativeError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenerativeError::Response(format!(
                "Completion request failed with status {}: {}",
                status, error_text
            )));
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            GenerativeError::Response(format!("Failed to parse response: {}", e))
        })?;

        body.candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .map(|part| part.text)
            .find(|text| !text.trim().is_empty())
            .ok_or_else(|| GenerativeError::Response("Response had no text".to_string()))
    }
}
