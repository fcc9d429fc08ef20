use super::models::{
    ChatMessage, ChatOptions, ChatRequest, ChatResponse, ErrorResponse, ModelInfo, TagsResponse,
};
use crate::utils::error::{LabError, Result};
use crate::utils::validation::{self, Validate};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "qwen2.5:7b-instruct-q4_0";
pub const DEFAULT_HOST: &str = "http://127.0.0.1:11434";

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn host_from(lookup: &impl Fn(&str) -> Option<String>) -> String {
    match lookup("OLLAMA_HOST") {
        Some(host) if !host.trim().is_empty() => normalize_host(&host),
        _ => DEFAULT_HOST.to_string(),
    }
}

fn model_from(lookup: &impl Fn(&str) -> Option<String>) -> String {
    match lookup("OLLAMA_DEFAULT_MODEL") {
        Some(model) if !model.trim().is_empty() => model,
        _ => DEFAULT_MODEL.to_string(),
    }
}

fn default_host() -> String {
    host_from(&env_var)
}

fn default_model() -> String {
    model_from(&env_var)
}

fn default_timeout() -> u64 {
    120
}

/// `OLLAMA_HOST` may be a bare `host:port`.
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub temperature: Option<f32>,
}

impl LlmConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(env_var)
    }

    /// Builds the config from `OLLAMA_HOST` and `OLLAMA_DEFAULT_MODEL` as
    /// returned by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            host: host_from(&lookup),
            model: model_from(&lookup),
            timeout_seconds: default_timeout(),
            temperature: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl Validate for LlmConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("llm.host", &self.host)?;
        validation::validate_non_empty_string("llm.model", &self.model)?;
        validation::validate_range("llm.timeout_seconds", self.timeout_seconds, 1, 3600)?;
        Ok(())
    }
}

/// Client for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    options: Option<ChatOptions>,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: normalize_host(&config.host),
            model: config.model.clone(),
            options: config.temperature.map(|t| ChatOptions {
                temperature: Some(t),
            }),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sends one user message and returns the trimmed reply.
    pub async fn chat(&self, prompt: &str) -> Result<String> {
        self.chat_messages(vec![ChatMessage::user(prompt)]).await
    }

    pub async fn chat_messages(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            model: self.model.clone(),
            messages,
            stream: false,
            options: self.options.clone(),
        };

        tracing::debug!("POST {} (model {})", url, self.model);
        let response = self.client.post(&url).json(&request).send().await?;
        let response = self.check_status(response).await?;

        let body: ChatResponse = response.json().await?;
        tracing::debug!(
            "Reply from {}: done={}, eval_count={:?}, total_duration={:?}",
            body.model,
            body.done,
            body.eval_count,
            body.total_duration
        );

        Ok(body.message.content.trim().to_string())
    }

    /// Like [`chat`](Self::chat), but errors are folded into the returned text.
    pub async fn ask(&self, prompt: &str) -> String {
        match self.chat(prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Model query failed: {}", e);
                format!("[Error querying model '{}': {}]", self.model, e)
            }
        }
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!("{}/api/tags", self.base_url);
        tracing::debug!("GET {}", url);

        let response = self.client.get(&url).send().await?;
        let response = self.check_status(response).await?;
        let tags: TagsResponse = response.json().await?;
        Ok(tags.models)
    }

    async fn check_status(&self, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or(body);

        Err(LabError::LlmError {
            model: self.model.clone(),
            message: format!("HTTP {}: {}", status.as_u16(), detail),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("0.0.0.0:11434"), "http://0.0.0.0:11434");
        assert_eq!(normalize_host("http://localhost:11434/"), "http://localhost:11434");
    }

    fn vars(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn test_config_from_lookup() {
        let config = LlmConfig::from_lookup(vars(&[
            ("OLLAMA_HOST", "0.0.0.0:11434"),
            ("OLLAMA_DEFAULT_MODEL", "phi3:mini"),
        ]));
        assert_eq!(config.host, "http://0.0.0.0:11434");
        assert_eq!(config.model, "phi3:mini");
        assert_eq!(config.timeout_seconds, 120);
        assert!(config.validate().is_ok());

        let config = LlmConfig::from_lookup(vars(&[("OLLAMA_HOST", "https://gpu-box:11434/")]));
        assert_eq!(config.host, "https://gpu-box:11434");
        assert_eq!(config.model, DEFAULT_MODEL);

        // blank values fall back to the defaults
        let config = LlmConfig::from_lookup(vars(&[("OLLAMA_HOST", "  "), ("OLLAMA_DEFAULT_MODEL", "")]));
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_config_validation() {
        let mut config = LlmConfig {
            host: "http://localhost:11434".to_string(),
            model: "phi3:mini".to_string(),
            timeout_seconds: 60,
            temperature: None,
        };
        assert!(config.validate().is_ok());

        config.timeout_seconds = 0;
        assert!(config.validate().is_err());

        config.timeout_seconds = 60;
        config.model = " ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_with_model() {
        let config = LlmConfig {
            host: "localhost:11434".to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_seconds: 10,
            temperature: Some(0.2),
        };
        let client = OllamaClient::new(&config).unwrap().with_model("deepseek-coder:1.3b");
        assert_eq!(client.model(), "deepseek-coder:1.3b");
        assert_eq!(client.base_url(), "http://localhost:11434");
    }
}
