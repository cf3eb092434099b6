//! Ollama Provider Implementation
//!
//! Integration with Ollama's local chat API.
//!
//! # Features
//!
//! - Non-streaming `/api/chat` calls with a system and a user message
//! - Per-call model, temperature and token cap
//! - Retry with exponential backoff on transport and server errors
//! - Token usage from `prompt_eval_count` / `eval_count`
//!
//! # Examples
//!
//! ```no_run
//! use redyce_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llama3.1").unwrap();
//! ```

use crate::config::{LlmConfig, DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_SECS};
use crate::LlmError;
use async_trait::async_trait;
use redyce_domain::traits::CompletionClient;
use redyce_domain::{Completion, CompletionMetadata, CompletionOptions, CompletionRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Ollama API provider for local LLM inference
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
    max_retries: u32,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Default, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Request body for Ollama chat API
#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: ChatOptions,
}

/// Response from Ollama chat API
#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    message: ChatMessage,
    #[serde(default)]
    done_reason: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Default model (e.g., "llama3.1", "mistral")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        Self::with_timeout(endpoint, model, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a provider from configuration
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        config.validate()?;
        Ok(
            Self::with_timeout(&config.endpoint, &config.model, config.timeout())?
                .with_max_retries(config.max_retries),
        )
    }

    /// Create a new Ollama provider with default settings
    ///
    /// Uses `http://localhost:11434` as endpoint.
    pub fn default_endpoint(model: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    fn with_timeout(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Config(format!("Cannot build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
            max_retries: DEFAULT_MAX_RETRIES,
        })
    }

    /// Set the maximum number of attempts
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries.max(1);
        self
    }

    /// Default model name
    pub fn model(&self) -> &str {
        &self.model
    }

    fn build_request(&self, request: CompletionRequest, options: &CompletionOptions) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = request.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.user,
        });

        ChatRequest {
            model: options.model.clone().unwrap_or_else(|| self.model.clone()),
            messages,
            stream: false,
            options: ChatOptions {
                temperature: options.temperature,
                num_predict: options.max_tokens,
            },
        }
    }

    /// Send a chat request, retrying transport and server errors
    ///
    /// # Errors
    ///
    /// - `ModelNotAvailable` on HTTP 404
    /// - `RateLimited` on HTTP 429 (not retried)
    /// - `Communication` when every attempt failed
    /// - `InvalidResponse` when the body cannot be decoded
    async fn chat(&self, body: &ChatRequest) -> Result<ChatResponse, LlmError> {
        let url = format!("{}/api/chat", self.endpoint);

        let mut attempts = 0;
        let mut last_error = None;

        while attempts < self.max_retries {
            match self.client.post(&url).json(body).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return response.json::<ChatResponse>().await.map_err(|e| {
                            LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
                        });
                    } else if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(LlmError::ModelNotAvailable(body.model.clone()));
                    } else if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        return Err(LlmError::RateLimited);
                    } else {
                        let error_text = response
                            .text()
                            .await
                            .unwrap_or_else(|_| "Unknown error".to_string());
                        let error =
                            LlmError::Communication(format!("HTTP {}: {}", status, error_text));
                        if status.is_client_error() {
                            return Err(error);
                        }
                        last_error = Some(error);
                    }
                }
                Err(e) => {
                    last_error = Some(LlmError::Communication(format!("Request failed: {}", e)));
                }
            }

            attempts += 1;
            if attempts < self.max_retries {
                // 1s, 2s, 4s, ...
                let delay = Duration::from_secs(2u64.pow(attempts - 1));
                warn!(attempt = attempts, ?delay, "Ollama request failed, retrying");
                tokio::time::sleep(delay).await;
            }
        }

        Err(last_error
            .unwrap_or_else(|| LlmError::Communication("Max retries exceeded".to_string())))
    }
}

#[async_trait]
impl CompletionClient for OllamaProvider {
    type Error = LlmError;

    async fn complete(
        &self,
        request: CompletionRequest,
        options: CompletionOptions,
    ) -> Result<Completion, Self::Error> {
        let body = self.build_request(request, &options);
        debug!(model = %body.model, messages = body.messages.len(), "Sending chat request");

        let response = self.chat(&body).await?;

        Ok(Completion {
            content: response.message.content,
            metadata: CompletionMetadata {
                model: response.model.unwrap_or(body.model),
                input_tokens: response.prompt_eval_count,
                output_tokens: response.eval_count,
                finish_reason: response.done_reason,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_provider_creation() {
        let provider = OllamaProvider::new("http://localhost:11434/", "llama3.1").unwrap();
        assert_eq!(provider.endpoint, "http://localhost:11434");
        assert_eq!(provider.model(), "llama3.1");
        assert_eq!(provider.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn test_ollama_provider_from_config() {
        let config = LlmConfig {
            model: "mistral".to_string(),
            max_retries: 5,
            ..LlmConfig::default()
        };
        let provider = OllamaProvider::from_config(&config).unwrap();
        assert_eq!(provider.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(provider.model(), "mistral");
        assert_eq!(provider.max_retries, 5);
    }

    #[test]
    fn test_from_config_rejects_invalid() {
        let config = LlmConfig {
            model: String::new(),
            ..LlmConfig::default()
        };
        assert!(matches!(
            OllamaProvider::from_config(&config),
            Err(LlmError::Config(_))
        ));
    }

    #[test]
    fn test_build_request_applies_options() {
        let provider = OllamaProvider::default_endpoint("llama3.1").unwrap();
        let options = CompletionOptions {
            model: Some("qwen2".to_string()),
            temperature: Some(0.1),
            max_tokens: Some(4096),
        };
        let body = provider.build_request(
            CompletionRequest::new("user text").with_system("be precise"),
            &options,
        );

        assert_eq!(body.model, "qwen2");
        assert!(!body.stream);
        assert_eq!(body.messages.len(), 2);
        assert_eq!(body.messages[0].role, "system");
        assert_eq!(body.messages[1].content, "user text");

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["options"]["num_predict"], 4096);
    }

    #[test]
    fn test_build_request_omits_unset_options() {
        let provider = OllamaProvider::default_endpoint("llama3.1").unwrap();
        let body = provider.build_request(CompletionRequest::new("hi"), &CompletionOptions::default());

        assert_eq!(body.model, "llama3.1");
        assert_eq!(body.messages.len(), 1);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json["options"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_parse_chat_response() {
        let raw = r#"{
            "model": "llama3.1",
            "created_at": "2024-01-01T00:00:00Z",
            "message": {"role": "assistant", "content": "{\"requirements\":[]}"},
            "done": true,
            "done_reason": "stop",
            "prompt_eval_count": 812,
            "eval_count": 34
        }"#;
        let response: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.message.content, r#"{"requirements":[]}"#);
        assert_eq!(response.prompt_eval_count, Some(812));
        assert_eq!(response.eval_count, Some(34));
        assert_eq!(response.done_reason.as_deref(), Some("stop"));
    }

    // Integration tests (requires running Ollama)
    #[tokio::test]
    #[ignore] // Only run when Ollama is available
    async fn test_ollama_complete_integration() {
        let provider = OllamaProvider::default_endpoint("llama3.1").unwrap();
        let result = provider
            .complete(
                CompletionRequest::new("Say 'hello' and nothing else"),
                CompletionOptions::default(),
            )
            .await;

        if let Ok(completion) = result {
            assert!(!completion.content.is_empty());
        }
    }

    #[tokio::test]
    async fn test_ollama_error_handling() {
        // Invalid port to trigger a transport error
        let provider = OllamaProvider::new("http://localhost:99999", "llama3.1")
            .unwrap()
            .with_max_retries(1);

        let result = provider
            .complete(CompletionRequest::new("test"), CompletionOptions::default())
            .await;

        match result {
            Err(LlmError::Communication(_)) => {}
            other => panic!("Expected Communication error, got {:?}", other.map(|c| c.content)),
        }
    }
}
