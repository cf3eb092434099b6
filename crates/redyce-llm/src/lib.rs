//! Redyce LLM Provider Layer
//!
//! Implementations of the `CompletionClient` trait from `redyce-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Deterministic scripted provider for testing
//! - `OllamaProvider`: Local Ollama chat API integration
//!
//! # Examples
//!
//! ```
//! use redyce_llm::MockProvider;
//! use redyce_domain::traits::CompletionClient;
//! use redyce_domain::{CompletionOptions, CompletionRequest};
//!
//! # tokio_test::block_on(async {
//! let provider = MockProvider::new(r#"{"requirements":[]}"#);
//! let completion = provider
//!     .complete(CompletionRequest::new("prompt"), CompletionOptions::default())
//!     .await
//!     .unwrap();
//! assert_eq!(completion.content, r#"{"requirements":[]}"#);
//! # });
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod ollama;

use async_trait::async_trait;
use redyce_domain::traits::CompletionClient;
use redyce_domain::{Completion, CompletionMetadata, CompletionOptions, CompletionRequest};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use config::LlmConfig;
pub use ollama::OllamaProvider;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The provider rejected the call with HTTP 429
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Invalid provider configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Model name reported by [`MockProvider`] unless overridden
pub const MOCK_MODEL: &str = "mock";

#[derive(Debug, Default)]
struct MockState {
    scripted: VecDeque<Result<String, LlmError>>,
    call_count: usize,
    last_request: Option<(CompletionRequest, CompletionOptions)>,
}

/// Mock LLM provider for deterministic testing
///
/// Scripted replies are served first-in first-out; once the script is
/// exhausted every call gets the default response. No network calls are made.
///
/// Token counts are estimated at four characters per token so usage
/// attribution can be exercised in tests.
///
/// # Examples
///
/// ```
/// use redyce_llm::{LlmError, MockProvider};
///
/// let provider = MockProvider::default();
/// provider.push_response("first");
/// provider.push_error(LlmError::RateLimited);
/// assert_eq!(provider.pending(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    model: String,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            model: MOCK_MODEL.to_string(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Report a different model name in completion metadata
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queue a response for the next unscripted call
    pub fn push_response(&self, response: impl Into<String>) {
        self.state().scripted.push_back(Ok(response.into()));
    }

    /// Queue an error for the next unscripted call
    pub fn push_error(&self, error: LlmError) {
        self.state().scripted.push_back(Err(error));
    }

    /// Number of scripted replies not yet consumed
    pub fn pending(&self) -> usize {
        self.state().scripted.len()
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        self.state().call_count
    }

    /// Reset the call count
    pub fn reset_call_count(&self) {
        self.state().call_count = 0;
    }

    /// The most recent request and options, if any call was made
    pub fn last_request(&self) -> Option<(CompletionRequest, CompletionOptions)> {
        self.state().last_request.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(r#"{"requirements":[]}"#)
    }
}

fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

#[async_trait]
impl CompletionClient for MockProvider {
    type Error = LlmError;

    async fn complete(
        &self,
        request: CompletionRequest,
        options: CompletionOptions,
    ) -> Result<Completion, Self::Error> {
        let reply = {
            let mut state = self.state();
            state.call_count += 1;
            state.last_request = Some((request.clone(), options.clone()));
            state
                .scripted
                .pop_front()
                .unwrap_or_else(|| Ok(self.default_response.clone()))
        };

        let content = reply?;
        let prompt_len = request.system.as_deref().map(estimate_tokens).unwrap_or(0)
            + estimate_tokens(&request.user);

        Ok(Completion {
            metadata: CompletionMetadata {
                model: options.model.unwrap_or_else(|| self.model.clone()),
                input_tokens: Some(prompt_len),
                output_tokens: Some(estimate_tokens(&content)),
                finish_reason: Some("stop".to_string()),
            },
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(user: &str) -> CompletionRequest {
        CompletionRequest::new(user).with_system("system")
    }

    #[tokio::test]
    async fn test_mock_provider_default() {
        let provider = MockProvider::new("Test response");
        let result = provider
            .complete(request("any prompt"), CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(result.content, "Test response");
        assert_eq!(result.metadata.model, MOCK_MODEL);
        assert_eq!(result.metadata.finish_reason.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn test_mock_provider_scripted_in_order() {
        let provider = MockProvider::new("fallback");
        provider.push_response("first");
        provider.push_response("second");

        let opts = CompletionOptions::default();
        assert_eq!(provider.complete(request("a"), opts.clone()).await.unwrap().content, "first");
        assert_eq!(provider.complete(request("b"), opts.clone()).await.unwrap().content, "second");
        assert_eq!(provider.complete(request("c"), opts).await.unwrap().content, "fallback");
    }

    #[tokio::test]
    async fn test_mock_provider_error() {
        let provider = MockProvider::default();
        provider.push_error(LlmError::RateLimited);

        let result = provider
            .complete(request("bad prompt"), CompletionOptions::default())
            .await;
        assert!(matches!(result, Err(LlmError::RateLimited)));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_provider_call_count() {
        let provider = MockProvider::new("test");
        assert_eq!(provider.call_count(), 0);

        provider.complete(request("1"), CompletionOptions::default()).await.unwrap();
        provider.complete(request("2"), CompletionOptions::default()).await.unwrap();
        assert_eq!(provider.call_count(), 2);

        provider.reset_call_count();
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_mock_provider_records_last_request() {
        let provider = MockProvider::default();
        let options = CompletionOptions {
            model: Some("custom".to_string()),
            temperature: Some(0.1),
            max_tokens: Some(100),
        };

        let result = provider.complete(request("hello"), options.clone()).await.unwrap();
        assert_eq!(result.metadata.model, "custom");

        let (last, last_options) = provider.last_request().unwrap();
        assert_eq!(last.user, "hello");
        assert_eq!(last.system.as_deref(), Some("system"));
        assert_eq!(last_options, options);
    }

    #[tokio::test]
    async fn test_mock_provider_token_estimates() {
        let provider = MockProvider::new("12345678");
        let result = provider
            .complete(CompletionRequest::new("abcd"), CompletionOptions::default())
            .await
            .unwrap();
        assert_eq!(result.metadata.input_tokens, Some(1));
        assert_eq!(result.metadata.output_tokens, Some(2));
    }

    #[tokio::test]
    async fn test_mock_provider_clone_shares_state() {
        let provider1 = MockProvider::new("test");
        let provider2 = provider1.clone();
        provider2.push_response("scripted");

        let result = provider1
            .complete(request("x"), CompletionOptions::default())
            .await
            .unwrap();

        assert_eq!(result.content, "scripted");
        assert_eq!(provider2.call_count(), 1);
    }
}
