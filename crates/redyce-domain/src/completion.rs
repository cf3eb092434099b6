//! Request and response types for the text-completion collaborator

/// A prompt for the completion service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// Optional system instruction
    pub system: Option<String>,
    /// User message
    pub user: String,
}

impl CompletionRequest {
    /// Create a request with only a user message
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            system: None,
            user: user.into(),
        }
    }

    /// Attach a system instruction
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Per-call generation options; `None` means provider default
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionOptions {
    /// Model override
    pub model: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Cap on generated tokens
    pub max_tokens: Option<u32>,
}

/// Metadata reported alongside generated text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionMetadata {
    /// Model that served the request
    pub model: String,
    /// Prompt tokens
    pub input_tokens: Option<u64>,
    /// Generated tokens
    pub output_tokens: Option<u64>,
    /// Why generation stopped (`stop`, `length`, ...)
    pub finish_reason: Option<String>,
}

/// Generated text plus usage metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Generated text
    pub content: String,
    /// Usage metadata
    pub metadata: CompletionMetadata,
}
