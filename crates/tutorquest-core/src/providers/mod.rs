mod mock;

pub use mock::MockProvider;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Role in a chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message sent to the text generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Response from the text generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,
    pub model: String,
}

impl ChatResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            model: "unknown".to_string(),
        }
    }
}

/// Options for a generation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatOptions {
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            model: "default".to_string(),
            temperature: Some(0.7),
            max_tokens: None,
        }
    }
}

/// External text-generation collaborator.
///
/// Calls are blocking; the orchestrator processes one turn at a time.
pub trait Provider {
    fn name(&self) -> &str;

    /// Generate a reply from an instruction payload plus conversation history.
    /// `messages[0]` is the system instruction when present.
    fn chat(&self, messages: &[ChatMessage], options: &ChatOptions)
        -> Result<ChatResponse, ProviderError>;
}

/// Shared handles forward to the inner provider.
impl<P: Provider + ?Sized> Provider for std::rc::Rc<P> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<ChatResponse, ProviderError> {
        (**self).chat(messages, options)
    }
}

/// Errors from provider operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("provider request failed: {0}")]
    RequestFailed(String),
    #[error("provider returned invalid response: {0}")]
    InvalidResponse(String),
    #[error("provider returned an empty response")]
    EmptyResponse,
    #[error("provider rate limited")]
    RateLimited,
    #[error("provider authentication failed")]
    AuthenticationFailed,
    #[error("provider not configured: {0}")]
    NotConfigured(String),
    #[error("provider timeout")]
    Timeout,
}

impl ProviderError {
    /// Transient failures worth retrying against the same provider.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::RateLimited | ProviderError::Timeout)
    }
}

/// Reliability wrapper that provides retry and fallback logic.
pub struct ReliableProvider {
    pub primary: Box<dyn Provider>,
    pub fallbacks: Vec<Box<dyn Provider>>,
    pub max_retries: u32,
}

impl ReliableProvider {
    pub fn new(primary: Box<dyn Provider>) -> Self {
        Self {
            primary,
            fallbacks: Vec::new(),
            max_retries: 3,
        }
    }

    pub fn with_fallback(mut self, provider: Box<dyn Provider>) -> Self {
        self.fallbacks.push(provider);
        self
    }

    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

impl Provider for ReliableProvider {
    fn name(&self) -> &str {
        self.primary.name()
    }

    fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<ChatResponse, ProviderError> {
        let mut last_err = None;
        for attempt in 0..self.max_retries.max(1) {
            match self.primary.chat(messages, options) {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() => {
                    debug!(provider = self.primary.name(), attempt, error = %e, "retrying");
                    last_err = Some(e);
                }
                Err(e) => {
                    last_err = Some(e);
                    break;
                }
            }
        }

        for fallback in &self.fallbacks {
            match fallback.chat(messages, options) {
                Ok(response) => {
                    warn!(provider = fallback.name(), "served by fallback provider");
                    return Ok(response);
                }
                Err(e) => last_err = Some(e),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            ProviderError::RequestFailed("all providers failed".to_string())
        }))
    }
}
