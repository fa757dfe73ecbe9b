//! Gemini `generateContent` client over blocking HTTP.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;
use tutorquest_core::providers::Role;
use tutorquest_core::{
    ChatMessage, ChatOptions, ChatResponse, GeneratorConfig, Provider, ProviderError,
    ReliableProvider,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini text generator.
///
/// Without an API key every request fails with `NotConfigured`, which the
/// tutor turns into its fallback reply.
pub struct GeminiProvider {
    client: reqwest::blocking::Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(config: &GeneratorConfig) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::NotConfigured(e.to_string()))?;
        Ok(Self {
            client,
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }

    /// Wrap in the retry layer configured by `max_retries`.
    pub fn reliable(config: &GeneratorConfig) -> Result<ReliableProvider, ProviderError> {
        let provider = Self::new(config)?;
        Ok(ReliableProvider::new(Box::new(provider)).with_retries(config.max_retries.max(1)))
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content<'a>>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

fn build_request<'a>(messages: &'a [ChatMessage], options: &ChatOptions) -> GenerateRequest<'a> {
    let mut system = Vec::new();
    let mut contents = Vec::new();
    for message in messages {
        match message.role {
            Role::System => system.push(Part { text: &message.content }),
            Role::User => contents.push(Content {
                role: Some("user"),
                parts: vec![Part { text: &message.content }],
            }),
            Role::Assistant => contents.push(Content {
                role: Some("model"),
                parts: vec![Part { text: &message.content }],
            }),
        }
    }
    GenerateRequest {
        system_instruction: (!system.is_empty()).then_some(Content {
            role: None,
            parts: system,
        }),
        contents,
        generation_config: GenerationConfig {
            temperature: options.temperature,
            max_output_tokens: options.max_tokens,
        },
    }
}

fn extract_text(response: GenerateResponse) -> Result<String, ProviderError> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    if text.trim().is_empty() {
        Err(ProviderError::EmptyResponse)
    } else {
        Ok(text)
    }
}

fn map_status(status: reqwest::StatusCode, body: &str) -> ProviderError {
    match status.as_u16() {
        429 => ProviderError::RateLimited,
        401 | 403 => ProviderError::AuthenticationFailed,
        408 | 504 => ProviderError::Timeout,
        _ => ProviderError::RequestFailed(format!("{status}: {}", truncate(body, 200))),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((i, _)) => &s[..i],
        None => s,
    }
}

impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn chat(
        &self,
        messages: &[ChatMessage],
        options: &ChatOptions,
    ) -> Result<ChatResponse, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ProviderError::NotConfigured("GEMINI_API_KEY is not set".to_string()))?;

        let request = build_request(messages, options);
        debug!(model = %options.model, messages = messages.len(), "sending generateContent");

        let response = self
            .client
            .post(self.endpoint(&options.model))
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout
            } else {
                ProviderError::InvalidResponse(e.to_string())
            }
        })?;
        if !status.is_success() {
            return Err(map_status(status, &body));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        Ok(ChatResponse {
            content: extract_text(parsed)?,
            model: options.model.clone(),
        })
    }
}
