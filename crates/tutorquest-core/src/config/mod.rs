use serde::{Deserialize, Serialize};

use crate::bandit::{AUTO_HISTORY_CAP, DEFAULT_EPSILON, FEEDBACK_HISTORY_CAP};
use crate::classifier::TeachingStyle;
use crate::providers::ChatOptions;

pub const DEFAULT_FALLBACK_MESSAGE: &str =
    "I'm having trouble connecting right now. Please try again in a moment.";

/// Tutor engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorConfig {
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    #[serde(default = "default_auto_history_cap")]
    pub auto_history_cap: usize,

    #[serde(default = "default_feedback_history_cap")]
    pub feedback_history_cap: usize,

    /// Thumbs records kept in the persisted feedback log.
    #[serde(default = "default_feedback_log_cap")]
    pub feedback_log_cap: usize,

    #[serde(default = "default_xp_per_level")]
    pub xp_per_level: u32,

    #[serde(default)]
    pub default_personality: TeachingStyle,

    /// Shown to the learner when the generator fails.
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,

    /// Transcript messages sent to the generator with each request.
    #[serde(default = "default_transcript_window")]
    pub transcript_window: usize,

    #[serde(default = "default_event_history_limit")]
    pub event_history_limit: usize,

    #[serde(default)]
    pub generator: GeneratorConfig,
}

fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}

fn default_auto_history_cap() -> usize {
    AUTO_HISTORY_CAP
}

fn default_feedback_history_cap() -> usize {
    FEEDBACK_HISTORY_CAP
}

fn default_feedback_log_cap() -> usize {
    50
}

fn default_xp_per_level() -> u32 {
    100
}

fn default_fallback_message() -> String {
    DEFAULT_FALLBACK_MESSAGE.to_string()
}

fn default_transcript_window() -> usize {
    20
}

fn default_event_history_limit() -> usize {
    200
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            epsilon: default_epsilon(),
            auto_history_cap: default_auto_history_cap(),
            feedback_history_cap: default_feedback_history_cap(),
            feedback_log_cap: default_feedback_log_cap(),
            xp_per_level: default_xp_per_level(),
            default_personality: TeachingStyle::default(),
            fallback_message: default_fallback_message(),
            transcript_window: default_transcript_window(),
            event_history_limit: default_event_history_limit(),
            generator: GeneratorConfig::default(),
        }
    }
}

impl TutorConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(ConfigError::ValidationError(format!(
                "epsilon must be within [0, 1], got {}",
                self.epsilon
            )));
        }
        if self.auto_history_cap == 0 || self.feedback_history_cap == 0 {
            return Err(ConfigError::ValidationError(
                "history caps must be > 0".to_string(),
            ));
        }
        if self.feedback_log_cap == 0 {
            return Err(ConfigError::ValidationError(
                "feedback_log_cap must be > 0".to_string(),
            ));
        }
        if self.xp_per_level == 0 {
            return Err(ConfigError::ValidationError(
                "xp_per_level must be > 0".to_string(),
            ));
        }
        if self.fallback_message.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "fallback_message cannot be empty".to_string(),
            ));
        }
        self.generator.validate()
    }
}

/// Text generator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    2
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            api_key: None,
            base_url: None,
        }
    }
}

impl GeneratorConfig {
    pub fn chat_options(&self) -> ChatOptions {
        ChatOptions {
            model: self.model.clone(),
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "generator.model cannot be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "generator.timeout_secs must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Errors from configuration operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    ParseError(String),
    #[error("config serialize error: {0}")]
    SerializeError(String),
    #[error("config validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TutorConfig::default();
        assert!((config.epsilon - 0.15).abs() < f64::EPSILON);
        assert_eq!(config.auto_history_cap, 20);
        assert_eq!(config.feedback_history_cap, 30);
        assert_eq!(config.feedback_log_cap, 50);
        assert_eq!(config.xp_per_level, 100);
        assert_eq!(config.default_personality, TeachingStyle::Socratic);
        assert_eq!(config.generator.model, "gemini-2.5-flash");
        assert_eq!(config.generator.timeout_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config =
            TutorConfig::from_json(r#"{"epsilon": 0.0, "default_personality": "Narrative"}"#).unwrap();
        assert_eq!(config.epsilon, 0.0);
        assert_eq!(config.default_personality, TeachingStyle::Narrative);
        assert_eq!(config.auto_history_cap, 20);
        assert_eq!(config.generator.max_retries, 2);
    }

    #[test]
    fn test_roundtrip() {
        let config = TutorConfig::default().with_epsilon(0.3);
        let json = config.to_json().unwrap();
        assert!(!json.contains("api_key"));
        let parsed = TutorConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_validation_failures() {
        assert!(TutorConfig::default().with_epsilon(1.5).validate().is_err());

        let mut config = TutorConfig::default();
        config.auto_history_cap = 0;
        assert!(config.validate().is_err());

        let mut config = TutorConfig::default();
        config.xp_per_level = 0;
        assert!(config.validate().is_err());

        let mut config = TutorConfig::default();
        config.fallback_message = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = TutorConfig::default();
        config.generator.model.clear();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            TutorConfig::from_json("not json"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_chat_options() {
        let options = GeneratorConfig::default().chat_options();
        assert_eq!(options.model, "gemini-2.5-flash");
        assert_eq!(options.max_tokens, Some(1024));
    }
}
