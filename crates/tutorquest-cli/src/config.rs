//! Client configuration at `~/.tutorquest/config.toml`.
//!
//! The `[tutor]` table maps onto the core `TutorConfig`; `[state]` says where
//! learner progress lives. CLI flags always override config file values.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use tutorquest_core::TutorConfig;

/// Environment variable consulted for the generator API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Top-level config file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Tutor engine settings.
    #[serde(default)]
    pub tutor: TutorConfig,

    /// Persistence settings.
    #[serde(default)]
    pub state: StateConfig,
}

/// Where learner state is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// State directory (empty = `~/.tutorquest/state`).
    #[serde(default)]
    pub dir: String,

    /// Learner used when `--learner` is not given.
    #[serde(default = "default_learner")]
    pub learner: String,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            dir: String::new(),
            learner: default_learner(),
        }
    }
}

fn default_learner() -> String {
    "default".to_string()
}

/// `~/.tutorquest`, or `./.tutorquest` when no home directory is known.
pub fn base_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".tutorquest")
}

pub fn default_config_path() -> PathBuf {
    base_dir().join("config.toml")
}

impl Config {
    /// Load configuration from a TOML file, returning defaults if the file
    /// does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;

        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Save the configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("failed to serialize config")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("failed to write config to {}", path.display()))?;

        Ok(())
    }

    /// Fill the generator API key from the environment when it is set.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.tutor.generator.api_key = Some(key);
            }
        }
    }

    /// Effective state directory: CLI override, then config, then default.
    pub fn state_dir(&self, cli_override: Option<&Path>) -> PathBuf {
        if let Some(dir) = cli_override {
            return dir.to_path_buf();
        }
        if self.state.dir.trim().is_empty() {
            base_dir().join("state")
        } else {
            PathBuf::from(&self.state.dir)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutorquest_core::TeachingStyle;

    #[test]
    fn default_config_values() {
        let cfg = Config::default();
        assert_eq!(cfg.state.learner, "default");
        assert!(cfg.state.dir.is_empty());
        assert_eq!(cfg.tutor.xp_per_level, 100);
        assert_eq!(cfg.tutor.generator.model, "gemini-2.5-flash");
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[tutor]
epsilon = 0.3
default_personality = "narrative"

[tutor.generator]
model = "gemini-2.0-flash"
timeout_secs = 20

[state]
dir = "/tmp/tq"
learner = "ada"
"#;
        let cfg: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.tutor.epsilon, 0.3);
        assert_eq!(cfg.tutor.default_personality, TeachingStyle::Narrative);
        assert_eq!(cfg.tutor.generator.model, "gemini-2.0-flash");
        assert_eq!(cfg.tutor.generator.timeout_secs, 20);
        assert_eq!(cfg.tutor.feedback_log_cap, 50); // default
        assert_eq!(cfg.state.learner, "ada");
        assert_eq!(cfg.state_dir(None), PathBuf::from("/tmp/tq"));
    }

    #[test]
    fn parse_partial_toml_config() {
        let cfg: Config = toml::from_str("[state]\nlearner = \"grace\"\n").unwrap();
        assert_eq!(cfg.state.learner, "grace");
        assert_eq!(cfg.tutor.epsilon, 0.15);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.state.learner, "default");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.state.learner = "ada".to_string();
        cfg.tutor.epsilon = 0.05;
        cfg.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.state.learner, "ada");
        assert_eq!(loaded.tutor.epsilon, 0.05);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[tutor\nepsilon = ").unwrap();
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn cli_state_dir_overrides_config() {
        let mut cfg = Config::default();
        cfg.state.dir = "/from/config".to_string();
        assert_eq!(
            cfg.state_dir(Some(Path::new("/from/flag"))),
            PathBuf::from("/from/flag")
        );
    }
}
