//! CLI subcommand implementations.

pub mod chat;
pub mod daily;
pub mod feedback;
pub mod init;
pub mod reset;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tutorquest_core::events::Notification;
use tutorquest_core::{ActionOutcome, Catalog, Tutor, TurnOutcome};

use crate::config::Config;
use crate::gemini::GeminiProvider;
use crate::store::{validate_learner, FileStore};

/// Resolved settings shared by every subcommand.
pub struct Context {
    pub config: Config,
    pub config_path: PathBuf,
    pub learner: String,
    pub state_dir: PathBuf,
}

impl Context {
    pub fn store(&self) -> FileStore {
        FileStore::new(&self.state_dir)
    }

    /// Load the learner's session with the HTTP generator attached.
    pub fn open_tutor(&self) -> Result<Tutor> {
        validate_learner(&self.learner).map_err(|e| anyhow::anyhow!("{e}"))?;
        let provider = GeminiProvider::reliable(&self.config.tutor.generator)
            .map_err(|e| anyhow::anyhow!("{e}"))
            .context("failed to build generator client")?;
        let tutor = Tutor::load(
            self.learner.clone(),
            Catalog::builtin(),
            self.config.tutor.clone(),
            Box::new(provider),
            Box::new(self.store()),
        )
        .context("failed to start tutor session")?;

        let report = tutor.load_report();
        if let Some(err) = &report.read_error {
            eprintln!("warning: saved progress could not be read ({err}); starting fresh");
        } else if !report.is_clean() {
            eprintln!("warning: saved progress was partially recovered");
        }
        Ok(tutor)
    }
}

/// Current wall-clock time in unix seconds.
pub fn now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

pub fn describe(notification: &Notification) -> String {
    match notification {
        Notification::SubtopicUnlocked { subtopic } => format!("Unlocked: {subtopic}"),
        Notification::SubtopicMastered { subtopic } => format!("Mastered: {subtopic}"),
        Notification::EpisodeMastered { episode, .. } => format!("Episode {episode} complete"),
        Notification::XpAwarded { amount, reason } => format!("+{amount} XP ({reason})"),
        Notification::LevelUp { level } => format!("Level up! You reached level {level}"),
        Notification::PersonalityChanged { personality } => {
            format!("Teaching style: {personality}")
        }
        Notification::StateSaveFailed { error } => format!("Progress not saved: {error}"),
        Notification::GeneratorFallback { .. } => "Tutor temporarily unavailable".to_string(),
    }
}

pub fn print_action(outcome: &ActionOutcome) {
    for n in &outcome.notifications {
        println!("  * {}", describe(n));
    }
    for w in &outcome.warnings {
        eprintln!("warning: {w}");
    }
}

pub fn print_turn(outcome: &TurnOutcome) {
    if let Some(verdict) = &outcome.verdict {
        if !verdict.accepted {
            println!("  ({})", verdict.reason);
        }
    }
    println!("\n{}\n", outcome.reply);
    if let Some(label) = outcome.awaiting_label {
        println!("  [awaiting answer: {label}]");
    }
    for n in &outcome.notifications {
        if !matches!(n, Notification::GeneratorFallback { .. }) {
            println!("  * {}", describe(n));
        }
    }
    for d in &outcome.diagnostics {
        tracing::debug!(diagnostic = %d, "turn diagnostic");
    }
    for w in &outcome.warnings {
        eprintln!("warning: {w}");
    }
}
