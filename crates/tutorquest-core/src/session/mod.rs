//! Typed per-learner session state and its whole-blob persistence format.

use std::collections::VecDeque;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

use crate::bandit::{BanditController, HintPolicy, Selections};
use crate::catalog::Catalog;
use crate::classifier::{QuestionKind, TeachingStyle};
use crate::config::TutorConfig;
use crate::progress::{ProgressError, ProgressTracker};
use crate::progression::Progression;
use crate::providers::{ChatMessage, Role};
use crate::reward::Thumb;

pub const DEFAULT_TOPIC: &str = "General Tutoring";
const TOPIC_MAX_WORDS: usize = 8;
const BLOB_VERSION: u32 = 1;

/// Annotations attached to a transcript message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageMeta {
    /// Question posed by this tutor message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_kind: Option<QuestionKind>,
    /// Question this learner message answered acceptably.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answered: Option<QuestionKind>,
    #[serde(default)]
    pub xp_awarded: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personality: Option<TeachingStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint_policy: Option<HintPolicy>,
    /// Set when the text is the fallback substituted for a failed generator call.
    #[serde(default)]
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: Role,
    pub content: String,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default)]
    pub meta: MessageMeta,
}

impl TranscriptMessage {
    pub fn user(content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp,
            meta: MessageMeta::default(),
        }
    }

    pub fn assistant(content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp,
            meta: MessageMeta::default(),
        }
    }

    pub fn to_chat_message(&self) -> ChatMessage {
        ChatMessage {
            role: self.role,
            content: self.content.clone(),
        }
    }
}

/// The question currently awaiting an answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionTurn {
    pub kind: QuestionKind,
    pub style: TeachingStyle,
    pub selections: Selections,
    pub posed_at: i64,
    pub attempts: u32,
    pub hint_given: bool,
}

impl InteractionTurn {
    pub fn new(kind: QuestionKind, style: TeachingStyle, selections: Selections, posed_at: i64) -> Self {
        Self {
            kind,
            style,
            selections,
            posed_at,
            attempts: 1,
            hint_given: false,
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Seconds between posing and `now`, never negative.
    pub fn response_time(&self, now: i64) -> f64 {
        (now - self.posed_at).max(0) as f64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub message_index: usize,
    pub thumb: Thumb,
    pub personality: TeachingStyle,
    pub hint_policy: HintPolicy,
    pub timestamp: i64,
}

/// Up/down totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThumbCounts {
    pub up: usize,
    pub down: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FeedbackStats {
    pub total: ThumbCounts,
    pub by_personality: Vec<(TeachingStyle, ThumbCounts)>,
}

/// Append-only thumbs log keeping the most recent `cap` records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackLog {
    cap: usize,
    records: VecDeque<FeedbackRecord>,
}

impl FeedbackLog {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            records: VecDeque::new(),
        }
    }

    pub fn push(&mut self, record: FeedbackRecord) {
        self.records.push_back(record);
        while self.records.len() > self.cap {
            self.records.pop_front();
        }
    }

    pub fn records(&self) -> &VecDeque<FeedbackRecord> {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap;
        while self.records.len() > self.cap {
            self.records.pop_front();
        }
    }

    pub fn stats(&self) -> FeedbackStats {
        let mut stats = FeedbackStats {
            total: ThumbCounts::default(),
            by_personality: TeachingStyle::ALL
                .iter()
                .map(|&s| (s, ThumbCounts::default()))
                .collect(),
        };
        for record in &self.records {
            let slot = stats
                .by_personality
                .iter_mut()
                .find(|(s, _)| *s == record.personality)
                .map(|(_, c)| c);
            for counts in [Some(&mut stats.total), slot].into_iter().flatten() {
                match record.thumb {
                    Thumb::Up => counts.up += 1,
                    Thumb::Down => counts.down += 1,
                }
            }
        }
        stats
    }
}

/// Counts derived from the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LearnerStats {
    pub learner_messages: usize,
    pub mini_answered: usize,
    pub quiz_answered: usize,
}

/// Which persisted fields had to fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// The store could not be read; everything was defaulted.
    pub read_error: Option<String>,
    /// The blob was not a JSON object; everything was defaulted.
    pub corrupt: bool,
    pub missing: Vec<String>,
    pub recovered: Vec<String>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.read_error.is_none() && !self.corrupt && self.missing.is_empty() && self.recovered.is_empty()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("state serialize error: {0}")]
    SerializeError(String),
    #[error(transparent)]
    Progress(#[from] ProgressError),
}

/// Everything persisted for one learner.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub progression: Progression,
    pub progress: ProgressTracker,
    pub personality: TeachingStyle,
    pub bandit: BanditController,
    pub selections: Selections,
    pub feedback: FeedbackLog,
    pub transcript: Vec<TranscriptMessage>,
    pub pending: Option<InteractionTurn>,
    pub current_topic: String,
    pub intro_sent: bool,
}

impl SessionState {
    /// Defaults derived from the catalog and config.
    pub fn new(catalog: &Catalog, config: &TutorConfig) -> Result<Self, SessionError> {
        Ok(Self {
            progression: Progression::default(),
            progress: ProgressTracker::new(catalog)?,
            personality: config.default_personality,
            bandit: BanditController::new(
                config.epsilon,
                config.auto_history_cap,
                config.feedback_history_cap,
            ),
            selections: Selections::default(),
            feedback: FeedbackLog::new(config.feedback_log_cap),
            transcript: Vec::new(),
            pending: None,
            current_topic: DEFAULT_TOPIC.to_string(),
            intro_sent: false,
        })
    }

    /// Clear the conversation while keeping progress, XP and bandit histories.
    pub fn reset_conversation(&mut self) {
        self.transcript.clear();
        self.pending = None;
        self.current_topic = DEFAULT_TOPIC.to_string();
        self.intro_sent = false;
    }

    pub fn learner_stats(&self) -> LearnerStats {
        let mut stats = LearnerStats::default();
        for message in &self.transcript {
            if message.role != Role::User {
                continue;
            }
            stats.learner_messages += 1;
            match message.meta.answered {
                Some(QuestionKind::Mini) => stats.mini_answered += 1,
                Some(QuestionKind::Quiz) => stats.quiz_answered += 1,
                None => {}
            }
        }
        stats
    }

    pub fn to_blob(&self) -> Result<String, SessionError> {
        let mut map = Map::new();
        put(&mut map, "version", &BLOB_VERSION)?;
        put(&mut map, "xp", &self.progression.xp)?;
        put(&mut map, "level", &self.progression.level)?;
        put(&mut map, "progress", &self.progress)?;
        put(&mut map, "personality", &self.personality)?;
        put(&mut map, "bandit", &self.bandit)?;
        put(&mut map, "selections", &self.selections)?;
        put(&mut map, "feedback", &self.feedback)?;
        put(&mut map, "transcript", &self.transcript)?;
        put(&mut map, "pending", &self.pending)?;
        put(&mut map, "current_topic", &self.current_topic)?;
        put(&mut map, "intro_sent", &self.intro_sent)?;
        serde_json::to_string(&Value::Object(map))
            .map_err(|e| SessionError::SerializeError(e.to_string()))
    }

    /// Load a persisted blob, defaulting every field that is missing or
    /// unreadable. Never fails on bad data; only an empty catalog is an error.
    pub fn from_blob(
        blob: &str,
        catalog: &Catalog,
        config: &TutorConfig,
    ) -> Result<(Self, LoadReport), SessionError> {
        let mut state = Self::new(catalog, config)?;
        let mut report = LoadReport::default();

        let map = match serde_json::from_str::<Value>(blob) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warn!("persisted state is not an object; starting fresh");
                report.corrupt = true;
                return Ok((state, report));
            }
            Err(e) => {
                warn!(error = %e, "persisted state is not valid JSON; starting fresh");
                report.corrupt = true;
                return Ok((state, report));
            }
        };

        let xp = field::<u32>(&map, "xp", &mut report).unwrap_or(0);
        let level = field::<u32>(&map, "level", &mut report).unwrap_or(1);
        state.progression = Progression::restore(xp, level, config.xp_per_level);

        if let Some(progress) = field::<ProgressTracker>(&map, "progress", &mut report) {
            state.progress = progress;
        }
        state.progress.reconcile(catalog);

        if let Some(personality) = field(&map, "personality", &mut report) {
            state.personality = personality;
        }
        if let Some(bandit) = field::<BanditController>(&map, "bandit", &mut report) {
            state.bandit = bandit;
        }
        state.bandit.reconcile(
            config.epsilon,
            config.auto_history_cap,
            config.feedback_history_cap,
        );
        if let Some(selections) = field(&map, "selections", &mut report) {
            state.selections = selections;
        }
        if let Some(feedback) = field::<FeedbackLog>(&map, "feedback", &mut report) {
            state.feedback = feedback;
        }
        state.feedback.set_cap(config.feedback_log_cap);

        state.transcript = transcript_field(&map, &mut report);

        if let Some(pending) = field(&map, "pending", &mut report) {
            state.pending = pending;
        }
        if let Some(topic) = field::<String>(&map, "current_topic", &mut report) {
            if !topic.trim().is_empty() {
                state.current_topic = topic;
            }
        }
        if let Some(intro_sent) = field(&map, "intro_sent", &mut report) {
            state.intro_sent = intro_sent;
        }

        Ok((state, report))
    }
}

/// Topic label for a free-text message: at most 8 words, `...` when cut.
pub fn topic_label(input: &str) -> String {
    let words: Vec<&str> = input.split_whitespace().collect();
    if words.is_empty() {
        return DEFAULT_TOPIC.to_string();
    }
    let mut label = words[..words.len().min(TOPIC_MAX_WORDS)].join(" ");
    if words.len() > TOPIC_MAX_WORDS {
        label.push_str("...");
    }
    label
}

fn put<T: Serialize>(map: &mut Map<String, Value>, key: &str, value: &T) -> Result<(), SessionError> {
    let value =
        serde_json::to_value(value).map_err(|e| SessionError::SerializeError(format!("{key}: {e}")))?;
    map.insert(key.to_string(), value);
    Ok(())
}

fn field<T: DeserializeOwned>(
    map: &Map<String, Value>,
    key: &str,
    report: &mut LoadReport,
) -> Option<T> {
    let Some(value) = map.get(key) else {
        report.missing.push(key.to_string());
        return None;
    };
    match serde_json::from_value(value.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(field = key, error = %e, "discarding unreadable state field");
            report.recovered.push(key.to_string());
            None
        }
    }
}

/// Transcript messages are recovered one by one so a single bad entry
/// does not cost the whole conversation.
fn transcript_field(map: &Map<String, Value>, report: &mut LoadReport) -> Vec<TranscriptMessage> {
    let items = match map.get("transcript") {
        None => {
            report.missing.push("transcript".to_string());
            return Vec::new();
        }
        Some(Value::Array(items)) => items,
        Some(_) => {
            warn!(field = "transcript", "transcript is not a list; discarding");
            report.recovered.push("transcript".to_string());
            return Vec::new();
        }
    };
    let mut messages = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match serde_json::from_value::<TranscriptMessage>(item.clone()) {
            Ok(m) => messages.push(m),
            Err(e) => {
                warn!(index = i, error = %e, "dropping unreadable transcript message");
                report.recovered.push(format!("transcript[{i}]"));
            }
        }
    }
    messages
}
