//! Turn-by-turn control flow tying progress, classification, rewards, and
//! the teaching policy to the text generator.
//!
//! One turn runs synchronously to completion. Generator and persistence
//! failures are absorbed here and reported through [`TurnOutcome`]; they
//! never fail the turn.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::bandit::{Arm, BanditError, HintPolicy, SelectionContext};
use crate::catalog::{Catalog, CatalogError};
use crate::classifier::{check_answer_quality, is_dont_know, QuestionKind, TeachingStyle, Verdict};
use crate::config::{ConfigError, TutorConfig};
use crate::events::{EventBus, Notification, TutorEvent};
use crate::markers::{parse_reply, ParsedReply};
use crate::progress::{MasteryOutcome, ProgressError, SubtopicStatus};
use crate::progression::{level_progress, Badge, DailyAction};
use crate::prompts::{awaiting_answer_label, build_instructions, intro_prompt, quick_starts};
use crate::providers::{ChatMessage, Provider, ProviderError};
use crate::reward::{
    hint_effectiveness_reward, question_depth_reward, quiz_difficulty_reward,
    user_feedback_reward, Thumb,
};
use crate::session::{
    topic_label, FeedbackRecord, FeedbackStats, InteractionTurn, LearnerStats, LoadReport,
    SessionError, SessionState, TranscriptMessage,
};
use crate::store::StateStore;

/// Errors surfaced to the caller. Learner turns themselves never fail.
#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Bandit(#[from] BanditError),
    #[error("no tutor message at index {0}")]
    InvalidFeedbackTarget(usize),
    #[error("no quick start at index {0}")]
    UnknownQuickStart(usize),
}

/// What one learner turn produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnOutcome {
    /// Text to show the learner, markers already stripped.
    pub reply: String,
    /// Question the reply poses, now awaiting an answer.
    pub question: Option<QuestionKind>,
    pub awaiting_label: Option<&'static str>,
    /// Classification of the learner's answer, when one was pending.
    pub verdict: Option<Verdict>,
    pub xp_awarded: u32,
    pub notifications: Vec<Notification>,
    /// The reply is the configured fallback text.
    pub fallback: bool,
    /// Operator-facing detail, not meant for the learner.
    pub diagnostics: Vec<String>,
    /// Non-blocking problems the learner may want to know about.
    pub warnings: Vec<String>,
}

/// Result of a non-conversational action.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionOutcome {
    pub notifications: Vec<Notification>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TutorStats {
    pub xp: u32,
    pub level: u32,
    pub level_progress: f64,
    pub xp_to_next_level: u32,
    pub badges: Vec<Badge>,
    pub personality: TeachingStyle,
    pub current_topic: String,
    pub current_subtopic: String,
    pub subtopic_status: SubtopicStatus,
    pub awaiting: Option<&'static str>,
    pub learner: LearnerStats,
    pub feedback: FeedbackStats,
    pub personality_satisfaction: Vec<(TeachingStyle, Option<f64>)>,
}

/// Collects notifications and warnings while an operation runs.
#[derive(Default)]
struct Sink {
    notifications: Vec<Notification>,
    warnings: Vec<String>,
}

impl Sink {
    fn finish(self) -> ActionOutcome {
        ActionOutcome {
            notifications: self.notifications,
            warnings: self.warnings,
        }
    }
}

/// Adaptive tutor session for one learner.
pub struct Tutor {
    learner: String,
    catalog: Catalog,
    config: TutorConfig,
    provider: Box<dyn Provider>,
    store: Box<dyn StateStore>,
    rng: StdRng,
    events: EventBus,
    state: SessionState,
    load_report: LoadReport,
}

impl Tutor {
    /// Read the learner's state once and build a session around it.
    ///
    /// Missing or unreadable state falls back to catalog defaults; only an
    /// invalid catalog or config is an error.
    pub fn load(
        learner: impl Into<String>,
        catalog: Catalog,
        config: TutorConfig,
        provider: Box<dyn Provider>,
        store: Box<dyn StateStore>,
    ) -> Result<Self, TutorError> {
        catalog.validate()?;
        config.validate()?;
        let learner = learner.into();

        let (state, load_report) = match store.load(&learner) {
            Ok(Some(blob)) => SessionState::from_blob(&blob, &catalog, &config)?,
            Ok(None) => (SessionState::new(&catalog, &config)?, LoadReport::default()),
            Err(e) => {
                warn!(learner = %learner, error = %e, "could not read saved state; starting fresh");
                let report = LoadReport {
                    read_error: Some(e.to_string()),
                    ..LoadReport::default()
                };
                (SessionState::new(&catalog, &config)?, report)
            }
        };
        if !load_report.is_clean() {
            warn!(
                learner = %learner,
                missing = ?load_report.missing,
                recovered = ?load_report.recovered,
                corrupt = load_report.corrupt,
                "saved state partially recovered"
            );
        }
        info!(
            learner = %learner,
            xp = state.progression.xp,
            level = state.progression.level,
            subtopic = state.progress.current_subtopic(),
            "session loaded"
        );

        Ok(Self {
            learner,
            events: EventBus::new(config.event_history_limit),
            catalog,
            config,
            provider,
            store,
            rng: StdRng::from_entropy(),
            state,
            load_report,
        })
    }

    /// Replace the exploration RNG, for reproducible sessions.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(StdRng::seed_from_u64(seed))
    }

    pub fn learner(&self) -> &str {
        &self.learner
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &TutorConfig {
        &self.config
    }

    pub fn load_report(&self) -> &LoadReport {
        &self.load_report
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    pub fn store(&self) -> &dyn StateStore {
        self.store.as_ref()
    }

    /// XP label for the pending question, if any.
    pub fn awaiting_answer(&self) -> Option<&'static str> {
        self.state
            .pending
            .map(|turn| awaiting_answer_label(turn.kind, turn.style))
    }

    /// Send the per-style welcome once per conversation.
    ///
    /// Returns `None` when nothing was sent.
    pub fn ensure_intro(&mut self, now: i64) -> Option<TurnOutcome> {
        if self.state.intro_sent {
            return None;
        }
        let mut sink = Sink::default();
        if !self.state.transcript.is_empty() {
            self.state.intro_sent = true;
            self.persist(now, &mut sink);
            return None;
        }

        let prompt = intro_prompt(self.state.personality);
        let mut outcome = TurnOutcome::default();
        match self.generate(Some(prompt)) {
            Ok(raw) => {
                let parsed = parse_reply(&raw);
                self.apply_signals(&parsed, now, &mut sink);
                self.record_reply(parsed, None, false, now, &mut outcome);
                self.state.intro_sent = true;
                self.persist(now, &mut sink);
            }
            Err(e) => {
                // Leave the intro unsent so the next call retries it.
                self.fallback(&e, now, &mut outcome, &mut sink);
            }
        }
        outcome.notifications = sink.notifications;
        outcome.warnings = sink.warnings;
        Some(outcome)
    }

    /// Process one learner message.
    pub fn handle_turn(&mut self, input: &str, now: i64) -> TurnOutcome {
        self.run_turn(input, None, now)
    }

    /// Send quick start `index` for the current style, using its label as topic.
    pub fn start_quick_start(&mut self, index: usize, now: i64) -> Result<TurnOutcome, TutorError> {
        let (label, prompt) = quick_starts(self.state.personality)
            .get(index)
            .copied()
            .ok_or(TutorError::UnknownQuickStart(index))?;
        Ok(self.run_turn(prompt, Some(label), now))
    }

    /// Rewards are recorded in memory as the answer is scored; the whole
    /// turn is persisted once, at its end.
    fn run_turn(&mut self, input: &str, topic: Option<&str>, now: i64) -> TurnOutcome {
        let input = input.trim();
        let mut outcome = TurnOutcome::default();
        let mut sink = Sink::default();
        let style = self.state.personality;
        let mut user_message = TranscriptMessage::user(input, now);
        let mut retry: Option<(QuestionKind, u32)> = None;

        match self.state.pending.take() {
            Some(turn) => {
                let verdict = self.score_answer(&turn, input, now);
                if verdict.accepted {
                    user_message.meta.answered = Some(turn.kind);
                    user_message.meta.xp_awarded = verdict.reward_xp;
                    user_message.meta.reason = Some(verdict.reason.to_string());
                    user_message.meta.personality = Some(turn.style);
                    if verdict.reward_xp > 0 {
                        self.award_xp(verdict.reward_xp, verdict.reason, now, &mut sink);
                        outcome.xp_awarded = verdict.reward_xp;
                    }
                    if turn.kind == QuestionKind::Quiz {
                        if let Some(step) = self.state.progress.advance_active_point() {
                            debug!(subtopic = %step.subtopic, point = step.index, "quiz passed");
                        }
                    }
                } else {
                    retry = Some((turn.kind, turn.attempts));
                }
                outcome.verdict = Some(verdict);
            }
            None => {
                self.state.current_topic = match topic {
                    Some(label) => label.to_string(),
                    None => topic_label(input),
                };
            }
        }
        let learner_asked_hint = input.to_lowercase().contains("hint");
        self.state.transcript.push(user_message);

        if style != TeachingStyle::Narrative {
            self.state
                .progress
                .update_learning_point_progress(&self.catalog, &self.state.transcript);
            self.state
                .progress
                .check_learning_point_understanding(&self.state.transcript);
        }
        self.master_if_complete(now, &mut sink);

        match self.generate(None) {
            Ok(raw) => {
                let parsed = parse_reply(&raw);
                self.apply_signals(&parsed, now, &mut sink);
                self.record_reply(parsed, retry, learner_asked_hint, now, &mut outcome);
            }
            Err(e) => {
                self.fallback(&e, now, &mut outcome, &mut sink);
                let mut message = TranscriptMessage::assistant(outcome.reply.clone(), now);
                message.meta.personality = Some(style);
                message.meta.hint_policy = Some(self.state.selections.hint_policy);
                message.meta.fallback = true;
                self.state.transcript.push(message);
            }
        }

        self.persist(now, &mut sink);
        outcome.notifications = sink.notifications;
        outcome.warnings = sink.warnings;
        outcome
    }

    /// Append a tutor reply to the transcript. A reply that poses a question
    /// opens the pending turn; `retry` carries the kind and attempt count of a
    /// just-rejected answer.
    fn record_reply(
        &mut self,
        parsed: ParsedReply,
        retry: Option<(QuestionKind, u32)>,
        learner_asked_hint: bool,
        now: i64,
        outcome: &mut TurnOutcome,
    ) {
        let style = self.state.personality;
        let question = parsed.question_kind();
        if let Some(kind) = question {
            let attempts = match retry {
                Some((previous, attempts)) if previous == kind => attempts + 1,
                _ => 1,
            };
            let hint_given = learner_asked_hint || parsed.text.to_lowercase().contains("hint");
            self.state.pending = Some(InteractionTurn {
                hint_given,
                ..InteractionTurn::new(kind, style, self.state.selections, now)
                    .with_attempts(attempts)
            });
            outcome.question = Some(kind);
            outcome.awaiting_label = Some(awaiting_answer_label(kind, style));
        }
        let mut message = TranscriptMessage::assistant(parsed.text.clone(), now);
        message.meta.question_kind = question;
        message.meta.personality = Some(style);
        message.meta.hint_policy = Some(self.state.selections.hint_policy);
        self.state.transcript.push(message);
        outcome.reply = parsed.text;
    }

    /// Classify the answer, feed the rewards to the bandit, and re-select.
    fn score_answer(&mut self, turn: &InteractionTurn, input: &str, now: i64) -> Verdict {
        let verdict = check_answer_quality(input, turn.kind, turn.style);
        let elapsed = turn.response_time(now);
        let hint_given = turn.hint_given || input.to_lowercase().contains("hint");
        debug!(
            kind = turn.kind.as_str(),
            accepted = verdict.accepted,
            reason = verdict.reason,
            elapsed,
            attempts = turn.attempts,
            "answer classified"
        );

        let selections = turn.selections;
        let hint = hint_effectiveness_reward(
            selections.hint_policy,
            hint_given,
            verdict.accepted,
            elapsed,
            turn.attempts,
        );
        self.record(selections.hint_policy, hint);

        match turn.kind {
            QuestionKind::Quiz => {
                let reward = quiz_difficulty_reward(verdict.accepted, elapsed);
                self.record(selections.quiz_difficulty, reward);
            }
            QuestionKind::Mini if turn.style == TeachingStyle::Socratic => {
                let reward = question_depth_reward(verdict.accepted, elapsed, is_dont_know(input));
                self.record(selections.question_depth, reward);
            }
            QuestionKind::Mini => {}
        }

        let context = SelectionContext {
            style: turn.style,
            subtopic: Some(self.state.progress.current_subtopic().to_string()),
            attempts: turn.attempts,
        };
        self.state.selections = self.state.bandit.select_all(&mut self.rng, &context);
        verdict
    }

    fn record<A: Arm>(&mut self, action: A, reward: f64) {
        if let Err(e) = self.state.bandit.record_reward(action, reward) {
            warn!(error = %e, "reward not recorded");
        }
    }

    /// Apply episode and completion markers from a generator reply.
    fn apply_signals(&mut self, parsed: &ParsedReply, now: i64, sink: &mut Sink) {
        let style = self.state.personality;
        // Episodes may master the subtopic and move on; completion refers to
        // the one being taught when the reply was generated.
        let taught = self.state.progress.current_subtopic().to_string();
        for episode in parsed.episodes() {
            if style != TeachingStyle::Narrative {
                debug!(episode, style = %style, "ignoring episode marker outside narrative style");
                continue;
            }
            let subtopic = self.state.progress.current_subtopic().to_string();
            match self.state.progress.mark_episode_mastered(episode) {
                Ok(changes) if !changes.is_empty() => {
                    self.notify(Notification::EpisodeMastered { subtopic, episode }, now, sink);
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "episode marker not applied"),
            }
        }
        self.master_if_complete(now, sink);

        if parsed.subtopic_complete() {
            let result = self.state.progress.mark_subtopic_mastered(&self.catalog, &taught);
            self.apply_mastery(result, now, sink);
        }
    }

    fn master_if_complete(&mut self, now: i64, sink: &mut Sink) {
        let result = self.state.progress.master_if_complete(&self.catalog);
        self.apply_mastery(result, now, sink);
    }

    fn apply_mastery(
        &mut self,
        result: Result<Option<MasteryOutcome>, ProgressError>,
        now: i64,
        sink: &mut Sink,
    ) {
        match result {
            Ok(Some(mastery)) => {
                self.notify(
                    Notification::SubtopicMastered {
                        subtopic: mastery.mastered,
                    },
                    now,
                    sink,
                );
                if let Some(next) = mastery.unlocked_next {
                    self.notify(Notification::SubtopicUnlocked { subtopic: next }, now, sink);
                }
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "subtopic mastery not applied"),
        }
    }

    fn award_xp(&mut self, amount: u32, reason: &str, now: i64, sink: &mut Sink) {
        let level_up = self
            .state
            .progression
            .award(amount, reason, self.config.xp_per_level);
        self.notify(
            Notification::XpAwarded {
                amount,
                reason: reason.to_string(),
            },
            now,
            sink,
        );
        if let Some(level) = level_up {
            self.notify(Notification::LevelUp { level }, now, sink);
        }
    }

    fn notify(&mut self, notification: Notification, now: i64, sink: &mut Sink) {
        self.events.emit(TutorEvent::new(notification.clone(), now));
        sink.notifications.push(notification);
    }

    /// Instruction payload plus the recent transcript, optionally followed by
    /// a one-off prompt that is not recorded.
    fn generate(&self, extra_prompt: Option<&str>) -> Result<String, ProviderError> {
        let instructions = build_instructions(
            self.state.personality,
            &self.state.selections,
            &self.catalog,
            &self.state.progress,
        );
        let transcript = &self.state.transcript;
        let start = transcript.len().saturating_sub(self.config.transcript_window);
        let mut messages = Vec::with_capacity(transcript.len() - start + 2);
        messages.push(ChatMessage::system(instructions));
        messages.extend(transcript[start..].iter().map(TranscriptMessage::to_chat_message));
        if let Some(prompt) = extra_prompt {
            messages.push(ChatMessage::user(prompt));
        }

        let response = self
            .provider
            .chat(&messages, &self.config.generator.chat_options())?;
        let text = response.content.trim();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        debug!(provider = self.provider.name(), model = %response.model, chars = text.len(), "generator replied");
        Ok(text.to_string())
    }

    fn fallback(&mut self, error: &ProviderError, now: i64, outcome: &mut TurnOutcome, sink: &mut Sink) {
        warn!(provider = self.provider.name(), error = %error, "generator failed; using fallback reply");
        outcome.reply = self.config.fallback_message.clone();
        outcome.fallback = true;
        outcome.diagnostics.push(format!("generator error: {error}"));
        self.notify(
            Notification::GeneratorFallback {
                error: error.to_string(),
            },
            now,
            sink,
        );
    }

    /// Write the whole state blob. Failures are reported, never retried.
    fn persist(&mut self, now: i64, sink: &mut Sink) {
        let result = self
            .state
            .to_blob()
            .map_err(|e| e.to_string())
            .and_then(|blob| self.store.save(&self.learner, &blob).map_err(|e| e.to_string()));
        if let Err(error) = result {
            warn!(learner = %self.learner, error = %error, "state not saved");
            sink.warnings
                .push(format!("Progress could not be saved and may be lost on restart: {error}"));
            self.notify(Notification::StateSaveFailed { error }, now, sink);
        }
    }

    /// Record thumbs feedback on the tutor message at `message_index`.
    pub fn record_feedback(
        &mut self,
        message_index: usize,
        thumb: Thumb,
        now: i64,
    ) -> Result<ActionOutcome, TutorError> {
        let message = self
            .state
            .transcript
            .get(message_index)
            .filter(|m| m.role == crate::providers::Role::Assistant)
            .ok_or(TutorError::InvalidFeedbackTarget(message_index))?;
        let personality = message.meta.personality.unwrap_or(self.state.personality);
        let hint_policy: HintPolicy = message
            .meta
            .hint_policy
            .unwrap_or(self.state.selections.hint_policy);

        self.state
            .bandit
            .record_user_feedback(hint_policy, personality, user_feedback_reward(thumb))?;
        self.state.feedback.push(FeedbackRecord {
            message_index,
            thumb,
            personality,
            hint_policy,
            timestamp: now,
        });
        info!(message_index, thumb = ?thumb, policy = hint_policy.as_str(), "feedback recorded");

        let mut sink = Sink::default();
        self.persist(now, &mut sink);
        Ok(sink.finish())
    }

    /// Switch teaching style. The conversation restarts; progress, XP and
    /// bandit histories carry over.
    pub fn set_personality(&mut self, personality: TeachingStyle, now: i64) -> ActionOutcome {
        let mut sink = Sink::default();
        if personality == self.state.personality {
            return sink.finish();
        }
        info!(from = %self.state.personality, to = %personality, "personality changed");
        self.state.personality = personality;
        self.state.reset_conversation();
        self.notify(Notification::PersonalityChanged { personality }, now, &mut sink);
        self.persist(now, &mut sink);
        sink.finish()
    }

    /// Clear the conversation without touching progress.
    pub fn reset_chat(&mut self, now: i64) -> ActionOutcome {
        let mut sink = Sink::default();
        self.state.reset_conversation();
        info!(learner = %self.learner, "chat reset");
        self.persist(now, &mut sink);
        sink.finish()
    }

    pub fn apply_daily_action(&mut self, action: DailyAction, now: i64) -> ActionOutcome {
        let mut sink = Sink::default();
        self.award_xp(action.xp(), action.reason(), now, &mut sink);
        self.persist(now, &mut sink);
        sink.finish()
    }

    pub fn stats(&self) -> TutorStats {
        let per = self.config.xp_per_level;
        let progression = self.state.progression;
        TutorStats {
            xp: progression.xp,
            level: progression.level,
            level_progress: level_progress(progression.xp, per),
            xp_to_next_level: progression.xp_to_next_level(per),
            badges: progression.badges(),
            personality: self.state.personality,
            current_topic: self.state.current_topic.clone(),
            current_subtopic: self
                .catalog
                .subtopic(self.state.progress.current_subtopic())
                .map(|s| s.subtopic.title.clone())
                .unwrap_or_default(),
            subtopic_status: self.state.progress.get_current_subtopic_status(),
            awaiting: self.awaiting_answer(),
            learner: self.state.learner_stats(),
            feedback: self.state.feedback.stats(),
            personality_satisfaction: TeachingStyle::ALL
                .iter()
                .map(|&s| (s, self.state.bandit.personality_satisfaction(s)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    use crate::bandit::{QuestionDepth, QuizDifficulty};
    use crate::progress::PointStatus;
    use crate::providers::{MockProvider, Role};
    use crate::store::InMemoryStore;

    const T0: i64 = 1_700_000_000;

    fn config() -> TutorConfig {
        TutorConfig::default().with_epsilon(0.0)
    }

    fn tutor_with(provider: MockProvider, store: InMemoryStore) -> (Tutor, Rc<MockProvider>) {
        let provider = Rc::new(provider);
        let tutor = Tutor::load(
            "ada",
            Catalog::builtin(),
            config(),
            Box::new(provider.clone()),
            Box::new(store),
        )
        .unwrap()
        .with_seed(7);
        (tutor, provider)
    }

    fn tutor(provider: MockProvider) -> (Tutor, Rc<MockProvider>) {
        tutor_with(provider, InMemoryStore::new())
    }

    #[test]
    fn test_fresh_learner_defaults() {
        let (t, _) = tutor(MockProvider::new("mock"));
        assert!(t.load_report().is_clean());
        assert_eq!(t.state().progression.xp, 0);
        assert_eq!(t.state().personality, TeachingStyle::Socratic);
        assert_eq!(t.state().progress.current_subtopic(), "silk_roads");
        assert!(t.store().load("ada").unwrap().is_none());
    }

    #[test]
    fn test_intro_sent_once() {
        let (mut t, provider) = tutor(MockProvider::new("mock").with_reply("Welcome, traveller!"));
        let outcome = t.ensure_intro(T0).unwrap();
        assert_eq!(outcome.reply, "Welcome, traveller!");
        assert!(t.state().intro_sent);
        assert_eq!(t.state().transcript.len(), 1);
        assert!(t.ensure_intro(T0 + 1).is_none());

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0][0].role, Role::System);
        assert_eq!(requests[0].last().unwrap().content, intro_prompt(TeachingStyle::Socratic));
    }

    #[test]
    fn test_intro_failure_is_retried_later() {
        let (mut t, _) = tutor(
            MockProvider::new("mock")
                .with_error(ProviderError::Timeout)
                .with_reply("Hello again"),
        );
        let outcome = t.ensure_intro(T0).unwrap();
        assert!(outcome.fallback);
        assert!(!t.state().intro_sent);
        assert!(t.state().transcript.is_empty());
        assert_eq!(t.ensure_intro(T0 + 5).unwrap().reply, "Hello again");
    }

    #[test]
    fn test_intro_question_is_scored() {
        let (mut t, _) = tutor(
            MockProvider::new("mock")
                .with_reply("Welcome! [QUIZ] Name one Silk Road good.")
                .with_reply("Correct."),
        );
        let intro = t.ensure_intro(T0).unwrap();
        assert_eq!(intro.question, Some(QuestionKind::Quiz));
        assert_eq!(intro.awaiting_label, Some("25 XP for quiz mastery"));
        assert_eq!(t.state().transcript[0].meta.question_kind, Some(QuestionKind::Quiz));
        let pending = t.state().pending.unwrap();
        assert_eq!(pending.kind, QuestionKind::Quiz);
        assert_eq!(pending.attempts, 1);

        let outcome = t.handle_turn("silk and porcelain goods", T0 + 20);
        assert!(outcome.verdict.unwrap().accepted);
        assert_eq!(outcome.xp_awarded, 25);
        assert_eq!(t.state().progression.xp, 25);
    }

    #[test]
    fn test_free_text_sets_topic_and_poses_question() {
        let (mut t, _) = tutor(
            MockProvider::new("mock").with_reply("Merchants crossed deserts. [MINI-Q] Why?"),
        );
        let outcome = t.handle_turn("What made the Silk Roads so busy after 1200 anyway?", T0);
        assert_eq!(outcome.question, Some(QuestionKind::Mini));
        assert_eq!(outcome.awaiting_label, Some("10 XP for strong reasoning"));
        assert!(outcome.reply.contains("**Mini-Question:**"));
        assert!(outcome.verdict.is_none());
        assert_eq!(
            t.state().current_topic,
            "What made the Silk Roads so busy after..."
        );
        let pending = t.state().pending.unwrap();
        assert_eq!(pending.kind, QuestionKind::Mini);
        assert_eq!(pending.posed_at, T0);
        assert_eq!(pending.attempts, 1);
        assert!(t.store().load("ada").unwrap().is_some());
    }

    #[test]
    fn test_accepted_answer_awards_xp_and_rewards_bandit() {
        let (mut t, _) = tutor(
            MockProvider::new("mock")
                .with_reply("[MINI-Q] Why did caravanserai matter?")
                .with_reply("Exactly right."),
        );
        t.handle_turn("Tell me about caravans", T0);
        let outcome = t.handle_turn(
            "Because merchants needed safe places to rest and trade goods",
            T0 + 30,
        );
        let verdict = outcome.verdict.unwrap();
        assert!(verdict.accepted);
        assert_eq!(outcome.xp_awarded, 10);
        assert_eq!(t.state().progression.xp, 10);
        assert!(t.state().pending.is_none());
        assert!(outcome
            .notifications
            .contains(&Notification::XpAwarded {
                amount: 10,
                reason: "Thoughtful response".to_string()
            }));

        let bandit = &t.state().bandit;
        let hint = bandit.history(HintPolicy::LightHints).unwrap();
        assert_eq!(hint.samples().iter().copied().collect::<Vec<_>>(), vec![1.0]);
        let depth = bandit.history(QuestionDepth::DeepProbe).unwrap();
        assert_eq!(depth.samples().iter().copied().collect::<Vec<_>>(), vec![1.0]);
        assert!(bandit.history(QuizDifficulty::Medium).unwrap().is_empty());

        let answer = &t.state().transcript[2];
        assert_eq!(answer.meta.answered, Some(QuestionKind::Mini));
        assert_eq!(answer.meta.xp_awarded, 10);
        assert_eq!(t.stats().learner.mini_answered, 1);
    }

    #[test]
    fn test_rejected_answer_carries_attempts() {
        let (mut t, _) = tutor(
            MockProvider::new("mock")
                .with_reply("[MINI-Q] What did merchants need?")
                .with_reply("Think again. [MINI-Q] What did merchants need on long trips?"),
        );
        t.handle_turn("Start the lesson", T0);
        let outcome = t.handle_turn("I don't know", T0 + 20);
        assert!(!outcome.verdict.unwrap().accepted);
        assert_eq!(outcome.xp_awarded, 0);
        assert_eq!(t.state().progression.xp, 0);
        assert_eq!(t.state().pending.unwrap().attempts, 2);

        // Disengaged answer: LIGHT_HINTS without a hint, incorrect -> 0.2; depth -> 0.1.
        let bandit = &t.state().bandit;
        let hint = bandit.history(HintPolicy::LightHints).unwrap();
        assert!((hint.samples()[0] - 0.2).abs() < 1e-9);
        let depth = bandit.history(QuestionDepth::DeepProbe).unwrap();
        assert!((depth.samples()[0] - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_quiz_pass_advances_learning_point() {
        let (mut t, _) = tutor(
            MockProvider::new("mock")
                .with_reply("[QUIZ] What crossed Eurasia overland?")
                .with_reply("Correct!"),
        );
        t.handle_turn("Quiz me please", T0);
        let outcome = t.handle_turn("silk and porcelain", T0 + 45);
        assert_eq!(outcome.xp_awarded, 25);
        assert_eq!(t.state().progression.xp, 25);

        let quiz = t.state().bandit.history(QuizDifficulty::Medium).unwrap();
        assert_eq!(quiz.samples().iter().copied().collect::<Vec<_>>(), vec![1.0]);

        // The quiz completes point 0; the tagged question still in the scan
        // window then completes point 1.
        let points = t.state().progress.subtopic("silk_roads").unwrap().points;
        assert_eq!(
            points,
            [
                PointStatus::Completed,
                PointStatus::Completed,
                PointStatus::Active,
                PointStatus::Locked
            ]
        );
        assert_eq!(t.stats().subtopic_status, SubtopicStatus::InProgress);
    }

    #[test]
    fn test_generator_failure_uses_fallback() {
        let (mut t, _) = tutor(MockProvider::new("mock").with_error(ProviderError::RateLimited));
        let outcome = t.handle_turn("Hello tutor", T0);
        assert!(outcome.fallback);
        assert_eq!(outcome.reply, t.config().fallback_message);
        assert!(outcome.diagnostics[0].contains("rate limited"));
        assert!(outcome.warnings.is_empty());
        let last = t.state().transcript.last().unwrap();
        assert!(last.meta.fallback);
        assert_eq!(
            t.events().history(Some(crate::events::topics::GENERATOR_FALLBACK)).len(),
            1
        );
    }

    #[test]
    fn test_empty_reply_uses_fallback() {
        let (mut t, _) = tutor(MockProvider::new("mock").with_reply("   "));
        let outcome = t.handle_turn("Hello tutor", T0);
        assert!(outcome.fallback);
        assert!(outcome.diagnostics[0].contains("empty"));
    }

    #[test]
    fn test_save_failure_is_non_fatal() {
        let (mut t, _) = tutor_with(
            MockProvider::new("mock").with_reply("Hi there."),
            InMemoryStore::new().with_failing_writes(),
        );
        let outcome = t.handle_turn("Hello tutor", T0);
        assert_eq!(outcome.reply, "Hi there.");
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome
            .notifications
            .iter()
            .any(|n| matches!(n, Notification::StateSaveFailed { .. })));
        assert_eq!(t.state().transcript.len(), 2);
    }

    #[test]
    fn test_narrative_episode_markers_drive_progress() {
        let (mut t, _) = tutor(
            MockProvider::new("mock")
                .with_reply("You rest at the caravanserai. [EPISODE-MASTERED:1]")
                .with_reply("The story ends. [EPISODE-MASTERED:4] [SUBTOPIC-COMPLETE]"),
        );
        t.set_personality(TeachingStyle::Narrative, T0);
        let outcome = t.handle_turn("I look at the silk bales", T0 + 1);
        assert!(!outcome.reply.contains("EPISODE"));
        assert!(outcome.notifications.contains(&Notification::EpisodeMastered {
            subtopic: "silk_roads".to_string(),
            episode: 1
        }));
        let p = t.state().progress.subtopic("silk_roads").unwrap();
        assert_eq!(p.points[0], PointStatus::Completed);
        assert_eq!(p.points[1], PointStatus::Active);

        let outcome = t.handle_turn("I travel on to Samarkand", T0 + 2);
        assert!(outcome.notifications.contains(&Notification::SubtopicMastered {
            subtopic: "silk_roads".to_string()
        }));
        assert!(outcome.notifications.contains(&Notification::SubtopicUnlocked {
            subtopic: "mongol_empire".to_string()
        }));
        assert!(t.state().progress.subtopic("silk_roads").unwrap().mastered);
        assert_eq!(t.state().progress.current_subtopic(), "mongol_empire");
    }

    #[test]
    fn test_episode_markers_ignored_outside_narrative() {
        let (mut t, _) = tutor(MockProvider::new("mock").with_reply("Fine. [EPISODE-MASTERED:3]"));
        let outcome = t.handle_turn("ok then", T0);
        assert_eq!(outcome.reply, "Fine.");
        let p = t.state().progress.subtopic("silk_roads").unwrap();
        assert_eq!(p.completed_count(), 0);
    }

    #[test]
    fn test_feedback_updates_bandit_and_log() {
        let (mut t, _) = tutor(MockProvider::new("mock").with_reply("Here is a primer."));
        t.handle_turn("Teach me", T0);
        let result = t.record_feedback(1, Thumb::Up, T0 + 5).unwrap();
        assert!(result.warnings.is_empty());
        let fb = t.state().bandit.feedback_history(HintPolicy::LightHints).unwrap();
        assert_eq!(fb.len(), 1);
        assert_eq!(t.state().feedback.len(), 1);
        assert_eq!(
            t.state().bandit.personality_satisfaction(TeachingStyle::Socratic),
            Some(1.0)
        );

        assert!(matches!(
            t.record_feedback(0, Thumb::Down, T0),
            Err(TutorError::InvalidFeedbackTarget(0))
        ));
        assert!(t.record_feedback(9, Thumb::Down, T0).is_err());
    }

    #[test]
    fn test_personality_switch_keeps_progress() {
        let (mut t, _) = tutor(MockProvider::new("mock").with_reply("Hello."));
        t.apply_daily_action(DailyAction::Lesson, T0);
        t.handle_turn("Hi", T0);
        let outcome = t.set_personality(TeachingStyle::Direct, T0 + 10);
        assert!(outcome
            .notifications
            .contains(&Notification::PersonalityChanged {
                personality: TeachingStyle::Direct
            }));
        assert!(t.state().transcript.is_empty());
        assert!(!t.state().intro_sent);
        assert_eq!(t.state().progression.xp, 30);
        assert!(t.set_personality(TeachingStyle::Direct, T0 + 11).notifications.is_empty());
    }

    #[test]
    fn test_daily_actions_level_up() {
        let (mut t, _) = tutor(MockProvider::new("mock"));
        for _ in 0..3 {
            t.apply_daily_action(DailyAction::Lesson, T0);
        }
        let outcome = t.apply_daily_action(DailyAction::Practice, T0);
        assert!(outcome.notifications.contains(&Notification::LevelUp { level: 2 }));
        let stats = t.stats();
        assert_eq!(stats.xp, 105);
        assert_eq!(stats.level, 2);
        assert_eq!(stats.badges, vec![Badge::Starter, Badge::FocusedLearner]);
    }

    #[test]
    fn test_quick_start_sets_topic_label() {
        let (mut t, provider) = tutor(MockProvider::new("mock").with_reply("Let's begin."));
        t.start_quick_start(0, T0).unwrap();
        let (label, prompt) = quick_starts(TeachingStyle::Socratic)[0];
        assert_eq!(t.state().current_topic, label);
        let request = &provider.requests()[0];
        assert_eq!(request.last().unwrap().content, prompt);
        assert!(matches!(
            t.start_quick_start(3, T0),
            Err(TutorError::UnknownQuickStart(3))
        ));
    }

    #[test]
    fn test_state_survives_reload() {
        let provider = MockProvider::new("mock")
            .with_reply("[QUIZ] Name one good.")
            .with_reply("Yes.");
        let (mut t, _) = tutor(provider);
        t.handle_turn("Quiz me", T0);
        t.handle_turn("silk and porcelain", T0 + 10);
        t.record_feedback(3, Thumb::Down, T0 + 20).unwrap();
        let blob = t.store().load("ada").unwrap().unwrap();

        let (reloaded, _) = tutor_with(
            MockProvider::new("mock"),
            InMemoryStore::new().with_blob("ada", blob),
        );
        assert!(reloaded.load_report().is_clean());
        assert_eq!(reloaded.state().progress, t.state().progress);
        assert_eq!(reloaded.state().bandit, t.state().bandit);
        assert_eq!(reloaded.state().progression, t.state().progression);
        assert_eq!(reloaded.state().transcript, t.state().transcript);
    }

    #[test]
    fn test_corrupt_saved_state_recovers() {
        let (t, _) = tutor_with(
            MockProvider::new("mock"),
            InMemoryStore::new().with_blob("ada", "definitely not json"),
        );
        assert!(t.load_report().corrupt);
        assert_eq!(t.state().progress.current_subtopic(), "silk_roads");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = Tutor::load(
            "ada",
            Catalog::builtin(),
            TutorConfig::default().with_epsilon(2.0),
            Box::new(MockProvider::new("mock")),
            Box::new(InMemoryStore::new()),
        );
        assert!(matches!(result, Err(TutorError::Config(_))));
    }
}
