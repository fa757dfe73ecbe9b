//! Epsilon-greedy teaching policy.
//!
//! Three independent bandits, one per decision axis, each holding a bounded
//! FIFO window of reward samples per action. The hint-policy axis also keeps
//! a user-feedback window that is blended into its value estimate.

use std::collections::VecDeque;
use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::TeachingStyle;

pub const DEFAULT_EPSILON: f64 = 0.15;
pub const AUTO_HISTORY_CAP: usize = 20;
pub const FEEDBACK_HISTORY_CAP: usize = 30;

/// Value assumed for an action with no samples.
pub const NEUTRAL_PRIOR: f64 = 0.5;

const AUTO_WEIGHT: f64 = 0.4;
const FEEDBACK_WEIGHT: f64 = 0.6;

/// An independent decision dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    HintPolicy,
    QuestionDepth,
    QuizDifficulty,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::HintPolicy => "hint_policy",
            Axis::QuestionDepth => "question_depth",
            Axis::QuizDifficulty => "quiz_difficulty",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HintPolicy {
    NoAutomaticHints,
    LightHints,
    FullHints,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionDepth {
    ShallowCheck,
    DeepProbe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuizDifficulty {
    Easy,
    Medium,
    Hard,
}

/// A selectable action on one axis.
pub trait Arm: Copy + Eq + fmt::Debug + 'static {
    const AXIS: Axis;
    /// Every action, in tie-break order.
    const ALL: &'static [Self];
    const DEFAULT: Self;
    /// Whether a user-feedback window is blended into the value estimate.
    const HAS_FEEDBACK: bool = false;

    fn as_str(&self) -> &'static str;
    fn arms(bandit: &BanditController) -> &ArmSet<Self>;
    fn arms_mut(bandit: &mut BanditController) -> &mut ArmSet<Self>;
}

impl Arm for HintPolicy {
    const AXIS: Axis = Axis::HintPolicy;
    const ALL: &'static [Self] = &[
        HintPolicy::NoAutomaticHints,
        HintPolicy::LightHints,
        HintPolicy::FullHints,
    ];
    const DEFAULT: Self = HintPolicy::LightHints;
    const HAS_FEEDBACK: bool = true;

    fn as_str(&self) -> &'static str {
        match self {
            HintPolicy::NoAutomaticHints => "NO_AUTOMATIC_HINTS",
            HintPolicy::LightHints => "LIGHT_HINTS",
            HintPolicy::FullHints => "FULL_HINTS",
        }
    }

    fn arms(bandit: &BanditController) -> &ArmSet<Self> {
        &bandit.hint_policy
    }

    fn arms_mut(bandit: &mut BanditController) -> &mut ArmSet<Self> {
        &mut bandit.hint_policy
    }
}

impl Arm for QuestionDepth {
    const AXIS: Axis = Axis::QuestionDepth;
    const ALL: &'static [Self] = &[QuestionDepth::ShallowCheck, QuestionDepth::DeepProbe];
    const DEFAULT: Self = QuestionDepth::DeepProbe;

    fn as_str(&self) -> &'static str {
        match self {
            QuestionDepth::ShallowCheck => "SHALLOW_CHECK",
            QuestionDepth::DeepProbe => "DEEP_PROBE",
        }
    }

    fn arms(bandit: &BanditController) -> &ArmSet<Self> {
        &bandit.question_depth
    }

    fn arms_mut(bandit: &mut BanditController) -> &mut ArmSet<Self> {
        &mut bandit.question_depth
    }
}

impl Arm for QuizDifficulty {
    const AXIS: Axis = Axis::QuizDifficulty;
    const ALL: &'static [Self] = &[
        QuizDifficulty::Easy,
        QuizDifficulty::Medium,
        QuizDifficulty::Hard,
    ];
    const DEFAULT: Self = QuizDifficulty::Medium;

    fn as_str(&self) -> &'static str {
        match self {
            QuizDifficulty::Easy => "EASY",
            QuizDifficulty::Medium => "MEDIUM",
            QuizDifficulty::Hard => "HARD",
        }
    }

    fn arms(bandit: &BanditController) -> &ArmSet<Self> {
        &bandit.quiz_difficulty
    }

    fn arms_mut(bandit: &mut BanditController) -> &mut ArmSet<Self> {
        &mut bandit.quiz_difficulty
    }
}

/// Bounded FIFO window of reward samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardWindow {
    cap: usize,
    samples: VecDeque<f64>,
}

impl RewardWindow {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            samples: VecDeque::with_capacity(cap),
        }
    }

    /// Append a sample, evicting the oldest beyond the cap.
    pub fn push(&mut self, reward: f64) {
        self.samples.push_back(reward);
        while self.samples.len() > self.cap {
            self.samples.pop_front();
        }
    }

    pub fn mean(&self) -> Option<f64> {
        if self.samples.is_empty() {
            None
        } else {
            Some(self.samples.iter().sum::<f64>() / self.samples.len() as f64)
        }
    }

    pub fn mean_or_prior(&self) -> f64 {
        self.mean().unwrap_or(NEUTRAL_PRIOR)
    }

    pub fn samples(&self) -> &VecDeque<f64> {
        &self.samples
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    fn set_cap(&mut self, cap: usize) {
        self.cap = cap;
        while self.samples.len() > self.cap {
            self.samples.pop_front();
        }
    }
}

/// Reward history for one action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmHistory<A> {
    pub action: A,
    pub auto: RewardWindow,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<RewardWindow>,
}

/// All actions of one axis with their histories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmSet<A> {
    pub axis: Axis,
    arms: Vec<ArmHistory<A>>,
}

impl<A: Arm> ArmSet<A> {
    pub fn new(auto_cap: usize, feedback_cap: usize) -> Self {
        Self {
            axis: A::AXIS,
            arms: A::ALL
                .iter()
                .map(|&action| ArmHistory {
                    action,
                    auto: RewardWindow::new(auto_cap),
                    feedback: A::HAS_FEEDBACK.then(|| RewardWindow::new(feedback_cap)),
                })
                .collect(),
        }
    }

    fn arm(&self, action: A) -> Option<&ArmHistory<A>> {
        self.arms.iter().find(|a| a.action == action)
    }

    fn arm_mut(&mut self, action: A) -> Option<&mut ArmHistory<A>> {
        self.arms.iter_mut().find(|a| a.action == action)
    }

    pub fn history(&self, action: A) -> Option<&RewardWindow> {
        self.arm(action).map(|a| &a.auto)
    }

    pub fn feedback_history(&self, action: A) -> Option<&RewardWindow> {
        self.arm(action).and_then(|a| a.feedback.as_ref())
    }

    /// Estimated value: mean of automatic rewards, blended 40/60 with the
    /// user-feedback mean on axes that have one. Empty windows count as 0.5.
    pub fn estimated_value(&self, action: A) -> f64 {
        let Some(arm) = self.arm(action) else {
            return NEUTRAL_PRIOR;
        };
        match &arm.feedback {
            Some(feedback) if A::HAS_FEEDBACK => {
                AUTO_WEIGHT * arm.auto.mean_or_prior() + FEEDBACK_WEIGHT * feedback.mean_or_prior()
            }
            _ => arm.auto.mean_or_prior(),
        }
    }

    /// Argmax over estimated values; the first maximum in `A::ALL` order wins.
    pub fn greedy(&self) -> A {
        let mut best = A::DEFAULT;
        let mut best_value = f64::NEG_INFINITY;
        for &action in A::ALL {
            let value = self.estimated_value(action);
            if value > best_value {
                best = action;
                best_value = value;
            }
        }
        best
    }

    /// Restore the canonical action list and caps after loading persisted state.
    /// Histories of known actions are kept.
    pub fn reconcile(&mut self, auto_cap: usize, feedback_cap: usize) {
        let mut arms = Vec::with_capacity(A::ALL.len());
        for &action in A::ALL {
            let mut arm = match self.arms.iter().position(|a| a.action == action) {
                Some(idx) => self.arms.swap_remove(idx),
                None => ArmHistory {
                    action,
                    auto: RewardWindow::new(auto_cap),
                    feedback: None,
                },
            };
            arm.auto.set_cap(auto_cap);
            arm.feedback = if A::HAS_FEEDBACK {
                let mut window = arm.feedback.take().unwrap_or_else(|| RewardWindow::new(feedback_cap));
                window.set_cap(feedback_cap);
                Some(window)
            } else {
                None
            };
            arms.push(arm);
        }
        self.axis = A::AXIS;
        self.arms = arms;
    }
}

/// Per-personality satisfaction from thumbs feedback. Display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityTally {
    pub style: TeachingStyle,
    pub window: RewardWindow,
}

/// The action in effect on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selections {
    pub hint_policy: HintPolicy,
    pub question_depth: QuestionDepth,
    pub quiz_difficulty: QuizDifficulty,
}

impl Default for Selections {
    fn default() -> Self {
        Self {
            hint_policy: HintPolicy::DEFAULT,
            question_depth: QuestionDepth::DEFAULT,
            quiz_difficulty: QuizDifficulty::DEFAULT,
        }
    }
}

/// Context passed to selection.
///
/// Accepted and currently ignored by value estimation; it exists so a
/// contextual policy can be added without changing call sites.
#[derive(Debug, Clone, Default)]
pub struct SelectionContext {
    pub style: TeachingStyle,
    pub subtopic: Option<String>,
    pub attempts: u32,
}

/// Errors from bandit operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BanditError {
    #[error("reward {0} outside [0, 1]")]
    RewardOutOfRange(f64),
    #[error("unknown action {action} on axis {axis}")]
    UnknownAction { axis: Axis, action: String },
}

fn check_reward(reward: f64) -> Result<(), BanditError> {
    if reward.is_finite() && (0.0..=1.0).contains(&reward) {
        Ok(())
    } else {
        Err(BanditError::RewardOutOfRange(reward))
    }
}

/// Epsilon-greedy controller over the three teaching axes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanditController {
    pub epsilon: f64,
    hint_policy: ArmSet<HintPolicy>,
    question_depth: ArmSet<QuestionDepth>,
    quiz_difficulty: ArmSet<QuizDifficulty>,
    personality: Vec<PersonalityTally>,
}

impl Default for BanditController {
    fn default() -> Self {
        Self::new(DEFAULT_EPSILON, AUTO_HISTORY_CAP, FEEDBACK_HISTORY_CAP)
    }
}

impl BanditController {
    pub fn new(epsilon: f64, auto_cap: usize, feedback_cap: usize) -> Self {
        Self {
            epsilon,
            hint_policy: ArmSet::new(auto_cap, feedback_cap),
            question_depth: ArmSet::new(auto_cap, feedback_cap),
            quiz_difficulty: ArmSet::new(auto_cap, feedback_cap),
            personality: TeachingStyle::ALL
                .iter()
                .map(|&style| PersonalityTally {
                    style,
                    window: RewardWindow::new(feedback_cap),
                })
                .collect(),
        }
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn arms<A: Arm>(&self) -> &ArmSet<A> {
        A::arms(self)
    }

    /// Pick an action: uniform random with probability epsilon, greedy otherwise.
    pub fn select_action<A: Arm, R: Rng + ?Sized>(&self, rng: &mut R, _context: &SelectionContext) -> A {
        let explore = rng.gen::<f64>() < self.epsilon;
        let action = if explore {
            A::ALL.choose(rng).copied().unwrap_or(A::DEFAULT)
        } else {
            A::arms(self).greedy()
        };
        debug!(axis = %A::AXIS, action = action.as_str(), explore, "selected action");
        action
    }

    /// Select by axis, returning the action name.
    pub fn select_by_axis<R: Rng + ?Sized>(
        &self,
        axis: Axis,
        rng: &mut R,
        context: &SelectionContext,
    ) -> &'static str {
        match axis {
            Axis::HintPolicy => self.select_action::<HintPolicy, R>(rng, context).as_str(),
            Axis::QuestionDepth => self.select_action::<QuestionDepth, R>(rng, context).as_str(),
            Axis::QuizDifficulty => self.select_action::<QuizDifficulty, R>(rng, context).as_str(),
        }
    }

    /// Re-select every axis.
    pub fn select_all<R: Rng + ?Sized>(&self, rng: &mut R, context: &SelectionContext) -> Selections {
        Selections {
            hint_policy: self.select_action(rng, context),
            question_depth: self.select_action(rng, context),
            quiz_difficulty: self.select_action(rng, context),
        }
    }

    /// Append an automatic reward for `action`.
    pub fn record_reward<A: Arm>(&mut self, action: A, reward: f64) -> Result<(), BanditError> {
        check_reward(reward)?;
        let arm = A::arms_mut(self)
            .arm_mut(action)
            .ok_or_else(|| BanditError::UnknownAction {
                axis: A::AXIS,
                action: action.as_str().to_string(),
            })?;
        arm.auto.push(reward);
        debug!(axis = %A::AXIS, action = action.as_str(), reward, samples = arm.auto.len(), "recorded reward");
        Ok(())
    }

    /// Apply a thumbs reward to the hint policy that produced the message
    /// and to the personality tally.
    pub fn record_user_feedback(
        &mut self,
        policy: HintPolicy,
        style: TeachingStyle,
        reward: f64,
    ) -> Result<(), BanditError> {
        check_reward(reward)?;
        let window = self
            .hint_policy
            .arm_mut(policy)
            .and_then(|a| a.feedback.as_mut())
            .ok_or_else(|| BanditError::UnknownAction {
                axis: Axis::HintPolicy,
                action: policy.as_str().to_string(),
            })?;
        window.push(reward);
        if let Some(tally) = self.personality.iter_mut().find(|t| t.style == style) {
            tally.window.push(reward);
        }
        debug!(policy = policy.as_str(), style = %style, reward, "recorded user feedback");
        Ok(())
    }

    pub fn estimated_value<A: Arm>(&self, action: A) -> f64 {
        A::arms(self).estimated_value(action)
    }

    pub fn history<A: Arm>(&self, action: A) -> Option<&RewardWindow> {
        A::arms(self).history(action)
    }

    pub fn feedback_history(&self, policy: HintPolicy) -> Option<&RewardWindow> {
        self.hint_policy.feedback_history(policy)
    }

    pub fn personality_satisfaction(&self, style: TeachingStyle) -> Option<f64> {
        self.personality
            .iter()
            .find(|t| t.style == style)
            .and_then(|t| t.window.mean())
    }

    /// Restore canonical actions, styles, and caps after loading persisted state.
    pub fn reconcile(&mut self, epsilon: f64, auto_cap: usize, feedback_cap: usize) {
        self.epsilon = epsilon;
        self.hint_policy.reconcile(auto_cap, feedback_cap);
        self.question_depth.reconcile(auto_cap, feedback_cap);
        self.quiz_difficulty.reconcile(auto_cap, feedback_cap);
        let mut tallies = Vec::with_capacity(TeachingStyle::ALL.len());
        for style in TeachingStyle::ALL {
            let mut window = self
                .personality
                .iter()
                .find(|t| t.style == style)
                .map(|t| t.window.clone())
                .unwrap_or_else(|| RewardWindow::new(feedback_cap));
            window.set_cap(feedback_cap);
            tallies.push(PersonalityTally { style, window });
        }
        self.personality = tallies;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn greedy_bandit() -> BanditController {
        BanditController::default().with_epsilon(0.0)
    }

    fn ctx() -> SelectionContext {
        SelectionContext::default()
    }

    #[test]
    fn test_empty_histories_tie_break_first_listed() {
        let bandit = greedy_bandit();
        let mut rng = StdRng::seed_from_u64(1);
        let hint: HintPolicy = bandit.select_action(&mut rng, &ctx());
        let depth: QuestionDepth = bandit.select_action(&mut rng, &ctx());
        let quiz: QuizDifficulty = bandit.select_action(&mut rng, &ctx());
        assert_eq!(hint, HintPolicy::NoAutomaticHints);
        assert_eq!(depth, QuestionDepth::ShallowCheck);
        assert_eq!(quiz, QuizDifficulty::Easy);
    }

    #[test]
    fn test_greedy_picks_highest_mean() {
        let mut bandit = greedy_bandit();
        bandit.record_reward(QuizDifficulty::Easy, 0.3).unwrap();
        bandit.record_reward(QuizDifficulty::Hard, 0.9).unwrap();
        bandit.record_reward(QuizDifficulty::Medium, 0.6).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let pick: QuizDifficulty = bandit.select_action(&mut rng, &ctx());
        assert_eq!(pick, QuizDifficulty::Hard);
    }

    #[test]
    fn test_empty_arm_prior_beats_low_mean() {
        let mut bandit = greedy_bandit();
        bandit.record_reward(QuestionDepth::ShallowCheck, 0.1).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let pick: QuestionDepth = bandit.select_action(&mut rng, &ctx());
        assert_eq!(pick, QuestionDepth::DeepProbe);
    }

    #[test]
    fn test_hint_value_blends_feedback() {
        let mut bandit = greedy_bandit();
        bandit.record_reward(HintPolicy::FullHints, 1.0).unwrap();
        // auto only: 0.4 * 1.0 + 0.6 * 0.5
        assert!((bandit.estimated_value(HintPolicy::FullHints) - 0.7).abs() < 1e-9);

        bandit
            .record_user_feedback(HintPolicy::FullHints, TeachingStyle::Socratic, 0.0)
            .unwrap();
        assert!((bandit.estimated_value(HintPolicy::FullHints) - 0.4).abs() < 1e-9);
        assert!((bandit.estimated_value(HintPolicy::LightHints) - 0.5).abs() < 1e-9);

        let mut rng = StdRng::seed_from_u64(3);
        let pick: HintPolicy = bandit.select_action(&mut rng, &ctx());
        assert_eq!(pick, HintPolicy::NoAutomaticHints);
    }

    #[test]
    fn test_auto_history_fifo_eviction() {
        let mut bandit = greedy_bandit();
        for i in 0..25 {
            bandit
                .record_reward(QuizDifficulty::Medium, i as f64 / 100.0)
                .unwrap();
        }
        let window = bandit.history(QuizDifficulty::Medium).unwrap();
        assert_eq!(window.len(), AUTO_HISTORY_CAP);
        // Samples 0..=4 were evicted first.
        assert!((window.samples()[0] - 0.05).abs() < 1e-9);
        assert!((window.samples()[AUTO_HISTORY_CAP - 1] - 0.24).abs() < 1e-9);
    }

    #[test]
    fn test_feedback_history_cap() {
        let mut bandit = greedy_bandit();
        for i in 0..40 {
            let reward = if i == 0 { 0.0 } else { 1.0 };
            bandit
                .record_user_feedback(HintPolicy::LightHints, TeachingStyle::Narrative, reward)
                .unwrap();
        }
        let window = bandit.feedback_history(HintPolicy::LightHints).unwrap();
        assert_eq!(window.len(), FEEDBACK_HISTORY_CAP);
        assert_eq!(window.mean(), Some(1.0));
        assert_eq!(bandit.personality_satisfaction(TeachingStyle::Narrative), Some(1.0));
        assert_eq!(bandit.personality_satisfaction(TeachingStyle::Direct), None);
    }

    #[test]
    fn test_record_reward_rejects_out_of_range() {
        let mut bandit = greedy_bandit();
        assert!(matches!(
            bandit.record_reward(QuizDifficulty::Easy, 1.5),
            Err(BanditError::RewardOutOfRange(_))
        ));
        assert!(bandit.record_reward(QuizDifficulty::Easy, f64::NAN).is_err());
        assert!(bandit.history(QuizDifficulty::Easy).unwrap().is_empty());
    }

    #[test]
    fn test_full_exploration_covers_all_actions() {
        let bandit = BanditController::default().with_epsilon(1.0);
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let pick: QuizDifficulty = bandit.select_action(&mut rng, &ctx());
            seen.insert(pick);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_context_does_not_change_selection() {
        let mut bandit = greedy_bandit();
        bandit.record_reward(QuizDifficulty::Medium, 0.8).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let other = SelectionContext {
            style: TeachingStyle::Direct,
            subtopic: Some("silk_roads".to_string()),
            attempts: 3,
        };
        let a: QuizDifficulty = bandit.select_action(&mut rng, &ctx());
        let b: QuizDifficulty = bandit.select_action(&mut rng, &other);
        assert_eq!(a, b);
    }

    #[test]
    fn test_select_by_axis_names() {
        let bandit = greedy_bandit();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(bandit.select_by_axis(Axis::HintPolicy, &mut rng, &ctx()), "NO_AUTOMATIC_HINTS");
        assert_eq!(bandit.select_by_axis(Axis::QuestionDepth, &mut rng, &ctx()), "SHALLOW_CHECK");
    }

    #[test]
    fn test_serialization_roundtrip_preserves_histories() {
        let mut bandit = BanditController::default();
        bandit.record_reward(HintPolicy::LightHints, 0.9).unwrap();
        bandit.record_reward(QuestionDepth::DeepProbe, 0.4).unwrap();
        bandit
            .record_user_feedback(HintPolicy::FullHints, TeachingStyle::Direct, 1.0)
            .unwrap();

        let json = serde_json::to_string(&bandit).unwrap();
        assert!(json.contains("LIGHT_HINTS"));
        let parsed: BanditController = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, bandit);
    }

    #[test]
    fn test_reconcile_restores_missing_arms() {
        let mut bandit = BanditController::default();
        bandit.record_reward(QuizDifficulty::Hard, 0.2).unwrap();
        bandit.quiz_difficulty.arms.retain(|a| a.action == QuizDifficulty::Hard);
        bandit.personality.clear();

        bandit.reconcile(0.1, 5, 8);
        assert_eq!(bandit.quiz_difficulty.arms.len(), 3);
        assert_eq!(bandit.quiz_difficulty.arms[0].action, QuizDifficulty::Easy);
        assert_eq!(bandit.history(QuizDifficulty::Hard).unwrap().len(), 1);
        assert_eq!(bandit.history(QuizDifficulty::Hard).unwrap().cap(), 5);
        assert_eq!(bandit.feedback_history(HintPolicy::LightHints).unwrap().cap(), 8);
        assert_eq!(bandit.personality.len(), 3);
    }

    #[test]
    fn test_default_selections() {
        let s = Selections::default();
        assert_eq!(s.hint_policy, HintPolicy::LightHints);
        assert_eq!(s.question_depth, QuestionDepth::DeepProbe);
        assert_eq!(s.quiz_difficulty, QuizDifficulty::Medium);
    }
}
