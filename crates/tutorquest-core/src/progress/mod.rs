//! Unlock and mastery state for concepts, subtopics, and learning points.
//!
//! Learning points move `locked → active → completed`; subtopics move
//! `locked → unlocked → mastered`. Neither ever moves backwards. Within a
//! subtopic at most one point is active, and point `i` is never active or
//! completed while point `i - 1` is locked.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{Catalog, LEARNING_POINTS_PER_SUBTOPIC};
use crate::classifier::word_count;
use crate::markers::{MINI_QUESTION_MARKER, QUIZ_MARKER};
use crate::providers::Role;
use crate::session::TranscriptMessage;

const N: usize = LEARNING_POINTS_PER_SUBTOPIC;

/// Messages inspected by the key-term scan.
const TERM_SCAN_WINDOW: usize = 6;
const TERMS_TO_ACTIVATE: usize = 2;
const TERMS_TO_COMPLETE: usize = 3;
const KEY_TERM_MIN_CHARS: usize = 5;

/// Messages inspected by the understanding check.
const UNDERSTANDING_WINDOW: usize = 4;
const UNDERSTANDING_MIN_ANSWERS: usize = 2;
const UNDERSTANDING_MIN_WORDS: usize = 6;

const STOPWORDS: &[&str] = &[
    "about", "after", "along", "among", "before", "being", "between", "could", "during", "their",
    "there", "these", "those", "through", "under", "where", "which", "while", "would", "other",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointStatus {
    #[default]
    Locked,
    Active,
    Completed,
}

/// Progress through one subtopic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SubtopicProgress {
    pub unlocked: bool,
    pub mastered: bool,
    pub points: [PointStatus; N],
}

impl SubtopicProgress {
    pub fn completed_count(&self) -> usize {
        self.points
            .iter()
            .filter(|p| **p == PointStatus::Completed)
            .count()
    }

    pub fn active_index(&self) -> Option<usize> {
        self.points.iter().position(|p| *p == PointStatus::Active)
    }

    pub fn all_completed(&self) -> bool {
        self.completed_count() == N
    }

    /// Complete the point at `idx` and activate the one after it.
    fn complete_and_advance(&mut self, idx: usize) {
        self.points[idx] = PointStatus::Completed;
        if idx + 1 < N && self.points[idx + 1] == PointStatus::Locked {
            self.points[idx + 1] = PointStatus::Active;
        }
    }

    /// Repair ordering violations in persisted data by moving points forward only.
    fn normalize(&mut self) {
        if self.mastered {
            self.unlocked = true;
            self.points = [PointStatus::Completed; N];
            return;
        }
        // The furthest point that made progress pulls every earlier point to completed.
        if let Some(last) = self.points.iter().rposition(|p| *p != PointStatus::Locked) {
            for p in &mut self.points[..last] {
                *p = PointStatus::Completed;
            }
        }
        if self.unlocked && self.points.iter().all(|p| *p == PointStatus::Locked) {
            self.points[0] = PointStatus::Active;
        }
    }
}

/// Rollup status of the current subtopic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtopicStatus {
    Mastered,
    NearlyComplete,
    InProgress,
    NotStarted,
}

/// A single learning-point status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointTransition {
    pub subtopic: String,
    pub index: usize,
    pub to: PointStatus,
}

/// Result of mastering a subtopic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasteryOutcome {
    pub mastered: String,
    pub unlocked_next: Option<String>,
}

/// Errors from progress transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressError {
    #[error("unknown subtopic: {0}")]
    UnknownSubtopic(String),
    #[error("episode {0} outside 1..=4")]
    InvalidEpisode(u8),
    #[error("catalog is empty")]
    EmptyCatalog,
}

/// Unlock and mastery state for one learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressTracker {
    concepts_unlocked: BTreeMap<String, bool>,
    subtopics: BTreeMap<String, SubtopicProgress>,
    current_concept: String,
    current_subtopic: String,
}

impl ProgressTracker {
    /// Fresh progress: the first concept and its first subtopic unlocked.
    pub fn new(catalog: &Catalog) -> Result<Self, ProgressError> {
        let first = catalog.first_subtopic().ok_or(ProgressError::EmptyCatalog)?;
        let mut tracker = Self {
            concepts_unlocked: BTreeMap::new(),
            subtopics: BTreeMap::new(),
            current_concept: first.concept.key.clone(),
            current_subtopic: first.subtopic.key.clone(),
        };
        tracker.reconcile(catalog);
        Ok(tracker)
    }

    /// Align persisted state with the catalog: add missing entries, drop
    /// unknown ones, repair pointers and ordering.
    pub fn reconcile(&mut self, catalog: &Catalog) {
        let Some(first) = catalog.first_subtopic() else {
            return;
        };

        self.concepts_unlocked
            .retain(|key, _| catalog.concept(key).is_some());
        for concept in &catalog.concepts {
            self.concepts_unlocked.entry(concept.key.clone()).or_insert(false);
        }
        self.subtopics.retain(|key, _| catalog.subtopic(key).is_some());
        for entry in catalog.iter_subtopics() {
            self.subtopics.entry(entry.subtopic.key.clone()).or_default();
        }

        self.concepts_unlocked.insert(first.concept.key.clone(), true);
        if let Some(p) = self.subtopics.get_mut(&first.subtopic.key) {
            p.unlocked = true;
        }

        let current_valid = self
            .subtopics
            .get(&self.current_subtopic)
            .is_some_and(|p| p.unlocked);
        if !current_valid {
            self.current_subtopic = first.subtopic.key.clone();
        }
        if let Some(entry) = catalog.subtopic(&self.current_subtopic) {
            self.current_concept = entry.concept.key.clone();
        }

        for entry in catalog.iter_subtopics() {
            if let Some(p) = self.subtopics.get_mut(&entry.subtopic.key) {
                p.normalize();
                if p.unlocked {
                    self.concepts_unlocked.insert(entry.concept.key.clone(), true);
                }
            }
        }
    }

    pub fn current_concept(&self) -> &str {
        &self.current_concept
    }

    pub fn current_subtopic(&self) -> &str {
        &self.current_subtopic
    }

    pub fn subtopic(&self, key: &str) -> Option<&SubtopicProgress> {
        self.subtopics.get(key)
    }

    pub fn subtopics(&self) -> impl Iterator<Item = (&String, &SubtopicProgress)> {
        self.subtopics.iter()
    }

    pub fn is_concept_unlocked(&self, key: &str) -> bool {
        self.concepts_unlocked.get(key).copied().unwrap_or(false)
    }

    fn progress_mut(&mut self, key: &str) -> Result<&mut SubtopicProgress, ProgressError> {
        self.subtopics
            .get_mut(key)
            .ok_or_else(|| ProgressError::UnknownSubtopic(key.to_string()))
    }

    /// Unlock a subtopic. Returns whether anything changed.
    pub fn unlock_subtopic(&mut self, catalog: &Catalog, key: &str) -> Result<bool, ProgressError> {
        let entry = catalog
            .subtopic(key)
            .ok_or_else(|| ProgressError::UnknownSubtopic(key.to_string()))?;
        let concept_key = entry.concept.key.clone();
        let progress = self.progress_mut(key)?;
        if progress.unlocked {
            return Ok(false);
        }
        progress.unlocked = true;
        if progress.points.iter().all(|p| *p == PointStatus::Locked) {
            progress.points[0] = PointStatus::Active;
        }
        self.concepts_unlocked.insert(concept_key, true);
        info!(subtopic = key, "subtopic unlocked");
        Ok(true)
    }

    /// Master a subtopic, completing its points and unlocking the next one.
    /// Returns `None` if it was already mastered.
    pub fn mark_subtopic_mastered(
        &mut self,
        catalog: &Catalog,
        key: &str,
    ) -> Result<Option<MasteryOutcome>, ProgressError> {
        if catalog.subtopic(key).is_none() {
            return Err(ProgressError::UnknownSubtopic(key.to_string()));
        }
        let progress = self.progress_mut(key)?;
        if progress.mastered {
            return Ok(None);
        }
        progress.unlocked = true;
        progress.mastered = true;
        progress.points = [PointStatus::Completed; N];
        info!(subtopic = key, "subtopic mastered");

        let mut unlocked_next = None;
        if let Some(next) = catalog.next_subtopic(key) {
            let next_key = next.subtopic.key.clone();
            let next_concept = next.concept.key.clone();
            self.unlock_subtopic(catalog, &next_key)?;
            self.current_subtopic = next_key.clone();
            self.current_concept = next_concept;
            unlocked_next = Some(next_key);
        }

        Ok(Some(MasteryOutcome {
            mastered: key.to_string(),
            unlocked_next,
        }))
    }

    /// Mark narrative episode `n` (1-based learning point) of the current subtopic.
    ///
    /// Earlier points are completed too, keeping completion sequential.
    pub fn mark_episode_mastered(&mut self, n: u8) -> Result<Vec<PointTransition>, ProgressError> {
        let n = n as usize;
        if !(1..=N).contains(&n) {
            return Err(ProgressError::InvalidEpisode(n as u8));
        }
        let key = self.current_subtopic.clone();
        let progress = self.progress_mut(&key)?;
        let mut transitions = Vec::new();
        for idx in 0..n {
            if progress.points[idx] != PointStatus::Completed {
                progress.points[idx] = PointStatus::Completed;
                transitions.push(PointTransition {
                    subtopic: key.clone(),
                    index: idx,
                    to: PointStatus::Completed,
                });
            }
        }
        if n < N && progress.points[n] == PointStatus::Locked {
            progress.points[n] = PointStatus::Active;
            transitions.push(PointTransition {
                subtopic: key.clone(),
                index: n,
                to: PointStatus::Active,
            });
        }
        debug!(subtopic = %key, episode = n, changes = transitions.len(), "episode mastered");
        Ok(transitions)
    }

    /// Key-term scan of the recent conversation for the current subtopic.
    ///
    /// The frontier point activates when at least 2 of its key terms appear in
    /// the last 6 messages; the active point completes when at least 3 appear
    /// or a question was posed in that window. At most one point completes
    /// per scan, and completing it activates the next.
    pub fn update_learning_point_progress(
        &mut self,
        catalog: &Catalog,
        messages: &[TranscriptMessage],
    ) -> Vec<PointTransition> {
        let key = self.current_subtopic.clone();
        let Some(entry) = catalog.subtopic(&key) else {
            return Vec::new();
        };
        let Some(progress) = self.subtopics.get_mut(&key) else {
            return Vec::new();
        };
        if progress.mastered {
            return Vec::new();
        }

        let recent = &messages[messages.len().saturating_sub(TERM_SCAN_WINDOW)..];
        let text = recent
            .iter()
            .map(|m| m.content.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ");
        let question_posed = recent.iter().any(|m| {
            m.meta.question_kind.is_some()
                || m.content.contains(MINI_QUESTION_MARKER)
                || m.content.contains(QUIZ_MARKER)
        });

        let mut transitions = Vec::new();
        for idx in 0..N {
            let matches = key_terms(&entry.subtopic.learning_points[idx])
                .iter()
                .filter(|term| text.contains(term.as_str()))
                .count();
            match progress.points[idx] {
                PointStatus::Completed => continue,
                PointStatus::Active => {
                    if matches >= TERMS_TO_COMPLETE || question_posed {
                        progress.complete_and_advance(idx);
                        transitions.push(PointTransition {
                            subtopic: key.clone(),
                            index: idx,
                            to: PointStatus::Completed,
                        });
                        if idx + 1 < N && progress.points[idx + 1] == PointStatus::Active {
                            transitions.push(PointTransition {
                                subtopic: key.clone(),
                                index: idx + 1,
                                to: PointStatus::Active,
                            });
                        }
                    }
                    break;
                }
                PointStatus::Locked => {
                    if matches >= TERMS_TO_ACTIVATE {
                        progress.points[idx] = PointStatus::Active;
                        transitions.push(PointTransition {
                            subtopic: key.clone(),
                            index: idx,
                            to: PointStatus::Active,
                        });
                    }
                    break;
                }
            }
        }
        if !transitions.is_empty() {
            debug!(subtopic = %key, changes = transitions.len(), "key-term scan advanced progress");
        }
        transitions
    }

    /// Complete the active point when the learner gave at least 2 answers of
    /// 6+ words among the last 4 messages. Returns whether a promotion occurred.
    pub fn check_learning_point_understanding(&mut self, messages: &[TranscriptMessage]) -> bool {
        let recent = &messages[messages.len().saturating_sub(UNDERSTANDING_WINDOW)..];
        let substantive = recent
            .iter()
            .filter(|m| m.role == Role::User && word_count(&m.content) >= UNDERSTANDING_MIN_WORDS)
            .count();
        if substantive < UNDERSTANDING_MIN_ANSWERS {
            return false;
        }
        self.advance_active_point().is_some()
    }

    /// Complete the active point of the current subtopic and activate the next.
    pub fn advance_active_point(&mut self) -> Option<PointTransition> {
        let key = self.current_subtopic.clone();
        let progress = self.subtopics.get_mut(&key)?;
        let idx = progress.active_index()?;
        progress.complete_and_advance(idx);
        debug!(subtopic = %key, point = idx, "learning point completed");
        Some(PointTransition {
            subtopic: key,
            index: idx,
            to: PointStatus::Completed,
        })
    }

    /// Master the current subtopic once all its points are completed.
    pub fn master_if_complete(&mut self, catalog: &Catalog) -> Result<Option<MasteryOutcome>, ProgressError> {
        let key = self.current_subtopic.clone();
        match self.subtopics.get(&key) {
            Some(p) if !p.mastered && p.all_completed() => self.mark_subtopic_mastered(catalog, &key),
            _ => Ok(None),
        }
    }

    pub fn get_current_subtopic_status(&self) -> SubtopicStatus {
        match self.subtopics.get(&self.current_subtopic) {
            Some(p) if p.mastered => SubtopicStatus::Mastered,
            Some(p) if p.completed_count() >= 3 => SubtopicStatus::NearlyComplete,
            Some(p) if p.completed_count() >= 1 => SubtopicStatus::InProgress,
            _ => SubtopicStatus::NotStarted,
        }
    }
}

/// Distinct lowercase words longer than four characters, minus stopwords.
fn key_terms(description: &str) -> Vec<String> {
    let mut terms: Vec<String> = Vec::new();
    for word in description
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= KEY_TERM_MIN_CHARS)
    {
        if !STOPWORDS.contains(&word) && !terms.iter().any(|t| t == word) {
            terms.push(word.to_string());
        }
    }
    terms
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::TranscriptMessage;

    fn tracker() -> (Catalog, ProgressTracker) {
        let catalog = Catalog::builtin();
        let tracker = ProgressTracker::new(&catalog).unwrap();
        (catalog, tracker)
    }

    fn assert_invariants(tracker: &ProgressTracker) {
        for (key, p) in tracker.subtopics() {
            if p.mastered {
                assert!(p.unlocked, "{key} mastered but locked");
                assert!(p.all_completed(), "{key} mastered with open points");
            }
            let active = p.points.iter().filter(|s| **s == PointStatus::Active).count();
            assert!(active <= 1, "{key} has {active} active points");
            for i in 1..N {
                if p.points[i] != PointStatus::Locked {
                    assert_eq!(p.points[i - 1], PointStatus::Completed, "{key} point {i} out of order");
                }
            }
        }
    }

    #[test]
    fn test_initial_state() {
        let (_, t) = tracker();
        assert_eq!(t.current_subtopic(), "silk_roads");
        assert_eq!(t.current_concept(), "networks_of_exchange");
        assert!(t.is_concept_unlocked("networks_of_exchange"));
        let first = t.subtopic("silk_roads").unwrap();
        assert!(first.unlocked);
        assert_eq!(first.points[0], PointStatus::Active);
        assert!(!t.subtopic("mongol_empire").unwrap().unlocked);
        assert_eq!(t.get_current_subtopic_status(), SubtopicStatus::NotStarted);
        assert_invariants(&t);
    }

    #[test]
    fn test_unlock_is_idempotent() {
        let (catalog, mut t) = tracker();
        assert!(t.unlock_subtopic(&catalog, "indian_ocean").unwrap());
        assert!(!t.unlock_subtopic(&catalog, "indian_ocean").unwrap());
        assert!(matches!(
            t.unlock_subtopic(&catalog, "atlantis"),
            Err(ProgressError::UnknownSubtopic(_))
        ));
    }

    #[test]
    fn test_mastery_unlocks_next_and_moves_current() {
        let (catalog, mut t) = tracker();
        let outcome = t.mark_subtopic_mastered(&catalog, "silk_roads").unwrap().unwrap();
        assert_eq!(outcome.unlocked_next.as_deref(), Some("mongol_empire"));
        assert_eq!(t.current_subtopic(), "mongol_empire");
        let mastered = t.subtopic("silk_roads").unwrap();
        assert!(mastered.unlocked && mastered.mastered);
        assert!(mastered.points.iter().all(|p| *p == PointStatus::Completed));
        assert!(t.subtopic("mongol_empire").unwrap().unlocked);
        assert_invariants(&t);

        assert!(t.mark_subtopic_mastered(&catalog, "silk_roads").unwrap().is_none());
    }

    #[test]
    fn test_mastering_last_subtopic_keeps_current() {
        let (catalog, mut t) = tracker();
        let outcome = t
            .mark_subtopic_mastered(&catalog, "comparison_of_exchange")
            .unwrap()
            .unwrap();
        assert!(outcome.unlocked_next.is_none());
        assert_eq!(t.current_subtopic(), "silk_roads");
        assert_invariants(&t);
    }

    #[test]
    fn test_episode_mastery() {
        let (_, mut t) = tracker();
        t.mark_episode_mastered(1).unwrap();
        let p = t.subtopic("silk_roads").unwrap();
        assert_eq!(p.points[0], PointStatus::Completed);
        assert_eq!(p.points[1], PointStatus::Active);
        assert_eq!(t.get_current_subtopic_status(), SubtopicStatus::InProgress);
        assert_invariants(&t);
    }

    #[test]
    fn test_episode_mastery_fills_forward() {
        let (_, mut t) = tracker();
        t.mark_episode_mastered(3).unwrap();
        let p = t.subtopic("silk_roads").unwrap();
        assert_eq!(p.completed_count(), 3);
        assert_eq!(p.points[3], PointStatus::Active);
        assert_eq!(t.get_current_subtopic_status(), SubtopicStatus::NearlyComplete);
        assert_invariants(&t);

        assert_eq!(t.mark_episode_mastered(0), Err(ProgressError::InvalidEpisode(0)));
        assert_eq!(t.mark_episode_mastered(5), Err(ProgressError::InvalidEpisode(5)));
    }

    #[test]
    fn test_master_if_complete() {
        let (catalog, mut t) = tracker();
        t.mark_episode_mastered(3).unwrap();
        assert!(t.master_if_complete(&catalog).unwrap().is_none());
        t.mark_episode_mastered(4).unwrap();
        let outcome = t.master_if_complete(&catalog).unwrap().unwrap();
        assert_eq!(outcome.mastered, "silk_roads");
        assert_eq!(t.current_subtopic(), "mongol_empire");
    }

    #[test]
    fn test_key_terms() {
        let terms = key_terms("Gold from West Africa was exchanged for salt from the Sahara");
        assert_eq!(terms, vec!["africa", "exchanged", "sahara"]);
        let terms = key_terms("Caravanserai and trading cities supported merchants along the routes");
        assert!(!terms.contains(&"along".to_string()));
        assert!(terms.contains(&"caravanserai".to_string()));
    }

    #[test]
    fn test_term_scan_completes_active_point() {
        let (catalog, mut t) = tracker();
        let messages = vec![
            TranscriptMessage::user("Tell me about luxury goods like silk", 0),
            TranscriptMessage::assistant("Porcelain travelled overland too.", 1),
        ];
        let changes = t.update_learning_point_progress(&catalog, &messages);
        // "luxury", "porcelain", "travelled", "overland" all match point 0.
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].index, 0);
        assert_eq!(changes[0].to, PointStatus::Completed);
        assert_eq!(changes[1].index, 1);
        assert_eq!(changes[1].to, PointStatus::Active);
        let p = t.subtopic("silk_roads").unwrap();
        assert_eq!(p.points[0], PointStatus::Completed);
        assert_eq!(p.points[1], PointStatus::Active);
        assert_invariants(&t);
    }

    #[test]
    fn test_term_scan_activates_frontier_point() {
        let (catalog, mut t) = tracker();
        t.mark_episode_mastered(1).unwrap();
        // Make point 1 the frontier without activating it.
        t.subtopics.get_mut("silk_roads").unwrap().points[1] = PointStatus::Locked;
        let messages = vec![TranscriptMessage::user(
            "Did caravanserai help merchants rest?",
            0,
        )];
        let changes = t.update_learning_point_progress(&catalog, &messages);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].index, 1);
        assert_eq!(changes[0].to, PointStatus::Active);
        assert_invariants(&t);
    }

    #[test]
    fn test_term_scan_needs_enough_terms() {
        let (catalog, mut t) = tracker();
        let messages = vec![TranscriptMessage::user("silk is nice", 0)];
        assert!(t.update_learning_point_progress(&catalog, &messages).is_empty());
        assert_eq!(t.subtopic("silk_roads").unwrap().points[0], PointStatus::Active);
    }

    #[test]
    fn test_term_scan_question_marker_completes_active() {
        let (catalog, mut t) = tracker();
        let mut asked = TranscriptMessage::assistant("**Mini-Question:** What do you think?", 0);
        asked.meta.question_kind = Some(crate::classifier::QuestionKind::Mini);
        let changes = t.update_learning_point_progress(&catalog, &[asked]);
        assert_eq!(changes[0].to, PointStatus::Completed);
        let p = t.subtopic("silk_roads").unwrap();
        assert_eq!(p.completed_count(), 1);
        assert_eq!(p.points[1], PointStatus::Active);
        assert_eq!(p.points[2], PointStatus::Locked);
    }

    #[test]
    fn test_term_scan_only_looks_at_recent_messages() {
        let (catalog, mut t) = tracker();
        let mut messages = vec![TranscriptMessage::user(
            "luxury porcelain travelled overland",
            0,
        )];
        for i in 0..6 {
            messages.push(TranscriptMessage::user("ok", i + 1));
        }
        assert!(t.update_learning_point_progress(&catalog, &messages).is_empty());
    }

    #[test]
    fn test_understanding_check() {
        let (_, mut t) = tracker();
        let short = vec![
            TranscriptMessage::user("yes", 0),
            TranscriptMessage::assistant("Tell me more.", 1),
            TranscriptMessage::user("Merchants needed safe places to rest on long journeys", 2),
        ];
        assert!(!t.check_learning_point_understanding(&short));

        let long = vec![
            TranscriptMessage::user("Merchants needed safe places to rest on long journeys", 0),
            TranscriptMessage::assistant("Good. Why else?", 1),
            TranscriptMessage::user("Cities grew around trade because caravans stopped there", 2),
        ];
        assert!(t.check_learning_point_understanding(&long));
        let p = t.subtopic("silk_roads").unwrap();
        assert_eq!(p.points[0], PointStatus::Completed);
        assert_eq!(p.points[1], PointStatus::Active);
        assert_invariants(&t);
    }

    #[test]
    fn test_status_transitions_never_regress() {
        let (catalog, mut t) = tracker();
        t.mark_episode_mastered(2).unwrap();
        let before = t.subtopic("silk_roads").unwrap().clone();
        // A lower episode must not reopen anything.
        t.mark_episode_mastered(1).unwrap();
        t.update_learning_point_progress(&catalog, &[]);
        assert_eq!(t.subtopic("silk_roads").unwrap(), &before);
    }

    #[test]
    fn test_reconcile_repairs_persisted_state() {
        let (catalog, mut t) = tracker();
        t.subtopics.remove("indian_ocean");
        t.subtopics.insert("atlantis".to_string(), SubtopicProgress::default());
        let broken = t.subtopics.get_mut("mongol_empire").unwrap();
        broken.mastered = true;
        broken.unlocked = false;
        let gap = t.subtopics.get_mut("silk_roads").unwrap();
        gap.points = [
            PointStatus::Locked,
            PointStatus::Completed,
            PointStatus::Active,
            PointStatus::Locked,
        ];
        t.current_subtopic = "atlantis".to_string();

        t.reconcile(&catalog);
        assert!(t.subtopic("indian_ocean").is_some());
        assert!(t.subtopic("atlantis").is_none());
        assert_eq!(t.current_subtopic(), "silk_roads");
        assert_eq!(
            t.subtopic("silk_roads").unwrap().points,
            [
                PointStatus::Completed,
                PointStatus::Completed,
                PointStatus::Active,
                PointStatus::Locked
            ]
        );
        assert_invariants(&t);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let (catalog, mut t) = tracker();
        t.mark_subtopic_mastered(&catalog, "silk_roads").unwrap();
        t.mark_episode_mastered(2).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert!(json.contains("\"completed\""));
        let parsed: ProgressTracker = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, t);
    }
}
