use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::classifier::TeachingStyle;

/// Something the presentation layer may want to surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    SubtopicUnlocked { subtopic: String },
    SubtopicMastered { subtopic: String },
    EpisodeMastered { subtopic: String, episode: u8 },
    XpAwarded { amount: u32, reason: String },
    LevelUp { level: u32 },
    PersonalityChanged { personality: TeachingStyle },
    StateSaveFailed { error: String },
    GeneratorFallback { error: String },
}

impl Notification {
    pub fn topic(&self) -> &'static str {
        match self {
            Notification::SubtopicUnlocked { .. } => topics::SUBTOPIC_UNLOCKED,
            Notification::SubtopicMastered { .. } => topics::SUBTOPIC_MASTERED,
            Notification::EpisodeMastered { .. } => topics::EPISODE_MASTERED,
            Notification::XpAwarded { .. } => topics::XP_AWARDED,
            Notification::LevelUp { .. } => topics::LEVEL_UP,
            Notification::PersonalityChanged { .. } => topics::PERSONALITY_CHANGED,
            Notification::StateSaveFailed { .. } => topics::STATE_SAVE_FAILED,
            Notification::GeneratorFallback { .. } => topics::GENERATOR_FALLBACK,
        }
    }
}

/// A notification published on the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TutorEvent {
    pub topic: String,
    pub notification: Notification,
    pub timestamp: i64,
}

impl TutorEvent {
    pub fn new(notification: Notification, timestamp: i64) -> Self {
        Self {
            topic: notification.topic().to_string(),
            notification,
            timestamp,
        }
    }
}

pub type SubscriptionId = u64;

type Callback = Box<dyn Fn(&TutorEvent)>;

/// In-process event bus with bounded history.
pub struct EventBus {
    subscriptions: HashMap<String, Vec<(SubscriptionId, Callback)>>,
    history: Vec<TutorEvent>,
    history_limit: usize,
    next_sub_id: SubscriptionId,
}

impl EventBus {
    pub fn new(history_limit: usize) -> Self {
        Self {
            subscriptions: HashMap::new(),
            history: Vec::new(),
            history_limit,
            next_sub_id: 1,
        }
    }

    /// Subscribe to a topic, or to every topic with [`topics::ALL`].
    pub fn subscribe(&mut self, topic: &str, callback: Callback) -> SubscriptionId {
        let id = self.next_sub_id;
        self.next_sub_id += 1;
        self.subscriptions
            .entry(topic.to_string())
            .or_default()
            .push((id, callback));
        id
    }

    pub fn unsubscribe(&mut self, sub_id: SubscriptionId) -> bool {
        for subs in self.subscriptions.values_mut() {
            let before = subs.len();
            subs.retain(|(id, _)| *id != sub_id);
            if subs.len() < before {
                return true;
            }
        }
        false
    }

    pub fn emit(&mut self, event: TutorEvent) {
        for key in [event.topic.as_str(), topics::ALL] {
            if let Some(subs) = self.subscriptions.get(key) {
                for (_, callback) in subs {
                    callback(&event);
                }
            }
        }

        self.history.push(event);
        if self.history.len() > self.history_limit {
            let excess = self.history.len() - self.history_limit;
            self.history.drain(..excess);
        }
    }

    pub fn history(&self, topic: Option<&str>) -> Vec<&TutorEvent> {
        match topic {
            Some(t) => self.history.iter().filter(|e| e.topic == t).collect(),
            None => self.history.iter().collect(),
        }
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(200)
    }
}

pub mod topics {
    pub const ALL: &str = "*";
    pub const SUBTOPIC_UNLOCKED: &str = "progress.subtopic.unlocked";
    pub const SUBTOPIC_MASTERED: &str = "progress.subtopic.mastered";
    pub const EPISODE_MASTERED: &str = "progress.episode.mastered";
    pub const XP_AWARDED: &str = "xp.awarded";
    pub const LEVEL_UP: &str = "xp.level_up";
    pub const PERSONALITY_CHANGED: &str = "session.personality";
    pub const STATE_SAVE_FAILED: &str = "store.save_failed";
    pub const GENERATOR_FALLBACK: &str = "generator.fallback";
}
