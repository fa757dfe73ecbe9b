//! Experience points, levels, badges, and daily actions.

use serde::{Deserialize, Serialize};
use tracing::info;

pub const DEFAULT_XP_PER_LEVEL: u32 = 100;

/// Fraction of the way to the next level, in [0, 1).
pub fn level_progress(xp: u32, xp_per_level: u32) -> f64 {
    let per = xp_per_level.max(1);
    (f64::from(xp % per) / f64::from(per)).min(1.0)
}

fn level_for(xp: u32, xp_per_level: u32) -> u32 {
    1 + xp / xp_per_level.max(1)
}

/// Learner XP and level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub xp: u32,
    pub level: u32,
}

impl Default for Progression {
    fn default() -> Self {
        Self { xp: 0, level: 1 }
    }
}

impl Progression {
    /// Rebuild from persisted values. The level never drops below what the XP implies.
    pub fn restore(xp: u32, level: u32, xp_per_level: u32) -> Self {
        Self {
            xp,
            level: level.max(level_for(xp, xp_per_level)),
        }
    }

    /// Add XP. Returns the new level when it increased.
    pub fn award(&mut self, amount: u32, reason: &str, xp_per_level: u32) -> Option<u32> {
        self.xp = self.xp.saturating_add(amount);
        info!(amount, reason, total = self.xp, "xp awarded");
        let computed = level_for(self.xp, xp_per_level);
        if computed > self.level {
            self.level = computed;
            info!(level = computed, "level up");
            Some(computed)
        } else {
            None
        }
    }

    pub fn xp_to_next_level(&self, xp_per_level: u32) -> u32 {
        let per = xp_per_level.max(1);
        per - self.xp % per
    }

    pub fn badges(&self) -> Vec<Badge> {
        Badge::ALL
            .into_iter()
            .filter(|b| self.level >= b.min_level())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Badge {
    Starter,
    FocusedLearner,
    KnowledgeSeeker,
}

impl Badge {
    pub const ALL: [Badge; 3] = [Badge::Starter, Badge::FocusedLearner, Badge::KnowledgeSeeker];

    pub fn min_level(&self) -> u32 {
        match self {
            Badge::Starter => 1,
            Badge::FocusedLearner => 2,
            Badge::KnowledgeSeeker => 5,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Badge::Starter => "Starter",
            Badge::FocusedLearner => "Focused Learner",
            Badge::KnowledgeSeeker => "Knowledge Seeker",
        }
    }
}

/// Self-reported study actions that grant fixed XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DailyAction {
    Practice,
    Lesson,
    Streak,
}

impl DailyAction {
    pub fn xp(&self) -> u32 {
        match self {
            DailyAction::Practice => 15,
            DailyAction::Lesson => 30,
            DailyAction::Streak => 10,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            DailyAction::Practice => "Practice completed",
            DailyAction::Lesson => "Lesson completed",
            DailyAction::Streak => "Streak maintained",
        }
    }
}

impl std::str::FromStr for DailyAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "practice" => Ok(DailyAction::Practice),
            "lesson" => Ok(DailyAction::Lesson),
            "streak" => Ok(DailyAction::Streak),
            other => Err(format!("unknown daily action: {other}")),
        }
    }
}
