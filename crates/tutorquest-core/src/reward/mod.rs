//! Converts raw turn outcomes into bandit rewards in [0, 1].
//!
//! The constants here are empirically tuned and kept as-is for behavioural
//! compatibility with existing learner histories.

use serde::{Deserialize, Serialize};

use crate::bandit::HintPolicy;

/// Thumbs feedback on a tutor message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Thumb {
    Up,
    Down,
}

impl std::str::FromStr for Thumb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "+" | "+1" => Ok(Thumb::Up),
            "down" | "-" | "-1" => Ok(Thumb::Down),
            other => Err(format!("unknown feedback: {other} (expected up or down)")),
        }
    }
}

/// How well the hint policy served this answer.
pub fn hint_effectiveness_reward(
    policy: HintPolicy,
    hint_was_given: bool,
    answer_correct: bool,
    response_time_secs: f64,
    attempt_count: u32,
) -> f64 {
    let reward: f64 = if answer_correct {
        let mut r = 0.6;
        r += if response_time_secs < 60.0 {
            0.2
        } else if response_time_secs < 120.0 {
            0.1
        } else {
            0.0
        };
        r += match attempt_count {
            0 | 1 => 0.2,
            2 => 0.1,
            _ => 0.0,
        };
        if policy == HintPolicy::NoAutomaticHints && hint_was_given {
            r -= 0.1;
        }
        if policy == HintPolicy::LightHints && !hint_was_given {
            r += 0.1;
        }
        r
    } else {
        let mut r = 0.2;
        match policy {
            HintPolicy::FullHints if hint_was_given => r -= 0.1,
            HintPolicy::LightHints if hint_was_given => r -= 0.05,
            // The policy starved a struggling learner.
            HintPolicy::NoAutomaticHints if !hint_was_given => r -= 0.1,
            _ => {}
        }
        r
    };
    reward.clamp(0.0, 1.0)
}

/// Reward for the quiz difficulty in effect.
pub fn quiz_difficulty_reward(answer_correct: bool, response_time_secs: f64) -> f64 {
    if response_time_secs <= 120.0 {
        if answer_correct {
            1.0
        } else {
            0.3
        }
    } else if response_time_secs <= 180.0 {
        0.5
    } else {
        0.0
    }
}

/// Reward for the question depth in effect (Socratic mini-questions).
pub fn question_depth_reward(answer_correct: bool, response_time_secs: f64, disengaged: bool) -> f64 {
    if answer_correct {
        if response_time_secs < 90.0 {
            1.0
        } else if response_time_secs < 180.0 {
            0.7
        } else {
            0.4
        }
    } else if disengaged {
        0.1
    } else {
        0.4
    }
}

pub fn user_feedback_reward(thumb: Thumb) -> f64 {
    match thumb {
        Thumb::Up => 1.0,
        Thumb::Down => 0.0,
    }
}
