use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of question the tutor posed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Mini,
    Quiz,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Mini => "mini",
            QuestionKind::Quiz => "quiz",
        }
    }
}

/// Teaching personality the tutor is currently using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TeachingStyle {
    #[default]
    #[serde(alias = "socratic")]
    Socratic,
    #[serde(alias = "narrative")]
    Narrative,
    #[serde(alias = "direct")]
    Direct,
}

impl TeachingStyle {
    pub const ALL: [TeachingStyle; 3] = [
        TeachingStyle::Socratic,
        TeachingStyle::Narrative,
        TeachingStyle::Direct,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TeachingStyle::Socratic => "Socratic",
            TeachingStyle::Narrative => "Narrative",
            TeachingStyle::Direct => "Direct",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TeachingStyle::Socratic => "Guides you with layered questions",
            TeachingStyle::Narrative => "Immerses you in historical stories",
            TeachingStyle::Direct => "Delivers clear, structured lessons",
        }
    }
}

impl fmt::Display for TeachingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TeachingStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "socratic" => Ok(TeachingStyle::Socratic),
            "narrative" => Ok(TeachingStyle::Narrative),
            "direct" => Ok(TeachingStyle::Direct),
            other => Err(format!("unknown teaching style: {other}")),
        }
    }
}

/// Outcome of classifying one learner answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub accepted: bool,
    pub reward_xp: u32,
    pub reason: &'static str,
}

impl Verdict {
    fn accept(reward_xp: u32, reason: &'static str) -> Self {
        Self {
            accepted: true,
            reward_xp,
            reason,
        }
    }

    fn reject(reason: &'static str) -> Self {
        Self {
            accepted: false,
            reward_xp: 0,
            reason,
        }
    }
}

pub const QUIZ_REWARD_XP: u32 = 25;
pub const THOUGHTFUL_REWARD_XP: u32 = 10;
pub const CREATIVE_REWARD_XP: u32 = 5;

const EXACT_DONT_KNOW: &[&str] = &[
    "idk",
    "i don't know",
    "i dont know",
    "no idea",
    "not sure",
    "no clue",
    "?",
    "??",
    "???",
];

const CONTAINS_DONT_KNOW: &[&str] = &["i don't know", "i dont know", "dont know", "don't know"];

const EMPATHY_KEYWORDS: &[&str] = &[
    "feel", "felt", "think", "imagine", "because", "worried", "afraid", "hope", "angry", "tired",
];

/// Counts whitespace-separated tokens that contain at least one alphanumeric character.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|w| w.chars().any(char::is_alphanumeric))
        .count()
}

/// Lowercase and collapse internal whitespace.
fn canonicalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Whether the answer is one of the "I don't know" phrases, exactly or as a substring.
pub fn is_dont_know(answer: &str) -> bool {
    let cleaned = canonicalize(answer);
    EXACT_DONT_KNOW.contains(&cleaned.as_str())
        || CONTAINS_DONT_KNOW.iter().any(|p| cleaned.contains(p))
}

/// Heuristic acceptance check for a free-text answer.
///
/// Rules apply in order: minimum length, quiz acceptance, "don't know"
/// rejection, then per-style thresholds for mini-questions. Pure; callers
/// apply the reward.
pub fn check_answer_quality(answer: &str, kind: QuestionKind, style: TeachingStyle) -> Verdict {
    let words = word_count(answer);
    if words < 2 {
        return Verdict::reject("Answer too short");
    }

    if kind == QuestionKind::Quiz {
        if style == TeachingStyle::Direct && words < 3 {
            return Verdict::reject("Answer too short");
        }
        return Verdict::accept(QUIZ_REWARD_XP, "Quiz mastery");
    }

    if is_dont_know(answer) {
        return Verdict::reject("No attempt");
    }

    match style {
        TeachingStyle::Socratic => {
            if words >= 6 {
                Verdict::accept(THOUGHTFUL_REWARD_XP, "Thoughtful response")
            } else {
                Verdict::reject("Needs more reasoning")
            }
        }
        TeachingStyle::Narrative => {
            let lower = answer.to_lowercase();
            if words >= 8 || EMPATHY_KEYWORDS.iter().any(|k| lower.contains(k)) {
                Verdict::accept(THOUGHTFUL_REWARD_XP, "Insightful historical perspective")
            } else if words >= 4 {
                Verdict::accept(CREATIVE_REWARD_XP, "Creative engagement")
            } else {
                Verdict::reject("Needs more detail")
            }
        }
        // Direct teaching only poses quizzes.
        TeachingStyle::Direct => Verdict::reject("Unexpected mini-question"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_word_rejected() {
        let v = check_answer_quality("ok", QuestionKind::Mini, TeachingStyle::Socratic);
        assert!(!v.accepted);
        assert_eq!(v.reward_xp, 0);
    }

    #[test]
    fn test_dont_know_rejected() {
        let v = check_answer_quality("I don't know", QuestionKind::Mini, TeachingStyle::Socratic);
        assert!(!v.accepted);
        assert_eq!(v.reward_xp, 0);
    }

    #[test]
    fn test_dont_know_substring_rejected() {
        let v = check_answer_quality(
            "Honestly I   DONT know what happened there at all",
            QuestionKind::Mini,
            TeachingStyle::Narrative,
        );
        assert!(!v.accepted);
    }

    #[test]
    fn test_socratic_thoughtful_response() {
        let v = check_answer_quality(
            "Because the empire needed control of trade taxes and military routes",
            QuestionKind::Mini,
            TeachingStyle::Socratic,
        );
        assert!(v.accepted);
        assert_eq!(v.reward_xp, 10);
        assert_eq!(v.reason, "Thoughtful response");
    }

    #[test]
    fn test_socratic_short_answer_rejected() {
        let v = check_answer_quality("trade was important", QuestionKind::Mini, TeachingStyle::Socratic);
        assert!(!v.accepted);
        assert_eq!(v.reward_xp, 0);
    }

    #[test]
    fn test_quiz_accepts_any_multiword_answer() {
        for style in TeachingStyle::ALL {
            let v = check_answer_quality("gold for salt", QuestionKind::Quiz, style);
            assert!(v.accepted, "{style}");
            assert_eq!(v.reward_xp, 25);
            assert_eq!(v.reason, "Quiz mastery");
        }
    }

    #[test]
    fn test_direct_quiz_needs_three_words() {
        let v = check_answer_quality("gold salt", QuestionKind::Quiz, TeachingStyle::Direct);
        assert!(!v.accepted);
        let v = check_answer_quality("gold salt", QuestionKind::Quiz, TeachingStyle::Socratic);
        assert!(v.accepted);
    }

    #[test]
    fn test_narrative_tiers() {
        let v = check_answer_quality("I feel scared", QuestionKind::Mini, TeachingStyle::Narrative);
        assert_eq!((v.accepted, v.reward_xp), (true, 10));
        assert_eq!(v.reason, "Insightful historical perspective");

        let v = check_answer_quality(
            "the caravan keeps moving",
            QuestionKind::Mini,
            TeachingStyle::Narrative,
        );
        assert_eq!((v.accepted, v.reward_xp), (true, 5));
        assert_eq!(v.reason, "Creative engagement");

        let v = check_answer_quality("go north", QuestionKind::Mini, TeachingStyle::Narrative);
        assert!(!v.accepted);
    }

    #[test]
    fn test_direct_mini_rejected() {
        let v = check_answer_quality(
            "monsoon winds set the sailing season each year",
            QuestionKind::Mini,
            TeachingStyle::Direct,
        );
        assert!(!v.accepted);
        assert_eq!(v.reward_xp, 0);
    }

    #[test]
    fn test_degenerate_input_rejected() {
        for input in ["", "   ", "?? !!", "... ---"] {
            let v = check_answer_quality(input, QuestionKind::Quiz, TeachingStyle::Socratic);
            assert!(!v.accepted, "{input:?}");
            assert_eq!(v.reward_xp, 0);
        }
    }

    #[test]
    fn test_word_count_ignores_punctuation() {
        assert_eq!(word_count("hello , world !"), 2);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_style_parse_and_serde() {
        assert_eq!("narrative".parse::<TeachingStyle>().unwrap(), TeachingStyle::Narrative);
        assert!("lecture".parse::<TeachingStyle>().is_err());
        let json = serde_json::to_string(&TeachingStyle::Direct).unwrap();
        assert_eq!(json, "\"Direct\"");
        let json = serde_json::to_string(&QuestionKind::Mini).unwrap();
        assert_eq!(json, "\"mini\"");
    }

    #[test]
    fn test_style_deserializes_lowercase_names() {
        let style: TeachingStyle = serde_json::from_str("\"narrative\"").unwrap();
        assert_eq!(style, TeachingStyle::Narrative);
        let style: TeachingStyle = serde_json::from_str("\"Direct\"").unwrap();
        assert_eq!(style, TeachingStyle::Direct);
        // Persisted form stays canonical.
        assert_eq!(serde_json::to_string(&TeachingStyle::Socratic).unwrap(), "\"Socratic\"");
    }
}
