use tracing::warn;

use crate::classifier::QuestionKind;

pub const MINI_QUESTION_MARKER: &str = "[MINI-Q]";
pub const QUIZ_MARKER: &str = "[QUIZ]";
pub const EPISODE_MARKER_PREFIX: &str = "[EPISODE-MASTERED:";
pub const SUBTOPIC_COMPLETE_MARKER: &str = "[SUBTOPIC-COMPLETE]";

const MINI_QUESTION_LABEL: &str = "**Mini-Question:**";
const QUIZ_LABEL: &str = "**Quiz:**";

/// Control signal carried by a generator reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplySignal {
    PlainText,
    MiniQuestion,
    Quiz,
    EpisodeMastered(u8),
    SubtopicComplete,
}

/// A generator reply with its markers interpreted and stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReply {
    pub text: String,
    pub signals: Vec<ReplySignal>,
}

impl ParsedReply {
    /// The question this reply poses. A mini-question wins over a quiz.
    pub fn question_kind(&self) -> Option<QuestionKind> {
        if self.signals.contains(&ReplySignal::MiniQuestion) {
            Some(QuestionKind::Mini)
        } else if self.signals.contains(&ReplySignal::Quiz) {
            Some(QuestionKind::Quiz)
        } else {
            None
        }
    }

    pub fn episodes(&self) -> impl Iterator<Item = u8> + '_ {
        self.signals.iter().filter_map(|s| match s {
            ReplySignal::EpisodeMastered(n) => Some(*n),
            _ => None,
        })
    }

    pub fn subtopic_complete(&self) -> bool {
        self.signals.contains(&ReplySignal::SubtopicComplete)
    }
}

/// Interpret and strip the literal, case-sensitive control markers.
pub fn parse_reply(raw: &str) -> ParsedReply {
    let mut signals = Vec::new();
    let mut text = raw.to_string();

    if text.contains(MINI_QUESTION_MARKER) {
        signals.push(ReplySignal::MiniQuestion);
        text = text.replace(MINI_QUESTION_MARKER, MINI_QUESTION_LABEL);
    }
    if text.contains(QUIZ_MARKER) {
        signals.push(ReplySignal::Quiz);
        text = text.replace(QUIZ_MARKER, QUIZ_LABEL);
    }
    if text.contains(SUBTOPIC_COMPLETE_MARKER) {
        signals.push(ReplySignal::SubtopicComplete);
        text = text.replace(SUBTOPIC_COMPLETE_MARKER, "");
    }

    while let Some(start) = text.find(EPISODE_MARKER_PREFIX) {
        let rest = &text[start + EPISODE_MARKER_PREFIX.len()..];
        let Some(close) = rest.find(']') else {
            warn!("unterminated episode marker in reply");
            text.replace_range(start..start + EPISODE_MARKER_PREFIX.len(), "");
            continue;
        };
        let body = &rest[..close];
        match body.trim().parse::<u8>() {
            Ok(n) if (1..=4).contains(&n) => signals.push(ReplySignal::EpisodeMastered(n)),
            _ => warn!(marker = body, "ignoring malformed episode marker"),
        }
        let end = start + EPISODE_MARKER_PREFIX.len() + close + 1;
        text.replace_range(start..end, "");
    }

    if signals.is_empty() {
        signals.push(ReplySignal::PlainText);
    }

    ParsedReply {
        text: text.trim().to_string(),
        signals,
    }
}
