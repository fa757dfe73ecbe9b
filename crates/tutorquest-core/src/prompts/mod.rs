//! Instruction payloads sent to the text generator.

use std::fmt::Write;

use crate::bandit::{HintPolicy, QuestionDepth, QuizDifficulty, Selections};
use crate::catalog::Catalog;
use crate::classifier::{QuestionKind, TeachingStyle};
use crate::markers::{
    EPISODE_MARKER_PREFIX, MINI_QUESTION_MARKER, QUIZ_MARKER, SUBTOPIC_COMPLETE_MARKER,
};
use crate::progress::{PointStatus, ProgressTracker};

pub fn personality_prompt(style: TeachingStyle) -> &'static str {
    match style {
        TeachingStyle::Socratic => {
            "You are a history tutor who teaches by questioning. Open each new topic with one or \
             two key facts so a newcomer can take part, then ask open questions such as \"Why do \
             you think...?\" or \"What evidence supports that?\". Build on each answer and go one \
             layer deeper every time. When the learner is unsure, give a short explanation and \
             follow with a simpler question. After three or four questions, summarise what the \
             learner worked out. Keep the tone curious and respectful."
        }
        TeachingStyle::Narrative => {
            "You are a history tutor who teaches through story. Frame each learning point as a \
             short scene with a time, a place and a feeling, and give the learner a role inside \
             it. Ask what they notice, feel or expect to happen, then reveal what actually \
             happened and why it mattered. Keep each story to a handful of exchanges before \
             recapping the key facts. Be vivid, never a list of dates."
        }
        TeachingStyle::Direct => {
            "You are a clear, structured history tutor. State the lesson objective, then present \
             the content in short chunks. Give brief corrections with optional hints when the \
             learner slips. Close each subtopic with a short quiz that reinforces the key facts. \
             Stay friendly and efficient, like a teacher reviewing notes beside the learner."
        }
    }
}

pub fn intro_prompt(style: TeachingStyle) -> &'static str {
    match style {
        TeachingStyle::Socratic => {
            "Introduce yourself warmly and give a two or three sentence primer on the current \
             subtopic so a learner with no reading can follow. Ask which part they want to \
             explore first. Do not pose a tagged question yet."
        }
        TeachingStyle::Narrative => {
            "Greet the learner and drop them into a brief scene from the current subtopic. Give \
             the essential context in a few sentences and let them choose what to experience \
             next. Do not pose a tagged question yet."
        }
        TeachingStyle::Direct => {
            "Welcome the learner, state today's objective, outline the points you will cover, \
             and ask which one to start with. Do not pose a tagged question yet."
        }
    }
}

/// Three `(label, prompt)` quick starts per style.
pub fn quick_starts(style: TeachingStyle) -> [(&'static str, &'static str); 3] {
    match style {
        TeachingStyle::Socratic => [
            (
                "Why the Silk Roads mattered",
                "Guide me with questions toward why luxury trade across Eurasia grew after 1200.",
            ),
            (
                "Mongol peace and trade",
                "Help me reason through how Mongol rule changed the safety of merchants.",
            ),
            (
                "Monsoon economics",
                "Ask me guiding questions about how the monsoon shaped Indian Ocean trade.",
            ),
        ],
        TeachingStyle::Narrative => [
            (
                "Caravanserai at dusk",
                "Put me in a caravanserai on the Silk Roads and narrate what I experience.",
            ),
            (
                "Mansa Musa's caravan",
                "Tell the story of Mansa Musa's pilgrimage from inside his caravan and ask how I react.",
            ),
            (
                "A dhow from Kilwa",
                "Let me sail on a dhow from Kilwa and ask me what happens next.",
            ),
        ],
        TeachingStyle::Direct => [
            (
                "Trade routes overview",
                "Teach me the major trade networks of 1200 to 1450 step by step.",
            ),
            (
                "Consequences of connectivity",
                "Walk me through the cultural and environmental consequences of trade.",
            ),
            (
                "Comparing networks",
                "Give me a clear comparison of land and sea trade, then quiz me.",
            ),
        ],
    }
}

/// XP hint shown while a question awaits an answer.
pub fn awaiting_answer_label(kind: QuestionKind, style: TeachingStyle) -> &'static str {
    match (kind, style) {
        (QuestionKind::Mini, TeachingStyle::Socratic) => "10 XP for strong reasoning",
        (QuestionKind::Mini, TeachingStyle::Narrative) => "5-10 XP for story insight",
        _ => "25 XP for quiz mastery",
    }
}

fn hint_directive(policy: HintPolicy) -> &'static str {
    match policy {
        HintPolicy::NoAutomaticHints => {
            "Do not offer hints unless the learner explicitly asks for one."
        }
        HintPolicy::LightHints => {
            "If the learner struggles, offer one light hint that points in the right direction \
             without giving the answer away."
        }
        HintPolicy::FullHints => {
            "Offer a clear hint with every question, and a fuller worked hint if the learner \
             struggles."
        }
    }
}

fn depth_directive(depth: QuestionDepth) -> &'static str {
    match depth {
        QuestionDepth::ShallowCheck => {
            "Keep checkpoint questions short: recall of a single fact or term."
        }
        QuestionDepth::DeepProbe => {
            "Make checkpoint questions test causes, consequences and evidence."
        }
    }
}

fn quiz_directive(difficulty: QuizDifficulty) -> &'static str {
    match difficulty {
        QuizDifficulty::Easy => "Quiz questions should test core facts stated in the lesson.",
        QuizDifficulty::Medium => {
            "Quiz questions should ask the learner to connect two facts or explain one cause."
        }
        QuizDifficulty::Hard => {
            "Quiz questions should require comparison or analysis across regions or periods."
        }
    }
}

fn xp_guidance(style: TeachingStyle) -> &'static str {
    match style {
        TeachingStyle::Socratic => "Reasoned answers backed by evidence earn 10 XP.",
        TeachingStyle::Narrative => {
            "Historically grounded or empathetic answers earn 10 XP; creative engagement earns 5 XP."
        }
        TeachingStyle::Direct => "Correct quiz answers earn 25 XP.",
    }
}

/// Build the system instruction for one generator request.
pub fn build_instructions(
    style: TeachingStyle,
    selections: &Selections,
    catalog: &Catalog,
    progress: &ProgressTracker,
) -> String {
    let mut out = String::new();
    out.push_str(personality_prompt(style));
    out.push_str("\n\nKeep responses concise.\n");

    out.push_str("\nQUESTION TAGS:\n");
    if style != TeachingStyle::Direct {
        let _ = writeln!(
            out,
            "- Put {MINI_QUESTION_MARKER} immediately before a checkpoint question."
        );
    }
    let _ = writeln!(
        out,
        "- Put {QUIZ_MARKER} immediately before a mastery quiz question."
    );
    out.push_str("- Pose at most one tagged question per reply.\n");
    let _ = writeln!(out, "- {}", xp_guidance(style));

    out.push_str("\nTEACHING TACTICS:\n");
    let _ = writeln!(out, "- Hints: {}", hint_directive(selections.hint_policy));
    let _ = writeln!(out, "- Depth: {}", depth_directive(selections.question_depth));
    let _ = writeln!(out, "- Quiz: {}", quiz_directive(selections.quiz_difficulty));

    if let Some(entry) = catalog.subtopic(progress.current_subtopic()) {
        let _ = writeln!(
            out,
            "\nCURRENT FOCUS: {} > {}",
            entry.concept.title, entry.subtopic.title
        );
        let status = progress.subtopic(&entry.subtopic.key);
        for (i, point) in entry.subtopic.learning_points.iter().enumerate() {
            let label = match status.map(|s| s.points[i]) {
                Some(PointStatus::Completed) => "done",
                Some(PointStatus::Active) => "now",
                _ => "later",
            };
            let _ = writeln!(out, "{}. [{label}] {point}", i + 1);
        }
        out.push_str("Teach the point marked now before moving on.\n");
    }

    if style == TeachingStyle::Narrative {
        out.push_str("\nEPISODES:\n");
        let _ = writeln!(
            out,
            "- Each learning point is one story episode. When the learner has understood \
             episode n, write {EPISODE_MARKER_PREFIX}n] on its own line."
        );
        let _ = writeln!(
            out,
            "- When all four episodes are complete, write {SUBTOPIC_COMPLETE_MARKER}."
        );
    }

    out
}
