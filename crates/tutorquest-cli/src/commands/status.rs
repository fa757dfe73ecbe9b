//! `tutorquest status`: show level, XP, badges and curriculum position.

use anyhow::{Context as _, Result};
use tutorquest_core::bandit::Arm;
use tutorquest_core::{PointStatus, SubtopicStatus, Tutor};

use super::Context;

pub fn run(ctx: &Context, json: bool) -> Result<()> {
    let tutor = ctx.open_tutor()?;
    if json {
        println!("{}", stats_json(&tutor).context("failed to serialize stats")?);
    } else {
        print_stats(&tutor);
    }
    Ok(())
}

fn status_label(status: SubtopicStatus) -> &'static str {
    match status {
        SubtopicStatus::Mastered => "mastered",
        SubtopicStatus::NearlyComplete => "nearly complete",
        SubtopicStatus::InProgress => "in progress",
        SubtopicStatus::NotStarted => "not started",
    }
}

pub fn print_stats(tutor: &Tutor) {
    let stats = tutor.stats();
    println!("Learner:   {}", tutor.learner());
    println!(
        "Level {}   {} XP   {} XP to next level ({:.0}%)",
        stats.level,
        stats.xp,
        stats.xp_to_next_level,
        stats.level_progress * 100.0
    );
    let badges: Vec<&str> = stats.badges.iter().map(|b| b.label()).collect();
    if !badges.is_empty() {
        println!("Badges:    {}", badges.join(", "));
    }
    println!("Style:     {}", stats.personality);
    println!("Topic:     {}", stats.current_topic);
    println!(
        "Subtopic:  {} ({})",
        stats.current_subtopic,
        status_label(stats.subtopic_status)
    );

    let state = tutor.state();
    if let Some(entry) = tutor.catalog().subtopic(state.progress.current_subtopic()) {
        let progress = state.progress.subtopic(&entry.subtopic.key);
        for (i, point) in entry.subtopic.learning_points.iter().enumerate() {
            let mark = match progress.map(|p| p.points[i]) {
                Some(PointStatus::Completed) => "x",
                Some(PointStatus::Active) => ">",
                _ => " ",
            };
            println!("  [{mark}] {point}");
        }
    }

    if let Some(label) = stats.awaiting {
        println!("Awaiting:  {label}");
    }
    println!(
        "Tactics:   hints={} depth={} quiz={}",
        state.selections.hint_policy.as_str(),
        state.selections.question_depth.as_str(),
        state.selections.quiz_difficulty.as_str()
    );
    println!(
        "Activity:  {} messages, {} checkpoints, {} quizzes answered",
        stats.learner.learner_messages, stats.learner.mini_answered, stats.learner.quiz_answered
    );
    println!(
        "Feedback:  {} up / {} down",
        stats.feedback.total.up, stats.feedback.total.down
    );
}

fn stats_json(tutor: &Tutor) -> Result<String> {
    let stats = tutor.stats();
    let badges: Vec<&str> = stats.badges.iter().map(|b| b.label()).collect();
    let satisfaction: serde_json::Map<String, serde_json::Value> = stats
        .personality_satisfaction
        .iter()
        .map(|(style, score)| (style.as_str().to_string(), serde_json::json!(score)))
        .collect();
    let value = serde_json::json!({
        "learner": tutor.learner(),
        "xp": stats.xp,
        "level": stats.level,
        "xp_to_next_level": stats.xp_to_next_level,
        "badges": badges,
        "personality": stats.personality,
        "current_topic": stats.current_topic,
        "current_subtopic": stats.current_subtopic,
        "subtopic_status": stats.subtopic_status,
        "awaiting": stats.awaiting,
        "learner_messages": stats.learner.learner_messages,
        "feedback_up": stats.feedback.total.up,
        "feedback_down": stats.feedback.total.down,
        "personality_satisfaction": satisfaction,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}
