//! # Scenario: Adaptive History Tutoring
//!
//! **Actor**: Learner studying trade networks, 1200 to 1450
//! **Duration**: One sitting, two teaching styles
//!
//! Demonstrates:
//! - Intro generation and topic labelling
//! - Checkpoint answers accepted and rejected, with XP
//! - Thumbs feedback feeding the hint policy
//! - Switching to story mode and mastering a subtopic by episodes
//! - Persisting and reloading the whole session

use std::rc::Rc;

use tutorquest_core::events::{topics, TutorEvent};
use tutorquest_core::providers::MockProvider;
use tutorquest_core::{
    Catalog, DailyAction, InMemoryStore, TeachingStyle, Thumb, Tutor, TutorConfig, TurnOutcome,
};

fn sep(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("  {title}");
    println!("{}\n", "=".repeat(60));
}

fn show(learner_said: Option<&str>, outcome: &TurnOutcome) {
    if let Some(text) = learner_said {
        println!("[Learner] {text}");
    }
    if let Some(verdict) = &outcome.verdict {
        println!(
            "  [Verdict] accepted={} reason=\"{}\" xp={}",
            verdict.accepted, verdict.reason, outcome.xp_awarded
        );
    }
    println!("[Tutor]   {}", outcome.reply.replace('\n', "\n          "));
    if let Some(label) = outcome.awaiting_label {
        println!("  [Awaiting] {label}");
    }
    for n in &outcome.notifications {
        println!("  [Event] {}", serde_json::to_string(n).unwrap_or_default());
    }
}

fn main() {
    println!("==========================================================");
    println!("  SCENARIO: Adaptive History Tutoring");
    println!("  Scripted generator, in-memory state");
    println!("==========================================================\n");

    let now = 1_700_000_000_i64;
    let provider = Rc::new(
        MockProvider::new("scripted")
            .with_reply(
                "Welcome! Between 1200 and 1450, silk and porcelain crossed Eurasia on the Silk \
                 Roads. Where shall we begin: the goods, the cities, or the money?",
            )
            .with_reply(
                "Good place to start. Luxury goods were light and valuable, so they justified \
                 the long trip.\n[MINI-Q] Why would merchants prefer silk over grain on a \
                 four-thousand-mile route?",
            )
            .with_reply("Close, but think about weight and value together.\n[MINI-Q] Try again?")
            .with_reply(
                "Exactly: high value per pound. Caravanserai then made each stage of that \
                 journey survivable.",
            ),
    );

    let config = TutorConfig::default().with_epsilon(0.0);
    let mut tutor = match Tutor::load(
        "ada",
        Catalog::builtin(),
        config.clone(),
        Box::new(provider.clone()),
        Box::new(InMemoryStore::new()),
    ) {
        Ok(t) => t.with_seed(7),
        Err(e) => {
            eprintln!("failed to start: {e}");
            std::process::exit(1);
        }
    };

    tutor.events_mut().subscribe(
        topics::LEVEL_UP,
        Box::new(|event: &TutorEvent| println!("  [Bus] level up at t={}", event.timestamp)),
    );

    // ── Socratic session ────────────────────────────────────────
    sep("SOCRATIC: The Silk Roads");

    if let Some(intro) = tutor.ensure_intro(now) {
        show(None, &intro);
    }

    let q = "What made the Silk Roads so busy after 1200?";
    show(Some(q), &tutor.handle_turn(q, now + 10));
    println!("  [Topic] {}", tutor.state().current_topic);

    let weak = "more money";
    show(Some(weak), &tutor.handle_turn(weak, now + 40));

    let strong = "Silk is light and worth a lot, so each camel load paid for the whole trip";
    show(Some(strong), &tutor.handle_turn(strong, now + 90));

    let last_tutor = tutor.state().transcript.len() - 1;
    match tutor.record_feedback(last_tutor, Thumb::Up, now + 95) {
        Ok(_) => println!("\n[Feedback] thumbs up on message {last_tutor}"),
        Err(e) => println!("\n[Feedback] rejected: {e}"),
    }

    // ── Story mode ──────────────────────────────────────────────
    sep("NARRATIVE: four episodes");

    provider.push_reply(
        "Dusk falls on a caravanserai near Samarkand. Camels kneel, a merchant counts bolts of \
         silk. What do you do first?",
    );
    for scene in [
        "You trade a bolt of silk for a pouch of silver.\n[EPISODE-MASTERED:1]",
        "The innkeeper waives your fee; the city profits from every caravan.\n[EPISODE-MASTERED:2]",
        "A Persian banker hands you a paper note instead of coin.\n[EPISODE-MASTERED:3]",
        "Back home, new looms hum to meet demand.\n[EPISODE-MASTERED:4]\n[SUBTOPIC-COMPLETE]",
    ] {
        provider.push_reply(scene);
    }

    let outcome = tutor.set_personality(TeachingStyle::Narrative, now + 120);
    for n in &outcome.notifications {
        println!("  [Event] {}", serde_json::to_string(n).unwrap_or_default());
    }
    if let Some(intro) = tutor.ensure_intro(now + 121) {
        show(None, &intro);
    }

    for (i, line) in [
        "I look for someone to trade with",
        "I ask the innkeeper why the room is so cheap",
        "I feel nervous holding paper instead of silver",
        "I imagine the weavers back in Persia",
    ]
    .iter()
    .enumerate()
    {
        show(Some(line), &tutor.handle_turn(line, now + 130 + i as i64 * 30));
    }

    // ── Daily bonus and stats ───────────────────────────────────
    sep("DAILY BONUS & STATS");

    let outcome = tutor.apply_daily_action(DailyAction::Lesson, now + 400);
    for n in &outcome.notifications {
        println!("  [Event] {}", serde_json::to_string(n).unwrap_or_default());
    }

    let stats = tutor.stats();
    println!("Level {}  XP {}  next level in {}", stats.level, stats.xp, stats.xp_to_next_level);
    println!(
        "Badges: {}",
        stats.badges.iter().map(|b| b.label()).collect::<Vec<_>>().join(", ")
    );
    println!("Now studying: {} ({:?})", stats.current_subtopic, stats.subtopic_status);
    println!(
        "Feedback: {} up / {} down",
        stats.feedback.total.up, stats.feedback.total.down
    );
    println!("Events recorded: {}", tutor.events().history(None).len());

    // ── Reload ──────────────────────────────────────────────────
    sep("RELOAD");

    let blob = match tutor.store().load("ada") {
        Ok(Some(blob)) => blob,
        other => {
            eprintln!("no saved state: {other:?}");
            std::process::exit(1);
        }
    };
    println!("Saved blob: {} bytes", blob.len());

    match Tutor::load(
        "ada",
        Catalog::builtin(),
        config,
        Box::new(MockProvider::new("idle")),
        Box::new(InMemoryStore::new().with_blob("ada", blob)),
    ) {
        Ok(reloaded) => {
            let s = reloaded.stats();
            println!(
                "Reloaded: level {} with {} XP, style {}, clean={}",
                s.level,
                s.xp,
                s.personality,
                reloaded.load_report().is_clean()
            );
        }
        Err(e) => println!("Reload failed: {e}"),
    }

    println!("\nScenario complete.");
}
