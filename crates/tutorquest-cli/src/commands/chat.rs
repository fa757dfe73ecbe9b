//! `tutorquest chat`: interactive tutoring session on the terminal.
//!
//! Plain lines are learner messages. Lines starting with `/` are session
//! commands (see `/help`).

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context as _, Result};
use tracing::debug;
use tutorquest_core::prompts::quick_starts;
use tutorquest_core::{DailyAction, TeachingStyle, Tutor};

use super::{feedback, now, print_action, print_turn, status, Context};

const HELP: &str = "\
Commands:
  /help                 show this help
  /status               show level, XP and progress
  /style [name]         list or switch teaching style (socratic, narrative, direct)
  /quick [n]            list or start a quick-start prompt
  /up, /down            rate the last tutor message
  /daily <action>       log practice, lesson or streak for bonus XP
  /reset                clear the conversation, keep progress
  /quit                 leave";

/// What the loop should do after a line.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// A parsed `/command` line.
#[derive(Debug, PartialEq, Eq)]
enum SlashCommand<'a> {
    Help,
    Status,
    Style(Option<&'a str>),
    Quick(Option<&'a str>),
    Feedback(&'a str),
    Daily(Option<&'a str>),
    Reset,
    Quit,
    Unknown(&'a str),
}

fn parse_slash(line: &str) -> Option<SlashCommand<'_>> {
    let rest = line.strip_prefix('/')?;
    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default();
    let arg = parts.next();
    Some(match name {
        "help" | "?" => SlashCommand::Help,
        "status" | "stats" => SlashCommand::Status,
        "style" => SlashCommand::Style(arg),
        "quick" => SlashCommand::Quick(arg),
        "up" => SlashCommand::Feedback("up"),
        "down" => SlashCommand::Feedback("down"),
        "daily" => SlashCommand::Daily(arg),
        "reset" => SlashCommand::Reset,
        "quit" | "exit" | "q" => SlashCommand::Quit,
        other => SlashCommand::Unknown(other),
    })
}

fn list_styles(current: TeachingStyle) {
    for style in TeachingStyle::ALL {
        let marker = if style == current { "*" } else { " " };
        println!(" {marker} {:<10} {}", style.as_str(), style.description());
    }
}

fn list_quick_starts(style: TeachingStyle) {
    for (i, (label, _)) in quick_starts(style).iter().enumerate() {
        println!("  {}. {label}", i + 1);
    }
}

/// Zero-based index from a one-based `/quick` argument.
fn quick_start_index(arg: &str) -> Result<usize> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => bail!("usage: /quick <n> where n starts at 1"),
    }
}

fn handle_slash(tutor: &mut Tutor, command: SlashCommand<'_>) -> Result<Flow> {
    match command {
        SlashCommand::Help => println!("{HELP}"),
        SlashCommand::Status => status::print_stats(tutor),
        SlashCommand::Style(None) => list_styles(tutor.state().personality),
        SlashCommand::Style(Some(name)) => {
            let style: TeachingStyle = name.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            let outcome = tutor.set_personality(style, now());
            print_action(&outcome);
            if let Some(intro) = tutor.ensure_intro(now()) {
                print_turn(&intro);
            }
        }
        SlashCommand::Quick(None) => list_quick_starts(tutor.state().personality),
        SlashCommand::Quick(Some(n)) => {
            let outcome = tutor.start_quick_start(quick_start_index(n)?, now())?;
            print_turn(&outcome);
        }
        SlashCommand::Feedback(thumb) => feedback::apply(tutor, thumb, None)?,
        SlashCommand::Daily(None) => println!("usage: /daily <practice|lesson|streak>"),
        SlashCommand::Daily(Some(name)) => {
            let action: DailyAction = name.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            print_action(&tutor.apply_daily_action(action, now()));
        }
        SlashCommand::Reset => {
            print_action(&tutor.reset_chat(now()));
            println!("Conversation cleared; progress kept.");
            if let Some(intro) = tutor.ensure_intro(now()) {
                print_turn(&intro);
            }
        }
        SlashCommand::Quit => return Ok(Flow::Quit),
        SlashCommand::Unknown(name) => println!("unknown command /{name}; try /help"),
    }
    Ok(Flow::Continue)
}

pub fn run(ctx: &Context) -> Result<()> {
    let mut tutor = ctx.open_tutor()?;
    let stats = tutor.stats();
    println!(
        "TutorQuest ({} style). Level {}, {} XP. Type /help for commands.",
        stats.personality, stats.level, stats.xp
    );
    if let Some(intro) = tutor.ensure_intro(now()) {
        print_turn(&intro);
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            break;
        };
        let line = line.context("failed to read input")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(command) = parse_slash(line) {
            match handle_slash(&mut tutor, command) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => {}
                Err(e) => eprintln!("error: {e:#}"),
            }
            continue;
        }

        let outcome = tutor.handle_turn(line, now());
        debug!(xp = outcome.xp_awarded, fallback = outcome.fallback, "turn complete");
        print_turn(&outcome);
    }
    Ok(())
}

/// One learner message without the interactive loop.
pub fn ask(ctx: &Context, message: &str) -> Result<()> {
    let mut tutor = ctx.open_tutor()?;
    let outcome = tutor.handle_turn(message, now());
    print_turn(&outcome);
    Ok(())
}
