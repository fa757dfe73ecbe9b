//! tutorquest: adaptive history tutor on the terminal.
//!
//! Runs interactive tutoring sessions against a Gemini text generator and
//! keeps each learner's XP, curriculum progress and teaching-policy
//! statistics in a local state directory.

mod commands;
mod config;
mod gemini;
mod store;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::error;

/// tutorquest: adaptive history tutor
#[derive(Parser)]
#[command(name = "tutorquest", version = "0.1.0", about = "Adaptive history tutor with XP, levels and self-tuning teaching tactics")]
struct Cli {
    /// Learner id (letters, digits, '-' and '_')
    #[arg(short, long, global = true)]
    learner: Option<String>,

    /// Directory holding learner state
    #[arg(long = "state-dir", global = true)]
    state_dir: Option<PathBuf>,

    /// Config file path
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive tutoring session (default)
    Chat,

    /// Send a single message and print the reply
    Ask {
        /// Message to the tutor
        message: String,
    },

    /// Show level, XP, badges and curriculum progress
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Rate a tutor message (defaults to the most recent one)
    Feedback {
        /// "up" or "down"
        thumb: String,
        /// Transcript index of the message to rate
        #[arg(long)]
        message: Option<usize>,
    },

    /// Log a daily activity: practice, lesson or streak
    Daily {
        action: String,
    },

    /// Clear the conversation; with --all, delete all saved progress
    Reset {
        #[arg(long)]
        all: bool,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing.
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("tutorquest=debug,tutorquest_core=debug")
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("warn")
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }

    if let Err(e) = run(cli) {
        error!("{e:#}");
        eprintln!("tutorquest: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.unwrap_or_else(config::default_config_path);
    let mut cfg = config::Config::load(&config_path)?;
    cfg.apply_env();
    let ctx = commands::Context {
        learner: cli.learner.unwrap_or_else(|| cfg.state.learner.clone()),
        state_dir: cfg.state_dir(cli.state_dir.as_deref()),
        config: cfg,
        config_path,
    };

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => commands::chat::run(&ctx),
        Command::Ask { message } => commands::chat::ask(&ctx, &message),
        Command::Status { json } => commands::status::run(&ctx, json),
        Command::Feedback { thumb, message } => commands::feedback::run(&ctx, &thumb, message),
        Command::Daily { action } => commands::daily::run(&ctx, &action),
        Command::Reset { all } => commands::reset::run(&ctx, all),
        Command::Init { force } => commands::init::run(&ctx, force),
    }
}
