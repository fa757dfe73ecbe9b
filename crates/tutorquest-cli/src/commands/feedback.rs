//! `tutorquest feedback <up|down>`: rate a tutor message.

use anyhow::{Context as _, Result};
use tutorquest_core::providers::Role;
use tutorquest_core::{Thumb, Tutor};

use super::{now, print_action, Context};

/// Index of the most recent tutor message, if any.
pub fn last_tutor_message(tutor: &Tutor) -> Option<usize> {
    tutor
        .state()
        .transcript
        .iter()
        .rposition(|m| m.role == Role::Assistant)
}

pub fn apply(tutor: &mut Tutor, thumb: &str, message: Option<usize>) -> Result<()> {
    let thumb: Thumb = thumb.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let index = match message {
        Some(i) => i,
        None => last_tutor_message(tutor).context("no tutor message to rate yet")?,
    };
    let outcome = tutor
        .record_feedback(index, thumb, now())
        .with_context(|| format!("cannot rate message {index}"))?;
    println!("Thanks for the feedback.");
    print_action(&outcome);
    Ok(())
}

pub fn run(ctx: &Context, thumb: &str, message: Option<usize>) -> Result<()> {
    let mut tutor = ctx.open_tutor()?;
    apply(&mut tutor, thumb, message)
}
