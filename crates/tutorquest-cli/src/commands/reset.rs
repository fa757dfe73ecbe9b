//! `tutorquest reset`: clear the conversation, or all progress with `--all`.

use anyhow::Result;
use tracing::info;
use tutorquest_core::StateStore;

use super::{now, print_action, Context};

pub fn run(ctx: &Context, all: bool) -> Result<()> {
    if all {
        let mut store = ctx.store();
        let existed = store
            .delete(&ctx.learner)
            .map_err(|e| anyhow::anyhow!("{e}"))?;
        info!(learner = %ctx.learner, existed, "learner state deleted");
        if existed {
            println!("All progress for '{}' deleted.", ctx.learner);
        } else {
            println!("No saved progress for '{}'.", ctx.learner);
        }
        return Ok(());
    }

    let mut tutor = ctx.open_tutor()?;
    let outcome = tutor.reset_chat(now());
    print_action(&outcome);
    println!("Conversation cleared; progress kept.");
    Ok(())
}
