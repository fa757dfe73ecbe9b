//! `tutorquest daily <action>`: log a daily activity for bonus XP.

use anyhow::Result;
use tutorquest_core::DailyAction;

use super::{now, print_action, Context};

pub fn run(ctx: &Context, action: &str) -> Result<()> {
    let action: DailyAction = action.parse().map_err(|e: String| anyhow::anyhow!(e))?;
    let mut tutor = ctx.open_tutor()?;
    let outcome = tutor.apply_daily_action(action, now());
    print_action(&outcome);
    let stats = tutor.stats();
    println!("Level {}   {} XP", stats.level, stats.xp);
    Ok(())
}
