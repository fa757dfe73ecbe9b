//! `tutorquest init`: write a default config file.

use anyhow::{bail, Result};

use super::Context;

pub fn run(ctx: &Context, force: bool) -> Result<()> {
    if ctx.config_path.exists() && !force {
        bail!(
            "config already exists at {} (use --force to overwrite)",
            ctx.config_path.display()
        );
    }
    let mut config = ctx.config.clone();
    config.tutor.generator.api_key = None;
    config.save(&ctx.config_path)?;
    println!("Wrote {}", ctx.config_path.display());
    Ok(())
}
