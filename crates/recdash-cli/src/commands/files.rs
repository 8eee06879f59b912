//! Files command handler

use anyhow::{Context, Result};

use recdash_core::{Config, RecorderApi};

use crate::output::Output;

/// List recorded files
pub async fn list(config: &Config, output: &Output) -> Result<()> {
    let listing = super::api(config)?
        .files()
        .await
        .context("Failed to load file listing")?;

    output.print_files(&listing);
    Ok(())
}
