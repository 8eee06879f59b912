//! Platforms command handler

use anyhow::{Context, Result};

use recdash_core::{Config, RecorderApi};

use crate::output::Output;

/// List the platforms the recorder supports
pub async fn list(config: &Config, output: &Output) -> Result<()> {
    let list = super::api(config)?
        .platforms()
        .await
        .context("Failed to load platforms")?;

    output.print_platforms(&list.platforms);
    Ok(())
}
