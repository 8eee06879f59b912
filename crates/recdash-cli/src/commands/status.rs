//! Status command handler

use anyhow::{Context, Result};

use recdash_core::{Config, RecorderApi};

use crate::output::Output;

/// Show the recorder's current recording snapshot
pub async fn show(config: &Config, output: &Output) -> Result<()> {
    let api = super::api(config)?;
    let snapshot = api
        .status()
        .await
        .with_context(|| format!("Failed to reach recorder at {}", config.server_url))?;

    output.print_status(&snapshot);
    Ok(())
}
