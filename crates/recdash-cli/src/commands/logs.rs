//! Logs command handler

use anyhow::{Context, Result};

use recdash_core::{Config, RecorderApi};

use crate::output::Output;

/// Print the tail of the recorder log
pub async fn tail(config: &Config, lines: Option<usize>, output: &Output) -> Result<()> {
    let lines = lines.unwrap_or(config.log_lines);
    let tail = super::api(config)?
        .logs(lines)
        .await
        .context("Failed to load logs")?;

    output.print_logs(&tail);
    Ok(())
}
