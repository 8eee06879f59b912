//! One-shot command handlers

pub mod config;
pub mod files;
pub mod logs;
pub mod platforms;
pub mod recording;
pub mod status;
pub mod users;
pub mod watch;

use std::sync::Arc;

use anyhow::{bail, Context, Result};

use recdash_core::{AppState, Config, Controller, HttpApi};

use crate::output::Output;

/// REST client for the configured recorder
pub fn api(config: &Config) -> Result<Arc<HttpApi>> {
    let api = HttpApi::new(&config.server_url, config.request_timeout())
        .with_context(|| format!("Cannot use server URL {}", config.server_url))?;
    Ok(Arc::new(api))
}

pub fn controller(config: &Config) -> Result<Controller<HttpApi>> {
    Ok(Controller::new(api(config)?, config.log_lines))
}

/// Turn the outcome of a controller action into output or an error
///
/// Controller actions report through notifications; this prints the success
/// message or fails with the error message.
pub fn report(state: &AppState, ok: bool, output: &Output) -> Result<()> {
    let message = state
        .notification()
        .map(|n| n.message.clone())
        .unwrap_or_default();

    if ok {
        output.success(&message);
        Ok(())
    } else {
        bail!("{}", message)
    }
}
