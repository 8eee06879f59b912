//! Streamer list command handlers
//!
//! Edits go through the same editor as the dashboard: load the recorder's
//! config, change it locally, save it back.

use anyhow::{bail, Result};

use recdash_core::{AppState, Config, Controller, HttpApi};

use crate::output::{Output, OutputFormat};

/// Parse a `key=value` argument
pub fn parse_field(arg: &str) -> Result<(String, String), String> {
    match arg.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got '{}'", arg)),
    }
}

async fn load(config: &Config) -> Result<Controller<HttpApi>> {
    let mut controller = super::controller(config)?;
    if !controller.load_config().await {
        bail!("Failed to load config from {}", config.server_url);
    }
    Ok(controller)
}

fn find_user(state: &AppState, platform: &str, id: &str) -> Option<usize> {
    state
        .users()
        .iter()
        .position(|user| user.platform == platform && user.id == id)
}

/// List configured streamers with their status
pub async fn list(config: &Config, output: &Output) -> Result<()> {
    let mut controller = load(config).await?;
    controller.load_status().await;

    if output.format == OutputFormat::Human {
        output.print_remote_global(controller.state().config());
        println!();
    }
    output.print_users(controller.state());
    Ok(())
}

/// Add a streamer and save
pub async fn add(
    config: &Config,
    platform: String,
    id: String,
    name: String,
    fields: Vec<(String, String)>,
    output: &Output,
) -> Result<()> {
    let mut controller = load(config).await?;
    let state = controller.state_mut();

    if find_user(state, &platform, &id).is_some() {
        bail!("{} {} is already configured", platform, id);
    }

    state.begin_add();
    let form = state.editing_user_mut();
    form.platform = platform;
    form.id = id;
    form.name = name;
    for (key, value) in &fields {
        form.set_field(key, value)?;
    }

    if !state.save_editing_user() {
        return super::report(state, false, output);
    }

    let ok = controller.save_config().await;
    super::report(controller.state(), ok, output)
}

/// Change fields of a streamer and save
pub async fn edit(
    config: &Config,
    platform: String,
    id: String,
    fields: Vec<(String, String)>,
    output: &Output,
) -> Result<()> {
    if fields.is_empty() {
        bail!("Nothing to change. Pass fields as key=value, e.g. name=Alice interval=30");
    }

    let mut controller = load(config).await?;
    let state = controller.state_mut();

    let Some(index) = find_user(state, &platform, &id) else {
        bail!("No streamer {} {} in the recorder config", platform, id);
    };

    state.edit_user(index);
    let form = state.editing_user_mut();
    for (key, value) in &fields {
        form.set_field(key, value)?;
    }

    if !state.save_editing_user() {
        return super::report(state, false, output);
    }

    let ok = controller.save_config().await;
    super::report(controller.state(), ok, output)
}

/// Remove a streamer and save
pub async fn remove(config: &Config, platform: String, id: String, output: &Output) -> Result<()> {
    let mut controller = load(config).await?;
    let state = controller.state_mut();

    let Some(index) = find_user(state, &platform, &id) else {
        bail!("No streamer {} {} in the recorder config", platform, id);
    };
    state.remove_user(index);

    let ok = controller.save_config().await;
    super::report(controller.state(), ok, output)
}
