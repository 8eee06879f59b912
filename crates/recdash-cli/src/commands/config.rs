//! Config command handlers

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use recdash_core::Config;

use crate::output::{Output, OutputFormat};

const VALID_KEYS: &str = "server_url, data_dir, log_file, log_lines, heartbeat_secs, \
                          status_poll_secs, refresh_secs, reconnect_delay_secs, request_timeout_secs";

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "server_url": config.server_url,
                    "data_dir": config.data_dir,
                    "log_file": config.log_file,
                    "log_lines": config.log_lines,
                    "heartbeat_secs": config.heartbeat_secs,
                    "status_poll_secs": config.status_poll_secs,
                    "refresh_secs": config.refresh_secs,
                    "reconnect_delay_secs": config.reconnect_delay_secs,
                    "request_timeout_secs": config.request_timeout_secs
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.server_url);
        }
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            println!("Configuration:");
            println!("  server_url:           {}", config.server_url);
            println!("  data_dir:             {}", config.data_dir.display());
            println!(
                "  log_file:             {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!("  log_lines:            {}", config.log_lines);
            println!("  heartbeat_secs:       {}", config.heartbeat_secs);
            println!("  status_poll_secs:     {}", config.status_poll_secs);
            println!("  refresh_secs:         {}", config.refresh_secs);
            println!("  reconnect_delay_secs: {}", config.reconnect_delay_secs);
            println!("  request_timeout_secs: {}", config.request_timeout_secs);
            println!();
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(
    key: String,
    value: String,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    // Edit the file as written; env overrides must not leak into it
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    let mut config = Config::load_file(&save_path).context("Failed to load configuration")?;

    apply_setting(&mut config, &key, &value)?;

    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}

fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<()> {
    match key {
        "server_url" => {
            recdash_core::api::parse_server_url(value)?;
            config.server_url = value.trim_end_matches('/').to_string();
        }
        "data_dir" => {
            config.data_dir = value.into();
        }
        "log_file" => {
            config.log_file = if value.is_empty() || value == "none" {
                None
            } else {
                Some(value.into())
            };
        }
        "log_lines" => config.log_lines = parse_number(key, value)?,
        "heartbeat_secs" => config.heartbeat_secs = parse_number(key, value)?,
        "status_poll_secs" => config.status_poll_secs = parse_number(key, value)?,
        "refresh_secs" => config.refresh_secs = parse_number(key, value)?,
        "reconnect_delay_secs" => config.reconnect_delay_secs = parse_number(key, value)?,
        "request_timeout_secs" => config.request_timeout_secs = parse_number(key, value)?,
        _ => {
            bail!(
                "Unknown configuration key: '{}'\nValid keys: {}",
                key,
                VALID_KEYS
            );
        }
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid value for {}: expected a whole number", key))
}
