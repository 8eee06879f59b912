//! recdash CLI
//!
//! Command-line interface and terminal dashboard for a live-stream recorder.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use recdash_core::Config;

mod commands;
mod output;
mod tui;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "recdash")]
#[command(about = "recdash - Dashboard for a live-stream recording manager")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI dashboard
    Tui,
    /// Show what the recorder is recording right now
    Status,
    /// Manage tracked streamers
    #[command(alias = "streamers")]
    Users {
        #[command(subcommand)]
        command: Option<UserCommands>,
    },
    /// List recorded files
    Files,
    /// Show the recorder's log tail
    Logs {
        /// Number of lines to fetch
        #[arg(short = 'n', long)]
        lines: Option<usize>,
    },
    /// List supported platforms
    Platforms,
    /// Start recording a streamer
    Start {
        /// Platform name, e.g. Bilibili
        platform: String,
        /// Room id on the platform
        id: String,
    },
    /// Stop recording a streamer
    Stop {
        /// Platform name, e.g. Bilibili
        platform: String,
        /// Room id on the platform
        id: String,
    },
    /// Follow live updates from the recorder
    Watch,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// List tracked streamers
    #[command(alias = "ls")]
    List,
    /// Track a new streamer
    Add {
        /// Platform name, e.g. Bilibili
        platform: String,
        /// Room id on the platform
        id: String,
        /// Display name
        name: String,
        /// Check interval in seconds
        #[arg(short, long)]
        interval: Option<u64>,
        /// Output format, e.g. mp4
        #[arg(short, long)]
        format: Option<String>,
        /// Extra fields as key=value (output, proxy)
        #[arg(value_parser = commands::users::parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Change fields of a tracked streamer
    Edit {
        /// Platform name
        platform: String,
        /// Room id on the platform
        id: String,
        /// Fields as key=value (name, interval, format, output, proxy)
        #[arg(value_parser = commands::users::parse_field)]
        fields: Vec<(String, String)>,
    },
    /// Stop tracking a streamer
    #[command(alias = "rm")]
    Remove {
        /// Platform name
        platform: String,
        /// Room id on the platform
        id: String,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (server_url, data_dir, log_file, log_lines, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work on the file itself
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config = Config::load_with_cli_override(config_path)?;

    // Handle TUI (default when no command given)
    let Some(command) = cli.command else {
        return tui::run(config).await;
    };

    init_cli_logging();

    match command {
        Commands::Tui => tui::run(config).await,
        Commands::Status => commands::status::show(&config, &output).await,
        Commands::Users { command } => handle_user_command(command, &config, &output).await,
        Commands::Files => commands::files::list(&config, &output).await,
        Commands::Logs { lines } => commands::logs::tail(&config, lines, &output).await,
        Commands::Platforms => commands::platforms::list(&config, &output).await,
        Commands::Start { platform, id } => {
            commands::recording::start(&config, platform, id, &output).await
        }
        Commands::Stop { platform, id } => {
            commands::recording::stop(&config, platform, id, &output).await
        }
        Commands::Watch => commands::watch::run(&config, &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

async fn handle_user_command(
    command: Option<UserCommands>,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        Some(UserCommands::List) | None => commands::users::list(config, output).await,
        Some(UserCommands::Add {
            platform,
            id,
            name,
            interval,
            format,
            mut fields,
        }) => {
            if let Some(interval) = interval {
                fields.push(("interval".to_string(), interval.to_string()));
            }
            if let Some(format) = format {
                fields.push(("format".to_string(), format));
            }
            commands::users::add(config, platform, id, name, fields, output).await
        }
        Some(UserCommands::Edit {
            platform,
            id,
            fields,
        }) => commands::users::edit(config, platform, id, fields, output).await,
        Some(UserCommands::Remove { platform, id }) => {
            commands::users::remove(config, platform, id, output).await
        }
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Log to stderr when RECDASH_LOG is set
fn init_cli_logging() {
    let Ok(log_level) = std::env::var("RECDASH_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "recdash_core={},recdash_cli={}",
        log_level, log_level
    ));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
