//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use recdash_core::models::{format_timestamp, FileListing, LogTail, StatusSnapshot};
use recdash_core::{AppState, RemoteConfig, StatusRecord};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print the configured streamers with their current status
    pub fn print_users(&self, state: &AppState) {
        let users = state.users();
        match self.format {
            OutputFormat::Human => {
                if users.is_empty() {
                    println!("No streamers configured.");
                    return;
                }
                for user in users {
                    println!(
                        "{:<12} {:<16} {:<20} {:>4}s  {}",
                        user.platform,
                        truncate(&user.id, 16),
                        truncate(user.display_name(), 20),
                        user.interval,
                        state.status_class_for(user).label()
                    );
                }
                println!("\n{} streamer(s)", users.len());
            }
            OutputFormat::Json => {
                let rows: Vec<_> = users
                    .iter()
                    .map(|user| {
                        serde_json::json!({
                            "user": user,
                            "status": state.status_class_for(user).label(),
                        })
                    })
                    .collect();
                print_json(&rows);
            }
            OutputFormat::Quiet => {
                for user in users {
                    println!("{}", user.status_key());
                }
            }
        }
    }

    /// Print the recorder's global settings
    pub fn print_remote_global(&self, config: &RemoteConfig) {
        match self.format {
            OutputFormat::Human => {
                println!("Output dir: {}", config.global.output);
                println!(
                    "Proxy:      {}",
                    config.global.proxy.as_deref().unwrap_or("(not set)")
                );
            }
            OutputFormat::Json => print_json(&config.global),
            OutputFormat::Quiet => {}
        }
    }

    /// Print a `/api/status` snapshot
    pub fn print_status(&self, snapshot: &StatusSnapshot) {
        match self.format {
            OutputFormat::Human => {
                println!("Recorder Status");
                println!("===============");
                println!();
                println!(
                    "Recording: {}",
                    snapshot
                        .recording_count
                        .unwrap_or(snapshot.recording.len() as u64)
                );
                if let Some(tasks) = snapshot.tasks {
                    println!("Tasks:     {}", tasks);
                }
                if let Some(ref ts) = snapshot.timestamp {
                    println!("As of:     {}", format_timestamp(ts));
                }
                if !snapshot.recording.is_empty() {
                    println!();
                    for (key, record) in &snapshot.recording {
                        println!("  {}", describe_record(key, record));
                    }
                }
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({
                    "recording": snapshot.recording,
                    "recording_count": snapshot.recording_count,
                    "tasks": snapshot.tasks,
                    "timestamp": snapshot.timestamp,
                }));
            }
            OutputFormat::Quiet => {
                for key in snapshot.recording.keys() {
                    println!("{}", key);
                }
            }
        }
    }

    /// Print the recorded file listing
    pub fn print_files(&self, listing: &FileListing) {
        match self.format {
            OutputFormat::Human => {
                if listing.files.is_empty() {
                    println!("No recordings found.");
                    return;
                }
                for file in &listing.files {
                    let modified = file
                        .modified
                        .as_deref()
                        .map(format_timestamp)
                        .unwrap_or_default();
                    println!(
                        "{:<50} {:>10.2} MB  {}",
                        truncate(&file.name, 50),
                        file.size_mb,
                        modified
                    );
                }
                println!(
                    "\n{} file(s), {} MB total",
                    listing.count, listing.total_size_mb
                );
                if let Some(ref dir) = listing.output_dir {
                    println!("Output dir: {}", dir);
                }
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({
                    "files": listing.files,
                    "count": listing.count,
                    "total_size_mb": listing.total_size_mb,
                    "output_dir": listing.output_dir,
                }));
            }
            OutputFormat::Quiet => {
                for file in &listing.files {
                    println!("{}", file.name);
                }
            }
        }
    }

    /// Print a log tail
    pub fn print_logs(&self, tail: &LogTail) {
        match self.format {
            OutputFormat::Human | OutputFormat::Quiet => {
                for line in &tail.logs {
                    println!("{}", line.trim_end());
                }
            }
            OutputFormat::Json => {
                print_json(&serde_json::json!({
                    "logs": tail.logs,
                    "file": tail.file,
                    "total_lines": tail.total_lines,
                }));
            }
        }
    }

    /// Print a list of platform names
    pub fn print_platforms(&self, platforms: &[String]) {
        match self.format {
            OutputFormat::Human => {
                if platforms.is_empty() {
                    println!("No platforms reported.");
                    return;
                }
                for name in platforms {
                    println!("{}", name);
                }
                println!("\n{} platform(s)", platforms.len());
            }
            OutputFormat::Json => print_json(&platforms),
            OutputFormat::Quiet => {
                for name in platforms {
                    println!("{}", name);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// One-line summary of a status table entry
pub fn describe_record(key: &str, record: &StatusRecord) -> String {
    let status = match (record.status, record.recording) {
        (Some(status), _) => status.to_string(),
        (None, Some(true)) => "recording".to_string(),
        (None, _) => "unknown".to_string(),
    };
    let since = record
        .timestamp
        .as_deref()
        .map(|ts| format!(" since {}", format_timestamp(ts)))
        .unwrap_or_default();
    format!("{} [{}]{}", key, status, since)
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to encode output: {}", e),
    }
}

/// Truncate a string to max characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
