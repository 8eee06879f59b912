//! Application state and logic
//!
//! `App` holds what only the terminal needs (tabs, selection, input line).
//! Everything about the recorder lives in [`recdash_core::AppState`].

use std::cell::Cell;
use std::time::{Duration, Instant};

use recdash_core::{AppState, UserConfig};

/// How long a local status message stays visible
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Input mode for the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Normal navigation mode
    Normal,
    /// Command input mode (after pressing : or a command key)
    Command,
    /// Waiting for y/n before removing the selected streamer
    Confirm,
}

/// Dashboard tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Status,
    Streamers,
    Files,
    Logs,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Status, Tab::Streamers, Tab::Files, Tab::Logs];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Status => "Status",
            Tab::Streamers => "Streamers",
            Tab::Files => "Files",
            Tab::Logs => "Logs",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Status => 0,
            Tab::Streamers => 1,
            Tab::Files => 2,
            Tab::Logs => 3,
        }
    }

    /// Move to the next tab (wrapping)
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// Move to the previous tab (wrapping)
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// A parsed `:` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a streamer: `add <platform> <id> <name>`
    Add {
        platform: String,
        id: String,
        name: String,
    },
    /// Change fields of the selected streamer: `edit name=.. interval=..`
    Edit(Vec<(String, String)>),
    /// Remove the selected streamer
    Remove,
    /// Start recording the selected streamer
    Start,
    /// Stop recording the selected streamer
    Stop,
    /// Save the streamer list to the recorder
    Save,
    /// Reload everything from the recorder
    Reload,
    /// Set or clear the global proxy
    SetProxy(Option<String>),
    /// Set the global output directory
    SetOutput(String),
    /// Open the recorder's web page
    Open,
    Quit,
}

impl Command {
    /// Parse command-line input
    ///
    /// Returns `Ok(None)` for empty input and `Err` with a usage message for
    /// anything that isn't a command.
    pub fn parse(input: &str) -> Result<Option<Command>, String> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(None);
        }

        let (verb, rest) = match input.split_once(char::is_whitespace) {
            Some((verb, rest)) => (verb, rest.trim()),
            None => (input, ""),
        };

        let command = match verb {
            "add" => {
                let mut parts = rest.splitn(3, char::is_whitespace);
                let platform = parts.next().unwrap_or_default();
                let id = parts.next().unwrap_or_default();
                let name = parts.next().unwrap_or_default().trim();
                if platform.is_empty() || id.is_empty() {
                    return Err("Usage: add <platform> <id> <name>".to_string());
                }
                Command::Add {
                    platform: platform.to_string(),
                    id: id.to_string(),
                    name: name.to_string(),
                }
            }
            "edit" => Command::Edit(parse_fields(rest)?),
            "rm" | "remove" | "delete" => Command::Remove,
            "start" => Command::Start,
            "stop" => Command::Stop,
            "w" | "save" => Command::Save,
            "r" | "reload" => Command::Reload,
            "proxy" => match rest {
                "" | "none" => Command::SetProxy(None),
                proxy => Command::SetProxy(Some(proxy.to_string())),
            },
            "output" => {
                if rest.is_empty() {
                    return Err("Usage: output <dir>".to_string());
                }
                Command::SetOutput(rest.to_string())
            }
            "open" => Command::Open,
            "q" | "quit" => Command::Quit,
            _ => return Err(format!("Unknown command: {}", input)),
        };

        Ok(Some(command))
    }
}

/// Parse `key=value` pairs; a word without `=` continues the previous value
fn parse_fields(input: &str) -> Result<Vec<(String, String)>, String> {
    let mut fields: Vec<(String, String)> = Vec::new();
    for word in input.split_whitespace() {
        match word.split_once('=') {
            Some((key, value)) if !key.is_empty() => {
                fields.push((key.to_string(), value.to_string()));
            }
            _ => match fields.last_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(word);
                }
                None => return Err("Usage: edit key=value ...".to_string()),
            },
        }
    }
    if fields.is_empty() {
        return Err("Usage: edit key=value ...".to_string());
    }
    Ok(fields)
}

/// Command line pre-filled with a streamer's editable fields
pub fn edit_prefill(user: &UserConfig) -> String {
    let mut line = format!(
        "edit name={} interval={} format={}",
        user.name, user.interval, user.format
    );
    if let Some(ref output) = user.output {
        line.push_str(&format!(" output={}", output));
    }
    if let Some(ref proxy) = user.proxy {
        line.push_str(&format!(" proxy={}", proxy));
    }
    line
}

/// Application state
pub struct App {
    /// Whether the app should exit
    pub should_quit: bool,
    /// Current input mode
    pub input_mode: InputMode,
    /// Command input buffer
    pub command_input: String,
    /// Cursor position in command input, in characters
    pub command_cursor: usize,
    /// Visible tab
    pub tab: Tab,
    /// Selected row on the Streamers tab
    pub user_index: usize,
    /// Selected row on the Files tab
    pub file_index: usize,
    /// Scroll offset of the Logs tab
    pub log_scroll: u16,
    /// Keep the Logs tab scrolled to the end
    pub log_follow: bool,
    /// Scroll offset of the last log page, recorded on each draw
    pub log_last_page: Cell<u16>,
    /// Status message to display temporarily
    pub status_message: Option<String>,
    /// When the status message was set (for auto-dismiss)
    pub status_message_time: Option<Instant>,
    /// Whether help overlay is visible
    pub show_help: bool,
    /// A request to the recorder is in flight
    pub is_loading: bool,
    /// Streamer list or global settings changed and not yet saved
    pub dirty: bool,
    /// Recorder web page
    pub server_url: String,
}

impl App {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            command_input: String::new(),
            command_cursor: 0,
            tab: Tab::Streamers,
            user_index: 0,
            file_index: 0,
            log_scroll: 0,
            log_follow: true,
            log_last_page: Cell::new(0),
            status_message: None,
            status_message_time: None,
            show_help: false,
            is_loading: false,
            dirty: false,
            server_url: server_url.into(),
        }
    }

    /// Set a status message (will auto-dismiss after 3 seconds)
    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Check and clear expired status message
    pub fn check_status_timeout(&mut self) {
        if let Some(time) = self.status_message_time {
            if time.elapsed() > STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    /// Toggle help overlay
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn next_tab(&mut self) {
        self.tab = self.tab.next();
    }

    pub fn prev_tab(&mut self) {
        self.tab = self.tab.prev();
    }

    /// The streamer under the cursor
    pub fn selected_user<'a>(&self, state: &'a AppState) -> Option<(usize, &'a UserConfig)> {
        state
            .users()
            .get(self.user_index)
            .map(|user| (self.user_index, user))
    }

    /// Keep selections inside their lists after the lists change
    pub fn clamp_selection(&mut self, state: &AppState) {
        self.user_index = self.user_index.min(state.users().len().saturating_sub(1));
        self.file_index = self.file_index.min(state.files().len().saturating_sub(1));
    }

    /// Move selection up on the current tab
    pub fn move_up(&mut self) {
        match self.tab {
            Tab::Status => {}
            Tab::Streamers => self.user_index = self.user_index.saturating_sub(1),
            Tab::Files => self.file_index = self.file_index.saturating_sub(1),
            Tab::Logs => {
                let from = if self.log_follow {
                    self.log_last_page.get()
                } else {
                    self.log_scroll.min(self.log_last_page.get())
                };
                self.log_follow = false;
                self.log_scroll = from.saturating_sub(1);
            }
        }
    }

    /// Move selection down on the current tab
    pub fn move_down(&mut self, state: &AppState) {
        match self.tab {
            Tab::Status => {}
            Tab::Streamers => {
                if self.user_index + 1 < state.users().len() {
                    self.user_index += 1;
                }
            }
            Tab::Files => {
                if self.file_index + 1 < state.files().len() {
                    self.file_index += 1;
                }
            }
            Tab::Logs if !self.log_follow => {
                let last_page = self.log_last_page.get();
                self.log_scroll = self.log_scroll.saturating_add(1).min(last_page);
                if self.log_scroll == last_page {
                    self.log_follow = true;
                }
            }
            Tab::Logs => {}
        }
    }

    /// Jump to the first row (vim 'g')
    pub fn move_to_first(&mut self) {
        match self.tab {
            Tab::Status => {}
            Tab::Streamers => self.user_index = 0,
            Tab::Files => self.file_index = 0,
            Tab::Logs => {
                self.log_follow = false;
                self.log_scroll = 0;
            }
        }
    }

    /// Jump to the last row (vim 'G'); on the Logs tab this resumes following
    pub fn move_to_last(&mut self, state: &AppState) {
        match self.tab {
            Tab::Status => {}
            Tab::Streamers => self.user_index = state.users().len().saturating_sub(1),
            Tab::Files => self.file_index = state.files().len().saturating_sub(1),
            Tab::Logs => self.log_follow = true,
        }
    }

    /// Enter command mode with the input pre-filled
    pub fn enter_command_mode(&mut self, prefill: &str) {
        self.input_mode = InputMode::Command;
        self.command_input = prefill.to_string();
        self.command_cursor = prefill.chars().count();
    }

    pub fn enter_confirm_mode(&mut self) {
        self.input_mode = InputMode::Confirm;
    }

    /// Exit command/confirm mode
    pub fn exit_input_mode(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command_input.clear();
        self.command_cursor = 0;
    }

    /// Take the typed command and leave command mode
    pub fn take_command(&mut self) -> String {
        let input = std::mem::take(&mut self.command_input);
        self.exit_input_mode();
        input
    }

    /// Command input up to the cursor
    pub fn input_before_cursor(&self) -> &str {
        &self.command_input[..self.byte_offset(self.command_cursor)]
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.command_input
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.command_input.len())
    }

    /// Insert character at cursor position
    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_offset(self.command_cursor);
        self.command_input.insert(at, c);
        self.command_cursor += 1;
    }

    /// Delete character before cursor
    pub fn delete_char(&mut self) {
        if self.command_cursor > 0 {
            self.command_cursor -= 1;
            let at = self.byte_offset(self.command_cursor);
            self.command_input.remove(at);
        }
    }

    /// Move cursor left
    pub fn cursor_left(&mut self) {
        self.command_cursor = self.command_cursor.saturating_sub(1);
    }

    /// Move cursor right
    pub fn cursor_right(&mut self) {
        if self.command_cursor < self.command_input.chars().count() {
            self.command_cursor += 1;
        }
    }
}
