//! recdash TUI
//!
//! Terminal dashboard for the recorder.
//!
//! ## Layout
//!
//! - Header: streamer/recording/file counters and the connection indicator
//! - Tabs: Status, Streamers, Files, Logs
//! - Bottom line: notifications, command input or confirmation prompt
//!
//! ## Navigation
//!
//! - 1-4, Tab/Shift+Tab, h/l: Switch tabs
//! - j/k or ↑/↓: Move selection up/down (scroll on the Logs tab)
//! - g/G: First/last row, G resumes following the log
//! - q: Quit
//!
//! ## Commands
//!
//! - s / x: Start / stop recording the selected streamer
//! - a: Add streamer
//! - e: Edit streamer
//! - d: Remove streamer
//! - w: Save the streamer list to the recorder
//! - r: Reload from the recorder
//! - o: Open the recorder's web page
//! - :: Command mode

mod app;
mod ui;

use std::fs::File;
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use recdash_core::{
    spawn_sync, Config, Controller, GlobalConfig, HttpApi, SyncHandle, SyncSettings, WsConnector,
};

use app::{edit_prefill, App, Command, InputMode, Tab};

/// Run the TUI application
pub async fn run(config: Config) -> Result<()> {
    // Initialize TUI logging (file-based, only if RECDASH_LOG is set)
    init_tui_logging(&config);

    let api = Arc::new(
        HttpApi::new(&config.server_url, config.request_timeout())
            .with_context(|| format!("Cannot use server URL {}", config.server_url))?,
    );
    let settings =
        SyncSettings::from_config(&config).context("Cannot derive the event connection URL")?;
    let mut controller = Controller::new(api.clone(), config.log_lines);
    let mut app = App::new(config.server_url.clone());

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    app.is_loading = true;
    terminal.draw(|frame| ui::draw(frame, &app, controller.state()))?;
    controller.bootstrap().await;
    app.is_loading = false;

    // Connection manager and pollers run until `sync` is dropped
    let sync = spawn_sync(api, WsConnector, settings);

    let result = run_app(&mut terminal, &mut app, &mut controller, sync).await;

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

async fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    controller: &mut Controller<HttpApi>,
    mut sync: SyncHandle,
) -> Result<()> {
    let mut sync_open = true;

    loop {
        controller.state_mut().expire_notification();
        app.check_status_timeout();
        app.clamp_selection(controller.state());

        terminal.draw(|frame| ui::draw(frame, app, controller.state()))?;

        tokio::select! {
            biased;

            update = sync.recv(), if sync_open => {
                match update {
                    Some(update) => controller.apply(update),
                    None => sync_open = false,
                }
            }

            // Poll for terminal events
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                if event::poll(Duration::from_millis(0))? {
                    if let Event::Key(key) = event::read()? {
                        // Only handle key press events (not release)
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }

                        // If help is showing, any key dismisses it
                        if app.show_help {
                            app.show_help = false;
                            continue;
                        }

                        let command = match app.input_mode {
                            InputMode::Normal => {
                                handle_normal_mode(app, controller, key.code, key.modifiers)
                            }
                            InputMode::Command => handle_command_mode(app, key.code, key.modifiers),
                            InputMode::Confirm => {
                                handle_confirm_mode(app, controller, key.code);
                                None
                            }
                        };

                        if let Some(command) = command {
                            perform(terminal, app, controller, command).await?;
                        }
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Handle key events in normal mode
fn handle_normal_mode(
    app: &mut App,
    controller: &Controller<HttpApi>,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Option<Command> {
    let state = controller.state();

    match code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }

        // Tabs
        KeyCode::Char(c @ '1'..='4') => {
            let index = c as usize - '1' as usize;
            app.tab = Tab::ALL[index];
        }
        KeyCode::Tab | KeyCode::Char('l') | KeyCode::Right => app.next_tab(),
        KeyCode::BackTab | KeyCode::Char('h') | KeyCode::Left => app.prev_tab(),

        // Selection
        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        KeyCode::Char('j') | KeyCode::Down => app.move_down(state),
        KeyCode::Char('g') | KeyCode::Home => app.move_to_first(),
        KeyCode::Char('G') | KeyCode::End => app.move_to_last(state),

        // Recording
        KeyCode::Char('s') => return Some(Command::Start),
        KeyCode::Char('x') => return Some(Command::Stop),

        // Streamer list
        KeyCode::Char('a') => {
            app.tab = Tab::Streamers;
            app.enter_command_mode("add ");
        }
        KeyCode::Char('e') => match app.selected_user(state) {
            Some((_, user)) => {
                let prefill = edit_prefill(user);
                app.enter_command_mode(&prefill);
            }
            None => app.set_status("No streamer selected"),
        },
        KeyCode::Char('d') => return Some(Command::Remove),
        KeyCode::Char('w') => return Some(Command::Save),
        KeyCode::Char('r') => return Some(Command::Reload),

        KeyCode::Char('o') => return Some(Command::Open),
        KeyCode::Char(':') => app.enter_command_mode(""),
        KeyCode::Char('?') => app.toggle_help(),

        _ => {}
    }

    None
}

/// Handle key events in command mode
fn handle_command_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Option<Command> {
    match code {
        // Cancel command
        KeyCode::Esc => app.exit_input_mode(),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.exit_input_mode();
        }

        // Execute command
        KeyCode::Enter => {
            let input = app.take_command();
            match Command::parse(&input) {
                Ok(command) => return command,
                Err(usage) => app.set_status(usage),
            }
        }

        // Text editing
        KeyCode::Backspace => app.delete_char(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Char(c) => app.insert_char(c),

        _ => {}
    }

    None
}

/// Handle the y/n answer to "Remove ...?"
fn handle_confirm_mode(app: &mut App, controller: &mut Controller<HttpApi>, code: KeyCode) {
    app.exit_input_mode();

    if !matches!(code, KeyCode::Char('y') | KeyCode::Char('Y')) {
        return;
    }

    let index = app.selected_user(controller.state()).map(|(index, _)| index);
    if let Some(index) = index {
        if controller.state_mut().remove_user(index).is_some() {
            app.status_message = None;
            app.dirty = true;
        }
    }
}

/// Carry out a command against the controller
async fn perform<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    controller: &mut Controller<HttpApi>,
    command: Command,
) -> Result<()> {
    // Controller notifications replace local messages
    app.status_message = None;

    match command {
        Command::Add { platform, id, name } => {
            let exists = controller
                .state()
                .users()
                .iter()
                .any(|user| user.platform == platform && user.id == id);
            if exists {
                app.set_status(format!("{} {} is already configured", platform, id));
                return Ok(());
            }

            let state = controller.state_mut();
            state.begin_add();
            let form = state.editing_user_mut();
            form.platform = platform;
            form.id = id;
            form.name = name;
            if state.save_editing_user() {
                app.dirty = true;
                app.user_index = state.users().len().saturating_sub(1);
            }
        }
        Command::Edit(fields) => {
            let Some((index, _)) = app.selected_user(controller.state()) else {
                app.set_status("No streamer selected");
                return Ok(());
            };

            let state = controller.state_mut();
            state.edit_user(index);
            let form = state.editing_user_mut();
            for (key, value) in &fields {
                if let Err(e) = form.set_field(key, value) {
                    state.cancel_editing();
                    app.set_status(e.to_string());
                    return Ok(());
                }
            }
            if state.save_editing_user() {
                app.dirty = true;
            }
        }
        Command::Remove => {
            if app.selected_user(controller.state()).is_some() {
                app.enter_confirm_mode();
            } else {
                app.set_status("No streamer selected");
            }
        }
        Command::Start => {
            let Some((_, user)) = app.selected_user(controller.state()) else {
                app.set_status("No streamer selected");
                return Ok(());
            };
            let user = user.clone();

            app.is_loading = true;
            terminal.draw(|frame| ui::draw(frame, app, controller.state()))?;
            controller.start_recording(&user).await;
            app.is_loading = false;
        }
        Command::Stop => {
            let Some((_, user)) = app.selected_user(controller.state()) else {
                app.set_status("No streamer selected");
                return Ok(());
            };
            let user = user.clone();

            app.is_loading = true;
            terminal.draw(|frame| ui::draw(frame, app, controller.state()))?;
            controller.stop_recording(&user).await;
            app.is_loading = false;
        }
        Command::Save => {
            app.is_loading = true;
            terminal.draw(|frame| ui::draw(frame, app, controller.state()))?;
            if controller.save_config().await {
                app.dirty = false;
            }
            app.is_loading = false;
        }
        Command::Reload => {
            app.is_loading = true;
            terminal.draw(|frame| ui::draw(frame, app, controller.state()))?;
            controller.bootstrap().await;
            app.dirty = false;
            app.is_loading = false;
        }
        Command::SetProxy(proxy) => {
            let global = GlobalConfig {
                proxy,
                ..controller.state().config().global.clone()
            };
            controller.state_mut().set_global(global);
            app.dirty = true;
            app.set_status("Proxy changed. Press w to save");
        }
        Command::SetOutput(output) => {
            let global = GlobalConfig {
                output,
                ..controller.state().config().global.clone()
            };
            controller.state_mut().set_global(global);
            app.dirty = true;
            app.set_status("Output directory changed. Press w to save");
        }
        Command::Open => {
            if let Err(e) = open::that(&app.server_url) {
                app.set_status(format!("Failed to open browser: {}", e));
            }
        }
        Command::Quit => app.should_quit = true,
    }

    Ok(())
}

/// Initialize logging for TUI mode
///
/// Only initializes if RECDASH_LOG environment variable is set.
/// Logs to file (config.log_file or default {data_dir}/debug.log).
fn init_tui_logging(config: &Config) {
    let Ok(log_level) = std::env::var("RECDASH_LOG") else {
        return;
    };

    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "recdash_core={},recdash_cli={}",
        log_level, log_level
    ));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("TUI logging initialized to {:?}", log_path);
}
