//! UI rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap},
    Frame,
};

use recdash_core::models::format_timestamp;
use recdash_core::{AppState, ConnectionState, NotificationKind, StatusClass};

use super::app::{App, InputMode, Tab};

/// Main UI rendering function
pub fn draw(frame: &mut Frame, app: &App, state: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_header(frame, app, state, chunks[0]);
    draw_tabs(frame, app, chunks[1]);

    match app.tab {
        Tab::Status => draw_status_tab(frame, app, state, chunks[2]),
        Tab::Streamers => draw_streamers_tab(frame, app, state, chunks[2]),
        Tab::Files => draw_files_tab(frame, app, state, chunks[2]),
        Tab::Logs => draw_logs_tab(frame, app, state, chunks[2]),
    }

    match app.input_mode {
        InputMode::Normal => draw_status_bar(frame, app, state, chunks[3]),
        InputMode::Command => draw_command_input(frame, app, chunks[3]),
        InputMode::Confirm => draw_confirm_prompt(frame, app, state, chunks[3]),
    }

    if app.show_help {
        draw_help_overlay(frame);
    }
}

fn status_style(class: StatusClass) -> Style {
    match class {
        StatusClass::Recording => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        StatusClass::Online => Style::default().fg(Color::Green),
        StatusClass::Offline => Style::default().fg(Color::DarkGray),
    }
}

/// Stats line with the connection indicator on the right
fn draw_header(frame: &mut Frame, app: &App, state: &AppState, area: Rect) {
    let stats = state.stats();
    let mut spans = vec![
        Span::styled(" recdash ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            " {} streamers  {} recording  {} files  {}",
            stats.total_users, stats.recording, stats.files, stats.total_size
        )),
    ];
    if app.dirty {
        spans.push(Span::styled(
            "  [modified]",
            Style::default().fg(Color::Yellow),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);

    let (icon, style) = match state.connection() {
        ConnectionState::Open => ("●", Style::default().fg(Color::Green)),
        ConnectionState::Connecting => ("◌", Style::default().fg(Color::Yellow)),
        ConnectionState::Disconnected => ("○", Style::default().fg(Color::Red)),
    };
    let label = format!("{} {} ", icon, state.connection());
    let width = label.chars().count() as u16;
    if area.width > width {
        let indicator_area = Rect::new(area.x + area.width - width, area.y, width, 1);
        frame.render_widget(Paragraph::new(Span::styled(label, style)), indicator_area);
    }
}

fn draw_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<String> = Tab::ALL
        .iter()
        .enumerate()
        .map(|(i, tab)| format!("{} {}", i + 1, tab.title()))
        .collect();

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL))
        .select(app.tab.index())
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .add_modifier(Modifier::REVERSED),
        );

    frame.render_widget(tabs, area);
}

/// Recorder overview plus the raw status table
fn draw_status_tab(frame: &mut Frame, app: &App, state: &AppState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(3)])
        .split(area);

    let global = &state.config().global;
    let stats = state.stats();
    let label = Style::default().add_modifier(Modifier::DIM);
    let overview = vec![
        Line::from(vec![
            Span::styled("Server:     ", label),
            Span::raw(app.server_url.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Output dir: ", label),
            Span::raw(global.output.as_str()),
        ]),
        Line::from(vec![
            Span::styled("Proxy:      ", label),
            Span::raw(global.proxy.as_deref().unwrap_or("(not set)")),
        ]),
        Line::from(vec![
            Span::styled("Recording:  ", label),
            Span::raw(match stats.reported_recording {
                Some(reported) => format!("{} (recorder reports {})", stats.recording, reported),
                None => stats.recording.to_string(),
            }),
        ]),
        Line::from(vec![
            Span::styled("Platforms:  ", label),
            Span::raw(state.platforms().join(", ")),
        ]),
    ];
    let block = Block::default().title(" Recorder ").borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(overview).block(block).wrap(Wrap { trim: true }),
        chunks[0],
    );

    let rows: Vec<Row> = state
        .recording_status()
        .iter()
        .map(|(key, record)| {
            let status = match (record.status, record.recording) {
                (Some(status), _) => status.to_string(),
                (None, Some(true)) => "recording".to_string(),
                (None, _) => String::new(),
            };
            let since = record
                .timestamp
                .as_deref()
                .map(format_timestamp)
                .unwrap_or_default();
            Row::new(vec![
                Cell::from(key.clone()),
                Cell::from(status),
                Cell::from(since),
            ])
        })
        .collect();

    let title = format!(" Status table ({}) ", state.recording_status().len());
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(45),
            Constraint::Length(10),
            Constraint::Min(19),
        ],
    )
    .header(
        Row::new(vec!["Key", "Status", "Since"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().title(title).borders(Borders::ALL));

    frame.render_widget(table, chunks[1]);
}

fn draw_streamers_tab(frame: &mut Frame, app: &App, state: &AppState, area: Rect) {
    let rows: Vec<Row> = state
        .users()
        .iter()
        .map(|user| {
            let class = state.status_class_for(user);
            Row::new(vec![
                Cell::from(user.platform.clone()),
                Cell::from(user.id.clone()),
                Cell::from(user.display_name().to_string()),
                Cell::from(format!("{}s", user.interval)),
                Cell::from(user.format.clone()),
                Cell::from(class.label()).style(status_style(class)),
            ])
        })
        .collect();

    let title = format!(" Streamers ({}) ", state.users().len());
    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(16),
            Constraint::Min(12),
            Constraint::Length(8),
            Constraint::Length(6),
            Constraint::Length(10),
        ],
    )
    .header(
        Row::new(vec!["Platform", "Room", "Name", "Interval", "Format", "Status"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().title(title).borders(Borders::ALL))
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut table_state = TableState::default();
    if !state.users().is_empty() {
        table_state.select(Some(app.user_index));
    }

    frame.render_stateful_widget(table, area, &mut table_state);
}

fn draw_files_tab(frame: &mut Frame, app: &App, state: &AppState, area: Rect) {
    let rows: Vec<Row> = state
        .files()
        .iter()
        .map(|file| {
            Row::new(vec![
                Cell::from(file.name.clone()),
                Cell::from(format!("{:.2} MB", file.size_mb)),
                Cell::from(
                    file.modified
                        .as_deref()
                        .map(format_timestamp)
                        .unwrap_or_default(),
                ),
            ])
        })
        .collect();

    let title = match state.output_dir() {
        Some(dir) => format!(" Files ({}) in {} ", state.files().len(), dir),
        None => format!(" Files ({}) ", state.files().len()),
    };
    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(12),
            Constraint::Length(19),
        ],
    )
    .header(
        Row::new(vec!["Name", "Size", "Modified"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(Block::default().title(title).borders(Borders::ALL))
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut table_state = TableState::default();
    if !state.files().is_empty() {
        table_state.select(Some(app.file_index));
    }

    frame.render_stateful_widget(table, area, &mut table_state);
}

fn draw_logs_tab(frame: &mut Frame, app: &App, state: &AppState, area: Rect) {
    let lines: Vec<Line> = state
        .logs()
        .iter()
        .map(|line| Line::from(line.trim_end().to_string()))
        .collect();

    let visible = area.height.saturating_sub(2);
    let last_page = u16::try_from(lines.len())
        .unwrap_or(u16::MAX)
        .saturating_sub(visible);
    app.log_last_page.set(last_page);
    let scroll = if app.log_follow {
        last_page
    } else {
        app.log_scroll.min(last_page)
    };

    let title = match state.log_file() {
        Some(file) => format!(" Logs: {} ", file),
        None => " Logs ".to_string(),
    };
    let paragraph = Paragraph::new(lines)
        .block(Block::default().title(title).borders(Borders::ALL))
        .scroll((scroll, 0));

    frame.render_widget(paragraph, area);
}

/// Draw the status bar at the bottom
fn draw_status_bar(frame: &mut Frame, app: &App, state: &AppState, area: Rect) {
    let dim = Style::default().add_modifier(Modifier::DIM);
    let (content, style) = if app.is_loading {
        ("Working...".to_string(), dim)
    } else if let Some(msg) = &app.status_message {
        (msg.clone(), dim)
    } else if let Some(notification) = state.notification() {
        let style = match notification.kind {
            NotificationKind::Success => Style::default().fg(Color::Green),
            NotificationKind::Error => Style::default().fg(Color::Red),
        };
        (notification.message.clone(), style)
    } else {
        (
            "s:start  x:stop  a:add  e:edit  d:remove  w:save  r:reload  ?:help  q:quit"
                .to_string(),
            dim,
        )
    };

    frame.render_widget(Paragraph::new(content).style(style), area);
}

/// Draw command input at the bottom
fn draw_command_input(frame: &mut Frame, app: &App, area: Rect) {
    let prefix = ":";
    let line = Line::from(vec![
        Span::styled(prefix, Style::default().fg(Color::Yellow)),
        Span::raw(app.command_input.as_str()),
    ]);

    frame.render_widget(Paragraph::new(line), area);

    // Columns, not chars: wide glyphs take two cells
    let width = Span::raw(prefix).width() + Span::raw(app.input_before_cursor()).width();
    let cursor_x = area.x.saturating_add(u16::try_from(width).unwrap_or(u16::MAX));
    frame.set_cursor_position((cursor_x, area.y));
}

fn draw_confirm_prompt(frame: &mut Frame, app: &App, state: &AppState, area: Rect) {
    let name = app
        .selected_user(state)
        .map(|(_, user)| user.display_name().to_string())
        .unwrap_or_default();
    let line = Line::from(vec![
        Span::styled(
            format!("Remove {}? ", name),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled("(y/n)", Style::default().add_modifier(Modifier::DIM)),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Draw help overlay
fn draw_help_overlay(frame: &mut Frame) {
    let area = frame.area();

    let popup_width = 56.min(area.width.saturating_sub(4));
    let popup_height = 26.min(area.height.saturating_sub(4));
    let popup_x = (area.width.saturating_sub(popup_width)) / 2;
    let popup_y = (area.height.saturating_sub(popup_height)) / 2;
    let popup_area = Rect::new(popup_x, popup_y, popup_width, popup_height);

    frame.render_widget(Clear, popup_area);

    let help_text = vec![
        Line::from(vec![Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  1-4, Tab    Switch tabs"),
        Line::from("  j/k, ↑/↓    Move up/down"),
        Line::from("  g / G       First / last row (G follows logs)"),
        Line::from(""),
        Line::from("Streamers:"),
        Line::from("  s / x       Start / stop recording"),
        Line::from("  a           Add streamer"),
        Line::from("  e           Edit streamer"),
        Line::from("  d           Remove streamer"),
        Line::from("  w           Save to recorder"),
        Line::from(""),
        Line::from("  r           Reload from recorder"),
        Line::from("  o           Open recorder web page"),
        Line::from("  :           Command mode"),
        Line::from("              (proxy <url|none>, output <dir>)"),
        Line::from("  q           Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().add_modifier(Modifier::BOLD));

    frame.render_widget(Paragraph::new(help_text).block(block), popup_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use recdash_core::models::LogTail;
    use recdash_core::{GlobalConfig, RemoteConfig, UserConfig};

    fn render(app: &App, state: &AppState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| draw(frame, app, state)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect::<String>()
    }

    #[test]
    fn test_streamers_tab_shows_users_and_indicator() {
        let mut state = AppState::new();
        state.set_config(RemoteConfig {
            global: GlobalConfig::default(),
            users: vec![UserConfig::new("Bilibili", "123", "Alice")],
        });
        state.apply_optimistic_start(&UserConfig::new("Bilibili", "123", "Alice"));
        let app = App::new("http://127.0.0.1:8000");

        let screen = render(&app, &state);
        assert!(screen.contains("Alice"));
        assert!(screen.contains("recording"));
        assert!(screen.contains("disconnected"));
    }

    #[test]
    fn test_dirty_marker_and_confirm_prompt() {
        let mut state = AppState::new();
        state.set_config(RemoteConfig {
            global: GlobalConfig::default(),
            users: vec![UserConfig::new("Huya", "9", "Bob")],
        });
        let mut app = App::new("http://127.0.0.1:8000");
        app.dirty = true;
        app.enter_confirm_mode();

        let screen = render(&app, &state);
        assert!(screen.contains("[modified]"));
        assert!(screen.contains("Remove Bob?"));
    }

    #[test]
    fn test_logs_tab_records_last_page() {
        let mut state = AppState::new();
        state.apply_logs(LogTail {
            logs: (1..=60).map(|i| format!("line {:02}\n", i)).collect(),
            ..LogTail::default()
        });
        let mut app = App::new("http://127.0.0.1:8000");
        app.tab = Tab::Logs;

        // 30 rows: header, tabs, bordered log block, status bar
        let screen = render(&app, &state);
        assert!(screen.contains("line 60"));
        assert_eq!(app.log_last_page.get(), 60 - 23);

        app.move_up();
        let screen = render(&app, &state);
        assert_eq!(app.log_scroll, 36);
        assert!(screen.contains("line 59"));
        assert!(!screen.contains("line 60"));
    }

    #[test]
    fn test_command_cursor_counts_display_width() {
        let state = AppState::new();
        let mut app = App::new("http://127.0.0.1:8000");
        app.enter_command_mode("add Huya 1 主播");

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|frame| draw(frame, &app, &state)).unwrap();
        let cursor = terminal.get_cursor_position().unwrap();
        // ":" + "add Huya 1 " + two wide glyphs
        assert_eq!((cursor.x, cursor.y), (1 + 11 + 4, 29));

        app.cursor_left();
        terminal.draw(|frame| draw(frame, &app, &state)).unwrap();
        assert_eq!(terminal.get_cursor_position().unwrap().x, 1 + 11 + 2);
    }
}
