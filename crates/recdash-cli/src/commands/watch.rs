//! Watch command: follow the recorder's live updates

use anyhow::{Context, Result};

use recdash_core::{
    spawn_sync, AppState, Config, Controller, RecorderApi, SyncSettings, SyncUpdate, WsConnector,
};

use crate::output::{describe_record, Output, OutputFormat};

/// Stream updates until Ctrl-C or until the background tasks stop
pub async fn run(config: &Config, output: &Output) -> Result<()> {
    let api = super::api(config)?;
    let settings =
        SyncSettings::from_config(config).context("Cannot derive the event connection URL")?;

    let mut controller = Controller::new(api.clone(), config.log_lines);
    controller.bootstrap().await;

    output.message(&format!(
        "Watching {} ({} streamer(s)). Press Ctrl-C to stop.",
        settings.events_url,
        controller.state().users().len()
    ));

    let mut sync = spawn_sync(api, WsConnector, settings);

    loop {
        tokio::select! {
            update = sync.recv() => {
                let Some(update) = update else { break };
                for line in receive(&mut controller, update, output.format) {
                    println!("{}", line);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

/// Apply `update` to the controller, then render it in `format`
fn receive<A: RecorderApi>(
    controller: &mut Controller<A>,
    update: SyncUpdate,
    format: OutputFormat,
) -> Vec<String> {
    controller.apply(update.clone());
    render_update(&update, controller.state(), format)
}

/// Lines to print for `update`; `state` must already include it
fn render_update(update: &SyncUpdate, state: &AppState, format: OutputFormat) -> Vec<String> {
    match format {
        OutputFormat::Json => vec![update_json(update).to_string()],
        OutputFormat::Human => describe_update(update),
        OutputFormat::Quiet => match update {
            SyncUpdate::StatusPush(_) | SyncUpdate::StatusPolled(_) => {
                vec![state.stats().recording.to_string()]
            }
            _ => Vec::new(),
        },
    }
}

/// Human-readable lines for one update
fn describe_update(update: &SyncUpdate) -> Vec<String> {
    let now = chrono::Local::now().format("%H:%M:%S");
    match update {
        SyncUpdate::Connection(state) => vec![format!("[{}] connection {}", now, state)],
        SyncUpdate::StatusPush(table) => {
            let mut lines = vec![format!("[{}] status update, {} entr(ies)", now, table.len())];
            lines.extend(
                table
                    .iter()
                    .map(|(key, record)| format!("    {}", describe_record(key, record))),
            );
            lines
        }
        SyncUpdate::StatusPolled(snapshot) => vec![format!(
            "[{}] status poll, {} recording",
            now,
            snapshot
                .recording_count
                .unwrap_or(snapshot.recording.len() as u64)
        )],
        SyncUpdate::Files(listing) => vec![format!(
            "[{}] files: {} ({} MB)",
            now, listing.count, listing.total_size_mb
        )],
        SyncUpdate::Logs(tail) => match tail.logs.last() {
            Some(last) => vec![format!("[{}] log: {}", now, last.trim_end())],
            None => Vec::new(),
        },
    }
}

fn update_json(update: &SyncUpdate) -> serde_json::Value {
    match update {
        SyncUpdate::Connection(state) => {
            serde_json::json!({"type": "connection", "state": state.as_str()})
        }
        SyncUpdate::StatusPush(table) => {
            serde_json::json!({"type": "status_update", "data": table})
        }
        SyncUpdate::StatusPolled(snapshot) => serde_json::json!({
            "type": "status",
            "recording": snapshot.recording,
            "recording_count": snapshot.recording_count,
            "tasks": snapshot.tasks,
        }),
        SyncUpdate::Files(listing) => serde_json::json!({
            "type": "files",
            "count": listing.count,
            "total_size_mb": listing.total_size_mb,
        }),
        SyncUpdate::Logs(tail) => serde_json::json!({
            "type": "logs",
            "lines": tail.logs.len(),
            "last": tail.logs.last(),
        }),
    }
}
