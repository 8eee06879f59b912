//! REST pollers
//!
//! Failures are logged and the schedule carries on. The only way out of a
//! poll loop is the update receiver going away (or the task being aborted).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::SyncUpdate;
use crate::api::RecorderApi;

/// Poll `/api/status` right away, then every `period`
pub(crate) async fn poll_status<A: RecorderApi>(
    api: Arc<A>,
    period: Duration,
    updates: mpsc::Sender<SyncUpdate>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        match api.status().await {
            Ok(snapshot) => {
                if updates.send(SyncUpdate::StatusPolled(snapshot)).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!("Status poll failed: {}", e),
        }
    }
}

/// Re-fetch files and logs every `period`, starting one period from now
pub(crate) async fn refresh_files_and_logs<A: RecorderApi>(
    api: Arc<A>,
    period: Duration,
    log_lines: usize,
    updates: mpsc::Sender<SyncUpdate>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        debug!("Refreshing files and logs");

        match api.files().await {
            Ok(listing) => {
                if updates.send(SyncUpdate::Files(listing)).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!("File refresh failed: {}", e),
        }

        match api.logs(log_lines).await {
            Ok(tail) => {
                if updates.send(SyncUpdate::Logs(tail)).await.is_err() {
                    break;
                }
            }
            Err(e) => warn!("Log refresh failed: {}", e),
        }
    }
}
