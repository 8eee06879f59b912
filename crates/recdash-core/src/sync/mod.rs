//! Background sync with the recorder
//!
//! Three kinds of background work keep the dashboard fresh:
//!
//! - the event connection (`/ws`), reconnecting forever with a fixed delay
//! - a status poller, scoped to each open connection
//! - a file/log refresher that runs regardless of connection state
//!
//! None of them touch [`crate::AppState`]. They send [`SyncUpdate`] values to
//! whoever holds the [`SyncHandle`], which applies them one at a time.
//!
//! ## Usage
//!
//! ```ignore
//! let mut sync = spawn_sync(api, WsConnector, SyncSettings::from_config(&config)?);
//! while let Some(update) = sync.recv().await {
//!     controller.apply(update);
//! }
//! ```

mod connection;
mod message;
mod poller;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::api::{self, RecorderApi};
use crate::config::Config;
use crate::error::ClientResult;
use crate::models::{FileListing, LogTail, StatusSnapshot, StatusTable};

pub use connection::{ConnectionState, Connector, FrameSink, FrameStream, WsConnector};
pub use message::{ServerEvent, HEARTBEAT, STATUS_UPDATE};

use connection::ConnectionManager;

/// Something the background tasks learned
#[derive(Debug, Clone)]
pub enum SyncUpdate {
    /// Event connection changed state
    Connection(ConnectionState),
    /// Status table pushed over the event connection
    StatusPush(StatusTable),
    /// Result of a `/api/status` poll
    StatusPolled(StatusSnapshot),
    /// Result of a `/api/files` refresh
    Files(FileListing),
    /// Result of a `/api/logs` refresh
    Logs(LogTail),
}

/// Timing and addressing of the background tasks
#[derive(Debug, Clone)]
pub struct SyncSettings {
    /// Event connection URL (`ws://host:port/ws`)
    pub events_url: String,
    pub heartbeat: Duration,
    pub status_poll: Duration,
    pub refresh: Duration,
    pub reconnect_delay: Duration,
    /// Lines requested from `/api/logs`
    pub log_lines: usize,
}

impl SyncSettings {
    pub fn from_config(config: &Config) -> ClientResult<Self> {
        Ok(Self {
            events_url: api::events_url(&config.server_url)?.to_string(),
            heartbeat: config.heartbeat_interval(),
            status_poll: config.status_poll_interval(),
            refresh: config.refresh_interval(),
            reconnect_delay: config.reconnect_delay(),
            log_lines: config.log_lines,
        })
    }
}

/// Owner's side of the background tasks
///
/// Dropping the handle aborts every task.
pub struct SyncHandle {
    /// Updates from the background tasks
    pub updates: mpsc::Receiver<SyncUpdate>,
    /// Latest connection state
    pub status: watch::Receiver<ConnectionState>,
    _tasks: Vec<ScopedTask>,
}

impl SyncHandle {
    /// Next update, or `None` once every task has stopped
    pub async fn recv(&mut self) -> Option<SyncUpdate> {
        self.updates.recv().await
    }

    pub fn connection(&self) -> ConnectionState {
        *self.status.borrow()
    }
}

/// Start the event connection and the file/log refresher
pub fn spawn_sync<A, C>(api: Arc<A>, connector: C, settings: SyncSettings) -> SyncHandle
where
    A: RecorderApi,
    C: Connector,
{
    let (updates_tx, updates_rx) = mpsc::channel(64);
    let (status_tx, status_rx) = watch::channel(ConnectionState::Disconnected);

    let refresher = ScopedTask::spawn(poller::refresh_files_and_logs(
        api.clone(),
        settings.refresh,
        settings.log_lines,
        updates_tx.clone(),
    ));

    let manager = ConnectionManager::new(connector, api, settings, updates_tx, status_tx);
    let connection = ScopedTask::spawn(manager.run());

    SyncHandle {
        updates: updates_rx,
        status: status_rx,
        _tasks: vec![connection, refresher],
    }
}

/// A spawned task that is aborted when this guard is dropped
pub(crate) struct ScopedTask(JoinHandle<()>);

impl ScopedTask {
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self(tokio::spawn(future))
    }
}

impl Drop for ScopedTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}
