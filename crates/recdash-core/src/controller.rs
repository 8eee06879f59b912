//! Dashboard controller
//!
//! Owns the [`AppState`] and the REST client. User-initiated actions (save,
//! start, stop) report their outcome as a notification; background loads only
//! log failures. Updates from the sync tasks come in through [`Controller::apply`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::api::RecorderApi;
use crate::models::UserConfig;
use crate::state::AppState;
use crate::sync::SyncUpdate;

pub struct Controller<A: RecorderApi> {
    api: Arc<A>,
    state: AppState,
    log_lines: usize,
}

impl<A: RecorderApi> Controller<A> {
    pub fn new(api: Arc<A>, log_lines: usize) -> Self {
        Self {
            api,
            state: AppState::new(),
            log_lines,
        }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Direct access for local edits (user editor, notification expiry)
    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    /// Initial load of everything the dashboard shows
    ///
    /// Status is left to the event connection, which polls it once open.
    pub async fn bootstrap(&mut self) {
        self.load_config().await;
        self.load_platforms().await;
        self.load_files().await;
        self.load_logs().await;
    }

    /// Fetch the recorder configuration
    pub async fn load_config(&mut self) -> bool {
        match self.api.config().await {
            Ok(config) => {
                debug!("Loaded {} users", config.users.len());
                self.state.set_config(config);
                true
            }
            Err(e) => {
                warn!("Failed to load config: {}", e);
                self.state.notify_error("Failed to load config");
                false
            }
        }
    }

    /// Persist the local configuration to the recorder
    pub async fn save_config(&mut self) -> bool {
        match self.api.save_config(self.state.config()).await {
            Ok(_) => {
                info!("Saved config with {} users", self.state.users().len());
                self.state
                    .notify_success("Config saved. Restart the recorder to apply it");
                true
            }
            Err(e) => {
                warn!("Failed to save config: {}", e);
                self.state.notify_error("Failed to save config");
                false
            }
        }
    }

    pub async fn load_platforms(&mut self) {
        match self.api.platforms().await {
            Ok(list) => self.state.set_platforms(list.platforms),
            Err(e) => warn!("Failed to load platforms: {}", e),
        }
    }

    pub async fn load_status(&mut self) {
        match self.api.status().await {
            Ok(snapshot) => self.state.apply_status_snapshot(snapshot),
            Err(e) => warn!("Failed to load status: {}", e),
        }
    }

    pub async fn load_files(&mut self) {
        match self.api.files().await {
            Ok(listing) => self.state.apply_files(listing),
            Err(e) => warn!("Failed to load files: {}", e),
        }
    }

    pub async fn load_logs(&mut self) {
        match self.api.logs(self.log_lines).await {
            Ok(tail) => self.state.apply_logs(tail),
            Err(e) => warn!("Failed to load logs: {}", e),
        }
    }

    /// Ask the recorder to start recording `user`
    ///
    /// On success the user is marked as recording right away; the next status
    /// snapshot overwrites that.
    pub async fn start_recording(&mut self, user: &UserConfig) -> bool {
        match self.api.start_recording(&user.platform, &user.id).await {
            Ok(_) => {
                info!("Started recording {}", user.status_key());
                self.state.apply_optimistic_start(user);
                self.state
                    .notify_success(format!("Starting recording of {}", user.display_name()));
                true
            }
            Err(e) => {
                warn!("Failed to start recording {}: {}", user.status_key(), e);
                self.state.notify_error("Failed to start recording");
                false
            }
        }
    }

    /// Ask the recorder to stop recording `user`
    pub async fn stop_recording(&mut self, user: &UserConfig) -> bool {
        match self.api.stop_recording(&user.platform, &user.id).await {
            Ok(_) => {
                info!("Stopped recording {}", user.status_key());
                if !self.state.apply_optimistic_stop(user) {
                    debug!("No status entry for {}", user.status_key());
                }
                self.state
                    .notify_success(format!("Stopped recording of {}", user.display_name()));
                true
            }
            Err(e) => {
                warn!("Failed to stop recording {}: {}", user.status_key(), e);
                self.state.notify_error("Failed to stop recording");
                false
            }
        }
    }

    /// Apply one update from the background tasks
    pub fn apply(&mut self, update: SyncUpdate) {
        match update {
            SyncUpdate::Connection(connection) => self.state.set_connection(connection),
            SyncUpdate::StatusPush(table) => self.state.merge_status_update(table),
            SyncUpdate::StatusPolled(snapshot) => self.state.apply_status_snapshot(snapshot),
            SyncUpdate::Files(listing) => self.state.apply_files(listing),
            SyncUpdate::Logs(tail) => self.state.apply_logs(tail),
        }
    }
}
