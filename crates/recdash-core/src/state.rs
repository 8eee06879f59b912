//! Application state
//!
//! Everything the dashboard shows lives in [`AppState`]. Fields are private:
//! every mutation goes through a method here so that the derived [`Stats`]
//! are recomputed in one place.
//!
//! The recording status table is written from three directions:
//! - push updates from the event connection (snapshot replace)
//! - `/api/status` polls (snapshot replace)
//! - optimistic start/stop updates, which stand until the next snapshot

use std::time::{Duration, Instant};

use crate::models::{
    format_size_mb, FileEntry, FileListing, GlobalConfig, LogTail, RecordingStatus, RemoteConfig,
    StatusClass, StatusRecord, StatusSnapshot, StatusTable, UserConfig, DEFAULT_PLATFORM,
};
use crate::sync::ConnectionState;

/// How long a notification stays visible
pub const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

/// Counters shown in the dashboard header
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    /// Number of configured users
    pub total_users: usize,
    /// Number of table entries whose status is `recording`
    pub recording: usize,
    /// Number of recorded files
    pub files: u64,
    /// Total size of recorded files, e.g. "12.5 MB"
    pub total_size: String,
    /// `recording_count` from the last `/api/status` poll
    pub reported_recording: Option<u64>,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            total_users: 0,
            recording: 0,
            files: 0,
            total_size: format_size_mb(0.0),
            reported_recording: None,
        }
    }
}

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A transient message for the operator
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    pub raised_at: Instant,
}

impl Notification {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind,
            raised_at: Instant::now(),
        }
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.raised_at) >= NOTIFICATION_TTL
    }
}

/// The add/edit form for a tracked user
#[derive(Debug, Clone)]
pub struct UserEditor {
    /// Form contents
    pub user: UserConfig,
    /// Index being edited, `None` when adding
    pub index: Option<usize>,
    /// Whether the form is shown
    pub open: bool,
}

impl UserEditor {
    fn blank(platform: &str) -> Self {
        Self {
            user: UserConfig {
                platform: platform.to_string(),
                ..UserConfig::default()
            },
            index: None,
            open: false,
        }
    }
}

/// State of the dashboard
#[derive(Debug, Clone)]
pub struct AppState {
    config: RemoteConfig,
    recording_status: StatusTable,
    files: Vec<FileEntry>,
    output_dir: Option<String>,
    logs: Vec<String>,
    log_file: Option<String>,
    platforms: Vec<String>,
    stats: Stats,
    connection: ConnectionState,
    notification: Option<Notification>,
    editor: UserEditor,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            config: RemoteConfig::default(),
            recording_status: StatusTable::new(),
            files: Vec::new(),
            output_dir: None,
            logs: Vec::new(),
            log_file: None,
            platforms: Vec::new(),
            stats: Stats::default(),
            connection: ConnectionState::Disconnected,
            notification: None,
            editor: UserEditor::blank(DEFAULT_PLATFORM),
        }
    }

    // ---- read access ----

    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    pub fn users(&self) -> &[UserConfig] {
        &self.config.users
    }

    pub fn recording_status(&self) -> &StatusTable {
        &self.recording_status
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn files(&self) -> &[FileEntry] {
        &self.files
    }

    pub fn output_dir(&self) -> Option<&str> {
        self.output_dir.as_deref()
    }

    pub fn logs(&self) -> &[String] {
        &self.logs
    }

    pub fn log_file(&self) -> Option<&str> {
        self.log_file.as_deref()
    }

    pub fn platforms(&self) -> &[String] {
        &self.platforms
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionState::Open
    }

    pub fn editor(&self) -> &UserEditor {
        &self.editor
    }

    /// Current notification, if it hasn't expired yet
    pub fn notification(&self) -> Option<&Notification> {
        self.notification
            .as_ref()
            .filter(|n| !n.is_expired_at(Instant::now()))
    }

    // ---- status table ----

    /// Replace the whole status table with `table`
    ///
    /// This is a snapshot replace, not a per-key merge: keys missing from
    /// `table` disappear, including optimistic entries.
    pub fn merge_status_update(&mut self, table: StatusTable) {
        self.recording_status = table;
        self.recompute_stats();
    }

    /// Apply a `/api/status` poll result
    pub fn apply_status_snapshot(&mut self, snapshot: StatusSnapshot) {
        self.stats.reported_recording = snapshot.recording_count;
        self.merge_status_update(snapshot.recording);
    }

    /// Recompute the derived counters from users and the status table
    pub fn recompute_stats(&mut self) -> &Stats {
        self.stats.total_users = self.config.users.len();
        self.stats.recording = self
            .recording_status
            .values()
            .filter(|record| record.is(RecordingStatus::Recording))
            .count();
        &self.stats
    }

    pub fn status_for(&self, user: &UserConfig) -> Option<&StatusRecord> {
        self.recording_status.get(&user.status_key())
    }

    /// Display class of a user: recording, then online, else offline
    pub fn status_class_for(&self, user: &UserConfig) -> StatusClass {
        match self.status_for(user).and_then(|record| record.status) {
            Some(RecordingStatus::Recording) => StatusClass::Recording,
            Some(RecordingStatus::Online) => StatusClass::Online,
            _ => StatusClass::Offline,
        }
    }

    pub fn is_recording(&self, user: &UserConfig) -> bool {
        self.status_class_for(user) == StatusClass::Recording
    }

    /// Mark `user` as recording after a successful start request
    pub fn apply_optimistic_start(&mut self, user: &UserConfig) {
        self.recording_status.insert(
            user.status_key(),
            StatusRecord::optimistic(user, RecordingStatus::Recording),
        );
        self.recompute_stats();
    }

    /// Mark `user` as stopped after a successful stop request
    ///
    /// Only touches an existing entry; returns whether one was found.
    pub fn apply_optimistic_stop(&mut self, user: &UserConfig) -> bool {
        let Some(record) = self.recording_status.get_mut(&user.status_key()) else {
            return false;
        };
        record.status = Some(RecordingStatus::Stopped);
        self.recompute_stats();
        true
    }

    // ---- polled data ----

    pub fn set_config(&mut self, config: RemoteConfig) {
        self.config = config;
        self.recompute_stats();
    }

    pub fn set_global(&mut self, global: GlobalConfig) {
        self.config.global = global;
    }

    pub fn set_platforms(&mut self, platforms: Vec<String>) {
        self.platforms = platforms;
    }

    pub fn apply_files(&mut self, listing: FileListing) {
        self.stats.files = listing.count;
        self.stats.total_size = format_size_mb(listing.total_size_mb);
        self.files = listing.files;
        self.output_dir = listing.output_dir;
    }

    pub fn apply_logs(&mut self, tail: LogTail) {
        self.logs = tail.logs;
        self.log_file = tail.file;
    }

    pub fn set_connection(&mut self, connection: ConnectionState) {
        self.connection = connection;
    }

    // ---- notifications ----

    pub fn notify(&mut self, kind: NotificationKind, message: impl Into<String>) {
        self.notification = Some(Notification::new(kind, message));
    }

    pub fn notify_success(&mut self, message: impl Into<String>) {
        self.notify(NotificationKind::Success, message);
    }

    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.notify(NotificationKind::Error, message);
    }

    /// Drop the notification once it has been shown long enough
    pub fn expire_notification(&mut self) {
        if self
            .notification
            .as_ref()
            .is_some_and(|n| n.is_expired_at(Instant::now()))
        {
            self.notification = None;
        }
    }

    // ---- user editor ----

    /// Open an empty form for a new user
    pub fn begin_add(&mut self) {
        self.cancel_editing();
        self.editor.open = true;
    }

    /// Load the user at `index` into the form
    pub fn edit_user(&mut self, index: usize) -> bool {
        let Some(user) = self.config.users.get(index) else {
            return false;
        };
        self.editor = UserEditor {
            user: user.clone(),
            index: Some(index),
            open: true,
        };
        true
    }

    /// Mutable access to the form contents
    pub fn editing_user_mut(&mut self) -> &mut UserConfig {
        &mut self.editor.user
    }

    /// Close and reset the form
    pub fn cancel_editing(&mut self) {
        let platform = self
            .platforms
            .first()
            .map(String::as_str)
            .unwrap_or(DEFAULT_PLATFORM)
            .to_string();
        self.editor = UserEditor::blank(&platform);
    }

    /// Commit the form into the user list
    ///
    /// Requires a room id and a name. Only changes the local list; call
    /// [`crate::Controller::save_config`] to persist.
    pub fn save_editing_user(&mut self) -> bool {
        let user = self.editor.user.clone();
        if user.id.trim().is_empty() || user.name.trim().is_empty() {
            self.notify_error("Room id and streamer name are required");
            return false;
        }

        match self.editor.index {
            Some(index) if index < self.config.users.len() => {
                self.config.users[index] = user;
                self.notify_success("Streamer updated");
            }
            _ => {
                self.config.users.push(user);
                self.notify_success("Streamer added");
            }
        }

        self.cancel_editing();
        self.recompute_stats();
        true
    }

    /// Remove the user at `index`
    ///
    /// The user's status entry is left in the table until the next snapshot.
    pub fn remove_user(&mut self, index: usize) -> Option<UserConfig> {
        if index >= self.config.users.len() {
            return None;
        }
        let removed = self.config.users.remove(index);
        self.notify_success(format!("Removed {}", removed.display_name()));
        self.recompute_stats();
        Some(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::status_key;

    fn record(status: Option<RecordingStatus>) -> StatusRecord {
        StatusRecord {
            status,
            ..StatusRecord::default()
        }
    }

    fn state_with_users(users: &[(&str, &str, &str)]) -> AppState {
        let mut state = AppState::new();
        state.set_config(RemoteConfig {
            global: GlobalConfig::default(),
            users: users
                .iter()
                .map(|(p, id, name)| UserConfig::new(*p, *id, *name))
                .collect(),
        });
        state
    }

    #[test]
    fn test_recompute_stats_empty() {
        let mut state = AppState::new();
        let stats = state.recompute_stats().clone();
        assert_eq!(stats.total_users, 0);
        assert_eq!(stats.recording, 0);
    }

    #[test]
    fn test_recompute_stats_counts_only_recording() {
        let mut state = state_with_users(&[("Bilibili", "1", "a"), ("Huya", "2", "b")]);

        let mut table = StatusTable::new();
        table.insert("Bilibili_1".into(), record(Some(RecordingStatus::Recording)));
        table.insert("Huya_2".into(), record(Some(RecordingStatus::Online)));
        table.insert("Douyu_3".into(), record(Some(RecordingStatus::Recording)));
        table.insert("Douyu_4".into(), record(Some(RecordingStatus::Stopped)));
        table.insert("Douyu_5".into(), record(None));
        state.merge_status_update(table);

        assert_eq!(state.stats().total_users, 2);
        assert_eq!(state.stats().recording, 2);
    }

    #[test]
    fn test_recompute_stats_idempotent() {
        let mut state = state_with_users(&[("Bilibili", "1", "a")]);
        let mut table = StatusTable::new();
        table.insert("Bilibili_1".into(), record(Some(RecordingStatus::Recording)));
        state.merge_status_update(table);

        let first = state.recompute_stats().clone();
        let second = state.recompute_stats().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn test_merge_is_snapshot_replace() {
        let mut state = AppState::new();
        let user = UserConfig::new("Bilibili", "123", "A");
        state.apply_optimistic_start(&user);

        let mut table = StatusTable::new();
        table.insert("Huya_9".into(), record(Some(RecordingStatus::Online)));
        state.merge_status_update(table.clone());

        assert_eq!(state.recording_status(), &table);
        assert!(state.status_for(&user).is_none());
        assert_eq!(state.stats().recording, 0);
    }

    #[test]
    fn test_status_class_precedence() {
        let users = [
            UserConfig::new("P", "rec", "a"),
            UserConfig::new("P", "on", "b"),
            UserConfig::new("P", "stop", "c"),
            UserConfig::new("P", "off", "d"),
            UserConfig::new("P", "unknown", "e"),
            UserConfig::new("P", "none", "f"),
            UserConfig::new("P", "missing", "g"),
        ];

        let mut table = StatusTable::new();
        table.insert(status_key("P", "rec"), record(Some(RecordingStatus::Recording)));
        table.insert(status_key("P", "on"), record(Some(RecordingStatus::Online)));
        table.insert(status_key("P", "stop"), record(Some(RecordingStatus::Stopped)));
        table.insert(status_key("P", "off"), record(Some(RecordingStatus::Offline)));
        table.insert(status_key("P", "unknown"), record(Some(RecordingStatus::Unknown)));
        table.insert(status_key("P", "none"), record(None));

        let mut state = AppState::new();
        state.merge_status_update(table);

        let classes: Vec<_> = users
            .iter()
            .map(|u| state.status_class_for(u).css_class())
            .collect();
        assert_eq!(
            classes,
            vec![
                "status-recording recording-pulse",
                "status-online",
                "status-offline",
                "status-offline",
                "status-offline",
                "status-offline",
                "status-offline",
            ]
        );
        assert!(state.is_recording(&users[0]));
        assert!(!state.is_recording(&users[1]));
    }

    #[test]
    fn test_optimistic_start_on_empty_table() {
        let mut state = AppState::new();
        let user = UserConfig::new("Bilibili", "123", "A");
        state.apply_optimistic_start(&user);

        let entry = &state.recording_status()["Bilibili_123"];
        assert_eq!(entry.status, Some(RecordingStatus::Recording));
        assert_eq!(entry.platform.as_deref(), Some("Bilibili"));
        assert_eq!(entry.user_id.as_deref(), Some("123"));
        assert_eq!(state.stats().recording, 1);
    }

    #[test]
    fn test_optimistic_stop_without_entry() {
        let mut state = AppState::new();
        let user = UserConfig::new("Bilibili", "123", "A");

        assert!(!state.apply_optimistic_stop(&user));
        assert!(state.recording_status().is_empty());
    }

    #[test]
    fn test_optimistic_stop_with_entry() {
        let mut state = AppState::new();
        let user = UserConfig::new("Bilibili", "123", "A");
        state.apply_optimistic_start(&user);

        assert!(state.apply_optimistic_stop(&user));
        assert_eq!(
            state.status_for(&user).and_then(|r| r.status),
            Some(RecordingStatus::Stopped)
        );
        assert_eq!(state.stats().recording, 0);
    }

    #[test]
    fn test_status_snapshot_keeps_reported_count() {
        let mut state = AppState::new();
        let mut snapshot = StatusSnapshot {
            recording_count: Some(3),
            ..StatusSnapshot::default()
        };
        snapshot
            .recording
            .insert("url".into(), record(Some(RecordingStatus::Recording)));
        state.apply_status_snapshot(snapshot);

        assert_eq!(state.stats().reported_recording, Some(3));
        assert_eq!(state.stats().recording, 1);
    }

    #[test]
    fn test_apply_files_updates_stats() {
        let mut state = AppState::new();
        assert_eq!(state.stats().total_size, "0 MB");

        state.apply_files(FileListing {
            files: vec![FileEntry {
                name: "a.flv".into(),
                size: 1024,
                ..FileEntry::default()
            }],
            count: 1,
            total_size_mb: 12.5,
            output_dir: Some("output".into()),
        });

        assert_eq!(state.stats().files, 1);
        assert_eq!(state.stats().total_size, "12.5 MB");
        assert_eq!(state.files().len(), 1);
        assert_eq!(state.output_dir(), Some("output"));
    }

    #[test]
    fn test_editor_requires_id_and_name() {
        let mut state = AppState::new();
        state.begin_add();
        state.editing_user_mut().id = "123".into();

        assert!(!state.save_editing_user());
        assert!(state.users().is_empty());
        assert_eq!(
            state.notification().map(|n| n.kind),
            Some(NotificationKind::Error)
        );
        // Form stays open for correction
        assert!(state.editor().open);
    }

    #[test]
    fn test_editor_add_and_edit() {
        let mut state = AppState::new();
        state.begin_add();
        {
            let form = state.editing_user_mut();
            form.id = "123".into();
            form.name = "A".into();
        }
        assert!(state.save_editing_user());
        assert_eq!(state.users().len(), 1);
        assert_eq!(state.stats().total_users, 1);
        assert!(!state.editor().open);

        assert!(state.edit_user(0));
        state.editing_user_mut().name = "B".into();
        assert!(state.save_editing_user());
        assert_eq!(state.users().len(), 1);
        assert_eq!(state.users()[0].name, "B");

        assert!(!state.edit_user(5));
    }

    #[test]
    fn test_cancel_editing_uses_first_platform() {
        let mut state = AppState::new();
        state.cancel_editing();
        assert_eq!(state.editor().user.platform, DEFAULT_PLATFORM);

        state.set_platforms(vec!["Douyu".into(), "Huya".into()]);
        state.cancel_editing();
        assert_eq!(state.editor().user.platform, "Douyu");
        assert_eq!(state.editor().user.interval, 10);
        assert!(state.editor().index.is_none());
    }

    #[test]
    fn test_remove_user_keeps_stale_status() {
        let mut state = state_with_users(&[("Bilibili", "1", "a"), ("Huya", "2", "b")]);
        let user = state.users()[0].clone();
        state.apply_optimistic_start(&user);

        let removed = state.remove_user(0).unwrap();
        assert_eq!(removed.id, "1");
        assert_eq!(state.stats().total_users, 1);
        // Stale key stays until the next snapshot
        assert!(state.recording_status().contains_key("Bilibili_1"));
        assert!(state.remove_user(9).is_none());
    }

    #[test]
    fn test_notification_expiry() {
        let notification = Notification::new(NotificationKind::Success, "ok");
        let now = notification.raised_at;
        assert!(!notification.is_expired_at(now));
        assert!(!notification.is_expired_at(now + Duration::from_millis(2999)));
        assert!(notification.is_expired_at(now + NOTIFICATION_TTL));
    }

    #[test]
    fn test_connection_flag() {
        let mut state = AppState::new();
        assert!(!state.is_connected());
        state.set_connection(ConnectionState::Open);
        assert!(state.is_connected());
        state.set_connection(ConnectionState::Disconnected);
        assert!(!state.is_connected());
    }
}
