//! Data models exchanged with the recorder
//!
//! The recorder's JSON is loosely typed (fields go missing, `null` shows up
//! where a string is expected, ids are sometimes numbers), so most types here
//! decode leniently and fall back to defaults instead of failing the whole
//! response.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::FieldError;

/// Platform preselected in the user editor when the platform list is unknown
pub const DEFAULT_PLATFORM: &str = "Bilibili";

/// Default polling interval for a tracked streamer, in seconds
pub const DEFAULT_USER_INTERVAL: u64 = 10;

/// Default output directory on the recorder
pub const DEFAULT_OUTPUT_DIR: &str = "output";

/// Recording status table, keyed by [`status_key`]
pub type StatusTable = BTreeMap<String, StatusRecord>;

/// Composite key of the status table: `{platform}_{id}`
pub fn status_key(platform: &str, id: &str) -> String {
    format!("{}_{}", platform, id)
}

/// A tracked streamer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    pub platform: String,
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default = "default_interval", deserialize_with = "interval_or_default")]
    pub interval: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub format: String,
    /// Per-user output directory override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Per-user proxy override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    /// Anything else the recorder understands (headers, cookies, ...)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserConfig {
    pub fn new(platform: impl Into<String>, id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Key of this user in the status table
    pub fn status_key(&self) -> String {
        status_key(&self.platform, &self.id)
    }

    /// Set a field by name, as typed by the operator
    ///
    /// `output` and `proxy` are cleared by an empty value or `none`.
    pub fn set_field(&mut self, field: &str, value: &str) -> Result<(), FieldError> {
        let value = value.trim();
        match field {
            "platform" => self.platform = value.to_string(),
            "id" => self.id = value.to_string(),
            "name" => self.name = value.to_string(),
            "format" => self.format = value.to_string(),
            "interval" => {
                self.interval = value.parse().map_err(|_| FieldError::Invalid {
                    field: field.to_string(),
                    value: value.to_string(),
                })?;
            }
            "output" => self.output = optional(value),
            "proxy" => self.proxy = optional(value),
            other => return Err(FieldError::Unknown(other.to_string())),
        }
        Ok(())
    }

    /// Name for display, falling back to the room id
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            platform: DEFAULT_PLATFORM.to_string(),
            id: String::new(),
            name: String::new(),
            interval: DEFAULT_USER_INTERVAL,
            format: String::new(),
            output: None,
            proxy: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Recorder-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default)]
    pub proxy: Option<String>,
    #[serde(default = "default_output", deserialize_with = "output_or_default")]
    pub output: String,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            proxy: None,
            output: default_output(),
        }
    }
}

/// The recorder's configuration as served by `GET /api/config`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default, deserialize_with = "null_as_default")]
    pub global: GlobalConfig,
    #[serde(default, deserialize_with = "null_as_default")]
    pub users: Vec<UserConfig>,
}

/// Body of `POST /api/config`: global fields at top level, users under `user`
#[derive(Debug, Serialize)]
pub struct SaveConfigPayload<'a> {
    #[serde(flatten)]
    pub global: &'a GlobalConfig,
    pub user: &'a [UserConfig],
}

impl RemoteConfig {
    pub fn save_payload(&self) -> SaveConfigPayload<'_> {
        SaveConfigPayload {
            global: &self.global,
            user: &self.users,
        }
    }
}

/// Recording state of one streamer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingStatus {
    Recording,
    Online,
    Stopped,
    Offline,
    /// Anything the recorder reports that we don't know about
    #[serde(other)]
    Unknown,
}

impl RecordingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordingStatus::Recording => "recording",
            RecordingStatus::Online => "online",
            RecordingStatus::Stopped => "stopped",
            RecordingStatus::Offline => "offline",
            RecordingStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the status table
///
/// Push updates carry `platform`/`user_id`/`status`; the REST snapshot only
/// carries `url`/`recording`. Both shapes decode into this type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RecordingStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording: Option<bool>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub info: serde_json::Value,
}

impl StatusRecord {
    /// A record written locally, ahead of server confirmation
    pub fn optimistic(user: &UserConfig, status: RecordingStatus) -> Self {
        Self {
            platform: Some(user.platform.clone()),
            user_id: Some(user.id.clone()),
            status: Some(status),
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
            ..Self::default()
        }
    }

    pub fn is(&self, status: RecordingStatus) -> bool {
        self.status == Some(status)
    }
}

/// Visual class of a user row, mirroring the recorder web page's CSS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Recording,
    Online,
    Offline,
}

impl StatusClass {
    pub fn css_class(&self) -> &'static str {
        match self {
            StatusClass::Recording => "status-recording recording-pulse",
            StatusClass::Online => "status-online",
            StatusClass::Offline => "status-offline",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            StatusClass::Recording => "recording",
            StatusClass::Online => "online",
            StatusClass::Offline => "offline",
        }
    }
}

/// `GET /api/status`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub recording: StatusTable,
    #[serde(default)]
    pub recording_count: Option<u64>,
    #[serde(default)]
    pub tasks: Option<u64>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// A recorded file on the recorder host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub size_mb: f64,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
}

/// `GET /api/files`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileListing {
    #[serde(default, deserialize_with = "null_as_default")]
    pub files: Vec<FileEntry>,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub total_size_mb: f64,
    #[serde(default)]
    pub output_dir: Option<String>,
}

/// `GET /api/logs`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogTail {
    #[serde(default, deserialize_with = "null_as_default")]
    pub logs: Vec<String>,
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub total_lines: Option<u64>,
}

/// `GET /api/platforms`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformList {
    #[serde(default, deserialize_with = "null_as_default")]
    pub platforms: Vec<String>,
}

/// Reply to config saves and start/stop commands
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandReply {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Render an ISO timestamp as `YYYY-MM-DD HH:MM:SS` in local time
///
/// The recorder emits naive local timestamps; optimistic records use RFC 3339.
/// Anything else is returned unchanged.
pub fn format_timestamp(iso: &str) -> String {
    const OUT: &str = "%Y-%m-%d %H:%M:%S";

    if let Ok(dt) = DateTime::parse_from_rfc3339(iso) {
        return dt.with_timezone(&Local).format(OUT).to_string();
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(iso, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.format(OUT).to_string();
    }
    iso.to_string()
}

/// Format a size in megabytes the way the recorder page does
pub fn format_size_mb(mb: f64) -> String {
    format!("{} MB", mb)
}

fn optional(value: &str) -> Option<String> {
    if value.is_empty() || value == "none" {
        None
    } else {
        Some(value.to_string())
    }
}

fn default_interval() -> u64 {
    DEFAULT_USER_INTERVAL
}

fn default_output() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn interval_or_default<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(DEFAULT_USER_INTERVAL))
}

fn output_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(default_output))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Id::deserialize(deserializer)? {
        Id::Text(s) => s,
        Id::Number(n) => n.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_key() {
        assert_eq!(status_key("Bilibili", "123"), "Bilibili_123");
        let user = UserConfig::new("Douyu", "9999", "A");
        assert_eq!(user.status_key(), "Douyu_9999");
    }

    #[test]
    fn test_user_config_lenient_decode() {
        let user: UserConfig = serde_json::from_value(json!({
            "platform": "Bilibili",
            "id": 21452505,
            "name": null,
            "cookies": "SESSDATA=abc",
            "headers": {"User-Agent": "Chrome"}
        }))
        .unwrap();

        assert_eq!(user.id, "21452505");
        assert_eq!(user.name, "");
        assert_eq!(user.display_name(), "21452505");
        assert_eq!(user.interval, DEFAULT_USER_INTERVAL);
        assert_eq!(user.format, "");
        assert_eq!(user.extra.get("cookies"), Some(&json!("SESSDATA=abc")));
    }

    #[test]
    fn test_user_config_keeps_unknown_fields_on_save() {
        let raw = json!({
            "platform": "Youtube",
            "id": "UCxyz",
            "name": "Y",
            "interval": 30,
            "format": "mp4",
            "crypto_js_url": "https://cdn.example/crypto.js"
        });
        let user: UserConfig = serde_json::from_value(raw).unwrap();
        let back = serde_json::to_value(&user).unwrap();

        assert_eq!(back["crypto_js_url"], "https://cdn.example/crypto.js");
        assert_eq!(back["interval"], 30);
        assert!(back.get("output").is_none());
    }

    #[test]
    fn test_set_field() {
        let mut user = UserConfig::new("Bilibili", "1", "a");
        user.set_field("name", " Streamer ").unwrap();
        user.set_field("interval", "30").unwrap();
        user.set_field("proxy", "http://127.0.0.1:7890").unwrap();
        assert_eq!(user.name, "Streamer");
        assert_eq!(user.interval, 30);
        assert_eq!(user.proxy.as_deref(), Some("http://127.0.0.1:7890"));

        user.set_field("proxy", "none").unwrap();
        assert!(user.proxy.is_none());

        assert!(matches!(
            user.set_field("interval", "soon"),
            Err(FieldError::Invalid { .. })
        ));
        assert_eq!(
            user.set_field("color", "red"),
            Err(FieldError::Unknown("color".to_string()))
        );
        assert_eq!(user.interval, 30);
    }

    #[test]
    fn test_remote_config_defaults() {
        let config: RemoteConfig = serde_json::from_value(json!({
            "global": null,
            "users": null
        }))
        .unwrap();
        assert_eq!(config.global.output, "output");
        assert!(config.global.proxy.is_none());
        assert!(config.users.is_empty());

        let config: RemoteConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, RemoteConfig::default());
    }

    #[test]
    fn test_save_payload_shape() {
        let config = RemoteConfig {
            global: GlobalConfig {
                proxy: Some("socks5://127.0.0.1:1080".to_string()),
                output: "recordings".to_string(),
            },
            users: vec![UserConfig::new("Bilibili", "123", "A")],
        };

        let body = serde_json::to_value(config.save_payload()).unwrap();
        assert_eq!(body["proxy"], "socks5://127.0.0.1:1080");
        assert_eq!(body["output"], "recordings");
        assert_eq!(body["user"][0]["id"], "123");
        assert!(body.get("global").is_none());
        assert!(body.get("users").is_none());
    }

    #[test]
    fn test_recording_status_unknown_value() {
        let record: StatusRecord = serde_json::from_value(json!({
            "platform": "Huya",
            "user_id": "1",
            "status": "transcoding"
        }))
        .unwrap();
        assert_eq!(record.status, Some(RecordingStatus::Unknown));
        assert!(!record.is(RecordingStatus::Recording));
    }

    #[test]
    fn test_status_snapshot_rest_shape() {
        let snapshot: StatusSnapshot = serde_json::from_value(json!({
            "recording": {
                "https://live.bilibili.com/123": {
                    "url": "https://live.bilibili.com/123",
                    "recording": true,
                    "timestamp": "2024-05-01T12:30:45.123456"
                }
            },
            "recording_count": 1,
            "tasks": 0,
            "timestamp": "2024-05-01T12:30:45.123456"
        }))
        .unwrap();

        assert_eq!(snapshot.recording_count, Some(1));
        let record = &snapshot.recording["https://live.bilibili.com/123"];
        assert_eq!(record.recording, Some(true));
        assert!(record.status.is_none());
    }

    #[test]
    fn test_optimistic_record() {
        let user = UserConfig::new("Bilibili", "123", "A");
        let record = StatusRecord::optimistic(&user, RecordingStatus::Recording);
        assert_eq!(record.platform.as_deref(), Some("Bilibili"));
        assert_eq!(record.user_id.as_deref(), Some("123"));
        assert!(record.is(RecordingStatus::Recording));
        assert!(record.timestamp.is_some());
    }

    #[test]
    fn test_status_class_names() {
        assert_eq!(
            StatusClass::Recording.css_class(),
            "status-recording recording-pulse"
        );
        assert_eq!(StatusClass::Online.css_class(), "status-online");
        assert_eq!(StatusClass::Offline.css_class(), "status-offline");
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(
            format_timestamp("2024-05-01T12:30:45.123456"),
            "2024-05-01 12:30:45"
        );
        assert_eq!(format_timestamp("2024-05-01T12:30:45"), "2024-05-01 12:30:45");
        assert_eq!(format_timestamp("yesterday"), "yesterday");

        let rfc = "2024-05-01T12:30:45+00:00";
        let expected = DateTime::parse_from_rfc3339(rfc)
            .unwrap()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        assert_eq!(format_timestamp(rfc), expected);
    }

    #[test]
    fn test_format_size_mb() {
        assert_eq!(format_size_mb(0.0), "0 MB");
        assert_eq!(format_size_mb(12.5), "12.5 MB");
    }
}
