//! recdash Core Library
//!
//! This crate provides the client side of recdash, a dashboard for a
//! live-stream recording manager: it tracks which streamers are being
//! recorded, starts and stops recordings, and tails the recorder's files and
//! logs.
//!
//! # Architecture
//!
//! - **Controller**: owns the [`AppState`]; every mutation goes through it
//! - **Sync tasks**: event connection with reconnect and heartbeat, status
//!   poller, file/log refresher. They report through [`SyncUpdate`] values
//!   and never touch the state directly
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let api = Arc::new(HttpApi::new(&config.server_url, config.request_timeout())?);
//! let mut controller = Controller::new(api.clone(), config.log_lines);
//! controller.bootstrap().await;
//!
//! let mut sync = spawn_sync(api, WsConnector, SyncSettings::from_config(&config)?);
//! while let Some(update) = sync.recv().await {
//!     controller.apply(update);
//! }
//! ```
//!
//! # Modules
//!
//! - `api`: REST client for the recorder
//! - `models`: Data exchanged with the recorder
//! - `state`: Application state and derived stats
//! - `controller`: Actions and update routing
//! - `sync`: Event connection and pollers
//! - `config`: Client configuration

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod models;
pub mod state;
pub mod sync;

#[cfg(test)]
mod test_support;

pub use api::{HttpApi, RecorderApi};
pub use config::Config;
pub use controller::Controller;
pub use error::{ClientError, ClientResult, FieldError};
pub use models::{
    FileEntry, GlobalConfig, RecordingStatus, RemoteConfig, StatusClass, StatusRecord,
    StatusTable, UserConfig,
};
pub use state::{AppState, Notification, NotificationKind, Stats};
pub use sync::{spawn_sync, ConnectionState, SyncHandle, SyncSettings, SyncUpdate, WsConnector};
