//! Event connection manager
//!
//! Keeps one WebSocket to the recorder alive for as long as someone is
//! listening for updates. The lifecycle is
//! `Disconnected -> Connecting -> Open -> Disconnected -> ...` with a fixed
//! delay before every new attempt and no retry cap.
//!
//! While a connection is open it owns two timers: the heartbeat (a branch of
//! the connection's own select loop) and the status poller (a spawned task
//! held in a [`ScopedTask`]). Leaving the connection loop on any path drops
//! both, so a reconnect never leaves timers behind.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, info, warn};

use super::message::{ServerEvent, HEARTBEAT};
use super::poller;
use super::{ScopedTask, SyncSettings, SyncUpdate};
use crate::api::RecorderApi;
use crate::error::ClientResult;

/// Outbound half of an event connection
pub type FrameSink = Pin<Box<dyn Sink<Message, Error = tungstenite::Error> + Send>>;

/// Inbound half of an event connection
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Message, tungstenite::Error>> + Send>>;

/// Opens event connections
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self, url: &str) -> ClientResult<(FrameSink, FrameStream)>;
}

/// tokio-tungstenite [`Connector`]
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> ClientResult<(FrameSink, FrameStream)> {
        let (ws_stream, _) = connect_async(url).await?;
        let (write, read) = ws_stream.split();
        Ok((Box::pin(write), Box::pin(read)))
    }
}

/// State of the event connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected; a retry may be pending
    Disconnected,
    /// Attempt in progress
    Connecting,
    /// Connected and receiving pushes
    Open,
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a connection ended without a transport error
enum Ended {
    /// Server closed the connection
    Closed,
    /// Nobody listens for updates anymore
    ConsumerGone,
}

pub(crate) struct ConnectionManager<C, A> {
    connector: C,
    api: Arc<A>,
    settings: SyncSettings,
    updates: mpsc::Sender<SyncUpdate>,
    status: watch::Sender<ConnectionState>,
}

impl<C, A> ConnectionManager<C, A>
where
    C: Connector,
    A: RecorderApi,
{
    pub(crate) fn new(
        connector: C,
        api: Arc<A>,
        settings: SyncSettings,
        updates: mpsc::Sender<SyncUpdate>,
        status: watch::Sender<ConnectionState>,
    ) -> Self {
        Self {
            connector,
            api,
            settings,
            updates,
            status,
        }
    }

    /// Connect, serve, wait, repeat until the update receiver is dropped
    pub(crate) async fn run(self) {
        let url = self.settings.events_url.clone();

        loop {
            let conn_id = uuid::Uuid::new_v4().to_string()[..8].to_string();

            if !self.set_state(ConnectionState::Connecting).await {
                break;
            }
            debug!("[{}] Connecting to {}", conn_id, url);

            match self.connector.connect(&url).await {
                Ok((sink, stream)) => {
                    info!("[{}] Event connection open", conn_id);
                    if !self.set_state(ConnectionState::Open).await {
                        break;
                    }

                    match self.serve(&conn_id, sink, stream).await {
                        Ok(Ended::Closed) => info!("[{}] Event connection closed", conn_id),
                        Ok(Ended::ConsumerGone) => break,
                        Err(e) => warn!("[{}] Event connection error: {}", conn_id, e),
                    }
                }
                Err(e) => warn!("[{}] Could not connect to {}: {}", conn_id, url, e),
            }

            if !self.set_state(ConnectionState::Disconnected).await {
                break;
            }

            debug!("Reconnecting in {:?}", self.settings.reconnect_delay);
            tokio::select! {
                _ = tokio::time::sleep(self.settings.reconnect_delay) => {}
                _ = self.updates.closed() => break,
            }
        }

        self.status.send_replace(ConnectionState::Disconnected);
        debug!("Event connection manager stopped");
    }

    /// Run one open connection until it ends
    async fn serve(
        &self,
        conn_id: &str,
        mut sink: FrameSink,
        mut stream: FrameStream,
    ) -> ClientResult<Ended> {
        let _status_poller = ScopedTask::spawn(poller::poll_status(
            self.api.clone(),
            self.settings.status_poll,
            self.updates.clone(),
        ));

        let period = self.settings.heartbeat;
        let mut heartbeat = interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    debug!("[{}] Sending heartbeat", conn_id);
                    sink.send(Message::Text(HEARTBEAT.to_string())).await?;
                }

                frame = stream.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => {
                            if !self.handle_text(conn_id, &text).await {
                                sink.close().await.ok();
                                return Ok(Ended::ConsumerGone);
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            debug!("[{}] Close frame: {:?}", conn_id, frame);
                            return Ok(Ended::Closed);
                        }
                        None => return Ok(Ended::Closed),
                        Some(Err(e)) => return Err(e.into()),
                        Some(Ok(_)) => {}
                    }
                }

                _ = self.updates.closed() => {
                    sink.close().await.ok();
                    return Ok(Ended::ConsumerGone);
                }
            }
        }
    }

    /// Forward a text frame; returns false once the consumer is gone
    async fn handle_text(&self, conn_id: &str, text: &str) -> bool {
        match ServerEvent::parse(text) {
            Ok(ServerEvent::StatusUpdate(table)) => {
                debug!("[{}] Status update with {} entries", conn_id, table.len());
                self.updates
                    .send(SyncUpdate::StatusPush(table))
                    .await
                    .is_ok()
            }
            Ok(ServerEvent::Other(kind)) => {
                debug!("[{}] Ignoring '{}' message", conn_id, kind);
                true
            }
            Err(e) => {
                warn!("[{}] {}", conn_id, e);
                true
            }
        }
    }

    /// Publish a state change; returns false once the consumer is gone
    async fn set_state(&self, state: ConnectionState) -> bool {
        self.status.send_replace(state);
        self.updates.send(SyncUpdate::Connection(state)).await.is_ok()
    }
}
