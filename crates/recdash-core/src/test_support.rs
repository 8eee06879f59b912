//! In-memory stand-ins for the recorder, shared by unit tests

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{sink, stream, StreamExt};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::api::RecorderApi;
use crate::error::{ClientError, ClientResult};
use crate::models::{
    CommandReply, FileListing, LogTail, PlatformList, RemoteConfig, StatusSnapshot,
};
use crate::sync::{Connector, FrameSink, FrameStream};

type Frame = Result<Message, tungstenite::Error>;

/// Recorder API double that records calls and fails on request
#[derive(Default)]
pub(crate) struct MockApi {
    calls: Mutex<Vec<String>>,
    failing: HashSet<&'static str>,
    log_lines: Mutex<Option<usize>>,
    pub config: Mutex<RemoteConfig>,
    pub saved: Mutex<Option<RemoteConfig>>,
    pub snapshot: Mutex<StatusSnapshot>,
    pub files: Mutex<FileListing>,
    pub platforms: Mutex<Vec<String>>,
}

impl MockApi {
    pub(crate) fn failing(ops: &[&'static str]) -> Self {
        Self {
            failing: ops.iter().copied().collect(),
            ..Self::default()
        }
    }

    pub(crate) fn count(&self, op: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.as_str() == op)
            .count()
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn last_log_lines(&self) -> Option<usize> {
        *self.log_lines.lock().unwrap()
    }

    fn call(&self, op: &'static str) -> ClientResult<()> {
        self.calls.lock().unwrap().push(op.to_string());
        if self.failing.contains(op) {
            return Err(ClientError::Status {
                endpoint: format!("/api/{}", op),
                status: 500,
                message: "recorder exploded".to_string(),
            });
        }
        Ok(())
    }

    fn reply(message: &str) -> CommandReply {
        CommandReply {
            status: Some("success".to_string()),
            message: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl RecorderApi for MockApi {
    async fn status(&self) -> ClientResult<StatusSnapshot> {
        self.call("status")?;
        Ok(self.snapshot.lock().unwrap().clone())
    }

    async fn config(&self) -> ClientResult<RemoteConfig> {
        self.call("config")?;
        Ok(self.config.lock().unwrap().clone())
    }

    async fn save_config(&self, config: &RemoteConfig) -> ClientResult<CommandReply> {
        self.call("save_config")?;
        *self.saved.lock().unwrap() = Some(config.clone());
        Ok(Self::reply("saved"))
    }

    async fn platforms(&self) -> ClientResult<PlatformList> {
        self.call("platforms")?;
        Ok(PlatformList {
            platforms: self.platforms.lock().unwrap().clone(),
        })
    }

    async fn files(&self) -> ClientResult<FileListing> {
        self.call("files")?;
        Ok(self.files.lock().unwrap().clone())
    }

    async fn logs(&self, lines: usize) -> ClientResult<LogTail> {
        self.call("logs")?;
        *self.log_lines.lock().unwrap() = Some(lines);
        Ok(LogTail {
            logs: vec!["recorder started".to_string()],
            file: Some("logs/recorder.log".to_string()),
            total_lines: Some(1),
        })
    }

    async fn start_recording(&self, _platform: &str, _id: &str) -> ClientResult<CommandReply> {
        self.call("start")?;
        Ok(Self::reply("started"))
    }

    async fn stop_recording(&self, _platform: &str, _id: &str) -> ClientResult<CommandReply> {
        self.call("stop")?;
        Ok(Self::reply("stopped"))
    }
}

/// What one connection attempt does
#[derive(Debug, Clone)]
pub(crate) enum Script {
    /// Connect fails
    Fail,
    /// Connect succeeds, server sends nothing and never closes
    StayOpen,
    /// Connect succeeds, server closes after the delay
    CloseAfter(Duration),
    /// Connect succeeds, server sends these frames and then stays quiet
    Frames(Vec<Message>),
}

/// Connector that plays one [`Script`] per attempt, repeating the last one
pub(crate) struct ScriptedConnector {
    scripts: Vec<Script>,
    attempts: Arc<Mutex<Vec<Instant>>>,
    sent: Arc<Mutex<Vec<Message>>>,
}

impl ScriptedConnector {
    pub(crate) fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts,
            attempts: Arc::default(),
            sent: Arc::default(),
        }
    }

    /// When each connect call happened
    pub(crate) fn attempts(&self) -> Arc<Mutex<Vec<Instant>>> {
        self.attempts.clone()
    }

    /// Every frame written to any connection
    pub(crate) fn sent(&self) -> Arc<Mutex<Vec<Message>>> {
        self.sent.clone()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(&self, _url: &str) -> ClientResult<(FrameSink, FrameStream)> {
        let script = {
            let mut attempts = self.attempts.lock().unwrap();
            attempts.push(Instant::now());
            let index = (attempts.len() - 1).min(self.scripts.len().saturating_sub(1));
            self.scripts.get(index).cloned().unwrap_or(Script::Fail)
        };

        let stream: FrameStream = match script {
            Script::Fail => return Err(tungstenite::Error::ConnectionClosed.into()),
            Script::StayOpen => Box::pin(stream::pending::<Frame>()),
            Script::CloseAfter(delay) => Box::pin(stream::once(async move {
                tokio::time::sleep(delay).await;
                Ok::<_, tungstenite::Error>(Message::Close(None))
            })),
            Script::Frames(frames) => {
                let frames = frames.into_iter().map(Ok::<_, tungstenite::Error>);
                Box::pin(stream::iter(frames).chain(stream::pending::<Frame>()))
            }
        };

        let sent = self.sent.clone();
        let sink: FrameSink = Box::pin(sink::unfold((), move |(), frame: Message| {
            let sent = sent.clone();
            async move {
                sent.lock().unwrap().push(frame);
                Ok::<_, tungstenite::Error>(())
            }
        }));

        Ok((sink, stream))
    }
}
