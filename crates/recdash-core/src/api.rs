//! REST client for the recorder web API
//!
//! [`RecorderApi`] is the seam the controller and the background pollers are
//! written against; [`HttpApi`] is the reqwest implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ClientError, ClientResult};
use crate::models::{
    CommandReply, FileListing, LogTail, PlatformList, RemoteConfig, StatusSnapshot,
};

/// Path of the event connection on the recorder host
pub const EVENTS_PATH: &str = "/ws";

/// Operations offered by the recorder web API
#[async_trait]
pub trait RecorderApi: Send + Sync + 'static {
    /// `GET /api/status`
    async fn status(&self) -> ClientResult<StatusSnapshot>;
    /// `GET /api/config`
    async fn config(&self) -> ClientResult<RemoteConfig>;
    /// `POST /api/config`
    async fn save_config(&self, config: &RemoteConfig) -> ClientResult<CommandReply>;
    /// `GET /api/platforms`
    async fn platforms(&self) -> ClientResult<PlatformList>;
    /// `GET /api/files`
    async fn files(&self) -> ClientResult<FileListing>;
    /// `GET /api/logs?lines=N`
    async fn logs(&self, lines: usize) -> ClientResult<LogTail>;
    /// `POST /api/start_recording/{platform}/{id}`
    async fn start_recording(&self, platform: &str, id: &str) -> ClientResult<CommandReply>;
    /// `POST /api/stop_recording/{platform}/{id}`
    async fn stop_recording(&self, platform: &str, id: &str) -> ClientResult<CommandReply>;
}

/// reqwest-backed [`RecorderApi`]
#[derive(Debug, Clone)]
pub struct HttpApi {
    base: Url,
    client: Client,
}

impl HttpApi {
    /// Create a client for the recorder at `server_url` (http or https)
    pub fn new(server_url: &str, timeout: Duration) -> ClientResult<Self> {
        let base = parse_server_url(server_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("recdash/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ClientError::InvalidUrl {
                url: server_url.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { base, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// URL of the event connection
    pub fn events_url(&self) -> ClientResult<Url> {
        events_url(self.base.as_str())
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        endpoint_url(&self.base, segments)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &Url,
    ) -> ClientResult<T> {
        let path = endpoint.path().to_string();
        debug!("Requesting {}", endpoint);

        let response = request.send().await.map_err(|source| ClientError::Http {
            endpoint: path.clone(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                endpoint: path,
                status: status.as_u16(),
                message: error_detail(&body),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|source| ClientError::Decode {
                endpoint: path,
                source,
            })
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        let url = self.endpoint(segments);
        self.send(self.client.request(Method::GET, url.clone()), &url)
            .await
    }

    async fn post_empty<T: DeserializeOwned>(&self, segments: &[&str]) -> ClientResult<T> {
        let url = self.endpoint(segments);
        self.send(self.client.request(Method::POST, url.clone()), &url)
            .await
    }
}

#[async_trait]
impl RecorderApi for HttpApi {
    async fn status(&self) -> ClientResult<StatusSnapshot> {
        self.get(&["api", "status"]).await
    }

    async fn config(&self) -> ClientResult<RemoteConfig> {
        self.get(&["api", "config"]).await
    }

    async fn save_config(&self, config: &RemoteConfig) -> ClientResult<CommandReply> {
        let url = self.endpoint(&["api", "config"]);
        let request = self.client.post(url.clone()).json(&config.save_payload());
        self.send(request, &url).await
    }

    async fn platforms(&self) -> ClientResult<PlatformList> {
        self.get(&["api", "platforms"]).await
    }

    async fn files(&self) -> ClientResult<FileListing> {
        self.get(&["api", "files"]).await
    }

    async fn logs(&self, lines: usize) -> ClientResult<LogTail> {
        let url = self.endpoint(&["api", "logs"]);
        let request = self.client.get(url.clone()).query(&[("lines", lines)]);
        self.send(request, &url).await
    }

    async fn start_recording(&self, platform: &str, id: &str) -> ClientResult<CommandReply> {
        self.post_empty(&["api", "start_recording", platform, id])
            .await
    }

    async fn stop_recording(&self, platform: &str, id: &str) -> ClientResult<CommandReply> {
        self.post_empty(&["api", "stop_recording", platform, id])
            .await
    }
}

/// Parse and validate the recorder base URL
pub fn parse_server_url(server_url: &str) -> ClientResult<Url> {
    let url = Url::parse(server_url).map_err(|e| ClientError::InvalidUrl {
        url: server_url.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClientError::InvalidUrl {
            url: server_url.to_string(),
            reason: format!("unsupported scheme '{}', expected http or https", other),
        }),
    }
}

/// Derive the event connection URL from the recorder base URL
///
/// Same host and port, `http` becomes `ws` and `https` becomes `wss`, path is
/// always `/ws`.
pub fn events_url(server_url: &str) -> ClientResult<Url> {
    let mut url = parse_server_url(server_url)?;
    let scheme = if url.scheme() == "https" { "wss" } else { "ws" };

    url.set_scheme(scheme).map_err(|_| ClientError::InvalidUrl {
        url: server_url.to_string(),
        reason: format!("cannot switch scheme to {}", scheme),
    })?;
    url.set_path(EVENTS_PATH);
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Build an API URL at the root of the recorder host, percent-encoding segments
fn endpoint_url(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    if let Ok(mut path) = url.path_segments_mut() {
        path.clear().extend(segments);
    }
    url
}

/// Pull FastAPI's `detail` out of an error body, else return the body itself
fn error_detail(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").map(|d| match d.as_str() {
            Some(s) => s.to_string(),
            None => d.to_string(),
        }))
        .unwrap_or_else(|| body.trim().to_string())
}
