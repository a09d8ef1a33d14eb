//! Home Assistant WebSocket API, used for the statistics import which REST does not offer.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

use crate::{host::StatisticsSink, prelude::*, statistics::History};

const IMPORT_STATISTICS: &str = "recorder/import_statistics";

pub struct StatisticsImporter {
    url: Url,
    access_token: String,
}

impl StatisticsImporter {
    /// Derive the WebSocket endpoint from the REST API base URL.
    pub fn try_new(base_url: &Url, access_token: impl Into<String>) -> Result<Self> {
        let scheme = match base_url.scheme() {
            "http" | "ws" => "ws",
            "https" | "wss" => "wss",
            other => bail!("unsupported URL scheme `{other}`"),
        };
        let mut url = base_url.clone();
        url.set_scheme(scheme).map_err(|()| anyhow!("failed to switch the scheme to `{scheme}`"))?;
        url.path_segments_mut()
            .map_err(|()| anyhow!("invalid base URL"))?
            .pop_if_empty()
            .push("websocket");
        Ok(Self { url, access_token: access_token.into() })
    }

    #[instrument(skip_all, fields(url = %self.url))]
    async fn connect(&self) -> Result<Session> {
        let (stream, _) = connect_async(self.url.as_str())
            .await
            .with_context(|| format!("failed to connect to `{}`", self.url))?;
        let mut session = Session { stream, next_id: 1 };

        match session.receive().await? {
            Incoming::AuthRequired { ha_version } => debug!(?ha_version, "authenticating…"),
            other => bail!("unexpected handshake message: {other:?}"),
        }
        session.send(&Auth { type_: "auth", access_token: &self.access_token }).await?;
        match session.receive().await? {
            Incoming::AuthOk { .. } => Ok(session),
            Incoming::AuthInvalid { message } => bail!("authentication failed: {message}"),
            other => bail!("unexpected authentication response: {other:?}"),
        }
    }
}

#[async_trait]
impl StatisticsSink for StatisticsImporter {
    #[instrument(skip_all, fields(n_points = history.len()))]
    async fn import(&self, history: &History) -> Result {
        if history.is_empty() {
            debug!("nothing to import");
            return Ok(());
        }
        let mut session = self.connect().await?;
        session
            .call(IMPORT_STATISTICS, history.energy_statistics())
            .await
            .context("failed to import the energy statistics")?;
        session
            .call(IMPORT_STATISTICS, history.cost_statistics())
            .await
            .context("failed to import the cost statistics")?;
        session.close().await;
        info!("imported the statistics");
        Ok(())
    }
}

struct Session {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    next_id: u64,
}

impl Session {
    async fn send(&mut self, message: &impl Serialize) -> Result {
        let text = serde_json::to_string(message)?;
        self.stream.send(Message::Text(text)).await.context("failed to send the message")
    }

    async fn receive(&mut self) -> Result<Incoming> {
        while let Some(message) = self.stream.next().await {
            match message.context("failed to receive a message")? {
                Message::Text(text) => {
                    return serde_json::from_str(&text)
                        .with_context(|| format!("failed to deserialize `{text}`"));
                }
                Message::Close(frame) => bail!("the connection is closed by the server: {frame:?}"),
                _ => {}
            }
        }
        bail!("the connection is closed")
    }

    /// Send the command and wait for its result.
    async fn call(&mut self, type_: &'static str, payload: impl Serialize + Send) -> Result {
        let id = self.next_id;
        self.next_id += 1;
        self.send(&Command { id, type_, payload }).await?;
        loop {
            if let Incoming::Result { id: result_id, success, error } = self.receive().await?
                && result_id == id
            {
                ensure!(success, "`{type_}` failed: {error:?}");
                return Ok(());
            }
        }
    }

    async fn close(mut self) {
        if let Err(error) = self.stream.close(None).await {
            debug!("failed to close the connection: {error:#}");
        }
    }
}

#[derive(Serialize)]
struct Auth<'a> {
    #[serde(rename = "type")]
    type_: &'static str,

    access_token: &'a str,
}

#[derive(Serialize)]
struct Command<P> {
    id: u64,

    #[serde(rename = "type")]
    type_: &'static str,

    #[serde(flatten)]
    payload: P,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Incoming {
    AuthRequired {
        #[serde(default)]
        ha_version: Option<String>,
    },

    AuthOk {
        #[serde(default)]
        ha_version: Option<String>,
    },

    AuthInvalid {
        #[serde(default)]
        message: String,
    },

    Result {
        id: u64,
        success: bool,

        #[serde(default)]
        error: Option<ErrorMessage>,
    },

    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[expect(dead_code)]
struct ErrorMessage {
    code: String,
    message: String,
}
