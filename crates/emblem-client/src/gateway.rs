//! Async WebSocket gateway client.
//!
//! One background task owns the connection: it identifies, heartbeats on a
//! fixed interval, and fans dispatched events out to subscribers over a
//! broadcast channel. Disconnects reconnect with exponential backoff; the
//! platform replays `READY` after every successful identify, so consumers
//! just treat it as another event.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::sync::broadcast;
use tokio::time::{interval, sleep};
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};
use tracing::{debug, error, info, warn};

use crate::error::Result;

const DEFAULT_GATEWAY: &str = "ws://localhost:3001";
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);
const MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Gateway opcodes.
mod op {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const RECONNECT: u8 = 7;
    pub const HEARTBEAT_ACK: u8 = 11;
}

/// A dispatched gateway event.
#[derive(Debug, Clone)]
pub struct GatewayEvent {
    pub event: Option<String>,
    pub data: Value,
}

pub struct GatewayClient {
    token: String,
    url: String,
    sender: broadcast::Sender<GatewayEvent>,
}

impl GatewayClient {
    pub fn new(token: impl Into<String>, url: Option<&str>) -> Self {
        let token = {
            let t = token.into();
            if t.starts_with("Bot ") { t } else { format!("Bot {t}") }
        };
        let (sender, _) = broadcast::channel(256);
        Self {
            token,
            url: url.unwrap_or(DEFAULT_GATEWAY).to_owned(),
            sender,
        }
    }

    /// Subscribe to dispatched events. Subscribe before [`connect`] so
    /// nothing is missed.
    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.sender.subscribe()
    }

    /// Spawn the background connection task and return immediately.
    pub async fn connect(&self) -> Result<()> {
        let token = self.token.clone();
        let url = self.url.clone();
        let tx = self.sender.clone();

        tokio::spawn(async move {
            let mut attempts = 0u32;
            loop {
                match run_session(&token, &url, &tx).await {
                    Ok(()) => {
                        info!("gateway session ended cleanly, reconnecting");
                        attempts = 0;
                    }
                    Err(err) => {
                        attempts += 1;
                        if attempts > MAX_RECONNECT_ATTEMPTS {
                            error!("gateway gave up after {attempts} attempts: {err}");
                            break;
                        }
                        let delay = Duration::from_secs(u64::min(2u64.pow(attempts), 30));
                        warn!("gateway disconnected ({err}), retrying in {delay:?}");
                        sleep(delay).await;
                    }
                }
            }
        });

        Ok(())
    }
}

/// Drive one connection until it closes.
async fn run_session(token: &str, url: &str, tx: &broadcast::Sender<GatewayEvent>) -> Result<()> {
    let (ws, _) = connect_async(url).await?;
    let (mut sink, mut stream) = ws.split();

    let identify = json!({
        "op": op::IDENTIFY,
        "d": { "token": token, "properties": { "$os": "rust" } },
    });
    sink.send(WsMessage::Text(identify.to_string().into())).await?;

    let mut heartbeat = interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await; // first tick completes immediately

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                let beat = json!({ "op": op::HEARTBEAT, "d": Value::Null });
                sink.send(WsMessage::Text(beat.to_string().into())).await?;
            }
            msg = stream.next() => {
                let Some(msg) = msg else { return Ok(()) };
                let text = match msg? {
                    WsMessage::Text(text) => text,
                    WsMessage::Close(_) => return Ok(()),
                    _ => continue,
                };
                let payload: Value = serde_json::from_str(text.as_str())?;
                let op_code = payload["op"].as_u64().unwrap_or(255) as u8;
                match op_code {
                    op::DISPATCH => {
                        let event = payload
                            .get("t")
                            .and_then(Value::as_str)
                            .map(str::to_owned);
                        let data = payload.get("d").cloned().unwrap_or(Value::Null);
                        let _ = tx.send(GatewayEvent { event, data });
                    }
                    op::HEARTBEAT => {
                        let beat = json!({ "op": op::HEARTBEAT, "d": Value::Null });
                        sink.send(WsMessage::Text(beat.to_string().into())).await?;
                    }
                    op::RECONNECT => {
                        info!("gateway asked us to reconnect");
                        return Ok(());
                    }
                    op::HEARTBEAT_ACK => debug!("heartbeat acknowledged"),
                    _ => {}
                }
            }
        }
    }
}
