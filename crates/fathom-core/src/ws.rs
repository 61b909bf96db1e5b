//! WebSocket tip refresher.
//!
//! Subscribes to `newHeads` and drives the tip cache until the connection
//! fails. The first dial, write, or read failure is parked in the cache and
//! the task exits; the next `latest` call consumes the error and relaunches
//! a fresh refresher.

use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::{
    cache::TipCache,
    codec,
    error::{Error, Result},
    types::{Hash32, Request, JSONRPC_VERSION},
};

/// Handshake budget for the WebSocket dial.
const DIAL_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct Notification {
    #[serde(default)]
    params: Option<NotificationParams>,
}

#[derive(Debug, Deserialize)]
struct NotificationParams {
    #[serde(default)]
    result: Option<NewHead>,
}

#[derive(Debug, Deserialize)]
struct NewHead {
    #[serde(default, with = "codec::hex_u64")]
    number: u64,
    #[serde(default)]
    hash: Hash32,
}

/// Runs the subscription loop, recording any failure in the tip cache.
pub(crate) async fn listen(tip: Arc<TipCache>, ws_url: String) {
    if let Err(err) = run(&tip, &ws_url).await {
        tip.error(err);
    }
}

async fn run(tip: &TipCache, ws_url: &str) -> Result<()> {
    let (ws, _) = tokio::time::timeout(DIAL_TIMEOUT, connect_async(ws_url))
        .await
        .map_err(|_| Error::Ws(format!("ws dial {ws_url:?}: handshake timed out")))?
        .map_err(|e| Error::Ws(format!("ws dial {ws_url:?}: {e}")))?;
    let (mut write, mut read) = ws.split();

    let subscribe = Request {
        id: "1".to_string(),
        jsonrpc: JSONRPC_VERSION,
        method: "eth_subscribe",
        params: serde_json::json!(["newHeads"]),
    };
    let text = serde_json::to_string(&subscribe).map_err(Error::Encode)?;
    write
        .send(Message::Text(text.into()))
        .await
        .map_err(|e| Error::Ws(format!("ws write {ws_url:?}: {e}")))?;

    loop {
        let msg = read
            .next()
            .await
            .ok_or_else(|| Error::Ws(format!("ws read {ws_url:?}: stream ended")))?
            .map_err(|e| Error::Ws(format!("ws read {ws_url:?}: {e}")))?;
        match msg {
            Message::Text(text) => {
                let note: Notification = serde_json::from_str(text.as_str())
                    .map_err(|e| Error::Ws(format!("ws decode {ws_url:?}: {e}")))?;
                // Subscription confirmations carry no params and are skipped.
                if let Some(head) = note.params.and_then(|p| p.result) {
                    tracing::debug!(n = head.number, h = %head.hash.short(), "websocket newHeads");
                    tip.update(head.number, head.hash);
                }
            }
            Message::Close(_) => {
                return Err(Error::Ws(format!("ws read {ws_url:?}: connection closed")));
            }
            _ => {}
        }
    }
}
