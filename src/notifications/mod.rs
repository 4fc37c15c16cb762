//! Live notification relay.
//!
//! The server side is a broadcast hub fed by the event processor and a
//! `/ws` endpoint that forwards every hub message to its socket. Delivery is
//! at-most-once: nothing is stored, and a socket that is not connected when a
//! message is published never sees it. [`client`] holds the consuming side.

pub mod client;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

use crate::AppState;

pub const CONNECTED_MESSAGE: &str = "Connected to budget admin notifications";

/// Payload of a status change message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub id: i32,
    pub status: String,
    #[serde(default)]
    pub previous_status: Option<String>,
    pub changed_at: DateTime<Utc>,
}

/// Socket protocol. Every frame is a JSON object tagged by `type`; types this
/// build does not know decode as [`SocketMessage::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SocketMessage {
    Connected { message: String },
    InvoiceStatusChange { data: StatusChange },
    OcStatusChange { data: StatusChange },
    #[serde(other)]
    Unknown,
}

/// One writer, many socket readers.
#[derive(Debug, Clone)]
pub struct NotificationHub {
    sender: broadcast::Sender<SocketMessage>,
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes to every current subscriber and returns how many there were.
    pub fn publish(&self, message: SocketMessage) -> usize {
        match self.sender.send(message) {
            Ok(receivers) => receivers,
            Err(_) => {
                debug!("No connected sockets; notification dropped");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SocketMessage> {
        self.sender.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    let rx = state.hub.subscribe();
    ws.on_upgrade(move |socket| relay_socket(socket, rx))
}

async fn relay_socket(socket: WebSocket, mut rx: broadcast::Receiver<SocketMessage>) {
    let (mut sink, mut stream) = socket.split();

    let greeting = SocketMessage::Connected {
        message: CONNECTED_MESSAGE.to_string(),
    };
    if send_json(&mut sink, &greeting).await.is_err() {
        return;
    }
    info!("Notification socket connected");

    loop {
        tokio::select! {
            received = rx.recv() => match received {
                Ok(message) => {
                    if send_json(&mut sink, &message).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Notification socket lagged; messages skipped");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(error = %e, "Notification socket read failed");
                    break;
                }
            },
        }
    }

    info!("Notification socket disconnected");
}

async fn send_json<S>(sink: &mut S, message: &SocketMessage) -> Result<(), ()>
where
    S: futures::Sink<Message> + Unpin,
{
    let text = match serde_json::to_string(message) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Failed to encode socket message");
            return Ok(());
        }
    };
    sink.send(Message::Text(text)).await.map_err(|_| ())
}
