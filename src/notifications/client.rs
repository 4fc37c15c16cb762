//! Reconnecting consumer of the `/ws` notification channel.
//!
//! The client never merges payloads. A status message only marks the
//! matching collection stale through a [`CacheInvalidator`], and the owner
//! refetches.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::StreamExt;
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use super::SocketMessage;

/// Collections a client keeps cached views of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityCollection {
    Invoices,
    PurchaseOrders,
}

impl EntityCollection {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityCollection::Invoices => "invoices",
            EntityCollection::PurchaseOrders => "purchase_orders",
        }
    }
}

impl fmt::Display for EntityCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sink told which collection went stale.
pub trait CacheInvalidator: Send + Sync {
    fn invalidate(&self, collection: EntityCollection);
}

impl<T: CacheInvalidator + ?Sized> CacheInvalidator for Arc<T> {
    fn invalidate(&self, collection: EntityCollection) {
        (**self).invalidate(collection)
    }
}

/// Stale-marker cache: counts invalidations per collection until the owner
/// refetches and calls [`ViewCache::mark_fresh`].
#[derive(Debug, Default)]
pub struct ViewCache {
    stale: DashMap<EntityCollection, u64>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_stale(&self, collection: EntityCollection) -> bool {
        self.stale.contains_key(&collection)
    }

    /// Invalidations seen since the last refetch
    pub fn pending(&self, collection: EntityCollection) -> u64 {
        self.stale.get(&collection).map(|n| *n).unwrap_or(0)
    }

    pub fn mark_fresh(&self, collection: EntityCollection) {
        self.stale.remove(&collection);
    }
}

impl CacheInvalidator for ViewCache {
    fn invalidate(&self, collection: EntityCollection) {
        *self.stale.entry(collection).or_insert(0) += 1;
    }
}

/// Decodes one text frame and applies it to `sink`. Returns the collection
/// that was invalidated, if any.
pub fn apply_message(text: &str, sink: &dyn CacheInvalidator) -> Option<EntityCollection> {
    let message: SocketMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            warn!(error = %e, "Ignoring malformed notification");
            return None;
        }
    };

    let collection = match message {
        SocketMessage::Connected { message } => {
            info!(%message, "Notification channel ready");
            return None;
        }
        SocketMessage::InvoiceStatusChange { data } => {
            debug!(id = data.id, status = %data.status, "Invoice status changed");
            EntityCollection::Invoices
        }
        SocketMessage::OcStatusChange { data } => {
            debug!(id = data.id, status = %data.status, "Purchase order status changed");
            EntityCollection::PurchaseOrders
        }
        SocketMessage::Unknown => {
            warn!("Ignoring notification of unknown type");
            return None;
        }
    };

    sink.invalidate(collection);
    Some(collection)
}

/// Fixed-delay reconnect policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            delay: Duration::from_secs(3),
        }
    }
}

/// Why [`NotificationClient::run`] returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientExit {
    Shutdown,
    GaveUp { retries: u32, connect_attempts: u32 },
}

/// Stops a running client.
#[derive(Debug)]
pub struct ShutdownHandle {
    tx: watch::Sender<bool>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

enum SessionEnd {
    Shutdown,
    /// Text frames received before the socket went away
    Disconnected { frames: u64 },
}

pub struct NotificationClient<C: CacheInvalidator> {
    url: String,
    policy: ReconnectPolicy,
    sink: C,
    shutdown: watch::Receiver<bool>,
}

impl<C: CacheInvalidator> NotificationClient<C> {
    pub fn new(url: impl Into<String>, policy: ReconnectPolicy, sink: C) -> (Self, ShutdownHandle) {
        let (tx, rx) = watch::channel(false);
        let client = Self {
            url: url.into(),
            policy,
            sink,
            shutdown: rx,
        };
        (client, ShutdownHandle { tx })
    }

    /// Keeps one connection open until shutdown, reconnecting after a fixed
    /// delay. The retry count resets only after a session that delivered at
    /// least one text frame, so a server that completes the handshake and
    /// hangs up straight away still counts against `max_retries`. Once
    /// `max_retries` consecutive reconnects go nowhere the client gives up.
    pub async fn run(mut self) -> ClientExit {
        let mut retries = 0u32;
        let mut connect_attempts = 0u32;

        loop {
            connect_attempts += 1;
            match connect_async(self.url.as_str()).await {
                Ok((stream, _)) => {
                    info!(url = %self.url, "Connected to notification channel");
                    match self.session(stream).await {
                        SessionEnd::Shutdown => return ClientExit::Shutdown,
                        SessionEnd::Disconnected { frames } => {
                            warn!(url = %self.url, frames, "Notification channel disconnected");
                            if frames > 0 {
                                retries = 0;
                            }
                        }
                    }
                }
                Err(e) => {
                    warn!(url = %self.url, attempt = connect_attempts, error = %e, "Connection failed");
                }
            }

            if retries >= self.policy.max_retries {
                error!(
                    url = %self.url,
                    retries,
                    "Giving up on notification channel"
                );
                return ClientExit::GaveUp {
                    retries,
                    connect_attempts,
                };
            }
            retries += 1;

            tokio::select! {
                _ = tokio::time::sleep(self.policy.delay) => {}
                _ = shutdown_requested(&mut self.shutdown) => return ClientExit::Shutdown,
            }
        }
    }

    async fn session<S>(&mut self, mut stream: S) -> SessionEnd
    where
        S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
    {
        let mut frames = 0u64;
        loop {
            tokio::select! {
                frame = stream.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        frames += 1;
                        apply_message(text.as_str(), &self.sink);
                    }
                    Some(Ok(Message::Close(_))) | None => return SessionEnd::Disconnected { frames },
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, "Notification read failed");
                        return SessionEnd::Disconnected { frames };
                    }
                },
                _ = shutdown_requested(&mut self.shutdown) => return SessionEnd::Shutdown,
            }
        }
    }
}

/// Resolves once shutdown was requested. A dropped handle never resolves.
async fn shutdown_requested(rx: &mut watch::Receiver<bool>) {
    let requested = rx.wait_for(|stop| *stop).await.is_ok();
    if !requested {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_messages_invalidate_their_collection() {
        let cache = ViewCache::new();
        let invoice = r#"{"type":"invoice_status_change","data":{"id":1,"status":"PAID","previousStatus":"AWAITING_PAYMENT","changedAt":"2025-01-01T00:00:00Z"}}"#;
        let oc = r#"{"type":"oc_status_change","data":{"id":2,"status":"APPROVED","changedAt":"2025-01-01T00:00:00Z"}}"#;

        assert_eq!(apply_message(invoice, &cache), Some(EntityCollection::Invoices));
        assert_eq!(apply_message(invoice, &cache), Some(EntityCollection::Invoices));
        assert_eq!(apply_message(oc, &cache), Some(EntityCollection::PurchaseOrders));

        assert_eq!(cache.pending(EntityCollection::Invoices), 2);
        assert!(cache.is_stale(EntityCollection::PurchaseOrders));

        cache.mark_fresh(EntityCollection::Invoices);
        assert!(!cache.is_stale(EntityCollection::Invoices));
    }

    #[test]
    fn unknown_connected_and_garbage_frames_touch_nothing() {
        let cache = ViewCache::new();
        assert_eq!(apply_message(r#"{"type":"connected","message":"hi"}"#, &cache), None);
        assert_eq!(apply_message(r#"{"type":"budget_locked","data":{}}"#, &cache), None);
        assert_eq!(apply_message("not json", &cache), None);
        assert!(!cache.is_stale(EntityCollection::Invoices));
        assert!(!cache.is_stale(EntityCollection::PurchaseOrders));
    }

    #[test]
    fn default_policy_is_five_retries_three_seconds_apart() {
        let policy = ReconnectPolicy::default();
        assert_eq!(policy.max_retries, 5);
        assert_eq!(policy.delay, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn shutdown_stops_the_retry_loop() {
        let (client, handle) = NotificationClient::new(
            "ws://127.0.0.1:9/ws",
            ReconnectPolicy {
                max_retries: 1_000,
                delay: Duration::from_secs(60),
            },
            ViewCache::new(),
        );
        let task = tokio::spawn(client.run());
        handle.shutdown();
        assert_eq!(task.await.unwrap(), ClientExit::Shutdown);
    }
}
