use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::entities::{InvoiceStatus, OcStatus};
use crate::errors::ServiceError;
use crate::notifications::{NotificationHub, SocketMessage, StatusChange};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), ServiceError> {
        self.sender
            .send(event)
            .await
            .map_err(|e| ServiceError::EventError(format!("Failed to send event: {}", e)))
    }

    /// Sends an event after a committed write. The write already succeeded,
    /// so a closed channel is only logged.
    pub async fn publish(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "Dropping domain event");
        }
    }
}

/// Domain events emitted after a transaction commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    InvoiceStatusChanged {
        invoice_id: i32,
        old_status: InvoiceStatus,
        new_status: InvoiceStatus,
        changed_at: DateTime<Utc>,
    },
    PurchaseOrderStatusChanged {
        oc_id: i32,
        old_status: OcStatus,
        new_status: OcStatus,
        changed_at: DateTime<Utc>,
    },
    VendorsBackfilled {
        vendors_created: u64,
        orders_linked: u64,
    },
}

impl Event {
    /// Socket message pushed to connected clients, if the event has one.
    pub fn to_socket_message(&self) -> Option<SocketMessage> {
        match self {
            Event::InvoiceStatusChanged {
                invoice_id,
                old_status,
                new_status,
                changed_at,
            } => Some(SocketMessage::InvoiceStatusChange {
                data: StatusChange {
                    id: *invoice_id,
                    status: new_status.to_string(),
                    previous_status: Some(old_status.to_string()),
                    changed_at: *changed_at,
                },
            }),
            Event::PurchaseOrderStatusChanged {
                oc_id,
                old_status,
                new_status,
                changed_at,
            } => Some(SocketMessage::OcStatusChange {
                data: StatusChange {
                    id: *oc_id,
                    status: new_status.to_string(),
                    previous_status: Some(old_status.to_string()),
                    changed_at: *changed_at,
                },
            }),
            Event::VendorsBackfilled { .. } => None,
        }
    }
}

/// Drains the event channel and relays status changes to the socket hub.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, hub: Arc<NotificationHub>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        debug!(?event, "Received event");

        match event.to_socket_message() {
            Some(message) => {
                let delivered = hub.publish(message);
                debug!(delivered, "Relayed status change");
            }
            None => match &event {
                Event::VendorsBackfilled {
                    vendors_created,
                    orders_linked,
                } => info!(vendors_created, orders_linked, "Vendor backfill completed"),
                _ => debug!("No socket message for event"),
            },
        }
    }

    warn!("Event processing loop has ended");
}
