//! EventHub - Scan Event Distribution
//!
//! ## Responsibilities
//!
//! - WebSocket connection management
//! - Broadcasting scan controller events (navigate, unreadable, lookup
//!   lifecycle) to connected consoles
//!
//! Presentation code consumes these events; nothing in the scan core reads
//! them back.

use crate::equipment::EquipmentRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Outbound scan events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
#[serde(rename_all = "snake_case")]
pub enum ScanEvent {
    /// A scan or manual submission produced an identifier; the console
    /// should navigate to it
    Navigate(NavigateMessage),
    /// The payload could not be read as an equipment identifier
    Unreadable(UnreadableMessage),
    /// Resolution started for the active identifier
    LookupStarted(LookupStartedMessage),
    /// Resolution succeeded
    Resolved(ResolvedMessage),
    /// No source holds the identifier
    NotFound(NotFoundMessage),
    /// Resolution failed for a reason other than a miss
    LookupFailed(LookupFailedMessage),
}

/// Navigation message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigateMessage {
    pub identifier: String,
}

/// Unreadable-payload notification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreadableMessage {
    pub message: String,
}

/// Lookup started message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupStartedMessage {
    pub identifier: String,
}

/// Resolution success message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedMessage {
    pub record: EquipmentRecord,
    /// Which source produced the record: "remote" or "local"
    pub source: String,
}

/// Not-found message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotFoundMessage {
    pub identifier: String,
}

/// Lookup failure message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupFailedMessage {
    pub identifier: String,
    pub message: String,
}

/// Client connection
struct ClientConnection {
    id: Uuid,
    tx: mpsc::UnboundedSender<String>,
}

/// EventHub instance
pub struct EventHub {
    connections: RwLock<HashMap<Uuid, ClientConnection>>,
    connection_count: AtomicU64,
}

impl EventHub {
    /// Create new EventHub
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            connection_count: AtomicU64::new(0),
        }
    }

    /// Register a new client
    pub async fn register(&self) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();

        {
            let mut connections = self.connections.write().await;
            connections.insert(id, ClientConnection { id, tx });
        }

        self.connection_count.fetch_add(1, Ordering::Relaxed);
        tracing::info!(connection_id = %id, "Scan event client connected");

        (id, rx)
    }

    /// Unregister a client
    pub async fn unregister(&self, id: &Uuid) {
        let mut connections = self.connections.write().await;
        if connections.remove(id).is_some() {
            self.connection_count.fetch_sub(1, Ordering::Relaxed);
            tracing::info!(connection_id = %id, "Scan event client disconnected");
        }
    }

    /// Broadcast an event to all connected clients
    pub async fn publish(&self, event: ScanEvent) {
        let event_type = match &event {
            ScanEvent::Navigate(_) => "navigate",
            ScanEvent::Unreadable(_) => "unreadable",
            ScanEvent::LookupStarted(_) => "lookup_started",
            ScanEvent::Resolved(_) => "resolved",
            ScanEvent::NotFound(_) => "not_found",
            ScanEvent::LookupFailed(_) => "lookup_failed",
        };
        tracing::debug!(event_type = %event_type, "Publishing scan event");

        let json = match serde_json::to_string(&event) {
            Ok(j) => j,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize scan event");
                return;
            }
        };

        let connections = self.connections.read().await;
        for conn in connections.values() {
            if let Err(e) = conn.tx.send(json.clone()) {
                tracing::warn!(connection_id = %conn.id, error = %e, "Failed to send scan event");
            }
        }
    }

    /// Get connection count
    pub fn connection_count(&self) -> u64 {
        self.connection_count.load(Ordering::Relaxed)
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}
