//! ScanController - Scan Flow Orchestration
//!
//! ## Responsibilities
//!
//! - Consume detection events, run the payload interpreter, and emit
//!   navigation or unreadable-code events
//! - Track the active identifier and run exactly one resolution per
//!   distinct value
//! - Keep the exposed lookup state in step with the most recently
//!   requested identifier; superseded in-flight resolutions are discarded
//!   on completion (the underlying lookup cannot be aborted once sent)
//!
//! The controller is the sole writer of the active identifier and lookup
//! state. No lock is held across a suspension point.

use crate::capture_session::DetectionEvent;
use crate::equipment::EquipmentRecord;
use crate::error::Error;
use crate::event_hub::{
    EventHub, LookupFailedMessage, LookupStartedMessage, NavigateMessage, NotFoundMessage,
    ResolvedMessage, ScanEvent, UnreadableMessage,
};
use crate::payload_interpreter;
use crate::record_resolver::RecordResolver;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

const UNREADABLE_NOTE: &str =
    "Couldn't read an equipment identifier. Scan again or paste the identifier manually.";

/// Lookup state exposed to presentation code
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LookupState {
    /// No identifier has been activated yet
    Idle,
    /// Resolution in flight for the active identifier
    Loading { identifier: String },
    /// Resolution succeeded
    Found { record: EquipmentRecord, source: String },
    /// No source holds the identifier; terminal, never retried automatically
    NotFound { identifier: String },
    /// Resolution failed for a reason other than a miss
    Failed { identifier: String, message: String },
}

/// ScanController instance
pub struct ScanController {
    resolver: Arc<RecordResolver>,
    hub: Arc<EventHub>,
    lookup: Arc<RwLock<LookupState>>,
    active: Arc<RwLock<Option<String>>>,
    generation: Arc<AtomicU64>,
}

impl ScanController {
    /// Create new ScanController
    pub fn new(resolver: Arc<RecordResolver>, hub: Arc<EventHub>) -> Self {
        Self {
            resolver,
            hub,
            lookup: Arc::new(RwLock::new(LookupState::Idle)),
            active: Arc::new(RwLock::new(None)),
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Current lookup state
    pub async fn lookup_state(&self) -> LookupState {
        self.lookup.read().await.clone()
    }

    /// Currently active identifier, if any
    pub async fn active_identifier(&self) -> Option<String> {
        self.active.read().await.clone()
    }

    /// Pump capture-session detection events into the controller
    pub fn spawn_detection_pump(
        self: Arc<Self>,
        mut detections: mpsc::UnboundedReceiver<DetectionEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut last_seq = 0u64;
            while let Some(event) = detections.recv().await {
                if event.seq <= last_seq {
                    tracing::debug!(seq = event.seq, "Discarding stale detection event");
                    continue;
                }
                last_seq = event.seq;
                self.handle_detection(&event.text).await;
            }
        })
    }

    /// Handle one decoded payload from the capture session
    ///
    /// Unreadable payloads surface a recoverable notification; the session
    /// keeps running either way.
    pub async fn handle_detection(&self, text: &str) {
        match payload_interpreter::interpret(text) {
            None => {
                tracing::debug!("Scanned payload not interpretable");
                self.hub
                    .publish(ScanEvent::Unreadable(UnreadableMessage {
                        message: UNREADABLE_NOTE.to_string(),
                    }))
                    .await;
            }
            Some(id) => {
                tracing::info!(identifier = %id, "Scan detected equipment identifier");
                self.hub
                    .publish(ScanEvent::Navigate(NavigateMessage {
                        identifier: id.clone(),
                    }))
                    .await;
                self.activate(&id).await;
            }
        }
    }

    /// Manual text submission (paste/search)
    ///
    /// Runs through the same interpreter as a scan. Unrecognized input does
    /// not change the active identifier.
    pub async fn submit_text(&self, raw: &str) -> crate::Result<String> {
        let Some(id) = payload_interpreter::interpret(raw) else {
            self.hub
                .publish(ScanEvent::Unreadable(UnreadableMessage {
                    message: UNREADABLE_NOTE.to_string(),
                }))
                .await;
            return Err(Error::Unreadable(
                "could not read an equipment identifier from the input".to_string(),
            ));
        };

        self.hub
            .publish(ScanEvent::Navigate(NavigateMessage {
                identifier: id.clone(),
            }))
            .await;
        self.activate(&id).await;
        Ok(id)
    }

    /// Make an identifier the active lookup target
    ///
    /// Resolution runs once per distinct value; re-activating the identifier
    /// that is already active is a no-op. A newer activation supersedes any
    /// in-flight one via the generation counter.
    pub async fn activate(&self, id: &str) {
        {
            let mut active = self.active.write().await;
            if active.as_deref() == Some(id) {
                tracing::debug!(identifier = %id, "Identifier already active");
                return;
            }
            *active = Some(id.to_string());
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.lookup.write().await = LookupState::Loading {
            identifier: id.to_string(),
        };
        self.hub
            .publish(ScanEvent::LookupStarted(LookupStartedMessage {
                identifier: id.to_string(),
            }))
            .await;

        let resolver = self.resolver.clone();
        let hub = self.hub.clone();
        let lookup = self.lookup.clone();
        let latest = self.generation.clone();
        let id = id.to_string();

        tokio::spawn(async move {
            let outcome = resolver.resolve(&id).await;

            let applied = {
                let mut slot = lookup.write().await;
                if latest.load(Ordering::SeqCst) != generation {
                    false
                } else {
                    *slot = match &outcome {
                        Ok(resolved) => LookupState::Found {
                            record: resolved.record.clone(),
                            source: resolved.source.as_str().to_string(),
                        },
                        Err(Error::NotFound(_)) => LookupState::NotFound {
                            identifier: id.clone(),
                        },
                        Err(_) => LookupState::Failed {
                            identifier: id.clone(),
                            message: "Equipment lookup failed".to_string(),
                        },
                    };
                    true
                }
            };

            if !applied {
                tracing::debug!(identifier = %id, "Discarding superseded resolution");
                return;
            }

            match outcome {
                Ok(resolved) => {
                    hub.publish(ScanEvent::Resolved(ResolvedMessage {
                        record: resolved.record,
                        source: resolved.source.as_str().to_string(),
                    }))
                    .await;
                }
                Err(Error::NotFound(_)) => {
                    tracing::info!(identifier = %id, "Equipment not found in any source");
                    hub.publish(ScanEvent::NotFound(NotFoundMessage { identifier: id }))
                        .await;
                }
                Err(e) => {
                    tracing::error!(identifier = %id, error = %e, "Equipment lookup failed");
                    hub.publish(ScanEvent::LookupFailed(LookupFailedMessage {
                        identifier: id,
                        message: "Equipment lookup failed".to_string(),
                    }))
                    .await;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::normalize_record;
    use crate::record_resolver::FallbackStore;
    use serde_json::json;
    use std::time::Duration;

    fn record(id: &str, name: &str) -> EquipmentRecord {
        normalize_record(json!({
            "id": id,
            "name": name,
            "serial_number": "S-1",
            "category": "machining",
            "department": "fab",
            "owner_name": "A",
            "location": "Hall A",
            "maintenance_team_id": "t1",
            "default_technician_id": "u1",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z"
        }))
        .unwrap()
    }

    async fn controller_with(records: Vec<EquipmentRecord>) -> (Arc<ScanController>, Arc<EventHub>) {
        let store = Arc::new(FallbackStore::new());
        for r in records {
            store.insert(r).await;
        }
        let resolver = Arc::new(RecordResolver::new(None, store));
        let hub = Arc::new(EventHub::new());
        (Arc::new(ScanController::new(resolver, hub.clone())), hub)
    }

    async fn wait_for_lookup(
        controller: &ScanController,
        wanted: fn(&LookupState) -> bool,
    ) -> LookupState {
        for _ in 0..200 {
            let state = controller.lookup_state().await;
            if wanted(&state) {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!(
            "lookup never reached expected state, last: {:?}",
            controller.lookup_state().await
        );
    }

    #[tokio::test]
    async fn test_unreadable_submission_keeps_active_unchanged() {
        let (controller, hub) = controller_with(vec![]).await;
        let (_id, mut rx) = hub.register().await;

        let err = controller.submit_text("ab").await.unwrap_err();
        assert!(matches!(err, Error::Unreadable(_)));
        assert_eq!(controller.active_identifier().await, None);

        let json = rx.recv().await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["type"], "unreadable");
    }

    #[tokio::test]
    async fn test_submission_resolves_from_local_store() {
        let (controller, _hub) = controller_with(vec![record("EQ-42", "Drill Press")]).await;

        let id = controller
            .submit_text("https://app.example.com/scan/EQ-42")
            .await
            .unwrap();
        assert_eq!(id, "EQ-42");
        assert_eq!(controller.active_identifier().await.as_deref(), Some("EQ-42"));

        let state =
            wait_for_lookup(&controller, |s| matches!(s, LookupState::Found { .. })).await;
        match state {
            LookupState::Found { record, source } => {
                assert_eq!(record.name, "Drill Press");
                assert_eq!(source, "local");
            }
            other => panic!("unexpected lookup state: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_reactivating_same_identifier_resolves_once() {
        let (controller, hub) = controller_with(vec![record("EQ-1", "Lathe")]).await;
        let (_id, mut rx) = hub.register().await;

        controller.activate("EQ-1").await;
        wait_for_lookup(&controller, |s| matches!(s, LookupState::Found { .. })).await;
        controller.activate("EQ-1").await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut started = 0;
        while let Ok(json) = rx.try_recv() {
            let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
            if parsed["type"] == "lookup_started" {
                started += 1;
            }
        }
        assert_eq!(started, 1);
    }

    #[tokio::test]
    async fn test_miss_is_not_found_state() {
        let (controller, _hub) = controller_with(vec![]).await;

        controller.activate("EQ-404").await;
        let state =
            wait_for_lookup(&controller, |s| matches!(s, LookupState::NotFound { .. })).await;
        assert_eq!(
            state,
            LookupState::NotFound {
                identifier: "EQ-404".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_latest_activation_wins() {
        let (controller, _hub) =
            controller_with(vec![record("EQ-A1", "First"), record("EQ-B2", "Second")]).await;

        controller.activate("EQ-A1").await;
        controller.activate("EQ-B2").await;

        let state =
            wait_for_lookup(&controller, |s| matches!(s, LookupState::Found { .. })).await;
        match state {
            LookupState::Found { record, .. } => assert_eq!(record.id, "EQ-B2"),
            other => panic!("unexpected lookup state: {:?}", other),
        }
        assert_eq!(
            controller.active_identifier().await.as_deref(),
            Some("EQ-B2")
        );
    }
}
