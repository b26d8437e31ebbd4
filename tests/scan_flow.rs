//! End-to-end scan flow tests
//!
//! Drives the controller the way the web layer does: submitted text goes
//! through the interpreter, resolution runs remote-then-local, and clients
//! observe the outcome through the event hub.

use axum::{extract::Path, routing::get, Json, Router};
use scanserver::capture_session::{CaptureSession, ReplayDevice};
use scanserver::equipment::normalize_record;
use scanserver::event_hub::EventHub;
use scanserver::record_resolver::{FallbackStore, RecordResolver};
use scanserver::scan_controller::{LookupState, ScanController};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn local_record(id: &str, name: &str) -> scanserver::equipment::EquipmentRecord {
    normalize_record(json!({
        "id": id,
        "name": name,
        "serial_number": "SN-100",
        "category": "machining",
        "department": "fabrication",
        "owner_name": "Pat",
        "location": "Hall A",
        "maintenance_team_id": "team-1",
        "default_technician_id": "tech-1",
        "created_at": "2026-02-01T08:00:00Z",
        "updated_at": "2026-02-01T08:00:00Z"
    }))
    .unwrap()
}

async fn wait_for_lookup(
    controller: &ScanController,
    wanted: fn(&LookupState) -> bool,
) -> LookupState {
    for _ in 0..400 {
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
async fn scan_link_resolves_against_local_store() {
    let store = Arc::new(FallbackStore::new());
    store.insert(local_record("EQ-42", "Drill Press")).await;
    let resolver = Arc::new(RecordResolver::new(None, store));
    let hub = Arc::new(EventHub::new());
    let controller = Arc::new(ScanController::new(resolver, hub));

    let id = controller
        .submit_text("https://app.example.com/scan/EQ-42")
        .await
        .unwrap();
    assert_eq!(id, "EQ-42");

    let state = wait_for_lookup(&controller, |s| matches!(s, LookupState::Found { .. })).await;
    match state {
        LookupState::Found { record, source } => {
            assert_eq!(record.name, "Drill Press");
            assert_eq!(source, "local");
        }
        other => panic!("unexpected state: {:?}", other),
    }
}

#[tokio::test]
async fn duplicate_decodes_navigate_once() {
    let store = Arc::new(FallbackStore::new());
    store.insert(local_record("EQ-77", "Bandsaw")).await;
    let resolver = Arc::new(RecordResolver::new(None, store));
    let hub = Arc::new(EventHub::new());
    let controller = Arc::new(ScanController::new(resolver, hub.clone()));
    let (_client, mut rx) = hub.register().await;

    // A replay device that keeps seeing the same code
    let device = Arc::new(ReplayDevice::new(
        vec![
            "https://app.example.com/scan/EQ-77".to_string(),
            "https://app.example.com/scan/EQ-77".to_string(),
            "https://app.example.com/scan/EQ-77".to_string(),
        ],
        Duration::from_millis(10),
    ));
    let (session, detections) = CaptureSession::new(device, Duration::from_secs(5));
    controller.clone().spawn_detection_pump(detections);

    session.start().await;
    wait_for_lookup(&controller, |s| matches!(s, LookupState::Found { .. })).await;
    session.stop().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let mut navigations = 0;
    while let Ok(msg) = rx.try_recv() {
        let parsed: serde_json::Value = serde_json::from_str(&msg).unwrap();
        if parsed["type"] == "navigate" {
            navigations += 1;
        }
    }
    assert_eq!(navigations, 1);
}

#[tokio::test]
async fn remote_source_wins_over_local() {
    // Remote stub speaking the compact-word wire shape
    let remote = Router::new().route(
        "/api/v1/public/equipment/:id",
        get(|Path(id): Path<String>| async move {
            Json(json!({
                "id": id,
                "name": "Remote Lathe",
                "serialNumber": "SN-REMOTE",
                "category": "machining",
                "department": "fabrication",
                "ownerName": "Chris",
                "location": "Hall B",
                "maintenanceTeamId": "team-2",
                "defaultTechnicianId": "tech-2",
                "createdAt": "2026-03-01T08:00:00Z",
                "updatedAt": "2026-03-01T08:00:00Z"
            }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, remote).await.unwrap();
    });

    let store = Arc::new(FallbackStore::new());
    store.insert(local_record("EQ-9", "Stale Local Lathe")).await;
    let resolver = Arc::new(RecordResolver::new(
        Some(format!("http://{}", addr)),
        store,
    ));
    let hub = Arc::new(EventHub::new());
    let controller = Arc::new(ScanController::new(resolver, hub));

    controller.activate("EQ-9").await;

    let state = wait_for_lookup(&controller, |s| matches!(s, LookupState::Found { .. })).await;
    match state {
        LookupState::Found { record, source } => {
            assert_eq!(record.name, "Remote Lathe");
            assert_eq!(record.serial_number, "SN-REMOTE");
            assert_eq!(source, "remote");
        }
        other => panic!("unexpected state: {:?}", other),
    }
}

#[tokio::test]
async fn miss_in_every_source_is_not_found() {
    let resolver = Arc::new(RecordResolver::new(None, Arc::new(FallbackStore::new())));
    let hub = Arc::new(EventHub::new());
    let controller = Arc::new(ScanController::new(resolver, hub.clone()));
    let (_client, mut rx) = hub.register().await;

    controller.activate("EQ-MISSING").await;
    let state =
        wait_for_lookup(&controller, |s| matches!(s, LookupState::NotFound { .. })).await;
    assert_eq!(
        state,
        LookupState::NotFound {
            identifier: "EQ-MISSING".to_string()
        }
    );

    tokio::time::sleep(Duration::from_millis(20)).await;
    let mut saw_not_found = false;
    while let Ok(msg) = rx.try_recv() {
        let parsed: serde_json::Value = serde_json::from_str(&msg).unwrap();
        if parsed["type"] == "not_found" {
            assert_eq!(parsed["data"]["identifier"], "EQ-MISSING");
            saw_not_found = true;
        }
    }
    assert!(saw_not_found);
}
