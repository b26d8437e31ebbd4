//! Application state
//!
//! Holds all shared components and state

use crate::capture_session::CaptureSession;
use crate::event_hub::EventHub;
use crate::record_resolver::{FallbackStore, RecordResolver};
use crate::scan_controller::ScanController;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Maintenance API base URL (remote record source; optional)
    pub api_base_url: Option<String>,
    /// Server port
    pub port: u16,
    /// Server host
    pub host: String,
    /// Seed file for the local fallback store (JSON array of records)
    pub seed_file: Option<PathBuf>,
    /// Decode replay file driving the capture device
    pub device_file: Option<PathBuf>,
    /// Interval between replayed frames (ms)
    pub frame_interval_ms: u64,
    /// Duplicate-detection suppression window (ms)
    pub debounce_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: std::env::var("API_BASE_URL").ok(),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            seed_file: std::env::var("SEED_FILE").map(PathBuf::from).ok(),
            device_file: std::env::var("SCAN_DEVICE_FILE").map(PathBuf::from).ok(),
            frame_interval_ms: std::env::var("FRAME_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(250),
            debounce_ms: std::env::var("DEBOUNCE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1500),
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Application config
    pub config: AppConfig,
    /// CaptureSession (camera lifecycle and decode stream)
    pub session: Arc<CaptureSession>,
    /// ScanController (active identifier and lookup state)
    pub controller: Arc<ScanController>,
    /// RecordResolver (remote-then-local record source)
    pub resolver: Arc<RecordResolver>,
    /// FallbackStore (local record cache)
    pub fallback: Arc<FallbackStore>,
    /// EventHub (WebSocket fan-out)
    pub hub: Arc<EventHub>,
    /// Process start time, for uptime reporting
    pub started_at: Instant,
}
