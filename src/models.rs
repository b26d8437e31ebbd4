//! Shared models and types
//!
//! This module contains types shared across multiple modules
//! to avoid circular dependencies.

use serde::{Deserialize, Serialize};

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            ok: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_sec: u64,
    pub remote_configured: bool,
    pub fallback_records: usize,
}

/// Service status report
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub session_state: crate::capture_session::SessionState,
    pub active_identifier: Option<String>,
    pub lookup: crate::scan_controller::LookupState,
    pub ws_connections: u64,
}
