//! Scanserver Library
//!
//! QR scan resolution service for equipment maintenance consoles
//!
//! ## Architecture (6 Components)
//!
//! 1. PayloadInterpreter - Decoded payload to equipment identifier
//! 2. RecordResolver - Remote-then-local equipment record lookup
//! 3. CaptureSession - Camera lifecycle and decode stream
//! 4. ScanController - Active identifier and lookup state
//! 5. EventHub - WebSocket event distribution
//! 6. WebAPI - REST API endpoints
//!
//! ## Design Principles
//!
//! - The controller is the only writer of lookup state
//! - A newer activation always supersedes an older in-flight one
//! - Unreadable payloads are recoverable, never fatal

pub mod capture_session;
pub mod equipment;
pub mod error;
pub mod event_hub;
pub mod models;
pub mod payload_interpreter;
pub mod record_resolver;
pub mod scan_controller;
pub mod state;
pub mod web_api;

pub use error::{Error, Result};
pub use state::AppState;
