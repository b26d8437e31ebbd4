//! CaptureSession - Camera Device Lifecycle and Detection Loop
//!
//! ## Responsibilities
//!
//! - Own the capture device lifecycle: Idle -> Starting -> Running ->
//!   Stopped/Error, with restart from Error/Stopped
//! - Run the detection loop and emit decoded-text events with a
//!   monotonically increasing sequence number
//! - Suppress consecutive duplicate decodes inside the debounce window
//!
//! The device handle lives inside the spawned run task. Aborting that task
//! drops the pending acquisition or the live stream, so the device is
//! released on every path out of Starting/Running, including teardown.

pub mod device;

pub use device::{CaptureDevice, CaptureStream, DeviceError, ReplayDevice};

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Default duplicate-decode suppression window
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1500);

/// Capture session lifecycle state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Starting,
    Running,
    Stopped,
    Error(String),
}

/// Decoded-frame event delivered to the scan controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectionEvent {
    /// Session-monotone sequence number, used to discard stale events
    pub seq: u64,
    /// Decoded payload text
    pub text: String,
}

/// Live video feed sink supplied by the caller
///
/// Attached when the session enters Running, detached when it leaves.
pub trait RenderTarget: Send + Sync {
    fn attach(&self);
    fn detach(&self);
}

/// Detaches the render target when the run task ends, on any path.
struct FeedGuard(Arc<dyn RenderTarget>);

impl FeedGuard {
    fn attach(target: Arc<dyn RenderTarget>) -> Self {
        target.attach();
        Self(target)
    }
}

impl Drop for FeedGuard {
    fn drop(&mut self) {
        self.0.detach();
    }
}

/// CaptureSession instance
pub struct CaptureSession {
    device: Arc<dyn CaptureDevice>,
    target: Option<Arc<dyn RenderTarget>>,
    state: Arc<RwLock<SessionState>>,
    seq: Arc<AtomicU64>,
    debounce: Duration,
    events: mpsc::UnboundedSender<DetectionEvent>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl CaptureSession {
    /// Create a session around a capture device
    ///
    /// Returns the session and the receiving end of its detection events.
    pub fn new(
        device: Arc<dyn CaptureDevice>,
        debounce: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<DetectionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            device,
            target: None,
            state: Arc::new(RwLock::new(SessionState::Idle)),
            seq: Arc::new(AtomicU64::new(0)),
            debounce,
            events: tx,
            task: Mutex::new(None),
        };
        (session, rx)
    }

    /// Attach a render target for the live feed
    pub fn with_render_target(mut self, target: Arc<dyn RenderTarget>) -> Self {
        self.target = Some(target);
        self
    }

    /// Current lifecycle state
    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Number of detection events emitted since creation
    pub fn detections(&self) -> u64 {
        self.seq.load(Ordering::SeqCst)
    }

    /// Start the capture session
    ///
    /// No-op while Starting/Running. A fresh start from Error or Stopped
    /// re-attempts from scratch; the previous error does not carry over.
    pub async fn start(&self) {
        {
            let mut state = self.state.write().await;
            match *state {
                SessionState::Starting | SessionState::Running => {
                    tracing::debug!("Capture session already active");
                    return;
                }
                _ => *state = SessionState::Starting,
            }
        }

        if !self.device.decoder_supported() {
            let cause = DeviceError::Unsupported;
            tracing::warn!(cause = %cause, "Decoder capability probe failed");
            let mut state = self.state.write().await;
            if *state == SessionState::Starting {
                *state = SessionState::Error(cause.to_string());
            }
            return;
        }

        let device = self.device.clone();
        let target = self.target.clone();
        let state = self.state.clone();
        let seq = self.seq.clone();
        let events = self.events.clone();
        let debounce = self.debounce;

        let handle = tokio::spawn(async move {
            if *state.read().await != SessionState::Starting {
                return;
            }

            let stream = match device.open().await {
                Ok(s) => s,
                Err(e) => {
                    tracing::warn!(cause = %e, "Capture device acquisition failed");
                    let mut s = state.write().await;
                    if *s == SessionState::Starting {
                        *s = SessionState::Error(e.to_string());
                    }
                    return;
                }
            };

            {
                let mut s = state.write().await;
                if *s != SessionState::Starting {
                    // Stop arrived during acquisition; the stream drops here
                    // and the device is released without ever going live.
                    return;
                }
                *s = SessionState::Running;
            }

            let _feed = target.map(FeedGuard::attach);
            tracing::info!("Capture session running");

            detection_loop(stream, state, seq, events, debounce).await;
        });

        *self.task.lock().await = Some(handle);
    }

    /// Stop the capture session
    ///
    /// Safe and idempotent from any state, including mid-Starting.
    pub async fn stop(&self) {
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
        }

        let mut state = self.state.write().await;
        match *state {
            SessionState::Starting | SessionState::Running => {
                *state = SessionState::Stopped;
                tracing::info!("Capture session stopped");
            }
            _ => {}
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if let Some(handle) = self.task.get_mut().take() {
            handle.abort();
        }
    }
}

/// Pull frames off the stream until it fails or the task is aborted
///
/// Detection events are emitted in frame-capture order. A decode equal to
/// the last emitted value is suppressed while its debounce window is fresh;
/// every suppressed sighting refreshes the window, so a code held in front
/// of the camera emits exactly once.
async fn detection_loop(
    mut stream: Box<dyn CaptureStream>,
    state: Arc<RwLock<SessionState>>,
    seq: Arc<AtomicU64>,
    events: mpsc::UnboundedSender<DetectionEvent>,
    debounce: Duration,
) {
    let mut last_text: Option<String> = None;
    let mut last_seen = Instant::now();

    loop {
        match stream.next_decode().await {
            Ok(Some(text)) => {
                let now = Instant::now();
                let duplicate = last_text.as_deref() == Some(text.as_str())
                    && now.duration_since(last_seen) < debounce;
                last_seen = now;
                if duplicate {
                    continue;
                }
                last_text = Some(text.clone());

                let n = seq.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::debug!(seq = n, "Frame decoded");
                if events.send(DetectionEvent { seq: n, text }).is_err() {
                    // Receiver gone; nothing left to deliver to.
                    break;
                }
            }
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(cause = %e, "Capture stream failed");
                let mut s = state.write().await;
                if *s == SessionState::Running {
                    *s = SessionState::Error(e.to_string());
                }
                break;
            }
        }
    }
    // The stream drops here; the device handle is released.
}
