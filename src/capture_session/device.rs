//! Capture device collaborator
//!
//! The host camera/decoder API is abstracted behind a capability-gated
//! device trait: a probe, permission-gated acquisition, and a stream of
//! frame-decode attempts. Real deployments implement `CaptureDevice` over
//! their platform capture API; the bundled `ReplayDevice` feeds recorded
//! payloads for demos and tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

/// Device failure causes, fatal to the current session
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// No camera hardware is present or permission was denied
    #[error("no camera device")]
    NoDevice,
    /// The runtime has no decoder capability
    #[error("capability unsupported")]
    Unsupported,
    /// Anything else the device reports
    #[error("other device error: {0}")]
    Other(String),
}

/// Camera/decoder collaborator
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Decode-capability probe, checked before any acquisition attempt
    fn decoder_supported(&self) -> bool;

    /// Acquire the device and open its frame stream
    ///
    /// The returned stream is the exclusive device handle; dropping it
    /// releases the device.
    async fn open(&self) -> Result<Box<dyn CaptureStream>, DeviceError>;
}

/// Live frame stream of a held device
#[async_trait]
pub trait CaptureStream: Send {
    /// Wait for the next frame and return its decoded text
    ///
    /// `Ok(None)` means a frame arrived but carried no decodable code.
    async fn next_decode(&mut self) -> Result<Option<String>, DeviceError>;
}

/// Replay device: emits recorded payloads at a fixed frame cadence
///
/// After the recording is exhausted it keeps producing empty frames, like a
/// camera pointed at nothing.
pub struct ReplayDevice {
    payloads: Vec<String>,
    frame_interval: Duration,
}

impl ReplayDevice {
    /// Create from an in-memory payload list
    pub fn new(payloads: Vec<String>, frame_interval: Duration) -> Self {
        Self {
            payloads,
            frame_interval,
        }
    }

    /// Load payloads from a file, one per line, skipping blank lines
    pub async fn from_file(path: &Path, frame_interval: Duration) -> crate::Result<Self> {
        let raw = fs::read_to_string(path).await?;
        let payloads: Vec<String> = raw
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        tracing::info!(
            path = %path.display(),
            payloads = payloads.len(),
            "Replay device loaded"
        );

        Ok(Self::new(payloads, frame_interval))
    }
}

#[async_trait]
impl CaptureDevice for ReplayDevice {
    fn decoder_supported(&self) -> bool {
        true
    }

    async fn open(&self) -> Result<Box<dyn CaptureStream>, DeviceError> {
        Ok(Box::new(ReplayStream {
            queue: self.payloads.clone().into(),
            frame_interval: self.frame_interval,
        }))
    }
}

struct ReplayStream {
    queue: VecDeque<String>,
    frame_interval: Duration,
}

#[async_trait]
impl CaptureStream for ReplayStream {
    async fn next_decode(&mut self) -> Result<Option<String>, DeviceError> {
        tokio::time::sleep(self.frame_interval).await;
        Ok(self.queue.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replay_emits_in_order_then_empty_frames() {
        let device = ReplayDevice::new(
            vec!["one".to_string(), "two".to_string()],
            Duration::from_millis(1),
        );
        let mut stream = device.open().await.unwrap();
        assert_eq!(stream.next_decode().await.unwrap().as_deref(), Some("one"));
        assert_eq!(stream.next_decode().await.unwrap().as_deref(), Some("two"));
        assert_eq!(stream.next_decode().await.unwrap(), None);
    }

    #[test]
    fn test_device_error_messages() {
        assert_eq!(DeviceError::NoDevice.to_string(), "no camera device");
        assert_eq!(DeviceError::Unsupported.to_string(), "capability unsupported");
    }
}
