//! Pose receiver
//!
//! Receives JSON-over-UDP packets from the tracker helper. Each packet
//! describes one camera frame:
//!
//! ```json
//! { "body_detected": true,
//!   "body_landmarks": { "leftWrist": [0.2, 1.9, -0.1], ... },
//!   "timestamp_ms": 1234 }
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;

use crate::config::TrackingConfig;
use crate::error::{StageError, TrackingError};
use crate::pose::{Pose, PoseResult};

/// A single JSON packet from the tracker
#[derive(Debug, Clone, Deserialize)]
pub struct PosePacket {
    /// Whether a body was detected this frame
    #[serde(default)]
    pub body_detected: bool,
    /// Landmark name → [x, y, z] world position (glTF coords)
    #[serde(default)]
    pub body_landmarks: HashMap<String, [f32; 3]>,
    /// Capture timestamp
    #[serde(default)]
    pub timestamp_ms: Option<u64>,
}

impl PosePacket {
    pub fn parse(bytes: &[u8]) -> Result<Self, StageError> {
        serde_json::from_slice(bytes)
            .map_err(|e| TrackingError::Parse(format!("JSON parse error: {}", e)).into())
    }

    /// Convert to a pose result. Incomplete skeletons count as no detection.
    pub fn to_pose_result(&self) -> PoseResult {
        let pose = if self.body_detected {
            Pose::from_landmarks(&self.body_landmarks)
        } else {
            None
        };

        PoseResult {
            pose,
            timestamp_ms: self.timestamp_ms,
        }
    }
}

/// UDP pose receiver
pub struct PoseReceiver {
    config: TrackingConfig,
    socket: Option<UdpSocket>,
    latest: PoseResult,
    received_at: Option<Instant>,
}

impl PoseReceiver {
    /// Create a new receiver (does not bind yet)
    pub fn new(config: &TrackingConfig) -> Self {
        Self {
            config: config.clone(),
            socket: None,
            latest: PoseResult::empty(),
            received_at: None,
        }
    }

    /// Bind the UDP socket
    pub async fn start(&mut self) -> Result<(), StageError> {
        let addr = format!("{}:{}", self.config.listen_address, self.config.port);

        let socket = UdpSocket::bind(&addr).await.map_err(|e| {
            TrackingError::Receiver(format!("Failed to bind to {}: {}", addr, e))
        })?;

        tracing::info!("Pose receiver listening on {}", addr);
        self.socket = Some(socket);

        Ok(())
    }

    /// Address the socket is bound to
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// Wait for the next packet and store it as the latest pose.
    ///
    /// Cancel-safe: dropping the future loses no datagram.
    pub async fn recv(&mut self) -> Result<PoseResult, StageError> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| TrackingError::Receiver("Receiver not started".to_string()))?;

        let mut buf = [0u8; 65536];
        let size = socket
            .recv(&mut buf)
            .await
            .map_err(|e| TrackingError::Receiver(format!("Receive error: {}", e)))?;

        let packet = PosePacket::parse(&buf[..size])?;
        let result = packet.to_pose_result();

        if packet.body_detected && result.pose.is_none() {
            tracing::debug!(
                "Body detected but skeleton incomplete ({} landmarks)",
                packet.body_landmarks.len()
            );
        }

        self.latest = result;
        self.received_at = Some(Instant::now());
        Ok(result)
    }

    /// Latest pose, or an empty result if it is older than `stale_after_ms`.
    pub fn current(&self, now: Instant) -> PoseResult {
        let max_age = Duration::from_millis(self.config.stale_after_ms);
        match self.received_at {
            Some(at) if now.saturating_duration_since(at) <= max_age => self.latest,
            _ => PoseResult::empty(),
        }
    }

    /// Check if any data has been received
    pub fn has_data(&self) -> bool {
        self.received_at.is_some()
    }

    /// Stop the receiver
    pub fn stop(&mut self) {
        self.socket = None;
        tracing::info!("Pose receiver stopped");
    }
}
