// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! APRS sender/receiver egress queue (`spec.md` §2 component 10).
//!
//! Grounded on `original_source/Common/APRSISHandlerThread.cpp`: a bounded
//! queue of outbound frame strings, drained by a background task that
//! forwards each frame to the MQTT `aprs-gateway/aprs` topic rather than a
//! direct APRS-IS TCP connection (the original's `#ifdef notdef`-guarded
//! socket path was already dead code upstream; the MQTT publish path is the
//! one actually exercised). `ResourceExhausted` (`spec.md` §7) applies here:
//! a full queue drops the newest frame and logs once, rate-limited by the
//! repeat-suppressing log layer (`crate::logging`).

use crate::mqtt::MqttPublisher;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Matches the original's `CITEQueue<std::string>(20U)` bound.
const QUEUE_CAPACITY: usize = 20;

/// One outbound APRS frame, already formatted as a TNC2-style text line.
#[derive(Debug, Clone)]
pub struct AprsFrame(pub String);

/// Sending half: callers push frames without blocking on network I/O.
#[derive(Clone)]
pub struct AprsSender {
    tx: mpsc::Sender<AprsFrame>,
}

impl AprsSender {
    /// Queues a frame for delivery, CRLF-trimmed then re-terminated, matching
    /// the original's `boost::trim_if` + `append("\r\n")` normalization.
    /// Drops the frame if the queue is full (`ResourceExhausted`, `spec.md` §7).
    pub fn send(&self, mut frame: String) {
        while frame.ends_with(['\r', '\n']) {
            frame.pop();
        }
        frame.push_str("\r\n");

        match self.tx.try_send(AprsFrame(frame)) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("APRS egress queue full, dropping newest frame");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

/// Spawns the egress worker: drains queued frames and republishes each to
/// the MQTT `aprs-gateway/aprs` topic. Returns the sending handle.
pub fn spawn(mqtt: Arc<MqttPublisher>, callsign: &str) -> AprsSender {
    let (tx, mut rx) = mpsc::channel(QUEUE_CAPACITY);
    let username = normalize_username(callsign);

    tokio::spawn(async move {
        debug!(username, "APRS writer task starting");
        while let Some(AprsFrame(frame)) = rx.recv().await {
            debug!(frame = %frame.trim_end(), "APRS frame sent to IS");
            mqtt.publish_aprs_frame(&frame).await;
        }
        debug!("APRS writer task stopping");
    });

    AprsSender { tx }
}

/// Derives the APRS-IS login username: the gateway callsign with its module
/// byte blanked and trimmed, matching the original constructor's
/// `m_username[LONG_CALLSIGN_LENGTH - 1] = ' '; boost::trim(m_username)`.
fn normalize_username(callsign: &str) -> String {
    let mut bytes: Vec<u8> = callsign.bytes().collect();
    if let Some(last) = bytes.last_mut() {
        *last = b' ';
    }
    String::from_utf8_lossy(&bytes).trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_username_blanks_module_byte() {
        assert_eq!(normalize_username("W1ABC  A"), "W1ABC");
    }

    #[test]
    fn sender_normalizes_line_endings() {
        let (tx, mut rx) = mpsc::channel(QUEUE_CAPACITY);
        let sender = AprsSender { tx };
        sender.send("W1ABC>APRS:test\r\n\r\n".to_string());
        let AprsFrame(frame) = rx.try_recv().unwrap();
        assert_eq!(frame, "W1ABC>APRS:test\r\n");
    }

    #[test]
    fn full_queue_drops_newest_frame_without_panicking() {
        let (tx, mut rx) = mpsc::channel(1);
        let sender = AprsSender { tx };
        sender.send("first".to_string());
        sender.send("second".to_string());
        let AprsFrame(first) = rx.try_recv().unwrap();
        assert!(first.starts_with("first"));
        assert!(rx.try_recv().is_err());
    }
}
