// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reflector protocol handlers: one [`ReflectorHandler`] engine parameterised
//! by a [`DialectDescriptor`], replacing the original's four near-identical
//! dialect classes (`spec.md` §9's redesign note, §4.4's shared interface).

pub mod dialect;

use crate::callsign::Callsign;
use crate::timer::Timer;
use dialect::{DialectDescriptor, DialectKind};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// Events a [`ReflectorHandler::poll`] call can surface to the owning
/// repeater handler.
#[derive(Debug, Clone)]
pub enum ReflectorEvent {
    LinkedOk { target: Callsign },
    LinkedFail { target: Callsign },
    Unlinked { target: Callsign },
    Header { stream_id: u16, header: Vec<u8> },
    AmbeData { stream_id: u16, seq: u8, bytes: Vec<u8> },
    Timeout { target: Callsign },
}

/// Link sub-state for a single reflector dialect engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkPhase {
    Idle,
    AwaitingAck,
    Linked,
}

/// A single reflector protocol engine: one UDP socket, one dialect
/// descriptor, one active link at a time.
pub struct ReflectorHandler {
    descriptor: &'static DialectDescriptor,
    socket: Arc<UdpSocket>,
    phase: LinkPhase,
    target: Option<Callsign>,
    target_addr: Option<SocketAddr>,
    keepalive_timer: Timer,
    link_timer: Timer,
}

impl ReflectorHandler {
    pub async fn bind(kind: DialectKind, bind_addr: SocketAddr) -> std::io::Result<Self> {
        let socket = UdpSocket::bind(bind_addr).await?;
        Ok(Self {
            descriptor: DialectDescriptor::for_kind(kind),
            socket: Arc::new(socket),
            phase: LinkPhase::Idle,
            target: None,
            target_addr: None,
            keepalive_timer: Timer::new(),
            link_timer: Timer::new(),
        })
    }

    pub fn descriptor(&self) -> &'static DialectDescriptor {
        self.descriptor
    }

    /// Sends a link (connect) request and arms the link-ack watchdog.
    pub async fn link(&mut self, target: Callsign, addr: SocketAddr) -> std::io::Result<()> {
        self.target = Some(target);
        self.target_addr = Some(addr);
        self.phase = LinkPhase::AwaitingAck;
        self.link_timer.start(Duration::from_secs(10));

        let request = self.encode_link_request(target);
        self.socket.send_to(&request, addr).await?;
        debug!(target = %target, dialect = ?self.descriptor.kind, "sent link request");
        Ok(())
    }

    /// Sends an unlink and returns to idle immediately (no ack awaited).
    pub async fn unlink(&mut self) -> std::io::Result<()> {
        if let (Some(target), Some(addr)) = (self.target, self.target_addr) {
            let request = self.encode_unlink_request(target);
            self.socket.send_to(&request, addr).await?;
            debug!(%target, "sent unlink request");
        }
        self.phase = LinkPhase::Idle;
        self.target = None;
        self.target_addr = None;
        self.keepalive_timer.stop();
        self.link_timer.stop();
        Ok(())
    }

    pub async fn write_header(&mut self, stream_id: u16, header: &[u8]) -> std::io::Result<()> {
        let Some(addr) = self.target_addr else {
            return Ok(());
        };
        let mut datagram = Vec::with_capacity(self.descriptor.header_len);
        datagram.extend_from_slice(&stream_id.to_le_bytes());
        datagram.extend_from_slice(header);
        datagram.resize(self.descriptor.header_len, 0);
        self.socket.send_to(&datagram, addr).await?;
        Ok(())
    }

    pub async fn write_data(&mut self, stream_id: u16, seq: u8, bytes12: &[u8]) -> std::io::Result<()> {
        let Some(addr) = self.target_addr else {
            return Ok(());
        };
        let mut datagram = Vec::with_capacity(self.descriptor.frame_len);
        datagram.extend_from_slice(&stream_id.to_le_bytes());
        datagram.push(seq);
        datagram.extend_from_slice(bytes12);
        datagram.resize(self.descriptor.frame_len, 0);
        self.socket.send_to(&datagram, addr).await?;
        Ok(())
    }

    pub async fn write_end(&mut self, stream_id: u16) -> std::io::Result<()> {
        let Some(addr) = self.target_addr else {
            return Ok(());
        };
        let mut datagram = vec![0xFFu8; self.descriptor.frame_len];
        datagram[0..2].copy_from_slice(&stream_id.to_le_bytes());
        self.socket.send_to(&datagram, addr).await?;
        Ok(())
    }

    /// Advances timers and the keepalive schedule; returns timeout/keepalive
    /// events for the caller to act on. Does not read the socket (the
    /// owning task reads it on a separate select branch per `spec.md` §5).
    pub async fn poll(&mut self, dt: Duration) -> Vec<ReflectorEvent> {
        let mut events = Vec::new();

        if self.phase == LinkPhase::AwaitingAck {
            self.link_timer.clock(dt);
            if self.link_timer.expired() {
                if let Some(target) = self.target.take() {
                    events.push(ReflectorEvent::LinkedFail { target });
                }
                self.phase = LinkPhase::Idle;
                self.target_addr = None;
            }
        }

        if self.phase == LinkPhase::Linked {
            self.keepalive_timer.clock(dt);
            if self.keepalive_timer.expired() {
                if let (Some(target), Some(addr)) = (self.target, self.target_addr) {
                    let keepalive = self.encode_keepalive();
                    if let Err(e) = self.socket.send_to(&keepalive, addr).await {
                        warn!(%target, error = %e, "keepalive send failed");
                    }
                }
                self.keepalive_timer.restart();
            }
        }

        events
    }

    /// Processes an inbound datagram from the reflector peer, advancing the
    /// link state machine and/or surfacing voice/header events.
    pub fn on_datagram(&mut self, data: &[u8]) -> Vec<ReflectorEvent> {
        let mut events = Vec::new();

        if self.phase == LinkPhase::AwaitingAck && self.is_ack(data) {
            if let Some(target) = self.target {
                self.phase = LinkPhase::Linked;
                self.link_timer.stop();
                self.keepalive_timer.start(self.descriptor.keepalive_period);
                events.push(ReflectorEvent::LinkedOk { target });
            }
            return events;
        }

        if self.phase != LinkPhase::Linked {
            return events;
        }

        if data.len() >= self.descriptor.header_len && is_probably_header(data) {
            let stream_id = u16::from_le_bytes([data[0], data[1]]);
            events.push(ReflectorEvent::Header {
                stream_id,
                header: data[2..].to_vec(),
            });
        } else if data.len() >= 3 {
            let stream_id = u16::from_le_bytes([data[0], data[1]]);
            let seq = data[2];
            events.push(ReflectorEvent::AmbeData {
                stream_id,
                seq,
                bytes: data[3..].to_vec(),
            });
        }

        events
    }

    fn is_ack(&self, data: &[u8]) -> bool {
        data.len() >= self.descriptor.magic.len() && &data[..self.descriptor.magic.len()] == self.descriptor.magic
    }

    fn encode_link_request(&self, target: Callsign) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.descriptor.link_request_len);
        buf.extend_from_slice(self.descriptor.magic);
        buf.extend_from_slice(target.as_bytes());
        buf.resize(self.descriptor.link_request_len.max(buf.len()), 0);
        buf
    }

    fn encode_unlink_request(&self, target: Callsign) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(self.descriptor.magic);
        buf.push(b'U');
        buf.extend_from_slice(target.as_bytes());
        buf
    }

    fn encode_keepalive(&self) -> Vec<u8> {
        match self.descriptor.kind {
            DialectKind::Dcs | DialectKind::Xlx => vec![0u8; 22],
            _ => self.descriptor.magic.to_vec(),
        }
    }

    pub fn is_linked(&self) -> bool {
        self.phase == LinkPhase::Linked
    }

    pub fn current_target(&self) -> Option<Callsign> {
        self.target
    }

    /// Reads one inbound datagram off this dialect's socket. The gateway
    /// thread selects on this alongside the 1 ms tick and the radio-side
    /// sockets (`spec.md` §2 component 9, §5's suspension points).
    pub async fn recv_datagram(&self) -> std::io::Result<Vec<u8>> {
        let mut buf = vec![0u8; 2048];
        let (len, _addr) = self.socket.recv_from(&mut buf).await?;
        buf.truncate(len);
        Ok(buf)
    }
}

fn is_probably_header(data: &[u8]) -> bool {
    data.len() >= 8 && data[2..8].iter().any(|&b| b != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reflector::dialect::DialectKind;

    #[tokio::test]
    async fn link_then_ack_transitions_to_linked() {
        let mut handler = ReflectorHandler::bind(DialectKind::DExtra, "127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let target = Callsign::gateway("XRF012");
        handler.link(target, "127.0.0.1:1".parse().unwrap()).await.unwrap();
        assert!(!handler.is_linked());

        let ack = b"XRFACK".to_vec();
        let events = handler.on_datagram(&ack);
        assert!(matches!(events[0], ReflectorEvent::LinkedOk { .. }));
        assert!(handler.is_linked());
    }

    #[tokio::test]
    async fn link_timeout_without_ack_fails() {
        let mut handler = ReflectorHandler::bind(DialectKind::DExtra, "127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let target = Callsign::gateway("XRF012");
        handler.link(target, "127.0.0.1:1".parse().unwrap()).await.unwrap();

        let events = handler.poll(Duration::from_secs(11)).await;
        assert!(matches!(events[0], ReflectorEvent::LinkedFail { .. }));
    }
}
