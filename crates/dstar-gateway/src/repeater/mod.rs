// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Repeater handler: the per-band session state machine (`spec.md` §4.5),
//! the largest single component by the relative implementation budget in
//! `spec.md` §2.

pub mod access;
pub mod dtmf_router;
pub mod echo;
pub mod link;

use crate::callsign::Callsign;
use crate::dtmf::Dtmf;
use crate::timer::Timer;
use access::{AccessControl, AccessVerdict};
use echo::EchoPlayer;
use std::collections::HashSet;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Reconnect policy applied when a reflector link fails (`spec.md` §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    Never,
    Fixed,
    After(ReconnectMinutes),
}

/// Valid "after N minutes" reconnect intervals, per `DStarGatewayConfig.cpp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectMinutes {
    M5,
    M10,
    M15,
    M20,
    M25,
    M30,
    M60,
    M90,
    M120,
    M180,
}

impl ReconnectMinutes {
    pub fn as_duration(self) -> Duration {
        let mins = match self {
            Self::M5 => 5,
            Self::M10 => 10,
            Self::M15 => 15,
            Self::M20 => 20,
            Self::M25 => 25,
            Self::M30 => 30,
            Self::M60 => 60,
            Self::M90 => 90,
            Self::M120 => 120,
            Self::M180 => 180,
        };
        Duration::from_secs(mins * 60)
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "5" => Self::M5,
            "10" => Self::M10,
            "15" => Self::M15,
            "20" => Self::M20,
            "25" => Self::M25,
            "30" => Self::M30,
            "60" => Self::M60,
            "90" => Self::M90,
            "120" => Self::M120,
            "180" => Self::M180,
            _ => return None,
        })
    }
}

impl ReconnectPolicy {
    pub fn from_config(s: &str) -> Option<Self> {
        match s {
            "Never" => Some(Self::Never),
            "Fixed" => Some(Self::Fixed),
            other => ReconnectMinutes::from_str(other).map(Self::After),
        }
    }
}

/// Per-band session state, `spec.md` §4.5's transition table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BandState {
    Idle,
    Receiving { stream_id: u16 },
    Transmitting { stream_id: u16 },
    Linking { target: Callsign },
    Linked { target: Callsign },
    Relinking { target: Callsign },
    Failed { target: Callsign },
}

/// The derived route for an inbound header, `spec.md` §4.5's routing rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `urCall` was a link-control command; no voice is forwarded.
    Command(LinkCommand),
    /// `urCall[0] == '/'`: direct callsign routing via IRCDDB.
    Direct { user_callsign: Callsign },
    /// `urCall == "CQCQCQ "`: forward to the currently linked reflector, if any.
    ReflectorLink,
}

/// A parsed `urCall` link-control command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkCommand {
    Unlink,
    Link { target: Callsign },
}

/// Classifies an inbound header's `urCall` field per `spec.md` §4.5.
pub fn route_header(ur_call: &Callsign) -> Route {
    let bytes = ur_call.as_bytes();

    // "       U": unlink command.
    if &bytes[..7] == b"       " && bytes[7] == b'U' {
        return Route::Command(LinkCommand::Unlink);
    }

    // "xxxxxxZL": link command, last byte 'L', second-last is the module letter.
    if bytes[7] == b'L' {
        let room = std::str::from_utf8(&bytes[..6]).unwrap_or("");
        let target = Callsign::new(room, bytes[6]);
        return Route::Command(LinkCommand::Link { target });
    }

    if bytes[0] == b'/' {
        let mut name = [b' '; crate::callsign::LONG_CALLSIGN_LENGTH];
        name[..7].copy_from_slice(&bytes[1..8]);
        return Route::Direct {
            user_callsign: Callsign::from_bytes(name),
        };
    }

    if ur_call.name() == "CQCQCQ" {
        return Route::ReflectorLink;
    }

    Route::ReflectorLink
}

/// One repeater band's full session state: link state, access control,
/// DTMF/echo subsystems and the current transmission's peer set.
pub struct RepeaterHandler {
    pub band_callsign: Callsign,
    pub state: BandState,
    pub reconnect_policy: ReconnectPolicy,
    pub retry_count: u32,
    pub access: AccessControl,
    pub dtmf: Dtmf,
    pub echo: EchoPlayer,
    pub peer_set: HashSet<Ipv4Addr>,
    watchdog: Timer,
    retry_timer: Timer,
    silence_timer: Timer,
}

/// The transmission-end / inactivity watchdog duration (`spec.md` §3, §4.5).
const WATCHDOG: Duration = Duration::from_secs(2);
/// Link-ack timeout before a `Linking` state fails over (`spec.md` §4.5).
const LINK_TIMEOUT: Duration = Duration::from_secs(10);
/// Silence duration that triggers a passive `Fixed`-policy relink attempt.
const RELINK_SILENCE: Duration = Duration::from_secs(25);

impl RepeaterHandler {
    pub fn new(band_callsign: Callsign, reconnect_policy: ReconnectPolicy) -> Self {
        Self {
            band_callsign,
            state: BandState::Idle,
            reconnect_policy,
            retry_count: 0,
            access: AccessControl::new(),
            dtmf: Dtmf::new(),
            echo: EchoPlayer::new(),
            peer_set: HashSet::new(),
            watchdog: Timer::new(),
            retry_timer: Timer::new(),
            silence_timer: Timer::new(),
        }
    }

    /// Header arrives from the radio. Evaluates access control and the
    /// routing rule, then transitions per `spec.md` §4.5's table.
    pub fn on_radio_header(&mut self, stream_id: u16, ur_call: Callsign, caller: Callsign) -> HeaderOutcome {
        match self.access.evaluate(&caller) {
            AccessVerdict::Deny => return HeaderOutcome::Denied,
            AccessVerdict::RestrictOutbound | AccessVerdict::Allow => {}
        }

        let route = route_header(&ur_call);
        self.watchdog.start(WATCHDOG);

        match route {
            Route::Command(command) => self.on_link_command(command),
            Route::Direct { user_callsign } => {
                self.state = BandState::Receiving { stream_id };
                HeaderOutcome::DirectRoute { user_callsign }
            }
            Route::ReflectorLink => {
                self.state = BandState::Receiving { stream_id };
                let restricted = matches!(self.access.evaluate(&caller), AccessVerdict::RestrictOutbound);
                HeaderOutcome::ForwardToReflector { restricted }
            }
        }
    }

    /// Header arrives from the net addressed to our repeater: begins a
    /// `Transmitting` (net -> radio) session.
    pub fn on_net_header(&mut self, stream_id: u16) {
        self.watchdog.start(WATCHDOG);
        self.state = BandState::Transmitting { stream_id };
    }

    /// Data frame kicks the inactivity watchdog.
    pub fn kick_watchdog(&mut self) {
        self.watchdog.restart();
    }

    /// Advances per-band timers at the gateway's 1 ms tick; returns actions
    /// the owning gateway thread should take this tick.
    pub fn clock(&mut self, dt: Duration) -> Vec<RepeaterAction> {
        let mut actions = Vec::new();

        self.watchdog.clock(dt);
        if self.watchdog.expired() && matches!(self.state, BandState::Receiving { .. } | BandState::Transmitting { .. })
        {
            self.state = BandState::Idle;
            self.watchdog.stop();
            actions.push(RepeaterAction::EndTransmission);
        }

        if let BandState::Linking { target } = self.state {
            self.retry_timer.clock(dt);
            if self.retry_timer.expired() {
                self.state = BandState::Failed { target };
                self.schedule_retry(&mut actions, target);
            }
        }

        if let BandState::Failed { target } = self.state {
            self.retry_timer.clock(dt);
            if self.retry_timer.expired() {
                self.state = BandState::Linking { target };
                self.retry_timer.start(LINK_TIMEOUT);
                actions.push(RepeaterAction::SendLink { target });
            }
        }

        if let BandState::Linked { target } = self.state {
            self.silence_timer.clock(dt);
            if self.silence_timer.expired() && self.reconnect_policy == ReconnectPolicy::Fixed {
                self.state = BandState::Relinking { target };
                actions.push(RepeaterAction::Relinking { target });
                actions.push(RepeaterAction::SendUnlink { target });
                actions.push(RepeaterAction::SendLink { target });
            }
        }

        actions
    }

    fn schedule_retry(&mut self, actions: &mut Vec<RepeaterAction>, target: Callsign) {
        match self.reconnect_policy {
            ReconnectPolicy::Never => {}
            ReconnectPolicy::Fixed => {
                self.retry_timer.start(Duration::from_secs(60));
            }
            ReconnectPolicy::After(minutes) => {
                self.retry_timer.start(minutes.as_duration());
            }
        }
        actions.push(RepeaterAction::LinkFailed { target });
    }

    /// Reflector confirms the link.
    pub fn on_linked_ok(&mut self, target: Callsign) {
        if matches!(self.state, BandState::Linking { .. } | BandState::Relinking { .. }) {
            self.state = BandState::Linked { target };
            self.retry_count = 0;
            self.retry_timer.stop();
            self.silence_timer.start(RELINK_SILENCE);
        }
    }

    /// Applies a link-control command to the band state, per `spec.md`
    /// §4.5's transition table. Shared by the `urCall` routing rule
    /// ([`Self::on_radio_header`]) and DTMF-completed commands, so both
    /// input paths drive the same `Linking`/`Idle` transition.
    pub fn on_link_command(&mut self, command: LinkCommand) -> HeaderOutcome {
        match command {
            LinkCommand::Unlink => {
                let previous = self.current_target();
                self.state = BandState::Idle;
                self.peer_set.clear();
                HeaderOutcome::Unlink { previous }
            }
            LinkCommand::Link { target } => {
                let previous = self.current_target();
                self.state = BandState::Linking { target };
                self.retry_timer.start(LINK_TIMEOUT);
                HeaderOutcome::Link { previous, target }
            }
        }
    }

    pub fn current_target(&self) -> Option<Callsign> {
        match self.state {
            BandState::Linking { target }
            | BandState::Linked { target }
            | BandState::Relinking { target }
            | BandState::Failed { target } => Some(target),
            _ => None,
        }
    }

    pub fn is_linked(&self) -> bool {
        matches!(self.state, BandState::Linked { .. })
    }
}

/// Outcome of processing a header from the radio, for the gateway thread to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderOutcome {
    Denied,
    Unlink { previous: Option<Callsign> },
    Link { previous: Option<Callsign>, target: Callsign },
    DirectRoute { user_callsign: Callsign },
    ForwardToReflector { restricted: bool },
}

/// An action the owning gateway thread must carry out as a result of a
/// per-tick state transition (distinct from the synchronous return of
/// `on_radio_header`, which models gateway-thread-internal dispatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeaterAction {
    EndTransmission,
    SendLink { target: Callsign },
    SendUnlink { target: Callsign },
    LinkFailed { target: Callsign },
    /// Passive keepalive failure: `Linked` -> `Relinking` (`spec.md` §4.5's
    /// last transition row), distinct from [`RepeaterAction::LinkFailed`]
    /// which marks a `Linking` attempt giving up after its ack timeout.
    Relinking { target: Callsign },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cs(name: &str) -> Callsign {
        Callsign::from_str_padded(name)
    }

    #[test]
    fn unlink_urcall_routes_to_command() {
        let ur = cs("       U");
        assert_eq!(route_header(&ur), Route::Command(LinkCommand::Unlink));
    }

    #[test]
    fn direct_slash_routes_to_direct_route() {
        let mut bytes = [b' '; 8];
        bytes[0] = b'/';
        bytes[1..7].copy_from_slice(b"F4FXL ");
        let ur = Callsign::from_bytes(bytes);
        match route_header(&ur) {
            Route::Direct { user_callsign } => assert_eq!(user_callsign.name(), "F4FXL"),
            other => panic!("expected Direct route, got {other:?}"),
        }
    }

    #[test]
    fn cqcqcq_routes_to_reflector_link() {
        let ur = cs("CQCQCQ ");
        assert_eq!(route_header(&ur), Route::ReflectorLink);
    }

    #[test]
    fn link_urcall_extracts_room_and_module_separately() {
        let ur = cs("DCS018DL");
        match route_header(&ur) {
            Route::Command(LinkCommand::Link { target }) => {
                assert_eq!(target.name(), "DCS018");
                assert_eq!(target.module(), b'D');
            }
            other => panic!("expected Link command, got {other:?}"),
        }
    }

    #[test]
    fn unlink_via_urcall_ends_link_scenario() {
        let mut rh = RepeaterHandler::new(Callsign::gateway("W1ABC"), ReconnectPolicy::Fixed);
        rh.state = BandState::Linked {
            target: Callsign::new("XRF012", b'A'),
        };
        let outcome = rh.on_radio_header(1, cs("       U"), cs("F4FXL  "));
        assert_eq!(
            outcome,
            HeaderOutcome::Unlink {
                previous: Some(Callsign::new("XRF012", b'A'))
            }
        );
        assert_eq!(rh.state, BandState::Idle);
    }

    #[test]
    fn denied_caller_is_rejected_before_routing() {
        let mut rh = RepeaterHandler::new(Callsign::gateway("W1ABC"), ReconnectPolicy::Never);
        rh.access.blacklist = {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("bl.txt");
            std::fs::write(&path, "F4FXL\n").unwrap();
            crate::callsign::CallsignSet::load(&path).unwrap()
        };
        let outcome = rh.on_radio_header(1, cs("CQCQCQ "), cs("F4FXL  "));
        assert_eq!(outcome, HeaderOutcome::Denied);
    }

    #[test]
    fn linking_times_out_to_failed_and_schedules_retry() {
        let mut rh = RepeaterHandler::new(
            Callsign::gateway("W1ABC"),
            ReconnectPolicy::After(ReconnectMinutes::M5),
        );
        let target = Callsign::new("XRF012", b'A');
        rh.state = BandState::Linking { target };
        rh.retry_timer.start(LINK_TIMEOUT);

        let actions = rh.clock(LINK_TIMEOUT);
        assert!(actions.iter().any(|a| matches!(a, RepeaterAction::LinkFailed { .. })));
        assert_eq!(rh.state, BandState::Failed { target });
    }

    #[test]
    fn passive_silence_on_fixed_policy_emits_relinking_then_unlink_and_link() {
        let mut rh = RepeaterHandler::new(Callsign::gateway("W1ABC"), ReconnectPolicy::Fixed);
        let target = Callsign::new("XRF012", b'A');
        rh.state = BandState::Linked { target };
        rh.silence_timer.start(RELINK_SILENCE);

        let actions = rh.clock(RELINK_SILENCE);
        assert_eq!(
            actions,
            vec![
                RepeaterAction::Relinking { target },
                RepeaterAction::SendUnlink { target },
                RepeaterAction::SendLink { target },
            ]
        );
        assert_eq!(rh.state, BandState::Relinking { target });
    }

    #[test]
    fn linked_only_reachable_after_ack() {
        let mut rh = RepeaterHandler::new(Callsign::gateway("W1ABC"), ReconnectPolicy::Fixed);
        let target = Callsign::new("XRF012", b'A');
        rh.state = BandState::Linking { target };
        rh.on_linked_ok(target);
        assert_eq!(rh.state, BandState::Linked { target });
    }
}
