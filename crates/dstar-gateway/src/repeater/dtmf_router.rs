// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bridges a completed [`crate::dtmf::Dtmf`] command into the same
//! [`super::LinkCommand`] the radio-side `urCall` routing rule produces,
//! so both input paths share one state-machine transition.
//!
//! `spec.md` §5 requires DTMF commands to take effect only at transmission
//! end (the handler back in `Idle`); the gateway thread enforces that by
//! calling [`translate_dtmf_command`] only once a transmission has closed.

use crate::callsign::{Callsign, LONG_CALLSIGN_LENGTH};
use crate::repeater::LinkCommand;

/// Converts a completed DTMF command string (`"DCS018DL"`-shaped, or the
/// unlink marker) into the same [`LinkCommand`] the `urCall` grammar produces.
pub fn translate_dtmf_command(command: &str) -> Option<LinkCommand> {
    if command == "U" {
        return Some(LinkCommand::Unlink);
    }
    let bytes = command.as_bytes();
    if bytes.len() != LONG_CALLSIGN_LENGTH || bytes[LONG_CALLSIGN_LENGTH - 1] != b'L' {
        return None;
    }
    let room = std::str::from_utf8(&bytes[..6]).ok()?;
    let module = bytes[6];
    let target = Callsign::new(room, module);
    Some(LinkCommand::Link { target })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translates_dcs_link_command() {
        let cmd = translate_dtmf_command("DCS018DL").unwrap();
        match cmd {
            LinkCommand::Link { target } => {
                assert_eq!(target.name(), "DCS018");
                assert_eq!(target.module(), b'D');
            }
            _ => panic!("expected Link"),
        }
    }

    #[test]
    fn on_link_command_drives_repeater_into_linking() {
        use crate::callsign::Callsign;
        use crate::repeater::{BandState, RepeaterHandler, ReconnectPolicy};

        let mut rh = RepeaterHandler::new(Callsign::gateway("W1ABC"), ReconnectPolicy::Fixed);
        let command = translate_dtmf_command("DCS018DL").unwrap();
        rh.on_link_command(command);

        match rh.state {
            BandState::Linking { target } => {
                assert_eq!(target.name(), "DCS018");
                assert_eq!(target.module(), b'D');
            }
            other => panic!("expected Linking, got {other:?}"),
        }
    }

    #[test]
    fn unlink_marker_translates_to_unlink() {
        assert_eq!(translate_dtmf_command("U"), Some(LinkCommand::Unlink));
    }

    #[test]
    fn malformed_command_returns_none() {
        assert_eq!(translate_dtmf_command("garbage"), None);
    }
}
