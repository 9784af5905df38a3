// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Access control: whitelist/blacklist/restrict evaluation, `spec.md` §4.5.

use crate::callsign::{Callsign, CallsignSet};

/// Verdict of an access-control check for an inbound transmission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessVerdict {
    /// Transmission proceeds normally.
    Allow,
    /// Transmission is dropped outright (blacklisted, or not whitelisted
    /// when a non-empty whitelist is configured).
    Deny,
    /// Transmission is received but must not be forwarded outbound
    /// (restricted: local playback/echo only).
    RestrictOutbound,
}

/// Three lists gate an inbound transmission: restrict > black > white.
#[derive(Debug, Clone, Default)]
pub struct AccessControl {
    pub whitelist: CallsignSet,
    pub blacklist: CallsignSet,
    pub restrict: CallsignSet,
}

impl AccessControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluates access for `caller` in the documented priority order:
    /// restrict first, then blacklist, then whitelist (only enforced if
    /// the whitelist is non-empty — an empty whitelist means "allow all").
    pub fn evaluate(&self, caller: &Callsign) -> AccessVerdict {
        if self.restrict.contains(caller) {
            return AccessVerdict::RestrictOutbound;
        }
        if self.blacklist.contains(caller) {
            return AccessVerdict::Deny;
        }
        if !self.whitelist.is_empty() && !self.whitelist.contains(caller) {
            return AccessVerdict::Deny;
        }
        AccessVerdict::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_with(calls: &[&str]) -> CallsignSet {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("list.txt");
        std::fs::write(&path, calls.join("\n")).unwrap();
        CallsignSet::load(&path).unwrap()
    }

    #[test]
    fn empty_lists_allow_everything() {
        let ac = AccessControl::new();
        assert_eq!(
            ac.evaluate(&Callsign::from_str_padded("F4FXL")),
            AccessVerdict::Allow
        );
    }

    #[test]
    fn restrict_beats_whitelist_membership() {
        let ac = AccessControl {
            whitelist: set_with(&["F4FXL"]),
            blacklist: CallsignSet::new(),
            restrict: set_with(&["F4FXL"]),
        };
        assert_eq!(
            ac.evaluate(&Callsign::from_str_padded("F4FXL")),
            AccessVerdict::RestrictOutbound
        );
    }

    #[test]
    fn blacklist_denies_even_if_whitelisted() {
        let ac = AccessControl {
            whitelist: set_with(&["F4FXL"]),
            blacklist: set_with(&["F4FXL"]),
            restrict: CallsignSet::new(),
        };
        assert_eq!(
            ac.evaluate(&Callsign::from_str_padded("F4FXL")),
            AccessVerdict::Deny
        );
    }

    #[test]
    fn non_whitelisted_caller_denied_when_whitelist_nonempty() {
        let ac = AccessControl {
            whitelist: set_with(&["G4KLX"]),
            blacklist: CallsignSet::new(),
            restrict: CallsignSet::new(),
        };
        assert_eq!(
            ac.evaluate(&Callsign::from_str_padded("F4FXL")),
            AccessVerdict::Deny
        );
    }
}
