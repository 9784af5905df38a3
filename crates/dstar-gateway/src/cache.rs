// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Host directory cache: gateway callsign -> address/dialect, lock-free reads.
//!
//! Mirrors the "single writer, many wait-free readers" shape `crates/hdds`
//! uses `arc-swap` for elsewhere in this workspace: the whole map is
//! replaced as one immutable snapshot on every update, and a
//! `parking_lot::Mutex` write token serializes concurrent writers without
//! ever blocking a reader.

use crate::callsign::Callsign;
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// The four reflector protocol dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    DExtra,
    DPlus,
    Dcs,
    DPlusRouted,
}

/// Where a [`GatewayRecord`] was learned from. Used to resolve update conflicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Source {
    /// Lowest priority: learned dynamically (e.g. a transient route).
    Dynamic,
    /// Learned from the IRCDDB directory client.
    Ircddb,
    /// Highest priority: loaded from a static hosts file / JSON feed.
    HostsFile,
}

#[derive(Debug, Clone)]
pub struct GatewayRecord {
    pub callsign: Callsign,
    pub address: Ipv4Addr,
    pub dialect: Dialect,
    pub locked: bool,
    pub source: Source,
}

/// Result of an [`Cache::update_gateway`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Inserted,
    Updated,
    Rejected,
}

/// Host directory cache. Readers call [`Cache::lookup`] without ever blocking;
/// writers serialize through an internal token and swap in a full snapshot.
#[derive(Default)]
pub struct Cache {
    snapshot: ArcSwap<HashMap<Callsign, GatewayRecord>>,
    writer_token: Mutex<()>,
}

impl Cache {
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(HashMap::new()),
            writer_token: Mutex::new(()),
        }
    }

    /// Wait-free lookup of a gateway callsign.
    pub fn lookup(&self, callsign: &Callsign) -> Option<GatewayRecord> {
        self.snapshot.load().get(callsign).cloned()
    }

    /// Inserts or updates a gateway record.
    ///
    /// A `locked=true` record from a static source is never overwritten by a
    /// non-locked update; otherwise the update with equal-or-higher source
    /// priority wins (`HostsFile` > `IRCDDB` > `Dynamic`).
    pub fn update_gateway(
        &self,
        callsign: Callsign,
        address: Ipv4Addr,
        dialect: Dialect,
        locked: bool,
        source: Source,
    ) -> UpdateOutcome {
        let _guard = self.writer_token.lock();
        let current = self.snapshot.load();

        if let Some(existing) = current.get(&callsign) {
            if existing.locked && (!locked || source < existing.source) {
                return UpdateOutcome::Rejected;
            }
            if !existing.locked && source < existing.source {
                return UpdateOutcome::Rejected;
            }
        }

        let outcome = if current.contains_key(&callsign) {
            UpdateOutcome::Updated
        } else {
            UpdateOutcome::Inserted
        };

        let mut next = (**current).clone();
        next.insert(
            callsign,
            GatewayRecord {
                callsign,
                address,
                dialect,
                locked,
                source,
            },
        );
        self.snapshot.store(Arc::new(next));
        outcome
    }

    /// Removes every record from the given source, e.g. before a bulk reload.
    pub fn clear_source(&self, source: Source) {
        let _guard = self.writer_token.lock();
        let current = self.snapshot.load();
        let next: HashMap<Callsign, GatewayRecord> = (**current)
            .iter()
            .filter(|(_, rec)| rec.source != source)
            .map(|(k, v)| (*k, v.clone()))
            .collect();
        self.snapshot.store(Arc::new(next));
    }

    pub fn len(&self) -> usize {
        self.snapshot.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gw(name: &str) -> Callsign {
        Callsign::gateway(name)
    }

    #[test]
    fn insert_then_update_same_source() {
        let cache = Cache::new();
        let cs = gw("REF001");
        let addr = Ipv4Addr::new(127, 0, 0, 1);
        assert_eq!(
            cache.update_gateway(cs, addr, Dialect::DPlus, true, Source::HostsFile),
            UpdateOutcome::Inserted
        );
        assert_eq!(
            cache.update_gateway(cs, addr, Dialect::DPlus, true, Source::HostsFile),
            UpdateOutcome::Updated
        );
        assert_eq!(cache.lookup(&cs).unwrap().address, addr);
    }

    #[test]
    fn locked_static_record_rejects_dynamic_overwrite() {
        let cache = Cache::new();
        let cs = gw("REF001");
        cache.update_gateway(
            cs,
            Ipv4Addr::new(1, 2, 3, 4),
            Dialect::DPlus,
            true,
            Source::HostsFile,
        );
        let outcome = cache.update_gateway(
            cs,
            Ipv4Addr::new(9, 9, 9, 9),
            Dialect::DPlus,
            false,
            Source::Dynamic,
        );
        assert_eq!(outcome, UpdateOutcome::Rejected);
        assert_eq!(cache.lookup(&cs).unwrap().address, Ipv4Addr::new(1, 2, 3, 4));
    }

    #[test]
    fn non_locked_record_overwritten_by_higher_priority_source() {
        let cache = Cache::new();
        let cs = gw("FR1ZAB");
        cache.update_gateway(
            cs,
            Ipv4Addr::new(1, 1, 1, 1),
            Dialect::DPlus,
            false,
            Source::Dynamic,
        );
        let outcome = cache.update_gateway(
            cs,
            Ipv4Addr::new(2, 2, 2, 2),
            Dialect::DPlus,
            false,
            Source::Ircddb,
        );
        assert_eq!(outcome, UpdateOutcome::Updated);
        assert_eq!(cache.lookup(&cs).unwrap().address, Ipv4Addr::new(2, 2, 2, 2));
    }

    #[test]
    fn non_locked_record_rejects_lower_priority_source() {
        let cache = Cache::new();
        let cs = gw("FR1ZAB");
        cache.update_gateway(
            cs,
            Ipv4Addr::new(2, 2, 2, 2),
            Dialect::DPlus,
            false,
            Source::Ircddb,
        );
        let outcome = cache.update_gateway(
            cs,
            Ipv4Addr::new(1, 1, 1, 1),
            Dialect::DPlus,
            false,
            Source::Dynamic,
        );
        assert_eq!(outcome, UpdateOutcome::Rejected);
    }

    #[test]
    fn clear_source_removes_only_matching_entries() {
        let cache = Cache::new();
        cache.update_gateway(
            gw("REF001"),
            Ipv4Addr::new(1, 1, 1, 1),
            Dialect::DPlus,
            true,
            Source::HostsFile,
        );
        cache.update_gateway(
            gw("FR1ZAB"),
            Ipv4Addr::new(2, 2, 2, 2),
            Dialect::DPlus,
            false,
            Source::Ircddb,
        );
        cache.clear_source(Source::HostsFile);
        assert!(cache.lookup(&gw("REF001")).is_none());
        assert!(cache.lookup(&gw("FR1ZAB")).is_some());
    }
}
