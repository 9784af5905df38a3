// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! IP change detection trait and types.

use std::io;
use std::net::IpAddr;
use std::time::Instant;

/// Kind of locator change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocatorChangeKind {
    /// A new IP address was added.
    Added,

    /// An IP address was removed.
    Removed,

    /// An IP address was updated (e.g., flags changed).
    Updated,
}

/// A locator change event.
#[derive(Clone, Debug)]
pub struct LocatorChange {
    /// The IP address that changed.
    pub addr: IpAddr,

    /// The interface name.
    pub interface: String,

    /// Kind of change.
    pub kind: LocatorChangeKind,

    /// When the change was detected.
    pub timestamp: Instant,

    /// Additional flags or metadata.
    pub flags: LocatorFlags,
}

impl LocatorChange {
    /// Create a new locator change event.
    pub fn new(addr: IpAddr, interface: String, kind: LocatorChangeKind) -> Self {
        Self {
            addr,
            interface,
            kind,
            timestamp: Instant::now(),
            flags: LocatorFlags::default(),
        }
    }

    /// Create an "added" change.
    pub fn added(addr: IpAddr, interface: String) -> Self {
        Self::new(addr, interface, LocatorChangeKind::Added)
    }

    /// Create a "removed" change.
    pub fn removed(addr: IpAddr, interface: String) -> Self {
        Self::new(addr, interface, LocatorChangeKind::Removed)
    }

    /// Create an "updated" change.
    pub fn updated(addr: IpAddr, interface: String) -> Self {
        Self::new(addr, interface, LocatorChangeKind::Updated)
    }

    /// Set flags.
    pub fn with_flags(mut self, flags: LocatorFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Check if this is an add event.
    pub fn is_add(&self) -> bool {
        self.kind == LocatorChangeKind::Added
    }

    /// Check if this is a remove event.
    pub fn is_remove(&self) -> bool {
        self.kind == LocatorChangeKind::Removed
    }

    /// Get age of this event.
    pub fn age(&self) -> std::time::Duration {
        self.timestamp.elapsed()
    }
}

/// Flags for a locator.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocatorFlags {
    /// Address is temporary (privacy extension).
    pub temporary: bool,

    /// Address is deprecated.
    pub deprecated: bool,

    /// Address is tentative (DAD in progress).
    pub tentative: bool,

    /// Prefix length (CIDR).
    pub prefix_len: u8,

    /// Scope (link, global, etc.).
    pub scope: AddressScope,
}

impl LocatorFlags {
    /// Create flags for a typical global address.
    pub fn global(prefix_len: u8) -> Self {
        Self {
            prefix_len,
            scope: AddressScope::Global,
            ..Default::default()
        }
    }

    /// Create flags for a link-local address.
    pub fn link_local(prefix_len: u8) -> Self {
        Self {
            prefix_len,
            scope: AddressScope::Link,
            ..Default::default()
        }
    }

    /// Check if address is usable (not deprecated/tentative).
    pub fn is_usable(&self) -> bool {
        !self.deprecated && !self.tentative
    }
}

/// Address scope.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AddressScope {
    /// Unknown scope.
    #[default]
    Unknown,

    /// Host-local (loopback).
    Host,

    /// Link-local.
    Link,

    /// Site-local (deprecated).
    Site,

    /// Global scope.
    Global,
}

impl AddressScope {
    /// Check if this scope is routable beyond the link.
    pub fn is_routable(&self) -> bool {
        matches!(self, AddressScope::Site | AddressScope::Global)
    }
}

/// Trait for IP address change detectors.
pub trait IpDetector: Send {
    /// Poll for IP address changes.
    ///
    /// Returns a list of changes since the last poll.
    /// Returns an empty vec if no changes.
    fn poll_changes(&mut self) -> io::Result<Vec<LocatorChange>>;

    /// Get all current IP addresses.
    ///
    /// Returns (address, interface_name) pairs.
    fn current_addresses(&self) -> io::Result<Vec<(IpAddr, String)>>;

    /// Get detector name (for logging/debugging).
    fn name(&self) -> &str;

    /// Check if detector is event-based (non-blocking poll).
    fn is_event_based(&self) -> bool {
        false
    }
}

/// Snapshot of current IP addresses.
#[derive(Clone, Debug)]
pub struct AddressSnapshot {
    /// List of addresses with their interfaces.
    pub addresses: Vec<AddressInfo>,

    /// When snapshot was taken.
    pub timestamp: Instant,
}

impl Default for AddressSnapshot {
    fn default() -> Self {
        Self {
            addresses: Vec::new(),
            timestamp: Instant::now(),
        }
    }
}

impl AddressSnapshot {
    /// Create a new snapshot.
    pub fn new(addresses: Vec<AddressInfo>) -> Self {
        Self {
            addresses,
            timestamp: Instant::now(),
        }
    }

    /// Get addresses as (IpAddr, interface) pairs.
    pub fn as_pairs(&self) -> Vec<(IpAddr, String)> {
        self.addresses
            .iter()
            .map(|a| (a.addr, a.interface.clone()))
            .collect()
    }

    /// Find address by IP.
    pub fn find(&self, addr: &IpAddr) -> Option<&AddressInfo> {
        self.addresses.iter().find(|a| &a.addr == addr)
    }

    /// Check if snapshot contains an address.
    pub fn contains(&self, addr: &IpAddr) -> bool {
        self.addresses.iter().any(|a| &a.addr == addr)
    }

    /// Get addresses on a specific interface.
    pub fn on_interface<'a>(&'a self, interface: &'a str) -> impl Iterator<Item = &'a AddressInfo> {
        self.addresses
            .iter()
            .filter(move |a| a.interface == interface)
    }

    /// Get age of this snapshot.
    pub fn age(&self) -> std::time::Duration {
        self.timestamp.elapsed()
    }
}

/// Information about an IP address.
#[derive(Clone, Debug)]
pub struct AddressInfo {
    /// The IP address.
    pub addr: IpAddr,

    /// Interface name.
    pub interface: String,

    /// Address flags.
    pub flags: LocatorFlags,
}

impl AddressInfo {
    /// Create new address info.
    pub fn new(addr: IpAddr, interface: String) -> Self {
        Self {
            addr,
            interface,
            flags: LocatorFlags::default(),
        }
    }

    /// Create with flags.
    pub fn with_flags(mut self, flags: LocatorFlags) -> Self {
        self.flags = flags;
        self
    }
}
