// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Domain Registry for Intra-Process Auto-Binding
//!
//!
//! This module provides automatic endpoint matching within the same process.
//! When a Reader and Writer share the same (topic, type_id), they are
//! automatically bound for zero-copy intra-process communication.
//!
//! # Architecture
//!
//! ```text
//! DomainRegistry (static global)
//! +-- domains: Mutex<HashMap<DomainId, Weak<DomainState>>>
//!
//! DomainState (one per domain, per process)
//! +-- domain_id: u32
//! +-- endpoints: RwLock<HashMap<MatchKey, Vec<LocalEndpointEntry>>>
//! +-- [strong ref held by Participant]
//!
//! MatchKey
//! +-- topic_name: Arc<str>
//! +-- type_id: TypeId  (MD5-14 or simple hash)
//! ```
//!
//! # Auto-Binding Flow
//!
//! 1. Writer created -> registers in DomainState
//! 2. Reader created -> registers, finds matching Writers, auto-binds
//! 3. Reader destroyed -> unbinds, unregisters
//! 4. Writer destroyed -> unbinds all readers, unregisters
//!
//! # Thread Safety
//!
//! - DomainRegistry: Mutex for domain map access
//! - DomainState.endpoints: RwLock (many readers, few writers)
//! - All operations are lock-free for the data path (only registration/lookup locks)

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, Weak};

use crate::core::discovery::GUID;
use crate::core::rt::{IndexRing, TopicMerger};
use crate::dds::qos::Reliability;

/// Domain ID type (0-232 per DDS spec)
pub type DomainId = u32;

/// Type identifier for matching endpoints
///
/// For intra-process, we use a simple approach:
/// - MD5 hash of type_name (14 bytes, truncated for EquivalenceHash compat)
/// - Stored as [u8; 14] for HashMap key efficiency
///
/// This is simpler than full XTypes TypeIdentifier for intra-process use.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId([u8; 14]);

impl TypeId {
    /// Create TypeId from type name using MD5
    pub fn from_type_name(type_name: &str) -> Self {
        use md5::{Digest, Md5};
        let mut hasher = Md5::new();
        hasher.update(type_name.as_bytes());
        let result = hasher.finalize();
        let mut bytes = [0u8; 14];
        bytes.copy_from_slice(&result[..14]);
        Self(bytes)
    }

    /// Create from raw bytes
    pub const fn from_bytes(bytes: [u8; 14]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes
    pub const fn as_bytes(&self) -> &[u8; 14] {
        &self.0
    }

    /// Zero TypeId (for testing)
    pub const fn zero() -> Self {
        Self([0u8; 14])
    }
}

impl std::fmt::Debug for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TypeId(")?;
        for byte in &self.0[..4] {
            write!(f, "{:02x}", byte)?;
        }
        write!(f, "...)")
    }
}

impl std::fmt::Display for TypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Match key for endpoint lookup
///
/// Two endpoints match if they have the same (topic_name, type_id).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MatchKey {
    /// Topic name
    pub topic_name: Arc<str>,
    /// Type identifier (MD5 of type name)
    pub type_id: TypeId,
}

impl MatchKey {
    /// Create new match key
    pub fn new(topic_name: impl Into<Arc<str>>, type_id: TypeId) -> Self {
        Self {
            topic_name: topic_name.into(),
            type_id,
        }
    }

    /// Create match key from topic and type names
    pub fn from_names(topic_name: &str, type_name: &str) -> Self {
        Self {
            topic_name: Arc::from(topic_name),
            type_id: TypeId::from_type_name(type_name),
        }
    }
}

impl std::fmt::Debug for MatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchKey")
            .field("topic", &self.topic_name)
            .field("type_id", &self.type_id)
            .finish()
    }
}

/// Kind of local endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointKind {
    Reader,
    Writer,
}

/// Local endpoint entry in the registry
pub struct LocalEndpointEntry {
    /// Endpoint GUID
    pub guid: GUID,
    /// Endpoint kind
    pub kind: EndpointKind,
    /// QoS Reliability policy
    pub reliability: Reliability,
    /// TopicMerger (writers only) - used by readers to bind
    pub merger: Option<Arc<TopicMerger>>,
    /// IndexRing (readers only) - receives data from merger
    pub ring: Option<Arc<IndexRing>>,
    /// Callback to bind reader to writer's merger
    ///
    /// For readers: called when a matching writer is found
    /// For writers: None
    pub bind_callback: Option<Box<dyn Fn(Arc<TopicMerger>) + Send + Sync>>,
}

/// Check QoS compatibility between writer and reader
///
/// Per DDS spec:
/// - Reliable writer -> any reader: compatible
/// - BestEffort writer + BestEffort reader: compatible
/// - BestEffort writer + Reliable reader: INCOMPATIBLE
fn qos_compatible(writer_reliability: Reliability, reader_reliability: Reliability) -> bool {
    match (writer_reliability, reader_reliability) {
        (Reliability::Reliable, _) => true,
        (Reliability::BestEffort, Reliability::BestEffort) => true,
        (Reliability::BestEffort, Reliability::Reliable) => false,
    }
}

impl std::fmt::Debug for LocalEndpointEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalEndpointEntry")
            .field("guid", &self.guid)
            .field("kind", &self.kind)
            .field("reliability", &self.reliability)
            .field("has_merger", &self.merger.is_some())
            .field("has_ring", &self.ring.is_some())
            .field("has_bind_callback", &self.bind_callback.is_some())
            .finish()
    }
}

/// Token returned when registering an endpoint
///
/// When dropped, automatically unregisters the endpoint from the domain.
/// This ensures cleanup even on panic/early return.
pub struct BindToken {
    domain: Weak<DomainState>,
    key: MatchKey,
    guid: GUID,
}

impl BindToken {
    /// Create new bind token (internal)
    fn new(domain: &Arc<DomainState>, key: MatchKey, guid: GUID) -> Self {
        Self {
            domain: Arc::downgrade(domain),
            key,
            guid,
        }
    }
}

impl Drop for BindToken {
    fn drop(&mut self) {
        if let Some(domain) = self.domain.upgrade() {
            domain.unregister(&self.key, self.guid);
        }
    }
}

impl std::fmt::Debug for BindToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BindToken")
            .field("key", &self.key)
            .field("guid", &self.guid)
            .finish()
    }
}

/// Domain state - holds all endpoints for a single domain
pub struct DomainState {
    /// Domain ID
    pub domain_id: DomainId,
    /// Endpoints grouped by (topic, type_id)
    endpoints: RwLock<HashMap<MatchKey, Vec<LocalEndpointEntry>>>,
}

impl DomainState {
    /// Create new domain state
    pub fn new(domain_id: DomainId) -> Self {
        Self {
            domain_id,
            endpoints: RwLock::new(HashMap::new()),
        }
    }

    /// Register a writer endpoint
    ///
    /// Returns a BindToken that unregisters on drop.
    /// Also triggers auto-binding with any existing matching readers (QoS compatible only).
    pub fn register_writer(
        self: &Arc<Self>,
        key: MatchKey,
        guid: GUID,
        merger: Arc<TopicMerger>,
        reliability: Reliability,
    ) -> BindToken {
        let mut endpoints = self.endpoints.write().unwrap_or_else(|e| e.into_inner());

        let entry = LocalEndpointEntry {
            guid,
            kind: EndpointKind::Writer,
            reliability,
            merger: Some(merger.clone()),
            ring: None,
            bind_callback: None,
        };

        // Get or create endpoint list for this key
        let entries = endpoints.entry(key.clone()).or_default();

        // Auto-bind: notify all existing QoS-compatible readers about this new writer
        for existing in entries.iter() {
            if existing.kind == EndpointKind::Reader {
                // QoS check: writer reliability must be compatible with reader
                if !qos_compatible(reliability, existing.reliability) {
                    log::debug!(
                        "[DomainRegistry] Skipping bind: writer {:?} incompatible with reader {:?}",
                        reliability,
                        existing.reliability
                    );
                    continue;
                }

                if let Some(ref callback) = existing.bind_callback {
                    log::debug!(
                        "[DomainRegistry] Auto-binding reader {} to new writer {}",
                        existing.guid,
                        guid
                    );
                    callback(merger.clone());
                }
            }
        }

        entries.push(entry);

        BindToken::new(self, key, guid)
    }

    /// Register a reader endpoint
    ///
    /// Returns a BindToken that unregisters on drop.
    /// Also triggers auto-binding with any existing matching writers (QoS compatible only).
    pub fn register_reader<F>(
        self: &Arc<Self>,
        key: MatchKey,
        guid: GUID,
        ring: Arc<IndexRing>,
        reliability: Reliability,
        bind_callback: F,
    ) -> BindToken
    where
        F: Fn(Arc<TopicMerger>) + Send + Sync + 'static,
    {
        let mut endpoints = self.endpoints.write().unwrap_or_else(|e| e.into_inner());

        // Get or create endpoint list for this key
        let entries = endpoints.entry(key.clone()).or_default();

        // Auto-bind: find all existing QoS-compatible writers and bind to them
        for existing in entries.iter() {
            if existing.kind == EndpointKind::Writer {
                // QoS check: writer reliability must be compatible with reader
                if !qos_compatible(existing.reliability, reliability) {
                    log::debug!(
                        "[DomainRegistry] Skipping bind: writer {:?} incompatible with reader {:?}",
                        existing.reliability,
                        reliability
                    );
                    continue;
                }

                if let Some(ref merger) = existing.merger {
                    log::debug!(
                        "[DomainRegistry] Auto-binding new reader {} to writer {}",
                        guid,
                        existing.guid
                    );
                    bind_callback(merger.clone());
                }
            }
        }

        let entry = LocalEndpointEntry {
            guid,
            kind: EndpointKind::Reader,
            reliability,
            merger: None,
            ring: Some(ring),
            bind_callback: Some(Box::new(bind_callback)),
        };

        entries.push(entry);

        BindToken::new(self, key, guid)
    }

    /// Unregister an endpoint (called by BindToken::drop)
    fn unregister(&self, key: &MatchKey, guid: GUID) {
        let mut endpoints = self.endpoints.write().unwrap_or_else(|e| e.into_inner());

        if let Some(entries) = endpoints.get_mut(key) {
            entries.retain(|e| e.guid != guid);

            // Clean up empty entry lists
            if entries.is_empty() {
                endpoints.remove(key);
            }
        }

        log::debug!(
            "[DomainRegistry] Unregistered endpoint {} from topic '{}'",
            guid,
            key.topic_name
        );
    }

    /// Find all writers matching a key
    pub fn find_writers(&self, key: &MatchKey) -> Vec<Arc<TopicMerger>> {
        let endpoints = self.endpoints.read().unwrap_or_else(|e| e.into_inner());

        endpoints
            .get(key)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.kind == EndpointKind::Writer)
                    .filter_map(|e| e.merger.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Find all readers matching a key
    pub fn find_readers(&self, key: &MatchKey) -> Vec<Arc<IndexRing>> {
        let endpoints = self.endpoints.read().unwrap_or_else(|e| e.into_inner());

        endpoints
            .get(key)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.kind == EndpointKind::Reader)
                    .filter_map(|e| e.ring.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Get count of endpoints
    pub fn endpoint_count(&self) -> usize {
        let endpoints = self.endpoints.read().unwrap_or_else(|e| e.into_inner());
        endpoints.values().map(|v| v.len()).sum()
    }

    /// Get count of endpoints for a specific key
    pub fn endpoint_count_for_key(&self, key: &MatchKey) -> usize {
        let endpoints = self.endpoints.read().unwrap_or_else(|e| e.into_inner());
        endpoints.get(key).map(|v| v.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for DomainState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DomainState")
            .field("domain_id", &self.domain_id)
            .field("endpoint_count", &self.endpoint_count())
            .finish()
    }
}

/// Global domain registry (singleton)
///
/// Thread-safe access to domain states across the process.
pub struct DomainRegistry {
    domains: Mutex<HashMap<DomainId, Weak<DomainState>>>,
}

impl DomainRegistry {
    /// Create new registry
    fn new() -> Self {
        Self {
            domains: Mutex::new(HashMap::new()),
        }
    }

    /// Get the global registry instance
    pub fn global() -> &'static DomainRegistry {
        use std::sync::OnceLock;
        static REGISTRY: OnceLock<DomainRegistry> = OnceLock::new();
        REGISTRY.get_or_init(DomainRegistry::new)
    }

    /// Get or create domain state for a domain ID
    ///
    /// Returns an Arc to the DomainState. The caller (Participant) should
    /// hold this Arc to keep the domain alive.
    pub fn get_or_create(&self, domain_id: DomainId) -> Arc<DomainState> {
        let mut domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());

        // Check if domain exists and is still alive
        if let Some(weak) = domains.get(&domain_id) {
            if let Some(strong) = weak.upgrade() {
                return strong;
            }
        }

        // Create new domain state
        let state = Arc::new(DomainState::new(domain_id));
        domains.insert(domain_id, Arc::downgrade(&state));

        log::info!(
            "[DomainRegistry] Created domain state for domain_id={}",
            domain_id
        );

        state
    }

    /// Try to get existing domain state (for testing/debugging)
    pub fn get(&self, domain_id: DomainId) -> Option<Arc<DomainState>> {
        let domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());
        domains.get(&domain_id).and_then(|w| w.upgrade())
    }

    /// Clean up expired domain references (for testing)
    pub fn cleanup_expired(&self) {
        let mut domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());
        domains.retain(|_, weak| weak.strong_count() > 0);
    }

    /// Get count of active domains (for testing)
    pub fn active_domain_count(&self) -> usize {
        let domains = self.domains.lock().unwrap_or_else(|e| e.into_inner());
        domains.values().filter(|w| w.strong_count() > 0).count()
    }
}
