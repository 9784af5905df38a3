// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fans `sendUser`/`sendRepeater` queries across every configured IRCDDB
//! backend and returns the first authoritative (non-empty address) answer,
//! per `spec.md` §4.3. Backends are queried concurrently via a
//! [`tokio::task::JoinSet`] so the first to answer wins regardless of
//! configuration order; a backend that times out is left in rotation
//! (`IrcDdbClient` tracks its own degraded flag) rather than removed.

use super::client::{IrcDdbClient, RepeaterRecord, UserRecord};
use crate::callsign::Callsign;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Queries every configured IRCDDB backend and merges the answers.
pub struct IrcDdbMultiClient {
    backends: Vec<Arc<IrcDdbClient>>,
}

impl IrcDdbMultiClient {
    pub fn new(backends: Vec<Arc<IrcDdbClient>>) -> Self {
        Self { backends }
    }

    pub fn backend_count(&self) -> usize {
        self.backends.len()
    }

    /// Number of backends whose most recent query timed out.
    pub fn degraded_count(&self) -> usize {
        self.backends.iter().filter(|b| b.is_degraded()).count()
    }

    pub async fn send_user(&self, callsign: Callsign) -> Option<UserRecord> {
        let mut set: JoinSet<Option<UserRecord>> = JoinSet::new();
        for backend in &self.backends {
            let backend = backend.clone();
            set.spawn(async move { backend.send_user(callsign).await });
        }
        while let Some(result) = set.join_next().await {
            if let Ok(Some(record)) = result {
                return Some(record);
            }
        }
        None
    }

    pub async fn send_repeater(&self, repeater: Callsign) -> Option<RepeaterRecord> {
        let mut set: JoinSet<Option<RepeaterRecord>> = JoinSet::new();
        for backend in &self.backends {
            let backend = backend.clone();
            set.spawn(async move { backend.send_repeater(repeater).await });
        }
        while let Some(result) = set.join_next().await {
            if let Ok(Some(record)) = result {
                return Some(record);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;

    #[tokio::test]
    async fn empty_multi_client_resolves_to_none() {
        let multi = IrcDdbMultiClient::new(Vec::new());
        assert_eq!(multi.backend_count(), 0);
        assert!(multi.send_user(Callsign::from_str_padded("F4FXL")).await.is_none());
    }

    #[tokio::test]
    async fn degraded_count_reflects_unreachable_backends() {
        let cache = Arc::new(Cache::new());
        let backend = IrcDdbClient::spawn(
            "203.0.113.1".into(),
            6667,
            "W1ABC  G".into(),
            String::new(),
            cache,
        );
        let multi = IrcDdbMultiClient::new(vec![backend]);
        assert_eq!(multi.degraded_count(), 0);
    }
}
