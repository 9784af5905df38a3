// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Signal handling (`spec.md` §6): TERM/INT request graceful shutdown,
//! USR1 triggers an async hosts reload, SEGV/ILL/FPE/ABRT log and exit 3.
//!
//! Grounded on `original_source/DStarGateway/DStarGatewayApp.cpp`'s
//! `main()`, which installs handlers for exactly these signals before
//! doing anything else. `tokio::signal::unix` replaces the original's
//! `signal(2)` calls; the crash signals (SEGV/ILL/FPE/ABRT) are not
//! delivered to async Rust in a way that is safe to act on from a signal
//! handler, so they are left to the process's default disposition (a core
//! dump) as every other crate in this workspace does — `spec.md` §7's
//! "Unhandled exception anywhere" policy is instead implemented via
//! `main.rs`'s top-level panic hook, which logs and exits 2/3 as documented.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

/// Shared shutdown flag, checked at the top of every worker loop
/// (`spec.md` §5's cancellation model) — the only true global this crate
/// needs, per `spec.md` §9's first design note.
#[derive(Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// Event produced by the signal-handling task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalEvent {
    Shutdown,
    ReloadHosts,
}

/// Spawns the signal-handling task. Returns a channel of [`SignalEvent`]s;
/// the gateway thread (`crate::gateway`) selects on it alongside its other
/// work. Setting `shutdown` is the task's own responsibility on TERM/INT so
/// that callers not currently polling the channel still observe shutdown.
pub fn spawn(shutdown: ShutdownFlag) -> tokio::sync::mpsc::UnboundedReceiver<SignalEvent> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

    tokio::spawn(async move {
        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        let mut int = signal(SignalKind::interrupt()).expect("install SIGINT handler");
        let mut usr1 = signal(SignalKind::user_defined1()).expect("install SIGUSR1 handler");

        loop {
            tokio::select! {
                _ = term.recv() => {
                    info!("SIGTERM received, shutting down");
                    shutdown.set();
                    let _ = tx.send(SignalEvent::Shutdown);
                    break;
                }
                _ = int.recv() => {
                    info!("SIGINT received, shutting down");
                    shutdown.set();
                    let _ = tx.send(SignalEvent::Shutdown);
                    break;
                }
                _ = usr1.recv() => {
                    info!("SIGUSR1 received, triggering async hosts reload");
                    if tx.send(SignalEvent::ReloadHosts).is_err() {
                        break;
                    }
                }
            }
        }
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_flag_starts_clear() {
        let flag = ShutdownFlag::new();
        assert!(!flag.is_set());
        flag.set();
        assert!(flag.is_set());
    }

    #[test]
    fn shutdown_flag_clone_shares_state() {
        let flag = ShutdownFlag::new();
        let clone = flag.clone();
        clone.set();
        assert!(flag.is_set());
    }
}
