// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gateway error taxonomy.
//!
//! Every fallible path in the gateway resolves to one of these variants;
//! `main.rs` maps them to the process exit codes documented in the
//! configuration/CLI contract.

use thiserror::Error;

/// Top-level gateway error.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("configuration error: {0}")]
    ConfigInvalid(String),

    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("malformed protocol frame from {peer}: {reason}")]
    ProtocolMalformed { peer: String, reason: String },

    #[error("could not resolve callsign {0}")]
    ResolutionFailed(String),

    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("INI error: {0}")]
    Ini(#[from] ini::Error),
}

impl GatewayError {
    /// Maps a gateway error to the process exit code documented in `spec.md` §6.
    ///
    /// `ConfigInvalid` exits 1 (startup failure); everything else that makes
    /// it all the way to `main` is treated as an unhandled exception (exit 2).
    /// `Fatal` is reserved for the signal handler path and exits 3.
    pub fn exit_code(&self) -> i32 {
        match self {
            GatewayError::ConfigInvalid(_) => 1,
            GatewayError::Fatal(_) => 3,
            _ => 2,
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
