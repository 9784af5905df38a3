// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CLI entry point: loads configuration, starts logging, installs the
//! signal handlers and the gateway thread, and maps errors and panics onto
//! the documented process exit codes (0 clean shutdown, 1 configuration
//! error, 2 unhandled runtime error, 3 fatal/signal-path failure).

use clap::Parser;
use dstar_gateway::config::GatewayConfig;
use dstar_gateway::{gateway, logging, signals, GatewayError};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// D-STAR reflector gateway.
#[derive(Parser, Debug)]
#[command(name = "dstar-gateway", version, about)]
struct Cli {
    /// Path to the gateway's INI configuration file.
    config: PathBuf,
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        error!(%info, "unhandled panic, exiting");
        default_hook(info);
        std::process::exit(GatewayError::Fatal(info.to_string()).exit_code());
    }));
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Configuration must load before `tracing` is initialized: its
    // `DisplayLevel` setting picks the filter `logging::init` installs, and
    // the global subscriber can only be set once.
    let config = match GatewayConfig::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("configuration load failed ({}): {e}", cli.config.display());
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    logging::init(config.log.display_level);
    install_panic_hook();

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "failed to start async runtime");
            return ExitCode::from(2);
        }
    };

    runtime.block_on(run(config))
}

async fn run(config: GatewayConfig) -> ExitCode {
    info!(callsign = %config.general.callsign, repeaters = config.repeaters.len(), "dstar-gateway starting");

    let shutdown = signals::ShutdownFlag::new();
    let signal_rx = signals::spawn(shutdown.clone());

    match gateway::run(config, shutdown, signal_rx).await {
        Ok(()) => {
            info!("dstar-gateway shut down cleanly");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "dstar-gateway exiting on error");
            ExitCode::from(e.exit_code() as u8)
        }
    }
}
