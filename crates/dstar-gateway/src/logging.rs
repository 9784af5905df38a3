// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Repeat-suppressing log output (`spec.md` §5: "log targets ... with
//! repeat-suppression: identical consecutive messages suppressed after N
//! repeats and summarised on the next distinct message").
//!
//! Grounded on `crates/hdds/src/logging/output.rs`'s `Output` trait
//! (`ConsoleOutput`/`FileOutput`, ordered `LogLevel`): day-to-day logging in
//! this binary runs on `tracing`/`tracing-subscriber` like every other
//! crate in this workspace, with a [`RepeatSuppressor`] deciding, per
//! formatted line, whether to emit it, drop it, or emit a summary line
//! first — wired into `tracing_subscriber::fmt`'s writer via
//! [`RepeatSuppressingMakeWriter`].

use std::io::{self, Write};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// Decides what to do with each incoming line: emit as-is, suppress, or
/// emit a "repeated N times" summary followed by the new line.
#[derive(Default)]
struct RepeatSuppressor {
    last_line: String,
    repeat_count: u32,
}

enum Decision {
    Emit,
    EmitWithSummary(u32),
    Suppress,
}

impl RepeatSuppressor {
    fn next(&mut self, line: &str) -> Decision {
        if line == self.last_line && !self.last_line.is_empty() {
            self.repeat_count += 1;
            return Decision::Suppress;
        }

        let previous_repeats = self.repeat_count;
        self.last_line = line.to_string();
        self.repeat_count = 0;

        if previous_repeats > 0 {
            Decision::EmitWithSummary(previous_repeats)
        } else {
            Decision::Emit
        }
    }
}

/// Writer handed to `tracing_subscriber::fmt` that applies repeat
/// suppression before forwarding formatted lines to stderr.
pub struct SuppressingWriter {
    suppressor: Arc<Mutex<RepeatSuppressor>>,
}

impl Write for SuppressingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let line = String::from_utf8_lossy(buf);
        let decision = self.suppressor.lock().unwrap().next(&line);
        match decision {
            Decision::Emit => {
                io::stderr().write_all(buf)?;
            }
            Decision::EmitWithSummary(n) => {
                let summary = format!("(last message repeated {n} times)\n");
                io::stderr().write_all(summary.as_bytes())?;
                io::stderr().write_all(buf)?;
            }
            Decision::Suppress => {}
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()
    }
}

/// `tracing_subscriber::fmt::MakeWriter` that shares one suppression state
/// across every formatted event, regardless of which thread logged it.
#[derive(Clone, Default)]
pub struct RepeatSuppressingMakeWriter {
    suppressor: Arc<Mutex<RepeatSuppressor>>,
}

impl<'a> MakeWriter<'a> for RepeatSuppressingMakeWriter {
    type Writer = SuppressingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        SuppressingWriter {
            suppressor: self.suppressor.clone(),
        }
    }
}

/// Initializes the global `tracing` subscriber with the repeat-suppressing
/// writer, mapping `spec.md` §6's `[Log] DisplayLevel` (0-6) onto a
/// `tracing`/`EnvFilter` directive. `RUST_LOG` overrides when set.
pub fn init(display_level: u32) {
    let level = match display_level {
        0 => "error",
        1 => "warn",
        2 => "info",
        3..=4 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(RepeatSuppressingMakeWriter::default())
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_emits_without_summary() {
        let mut suppressor = RepeatSuppressor::default();
        assert!(matches!(suppressor.next("hello"), Decision::Emit));
    }

    #[test]
    fn repeated_line_is_suppressed() {
        let mut suppressor = RepeatSuppressor::default();
        suppressor.next("hello");
        assert!(matches!(suppressor.next("hello"), Decision::Suppress));
        assert!(matches!(suppressor.next("hello"), Decision::Suppress));
    }

    #[test]
    fn distinct_line_after_repeats_carries_summary_count() {
        let mut suppressor = RepeatSuppressor::default();
        suppressor.next("hello");
        suppressor.next("hello");
        suppressor.next("hello");
        match suppressor.next("world") {
            Decision::EmitWithSummary(n) => assert_eq!(n, 2),
            _ => panic!("expected summary"),
        }
    }
}
