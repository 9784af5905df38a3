// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Main DDS sink orchestrator.
//!
//! Connects configuration, field mapping, line protocol generation,
//! and batching into a single entry point.

use crate::buffer::BatchBuffer;
use crate::config::SinkConfig;
use crate::influx::{FieldValue, LineProtocolWriter};
use crate::mapping::FieldMapper;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Default batch size if not configured.
const DEFAULT_BATCH_SIZE: usize = 1000;

/// Default flush interval if not configured (milliseconds).
const DEFAULT_FLUSH_INTERVAL_MS: u64 = 1000;

/// Errors that can occur during sink operations.
#[derive(Debug)]
pub enum SinkError {
    /// The topic has no configured sink mapping.
    UnknownTopic(String),
    /// The sample produced no fields (InfluxDB requires at least one).
    NoFields(String),
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::UnknownTopic(t) => write!(f, "no sink configured for topic: {}", t),
            SinkError::NoFields(t) => {
                write!(f, "sample from topic '{}' produced no fields", t)
            }
        }
    }
}

impl std::error::Error for SinkError {}

/// Rate limiter state for downsampling.
struct RateLimiter {
    /// Minimum interval between samples in nanoseconds.
    min_interval_ns: u64,
    /// Timestamp of the last accepted sample.
    last_sample_ns: u64,
}

impl RateLimiter {
    fn new(samples_per_second: u32) -> Self {
        let min_interval_ns = if samples_per_second == 0 {
            0
        } else {
            1_000_000_000 / samples_per_second as u64
        };
        Self {
            min_interval_ns,
            last_sample_ns: 0,
        }
    }

    /// Check if this sample should be accepted based on rate limiting.
    fn should_accept(&mut self, timestamp_ns: u64) -> bool {
        if self.min_interval_ns == 0 {
            return true;
        }
        if timestamp_ns >= self.last_sample_ns + self.min_interval_ns {
            self.last_sample_ns = timestamp_ns;
            true
        } else {
            false
        }
    }
}

/// DDS-to-InfluxDB sink orchestrator.
///
/// Takes DDS samples (as JSON), maps them to InfluxDB Line Protocol,
/// buffers them, and produces batches ready for transmission.
pub struct DdsSink {
    config: SinkConfig,
    writer: LineProtocolWriter,
    buffers: HashMap<String, BatchBuffer>,
    mappers: HashMap<String, FieldMapper>,
    rate_limiters: HashMap<String, RateLimiter>,
    samples_recorded: u64,
    samples_dropped: u64,
}

impl DdsSink {
    /// Create a new sink from configuration.
    pub fn from_config(config: SinkConfig) -> Self {
        let mut buffers = HashMap::new();
        let mut mappers = HashMap::new();
        let mut rate_limiters = HashMap::new();

        for sink_cfg in &config.sinks {
            let batch_size = sink_cfg.batch_size.unwrap_or(DEFAULT_BATCH_SIZE);
            let flush_ms = sink_cfg.flush_interval_ms.unwrap_or(DEFAULT_FLUSH_INTERVAL_MS);

            buffers.insert(
                sink_cfg.topic.clone(),
                BatchBuffer::new(batch_size, Duration::from_millis(flush_ms)),
            );

            mappers.insert(
                sink_cfg.topic.clone(),
                FieldMapper::new(sink_cfg.tags.clone(), sink_cfg.fields.clone()),
            );

            if let Some(rate) = sink_cfg.sample_rate {
                rate_limiters.insert(sink_cfg.topic.clone(), RateLimiter::new(rate));
            }
        }

        Self {
            config,
            writer: LineProtocolWriter::new(),
            buffers,
            mappers,
            rate_limiters,
            samples_recorded: 0,
            samples_dropped: 0,
        }
    }

    /// Record a single DDS sample from a topic.
    ///
    /// The sample is mapped to Line Protocol, rate-limited if configured,
    /// and added to the appropriate batch buffer.
    ///
    /// Returns `Ok(())` on success. The sample may be silently dropped
    /// if the rate limiter rejects it.
    pub fn record_sample(
        &mut self,
        topic: &str,
        sample: &serde_json::Value,
        timestamp_ns: u64,
    ) -> Result<(), SinkError> {
        // Check rate limiter
        if let Some(limiter) = self.rate_limiters.get_mut(topic) {
            if !limiter.should_accept(timestamp_ns) {
                self.samples_dropped += 1;
                return Ok(());
            }
        }

        // Find the topic config to get the measurement name
        let topic_cfg = self
            .config
            .sinks
            .iter()
            .find(|s| s.topic == topic)
            .ok_or_else(|| SinkError::UnknownTopic(topic.to_string()))?;
        let measurement = topic_cfg.measurement.clone();

        // Map sample to tags + fields
        let mapper = self
            .mappers
            .get(topic)
            .ok_or_else(|| SinkError::UnknownTopic(topic.to_string()))?;
        let (tags, fields) = mapper.map_sample(sample);

        if fields.is_empty() {
            return Err(SinkError::NoFields(topic.to_string()));
        }

        // Build tag refs for the writer
        let tag_refs: Vec<(&str, &str)> = tags
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let field_owned: Vec<(String, FieldValue)> = fields;
        let field_refs: Vec<(&str, FieldValue)> = field_owned
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();

        // Write the point
        self.writer
            .write_point(&measurement, &tag_refs, &field_refs, timestamp_ns);

        // Move the line to the topic buffer
        let lines = self.writer.flush();
        if let Some(buffer) = self.buffers.get_mut(topic) {
            for line in lines {
                buffer.add(line);
            }
        }

        self.samples_recorded += 1;
        Ok(())
    }

    /// Flush all topic buffers, returning all pending Line Protocol lines.
    pub fn flush_all(&mut self) -> Vec<String> {
        let mut all_lines = Vec::new();

        for buffer in self.buffers.values_mut() {
            all_lines.extend(buffer.flush());
        }

        // Also flush the writer in case there are orphaned lines
        all_lines.extend(self.writer.flush());

        all_lines
    }

    /// Get the total number of samples successfully recorded.
    pub fn samples_recorded(&self) -> u64 {
        self.samples_recorded
    }

    /// Get the total number of samples dropped (rate-limited).
    pub fn samples_dropped(&self) -> u64 {
        self.samples_dropped
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &SinkConfig {
        &self.config
    }
}
