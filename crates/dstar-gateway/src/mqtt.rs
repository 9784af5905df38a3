// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! MQTT publisher: the publish-only egress queue named in `spec.md` §2
//! component 10 and §6's topic table.
//!
//! Grounded on `original_source/Common/APRSISHandlerThread.cpp`'s use of a
//! process-wide `CMQTTConnection* m_mqtt` to publish `aprs-gateway/aprs`
//! frames; here that single global is replaced by an owned
//! [`MqttPublisher`] passed by reference, per `spec.md` §9's first design
//! note. Wraps `rumqttc::AsyncClient`, the crate this workspace's
//! `ivmarkov-edge-net` pack member uses for the same publish-only MQTT
//! egress shape (`edge-mqtt`).

use rumqttc::{AsyncClient, MqttOptions, QoS};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

/// MQTT connection settings (`spec.md` §6's `[MQTT]` section).
#[derive(Debug, Clone)]
pub struct MqttSettings {
    pub address: String,
    pub port: u16,
    pub keepalive: Duration,
    pub username: Option<String>,
    pub password: Option<String>,
    pub client_name: String,
}

#[derive(Serialize)]
pub struct StatusPayload<'a> {
    pub repeater: &'a str,
    pub band: char,
    pub state: &'a str,
    pub linked_to: Option<&'a str>,
    pub uptime_secs: u64,
}

#[derive(Serialize)]
pub struct LinkingPayload<'a> {
    pub repeater: &'a str,
    pub band: char,
    pub target: &'a str,
    pub dialect: &'a str,
}

#[derive(Serialize)]
pub struct UnlinkedPayload<'a> {
    pub repeater: &'a str,
    pub band: char,
    pub previous_target: Option<&'a str>,
}

#[derive(Serialize)]
pub struct FailedPayload<'a> {
    pub repeater: &'a str,
    pub band: char,
    pub target: &'a str,
    pub reason: &'a str,
}

#[derive(Serialize)]
pub struct RelinkingPayload<'a> {
    pub repeater: &'a str,
    pub band: char,
    pub target: &'a str,
}

/// Publish-only MQTT client. QoS 0, not retained, matching a best-effort
/// status feed rather than a durable log.
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    /// Connects and spawns the background event-loop task (`rumqttc`
    /// requires the caller to keep driving its `EventLoop` for the
    /// connection and acks to make progress).
    pub fn connect(settings: &MqttSettings) -> Self {
        let mut options = MqttOptions::new(
            settings.client_name.clone(),
            settings.address.clone(),
            settings.port,
        );
        options.set_keep_alive(settings.keepalive);
        if let (Some(user), Some(pass)) = (&settings.username, &settings.password) {
            options.set_credentials(user.clone(), pass.clone());
        }

        let (client, mut event_loop) = AsyncClient::new(options, 64);
        tokio::spawn(async move {
            loop {
                match event_loop.poll().await {
                    Ok(event) => debug!(?event, "mqtt event"),
                    Err(e) => {
                        warn!(error = %e, "mqtt connection error");
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }
        });

        Self { client }
    }

    async fn publish_json<T: Serialize>(&self, topic: &str, payload: &T) {
        match serde_json::to_vec(payload) {
            Ok(bytes) => {
                if let Err(e) = self
                    .client
                    .publish(topic, QoS::AtMostOnce, false, bytes)
                    .await
                {
                    warn!(topic, error = %e, "mqtt publish failed");
                }
            }
            Err(e) => warn!(topic, error = %e, "mqtt payload serialization failed"),
        }
    }

    pub async fn publish_status(&self, payload: &StatusPayload<'_>) {
        self.publish_json("dstar-gateway/status", payload).await;
    }

    pub async fn publish_linking(&self, payload: &LinkingPayload<'_>) {
        self.publish_json("dstar-gateway/linking", payload).await;
    }

    pub async fn publish_unlinked(&self, payload: &UnlinkedPayload<'_>) {
        self.publish_json("dstar-gateway/unlinked", payload).await;
    }

    pub async fn publish_failed(&self, payload: &FailedPayload<'_>) {
        self.publish_json("dstar-gateway/failed", payload).await;
    }

    pub async fn publish_relinking(&self, payload: &RelinkingPayload<'_>) {
        self.publish_json("dstar-gateway/relinking", payload).await;
    }

    /// Publishes a raw APRS frame body to `aprs-gateway/aprs`, matching
    /// `original_source/Common/APRSISHandlerThread.cpp`'s
    /// `m_mqtt->publish("aprs-gateway/aprs", frameStr)`.
    pub async fn publish_aprs_frame(&self, frame_text: &str) {
        if let Err(e) = self
            .client
            .publish("aprs-gateway/aprs", QoS::AtMostOnce, false, frame_text.as_bytes())
            .await
        {
            warn!(error = %e, "mqtt APRS publish failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_payload_serializes_expected_fields() {
        let payload = StatusPayload {
            repeater: "W1ABC",
            band: 'A',
            state: "Linked",
            linked_to: Some("XRF012 A"),
            uptime_secs: 3600,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains("\"repeater\":\"W1ABC\""));
        assert!(json.contains("\"uptime_secs\":3600"));
    }
}
