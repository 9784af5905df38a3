// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The gateway: wires every subsystem together and owns the per-band
//! event loops (`spec.md` §2's component list, §4.6's orchestration rule,
//! §5's cancellation model).
//!
//! One task per configured repeater band, grounded on
//! `hdds-discovery-server::DiscoveryServer`'s one-task-per-connection shape
//! and its `running`/`shutdown` pair: each band task selects over its radio
//! socket, its current reflector socket (if linked), and a 1 ms
//! [`tokio::time::interval`] that drives every [`crate::timer::Timer`] in
//! that band, checking [`ShutdownFlag::is_set`] on every iteration so a
//! SIGTERM/SIGINT is observed within one tick.

use crate::aprs::AprsSender;
use crate::cache::{Cache, Dialect as CacheDialect, Source};
use crate::callsign::Callsign;
use crate::config::{GatewayConfig, RepeaterConfig, RepeaterLinkType};
use crate::error::Result;
use crate::hosts::{DialectsEnabled, HostsFilesManager};
use crate::ircddb::{IrcDdbClient, IrcDdbMultiClient};
use crate::mqtt::{FailedPayload, LinkingPayload, MqttPublisher, MqttSettings, RelinkingPayload, StatusPayload, UnlinkedPayload};
use crate::reflector::dialect::DialectKind;
use crate::reflector::ReflectorHandler;
use crate::repeater::link::{DummyLink, HomebrewLink, IcomLink, RadioEvent, RepeaterLink};
use crate::repeater::{HeaderOutcome, RepeaterAction, RepeaterHandler};
use crate::signals::{ShutdownFlag, SignalEvent};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Advances every per-band [`crate::timer::Timer`]; matches the 1 ms
/// granularity `spec.md` §4.6 names for watchdogs and keepalives.
const TICK: Duration = Duration::from_millis(1);

fn dialect_kind_for(dialect: CacheDialect) -> DialectKind {
    match dialect {
        CacheDialect::DExtra => DialectKind::DExtra,
        CacheDialect::DPlus | CacheDialect::DPlusRouted => DialectKind::DPlus,
        CacheDialect::Dcs => DialectKind::Dcs,
    }
}

/// Builds every shared subsystem from a validated configuration and runs
/// each repeater band until `shutdown` is observed. Returns once every band
/// task has wound down cleanly.
pub async fn run(config: GatewayConfig, shutdown: ShutdownFlag, mut signals: mpsc::UnboundedReceiver<SignalEvent>) -> Result<()> {
    let cache = Arc::new(Cache::new());

    let enabled = DialectsEnabled {
        dplus: config.dplus.enabled,
        dextra: config.dextra.enabled,
        dcs: config.dcs.enabled,
        xlx: config.xlx.enabled,
    };
    let mut hosts = HostsFilesManager::new(
        cache.clone(),
        config.hosts_files.hosts_files.clone(),
        Some(config.hosts_files.custom_hosts_files.clone()),
        enabled,
        Duration::from_secs(config.hosts_files.reload_time_hours as u64 * 3600),
    );
    let initial = hosts.reload();
    info!(?initial, "initial hosts directory load complete");

    let ircddb_backends: Vec<Arc<IrcDdbClient>> = config
        .ircddb
        .iter()
        .map(|b| {
            IrcDdbClient::spawn(
                b.hostname.clone(),
                6667,
                b.username.clone(),
                b.password.clone(),
                cache.clone(),
            )
        })
        .collect();
    let ircddb = Arc::new(IrcDdbMultiClient::new(ircddb_backends));

    let mqtt = Arc::new(MqttPublisher::connect(&MqttSettings {
        address: config.mqtt.address.clone(),
        port: config.mqtt.port,
        keepalive: Duration::from_secs(config.mqtt.keepalive_secs as u64),
        username: config.mqtt.authenticate.then(|| config.mqtt.username.clone()),
        password: config.mqtt.authenticate.then(|| config.mqtt.password.clone()),
        client_name: config.mqtt.name.clone(),
    }));

    let aprs = config
        .aprs
        .enabled
        .then(|| crate::aprs::spawn(mqtt.clone(), &config.general.callsign));

    let mut band_handles = Vec::new();
    for repeater_config in &config.repeaters {
        let band = Band::build(repeater_config, &config, cache.clone(), ircddb.clone(), mqtt.clone(), aprs.clone()).await?;
        let band_shutdown = shutdown.clone();
        band_handles.push(tokio::spawn(async move { band.run(band_shutdown).await }));
    }

    // Coarse tick for the hosts-file reload schedule; the reload interval
    // itself is hours-scale, so a 60 s granularity is plenty.
    let mut hosts_ticker = tokio::time::interval(Duration::from_secs(60));

    loop {
        if shutdown.is_set() {
            break;
        }
        tokio::select! {
            signal = signals.recv() => {
                match signal {
                    Some(SignalEvent::Shutdown) | None => break,
                    Some(SignalEvent::ReloadHosts) => {
                        let counts = hosts.reload();
                        info!(?counts, "hosts directory reloaded on SIGUSR1");
                    }
                }
            }
            _ = hosts_ticker.tick() => {
                if let Some(counts) = hosts.clock(Duration::from_secs(60)) {
                    info!(?counts, "hosts directory reloaded on schedule");
                }
            }
        }
    }

    for handle in band_handles {
        if let Err(e) = handle.await {
            warn!(error = %e, "band task ended abnormally");
        }
    }

    Ok(())
}

/// Owned state and sockets for one configured repeater band.
struct Band {
    repeater: RepeaterHandler,
    radio: Box<dyn RepeaterLink>,
    reflector: Option<ReflectorHandler>,
    cache: Arc<Cache>,
    ircddb: Arc<IrcDdbMultiClient>,
    mqtt: Arc<MqttPublisher>,
    aprs: Option<AprsSender>,
    repeater_name: String,
    band_letter: char,
    reflector_bind_addr: SocketAddr,
}

impl Band {
    async fn build(
        cfg: &RepeaterConfig,
        full: &GatewayConfig,
        cache: Arc<Cache>,
        ircddb: Arc<IrcDdbMultiClient>,
        mqtt: Arc<MqttPublisher>,
        aprs: Option<AprsSender>,
    ) -> Result<Self> {
        let band_callsign = Callsign::new(&cfg.callsign, cfg.band as u8);
        let mut repeater = RepeaterHandler::new(band_callsign, cfg.reflector_reconnect);

        if let Some(whitelist) = &full.access_control.whitelist {
            repeater.access.whitelist = crate::callsign::CallsignSet::load(whitelist)?;
        }
        if let Some(blacklist) = &full.access_control.blacklist {
            repeater.access.blacklist = crate::callsign::CallsignSet::load(blacklist)?;
        }
        if let Some(restrict) = &full.access_control.restrict_list {
            repeater.access.restrict = crate::callsign::CallsignSet::load(restrict)?;
        }

        let local: SocketAddr = SocketAddr::new(Ipv4Addr::UNSPECIFIED.into(), 0);
        let peer_addr: Ipv4Addr = crate::config::parse_ipv4(&cfg.address)?;
        let peer = SocketAddr::new(peer_addr.into(), cfg.port);

        let radio: Box<dyn RepeaterLink> = match cfg.link_type {
            RepeaterLinkType::Icom => Box::new(IcomLink::bind(local, peer).await?),
            RepeaterLinkType::Hb => Box::new(HomebrewLink::bind(local, peer).await?),
            RepeaterLinkType::Dummy => Box::new(DummyLink::new()),
        };

        let mut band = Self {
            repeater,
            radio,
            reflector: None,
            cache,
            ircddb,
            mqtt,
            aprs,
            repeater_name: cfg.callsign.clone(),
            band_letter: cfg.band,
            reflector_bind_addr: local,
        };

        if cfg.reflector_at_startup {
            if let Some(name) = &cfg.reflector {
                band.start_link(&Callsign::from_str_padded(name)).await;
            }
        }

        Ok(band)
    }

    /// Runs this band's event loop until `shutdown` is set.
    async fn run(mut self, shutdown: ShutdownFlag) {
        let mut ticker = tokio::time::interval(TICK);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            if shutdown.is_set() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    self.on_tick().await;
                }
                datagram = self.radio.recv_datagram() => {
                    if let Ok(bytes) = datagram {
                        self.on_radio_datagram(&bytes).await;
                    }
                }
                datagram = recv_reflector(&self.reflector) => {
                    if let Ok(bytes) = datagram {
                        self.on_reflector_datagram(&bytes).await;
                    }
                }
            }
        }

        if let Some(reflector) = self.reflector.as_mut() {
            let _ = reflector.unlink().await;
        }
        debug!(repeater = %self.repeater_name, band = self.band_letter, "band task stopped");
    }

    async fn on_tick(&mut self) {
        for action in self.repeater.clock(TICK) {
            self.apply_action(action).await;
        }
        let events = match self.reflector.as_mut() {
            Some(reflector) => reflector.poll(TICK).await,
            None => Vec::new(),
        };
        self.handle_reflector_events(events).await;
    }

    async fn apply_action(&mut self, action: RepeaterAction) {
        match action {
            RepeaterAction::EndTransmission => {
                let _ = self.radio.send_end(0).await;
            }
            RepeaterAction::SendLink { target } => {
                self.start_link(&target).await;
            }
            RepeaterAction::SendUnlink { target } => {
                if let Some(reflector) = self.reflector.as_mut() {
                    let _ = reflector.unlink().await;
                }
                self.mqtt
                    .publish_unlinked(&UnlinkedPayload {
                        repeater: &self.repeater_name,
                        band: self.band_letter,
                        previous_target: Some(target.name()),
                    })
                    .await;
            }
            RepeaterAction::LinkFailed { target } => {
                self.mqtt
                    .publish_failed(&FailedPayload {
                        repeater: &self.repeater_name,
                        band: self.band_letter,
                        target: target.name(),
                        reason: "link ack timed out",
                    })
                    .await;
            }
            RepeaterAction::Relinking { target } => {
                self.mqtt
                    .publish_relinking(&RelinkingPayload {
                        repeater: &self.repeater_name,
                        band: self.band_letter,
                        target: target.name(),
                    })
                    .await;
            }
        }
    }

    /// Resolves `target`'s gateway via the cache (falling back to IRCDDB)
    /// and issues a link request on a freshly bound reflector socket for
    /// its dialect, per `spec.md` §4.3/§4.4.
    async fn start_link(&mut self, target: &Callsign) {
        let gateway_callsign = Callsign::gateway(target.name());
        let record = match self.cache.lookup(&gateway_callsign) {
            Some(r) => Some(r),
            None => self
                .ircddb
                .send_repeater(gateway_callsign)
                .await
                .map(|r| crate::cache::GatewayRecord {
                    callsign: r.gateway_call,
                    address: r.address,
                    dialect: CacheDialect::DPlusRouted,
                    locked: false,
                    source: Source::Ircddb,
                }),
        };

        let Some(record) = record else {
            warn!(target = %target, "could not resolve reflector gateway");
            return;
        };

        let kind = dialect_kind_for(record.dialect);
        let descriptor = crate::reflector::dialect::DialectDescriptor::for_kind(kind);
        let handler = match ReflectorHandler::bind(kind, self.reflector_bind_addr).await {
            Ok(h) => h,
            Err(e) => {
                warn!(error = %e, "failed to bind reflector socket");
                return;
            }
        };
        self.reflector = Some(handler);

        let peer = SocketAddr::new(record.address.into(), descriptor.remote_port);
        if let Some(reflector) = self.reflector.as_mut() {
            if let Err(e) = reflector.link(*target, peer).await {
                warn!(error = %e, "failed to send link request");
                return;
            }
        }

        self.mqtt
            .publish_linking(&LinkingPayload {
                repeater: &self.repeater_name,
                band: self.band_letter,
                target: target.name(),
                dialect: dialect_name(kind),
            })
            .await;
    }

    async fn on_radio_datagram(&mut self, data: &[u8]) {
        let Some(event) = self.radio.decode(data) else {
            return;
        };
        match event {
            RadioEvent::Header { stream_id, header } => {
                self.handle_radio_header(stream_id, &header).await;
            }
            RadioEvent::AmbeData { bytes, .. } => {
                self.repeater.kick_watchdog();
                if bytes.len() == 9 {
                    let mut frame = [0u8; 9];
                    frame.copy_from_slice(&bytes);
                    self.repeater.dtmf.decode(&frame, false);
                }
                if let Some(reflector) = self.reflector.as_mut() {
                    if self.repeater.is_linked() {
                        let _ = reflector.write_data(0, 0, &bytes).await;
                    }
                }
            }
            RadioEvent::End { .. } => {
                self.repeater.kick_watchdog();
                if self.repeater.dtmf.has_command() {
                    let command = self.repeater.dtmf.translate();
                    if let Some(link_command) = crate::repeater::dtmf_router::translate_dtmf_command(&command) {
                        match self.repeater.on_link_command(link_command) {
                            HeaderOutcome::Unlink { previous } => {
                                self.apply_action(RepeaterAction::SendUnlink {
                                    target: previous.unwrap_or(self.repeater.band_callsign),
                                })
                                .await;
                            }
                            HeaderOutcome::Link { target, .. } => {
                                self.start_link(&target).await;
                            }
                            _ => {}
                        }
                    }
                }
                if let Some(reflector) = self.reflector.as_mut() {
                    let _ = reflector.write_end(0).await;
                }
            }
        }
    }

    async fn handle_radio_header(&mut self, stream_id: u16, header: &[u8]) {
        if header.len() < 16 {
            return;
        }
        let mut ur = [0u8; 8];
        ur.copy_from_slice(&header[0..8]);
        let mut my = [0u8; 8];
        my.copy_from_slice(&header[8..16]);
        let ur_call = Callsign::from_bytes(ur);
        let caller = Callsign::from_bytes(my);

        match self.repeater.on_radio_header(stream_id, ur_call, caller) {
            HeaderOutcome::Denied => {}
            HeaderOutcome::Unlink { previous } => {
                self.apply_action(RepeaterAction::SendUnlink {
                    target: previous.unwrap_or(self.repeater.band_callsign),
                })
                .await;
            }
            HeaderOutcome::Link { target, .. } => {
                self.start_link(&target).await;
            }
            HeaderOutcome::DirectRoute { user_callsign } => {
                if let Some(user) = self.ircddb.send_user(user_callsign).await {
                    self.start_link(&Callsign::gateway(user.repeater_call.name())).await;
                }
            }
            HeaderOutcome::ForwardToReflector { .. } => {
                if let Some(reflector) = self.reflector.as_mut() {
                    let _ = reflector.write_header(stream_id, header).await;
                }
            }
        }

        self.mqtt
            .publish_status(&StatusPayload {
                repeater: &self.repeater_name,
                band: self.band_letter,
                state: "Receiving",
                linked_to: self.repeater.current_target().map(|_| "see dstar-gateway/linking"),
                uptime_secs: 0,
            })
            .await;
    }

    async fn on_reflector_datagram(&mut self, data: &[u8]) {
        let events = match self.reflector.as_mut() {
            Some(reflector) => reflector.on_datagram(data),
            None => return,
        };
        self.handle_reflector_events(events).await;
    }

    async fn handle_reflector_events(&mut self, events: Vec<crate::reflector::ReflectorEvent>) {
        for event in events {
            match event {
                crate::reflector::ReflectorEvent::LinkedOk { target } => {
                    self.repeater.on_linked_ok(target);
                }
                crate::reflector::ReflectorEvent::LinkedFail { .. } | crate::reflector::ReflectorEvent::Timeout { .. } => {
                    self.reflector = None;
                }
                crate::reflector::ReflectorEvent::Unlinked { .. } => {
                    self.reflector = None;
                }
                crate::reflector::ReflectorEvent::Header { stream_id, header } => {
                    self.repeater.on_net_header(stream_id);
                    let _ = self.radio.send_header(stream_id, &header).await;
                }
                crate::reflector::ReflectorEvent::AmbeData { stream_id, seq, bytes } => {
                    self.repeater.kick_watchdog();
                    let _ = self.radio.send_data(stream_id, seq, &bytes).await;
                }
            }
        }
    }
}

/// Reads the current reflector socket if one exists; otherwise never
/// resolves, so this branch simply drops out of the `select!` when unlinked.
async fn recv_reflector(reflector: &Option<ReflectorHandler>) -> std::io::Result<Vec<u8>> {
    match reflector {
        Some(r) => r.recv_datagram().await,
        None => std::future::pending().await,
    }
}

fn dialect_name(kind: DialectKind) -> &'static str {
    match kind {
        DialectKind::DExtra => "DExtra",
        DialectKind::DPlus => "DPlus",
        DialectKind::Dcs => "DCS",
        DialectKind::Xlx => "XLX",
    }
}
