// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! INI-like configuration loading and validation (`spec.md` §6), grounded
//! section-by-section on `original_source/DStarGateway/DStarGatewayConfig.cpp`.
//!
//! Every option has a documented range and default; out-of-range values
//! produce a [`GatewayError::ConfigInvalid`] naming the offending key and
//! its valid range, per `spec.md` §9's third design note (the original's
//! load-time exceptions become explicit result values here).

use crate::error::GatewayError;
use crate::repeater::ReconnectPolicy;
use ini::Ini;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::warn;

fn invalid(key: &str, detail: impl std::fmt::Display) -> GatewayError {
    GatewayError::ConfigInvalid(format!("{key}: {detail}"))
}

/// Cleans a free-text field to the original's whitelist charset: letters,
/// digits, space, and `.,&*()-+=@/?:;`.
fn clean_text(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || " .,&*()-+=@/?:;".contains(*c))
        .collect()
}

fn get_section<'a>(ini: &'a Ini, names: &[&str]) -> Option<&'a ini::Properties> {
    names.iter().find_map(|n| ini.section(Some(*n)))
}

fn get_str(props: Option<&ini::Properties>, key: &str, default: &str) -> String {
    props
        .and_then(|p| p.get(key))
        .map(str::to_string)
        .unwrap_or_else(|| default.to_string())
}

fn get_bool(props: Option<&ini::Properties>, key: &str, default: bool) -> bool {
    props
        .and_then(|p| p.get(key))
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

fn get_ranged_u32(
    props: Option<&ini::Properties>,
    key: &str,
    default: u32,
    min: u32,
    max: u32,
) -> Result<u32, GatewayError> {
    let Some(raw) = props.and_then(|p| p.get(key)) else {
        return Ok(default);
    };
    let value: u32 = raw
        .parse()
        .map_err(|_| invalid(key, format!("'{raw}' is not an integer")))?;
    if value < min || value > max {
        return Err(invalid(key, format!("{value} out of range {min}..={max}")));
    }
    Ok(value)
}

fn get_ranged_f64(
    props: Option<&ini::Properties>,
    key: &str,
    default: f64,
    min: f64,
    max: f64,
) -> Result<f64, GatewayError> {
    let Some(raw) = props.and_then(|p| p.get(key)) else {
        return Ok(default);
    };
    let value: f64 = raw
        .parse()
        .map_err(|_| invalid(key, format!("'{raw}' is not a number")))?;
    if value < min || value > max {
        return Err(invalid(key, format!("{value} out of range {min}..={max}")));
    }
    Ok(value)
}

fn with_trailing_slash(mut s: String) -> String {
    if !s.ends_with('/') {
        s.push('/');
    }
    s
}

/// `[General]`/`[gateway]`.
#[derive(Debug, Clone)]
pub struct GeneralConfig {
    pub callsign: String,
    pub address: String,
    pub hb_address: String,
    pub hb_port: u16,
    pub icom_address: String,
    pub icom_port: u16,
    pub latitude: f64,
    pub longitude: f64,
    pub description1: String,
    pub description2: String,
    pub url: String,
    pub repeater_type: RepeaterKind,
    pub language: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeaterKind {
    Repeater,
    Hotspot,
}

/// `[Log]`.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub display_level: u32,
    pub mqtt_level: u32,
    pub log_ircddb_traffic: bool,
}

/// `[MQTT]`.
#[derive(Debug, Clone)]
pub struct MqttConfig {
    pub address: String,
    pub port: u16,
    pub keepalive_secs: u32,
    pub authenticate: bool,
    pub username: String,
    pub password: String,
    pub name: String,
}

/// `[Paths]`.
#[derive(Debug, Clone)]
pub struct PathsConfig {
    pub data: PathBuf,
}

/// `[Hosts Files]`.
#[derive(Debug, Clone)]
pub struct HostsFilesConfig {
    pub hosts_files: PathBuf,
    pub custom_hosts_files: PathBuf,
    pub reload_time_hours: u32,
}

/// One `[Repeater N]` entry.
#[derive(Debug, Clone)]
pub struct RepeaterConfig {
    pub band: char,
    pub callsign: String,
    pub address: String,
    pub port: u16,
    pub link_type: RepeaterLinkType,
    pub reflector: Option<String>,
    pub reflector_at_startup: bool,
    pub reflector_reconnect: ReconnectPolicy,
    pub frequency_mhz: f64,
    pub offset_mhz: f64,
    pub range_km: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub agl_m: f64,
    pub description1: String,
    pub description2: String,
    pub url: String,
    pub band1: u8,
    pub band2: u8,
    pub band3: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeaterLinkType {
    Hb,
    Icom,
    Dummy,
}

/// One `[IRCDDB N]` entry.
#[derive(Debug, Clone)]
pub struct IrcDdbConfig {
    pub hostname: String,
    pub username: String,
    pub password: String,
}

/// `[APRS]` (optional).
#[derive(Debug, Clone, Default)]
pub struct AprsConfig {
    pub enabled: bool,
    pub position_source: AprsPositionSource,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AprsPositionSource {
    #[default]
    Fixed,
    Gpsd,
}

/// `[Dextra]`/`[D-Plus]`/`[DCS]`/`[XLX]` (optional).
#[derive(Debug, Clone)]
pub struct DialectConfig {
    pub enabled: bool,
    pub max_dongles: u32,
    pub login: Option<String>,
}

/// `[Remote Commands]` (optional).
#[derive(Debug, Clone, Default)]
pub struct RemoteCommandsConfig {
    pub enabled: bool,
    pub port: u16,
    pub password: String,
}

/// `[Daemon]` (optional).
#[derive(Debug, Clone, Default)]
pub struct DaemonConfig {
    pub daemon: bool,
    pub pid_file: String,
    pub user: String,
}

/// `[Access Control]` (optional).
#[derive(Debug, Clone, Default)]
pub struct AccessControlConfig {
    pub whitelist: Option<PathBuf>,
    pub blacklist: Option<PathBuf>,
    pub restrict_list: Option<PathBuf>,
}

/// `[GPSD]` (optional).
#[derive(Debug, Clone)]
pub struct GpsdConfig {
    pub address: String,
    pub port: String,
}

/// Full validated configuration tree.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub general: GeneralConfig,
    pub log: LogConfig,
    pub mqtt: MqttConfig,
    pub paths: PathsConfig,
    pub hosts_files: HostsFilesConfig,
    pub repeaters: Vec<RepeaterConfig>,
    pub ircddb: Vec<IrcDdbConfig>,
    pub aprs: AprsConfig,
    pub dextra: DialectConfig,
    pub dplus: DialectConfig,
    pub dcs: DialectConfig,
    pub xlx: DialectConfig,
    pub remote_commands: RemoteCommandsConfig,
    pub daemon: DaemonConfig,
    pub access_control: AccessControlConfig,
    pub drats_enabled: bool,
    pub gpsd: Option<GpsdConfig>,
}

impl GatewayConfig {
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, GatewayError> {
        let ini = Ini::load_from_file(path.as_ref())?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> Result<Self, GatewayError> {
        let gateway_section = get_section(ini, &["gateway", "General"]);
        if ini.section(Some("gateway")).is_some() && ini.section(Some("General")).is_some() {
            warn!("both [gateway] and [General] present, [gateway] takes priority");
        }

        let general = load_general(gateway_section)?;
        let log = load_log(ini.section(Some("Log")))?;
        let mqtt = load_mqtt(ini.section(Some("MQTT")))?;
        let paths = load_paths(ini.section(Some("Paths")))?;
        let hosts_files = load_hosts_files(ini.section(Some("Hosts Files")))?;
        let repeaters = load_repeaters(ini, &general)?;
        if repeaters.is_empty() {
            return Err(invalid("Repeater 1..4", "at least one repeater must be configured"));
        }
        let ircddb = load_ircddb(ini, &general)?;
        let aprs = load_aprs(ini.section(Some("APRS")))?;
        let dextra = load_dialect(ini.section(Some("Dextra")), &general, true, Some(5), false)?;
        let dplus = load_dialect(ini.section(Some("D-Plus")), &general, true, Some(5), true)?;
        let dcs = load_dialect(ini.section(Some("DCS")), &general, true, None, false)?;
        let xlx = load_dialect(ini.section(Some("XLX")), &general, true, None, false)?;
        let remote_commands = load_remote(ini.section(Some("Remote Commands")))?;
        let daemon = load_daemon(ini.section(Some("Daemon")));
        let access_control = load_access_control(ini.section(Some("Access Control")));
        let drats_enabled = get_bool(ini.section(Some("DRats")), "Enabled", false);
        let gpsd = if aprs.position_source == AprsPositionSource::Gpsd {
            Some(load_gpsd(ini.section(Some("GPSD")))?)
        } else {
            None
        };

        Ok(Self {
            general,
            log,
            mqtt,
            paths,
            hosts_files,
            repeaters,
            ircddb,
            aprs,
            dextra,
            dplus,
            dcs,
            xlx,
            remote_commands,
            daemon,
            access_control,
            drats_enabled,
            gpsd,
        })
    }
}

fn load_general(props: Option<&ini::Properties>) -> Result<GeneralConfig, GatewayError> {
    let callsign = get_str(props, "Callsign", "");
    if callsign.len() < 3 || callsign.len() > 8 {
        return Err(invalid("Callsign", "length must be 3..=8"));
    }

    let repeater_type = match get_str(props, "Type", "Repeater").as_str() {
        "Repeater" => RepeaterKind::Repeater,
        "Hotspot" => RepeaterKind::Hotspot,
        other => return Err(invalid("Type", format!("'{other}' must be Repeater or Hotspot"))),
    };

    Ok(GeneralConfig {
        callsign: callsign.to_ascii_uppercase(),
        address: get_str(props, "Address", "0.0.0.0"),
        hb_address: get_str(props, "HBAddress", "127.0.0.1"),
        hb_port: get_ranged_u32(props, "HBPort", 20010, 1, 65535)? as u16,
        icom_address: get_str(props, "IcomAddress", "127.0.0.1"),
        icom_port: get_ranged_u32(props, "IcomPort", 20000, 1, 65535)? as u16,
        latitude: get_ranged_f64(props, "Latitude", 0.0, -90.0, 90.0)?,
        longitude: get_ranged_f64(props, "Longitude", 0.0, -180.0, 180.0)?,
        description1: clean_text(&get_str(props, "Description1", "")),
        description2: clean_text(&get_str(props, "Description2", "")),
        url: clean_text(&get_str(props, "URL", "")),
        repeater_type,
        language: get_str(props, "Language", "English UK"),
    })
}

fn load_log(props: Option<&ini::Properties>) -> Result<LogConfig, GatewayError> {
    Ok(LogConfig {
        display_level: get_ranged_u32(props, "DisplayLevel", 2, 0, 6)?,
        mqtt_level: get_ranged_u32(props, "MQTTLevel", 2, 0, 6)?,
        log_ircddb_traffic: get_bool(props, "LogIRCDDBTraffic", false),
    })
}

fn load_mqtt(props: Option<&ini::Properties>) -> Result<MqttConfig, GatewayError> {
    Ok(MqttConfig {
        address: get_str(props, "Address", "127.0.0.1"),
        port: get_ranged_u32(props, "Port", 1883, 1, 65535)? as u16,
        keepalive_secs: get_ranged_u32(props, "Keepalive", 60, 0, 240)?,
        authenticate: get_bool(props, "Authenticate", false),
        username: get_str(props, "Username", "mmdvm"),
        password: get_str(props, "Password", "mmdvm"),
        name: get_str(props, "Name", "dstar-gateway"),
    })
}

fn load_paths(props: Option<&ini::Properties>) -> Result<PathsConfig, GatewayError> {
    let data = with_trailing_slash(get_str(props, "Data", "/usr/local/share/dstargateway.d/"));
    Ok(PathsConfig { data: PathBuf::from(data) })
}

fn load_hosts_files(props: Option<&ini::Properties>) -> Result<HostsFilesConfig, GatewayError> {
    let default_data = "/usr/local/share/dstargateway.d/";
    let hosts_files = with_trailing_slash(get_str(props, "HostsFiles", default_data));
    let custom = with_trailing_slash(get_str(
        props,
        "CustomHostsfiles",
        "/usr/local/share/dstargateway.d/hostsfiles.d/",
    ));
    Ok(HostsFilesConfig {
        hosts_files: PathBuf::from(hosts_files),
        custom_hosts_files: PathBuf::from(custom),
        reload_time_hours: get_ranged_u32(props, "ReloadTime", 72, 24, u32::MAX)?,
    })
}

fn load_repeaters(ini: &Ini, general: &GeneralConfig) -> Result<Vec<RepeaterConfig>, GatewayError> {
    let mut repeaters = Vec::new();
    for n in 1..=4 {
        let section_name = format!("Repeater {n}");
        let Some(props) = ini.section(Some(section_name.as_str())) else {
            continue;
        };
        if !get_bool(Some(props), "Enabled", false) {
            continue;
        }

        let band_str = get_str(Some(props), "Band", "B");
        let band = band_str.chars().next().ok_or_else(|| invalid(&section_name, "Band must be a single character"))?;

        let link_type = match get_str(Some(props), "Type", "HB").as_str() {
            "HB" => RepeaterLinkType::Hb,
            "Icom" => RepeaterLinkType::Icom,
            "Dummy" => RepeaterLinkType::Dummy,
            other => return Err(invalid(&section_name, format!("Type '{other}' must be HB, Icom or Dummy"))),
        };

        let reflector = get_str(Some(props), "Reflector", "");
        let reflector = if reflector.is_empty() { None } else { Some(reflector) };

        let reconnect_str = get_str(Some(props), "ReflectorReconnect", "Never");
        let reflector_reconnect = ReconnectPolicy::from_config(&reconnect_str)
            .ok_or_else(|| invalid(&section_name, format!("ReflectorReconnect '{reconnect_str}' invalid")))?;

        repeaters.push(RepeaterConfig {
            band,
            callsign: get_str(Some(props), "Callsign", &general.callsign),
            address: get_str(Some(props), "Address", "127.0.0.1"),
            port: get_ranged_u32(Some(props), "Port", 20011, 1, 65535)? as u16,
            link_type,
            reflector_at_startup: get_bool(Some(props), "ReflectorAtStartup", reflector.is_some()),
            reflector,
            reflector_reconnect,
            frequency_mhz: get_ranged_f64(Some(props), "Frequency", 434.0, 0.0, 1500.0)?,
            offset_mhz: get_ranged_f64(Some(props), "Offset", 0.0, -50.0, 50.0)?,
            range_km: get_ranged_f64(Some(props), "RangeKm", 0.0, 0.0, 3000.0)?,
            latitude: get_ranged_f64(Some(props), "Latitude", general.latitude, -90.0, 90.0)?,
            longitude: get_ranged_f64(Some(props), "Longitude", general.longitude, -180.0, 180.0)?,
            agl_m: get_ranged_f64(Some(props), "AGL", 0.0, 0.0, 1000.0)?,
            description1: clean_text(&get_str(Some(props), "Description1", &general.description1)),
            description2: clean_text(&get_str(Some(props), "Description2", &general.description2)),
            url: clean_text(&get_str(Some(props), "URL", &general.url)),
            band1: get_ranged_u32(Some(props), "Band1", 0, 0, 255)? as u8,
            band2: get_ranged_u32(Some(props), "Band2", 0, 0, 255)? as u8,
            band3: get_ranged_u32(Some(props), "Band3", 0, 0, 255)? as u8,
        });
    }
    Ok(repeaters)
}

fn load_ircddb(ini: &Ini, general: &GeneralConfig) -> Result<Vec<IrcDdbConfig>, GatewayError> {
    let mut backends = Vec::new();
    for n in 1..=4 {
        let section_name = format!("IRCDDB {n}");
        let Some(props) = ini.section(Some(section_name.as_str())) else {
            continue;
        };
        if !get_bool(Some(props), "Enabled", n == 1) {
            continue;
        }
        backends.push(IrcDdbConfig {
            hostname: get_str(Some(props), "Hostname", "ircv4.openquad.net"),
            username: get_str(Some(props), "Username", &general.callsign),
            password: get_str(Some(props), "Password", ""),
        });
    }
    Ok(backends)
}

fn load_aprs(props: Option<&ini::Properties>) -> Result<AprsConfig, GatewayError> {
    let enabled = get_bool(props, "Enabled", false);
    let position_source = match get_str(props, "PositionSource", "Fixed").as_str() {
        "Fixed" => AprsPositionSource::Fixed,
        "GPSD" => AprsPositionSource::Gpsd,
        other => return Err(invalid("PositionSource", format!("'{other}' must be Fixed or GPSD"))),
    };
    Ok(AprsConfig { enabled, position_source })
}

fn load_dialect(
    props: Option<&ini::Properties>,
    general: &GeneralConfig,
    default_enabled: bool,
    default_max_dongles: Option<u32>,
    supports_login: bool,
) -> Result<DialectConfig, GatewayError> {
    let mut enabled = get_bool(props, "Enabled", default_enabled);
    let max_dongles = match default_max_dongles {
        Some(default) => get_ranged_u32(props, "MaxDongles", default, 1, 5)?,
        None => 0,
    };
    let login = if supports_login {
        let login = get_str(props, "Login", &general.callsign).to_ascii_uppercase();
        if login.is_empty() {
            enabled = false;
            None
        } else {
            Some(login)
        }
    } else {
        None
    };
    Ok(DialectConfig { enabled, max_dongles, login })
}

fn load_remote(props: Option<&ini::Properties>) -> Result<RemoteCommandsConfig, GatewayError> {
    let mut enabled = get_bool(props, "Enabled", false);
    let port = get_ranged_u32(props, "Port", 4242, 1, 65535)? as u16;
    let password = get_str(props, "Password", "");
    if password.is_empty() {
        enabled = false;
    }
    Ok(RemoteCommandsConfig { enabled, port, password })
}

fn load_daemon(props: Option<&ini::Properties>) -> DaemonConfig {
    DaemonConfig {
        daemon: get_bool(props, "Daemon", false),
        pid_file: get_str(props, "PidFile", ""),
        user: get_str(props, "User", ""),
    }
}

fn load_access_control(props: Option<&ini::Properties>) -> AccessControlConfig {
    let path_or_none = |key: &str| -> Option<PathBuf> {
        let v = get_str(props, key, "");
        if v.is_empty() { None } else { Some(PathBuf::from(v)) }
    };
    AccessControlConfig {
        whitelist: path_or_none("WhiteList"),
        blacklist: path_or_none("BlackList"),
        restrict_list: path_or_none("RestrictList"),
    }
}

fn load_gpsd(props: Option<&ini::Properties>) -> Result<GpsdConfig, GatewayError> {
    Ok(GpsdConfig {
        address: get_str(props, "Address", "127.0.0.1"),
        port: get_str(props, "Port", "2947"),
    })
}

/// Parses a repeater address into a socket-usable [`Ipv4Addr`], used by the
/// gateway wiring when binding the local repeater-protocol socket.
pub fn parse_ipv4(s: &str) -> Result<Ipv4Addr, GatewayError> {
    Ipv4Addr::from_str(s).map_err(|e| invalid("Address", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_minimal_config(extra: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[General]\nCallsign=W1ABC\n\n[Repeater 1]\nEnabled=true\nBand=A\n\n{extra}"
        )
        .unwrap();
        file
    }

    #[test]
    fn minimal_config_loads_with_defaults() {
        let file = write_minimal_config("");
        let config = GatewayConfig::load(file.path()).unwrap();
        assert_eq!(config.general.callsign, "W1ABC");
        assert_eq!(config.repeaters.len(), 1);
        assert_eq!(config.repeaters[0].band, 'A');
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.hosts_files.reload_time_hours, 72);
    }

    #[test]
    fn out_of_range_latitude_is_config_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[General]\nCallsign=W1ABC\nLatitude=200\n\n[Repeater 1]\nEnabled=true\n"
        )
        .unwrap();
        let err = GatewayConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, GatewayError::ConfigInvalid(_)));
    }

    #[test]
    fn no_repeaters_enabled_is_config_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[General]\nCallsign=W1ABC\n").unwrap();
        let err = GatewayConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, GatewayError::ConfigInvalid(_)));
    }

    #[test]
    fn gateway_section_takes_priority_over_general() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[General]\nCallsign=OLDCALL\n\n[gateway]\nCallsign=NEWCALL\n\n[Repeater 1]\nEnabled=true\n"
        )
        .unwrap();
        let config = GatewayConfig::load(file.path()).unwrap();
        assert_eq!(config.general.callsign, "NEWCALL");
    }
}
