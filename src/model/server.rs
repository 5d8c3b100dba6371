use super::grouping::{UNKNOWN_CABINET, UNKNOWN_DC, UNKNOWN_POSITION};
use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

/// One server as delivered by the backend listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerRecord {
    #[serde(rename = "iDRAC_IP", alias = "ip", default, deserialize_with = "de_string")]
    pub ip: String,
    #[serde(rename = "Hostname", default, deserialize_with = "de_opt_string")]
    pub hostname: Option<String>,
    #[serde(rename = "DataCenterID", default, deserialize_with = "de_opt_string")]
    pub data_center_id: Option<String>,
    #[serde(rename = "Cabinet", default, deserialize_with = "de_opt_string")]
    pub cabinet: Option<String>,
    #[serde(rename = "Position", default, deserialize_with = "de_opt_string")]
    pub position: Option<String>,
}

/// Accepts strings, numbers and null; the inventory database is not strict
/// about whether a rack position is text or an integer.
fn de_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// A missing or null address becomes an empty string so the row still groups.
fn de_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_opt_string(deserializer)?.unwrap_or_default())
}

/// Only absent or empty values fall back to a default; anything else is a
/// grouping key as delivered.
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl ServerRecord {
    /// Record with only an address, as produced by the plain IP-list backend.
    pub fn from_ip(ip: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            hostname: None,
            data_center_id: None,
            cabinet: None,
            position: None,
        }
    }

    pub fn data_center(&self) -> &str {
        non_empty(&self.data_center_id).unwrap_or(UNKNOWN_DC)
    }

    pub fn cabinet(&self) -> &str {
        non_empty(&self.cabinet).unwrap_or(UNKNOWN_CABINET)
    }

    pub fn position(&self) -> &str {
        non_empty(&self.position).unwrap_or(UNKNOWN_POSITION)
    }

    pub fn display_hostname(&self) -> &str {
        non_empty(&self.hostname).unwrap_or("N/A")
    }

    /// Sidebar leaf label: `hostname (ip)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.display_hostname(), self.ip)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl HealthStatus {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("ok") => HealthStatus::Ok,
            Some("warning") => HealthStatus::Warning,
            Some("critical") => HealthStatus::Critical,
            _ => HealthStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Ok => "ok",
            HealthStatus::Warning => "warning",
            HealthStatus::Critical => "critical",
            HealthStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    /// Anything other than "on" (including a missing value) counts as off.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.trim().eq_ignore_ascii_case("on") => PowerState::On,
            _ => PowerState::Off,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PowerState::On => "ON",
            PowerState::Off => "OFF",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub service_tag: Option<String>,
    #[serde(default)]
    pub serial_number: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    #[serde(default)]
    pub health: Option<String>,
    #[serde(default)]
    pub power_state: Option<String>,
    #[serde(default)]
    pub bios_version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HardwareInventory {
    #[serde(default)]
    pub processors: Vec<serde_json::Value>,
    #[serde(default)]
    pub memory_modules: Vec<serde_json::Value>,
    #[serde(default)]
    pub nics: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageInventory {
    #[serde(default)]
    pub controllers: Vec<serde_json::Value>,
    #[serde(default)]
    pub drives: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermalsAndPower {
    #[serde(default)]
    pub fans: Vec<serde_json::Value>,
    #[serde(default)]
    pub temperature_sensors: Vec<serde_json::Value>,
    #[serde(default)]
    pub power_supplies: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WarrantyInfo {
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    /// Set instead of the dates when the iDRAC has no warranty data
    #[serde(default)]
    pub message: Option<String>,
}

/// Telemetry for one server, the `data` object of `/servers/{ip}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerDetails {
    #[serde(default)]
    pub idrac_ip: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub system: SystemInfo,
    #[serde(default)]
    pub hardware: HardwareInventory,
    #[serde(default)]
    pub storage: StorageInventory,
    #[serde(default)]
    pub thermals_and_power: ThermalsAndPower,
    #[serde(default)]
    pub warranty: Option<WarrantyInfo>,
    /// Present when the backend failed to collect the inventory
    #[serde(default)]
    pub message: Option<String>,
}

impl ServerDetails {
    /// Collection time reported by the backend (naive UTC).
    pub fn collected_at(&self) -> Option<NaiveDateTime> {
        self.timestamp.as_deref()?.parse().ok()
    }
}

/// A listed server together with the outcome of its detail fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerEntry {
    pub ip: String,
    pub details: Option<ServerDetails>,
    pub error: Option<String>,
}

impl ServerEntry {
    pub fn loaded(ip: impl Into<String>, details: ServerDetails) -> Self {
        Self {
            ip: ip.into(),
            details: Some(details),
            error: None,
        }
    }

    pub fn failed(ip: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            details: None,
            error: Some(error.into()),
        }
    }

    fn system(&self) -> Option<&SystemInfo> {
        self.details.as_ref().map(|d| &d.system)
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus::parse(self.system().and_then(|s| s.health.as_deref()))
    }

    pub fn power_state(&self) -> PowerState {
        PowerState::parse(self.system().and_then(|s| s.power_state.as_deref()))
    }

    pub fn is_up(&self) -> bool {
        self.power_state() == PowerState::On
    }

    pub fn is_unavailable(&self) -> bool {
        self.details.is_none()
    }

    pub fn model(&self) -> &str {
        self.system()
            .and_then(|s| s.model.as_deref())
            .unwrap_or("Unknown Model")
    }
}
