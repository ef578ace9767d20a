use axum::http::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Typed view of a snapshot's `status` label.
///
/// The checker writes free-form labels; anything we do not recognize is
/// carried through as [`HealthState::Other`] instead of being rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthState {
    Healthy,
    Warning,
    Degraded,
    Unhealthy,
    Unknown,
    Other,
}

impl HealthState {
    pub fn from_label(label: &str) -> Self {
        match label {
            "healthy" => Self::Healthy,
            "warning" => Self::Warning,
            "degraded" => Self::Degraded,
            "unhealthy" => Self::Unhealthy,
            "unknown" => Self::Unknown,
            _ => Self::Other,
        }
    }

    /// HTTP code served by `/health` for this state.
    ///
    /// `warning` stays 200 so load balancers keep routing to the container;
    /// unrecognized labels pass through as 200 as well.
    pub fn http_status(self) -> StatusCode {
        match self {
            Self::Degraded | Self::Unhealthy | Self::Unknown => StatusCode::SERVICE_UNAVAILABLE,
            Self::Healthy | Self::Warning | Self::Other => StatusCode::OK,
        }
    }

    /// Prometheus gauge value. Stricter than the HTTP mapping: only the
    /// literal `healthy` counts as 1, `warning` lands on the 0 side.
    pub fn gauge_value(self) -> u8 {
        match self {
            Self::Healthy => 1,
            _ => 0,
        }
    }
}

/// Latest health assessment, owned and written by the external checker.
///
/// Fields beyond the ones we interpret are preserved verbatim so the
/// snapshot survives a round-trip even when the writer adds new keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    #[serde(default = "unknown_label")]
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub checks: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

fn unknown_label() -> String {
    "unknown".into()
}

impl StatusSnapshot {
    pub fn state(&self) -> HealthState {
        HealthState::from_label(&self.status)
    }

    /// Placeholder served when the checker has not produced a snapshot yet.
    pub fn absent() -> Self {
        let mut extra = BTreeMap::new();
        extra.insert("message".into(), "Status file not found".into());
        Self {
            status: "unknown".into(),
            timestamp: None,
            checks: BTreeMap::new(),
            extra,
        }
    }
}

/// One historical observation from the append-only metrics file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(default)]
    pub check: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub response_time: f64,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// Per-check-type statistics derived from the history on every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryEntry {
    pub success_rate: f64,
    pub total_checks: usize,
    pub avg_response_time: f64,
    pub max_response_time: f64,
    pub last_status: String,
}

/// Aggregate payload for `/status`: live probe results plus the snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DetailedStatus {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub uptime: UptimeInfo,
    pub system: SystemInfo,
    pub vpn: BTreeMap<String, VpnInterfaceStatus>,
    pub service: ServiceInfo,
    pub network: NetworkInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<StatusSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UptimeInfo {
    pub seconds: f64,
    pub human: String,
}

impl UptimeInfo {
    pub fn unknown() -> Self {
        Self {
            seconds: 0.0,
            human: "unknown".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SystemInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_average: Option<LoadAverage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryInfo {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub usage_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadAverage {
    #[serde(rename = "1min")]
    pub one: f64,
    #[serde(rename = "5min")]
    pub five: f64,
    #[serde(rename = "15min")]
    pub fifteen: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VpnInterfaceStatus {
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub up: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl VpnInterfaceStatus {
    /// Recorded for an interface that is missing or could not be queried.
    pub fn missing() -> Self {
        Self {
            exists: false,
            up: None,
            details: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    pub responsive: bool,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkInfo {
    pub external_ip: String,
}
