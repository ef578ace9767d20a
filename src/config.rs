use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration. Every field has a container-convention default;
/// `from_env` overlays the `MONITORING_*` environment variables on top.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitorConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_status_file")]
    pub status_file: PathBuf,
    #[serde(default = "default_metrics_file")]
    pub metrics_file: PathBuf,
    #[serde(default = "default_healthcheck_log")]
    pub healthcheck_log: PathBuf,
    #[serde(default = "default_proc_root")]
    pub proc_root: PathBuf,
    #[serde(default = "default_vpn_interfaces")]
    pub vpn_interfaces: Vec<String>,
    #[serde(default = "default_service_port")]
    pub service_port: u16,
    #[serde(default = "default_probe_timeout_secs")]
    pub probe_timeout_secs: u64,
    #[serde(default = "default_ip_echo_url")]
    pub ip_echo_url: String,
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".into()
}

fn default_status_file() -> PathBuf {
    PathBuf::from("/tmp/vpnpulse_status.json")
}

fn default_metrics_file() -> PathBuf {
    PathBuf::from("/config/metrics.json")
}

fn default_healthcheck_log() -> PathBuf {
    PathBuf::from("/config/healthcheck.log")
}

fn default_proc_root() -> PathBuf {
    PathBuf::from("/proc")
}

fn default_vpn_interfaces() -> Vec<String> {
    vec!["tun0".into(), "wg0".into()]
}

fn default_service_port() -> u16 {
    6789
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_ip_echo_url() -> String {
    "https://ifconfig.me".into()
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            log_level: default_log_level(),
            status_file: default_status_file(),
            metrics_file: default_metrics_file(),
            healthcheck_log: default_healthcheck_log(),
            proc_root: default_proc_root(),
            vpn_interfaces: default_vpn_interfaces(),
            service_port: default_service_port(),
            probe_timeout_secs: default_probe_timeout_secs(),
            ip_echo_url: default_ip_echo_url(),
        }
    }
}

impl MonitorConfig {
    /// Build the configuration from the process environment. Unparseable
    /// values fall back to the defaults rather than aborting startup.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(port) = env_parse("MONITORING_PORT") {
            config.port = port;
        }
        if let Ok(level) = std::env::var("MONITORING_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Ok(path) = std::env::var("MONITORING_STATUS_FILE") {
            config.status_file = path.into();
        }
        if let Ok(path) = std::env::var("MONITORING_METRICS_FILE") {
            config.metrics_file = path.into();
        }
        if let Ok(path) = std::env::var("MONITORING_HEALTHCHECK_LOG") {
            config.healthcheck_log = path.into();
        }
        if let Ok(raw) = std::env::var("MONITORING_VPN_INTERFACES") {
            let interfaces: Vec<String> = raw
                .split(',')
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect();
            if !interfaces.is_empty() {
                config.vpn_interfaces = interfaces;
            }
        }
        if let Some(port) = env_parse("MONITORING_SERVICE_PORT") {
            config.service_port = port;
        }
        config
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_container_conventions() {
        let config = MonitorConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.vpn_interfaces, vec!["tun0", "wg0"]);
        assert_eq!(config.service_port, 6789);
        assert_eq!(config.probe_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn deserializes_from_empty_object() {
        let config: MonitorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.status_file, PathBuf::from("/tmp/vpnpulse_status.json"));
    }
}
