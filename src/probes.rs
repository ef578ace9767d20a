//! On-demand system introspection backing `/status`.
//!
//! Each probe is independently fault-tolerant: a timeout or error degrades
//! that probe's value and never aborts the aggregate response. The network
//! and subprocess probes sit behind small capability traits so tests can
//! substitute fakes without touching the system.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::net::TcpStream;

use crate::config::MonitorConfig;
use crate::models::{
    DetailedStatus, LoadAverage, MemoryInfo, NetworkInfo, ServiceInfo, SystemInfo, UptimeInfo,
    VpnInterfaceStatus,
};
use crate::store;
use crate::summary::round2;

/// Queries the network stack for the state of a single interface.
#[async_trait]
pub trait NetworkInterfaceInspector: Send + Sync {
    async fn inspect(&self, name: &str, timeout: Duration) -> VpnInterfaceStatus;
}

/// Bounded-timeout reachability probe against a local TCP port.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn reachable(&self, port: u16, timeout: Duration) -> bool;
}

/// Resolves the container's external IP through an IP-echo service.
#[async_trait]
pub trait ExternalIpResolver: Send + Sync {
    async fn resolve(&self, timeout: Duration) -> Option<String>;
}

/// `ip addr show <name>` with a bounded timeout. An interface that cannot
/// be queried is indistinguishable from one that does not exist.
pub struct IpCommandInspector;

#[async_trait]
impl NetworkInterfaceInspector for IpCommandInspector {
    async fn inspect(&self, name: &str, timeout: Duration) -> VpnInterfaceStatus {
        let command = tokio::process::Command::new("ip")
            .args(["addr", "show", name])
            .kill_on_drop(true)
            .output();
        match tokio::time::timeout(timeout, command).await {
            Ok(Ok(output)) if output.status.success() => {
                let details = String::from_utf8_lossy(&output.stdout).trim().to_string();
                VpnInterfaceStatus {
                    exists: true,
                    up: Some(details.contains("UP")),
                    details: Some(details),
                }
            }
            _ => VpnInterfaceStatus::missing(),
        }
    }
}

/// TCP connect against the proxied service's local port.
pub struct TcpReachabilityProbe;

#[async_trait]
impl ReachabilityProbe for TcpReachabilityProbe {
    async fn reachable(&self, port: u16, timeout: Duration) -> bool {
        let addr = format!("127.0.0.1:{port}");
        matches!(
            tokio::time::timeout(timeout, TcpStream::connect(&addr)).await,
            Ok(Ok(_))
        )
    }
}

/// HTTP lookup against an IP-echo endpoint.
pub struct HttpIpResolver {
    client: reqwest::Client,
    url: String,
}

impl HttpIpResolver {
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl ExternalIpResolver for HttpIpResolver {
    async fn resolve(&self, timeout: Duration) -> Option<String> {
        let response = self
            .client
            .get(&self.url)
            .timeout(timeout)
            .send()
            .await
            .ok()?;
        let body = response.error_for_status().ok()?.text().await.ok()?;
        let ip = body.trim().to_string();
        (!ip.is_empty()).then_some(ip)
    }
}

/// The live-probe half of `/status`.
pub struct ProbeSet {
    pub interfaces: Arc<dyn NetworkInterfaceInspector>,
    pub reachability: Arc<dyn ReachabilityProbe>,
    pub external_ip: Arc<dyn ExternalIpResolver>,
}

impl ProbeSet {
    pub fn live(config: &MonitorConfig) -> Self {
        Self {
            interfaces: Arc::new(IpCommandInspector),
            reachability: Arc::new(TcpReachabilityProbe),
            external_ip: Arc::new(HttpIpResolver::new(config.ip_echo_url.clone())),
        }
    }

    /// Run all probes and assemble the `/status` payload. The network-facing
    /// probes run concurrently so one slow probe cannot stall the rest.
    pub async fn detailed_status(&self, config: &MonitorConfig) -> DetailedStatus {
        let timeout = config.probe_timeout();
        let (vpn, responsive, external_ip) = tokio::join!(
            self.inspect_interfaces(&config.vpn_interfaces, timeout),
            self.reachability.reachable(config.service_port, timeout),
            self.external_ip.resolve(timeout),
        );

        DetailedStatus {
            timestamp: Utc::now(),
            uptime: read_uptime(&config.proc_root),
            system: read_system_info(&config.proc_root),
            vpn,
            service: ServiceInfo {
                responsive,
                port: config.service_port,
            },
            network: NetworkInfo {
                external_ip: external_ip.unwrap_or_else(|| "unknown".into()),
            },
            health: store::read_status(&config.status_file),
        }
    }

    async fn inspect_interfaces(
        &self,
        names: &[String],
        timeout: Duration,
    ) -> BTreeMap<String, VpnInterfaceStatus> {
        let mut tasks = FuturesUnordered::new();
        for name in names {
            let inspector = Arc::clone(&self.interfaces);
            let name = name.clone();
            tasks.push(async move {
                let status = inspector.inspect(&name, timeout).await;
                (name, status)
            });
        }

        let mut interfaces = BTreeMap::new();
        while let Some((name, status)) = tasks.next().await {
            interfaces.insert(name, status);
        }
        interfaces
    }
}

fn read_uptime(proc_root: &Path) -> UptimeInfo {
    let raw = std::fs::read_to_string(proc_root.join("uptime")).unwrap_or_default();
    match raw.split_whitespace().next().and_then(|v| v.parse::<f64>().ok()) {
        Some(seconds) => UptimeInfo {
            seconds,
            human: humanize(seconds),
        },
        None => UptimeInfo::unknown(),
    }
}

fn humanize(seconds: f64) -> String {
    let total = seconds as u64;
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let secs = total % 60;
    if days > 0 {
        format!("{days}d {hours}h {minutes}m {secs}s")
    } else {
        format!("{hours}h {minutes}m {secs}s")
    }
}

fn read_system_info(proc_root: &Path) -> SystemInfo {
    SystemInfo {
        memory: read_memory(proc_root),
        load_average: read_load_average(proc_root),
    }
}

fn read_memory(proc_root: &Path) -> Option<MemoryInfo> {
    let raw = std::fs::read_to_string(proc_root.join("meminfo")).ok()?;
    let mut total = 0u64;
    let mut available = 0u64;
    for line in raw.lines() {
        if let Some(rest) = line.strip_prefix("MemTotal:") {
            total = parse_kib(rest);
        } else if let Some(rest) = line.strip_prefix("MemAvailable:") {
            available = parse_kib(rest);
        }
    }

    let used = total.saturating_sub(available);
    let usage_percent = if total > 0 {
        round2(used as f64 / total as f64 * 100.0)
    } else {
        0.0
    };
    Some(MemoryInfo {
        total,
        available,
        used,
        usage_percent,
    })
}

fn parse_kib(field: &str) -> u64 {
    field
        .split_whitespace()
        .next()
        .and_then(|v| v.parse::<u64>().ok())
        .map(|kib| kib * 1024)
        .unwrap_or(0)
}

fn read_load_average(proc_root: &Path) -> Option<LoadAverage> {
    let raw = std::fs::read_to_string(proc_root.join("loadavg")).ok()?;
    let mut fields = raw.split_whitespace();
    Some(LoadAverage {
        one: fields.next().and_then(|v| v.parse().ok()).unwrap_or(0.0),
        five: fields.next().and_then(|v| v.parse().ok()).unwrap_or(0.0),
        fifteen: fields.next().and_then(|v| v.parse().ok()).unwrap_or(0.0),
    })
}
