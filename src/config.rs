//! Environment-driven configuration.
//!
//! Resolved once at process start into an immutable [`Config`], then shared
//! via `Arc` across the event loop, the runtime client, the store client and
//! every refresher.

use std::env;
use std::net::ToSocketAddrs;

/// Bridge-wide configuration, resolved from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// etcd host, from `ETCD_HOST` (default `127.0.0.1`).
    pub etcd_host: String,

    /// etcd port, from `ETCD_PORT` (default `2379`).
    pub etcd_port: u16,

    /// Docker socket path override, from `DOCKER_SOCKET` (default: platform default).
    pub docker_socket: Option<String>,

    /// Host name published alongside every container, from `REGISTRATOR_HOSTNAME`
    /// (default: OS hostname).
    pub hostname: String,

    /// Host IPv4 published alongside every container, from `REGISTRATOR_HOSTIPV4`
    /// (default: resolution of `hostname`).
    pub host_ipv4: String,

    /// Leading image-name prefixes stripped before computing the key prefix,
    /// from `REGISTRATOR_ETCD_NAME_STRIP_PREFIXES` (comma-separated; default
    /// `docker.sunet.se/`).
    pub name_strip_prefixes: Vec<String>,

    /// Refresh period T in seconds, from `REGISTRATOR_ETCD_TIMEOUT` (default `300`).
    /// Every write's TTL is `2 * refresh_period_secs`.
    pub refresh_period_secs: u64,

    /// Key namespace, from `REGISTRATOR_ETCD_NS` (default `/simple-registrator/`).
    pub namespace: String,

    /// Verbose logging, from `REGISTRATOR_DEBUG`.
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Self {
        let hostname = env::var("REGISTRATOR_HOSTNAME").unwrap_or_else(|_| resolve_hostname());
        let host_ipv4 = env::var("REGISTRATOR_HOSTIPV4")
            .unwrap_or_else(|_| resolve_ipv4(&hostname).unwrap_or_default());

        Self {
            etcd_host: env::var("ETCD_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            etcd_port: env::var("ETCD_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(2379),
            docker_socket: env::var("DOCKER_SOCKET").ok(),
            hostname,
            host_ipv4,
            name_strip_prefixes: env::var("REGISTRATOR_ETCD_NAME_STRIP_PREFIXES")
                .unwrap_or_else(|_| "docker.sunet.se/".to_string())
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            refresh_period_secs: env::var("REGISTRATOR_ETCD_TIMEOUT")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(300),
            namespace: env::var("REGISTRATOR_ETCD_NS")
                .unwrap_or_else(|_| "/simple-registrator/".to_string()),
            debug: is_truthy(&env::var("REGISTRATOR_DEBUG").unwrap_or_default()),
        }
    }

    /// etcd endpoint in `http://host:port` form, as the etcd client expects.
    pub fn etcd_endpoint(&self) -> String {
        format!("http://{}:{}", self.etcd_host, self.etcd_port)
    }

    /// TTL in seconds for every refresh write: `2 * refresh_period_secs`.
    pub fn ttl_secs(&self) -> u64 {
        self.refresh_period_secs * 2
    }

    /// Whether a named backend is enabled, per `REGISTRATOR_<NAME>` (default `default_enabled`).
    pub fn backend_enabled(name: &str, default_enabled: bool) -> bool {
        let var = format!("REGISTRATOR_{}", name.to_uppercase());
        match env::var(&var) {
            Ok(v) => is_truthy(&v),
            Err(_) => default_enabled,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "enabled" | "1")
}

fn resolve_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string())
}

fn resolve_ipv4(hostname: &str) -> Option<String> {
    (hostname, 0)
        .to_socket_addrs()
        .ok()?
        .find_map(|addr| match addr.ip() {
            std::net::IpAddr::V4(v4) => Some(v4.to_string()),
            _ => None,
        })
}
