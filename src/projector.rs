//! Pure projection of an inspected container into the flat (key, value) set
//! published to the store. No I/O; deterministic; same input always yields
//! the same output.

use std::collections::BTreeMap;

use bollard::models::ContainerInspectResponse;

use crate::config::Config;

/// The flat key -> value mapping produced for one container, plus the
/// container-specific prefix every one of its keys shares.
pub struct Projection {
    pub prefix: String,
    pub entries: BTreeMap<String, String>,
}

/// Build the key prefix `P` from the namespace, the image name with its
/// configured strip-prefixes and leading slashes removed, the tag (`unknown`
/// if none), and the container id.
fn build_prefix(image: &str, id: &str, cfg: &Config) -> String {
    let mut stripped = image;
    for prefix in &cfg.name_strip_prefixes {
        if !prefix.is_empty() && stripped.starts_with(prefix.as_str()) {
            stripped = &stripped[prefix.len()..];
            break;
        }
    }
    let stripped = stripped.trim_start_matches('/');

    let (name, tag) = match stripped.split_once(':') {
        Some((name, tag)) => (name, tag),
        None => (stripped, "unknown"),
    };

    format!("{}{}/{}/{}", cfg.namespace, name, tag, id)
}

/// Project an inspected container record into its [`Projection`].
///
/// Returns `None` if the record is missing the fields the prefix is built
/// from (`Id`, `Config.Image`) — the caller treats this the same as a failed
/// inspection.
pub fn project(info: &ContainerInspectResponse, cfg: &Config) -> Option<Projection> {
    let id = info.id.as_deref()?;
    let image = info.config.as_ref()?.image.as_deref()?;

    let prefix = build_prefix(image, id, cfg);
    let mut entries = BTreeMap::new();

    entries.insert(format!("{prefix}/image_name"), image.to_string());
    if let Some(image_id) = &info.image {
        entries.insert(format!("{prefix}/image_id"), image_id.clone());
    }
    entries.insert(format!("{prefix}/dockerhost_name"), cfg.hostname.clone());
    entries.insert(format!("{prefix}/dockerhost_ipv4"), cfg.host_ipv4.clone());

    let net = info.network_settings.as_ref();
    let ipv4_address = net
        .and_then(|n| n.ip_address.as_deref())
        .filter(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string();

    if !ipv4_address.is_empty() {
        entries.insert(format!("{prefix}/ipv4_address"), ipv4_address.clone());
    }
    if let Some(ipv6) = net
        .and_then(|n| n.global_ipv6_address.as_deref())
        .filter(|s| !s.is_empty())
    {
        entries.insert(format!("{prefix}/ipv6_address"), ipv6.to_string());
    }

    if let Some(ports) = net.and_then(|n| n.ports.as_ref()) {
        for (port_proto, bindings) in ports {
            let (port, proto) = match port_proto.split_once('/') {
                Some((port, proto)) => (port, proto),
                None => (port_proto.as_str(), "tcp"),
            };
            match bindings {
                None => {
                    entries.insert(
                        format!("{prefix}/ports/listed/{proto}/{port}"),
                        ipv4_address.clone(),
                    );
                }
                Some(bindings) => {
                    for binding in bindings {
                        let host_ip = binding
                            .host_ip
                            .as_deref()
                            .map(|ip| {
                                if ip == "0.0.0.0" {
                                    cfg.host_ipv4.clone()
                                } else {
                                    ip.to_string()
                                }
                            })
                            .unwrap_or_default();
                        let host_port = binding.host_port.clone().unwrap_or_default();

                        let exposed = format!("{prefix}/ports/exposed/{proto}/{port}");
                        entries.insert(format!("{exposed}/host_ip"), host_ip);
                        entries.insert(format!("{exposed}/host_port"), host_port);
                    }
                }
            }
        }
    }

    if let Some(networks) = net.and_then(|n| n.networks.as_ref()) {
        for (name, data) in networks {
            let under = format!("{prefix}/networks/{name}");
            if let Some(v) = data.global_ipv6_address.as_deref().filter(|s| !s.is_empty()) {
                entries.insert(format!("{under}/ipv6_address"), v.to_string());
            }
            if let Some(v) = data.ip_address.as_deref().filter(|s| !s.is_empty()) {
                entries.insert(format!("{under}/ipv4_address"), v.to_string());
            }
            if let Some(v) = data.mac_address.as_deref().filter(|s| !s.is_empty()) {
                entries.insert(format!("{under}/mac_address"), v.to_string());
            }
            if let Some(v) = data.network_id.as_deref().filter(|s| !s.is_empty()) {
                entries.insert(format!("{under}/network_id"), v.to_string());
            }
        }
    }

    Some(Projection { prefix, entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bollard::models::{ContainerConfig, EndpointSettings, NetworkSettings, PortBinding};
    use std::collections::HashMap;

    fn base_config() -> Config {
        Config {
            etcd_host: "127.0.0.1".into(),
            etcd_port: 2379,
            docker_socket: None,
            hostname: "h".into(),
            host_ipv4: "10.0.0.1".into(),
            name_strip_prefixes: vec!["docker.sunet.se/".into()],
            refresh_period_secs: 300,
            namespace: "/simple-registrator/".into(),
            debug: false,
        }
    }

    fn info(image: &str, id: &str) -> ContainerInspectResponse {
        ContainerInspectResponse {
            id: Some(id.to_string()),
            image: Some("sha256:xx".to_string()),
            config: Some(ContainerConfig {
                image: Some(image.to_string()),
                ..Default::default()
            }),
            network_settings: Some(NetworkSettings {
                ip_address: Some("172.17.0.2".to_string()),
                ports: Some(HashMap::new()),
                networks: Some(HashMap::new()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn basic_start_scenario() {
        let cfg = base_config();
        let rec = info("docker.sunet.se/foo:v1", "abc");
        let projection = project(&rec, &cfg).unwrap();

        assert_eq!(projection.prefix, "/simple-registrator/foo/v1/abc");
        assert_eq!(
            projection.entries.get("/simple-registrator/foo/v1/abc/image_name"),
            Some(&"docker.sunet.se/foo:v1".to_string())
        );
        assert_eq!(
            projection.entries.get("/simple-registrator/foo/v1/abc/image_id"),
            Some(&"sha256:xx".to_string())
        );
        assert_eq!(
            projection.entries.get("/simple-registrator/foo/v1/abc/dockerhost_name"),
            Some(&"h".to_string())
        );
        assert_eq!(
            projection.entries.get("/simple-registrator/foo/v1/abc/dockerhost_ipv4"),
            Some(&"10.0.0.1".to_string())
        );
        assert_eq!(
            projection.entries.get("/simple-registrator/foo/v1/abc/ipv4_address"),
            Some(&"172.17.0.2".to_string())
        );
    }

    #[test]
    fn untagged_image_gets_unknown_tag() {
        let cfg = base_config();
        let rec = info("redis", "xyz");
        let projection = project(&rec, &cfg).unwrap();
        assert_eq!(projection.prefix, "/simple-registrator/redis/unknown/xyz");
    }

    #[test]
    fn exposed_port_substitutes_host_ipv4_for_wildcard() {
        let cfg = base_config();
        let mut rec = info("docker.sunet.se/foo:v1", "abc");
        let mut ports = HashMap::new();
        ports.insert(
            "80/tcp".to_string(),
            Some(vec![PortBinding {
                host_ip: Some("0.0.0.0".to_string()),
                host_port: Some("8080".to_string()),
            }]),
        );
        rec.network_settings.as_mut().unwrap().ports = Some(ports);

        let projection = project(&rec, &cfg).unwrap();
        let base = "/simple-registrator/foo/v1/abc/ports/exposed/tcp/80";
        assert_eq!(
            projection.entries.get(&format!("{base}/host_ip")),
            Some(&"10.0.0.1".to_string())
        );
        assert_eq!(
            projection.entries.get(&format!("{base}/host_port")),
            Some(&"8080".to_string())
        );
    }

    #[test]
    fn listed_port_uses_container_ipv4() {
        let cfg = base_config();
        let mut rec = info("docker.sunet.se/foo:v1", "abc");
        rec.network_settings.as_mut().unwrap().ip_address = Some("172.17.0.3".to_string());
        let mut ports = HashMap::new();
        ports.insert("53/udp".to_string(), None);
        rec.network_settings.as_mut().unwrap().ports = Some(ports);

        let projection = project(&rec, &cfg).unwrap();
        assert_eq!(
            projection
                .entries
                .get("/simple-registrator/foo/v1/abc/ports/listed/udp/53"),
            Some(&"172.17.0.3".to_string())
        );
    }

    #[test]
    fn empty_ipv6_emits_no_key() {
        let cfg = base_config();
        let rec = info("docker.sunet.se/foo:v1", "abc");
        let projection = project(&rec, &cfg).unwrap();
        assert!(!projection
            .entries
            .contains_key("/simple-registrator/foo/v1/abc/ipv6_address"));
    }

    #[test]
    fn network_attributes_are_scoped_under_network_name() {
        let cfg = base_config();
        let mut rec = info("docker.sunet.se/foo:v1", "abc");
        let mut networks = HashMap::new();
        networks.insert(
            "bridge".to_string(),
            EndpointSettings {
                ip_address: Some("172.18.0.5".to_string()),
                mac_address: Some("02:42:ac:12:00:05".to_string()),
                network_id: Some("netid123".to_string()),
                ..Default::default()
            },
        );
        rec.network_settings.as_mut().unwrap().networks = Some(networks);

        let projection = project(&rec, &cfg).unwrap();
        let under = "/simple-registrator/foo/v1/abc/networks/bridge";
        assert_eq!(
            projection.entries.get(&format!("{under}/ipv4_address")),
            Some(&"172.18.0.5".to_string())
        );
        assert_eq!(
            projection.entries.get(&format!("{under}/mac_address")),
            Some(&"02:42:ac:12:00:05".to_string())
        );
        assert_eq!(
            projection.entries.get(&format!("{under}/network_id")),
            Some(&"netid123".to_string())
        );
    }

    #[test]
    fn missing_id_or_image_yields_no_projection() {
        let cfg = base_config();
        let mut rec = info("docker.sunet.se/foo:v1", "abc");
        rec.id = None;
        assert!(project(&rec, &cfg).is_none());
    }
}
