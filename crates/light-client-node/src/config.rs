//! Node configuration from `LC_*` environment variables.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use light_client_inbound::{Endpoint, InboundConfig};

/// Default parent full node.
pub const DEFAULT_PARENT_ENDPOINT: &str = "127.0.0.1:4200";

/// Runtime configuration of the light client node.
#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Pipeline settings.
    pub inbound: InboundConfig,
    /// Full node to connect to at startup.
    pub parent_endpoint: Endpoint,
    /// Address to accept peers on, if any.
    pub listen_addr: Option<SocketAddr>,
    /// `EnvFilter` directive.
    pub log_level: String,
    /// Emit JSON log lines.
    pub json_logs: bool,
}

impl NodeConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let inbound = InboundConfig::from_lookup(&lookup);
        inbound.validate().context("invalid inbound configuration")?;

        let parent = lookup("LC_PARENT_ENDPOINT")
            .unwrap_or_else(|| DEFAULT_PARENT_ENDPOINT.to_string());
        let parent_endpoint = Endpoint::parse(&parent).context("LC_PARENT_ENDPOINT")?;

        let listen_addr = lookup("LC_LISTEN_ADDR")
            .map(|addr| addr.parse::<SocketAddr>())
            .transpose()
            .context("LC_LISTEN_ADDR")?;

        let log_level = lookup("LC_LOG_LEVEL")
            .or_else(|| lookup("RUST_LOG"))
            .unwrap_or_else(|| "info".to_string());

        let json_logs = lookup("LC_JSON_LOGS")
            .map(|v| v.to_lowercase() == "true" || v == "1")
            .unwrap_or(false);

        Ok(Self {
            inbound,
            parent_endpoint,
            listen_addr,
            log_level,
            json_logs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = NodeConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.parent_endpoint, Endpoint::new("127.0.0.1", 4200));
        assert!(config.listen_addr.is_none());
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_overrides() {
        let config = NodeConfig::from_lookup(lookup(&[
            ("LC_PARENT_ENDPOINT", "10.0.0.2:5000"),
            ("LC_LISTEN_ADDR", "0.0.0.0:4300"),
            ("RUST_LOG", "debug"),
            ("LC_JSON_LOGS", "1"),
        ]))
        .unwrap();
        assert_eq!(config.parent_endpoint.port(), 5000);
        assert_eq!(config.listen_addr.unwrap().port(), 4300);
        assert_eq!(config.log_level, "debug");
        assert!(config.json_logs);
    }

    #[test]
    fn test_bad_parent_endpoint_fails() {
        let result = NodeConfig::from_lookup(lookup(&[("LC_PARENT_ENDPOINT", "nowhere")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_capacity_fails() {
        let result = NodeConfig::from_lookup(lookup(&[("LC_RECEIPT_CAPACITY", "0")]));
        assert!(result.is_err());
    }
}
