//! # Inbound Pipeline Configuration
//!
//! Frame limit, local identity announced in the handshake, and the
//! capacity of each output queue.

use serde::{Deserialize, Serialize};
use shared_types::{Address, CLIENT_NODE_TYPE};
use thiserror::Error;
use tracing::warn;

use crate::domain::{DEFAULT_OUTPUT_CAPACITY, MAX_FRAME_LEN};

/// Environment variable prefix for every setting.
pub const ENV_PREFIX: &str = "LC_";

/// Invalid configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An output queue was configured with capacity zero.
    #[error("Capacity of {0} must be at least 1")]
    ZeroCapacity(&'static str),

    /// Frame limit is zero or above the protocol maximum.
    #[error("max_frame_len must be in 1..={max}, got {got}")]
    FrameLimitOutOfRange {
        /// Configured value
        got: u64,
        /// Protocol maximum
        max: u64,
    },
}

/// Inbound pipeline configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundConfig {
    /// Largest accepted frame payload.
    pub max_frame_len: u64,

    /// Wallet address announced in the `InitConnection` handshake.
    pub local_address: Address,

    /// Node type announced in the `InitConnection` handshake.
    pub node_type: String,

    /// Capacity of the dedicated account-state output.
    pub account_state_capacity: usize,

    /// Capacity of the dedicated receipt output.
    pub receipt_capacity: usize,

    /// Capacity of the dedicated transaction output.
    pub transaction_capacity: usize,

    /// Capacity of each general-purpose subscriber.
    pub general_capacity: usize,
}

impl Default for InboundConfig {
    fn default() -> Self {
        Self {
            max_frame_len: MAX_FRAME_LEN,
            local_address: [0u8; 20],
            node_type: CLIENT_NODE_TYPE.to_string(),
            account_state_capacity: DEFAULT_OUTPUT_CAPACITY,
            receipt_capacity: DEFAULT_OUTPUT_CAPACITY,
            transaction_capacity: DEFAULT_OUTPUT_CAPACITY,
            general_capacity: DEFAULT_OUTPUT_CAPACITY,
        }
    }
}

impl InboundConfig {
    /// Create a config for testing (small frames, single-slot queues).
    pub fn for_testing() -> Self {
        Self {
            max_frame_len: 1024 * 1024,
            local_address: [0x11; 20],
            node_type: CLIENT_NODE_TYPE.to_string(),
            account_state_capacity: 1,
            receipt_capacity: 1,
            transaction_capacity: 1,
            general_capacity: 1,
        }
    }

    /// Load from `LC_*` environment variables, falling back to defaults.
    ///
    /// | Variable | Field |
    /// |----------|-------|
    /// | `LC_MAX_FRAME_LEN` | `max_frame_len` |
    /// | `LC_LOCAL_ADDRESS` | `local_address` (hex, optional `0x`) |
    /// | `LC_NODE_TYPE` | `node_type` |
    /// | `LC_ACCOUNT_STATE_CAPACITY` | `account_state_capacity` |
    /// | `LC_RECEIPT_CAPACITY` | `receipt_capacity` |
    /// | `LC_TRANSACTION_CAPACITY` | `transaction_capacity` |
    /// | `LC_GENERAL_CAPACITY` | `general_capacity` |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Invalid values are logged and
    /// replaced by the default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |name: &str| lookup(format!("{ENV_PREFIX}{name}").as_str());

        Self {
            max_frame_len: parse_or(
                get("MAX_FRAME_LEN"),
                "LC_MAX_FRAME_LEN",
                defaults.max_frame_len,
            ),
            local_address: match get("LOCAL_ADDRESS") {
                Some(value) => parse_address(&value).unwrap_or_else(|| {
                    warn!(value = %value, "[lc-inbound] Invalid LC_LOCAL_ADDRESS, using default");
                    defaults.local_address
                }),
                None => defaults.local_address,
            },
            node_type: get("NODE_TYPE").unwrap_or(defaults.node_type),
            account_state_capacity: parse_or(
                get("ACCOUNT_STATE_CAPACITY"),
                "LC_ACCOUNT_STATE_CAPACITY",
                defaults.account_state_capacity,
            ),
            receipt_capacity: parse_or(
                get("RECEIPT_CAPACITY"),
                "LC_RECEIPT_CAPACITY",
                defaults.receipt_capacity,
            ),
            transaction_capacity: parse_or(
                get("TRANSACTION_CAPACITY"),
                "LC_TRANSACTION_CAPACITY",
                defaults.transaction_capacity,
            ),
            general_capacity: parse_or(
                get("GENERAL_CAPACITY"),
                "LC_GENERAL_CAPACITY",
                defaults.general_capacity,
            ),
        }
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frame_len == 0 || self.max_frame_len > MAX_FRAME_LEN {
            return Err(ConfigError::FrameLimitOutOfRange {
                got: self.max_frame_len,
                max: MAX_FRAME_LEN,
            });
        }

        let capacities = [
            ("account_state_capacity", self.account_state_capacity),
            ("receipt_capacity", self.receipt_capacity),
            ("transaction_capacity", self.transaction_capacity),
            ("general_capacity", self.general_capacity),
        ];
        for (name, capacity) in capacities {
            if capacity == 0 {
                return Err(ConfigError::ZeroCapacity(name));
            }
        }

        Ok(())
    }
}

fn parse_or<T: std::str::FromStr + Copy>(value: Option<String>, var: &str, default: T) -> T {
    match value {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(var = var, value = %raw, "[lc-inbound] Invalid value, using default");
            default
        }),
        None => default,
    }
}

/// Parse a 20-byte address from hex, with or without a `0x` prefix.
pub fn parse_address(value: &str) -> Option<Address> {
    let value = value.trim();
    let digits = value.strip_prefix("0x").unwrap_or(value);
    let bytes = hex::decode(digits).ok()?;
    bytes.try_into().ok()
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
    fn test_default_config() {
        let config = InboundConfig::default();
        assert_eq!(config.max_frame_len, 1 << 30);
        assert_eq!(config.node_type, "Client");
        assert_eq!(config.general_capacity, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_testing_config() {
        let config = InboundConfig::for_testing();
        assert_eq!(config.transaction_capacity, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_reads_prefixed_vars() {
        let config = InboundConfig::from_lookup(lookup(&[
            ("LC_MAX_FRAME_LEN", "4096"),
            ("LC_LOCAL_ADDRESS", "0x0101010101010101010101010101010101010101"),
            ("LC_RECEIPT_CAPACITY", "8"),
        ]));
        assert_eq!(config.max_frame_len, 4096);
        assert_eq!(config.local_address, [1u8; 20]);
        assert_eq!(config.receipt_capacity, 8);
        assert_eq!(config.transaction_capacity, 64);
    }

    #[test]
    fn test_from_lookup_invalid_values_fall_back() {
        let config = InboundConfig::from_lookup(lookup(&[
            ("LC_MAX_FRAME_LEN", "lots"),
            ("LC_LOCAL_ADDRESS", "0xnothex"),
        ]));
        assert_eq!(config, InboundConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = InboundConfig {
            receipt_capacity: 0,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::ZeroCapacity("receipt_capacity"))
        );
    }

    #[test]
    fn test_validate_rejects_frame_limit_above_protocol_max() {
        let config = InboundConfig {
            max_frame_len: MAX_FRAME_LEN + 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::FrameLimitOutOfRange { .. })
        ));
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address(&"ab".repeat(20)), Some([0xab; 20]));
        assert_eq!(parse_address("0xabcd"), None);
    }
}
