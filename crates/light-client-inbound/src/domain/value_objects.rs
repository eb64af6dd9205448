//! # Domain Value Objects
//!
//! Command tags, endpoints and peer identity.

use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use shared_types::Address;

use super::errors::InboundError;

/// Commands the light client accepts from a peer.
///
/// The set is closed: any other tag is rejected by [`Command::parse`] and
/// never reaches a handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Peer announced its identity.
    InitConnection,
    /// A transaction was included in a block.
    ConfirmedTransaction,
    /// Current state of the watched account.
    AccountState,
    /// Storage host reply with contract code and storage.
    MinerGetSmartContractStateResult,
    /// A submitted transaction was rejected.
    TransactionError,
    /// Execution receipt for a transaction.
    Receipt,
    /// Logs emitted by a new block.
    NewLogs,
    /// Logs matching an earlier query.
    QueryLogsResult,
    /// Transaction looked up by hash.
    GetTransactionResult,
}

impl Command {
    /// Every accepted command.
    pub const ALL: [Command; 9] = [
        Command::InitConnection,
        Command::ConfirmedTransaction,
        Command::AccountState,
        Command::MinerGetSmartContractStateResult,
        Command::TransactionError,
        Command::Receipt,
        Command::NewLogs,
        Command::QueryLogsResult,
        Command::GetTransactionResult,
    ];

    /// Wire tag of this command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::InitConnection => "InitConnection",
            Command::ConfirmedTransaction => "ConfirmedTransaction",
            Command::AccountState => "AccountState",
            Command::MinerGetSmartContractStateResult => "MinerGetSmartContractStateResult",
            Command::TransactionError => "TransactionError",
            Command::Receipt => "Receipt",
            Command::NewLogs => "NewLogs",
            Command::QueryLogsResult => "QueryLogsResult",
            Command::GetTransactionResult => "GetTransactionResult",
        }
    }

    /// Look up a wire tag. Matching is exact and case-sensitive.
    pub fn parse(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|command| command.as_str() == tag)
    }
}

impl FromStr for Command {
    type Err = InboundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| InboundError::UnknownCommand(s.to_string()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Commands the light client sends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutboundCommand {
    /// Handshake sent right after connecting.
    InitConnection,
    /// One-shot request to a storage host.
    MinerGetSmartContractState,
}

impl OutboundCommand {
    /// Wire tag of this command.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboundCommand::InitConnection => "InitConnection",
            OutboundCommand::MinerGetSmartContractState => "MinerGetSmartContractState",
        }
    }
}

/// A `host:port` pair.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Create an endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Parse `host:port`. IPv6 hosts may be bracketed (`[::1]:9000`).
    pub fn parse(value: &str) -> Result<Self, InboundError> {
        let invalid = || InboundError::InvalidEndpoint(value.to_string());

        let (host, port) = value.trim().rsplit_once(':').ok_or_else(invalid)?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(invalid());
        }
        let port = port.parse::<u16>().map_err(|_| invalid())?;

        Ok(Self::new(host, port))
    }

    /// Host name or IP literal.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    pub fn port(&self) -> u16 {
        self.port
    }
}

impl FromStr for Endpoint {
    type Err = InboundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// How a connection came to exist.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionRole {
    /// Outbound connection to the parent full node.
    Parent,
    /// Connection accepted by the local listener.
    Accepted,
    /// Short-lived connection to a storage host.
    Secondary,
}

/// Identity of the remote side of a connection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PeerInfo {
    /// Remote endpoint.
    pub endpoint: Endpoint,
    /// Wallet address of the peer, when known up front.
    pub address: Option<Address>,
    /// Node type of the peer, when known up front.
    pub node_type: Option<String>,
    /// How the connection was established.
    pub role: ConnectionRole,
}

impl PeerInfo {
    /// The parent full node.
    pub fn parent(endpoint: Endpoint, address: Option<Address>, node_type: Option<String>) -> Self {
        Self {
            endpoint,
            address,
            node_type,
            role: ConnectionRole::Parent,
        }
    }

    /// A peer that dialed the local listener.
    pub fn accepted(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            address: None,
            node_type: None,
            role: ConnectionRole::Accepted,
        }
    }

    /// A storage host; no identity is established for these.
    pub fn secondary(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            address: None,
            node_type: None,
            role: ConnectionRole::Secondary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_roundtrip() {
        for command in Command::ALL {
            assert_eq!(Command::parse(command.as_str()), Some(command));
        }
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(Command::parse("Ping"), None);
        assert_eq!(Command::parse("accountstate"), None);
        assert_eq!(Command::parse(""), None);
        // Outbound-only tags are not accepted inbound.
        assert_eq!(Command::parse("MinerGetSmartContractState"), None);
    }

    #[test]
    fn test_command_from_str() {
        assert_eq!("Receipt".parse::<Command>().unwrap(), Command::Receipt);

        let err = "receipt".parse::<Command>().unwrap_err();
        assert!(matches!(err, InboundError::UnknownCommand(ref tag) if tag == "receipt"));
        assert_eq!(err.to_string(), "Unknown command: receipt");
    }

    #[test]
    fn test_endpoint_parse() {
        let endpoint = Endpoint::parse("203.0.113.5:9000").unwrap();
        assert_eq!(endpoint.host(), "203.0.113.5");
        assert_eq!(endpoint.port(), 9000);
        assert_eq!(endpoint.to_string(), "203.0.113.5:9000");
    }

    #[test]
    fn test_endpoint_parse_ipv6() {
        let endpoint = Endpoint::parse("[::1]:4200").unwrap();
        assert_eq!(endpoint.host(), "::1");
        assert_eq!(endpoint.to_string(), "[::1]:4200");
    }

    #[test]
    fn test_endpoint_parse_rejects_garbage() {
        assert!(Endpoint::parse("203.0.113.5").is_err());
        assert!(Endpoint::parse(":9000").is_err());
        assert!(Endpoint::parse("host:notaport").is_err());
        assert!(Endpoint::parse("host:70000").is_err());
    }

    #[test]
    fn test_secondary_peer_has_no_identity() {
        let peer = PeerInfo::secondary(Endpoint::new("storage", 1));
        assert_eq!(peer.role, ConnectionRole::Secondary);
        assert!(peer.address.is_none());
        assert!(peer.node_type.is_none());
    }
}
