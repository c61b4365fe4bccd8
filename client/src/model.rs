//! Wire models returned by node REST APIs.
//!
//! NEM and Symbol report the same facts under different layouts. Each layout
//! is a private serde struct; the public models expose the shared fields the
//! crawler relies on.

use crate::error::ClientError;
use crate::network::NetworkFamily;
use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

/// Symbol role bit marking a node that exposes the REST gateway.
pub const SYMBOL_API_ROLE: u64 = 2;
/// Port of the Symbol REST gateway.
pub const SYMBOL_REST_PORT: u16 = 3000;

#[derive(Deserialize)]
struct NemIdentity {
    #[serde(rename = "public-key")]
    public_key: String,
    #[serde(default)]
    name: String,
}

#[derive(Deserialize)]
struct NemEndpoint {
    #[serde(default = "default_scheme")]
    protocol: String,
    #[serde(default)]
    host: String,
    port: u16,
}

#[derive(Default, Deserialize)]
struct NemMetaData {
    #[serde(default)]
    version: String,
}

#[derive(Deserialize)]
struct NemNodeInfo {
    identity: NemIdentity,
}

#[derive(Deserialize)]
struct NemPeer {
    identity: NemIdentity,
    endpoint: NemEndpoint,
    #[serde(rename = "metaData", default)]
    meta_data: NemMetaData,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NemAccount {
    #[serde(default)]
    public_key: Option<String>,
    #[serde(default, deserialize_with = "u64_from_number_or_string")]
    balance: u64,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NemAccountMeta {
    #[serde(default)]
    remote_status: Option<String>,
}

#[derive(Deserialize)]
struct NemAccountEnvelope {
    account: NemAccount,
    #[serde(default)]
    meta: NemAccountMeta,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolNodeInfo {
    public_key: String,
    #[serde(default)]
    friendly_name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolPeer {
    public_key: String,
    #[serde(default)]
    friendly_name: String,
    #[serde(default)]
    host: String,
    #[serde(default)]
    port: Option<u16>,
    #[serde(default, deserialize_with = "u64_from_number_or_string")]
    roles: u64,
    #[serde(default)]
    version: Option<u32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolMosaic {
    id: String,
    #[serde(deserialize_with = "u64_from_number_or_string")]
    amount: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolAccount {
    #[serde(default)]
    public_key: Option<String>,
    #[serde(default)]
    mosaics: Vec<SymbolMosaic>,
}

#[derive(Deserialize)]
struct SymbolAccountEnvelope {
    account: SymbolAccount,
}

#[derive(Deserialize)]
struct ChainHeight {
    #[serde(deserialize_with = "u64_from_number_or_string")]
    height: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolChainInfo {
    latest_finalized_block: ChainHeight,
}

/// A node's self-description, as returned by its node-info endpoint.
///
/// The raw payload is kept verbatim so it can be written out unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    /// Key the node signs with.
    pub public_key: String,
    /// Operator chosen display name.
    pub name: String,
    /// The full node-info object.
    pub payload: Map<String, Value>,
}

impl NodeInfo {
    pub fn from_json(network: NetworkFamily, value: Value) -> Result<Self, ClientError> {
        let (public_key, name) = match network {
            NetworkFamily::Nem => {
                let info: NemNodeInfo = decode(&value, "node info")?;
                (info.identity.public_key, info.identity.name)
            }
            NetworkFamily::Symbol => {
                let info: SymbolNodeInfo = decode(&value, "node info")?;
                (info.public_key, info.friendly_name)
            }
        };

        let payload = match value {
            Value::Object(payload) => payload,
            other => return Err(malformed(format!("node info is not an object: {other}"))),
        };

        Ok(NodeInfo {
            public_key,
            name,
            payload,
        })
    }
}

/// A peer advertised in a node's peer list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeerInfo {
    pub public_key: String,
    pub name: String,
    /// URL scheme for reaching the peer's REST API.
    pub scheme: String,
    /// Bare host name or address. Empty when the peer did not advertise one.
    pub host: String,
    /// REST port when `api` is set, otherwise the advertised node port.
    pub port: u16,
    /// Whether the peer exposes a REST API.
    pub api: bool,
    /// Human readable software version.
    pub version: String,
}

impl PeerInfo {
    pub fn from_json(network: NetworkFamily, value: &Value) -> Result<Self, ClientError> {
        match network {
            NetworkFamily::Nem => {
                let peer: NemPeer = decode(value, "peer")?;
                Ok(PeerInfo {
                    public_key: peer.identity.public_key,
                    name: peer.identity.name,
                    scheme: peer.endpoint.protocol,
                    host: peer.endpoint.host,
                    port: peer.endpoint.port,
                    api: true,
                    version: peer.meta_data.version,
                })
            }
            NetworkFamily::Symbol => {
                let peer: SymbolPeer = decode(value, "peer")?;
                let api = peer.roles & SYMBOL_API_ROLE != 0;
                let port = if api {
                    SYMBOL_REST_PORT
                } else {
                    peer.port
                        .ok_or_else(|| malformed("peer without the api role has no port"))?
                };

                Ok(PeerInfo {
                    public_key: peer.public_key,
                    name: peer.friendly_name,
                    scheme: default_scheme(),
                    host: peer.host,
                    port,
                    api,
                    version: peer.version.map(format_symbol_version).unwrap_or_default(),
                })
            }
        }
    }

    /// Endpoint URL, or an empty string when the peer has no host.
    pub fn endpoint(&self) -> String {
        if self.host.is_empty() {
            return String::new();
        }

        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

impl fmt::Display for PeerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) at {}",
            self.name,
            self.public_key,
            match self.endpoint().as_str() {
                "" => "unknown host".to_string(),
                endpoint => endpoint.to_string(),
            }
        )
    }
}

/// Account state as seen by a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    /// Account public key, absent if the account never sent a transaction.
    pub public_key: Option<String>,
    /// Balance in the network's atomic currency units.
    pub balance: u64,
    /// NEM remote harvesting status (`ACTIVE`, `INACTIVE`, ...).
    pub remote_status: Option<String>,
}

impl AccountInfo {
    /// Whether this account is delegating harvesting through an active remote key.
    pub fn is_remote_active(&self) -> bool {
        self.remote_status.as_deref() == Some("ACTIVE")
    }

    pub fn from_json(
        network: NetworkFamily,
        value: &Value,
        currency_mosaic_id: &str,
    ) -> Result<Self, ClientError> {
        match network {
            NetworkFamily::Nem => {
                let envelope: NemAccountEnvelope = decode(value, "account info")?;
                Ok(AccountInfo {
                    public_key: known_public_key(envelope.account.public_key),
                    balance: envelope.account.balance,
                    remote_status: envelope.meta.remote_status,
                })
            }
            NetworkFamily::Symbol => {
                let envelope: SymbolAccountEnvelope = decode(value, "account info")?;
                let balance = envelope
                    .account
                    .mosaics
                    .iter()
                    .find(|mosaic| mosaic.id.eq_ignore_ascii_case(currency_mosaic_id))
                    .map_or(0, |mosaic| mosaic.amount);

                Ok(AccountInfo {
                    public_key: known_public_key(envelope.account.public_key),
                    balance,
                    remote_status: None,
                })
            }
        }
    }
}

/// Finality watermark reported by networks with a finality gadget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizationInfo {
    pub height: u64,
}

/// Parse the chain height out of a chain endpoint body.
///
/// NEM reports `{"height": 123}`, Symbol reports `{"height": "123", ...}`.
pub fn parse_chain_height(value: &Value) -> Result<u64, ClientError> {
    decode::<ChainHeight>(value, "chain info").map(|chain| chain.height)
}

/// Parse the finalized height out of a Symbol chain info body.
pub fn parse_finalization_info(value: &Value) -> Result<FinalizationInfo, ClientError> {
    decode::<SymbolChainInfo>(value, "chain info").map(|chain| FinalizationInfo {
        height: chain.latest_finalized_block.height,
    })
}

/// Format a packed Symbol version (`0x01000300`) as `1.0.3.0`.
pub fn format_symbol_version(version: u32) -> String {
    format!(
        "{}.{}.{}.{}",
        (version >> 24) & 0xFF,
        (version >> 16) & 0xFF,
        (version >> 8) & 0xFF,
        version & 0xFF
    )
}

/// Read an unsigned integer encoded either as a JSON number or a decimal string.
///
/// Symbol encodes 64-bit values as strings to survive JavaScript clients.
fn u64_from_number_or_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(u64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(number) => Ok(number),
        NumberOrString::String(text) => text.parse().map_err(de::Error::custom),
    }
}

fn default_scheme() -> String {
    "http".to_string()
}

/// An all-zero key marks an account that never announced its public key.
fn known_public_key(public_key: Option<String>) -> Option<String> {
    public_key.filter(|key| !key.is_empty() && key.chars().any(|c| c != '0'))
}

fn decode<'a, T: Deserialize<'a>>(value: &'a Value, what: &str) -> Result<T, ClientError> {
    T::deserialize(value).map_err(|e| malformed(format!("invalid {what}: {e}")))
}

fn malformed<S: Into<String>>(reason: S) -> ClientError {
    ClientError::MalformedResponse(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_symbol_node_info() {
        let info = NodeInfo::from_json(
            NetworkFamily::Symbol,
            json!({
                "publicKey": "AAAA",
                "friendlyName": "alice",
                "networkIdentifier": 104,
                "roles": 3,
            }),
        )
        .unwrap();

        assert_eq!(info.public_key, "AAAA");
        assert_eq!(info.name, "alice");
        assert_eq!(info.payload["networkIdentifier"], json!(104));
    }

    #[test]
    fn test_nem_node_info() {
        let info = NodeInfo::from_json(
            NetworkFamily::Nem,
            json!({
                "metaData": { "networkId": 104, "version": "0.6.100-BETA" },
                "endpoint": { "protocol": "http", "host": "bob.example", "port": 7890 },
                "identity": { "name": "bob", "public-key": "BBBB" },
            }),
        )
        .unwrap();

        assert_eq!(info.public_key, "BBBB");
        assert_eq!(info.name, "bob");
    }

    #[test]
    fn test_node_info_without_key_is_malformed() {
        let result = NodeInfo::from_json(NetworkFamily::Symbol, json!({ "friendlyName": "x" }));
        assert!(matches!(result, Err(ClientError::MalformedResponse(_))));

        let result = NodeInfo::from_json(NetworkFamily::Nem, json!([]));
        assert!(matches!(result, Err(ClientError::MalformedResponse(_))));
    }

    #[test]
    fn test_symbol_peer_roles_select_port() {
        let api_peer = PeerInfo::from_json(
            NetworkFamily::Symbol,
            &json!({
                "publicKey": "AAAA",
                "friendlyName": "api",
                "host": "api.example",
                "port": 7900,
                "roles": 3,
                "version": 0x01000300,
            }),
        )
        .unwrap();
        assert!(api_peer.api);
        assert_eq!(api_peer.endpoint(), "http://api.example:3000");
        assert_eq!(api_peer.version, "1.0.3.0");

        let peer_only = PeerInfo::from_json(
            NetworkFamily::Symbol,
            &json!({
                "publicKey": "CCCC",
                "friendlyName": "peer",
                "host": "peer.example",
                "port": 7900,
                "roles": 1,
            }),
        )
        .unwrap();
        assert!(!peer_only.api);
        assert_eq!(peer_only.endpoint(), "http://peer.example:7900");
    }

    #[test]
    fn test_peer_without_host_has_empty_endpoint() {
        let peer = PeerInfo::from_json(
            NetworkFamily::Symbol,
            &json!({ "publicKey": "AAAA", "host": "", "port": 7900, "roles": 2 }),
        )
        .unwrap();
        assert_eq!(peer.endpoint(), "");
    }

    #[test]
    fn test_nem_peer() {
        let peer = PeerInfo::from_json(
            NetworkFamily::Nem,
            &json!({
                "metaData": { "version": "0.6.100-BETA" },
                "endpoint": { "protocol": "http", "host": "1.2.3.4", "port": 7890 },
                "identity": { "name": "hi", "public-key": "DDDD" },
            }),
        )
        .unwrap();
        assert_eq!(peer.endpoint(), "http://1.2.3.4:7890");
        assert_eq!(peer.version, "0.6.100-BETA");
    }

    #[test]
    fn test_symbol_account_balance_uses_currency_mosaic() {
        let account = AccountInfo::from_json(
            NetworkFamily::Symbol,
            &json!({
                "account": {
                    "publicKey": "EEEE",
                    "mosaics": [
                        { "id": "1111111111111111", "amount": "5" },
                        { "id": "6bed913fa20223f8", "amount": "1234" },
                    ],
                }
            }),
            crate::network::SYMBOL_CURRENCY_MOSAIC_ID,
        )
        .unwrap();
        assert_eq!(account.balance, 1234);
        assert_eq!(account.public_key.as_deref(), Some("EEEE"));
        assert!(!account.is_remote_active());
    }

    #[test]
    fn test_nem_account_remote_status() {
        let account = AccountInfo::from_json(
            NetworkFamily::Nem,
            &json!({
                "account": { "publicKey": "FFFF", "balance": 99 },
                "meta": { "remoteStatus": "ACTIVE" },
            }),
            "",
        )
        .unwrap();
        assert_eq!(account.balance, 99);
        assert!(account.is_remote_active());
    }

    #[test]
    fn test_zero_public_key_is_unknown() {
        let account = AccountInfo::from_json(
            NetworkFamily::Symbol,
            &json!({ "account": { "publicKey": "0000000000000000", "mosaics": [] } }),
            "",
        )
        .unwrap();
        assert_eq!(account.public_key, None);
        assert_eq!(account.balance, 0);
    }

    #[test]
    fn test_heights_accept_numbers_and_strings() {
        assert_eq!(parse_chain_height(&json!({ "height": 42 })).unwrap(), 42);
        assert_eq!(parse_chain_height(&json!({ "height": "42" })).unwrap(), 42);
        assert!(parse_chain_height(&json!({})).is_err());

        let finalization =
            parse_finalization_info(&json!({ "latestFinalizedBlock": { "height": "40" } }))
                .unwrap();
        assert_eq!(finalization.height, 40);
    }

    #[test]
    fn test_non_numeric_height_is_malformed() {
        let result = parse_chain_height(&json!({ "height": "tall" }));
        assert!(matches!(result, Err(ClientError::MalformedResponse(_))));
    }

    #[test]
    fn test_symbol_peer_without_api_role_needs_port() {
        let result = PeerInfo::from_json(
            NetworkFamily::Symbol,
            &json!({ "publicKey": "AAAA", "host": "peer.example", "roles": 1 }),
        );
        assert!(matches!(result, Err(ClientError::MalformedResponse(_))));
    }

    #[test]
    fn test_nem_account_without_public_key_or_meta() {
        let account = AccountInfo::from_json(
            NetworkFamily::Nem,
            &json!({ "account": { "publicKey": null, "balance": 7 } }),
            "",
        )
        .unwrap();
        assert_eq!(account.public_key, None);
        assert_eq!(account.balance, 7);
        assert_eq!(account.remote_status, None);
    }
}
