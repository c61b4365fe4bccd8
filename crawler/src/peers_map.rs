//! Map of node identities to their advertised endpoints.
//!
//! Unlike a full crawl, the peers map is built from a single peer list,
//! either pulled from one node or read from a saved JSON file.

use crate::client::NodeClient;
use log::info;
use nodewatch_client::{ClientError, NetworkFamily, PeerInfo};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Errors that can occur while building a peers map.
#[derive(Debug)]
pub enum PeersMapError {
    Io(io::Error),
    Json(serde_json::Error),
    /// The node could not be queried, or an entry is missing required fields.
    Client(ClientError),
}

impl fmt::Display for PeersMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeersMapError::Io(err) => write!(f, "Could not read peers file: {err}"),
            PeersMapError::Json(err) => write!(f, "Could not parse peers file: {err}"),
            PeersMapError::Client(err) => write!(f, "Could not load peers: {err}"),
        }
    }
}

impl Error for PeersMapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PeersMapError::Io(err) => Some(err),
            PeersMapError::Json(err) => Some(err),
            PeersMapError::Client(err) => Some(err),
        }
    }
}

impl From<io::Error> for PeersMapError {
    fn from(err: io::Error) -> Self {
        PeersMapError::Io(err)
    }
}

impl From<serde_json::Error> for PeersMapError {
    fn from(err: serde_json::Error) -> Self {
        PeersMapError::Json(err)
    }
}

impl From<ClientError> for PeersMapError {
    fn from(err: ClientError) -> Self {
        PeersMapError::Client(err)
    }
}

/// Where a peer can be found and what it runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeerDescriptor {
    pub name: String,
    /// REST endpoint, empty when the peer advertised no host.
    pub endpoint: String,
    pub version: String,
}

impl From<&PeerInfo> for PeerDescriptor {
    fn from(peer: &PeerInfo) -> Self {
        PeerDescriptor {
            name: peer.name.clone(),
            endpoint: peer.endpoint(),
            version: peer.version.clone(),
        }
    }
}

/// Builds a public key to [`PeerDescriptor`] map.
#[derive(Debug)]
pub struct PeersMapBuilder {
    network: NetworkFamily,
    peers_map: BTreeMap<String, PeerDescriptor>,
}

impl PeersMapBuilder {
    pub fn new(network: NetworkFamily) -> Self {
        Self {
            network,
            peers_map: BTreeMap::new(),
        }
    }

    /// Pull the peer list from a live node.
    pub async fn build_from_client<C: NodeClient>(
        &mut self,
        client: &C,
    ) -> Result<usize, PeersMapError> {
        info!("pulling peers from node {}", client.host());
        let peers = client.peers().await?;
        self.insert_all(&peers);
        Ok(self.report())
    }

    /// Read a saved peer list.
    ///
    /// Accepts either a bare array or a NEM style `{"data": [...]}` object.
    pub fn build_from_file(&mut self, path: &Path) -> Result<usize, PeersMapError> {
        info!("processing node information from {}", path.display());
        let value: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
        self.build_from_json(&value)
    }

    pub fn build_from_json(&mut self, value: &Value) -> Result<usize, PeersMapError> {
        let entries = value
            .get("data")
            .unwrap_or(value)
            .as_array()
            .ok_or_else(|| {
                ClientError::MalformedResponse("peer list is not an array".to_string())
            })?;

        let peers = entries
            .iter()
            .map(|entry| PeerInfo::from_json(self.network, entry))
            .collect::<Result<Vec<_>, _>>()?;
        self.insert_all(&peers);
        Ok(self.report())
    }

    pub fn peers_map(&self) -> &BTreeMap<String, PeerDescriptor> {
        &self.peers_map
    }

    pub fn into_peers_map(self) -> BTreeMap<String, PeerDescriptor> {
        self.peers_map
    }

    fn insert_all(&mut self, peers: &[PeerInfo]) {
        for peer in peers {
            self.peers_map
                .insert(peer.public_key.clone(), PeerDescriptor::from(peer));
        }
    }

    fn report(&self) -> usize {
        info!("found {} mappings", self.peers_map.len());
        self.peers_map.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_utils::{MockConnector, MockNetwork, MockNode};
    use crate::client::Connector;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_symbol_peers() {
        let mut builder = PeersMapBuilder::new(NetworkFamily::Symbol);
        let count = builder
            .build_from_json(&json!([
                {
                    "publicKey": "AAAA",
                    "friendlyName": "api",
                    "host": "api.example",
                    "port": 7900,
                    "roles": 2,
                    "version": 16777987,
                },
                {
                    "publicKey": "BBBB",
                    "friendlyName": "hidden",
                    "host": "",
                    "port": 7900,
                    "roles": 1,
                    "version": 16777987,
                },
            ]))
            .unwrap();

        assert_eq!(count, 2);
        let map = builder.peers_map();
        assert_eq!(
            map["AAAA"],
            PeerDescriptor {
                name: "api".to_string(),
                endpoint: "http://api.example:3000".to_string(),
                version: "1.0.3.3".to_string(),
            }
        );
        assert_eq!(map["BBBB"].endpoint, "");
    }

    #[test]
    fn test_nem_peers_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let body = json!({
            "data": [{
                "metaData": { "version": "0.6.100-BETA" },
                "endpoint": { "protocol": "http", "host": "1.2.3.4", "port": 7890 },
                "identity": { "name": "hi", "public-key": "CCCC" },
            }]
        });
        write!(file, "{body}").unwrap();

        let mut builder = PeersMapBuilder::new(NetworkFamily::Nem);
        assert_eq!(builder.build_from_file(file.path()).unwrap(), 1);
        assert_eq!(builder.peers_map()["CCCC"].endpoint, "http://1.2.3.4:7890");
        assert_eq!(builder.peers_map()["CCCC"].version, "0.6.100-BETA");
    }

    #[test]
    fn test_malformed_entry_is_rejected() {
        let mut builder = PeersMapBuilder::new(NetworkFamily::Symbol);
        let result = builder.build_from_json(&json!([{ "friendlyName": "no key" }]));
        assert!(matches!(result, Err(PeersMapError::Client(_))));
    }

    #[tokio::test]
    async fn test_peers_from_live_node() {
        let connector = MockConnector::new(
            NetworkFamily::Symbol,
            MockNetwork::new()
                .with_node("seed", MockNode::new("SEED").with_peers(&["a", "b"]))
                .with_node("a", MockNode::new("AAAA"))
                .with_node("b", MockNode::new("BBBB")),
        );
        let client = connector.from_host("seed").unwrap();

        let mut builder = PeersMapBuilder::new(NetworkFamily::Symbol);
        assert_eq!(builder.build_from_client(&client).await.unwrap(), 2);
        assert_eq!(builder.peers_map()["AAAA"].endpoint, "http://a:3000");
    }
}
