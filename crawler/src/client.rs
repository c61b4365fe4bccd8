//! Node client abstractions for testing and mocking.
//!
//! This module provides the [`NodeClient`] and [`Connector`] traits that
//! abstract node probing, so the discovery session can be driven by a mock
//! network in tests without touching the core crawler logic.

use log::debug;
use nodewatch_client::{
    AccountInfo, ClientConfiguration, ClientError, Endpoint, FinalizationInfo, NetworkFamily,
    NodeInfo, PeerInfo, RestClient,
};
use std::future::Future;

/// Probe operations the crawler performs against a single node.
///
/// A client is bound to one host for its whole life and is never mutated,
/// so it can be shared freely between workers.
pub trait NodeClient: Send + Sync + 'static {
    /// Host the client is bound to. Hosts are the unit of deduplication.
    fn host(&self) -> &str;

    fn port(&self) -> u16;

    fn node_info(&self) -> impl Future<Output = Result<NodeInfo, ClientError>> + Send;

    fn peers(&self) -> impl Future<Output = Result<Vec<PeerInfo>, ClientError>> + Send;

    fn chain_height(&self) -> impl Future<Output = Result<u64, ClientError>> + Send;

    fn finalization_info(&self)
        -> impl Future<Output = Result<FinalizationInfo, ClientError>> + Send;

    /// Look up the account owning `public_key`, `None` if the node does not know it.
    fn account_info(
        &self,
        public_key: &str,
        forwarded: bool,
    ) -> impl Future<Output = Result<Option<AccountInfo>, ClientError>> + Send;
}

impl NodeClient for RestClient {
    fn host(&self) -> &str {
        self.host()
    }

    fn port(&self) -> u16 {
        self.port()
    }

    fn node_info(&self) -> impl Future<Output = Result<NodeInfo, ClientError>> + Send {
        self.node_info()
    }

    fn peers(&self) -> impl Future<Output = Result<Vec<PeerInfo>, ClientError>> + Send {
        self.peers()
    }

    fn chain_height(&self) -> impl Future<Output = Result<u64, ClientError>> + Send {
        self.chain_height()
    }

    fn finalization_info(
        &self,
    ) -> impl Future<Output = Result<FinalizationInfo, ClientError>> + Send {
        self.finalization_info()
    }

    fn account_info(
        &self,
        public_key: &str,
        forwarded: bool,
    ) -> impl Future<Output = Result<Option<AccountInfo>, ClientError>> + Send {
        self.account_info(public_key, forwarded)
    }
}

/// Factory trait for creating node clients.
///
/// This trait enables dependency injection for client creation,
/// allowing different implementations for production and testing.
pub trait Connector: Clone + Send + Sync + 'static {
    type Client: NodeClient;

    /// Network family the created clients speak to.
    fn network(&self) -> NetworkFamily;

    /// Create a client for a catalog host.
    ///
    /// # Returns
    ///
    /// `None` if the host cannot be addressed.
    fn from_host(&self, host: &str) -> Option<Self::Client>;

    /// Create a client for a peer discovered in another node's peer list.
    ///
    /// # Returns
    ///
    /// `None` if the peer cannot be probed, e.g. it advertises no host.
    fn from_peer(&self, peer: &PeerInfo) -> Option<Self::Client>;
}

/// Standard connector that creates REST clients sharing one HTTP pool.
#[derive(Debug, Clone)]
pub struct RestConnector {
    network: NetworkFamily,
    retry_count: u32,
    currency_mosaic_id: String,
    http: reqwest::Client,
}

impl RestConnector {
    /// Create a new connector for `network` with the given client configuration.
    pub fn new(
        network: NetworkFamily,
        configuration: &ClientConfiguration,
        currency_mosaic_id: &str,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            network,
            retry_count: configuration.retry_count,
            currency_mosaic_id: currency_mosaic_id.to_string(),
            http: configuration.build_http_client()?,
        })
    }
}

impl Connector for RestConnector {
    type Client = RestClient;

    fn network(&self) -> NetworkFamily {
        self.network
    }

    fn from_host(&self, host: &str) -> Option<Self::Client> {
        match Endpoint::parse(self.network, host) {
            Ok(endpoint) => Some(
                RestClient::with_http(self.network, endpoint, self.retry_count, self.http.clone())
                    .with_currency_mosaic_id(self.currency_mosaic_id.as_str()),
            ),
            Err(e) => {
                debug!("Ignoring unaddressable host: {e}");
                None
            }
        }
    }

    fn from_peer(&self, peer: &PeerInfo) -> Option<Self::Client> {
        RestClient::from_peer(self.network, peer, self.retry_count, self.http.clone())
            .map(|client| client.with_currency_mosaic_id(self.currency_mosaic_id.as_str()))
    }
}

#[cfg(test)]
pub mod test_utils {
    //! A scripted in-memory network for driving the crawler in tests.

    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Behaviour of one host in a [`MockNetwork`].
    #[derive(Debug, Clone, Default)]
    pub struct MockNode {
        pub public_key: String,
        pub name: String,
        /// Hosts reported in the peer list.
        pub peers: Vec<String>,
        /// Node info fails, making the host unreachable.
        pub unreachable: bool,
        /// Peer list fails after node info succeeded.
        pub peers_fail: bool,
        pub height: u64,
        pub finalized_height: u64,
        /// Artificial latency applied to the peer list request.
        pub delay: Duration,
        /// Advertised to other nodes without a REST endpoint.
        pub no_api: bool,
        /// The peer list request panics.
        pub panics: bool,
    }

    impl MockNode {
        pub fn new(public_key: &str) -> Self {
            MockNode {
                public_key: public_key.to_string(),
                name: format!("node-{public_key}"),
                height: 100,
                finalized_height: 90,
                ..Default::default()
            }
        }

        pub fn with_peers(mut self, peers: &[&str]) -> Self {
            self.peers = peers.iter().map(|peer| peer.to_string()).collect();
            self
        }

        pub fn unreachable(mut self) -> Self {
            self.unreachable = true;
            self
        }

        pub fn failing_peers(mut self) -> Self {
            self.peers_fail = true;
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub fn without_api(mut self) -> Self {
            self.no_api = true;
            self
        }

        pub fn panicking(mut self) -> Self {
            self.panics = true;
            self
        }
    }

    /// Hosts, accounts and probe bookkeeping shared by every mock client.
    #[derive(Debug, Default)]
    pub struct MockNetwork {
        nodes: HashMap<String, MockNode>,
        /// Plain account lookups by public key.
        accounts: HashMap<String, AccountInfo>,
        /// Forwarded lookups, node key to main account.
        forwarded: HashMap<String, AccountInfo>,
        /// Hosts whose account lookups fail.
        failing_accounts: Vec<String>,
        node_info_calls: Mutex<HashMap<String, usize>>,
    }

    impl MockNetwork {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_node(mut self, host: &str, node: MockNode) -> Self {
            self.nodes.insert(host.to_string(), node);
            self
        }

        pub fn with_account(mut self, public_key: &str, balance: u64) -> Self {
            self.accounts.insert(
                public_key.to_string(),
                AccountInfo {
                    public_key: Some(public_key.to_string()),
                    balance,
                    remote_status: None,
                },
            );
            self
        }

        /// Make `node_key` an active remote harvester for `main_key`.
        pub fn with_remote_harvester(mut self, node_key: &str, main_key: &str) -> Self {
            self.forwarded.insert(
                node_key.to_string(),
                AccountInfo {
                    public_key: Some(main_key.to_string()),
                    balance: 0,
                    remote_status: Some("ACTIVE".to_string()),
                },
            );
            self
        }

        /// Make account lookups issued by `host` fail.
        pub fn with_failing_accounts(mut self, host: &str) -> Self {
            self.failing_accounts.push(host.to_string());
            self
        }

        /// How many times node info was requested from `host`.
        pub fn probe_count(&self, host: &str) -> usize {
            self.node_info_calls
                .lock()
                .unwrap()
                .get(host)
                .copied()
                .unwrap_or(0)
        }

        /// Every host that was probed at least once.
        pub fn probed_hosts(&self) -> Vec<String> {
            let mut hosts: Vec<String> = self
                .node_info_calls
                .lock()
                .unwrap()
                .keys()
                .cloned()
                .collect();
            hosts.sort();
            hosts
        }

        fn node(&self, host: &str) -> Result<&MockNode, ClientError> {
            self.nodes.get(host).ok_or_else(|| unavailable(host))
        }
    }

    fn unavailable(host: &str) -> ClientError {
        ClientError::Status {
            url: format!("http://{host}:3000"),
            status: 503,
        }
    }

    /// Mock client bound to one host of a [`MockNetwork`].
    #[derive(Debug, Clone)]
    pub struct MockClient {
        host: String,
        family: NetworkFamily,
        network: Arc<MockNetwork>,
    }

    impl NodeClient for MockClient {
        fn host(&self) -> &str {
            &self.host
        }

        fn port(&self) -> u16 {
            3000
        }

        async fn node_info(&self) -> Result<NodeInfo, ClientError> {
            *self
                .network
                .node_info_calls
                .lock()
                .unwrap()
                .entry(self.host.clone())
                .or_insert(0) += 1;

            let node = self.network.node(&self.host)?;
            if node.unreachable {
                return Err(unavailable(&self.host));
            }

            let body = match self.family {
                NetworkFamily::Nem => serde_json::json!({
                    "metaData": { "networkId": 104, "version": "0.6.100-BETA" },
                    "endpoint": { "protocol": "http", "host": self.host, "port": 7890 },
                    "identity": { "name": node.name, "public-key": node.public_key },
                }),
                NetworkFamily::Symbol => serde_json::json!({
                    "publicKey": node.public_key,
                    "friendlyName": node.name,
                    "host": self.host,
                    "port": 7900,
                    "roles": 3,
                }),
            };
            NodeInfo::from_json(self.family, body)
        }

        async fn peers(&self) -> Result<Vec<PeerInfo>, ClientError> {
            let node = self.network.node(&self.host)?.clone();
            if !node.delay.is_zero() {
                tokio::time::sleep(node.delay).await;
            }

            if node.panics {
                panic!("peer list of {} blew up", self.host);
            }

            if node.peers_fail {
                return Err(unavailable(&self.host));
            }

            Ok(node
                .peers
                .iter()
                .map(|host| {
                    let peer = self.network.nodes.get(host);
                    PeerInfo {
                        public_key: peer.map(|peer| peer.public_key.clone()).unwrap_or_default(),
                        name: host.clone(),
                        scheme: "http".to_string(),
                        host: host.clone(),
                        port: 3000,
                        api: !peer.is_some_and(|peer| peer.no_api),
                        version: "1.0.3.0".to_string(),
                    }
                })
                .collect())
        }

        async fn chain_height(&self) -> Result<u64, ClientError> {
            Ok(self.network.node(&self.host)?.height)
        }

        async fn finalization_info(&self) -> Result<FinalizationInfo, ClientError> {
            Ok(FinalizationInfo {
                height: self.network.node(&self.host)?.finalized_height,
            })
        }

        async fn account_info(
            &self,
            public_key: &str,
            forwarded: bool,
        ) -> Result<Option<AccountInfo>, ClientError> {
            if self.network.failing_accounts.contains(&self.host) {
                return Err(unavailable(&self.host));
            }

            if forwarded {
                if let Some(main) = self.network.forwarded.get(public_key) {
                    return Ok(Some(main.clone()));
                }
            }

            Ok(self.network.accounts.get(public_key).cloned())
        }
    }

    /// Mock connector handing out [`MockClient`]s.
    #[derive(Debug, Clone)]
    pub struct MockConnector {
        family: NetworkFamily,
        network: Arc<MockNetwork>,
    }

    impl MockConnector {
        pub fn new(family: NetworkFamily, network: MockNetwork) -> Self {
            Self {
                family,
                network: Arc::new(network),
            }
        }

        pub fn network_state(&self) -> &MockNetwork {
            &self.network
        }

        pub fn client(&self, host: &str) -> MockClient {
            MockClient {
                host: host.to_string(),
                family: self.family,
                network: self.network.clone(),
            }
        }
    }

    impl Connector for MockConnector {
        type Client = MockClient;

        fn network(&self) -> NetworkFamily {
            self.family
        }

        fn from_host(&self, host: &str) -> Option<Self::Client> {
            Some(self.client(host))
        }

        fn from_peer(&self, peer: &PeerInfo) -> Option<Self::Client> {
            if peer.host.is_empty() || !peer.api {
                return None;
            }
            Some(self.client(&peer.host))
        }
    }
}
