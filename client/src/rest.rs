//! REST client bound to a single node.

use crate::configuration::ClientConfiguration;
use crate::error::ClientError;
use crate::model::{
    parse_chain_height, parse_finalization_info, AccountInfo, FinalizationInfo, NodeInfo, PeerInfo,
};
use crate::network::{NetworkFamily, SYMBOL_CURRENCY_MOSAIC_ID};
use log::{debug, trace};
use reqwest::{StatusCode, Url};
use serde_json::Value;
use std::fmt;

/// Where a node's REST API lives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub scheme: String,
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Parse `scheme://host:port`, `host:port` or a bare `host`.
    ///
    /// Missing parts default to `http` and the network's REST port.
    pub fn parse(network: NetworkFamily, text: &str) -> Result<Self, ClientError> {
        let text = text.trim();
        let with_scheme = if text.contains("://") {
            text.to_string()
        } else {
            format!("http://{text}")
        };

        let url = Url::parse(&with_scheme).map_err(|_| ClientError::InvalidHost(text.to_string()))?;
        let host = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| ClientError::InvalidHost(text.to_string()))?;

        // `Url::port` hides a port equal to the scheme default, so `:80` and
        // `:443` must be recovered from the authority.
        let port = match url.port() {
            Some(port) => port,
            None if has_explicit_port(&with_scheme) => url
                .port_or_known_default()
                .ok_or_else(|| ClientError::InvalidHost(text.to_string()))?,
            None => network.default_port(),
        };

        Ok(Endpoint {
            scheme: url.scheme().to_string(),
            host: host.to_string(),
            port,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}://{}:{}{}", self.scheme, self.host, self.port, path)
    }
}

/// Whether the authority of `url` ends in `:<digits>`.
fn has_explicit_port(url: &str) -> bool {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();
    // Skip past an IPv6 literal so its colons are not mistaken for a port.
    let tail = host_port.rsplit(']').next().unwrap_or_default();

    tail.rsplit_once(':')
        .map_or(false, |(_, port)| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()))
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// A probe session against one node's REST API.
///
/// Instances are immutable once built and cheap to share; the underlying
/// HTTP connection pool is shared with every client built from the same
/// [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct RestClient {
    network: NetworkFamily,
    endpoint: Endpoint,
    retry_count: u32,
    currency_mosaic_id: String,
    http: reqwest::Client,
}

impl RestClient {
    /// Create a client for `host` with its own HTTP client.
    pub fn new(
        network: NetworkFamily,
        host: &str,
        configuration: &ClientConfiguration,
    ) -> Result<Self, ClientError> {
        let http = configuration.build_http_client()?;
        Ok(Self::with_http(
            network,
            Endpoint::parse(network, host)?,
            configuration.retry_count,
            http,
        ))
    }

    /// Create a client reusing an existing HTTP client.
    pub fn with_http(
        network: NetworkFamily,
        endpoint: Endpoint,
        retry_count: u32,
        http: reqwest::Client,
    ) -> Self {
        Self {
            network,
            endpoint,
            retry_count,
            currency_mosaic_id: SYMBOL_CURRENCY_MOSAIC_ID.to_string(),
            http,
        }
    }

    /// Create a client for a discovered peer.
    ///
    /// # Returns
    ///
    /// `None` when the peer advertises no host or exposes no REST API.
    pub fn from_peer(
        network: NetworkFamily,
        peer: &PeerInfo,
        retry_count: u32,
        http: reqwest::Client,
    ) -> Option<Self> {
        if peer.host.is_empty() || !peer.api {
            return None;
        }

        let endpoint = Endpoint {
            scheme: peer.scheme.clone(),
            host: peer.host.clone(),
            port: peer.port,
        };
        Some(Self::with_http(network, endpoint, retry_count, http))
    }

    /// Override the mosaic whose amount is reported as the account balance.
    pub fn with_currency_mosaic_id<S: Into<String>>(mut self, mosaic_id: S) -> Self {
        self.currency_mosaic_id = mosaic_id.into();
        self
    }

    pub fn network(&self) -> NetworkFamily {
        self.network
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Host name, the unit of deduplication while crawling.
    pub fn host(&self) -> &str {
        &self.endpoint.host
    }

    pub fn port(&self) -> u16 {
        self.endpoint.port
    }

    pub async fn node_info(&self) -> Result<NodeInfo, ClientError> {
        let body = self.get_required("/node/info").await?;
        NodeInfo::from_json(self.network, body)
    }

    pub async fn peers(&self) -> Result<Vec<PeerInfo>, ClientError> {
        let body = match self.network {
            NetworkFamily::Nem => self
                .get_required("/node/peer-list/reachable")
                .await?
                .get_mut("data")
                .map(Value::take)
                .unwrap_or(Value::Null),
            NetworkFamily::Symbol => self.get_required("/node/peers").await?,
        };

        let entries = body.as_array().ok_or_else(|| {
            ClientError::MalformedResponse(format!("peer list from {} is not an array", self.endpoint))
        })?;

        let mut peers = Vec::with_capacity(entries.len());
        for entry in entries {
            match PeerInfo::from_json(self.network, entry) {
                Ok(peer) => peers.push(peer),
                Err(e) => debug!("Skipping malformed peer from {}: {e}", self.endpoint),
            }
        }

        debug!("Collected {} peers from {}", peers.len(), self.endpoint);
        Ok(peers)
    }

    pub async fn chain_height(&self) -> Result<u64, ClientError> {
        let path = match self.network {
            NetworkFamily::Nem => "/chain/height",
            NetworkFamily::Symbol => "/chain/info",
        };
        parse_chain_height(&self.get_required(path).await?)
    }

    /// Fetch the finalized height.
    ///
    /// Only meaningful for families where [`NetworkFamily::supports_finalization`] holds.
    pub async fn finalization_info(&self) -> Result<FinalizationInfo, ClientError> {
        parse_finalization_info(&self.get_required("/chain/info").await?)
    }

    /// Fetch the account owning `public_key`.
    ///
    /// With `forwarded` set, NEM resolves a remote harvesting key to the main
    /// account it harvests for. Symbol ignores the flag.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the node does not know the account.
    pub async fn account_info(
        &self,
        public_key: &str,
        forwarded: bool,
    ) -> Result<Option<AccountInfo>, ClientError> {
        let path = match (self.network, forwarded) {
            (NetworkFamily::Nem, true) => {
                format!("/account/get/forwarded/from-public-key?publicKey={public_key}")
            }
            (NetworkFamily::Nem, false) => {
                format!("/account/get/from-public-key?publicKey={public_key}")
            }
            (NetworkFamily::Symbol, _) => format!("/accounts/{public_key}"),
        };

        match self.get_json(&path).await? {
            Some(body) => Ok(Some(AccountInfo::from_json(
                self.network,
                &body,
                &self.currency_mosaic_id,
            )?)),
            None => Ok(None),
        }
    }

    async fn get_required(&self, path: &str) -> Result<Value, ClientError> {
        self.get_json(path).await?.ok_or_else(|| ClientError::Status {
            url: self.endpoint.url(path),
            status: StatusCode::NOT_FOUND.as_u16(),
        })
    }

    /// GET `path` and decode the body, mapping 404 to `None`.
    async fn get_json(&self, path: &str) -> Result<Option<Value>, ClientError> {
        let url = self.endpoint.url(path);
        let mut attempt = 0;

        loop {
            trace!("GET {url} (attempt {})", attempt + 1);
            match self.send(&url).await {
                Err(e) if e.is_transient() && attempt < self.retry_count => {
                    debug!("Retrying {url} after transient failure: {e}");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn send(&self, url: &str) -> Result<Option<Value>, ClientError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !status.is_success() {
            return Err(ClientError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(Some(response.json::<Value>().await?))
    }
}

impl fmt::Display for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} node at {}", self.network, self.endpoint)
    }
}
