//! Seed node catalog loaded from a resources directory.

use nodewatch_client::{NetworkFamily, SYMBOL_CURRENCY_MOSAIC_ID};
use serde::Deserialize;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Catalog file expected inside a resources directory.
pub const CATALOG_FILE: &str = "resources.toml";
/// Role keeping a node out of the strong client pool.
pub const SEED_ONLY_ROLE: &str = "seed-only";

/// Errors that can occur while loading a catalog.
#[derive(Debug)]
pub enum CatalogError {
    /// The catalog file could not be read.
    Io(io::Error),
    /// The catalog file is not valid TOML or misses required fields.
    Parse(toml::de::Error),
    /// The catalog names a network family that is not supported.
    UnknownNetwork(String),
    /// The catalog lists no nodes.
    EmptyNodeList,
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::Io(err) => write!(f, "Could not read node catalog: {err}"),
            CatalogError::Parse(err) => write!(f, "Could not parse node catalog: {err}"),
            CatalogError::UnknownNetwork(network) => {
                write!(f, "Unknown network family '{network}'")
            }
            CatalogError::EmptyNodeList => write!(f, "Node catalog lists no nodes"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CatalogError::Io(err) => Some(err),
            CatalogError::Parse(err) => Some(err),
            CatalogError::UnknownNetwork(_) => None,
            CatalogError::EmptyNodeList => None,
        }
    }
}

impl From<io::Error> for CatalogError {
    fn from(err: io::Error) -> Self {
        CatalogError::Io(err)
    }
}

impl From<toml::de::Error> for CatalogError {
    fn from(err: toml::de::Error) -> Self {
        CatalogError::Parse(err)
    }
}

/// A known node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeDescriptor {
    pub name: String,
    /// REST endpoint, e.g. `http://node.example:3000`.
    pub host: String,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl NodeDescriptor {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    network: String,
    currency_mosaic_id: Option<String>,
    #[serde(default)]
    nodes: Vec<NodeDescriptor>,
}

/// The network family and its seed nodes.
#[derive(Debug, Clone)]
pub struct NodeCatalog {
    network: NetworkFamily,
    currency_mosaic_id: String,
    nodes: Vec<NodeDescriptor>,
}

impl NodeCatalog {
    pub fn new(network: NetworkFamily, nodes: Vec<NodeDescriptor>) -> Self {
        Self {
            network,
            currency_mosaic_id: SYMBOL_CURRENCY_MOSAIC_ID.to_string(),
            nodes,
        }
    }

    /// Load `resources.toml` from `directory`.
    pub fn load(directory: &Path) -> Result<Self, CatalogError> {
        let text = fs::read_to_string(directory.join(CATALOG_FILE))?;
        Self::from_toml_str(&text)
    }

    /// Parse catalog TOML.
    ///
    /// # Example
    ///
    /// ```
    /// use nodewatch_crawler::NodeCatalog;
    ///
    /// let catalog = NodeCatalog::from_toml_str(r#"
    ///     network = "symbol"
    ///
    ///     [[nodes]]
    ///     name = "alice"
    ///     host = "http://alice.example:3000"
    ///     roles = ["seed-only"]
    /// "#).unwrap();
    ///
    /// assert_eq!(catalog.find_all_by_role(None).len(), 1);
    /// assert!(catalog.find_all_not_by_role("seed-only").is_empty());
    /// ```
    pub fn from_toml_str(text: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(text)?;
        let network = file
            .network
            .parse()
            .map_err(CatalogError::UnknownNetwork)?;

        if file.nodes.is_empty() {
            return Err(CatalogError::EmptyNodeList);
        }

        let mut catalog = Self::new(network, file.nodes);
        if let Some(mosaic_id) = file.currency_mosaic_id {
            catalog.currency_mosaic_id = mosaic_id;
        }
        Ok(catalog)
    }

    pub fn with_currency_mosaic_id<S: Into<String>>(mut self, mosaic_id: S) -> Self {
        self.currency_mosaic_id = mosaic_id.into();
        self
    }

    pub fn network(&self) -> NetworkFamily {
        self.network
    }

    /// Mosaic whose amount is reported as a Symbol account balance.
    pub fn currency_mosaic_id(&self) -> &str {
        &self.currency_mosaic_id
    }

    /// Nodes carrying `role`, or every node when `role` is `None`.
    pub fn find_all_by_role(&self, role: Option<&str>) -> Vec<&NodeDescriptor> {
        self.nodes
            .iter()
            .filter(|node| role.map_or(true, |role| node.has_role(role)))
            .collect()
    }

    /// Nodes not carrying `role`.
    pub fn find_all_not_by_role(&self, role: &str) -> Vec<&NodeDescriptor> {
        self.nodes.iter().filter(|node| !node.has_role(role)).collect()
    }
}
