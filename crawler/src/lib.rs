//! Concurrent node discovery for NEM and Symbol networks.
//!
//! Starting from a catalog of seed nodes, the crawler probes every node it
//! learns about through peer lists and collects one record per identity.

mod builder;
mod catalog;
mod client;
mod crawler;
mod peers_map;
mod probe;
mod record;
mod session;
pub mod writer;

pub use builder::{CrawlerBuilder, CrawlerBuilderError, DEFAULT_WORKER_COUNT};
pub use catalog::{CatalogError, NodeCatalog, NodeDescriptor, CATALOG_FILE, SEED_ONLY_ROLE};
pub use client::{Connector, NodeClient, RestConnector};
pub use crawler::{Crawler, CrawlerError};
pub use peers_map::{PeerDescriptor, PeersMapBuilder, PeersMapError};
pub use probe::{probe, ProbeOutcome};
pub use record::{ExtraData, NodeRecord, ResultMap};
pub use writer::WriterError;

// Re-exports.
pub use nodewatch_client::{
    AccountInfo, ClientConfiguration, ClientError, Endpoint, FinalizationInfo, NetworkFamily,
    NodeInfo, PeerInfo, RestClient, UserAgent, UserAgentError,
};
