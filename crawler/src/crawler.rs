//! Discovery coordinator.

use crate::catalog::{NodeCatalog, SEED_ONLY_ROLE};
use crate::client::Connector;
use crate::record::ResultMap;
use crate::session::{CrawlSession, DiscoveryState};
use log::{info, warn};
use std::fmt;

/// Errors that can abort a discovery run.
#[derive(Debug)]
pub enum CrawlerError {
    /// No seed client could be queued, so there is nothing to crawl.
    EmptySeedList,
    /// [`Crawler::seed`] was called twice.
    AlreadySeeded,
    /// [`Crawler::run`] was called before [`Crawler::seed`].
    NotSeeded,
    /// A worker task panicked or was cancelled.
    WorkerFailed(tokio::task::JoinError),
}

impl fmt::Display for CrawlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlerError::EmptySeedList => write!(f, "No seed nodes available to start crawling"),
            CrawlerError::AlreadySeeded => write!(f, "Crawler was already seeded"),
            CrawlerError::NotSeeded => write!(f, "Crawler must be seeded before running"),
            CrawlerError::WorkerFailed(err) => write!(f, "Crawler worker failed: {err}"),
        }
    }
}

impl std::error::Error for CrawlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CrawlerError::WorkerFailed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<tokio::task::JoinError> for CrawlerError {
    fn from(err: tokio::task::JoinError) -> Self {
        CrawlerError::WorkerFailed(err)
    }
}

/// A crawler for a blockchain node network.
///
/// The crawler probes every seed, follows each node's peer list and keeps
/// one record per node identity. Build one with
/// [`CrawlerBuilder`](crate::CrawlerBuilder), [`seed`](Crawler::seed) it from
/// a catalog, then [`run`](Crawler::run) it.
pub struct Crawler<K: Connector> {
    connector: K,
    worker_count: usize,
    state: DiscoveryState<K::Client>,
    strong_clients: Vec<K::Client>,
    seeded: bool,
}

impl<K: Connector> Crawler<K> {
    pub(crate) fn new(connector: K, worker_count: usize) -> Self {
        Self {
            connector,
            worker_count,
            state: DiscoveryState::new(),
            strong_clients: Vec::new(),
            seeded: false,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Queue every catalog node and build the strong client pool.
    ///
    /// Strong clients are the catalog nodes not tagged `seed-only`; they
    /// answer account lookups. No host is marked visited here.
    ///
    /// # Returns
    ///
    /// The number of queued seed clients.
    pub fn seed(&mut self, catalog: &NodeCatalog) -> Result<usize, CrawlerError> {
        if self.seeded {
            return Err(CrawlerError::AlreadySeeded);
        }

        info!("seeding crawler with known hosts");

        let mut seeds = 0;
        for node in catalog.find_all_by_role(None) {
            if let Some(client) = self.connector.from_host(&node.host) {
                self.state.push_seed(client);
                seeds += 1;
            }
        }

        if seeds == 0 {
            return Err(CrawlerError::EmptySeedList);
        }

        self.strong_clients = catalog
            .find_all_not_by_role(SEED_ONLY_ROLE)
            .into_iter()
            .filter_map(|node| self.connector.from_host(&node.host))
            .collect();

        if self.strong_clients.is_empty() {
            warn!("no strong clients in catalog, nodes will answer their own account lookups");
        }

        info!(
            "seeded {seeds} hosts with {} strong clients",
            self.strong_clients.len()
        );
        self.seeded = true;
        Ok(seeds)
    }

    /// Crawl until every reachable host has been probed.
    ///
    /// Blocks until all workers exit; no partial results are visible before.
    pub async fn run(self) -> Result<ResultMap, CrawlerError> {
        if !self.seeded {
            return Err(CrawlerError::NotSeeded);
        }

        let session = CrawlSession::new(
            self.connector,
            self.state,
            self.strong_clients,
            self.worker_count,
        );
        let results = session.coordinate().await?;

        info!("crawling completed and discovered {} nodes", results.len());
        Ok(results)
    }
}

impl<K: Connector> fmt::Debug for Crawler<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crawler")
            .field("network", &self.connector.network())
            .field("worker_count", &self.worker_count)
            .field("strong_clients", &self.strong_clients.len())
            .field("seeded", &self.seeded)
            .finish()
    }
}
