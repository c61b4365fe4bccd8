//! Internal session coordination for crawling operations.
//!
//! This module contains the [`CrawlSession`] which orchestrates the crawling
//! process by sharing one [`DiscoveryState`] between a fixed pool of workers.
//!
//! # Architecture
//!
//! * **State** (`DiscoveryState`) - Visited hosts, the work queue, results and the busy count,
//!   all behind a single lock and only reachable through `pop_next` and `merge`.
//! * **Workers** (`work()`) - Pop a client, probe it outside the lock, merge the outcome back.
//!
//! A worker that finds no work while others are still probing parks on a
//! [`Notify`] that every merge signals. The crawl is over once the queue is
//! empty and no worker is busy; nothing can refill the queue after that.

use crate::client::{Connector, NodeClient};
use crate::probe::{probe, ProbeOutcome};
use crate::record::ResultMap;
use log::{debug, info, warn};
use nodewatch_client::NetworkFamily;
use rand::seq::SliceRandom;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinSet;

/// Everything workers share, guarded by one lock.
#[derive(Debug)]
pub(crate) struct DiscoveryState<C> {
    /// Hosts already handed to a worker. Never shrinks.
    visited: HashSet<String>,
    /// Clients waiting to be probed. VecDeque for FIFO.
    queue: VecDeque<C>,
    results: ResultMap,
    /// Workers holding a popped client that has not been merged yet.
    busy: usize,
}

/// What a merge changed, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct MergeSummary {
    pub enqueued: usize,
    /// Peers the connector could not build a client for.
    pub skipped: usize,
    pub replaced_other_host: bool,
}

impl<C: NodeClient> DiscoveryState<C> {
    pub(crate) fn new() -> Self {
        Self {
            visited: HashSet::new(),
            queue: VecDeque::new(),
            results: ResultMap::new(),
            busy: 0,
        }
    }

    /// Queue a seed client. Duplicates are dropped later by [`Self::pop_next`].
    pub(crate) fn push_seed(&mut self, client: C) {
        self.queue.push_back(client);
    }

    /// Take the next unvisited client, marking its host visited and the worker busy.
    ///
    /// Stale entries whose host was visited meanwhile are discarded.
    pub(crate) fn pop_next(&mut self) -> Option<C> {
        while let Some(client) = self.queue.pop_front() {
            if self.visited.insert(client.host().to_string()) {
                self.busy += 1;
                return Some(client);
            }
        }

        None
    }

    /// Apply a probe outcome and release the worker.
    ///
    /// Reachable records overwrite any record already stored under the same
    /// key. Peers are queued only if their host is neither visited nor queued.
    pub(crate) fn merge<K: Connector<Client = C>>(
        &mut self,
        outcome: ProbeOutcome,
        connector: &K,
    ) -> MergeSummary {
        let mut summary = MergeSummary {
            enqueued: 0,
            skipped: 0,
            replaced_other_host: false,
        };

        let (record, peers) = match outcome {
            ProbeOutcome::Complete { record, peers } => (Some(record), peers),
            ProbeOutcome::Partial { record, .. } => (Some(record), Vec::new()),
            ProbeOutcome::Unreachable(_) => (None, Vec::new()),
        };

        if let Some(record) = record {
            if let Some(previous) = self.results.insert(record.public_key.clone(), record) {
                let current = &self.results[&previous.public_key];
                if previous.host != current.host {
                    summary.replaced_other_host = true;
                    warn!(
                        "{} and {} share public key {}, keeping the record from {}",
                        previous.host, current.host, current.public_key, current.host
                    );
                }
            }

            for peer in &peers {
                let Some(client) = connector.from_peer(peer) else {
                    summary.skipped += 1;
                    continue;
                };

                if self.visited.contains(client.host())
                    || self.queue.iter().any(|queued| queued.host() == client.host())
                {
                    continue;
                }

                self.queue.push_back(client);
                summary.enqueued += 1;
            }
        }

        self.busy = self.busy.saturating_sub(1);
        summary
    }

    pub(crate) fn is_exhausted(&self) -> bool {
        self.queue.is_empty() && self.busy == 0
    }

    pub(crate) fn busy(&self) -> usize {
        self.busy
    }

    pub(crate) fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn discovered(&self) -> usize {
        self.results.len()
    }

    pub(crate) fn into_results(self) -> ResultMap {
        self.results
    }
}

/// Internal coordinator for a crawling session.
pub(crate) struct CrawlSession<K: Connector> {
    connector: K,
    network: NetworkFamily,
    /// Trusted clients answering account lookups.
    strong_clients: Arc<Vec<K::Client>>,
    state: Arc<Mutex<DiscoveryState<K::Client>>>,
    /// Signalled after every merge.
    wake: Arc<Notify>,
    worker_count: usize,
}

impl<K: Connector> Clone for CrawlSession<K> {
    fn clone(&self) -> Self {
        Self {
            connector: self.connector.clone(),
            network: self.network,
            strong_clients: self.strong_clients.clone(),
            state: self.state.clone(),
            wake: self.wake.clone(),
            worker_count: self.worker_count,
        }
    }
}

impl<K: Connector> CrawlSession<K> {
    pub(crate) fn new(
        connector: K,
        state: DiscoveryState<K::Client>,
        strong_clients: Vec<K::Client>,
        worker_count: usize,
    ) -> Self {
        Self {
            network: connector.network(),
            connector,
            strong_clients: Arc::new(strong_clients),
            state: Arc::new(Mutex::new(state)),
            wake: Arc::new(Notify::new()),
            worker_count,
        }
    }

    /// Run the worker pool to exhaustion and hand back the results.
    pub(crate) async fn coordinate(self) -> Result<ResultMap, tokio::task::JoinError> {
        info!("starting {} crawler workers", self.worker_count);

        let mut workers = JoinSet::new();
        for id in 0..self.worker_count {
            let session = self.clone();
            workers.spawn(async move { session.work(id).await });
        }

        // A failed worker never releases its busy slot, so its siblings
        // would park forever.
        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                warn!("crawler worker failed, stopping the crawl: {e}");
                workers.abort_all();
                return Err(e);
            }
        }

        let mut state = self.state.lock().await;
        let state = std::mem::replace(&mut *state, DiscoveryState::new());
        Ok(state.into_results())
    }

    /// Worker loop: poll for a client, probe it, merge, repeat until exhausted.
    async fn work(&self, id: usize) {
        loop {
            let client = {
                let mut state = self.state.lock().await;
                let next = state.pop_next();
                match next {
                    Some(client) => {
                        debug!(
                            "worker {id} processing {}:{} [{} discovered, {} remaining, {} busy]",
                            client.host(),
                            client.port(),
                            state.discovered(),
                            state.remaining(),
                            state.busy()
                        );
                        client
                    }
                    None if state.is_exhausted() => {
                        // Release any sibling still parked so it can observe exhaustion too.
                        self.wake.notify_waiters();
                        break;
                    }
                    None => {
                        // Register before unlocking so a merge in between is not missed.
                        let notified = self.wake.notified();
                        tokio::pin!(notified);
                        notified.as_mut().enable();
                        drop(state);
                        notified.await;
                        continue;
                    }
                }
            };

            let outcome = probe(&client, self.network, self.strong_client(&client)).await;
            match &outcome {
                ProbeOutcome::Complete { peers, .. } => {
                    debug!("{} reported {} peers", client.host(), peers.len());
                }
                ProbeOutcome::Partial { error, .. } => {
                    info!(
                        "failed to load peers from {}:{} (reachable node? true): {error}",
                        client.host(),
                        client.port()
                    );
                }
                ProbeOutcome::Unreachable(error) => {
                    warn!(
                        "failed to load peers from {}:{} (reachable node? false): {error}",
                        client.host(),
                        client.port()
                    );
                }
            }

            let busy = {
                let mut state = self.state.lock().await;
                let summary = state.merge(outcome, &self.connector);
                if summary.enqueued > 0 {
                    debug!("queued {} new hosts from {}", summary.enqueued, client.host());
                }
                if summary.skipped > 0 {
                    debug!(
                        "skipped {} peers of {} without a REST endpoint",
                        summary.skipped,
                        client.host()
                    );
                }
                state.busy()
            };
            self.wake.notify_waiters();

            if busy + 1 < self.worker_count {
                debug!("idling workers detected; only {busy} busy");
            }
        }

        debug!("worker {id} exiting");
    }

    /// Pick a random strong client, falling back to the probed node itself.
    fn strong_client<'a>(&'a self, client: &'a K::Client) -> &'a K::Client {
        self.strong_clients
            .choose(&mut rand::thread_rng())
            .unwrap_or(client)
    }
}
