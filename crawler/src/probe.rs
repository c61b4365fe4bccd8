//! Probing a single node.
//!
//! A probe runs entirely outside the session lock and reports a
//! [`ProbeOutcome`] that tells the merge step what survives.

use crate::client::NodeClient;
use crate::record::NodeRecord;
use nodewatch_client::{ClientError, NetworkFamily, PeerInfo};

/// Result of probing one node.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// Every request succeeded.
    Complete {
        record: NodeRecord,
        peers: Vec<PeerInfo>,
    },
    /// The node identified itself but a later request failed.
    ///
    /// The record keeps whatever extra data was gathered before the failure
    /// and contributes no peers.
    Partial {
        record: NodeRecord,
        error: ClientError,
    },
    /// Node info or identity resolution failed. Nothing is kept.
    Unreachable(ClientError),
}

impl ProbeOutcome {
    pub fn is_reachable(&self) -> bool {
        !matches!(self, ProbeOutcome::Unreachable(_))
    }

    pub fn record(&self) -> Option<&NodeRecord> {
        match self {
            ProbeOutcome::Complete { record, .. } | ProbeOutcome::Partial { record, .. } => {
                Some(record)
            }
            ProbeOutcome::Unreachable(_) => None,
        }
    }
}

/// Probe `client`.
///
/// # Arguments
///
/// * `client` - Client bound to the node being probed.
/// * `network` - Family deciding identity and finalization rules.
/// * `strong` - Trusted client answering account lookups.
pub async fn probe<C: NodeClient>(client: &C, network: NetworkFamily, strong: &C) -> ProbeOutcome {
    let info = match client.node_info().await {
        Ok(info) => info,
        Err(e) => return ProbeOutcome::Unreachable(e),
    };

    let mut record = NodeRecord::new(client.host(), info);

    if network.has_remote_harvesters() {
        if let Err(e) = resolve_main_account(&mut record, strong).await {
            return ProbeOutcome::Unreachable(e);
        }
    }

    match gather(client, network, strong, &mut record).await {
        Ok(peers) => ProbeOutcome::Complete { record, peers },
        Err(error) => ProbeOutcome::Partial { record, error },
    }
}

/// Replace a remote harvester's key with its main account key.
async fn resolve_main_account<C: NodeClient>(
    record: &mut NodeRecord,
    strong: &C,
) -> Result<(), ClientError> {
    let account = strong.account_info(&record.public_key, true).await?;

    if let Some(account) = account.filter(|account| account.is_remote_active()) {
        if let Some(main_public_key) = account.public_key {
            record.promote_main_account(&main_public_key);
        }
    }

    Ok(())
}

/// Fetch peers, heights and balance, filling `record` as values arrive.
async fn gather<C: NodeClient>(
    client: &C,
    network: NetworkFamily,
    strong: &C,
    record: &mut NodeRecord,
) -> Result<Vec<PeerInfo>, ClientError> {
    let peers = client.peers().await?;

    record.extra_data.height = client.chain_height().await?;

    if network.supports_finalization() {
        record.extra_data.finalized_height = client.finalization_info().await?.height;
    }

    record.extra_data.balance = strong
        .account_info(&record.public_key, false)
        .await?
        .map(|account| account.balance)
        .unwrap_or(0);

    Ok(peers)
}
