//! Discovered node records.

use nodewatch_client::NodeInfo;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Discovery output, keyed by each node's resolved public key.
pub type ResultMap = HashMap<String, NodeRecord>;

/// Chain and account facts gathered after a node identified itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtraData {
    pub balance: u64,
    pub height: u64,
    #[serde(rename = "finalizedHeight")]
    pub finalized_height: u64,
}

/// A probed node: its node-info payload plus an `extraData` block.
///
/// Serializes as the payload object with `extraData` added alongside the
/// node's own fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeRecord {
    /// Host the record was probed from.
    #[serde(skip)]
    pub host: String,
    /// Display name reported by the node.
    #[serde(skip)]
    pub name: String,
    /// Resolved identity used as the [`ResultMap`] key.
    #[serde(skip)]
    pub public_key: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
    #[serde(rename = "extraData")]
    pub extra_data: ExtraData,
}

impl NodeRecord {
    /// Start a record from node info, with zeroed extra data.
    pub fn new(host: &str, info: NodeInfo) -> Self {
        let mut payload = info.payload;
        payload.remove("extraData");

        NodeRecord {
            host: host.to_string(),
            name: info.name,
            public_key: info.public_key,
            payload,
            extra_data: ExtraData::default(),
        }
    }

    /// Re-key a remote harvester under the main account it harvests for.
    ///
    /// The node's own key is kept as `identity.node-public-key` and the main
    /// account key replaces `identity.public-key`.
    pub fn promote_main_account(&mut self, main_public_key: &str) {
        if let Some(Value::Object(identity)) = self.payload.get_mut("identity") {
            identity.insert(
                "node-public-key".to_string(),
                Value::String(self.public_key.clone()),
            );
            identity.insert(
                "public-key".to_string(),
                Value::String(main_public_key.to_string()),
            );
        }

        self.public_key = main_public_key.to_string();
    }
}
