//! Persisting discovery results.

use crate::record::{NodeRecord, ResultMap};
use log::info;
use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Errors that can occur while saving results.
#[derive(Debug)]
pub enum WriterError {
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for WriterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriterError::Io(err) => write!(f, "Could not write nodes file: {err}"),
            WriterError::Json(err) => write!(f, "Could not serialize nodes: {err}"),
        }
    }
}

impl Error for WriterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WriterError::Io(err) => Some(err),
            WriterError::Json(err) => Some(err),
        }
    }
}

impl From<io::Error> for WriterError {
    fn from(err: io::Error) -> Self {
        WriterError::Io(err)
    }
}

impl From<serde_json::Error> for WriterError {
    fn from(err: serde_json::Error) -> Self {
        WriterError::Json(err)
    }
}

/// Records ordered by node name, then public key.
pub fn sorted_records(results: &ResultMap) -> Vec<&NodeRecord> {
    let mut records: Vec<&NodeRecord> = results.values().collect();
    records.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.public_key.cmp(&b.public_key))
    });
    records
}

/// Render results as a pretty-printed JSON array of records.
pub fn to_json(results: &ResultMap) -> Result<String, WriterError> {
    Ok(serde_json::to_string_pretty(&sorted_records(results))?)
}

/// Write results to `path`.
pub fn save(results: &ResultMap, path: &Path) -> Result<(), WriterError> {
    info!("saving nodes json to {}", path.display());
    let mut json = to_json(results)?;
    json.push('\n');
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ExtraData;
    use serde_json::{json, Map};

    fn record(name: &str, key: &str) -> NodeRecord {
        let mut payload = Map::new();
        payload.insert("friendlyName".to_string(), json!(name));
        payload.insert("publicKey".to_string(), json!(key));
        NodeRecord {
            host: format!("{name}.example"),
            name: name.to_string(),
            public_key: key.to_string(),
            payload,
            extra_data: ExtraData {
                balance: 1,
                height: 2,
                finalized_height: 3,
            },
        }
    }

    #[test]
    fn test_records_sorted_by_name_then_key() {
        let mut results = ResultMap::new();
        for (name, key) in [("carol", "C"), ("alice", "B"), ("alice", "A")] {
            results.insert(key.to_string(), record(name, key));
        }

        let order: Vec<&str> = sorted_records(&results)
            .into_iter()
            .map(|record| record.public_key.as_str())
            .collect();
        assert_eq!(order, ["A", "B", "C"]);
    }

    #[test]
    fn test_json_shape() {
        let mut results = ResultMap::new();
        results.insert("A".to_string(), record("alice", "A"));

        let value: serde_json::Value = serde_json::from_str(&to_json(&results).unwrap()).unwrap();
        assert_eq!(
            value,
            json!([{
                "friendlyName": "alice",
                "publicKey": "A",
                "extraData": { "balance": 1, "height": 2, "finalizedHeight": 3 },
            }])
        );
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(to_json(&ResultMap::new()).unwrap(), "[]");
    }
}
