//! Seed fixtures written straight into the ledger at startup.
//!
//! A seed file is a JSON object of namespaces, each an object of keys to JSON values:
//!
//! ```json
//! { "patient": { "Pat1": { "identifier": { "value": "Pat1" } } } }
//! ```

use crate::error::{StoreError, StoreResult};
use crate::ledger::MemoryLedger;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

pub type SeedData = BTreeMap<String, BTreeMap<String, Value>>;

pub fn parse_seed(bytes: &[u8]) -> StoreResult<SeedData> {
    serde_json::from_slice(bytes).map_err(StoreError::SeedFormat)
}

/// Write every seed entry as one block. Returns the ledger height afterwards.
pub fn apply_seed(ledger: &MemoryLedger, seed: &SeedData) -> StoreResult<u64> {
    let mut entries = Vec::new();
    for (namespace, records) in seed {
        for (key, value) in records {
            let bytes = serde_json::to_vec(value).map_err(StoreError::SeedFormat)?;
            entries.push((namespace.clone(), key.clone(), bytes));
        }
    }
    if entries.is_empty() {
        return ledger.height();
    }
    let count = entries.len();
    let height = ledger.apply_block(entries)?;
    tracing::info!(entries = count, height, "seed data loaded");
    Ok(height)
}

pub fn load_seed_file(ledger: &MemoryLedger, path: &Path) -> StoreResult<u64> {
    let bytes = std::fs::read(path).map_err(|source| StoreError::SeedRead {
        path: path.to_path_buf(),
        source,
    })?;
    let seed = parse_seed(&bytes)?;
    apply_seed(ledger, &seed)
}
