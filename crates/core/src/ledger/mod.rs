//! In-memory ledger with MVCC transaction validation.
//!
//! This is the backing store behind every contract's [`StateStore`](crate::store::StateStore).
//! It models the behaviour the contracts rely on from a real ledger:
//!
//! - state is partitioned into namespaces (one per contract) of ordered key/value pairs;
//! - a [`Transaction`] reads committed state and buffers its writes;
//! - [`MemoryLedger::commit`] re-checks the version of every key the transaction read and
//!   rejects the whole transaction if any changed, so two transactions racing to create the
//!   same key cannot both commit;
//! - range scans and rich queries return a [`QueryCursor`].
//!
//! Reads do not observe the transaction's own pending writes.

pub mod cursor;
pub mod query;

pub use cursor::{QueryCursor, QueryMetadata, QueryRecord};
pub use query::RichQuery;

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard};

/// Attributes carried by the caller's signed identity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identity {
    attributes: BTreeMap<String, String>,
}

impl Identity {
    pub fn new(attributes: BTreeMap<String, String>) -> Self {
        Self { attributes }
    }

    /// Identity carrying a single attribute.
    pub fn with_attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert(name.into(), value.into());
        Self { attributes }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Value of attribute `name`, if the identity carries it.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

#[derive(Clone, Debug)]
struct VersionedValue {
    value: Vec<u8>,
    version: u64,
}

#[derive(Debug, Default)]
struct LedgerState {
    namespaces: HashMap<String, BTreeMap<String, VersionedValue>>,
    height: u64,
}

impl LedgerState {
    fn version_of(&self, namespace: &str, key: &str) -> Option<u64> {
        self.namespaces
            .get(namespace)
            .and_then(|ns| ns.get(key))
            .map(|v| v.version)
    }
}

type StateKey = (String, String);

/// A unit of work against the ledger: its identity, read set and buffered writes.
#[derive(Debug)]
pub struct Transaction {
    tx_id: String,
    channel_id: String,
    timestamp: DateTime<Utc>,
    identity: Identity,
    reads: BTreeMap<StateKey, Option<u64>>,
    writes: BTreeMap<StateKey, Option<Vec<u8>>>,
}

impl Transaction {
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// Number of keys this transaction will write or delete on commit.
    pub fn pending_writes(&self) -> usize {
        self.writes.len()
    }

    fn record_read(&mut self, namespace: &str, key: &str, version: Option<u64>) {
        self.reads
            .entry((namespace.to_string(), key.to_string()))
            .or_insert(version);
    }
}

/// Ledger state shared by every contract on one channel.
#[derive(Debug)]
pub struct MemoryLedger {
    channel_id: String,
    state: RwLock<LedgerState>,
    open_cursors: Arc<AtomicUsize>,
}

impl MemoryLedger {
    pub fn new(channel_id: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            state: RwLock::new(LedgerState::default()),
            open_cursors: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Number of committed blocks that changed state.
    pub fn height(&self) -> StoreResult<u64> {
        Ok(self.read_state()?.height)
    }

    /// Cursors handed out and not yet closed.
    pub fn open_cursor_count(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    /// Start a transaction on `channel_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownChannel`] if this ledger does not serve `channel_id`.
    pub fn begin(&self, channel_id: &str, identity: Identity) -> StoreResult<Transaction> {
        if channel_id != self.channel_id {
            return Err(StoreError::UnknownChannel(channel_id.to_string()));
        }
        Ok(Transaction {
            tx_id: uuid::Uuid::new_v4().simple().to_string(),
            channel_id: channel_id.to_string(),
            timestamp: Utc::now(),
            identity,
            reads: BTreeMap::new(),
            writes: BTreeMap::new(),
        })
    }

    fn read_state(&self) -> StoreResult<RwLockReadGuard<'_, LedgerState>> {
        self.state.read().map_err(|_| StoreError::Poisoned)
    }

    /// Read the committed value of `key`, recording the observed version.
    pub fn get(
        &self,
        tx: &mut Transaction,
        namespace: &str,
        key: &str,
    ) -> StoreResult<Option<Vec<u8>>> {
        let state = self.read_state()?;
        let entry = state.namespaces.get(namespace).and_then(|ns| ns.get(key));
        tx.record_read(namespace, key, entry.map(|v| v.version));
        Ok(entry.map(|v| v.value.clone()))
    }

    pub fn put(&self, tx: &mut Transaction, namespace: &str, key: &str, value: Vec<u8>) {
        tx.writes
            .insert((namespace.to_string(), key.to_string()), Some(value));
    }

    pub fn delete(&self, tx: &mut Transaction, namespace: &str, key: &str) {
        tx.writes.insert((namespace.to_string(), key.to_string()), None);
    }

    /// Scan keys in `[start, end)`. An empty bound is open on that side.
    ///
    /// Every returned key joins the transaction's read set.
    pub fn range(
        &self,
        tx: &mut Transaction,
        namespace: &str,
        start: &str,
        end: &str,
    ) -> StoreResult<QueryCursor> {
        let lower = if start.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Included(start.to_string())
        };
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else {
            Bound::Excluded(end.to_string())
        };
        if let (Bound::Included(s), Bound::Excluded(e)) = (&lower, &upper) {
            if s > e {
                return Err(StoreError::InvalidQuery(format!(
                    "range start '{s}' is after end '{e}'"
                )));
            }
        }

        let state = self.read_state()?;
        let mut records = Vec::new();
        if let Some(ns) = state.namespaces.get(namespace) {
            for (key, entry) in ns.range((lower, upper)) {
                tx.record_read(namespace, key, Some(entry.version));
                records.push(QueryRecord {
                    key: key.clone(),
                    value: entry.value.clone(),
                });
            }
        }
        Ok(QueryCursor::tracked(records, self.open_cursors.clone()))
    }

    /// Execute a rich query against committed state. Matches come back in key order.
    pub fn query(&self, namespace: &str, query: &str) -> StoreResult<QueryCursor> {
        let query = RichQuery::parse(query)?;
        let matches = self.matching(namespace, &query, None)?;
        Ok(QueryCursor::tracked(
            query.window(matches),
            self.open_cursors.clone(),
        ))
    }

    /// Execute a rich query and return at most `page_size` matches after `bookmark`.
    ///
    /// `limit` and `skip` in the query text are ignored; paging is controlled entirely by
    /// `page_size` and `bookmark`.
    pub fn query_page(
        &self,
        namespace: &str,
        query: &str,
        page_size: usize,
        bookmark: &str,
    ) -> StoreResult<(QueryCursor, QueryMetadata)> {
        if page_size == 0 {
            return Err(StoreError::InvalidQuery("page size must be positive".into()));
        }
        let query = RichQuery::parse(query)?;
        let after = (!bookmark.is_empty()).then_some(bookmark);
        let mut page = self.matching(namespace, &query, after)?;
        page.truncate(page_size);

        let metadata = QueryMetadata {
            fetched_records_count: page.len(),
            bookmark: page
                .last()
                .map(|r| r.key.clone())
                .unwrap_or_else(|| bookmark.to_string()),
        };
        Ok((
            QueryCursor::tracked(page, self.open_cursors.clone()),
            metadata,
        ))
    }

    fn matching(
        &self,
        namespace: &str,
        query: &RichQuery,
        after: Option<&str>,
    ) -> StoreResult<Vec<QueryRecord>> {
        let state = self.read_state()?;
        let Some(ns) = state.namespaces.get(namespace) else {
            return Ok(Vec::new());
        };
        let lower = match after {
            Some(key) => Bound::Excluded(key.to_string()),
            None => Bound::Unbounded,
        };

        let matches = ns
            .range((lower, Bound::Unbounded))
            .filter(|(_, entry)| {
                serde_json::from_slice::<serde_json::Value>(&entry.value)
                    .map(|doc| query.matches(&doc))
                    .unwrap_or(false)
            })
            .map(|(key, entry)| QueryRecord {
                key: key.clone(),
                value: entry.value.clone(),
            })
            .collect();
        Ok(matches)
    }

    /// Validate and apply a transaction.
    ///
    /// Returns the ledger height after the commit. A transaction without writes is validated
    /// but does not advance the height.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ReadConflict`] if any key the transaction read has been written
    /// since; nothing is applied in that case.
    pub fn commit(&self, tx: Transaction) -> StoreResult<u64> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;

        for ((namespace, key), observed) in &tx.reads {
            if state.version_of(namespace, key) != *observed {
                tracing::warn!(
                    tx_id = %tx.tx_id,
                    namespace = %namespace,
                    key = %key,
                    "MVCC read conflict"
                );
                return Err(StoreError::ReadConflict {
                    namespace: namespace.clone(),
                    key: key.clone(),
                });
            }
        }

        if tx.writes.is_empty() {
            return Ok(state.height);
        }

        state.height += 1;
        let version = state.height;
        for ((namespace, key), value) in tx.writes {
            let ns = state.namespaces.entry(namespace).or_default();
            match value {
                Some(value) => {
                    ns.insert(key, VersionedValue { value, version });
                }
                None => {
                    ns.remove(&key);
                }
            }
        }

        tracing::debug!(tx_id = %tx.tx_id, height = version, "transaction committed");
        Ok(version)
    }

    /// Write values directly as one block, bypassing contracts. Used to load fixtures.
    pub fn apply_block(
        &self,
        entries: impl IntoIterator<Item = (String, String, Vec<u8>)>,
    ) -> StoreResult<u64> {
        let mut state = self.state.write().map_err(|_| StoreError::Poisoned)?;
        state.height += 1;
        let version = state.height;
        for (namespace, key, value) in entries {
            state
                .namespaces
                .entry(namespace)
                .or_default()
                .insert(key, VersionedValue { value, version });
        }
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHANNEL: &str = "testchannel";
    const NS: &str = "patient";

    fn ledger() -> MemoryLedger {
        MemoryLedger::new(CHANNEL)
    }

    fn begin(ledger: &MemoryLedger) -> Transaction {
        ledger
            .begin(CHANNEL, Identity::default())
            .expect("begin should succeed")
    }

    fn seed(ledger: &MemoryLedger, key: &str, value: &str) {
        let mut tx = begin(ledger);
        ledger.put(&mut tx, NS, key, value.as_bytes().to_vec());
        ledger.commit(tx).expect("seed commit should succeed");
    }

    #[test]
    fn test_begin_rejects_unknown_channel() {
        let err = ledger()
            .begin("other", Identity::default())
            .expect_err("channel is not served");
        assert!(matches!(err, StoreError::UnknownChannel(c) if c == "other"));
    }

    #[test]
    fn test_writes_are_invisible_until_commit() {
        let ledger = ledger();
        let mut tx = begin(&ledger);
        ledger.put(&mut tx, NS, "P1", b"{}".to_vec());
        assert_eq!(ledger.get(&mut tx, NS, "P1").expect("get"), None);
        assert_eq!(tx.pending_writes(), 1);
        ledger.commit(tx).expect("commit");

        let mut reader = begin(&ledger);
        assert_eq!(
            ledger.get(&mut reader, NS, "P1").expect("get"),
            Some(b"{}".to_vec())
        );
        assert_eq!(ledger.height().expect("height"), 1);
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let ledger = ledger();
        seed(&ledger, "P1", "{}");
        let mut tx = begin(&ledger);
        assert_eq!(ledger.get(&mut tx, "practitioner", "P1").expect("get"), None);
    }

    #[test]
    fn test_concurrent_creates_of_same_key_conflict() {
        let ledger = ledger();
        let mut first = begin(&ledger);
        let mut second = begin(&ledger);

        assert_eq!(ledger.get(&mut first, NS, "P1").expect("get"), None);
        assert_eq!(ledger.get(&mut second, NS, "P1").expect("get"), None);
        ledger.put(&mut first, NS, "P1", b"{\"a\":1}".to_vec());
        ledger.put(&mut second, NS, "P1", b"{\"a\":2}".to_vec());

        ledger.commit(first).expect("first commit wins");
        let err = ledger.commit(second).expect_err("second commit must conflict");
        assert!(matches!(err, StoreError::ReadConflict { ref key, .. } if key == "P1"));

        let mut reader = begin(&ledger);
        assert_eq!(
            ledger.get(&mut reader, NS, "P1").expect("get"),
            Some(b"{\"a\":1}".to_vec())
        );
    }

    #[test]
    fn test_failed_commit_applies_nothing() {
        let ledger = ledger();
        seed(&ledger, "P1", "{}");

        let mut stale = begin(&ledger);
        ledger.get(&mut stale, NS, "P1").expect("get");
        ledger.put(&mut stale, NS, "P2", b"{}".to_vec());
        seed(&ledger, "P1", "{\"changed\":true}");

        let height = ledger.height().expect("height");
        ledger.commit(stale).expect_err("stale read must conflict");
        assert_eq!(ledger.height().expect("height"), height);

        let mut reader = begin(&ledger);
        assert_eq!(ledger.get(&mut reader, NS, "P2").expect("get"), None);
    }

    #[test]
    fn test_delete_removes_key() {
        let ledger = ledger();
        seed(&ledger, "P1", "{}");
        let mut tx = begin(&ledger);
        ledger.delete(&mut tx, NS, "P1");
        ledger.commit(tx).expect("commit");

        let mut reader = begin(&ledger);
        assert_eq!(ledger.get(&mut reader, NS, "P1").expect("get"), None);
    }

    #[test]
    fn test_range_scan_bounds() {
        let ledger = ledger();
        for key in ["a", "b", "c", "d"] {
            seed(&ledger, key, "{}");
        }
        let mut tx = begin(&ledger);
        let keys: Vec<String> = ledger
            .range(&mut tx, NS, "b", "d")
            .expect("range")
            .map(|r| r.key)
            .collect();
        assert_eq!(keys, vec!["b", "c"]);

        let all = ledger.range(&mut tx, NS, "", "").expect("range").count();
        assert_eq!(all, 4);
        assert_eq!(ledger.open_cursor_count(), 0);

        assert!(ledger.range(&mut tx, NS, "d", "a").is_err());
    }

    #[test]
    fn test_rich_query_filters_and_skips_non_objects() {
        let ledger = ledger();
        seed(&ledger, "P1", r#"{"gender":"female"}"#);
        seed(&ledger, "P2", r#"{"gender":"male"}"#);
        seed(&ledger, "followedPatients_Dr1", r#"["P1"]"#);

        let keys: Vec<String> = ledger
            .query(NS, r#"{"selector":{"gender":"female"}}"#)
            .expect("query")
            .map(|r| r.key)
            .collect();
        assert_eq!(keys, vec!["P1"]);

        let everything = ledger.query(NS, r#"{"selector":{}}"#).expect("query").count();
        assert_eq!(everything, 2);
    }

    #[test]
    fn test_rich_query_on_empty_namespace_is_empty() {
        let ledger = ledger();
        let mut cursor = ledger.query(NS, r#"{"selector":{}}"#).expect("query");
        assert!(!cursor.has_next());
        cursor.close();
        assert_eq!(ledger.open_cursor_count(), 0);
    }

    #[test]
    fn test_paginated_query_walks_pages() {
        let ledger = ledger();
        for key in ["P1", "P2", "P3"] {
            seed(&ledger, key, r#"{"active":true}"#);
        }
        let query = r#"{"selector":{"active":true}}"#;

        let (cursor, meta) = ledger.query_page(NS, query, 2, "").expect("first page");
        assert_eq!(cursor.map(|r| r.key).collect::<Vec<_>>(), vec!["P1", "P2"]);
        assert_eq!(meta.fetched_records_count, 2);
        assert_eq!(meta.bookmark, "P2");

        let (cursor, meta) = ledger
            .query_page(NS, query, 2, &meta.bookmark)
            .expect("second page");
        assert_eq!(cursor.map(|r| r.key).collect::<Vec<_>>(), vec!["P3"]);
        assert_eq!(meta.bookmark, "P3");

        let (cursor, meta) = ledger.query_page(NS, query, 2, "P3").expect("last page");
        assert_eq!(cursor.count(), 0);
        assert_eq!(meta.fetched_records_count, 0);
        assert_eq!(meta.bookmark, "P3");

        assert!(ledger.query_page(NS, query, 0, "").is_err());
    }

    #[test]
    fn test_apply_block_writes_all_entries() {
        let ledger = ledger();
        ledger
            .apply_block(vec![
                (NS.to_string(), "P1".to_string(), b"{}".to_vec()),
                ("practitioner".to_string(), "Dr1".to_string(), b"{}".to_vec()),
            ])
            .expect("apply block");
        assert_eq!(ledger.height().expect("height"), 1);
        let mut tx = begin(&ledger);
        assert!(ledger.get(&mut tx, "practitioner", "Dr1").expect("get").is_some());
    }
}
