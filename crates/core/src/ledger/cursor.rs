//! Lazy result cursors returned by range scans and rich queries.

use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One key/value pair produced by a cursor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryRecord {
    pub key: String,
    pub value: Vec<u8>,
}

/// Paging information returned alongside a paginated rich query.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMetadata {
    pub fetched_records_count: usize,
    /// Key of the last record in this page; pass it back to continue after it.
    pub bookmark: String,
}

/// Cursor over the records matched by a store query.
///
/// `close` is idempotent and also runs on drop, so a cursor abandoned part-way (for example
/// because a record failed to decode) is still released.
#[derive(Debug)]
pub struct QueryCursor {
    records: VecDeque<QueryRecord>,
    closed: bool,
    open_cursors: Option<Arc<AtomicUsize>>,
}

impl QueryCursor {
    /// Cursor whose lifetime is tracked by the ledger's open-cursor counter.
    pub(crate) fn tracked(records: Vec<QueryRecord>, open_cursors: Arc<AtomicUsize>) -> Self {
        open_cursors.fetch_add(1, Ordering::SeqCst);
        Self {
            records: records.into(),
            closed: false,
            open_cursors: Some(open_cursors),
        }
    }

    /// Untracked cursor over an in-memory list of records.
    pub fn from_records(records: Vec<QueryRecord>) -> Self {
        Self {
            records: records.into(),
            closed: false,
            open_cursors: None,
        }
    }

    pub fn has_next(&self) -> bool {
        !self.closed && !self.records.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.records.clear();
        if let Some(counter) = self.open_cursors.take() {
            counter.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Iterator for QueryCursor {
    type Item = QueryRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.closed {
            return None;
        }
        self.records.pop_front()
    }
}

impl Drop for QueryCursor {
    fn drop(&mut self) {
        self.close();
    }
}
