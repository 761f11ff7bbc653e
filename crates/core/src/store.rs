//! The store adapter contracts run against.
//!
//! Contracts never touch [`MemoryLedger`](crate::ledger::MemoryLedger) directly. They receive a
//! `&mut dyn ContractContext`, which scopes every read and write to the contract's namespace
//! and the current transaction, and lets tests substitute their own context.

use crate::error::ContractResult;
use crate::host::Response;
use crate::ledger::{QueryCursor, QueryMetadata};
use chrono::{DateTime, Utc};

/// Key/value access to the invoking contract's namespace.
pub trait StateStore {
    /// Committed value of `key`, or `None` if absent.
    fn get_state(&mut self, key: &str) -> ContractResult<Option<Vec<u8>>>;

    /// Buffer a write of `value` to `key`.
    fn put_state(&mut self, key: &str, value: Vec<u8>) -> ContractResult<()>;

    /// Buffer a delete of `key`.
    fn delete_state(&mut self, key: &str) -> ContractResult<()>;

    /// Keys in `[start, end)`; an empty bound is open.
    fn get_state_by_range(&mut self, start: &str, end: &str) -> ContractResult<QueryCursor>;

    /// Records matching a rich query.
    fn get_query_result(&mut self, query: &str) -> ContractResult<QueryCursor>;

    /// One page of records matching a rich query.
    fn get_query_result_with_pagination(
        &mut self,
        query: &str,
        page_size: usize,
        bookmark: &str,
    ) -> ContractResult<(QueryCursor, QueryMetadata)>;
}

/// Everything a contract can see about the transaction invoking it.
pub trait ContractContext: StateStore {
    /// Attribute `name` of the caller's identity.
    fn caller_attribute(&self, name: &str) -> Option<String>;

    fn channel_id(&self) -> &str;

    fn tx_id(&self) -> &str;

    fn tx_timestamp(&self) -> DateTime<Utc>;

    /// Invoke `args[0]` on `contract` with the remaining args, inside this transaction.
    ///
    /// An empty `channel` means the current channel.
    fn invoke_contract(&mut self, contract: &str, args: &[String], channel: &str) -> Response;
}
