//! Search executor: drains store cursors into decoded resources.
//!
//! One undecodable record fails the whole search with [`ContractError::DecodeError`]. Cursors
//! are closed on every exit path; an early return drops the cursor, which closes it.

use crate::error::{ContractError, ContractResult};
use crate::keys::{KeyKind, LedgerKey};
use crate::ledger::{QueryCursor, QueryMetadata, QueryRecord};
use crate::store::StateStore;
use fhir::Resource;
use serde::Serialize;
use serde_json::Value;

/// One page of a paginated search.
#[derive(Debug, Serialize)]
pub struct Page<R> {
    pub records: Vec<R>,
    pub metadata: QueryMetadata,
}

fn decode<R: Resource>(record: &QueryRecord) -> ContractResult<R> {
    fhir::parse(&record.value).map_err(|err| ContractError::DecodeError {
        key: record.key.clone(),
        message: err.to_string(),
    })
}

fn drain<R: Resource>(mut cursor: QueryCursor) -> ContractResult<Vec<R>> {
    let mut resources = Vec::new();
    while cursor.has_next() {
        let Some(record) = cursor.next() else {
            break;
        };
        resources.push(decode(&record)?);
    }
    cursor.close();
    Ok(resources)
}

/// Run a rich query and decode every match.
pub fn execute_query<R, S>(store: &mut S, query: &str) -> ContractResult<Vec<R>>
where
    R: Resource,
    S: StateStore + ?Sized,
{
    let cursor = store.get_query_result(query)?;
    drain(cursor)
}

/// Run a rich query one page at a time.
pub fn execute_paginated<R, S>(
    store: &mut S,
    query: &str,
    page_size: usize,
    bookmark: &str,
) -> ContractResult<Page<R>>
where
    R: Resource,
    S: StateStore + ?Sized,
{
    let (cursor, metadata) = store.get_query_result_with_pagination(query, page_size, bookmark)?;
    Ok(Page {
        records: drain(cursor)?,
        metadata,
    })
}

/// Scan the whole namespace and keep records whose value at any of `paths` contains `needle`.
///
/// Paths are dot-separated. Strings anywhere under a path match, including inside arrays.
/// Registry keys are skipped.
pub fn search_by_field<R, S>(store: &mut S, paths: &[&str], needle: &str) -> ContractResult<Vec<R>>
where
    R: Resource,
    S: StateStore + ?Sized,
{
    let paths: Vec<Vec<&str>> = paths
        .iter()
        .map(|path| path.split('.').filter(|s| !s.is_empty()).collect())
        .collect();
    let mut cursor = store.get_state_by_range("", "")?;
    let mut matches = Vec::new();

    for record in cursor.by_ref() {
        if LedgerKey::classify(&record.key) != KeyKind::Resource {
            continue;
        }
        let resource: R = decode(&record)?;
        let document = serde_json::to_value(&resource).map_err(ContractError::Serialization)?;
        if paths.iter().any(|segments| field_contains(&document, segments, needle)) {
            matches.push(resource);
        }
    }

    cursor.close();
    Ok(matches)
}

fn field_contains(value: &Value, path: &[&str], needle: &str) -> bool {
    match (path.split_first(), value) {
        (_, Value::Array(items)) => items.iter().any(|item| field_contains(item, path, needle)),
        (Some((head, rest)), Value::Object(map)) => map
            .get(*head)
            .is_some_and(|child| field_contains(child, rest, needle)),
        (Some(_), _) => false,
        (None, value) => text_contains(value, needle),
    }
}

fn text_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(text) => text.contains(needle),
        Value::Array(items) => items.iter().any(|item| text_contains(item, needle)),
        Value::Object(map) => map.values().any(|item| text_contains(item, needle)),
        _ => false,
    }
}

/// Render search results as a JSON array (or page object).
pub fn render_results<T: Serialize + ?Sized>(results: &T) -> ContractResult<Vec<u8>> {
    serde_json::to_vec(results).map_err(ContractError::Serialization)
}
