//! Rich-query evaluation for the in-memory ledger.
//!
//! Queries use a subset of the CouchDB Mango selector syntax:
//!
//! ```text
//! {"selector": {"subject.reference": "Patient/Pat1", "status": {"$in": ["final", "amended"]}},
//!  "limit": 10, "skip": 0}
//! ```
//!
//! Supported combinators are `$and`, `$or`, `$nor` and `$not`; field conditions support
//! `$eq $ne $gt $gte $lt $lte $in $nin $exists $elemMatch $not`. A field whose condition is an
//! object of plain keys is matched as a nested selector. `sort`, `fields` and `use_index` are
//! accepted and ignored: results always come back in key order.

use crate::error::{StoreError, StoreResult};
use serde_json::{Map, Value};
use std::cmp::Ordering;

const IGNORED_QUERY_FIELDS: [&str; 3] = ["sort", "fields", "use_index"];

fn invalid(message: impl Into<String>) -> StoreError {
    StoreError::InvalidQuery(message.into())
}

/// A parsed rich query.
#[derive(Clone, Debug, PartialEq)]
pub struct RichQuery {
    selector: Selector,
    limit: Option<usize>,
    skip: usize,
}

#[derive(Clone, Debug, PartialEq)]
enum Selector {
    And(Vec<Selector>),
    Or(Vec<Selector>),
    Nor(Vec<Selector>),
    Not(Box<Selector>),
    Field {
        path: Vec<String>,
        condition: Condition,
    },
}

#[derive(Clone, Debug, PartialEq)]
enum Condition {
    Nested(Box<Selector>),
    Operators(Vec<Operator>),
}

#[derive(Clone, Debug, PartialEq)]
enum Operator {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Exists(bool),
    ElemMatch(Box<Condition>),
    Not(Box<Condition>),
}

impl RichQuery {
    /// Parse a query string.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidQuery`] if the text is not JSON, has no `selector`
    /// object, uses an unsupported operator or field, or has a non-integer `limit`/`skip`.
    pub fn parse(query: &str) -> StoreResult<Self> {
        let value: Value = serde_json::from_str(query)
            .map_err(|e| invalid(format!("query is not valid JSON: {e}")))?;
        let Value::Object(mut top) = value else {
            return Err(invalid("query must be a JSON object"));
        };

        let selector = match top.remove("selector") {
            Some(Value::Object(map)) => parse_selector(&map)?,
            Some(_) => return Err(invalid("selector must be a JSON object")),
            None => return Err(invalid("query has no selector")),
        };
        let limit = take_count(&mut top, "limit")?;
        let skip = take_count(&mut top, "skip")?.unwrap_or(0);

        if let Some(unknown) = top
            .keys()
            .find(|key| !IGNORED_QUERY_FIELDS.contains(&key.as_str()))
        {
            return Err(invalid(format!("unsupported query field '{unknown}'")));
        }

        Ok(Self {
            selector,
            limit,
            skip,
        })
    }

    /// Whether a stored document satisfies the selector. Non-object documents never match.
    pub fn matches(&self, document: &Value) -> bool {
        document.is_object() && self.selector.matches(document)
    }

    /// Apply `skip` and `limit` to an ordered list of matches.
    pub fn window<T>(&self, matches: Vec<T>) -> Vec<T> {
        matches
            .into_iter()
            .skip(self.skip)
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

fn take_count(top: &mut Map<String, Value>, field: &str) -> StoreResult<Option<usize>> {
    match top.remove(field) {
        None => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| invalid(format!("{field} must be a non-negative integer"))),
    }
}

fn parse_selector(map: &Map<String, Value>) -> StoreResult<Selector> {
    let mut clauses = Vec::with_capacity(map.len());
    for (key, value) in map {
        let clause = match key.as_str() {
            "$and" => Selector::And(parse_selector_list(key, value)?),
            "$or" => Selector::Or(parse_selector_list(key, value)?),
            "$nor" => Selector::Nor(parse_selector_list(key, value)?),
            "$not" => match value {
                Value::Object(inner) => Selector::Not(Box::new(parse_selector(inner)?)),
                _ => return Err(invalid("$not expects a selector object")),
            },
            op if op.starts_with('$') => {
                return Err(invalid(format!("unsupported combination operator '{op}'")))
            }
            field => Selector::Field {
                path: field.split('.').map(str::to_string).collect(),
                condition: parse_condition(value)?,
            },
        };
        clauses.push(clause);
    }

    if clauses.len() == 1 {
        if let Some(only) = clauses.pop() {
            return Ok(only);
        }
    }
    Ok(Selector::And(clauses))
}

fn parse_selector_list(op: &str, value: &Value) -> StoreResult<Vec<Selector>> {
    let Value::Array(items) = value else {
        return Err(invalid(format!("{op} expects an array of selectors")));
    };
    items
        .iter()
        .map(|item| match item {
            Value::Object(map) => parse_selector(map),
            _ => Err(invalid(format!("{op} expects an array of selectors"))),
        })
        .collect()
}

fn parse_condition(value: &Value) -> StoreResult<Condition> {
    match value {
        Value::Object(map) if !map.is_empty() && map.keys().all(|k| k.starts_with('$')) => {
            let operators = map
                .iter()
                .map(|(op, arg)| parse_operator(op, arg))
                .collect::<StoreResult<Vec<_>>>()?;
            Ok(Condition::Operators(operators))
        }
        Value::Object(map) if map.keys().any(|k| k.starts_with('$')) => {
            Err(invalid("a condition cannot mix operators and field names"))
        }
        Value::Object(map) if !map.is_empty() => {
            Ok(Condition::Nested(Box::new(parse_selector(map)?)))
        }
        other => Ok(Condition::Operators(vec![Operator::Eq(other.clone())])),
    }
}

fn parse_operator(op: &str, arg: &Value) -> StoreResult<Operator> {
    let operator = match op {
        "$eq" => Operator::Eq(arg.clone()),
        "$ne" => Operator::Ne(arg.clone()),
        "$gt" => Operator::Gt(arg.clone()),
        "$gte" => Operator::Gte(arg.clone()),
        "$lt" => Operator::Lt(arg.clone()),
        "$lte" => Operator::Lte(arg.clone()),
        "$in" | "$nin" => {
            let Value::Array(candidates) = arg else {
                return Err(invalid(format!("{op} expects an array")));
            };
            if op == "$in" {
                Operator::In(candidates.clone())
            } else {
                Operator::Nin(candidates.clone())
            }
        }
        "$exists" => match arg {
            Value::Bool(expected) => Operator::Exists(*expected),
            _ => return Err(invalid("$exists expects a boolean")),
        },
        "$elemMatch" => match arg {
            Value::Object(_) => Operator::ElemMatch(Box::new(parse_condition(arg)?)),
            _ => return Err(invalid("$elemMatch expects an object")),
        },
        "$not" => Operator::Not(Box::new(parse_condition(arg)?)),
        other => return Err(invalid(format!("unsupported operator '{other}'"))),
    };
    Ok(operator)
}

impl Selector {
    fn matches(&self, document: &Value) -> bool {
        match self {
            Selector::And(all) => all.iter().all(|s| s.matches(document)),
            Selector::Or(any) => any.iter().any(|s| s.matches(document)),
            Selector::Nor(none) => !none.iter().any(|s| s.matches(document)),
            Selector::Not(inner) => !inner.matches(document),
            Selector::Field { path, condition } => condition.matches(lookup(document, path)),
        }
    }
}

impl Condition {
    fn matches(&self, value: Option<&Value>) -> bool {
        match self {
            Condition::Nested(selector) => {
                value.is_some_and(|v| v.is_object() && selector.matches(v))
            }
            Condition::Operators(operators) => operators.iter().all(|op| op.matches(value)),
        }
    }
}

impl Operator {
    fn matches(&self, value: Option<&Value>) -> bool {
        let value = match (self, value) {
            (Operator::Exists(expected), v) => return v.is_some() == *expected,
            (Operator::Not(condition), v) => return !condition.matches(v),
            (_, None) => return false,
            (_, Some(v)) => v,
        };

        match self {
            Operator::Eq(expected) => value == expected,
            Operator::Ne(expected) => value != expected,
            Operator::Gt(bound) => compare(value, bound) == Some(Ordering::Greater),
            Operator::Gte(bound) => matches!(
                compare(value, bound),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            Operator::Lt(bound) => compare(value, bound) == Some(Ordering::Less),
            Operator::Lte(bound) => {
                matches!(compare(value, bound), Some(Ordering::Less | Ordering::Equal))
            }
            Operator::In(candidates) => candidates.contains(value),
            Operator::Nin(candidates) => !candidates.contains(value),
            Operator::ElemMatch(condition) => match value {
                Value::Array(items) => items.iter().any(|item| condition.matches(Some(item))),
                _ => false,
            },
            Operator::Exists(_) | Operator::Not(_) => false,
        }
    }
}

/// Values of different JSON types are not ordered against each other.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Resolve a dotted path; numeric segments index into arrays.
pub(crate) fn lookup<'v>(document: &'v Value, path: &[String]) -> Option<&'v Value> {
    path.iter().try_fold(document, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn condition_doc() -> Value {
        json!({
            "identifier": {"value": "C1"},
            "subject": {"reference": "Patient/Pat1"},
            "category": [{"text": "problem-list-item"}],
            "severity": {"text": "moderate"},
            "recordedDate": "2024-05-01",
            "score": 7
        })
    }

    fn matches(query: &str, doc: &Value) -> bool {
        RichQuery::parse(query).expect("query should parse").matches(doc)
    }

    #[test]
    fn test_dotted_path_equality() {
        let doc = condition_doc();
        assert!(matches(r#"{"selector":{"subject.reference":"Patient/Pat1"}}"#, &doc));
        assert!(!matches(r#"{"selector":{"subject.reference":"Patient/Pat2"}}"#, &doc));
    }

    #[test]
    fn test_nested_object_condition_is_a_sub_selector() {
        let doc = condition_doc();
        assert!(matches(r#"{"selector":{"subject":{"reference":"Patient/Pat1"}}}"#, &doc));
    }

    #[test]
    fn test_comparison_operators() {
        let doc = condition_doc();
        assert!(matches(r#"{"selector":{"score":{"$gt":5,"$lte":7}}}"#, &doc));
        assert!(!matches(r#"{"selector":{"score":{"$lt":7}}}"#, &doc));
        assert!(matches(r#"{"selector":{"recordedDate":{"$gte":"2024-01-01"}}}"#, &doc));
        assert!(!matches(r#"{"selector":{"recordedDate":{"$gt":5}}}"#, &doc));
    }

    #[test]
    fn test_in_exists_and_not() {
        let doc = condition_doc();
        assert!(matches(r#"{"selector":{"severity.text":{"$in":["mild","moderate"]}}}"#, &doc));
        assert!(matches(r#"{"selector":{"encounter":{"$exists":false}}}"#, &doc));
        assert!(!matches(r#"{"selector":{"encounter":{"$exists":true}}}"#, &doc));
        assert!(matches(r#"{"selector":{"score":{"$not":{"$eq":3}}}}"#, &doc));
        assert!(matches(r#"{"selector":{"severity.text":{"$nin":["severe"]}}}"#, &doc));
    }

    #[test]
    fn test_combinators() {
        let doc = condition_doc();
        assert!(matches(
            r#"{"selector":{"$or":[{"score":1},{"identifier.value":"C1"}]}}"#,
            &doc
        ));
        assert!(!matches(
            r#"{"selector":{"$and":[{"score":7},{"identifier.value":"C2"}]}}"#,
            &doc
        ));
        assert!(matches(r#"{"selector":{"$nor":[{"score":1}]}}"#, &doc));
        assert!(matches(r#"{"selector":{"$not":{"score":1}}}"#, &doc));
    }

    #[test]
    fn test_elem_match_and_array_index() {
        let doc = condition_doc();
        assert!(matches(
            r#"{"selector":{"category":{"$elemMatch":{"text":"problem-list-item"}}}}"#,
            &doc
        ));
        assert!(matches(r#"{"selector":{"category.0.text":"problem-list-item"}}"#, &doc));
        assert!(!matches(r#"{"selector":{"score":{"$elemMatch":{"$eq":7}}}}"#, &doc));
    }

    #[test]
    fn test_empty_selector_matches_objects_only() {
        let query = RichQuery::parse(r#"{"selector":{}}"#).expect("parse");
        assert!(query.matches(&condition_doc()));
        assert!(!query.matches(&json!(["Pat1"])));
    }

    #[test]
    fn test_limit_and_skip_window_results() {
        let query = RichQuery::parse(r#"{"selector":{},"skip":1,"limit":2,"sort":[{"id":"asc"}]}"#)
            .expect("parse");
        assert_eq!(query.window(vec![1, 2, 3, 4]), vec![2, 3]);
    }

    #[test]
    fn test_rejects_malformed_queries() {
        for bad in [
            "not json",
            "[]",
            r#"{"limit":1}"#,
            r#"{"selector":[]}"#,
            r#"{"selector":{"a":{"$regex":"x"}}}"#,
            r#"{"selector":{"$xor":[]}}"#,
            r#"{"selector":{"a":{"$in":"x"}}}"#,
            r#"{"selector":{"a":{"$eq":1,"b":2}}}"#,
            r#"{"selector":{},"limit":-1}"#,
            r#"{"selector":{},"group":"x"}"#,
        ] {
            let err = RichQuery::parse(bad).expect_err("query should be rejected");
            assert!(matches!(err, StoreError::InvalidQuery(_)), "{bad}: {err}");
        }
    }
}
