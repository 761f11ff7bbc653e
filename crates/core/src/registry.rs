//! Followed-patients registry: which patients a practitioner may act on.
//!
//! One set per practitioner, stored in the practitioner namespace under
//! [`LedgerKey::FollowedPatients`].

use crate::error::{ContractError, ContractResult};
use crate::keys::{participant_id, LedgerKey};
use crate::store::StateStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A practitioner's followed patients. Serialized as a JSON array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FollowedPatients(BTreeSet<String>);

impl FollowedPatients {
    pub fn contains(&self, patient_id: &str) -> bool {
        self.0.contains(patient_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

fn load<S: StateStore + ?Sized>(store: &mut S, key: &str) -> ContractResult<Option<FollowedPatients>> {
    let Some(bytes) = store.get_state(key)? else {
        return Ok(None);
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|err| ContractError::DecodeError {
            key: key.to_string(),
            message: err.to_string(),
        })
}

fn save<S: StateStore + ?Sized>(store: &mut S, key: &str, set: &FollowedPatients) -> ContractResult<()> {
    let bytes = serde_json::to_vec(set).map_err(ContractError::Serialization)?;
    store.put_state(key, bytes)
}

fn not_found(practitioner_id: &str) -> ContractError {
    ContractError::NotFound {
        resource_type: "FollowedPatients",
        id: practitioner_id.to_string(),
    }
}

/// Add `patient_id` to the practitioner's set, creating the set if absent.
pub fn grant<S: StateStore + ?Sized>(
    store: &mut S,
    patient_id: &str,
    practitioner_id: &str,
) -> ContractResult<()> {
    let patient = participant_id("patient", patient_id)?;
    let practitioner = participant_id("practitioner", practitioner_id)?;
    let key = LedgerKey::FollowedPatients(&practitioner).encode();

    let mut set = load(store, &key)?.unwrap_or_default();
    set.0.insert(patient.into_inner());
    save(store, &key, &set)
}

/// Remove `patient_id` from the practitioner's set.
///
/// # Errors
///
/// Returns [`ContractError::NotFound`] if the practitioner has no set. A patient that is not
/// in the set is not an error.
pub fn revoke<S: StateStore + ?Sized>(
    store: &mut S,
    patient_id: &str,
    practitioner_id: &str,
) -> ContractResult<()> {
    let patient = participant_id("patient", patient_id)?;
    let practitioner = participant_id("practitioner", practitioner_id)?;
    let key = LedgerKey::FollowedPatients(&practitioner).encode();

    let mut set = load(store, &key)?.ok_or_else(|| not_found(practitioner.as_str()))?;
    set.0.remove(patient.as_str());
    save(store, &key, &set)
}

/// The practitioner's followed patients.
pub fn list<S: StateStore + ?Sized>(
    store: &mut S,
    practitioner_id: &str,
) -> ContractResult<FollowedPatients> {
    let practitioner = participant_id("practitioner", practitioner_id)?;
    let key = LedgerKey::FollowedPatients(&practitioner).encode();
    load(store, &key)?.ok_or_else(|| not_found(practitioner.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::ledger::{QueryCursor, QueryMetadata};
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct MapStore(BTreeMap<String, Vec<u8>>);

    impl StateStore for MapStore {
        fn get_state(&mut self, key: &str) -> ContractResult<Option<Vec<u8>>> {
            Ok(self.0.get(key).cloned())
        }

        fn put_state(&mut self, key: &str, value: Vec<u8>) -> ContractResult<()> {
            self.0.insert(key.to_string(), value);
            Ok(())
        }

        fn delete_state(&mut self, key: &str) -> ContractResult<()> {
            self.0.remove(key);
            Ok(())
        }

        fn get_state_by_range(&mut self, _start: &str, _end: &str) -> ContractResult<QueryCursor> {
            Ok(QueryCursor::from_records(Vec::new()))
        }

        fn get_query_result(&mut self, _query: &str) -> ContractResult<QueryCursor> {
            Ok(QueryCursor::from_records(Vec::new()))
        }

        fn get_query_result_with_pagination(
            &mut self,
            _query: &str,
            _page_size: usize,
            _bookmark: &str,
        ) -> ContractResult<(QueryCursor, QueryMetadata)> {
            Ok((QueryCursor::from_records(Vec::new()), QueryMetadata::default()))
        }
    }

    #[test]
    fn test_grant_list_revoke_round() {
        let mut store = MapStore::default();
        grant(&mut store, "Pat1", "Dr1").expect("grant");
        let followed = list(&mut store, "Dr1").expect("list");
        assert_eq!(followed.iter().collect::<Vec<_>>(), vec!["Pat1"]);

        revoke(&mut store, "Pat1", "Dr1").expect("revoke");
        let followed = list(&mut store, "Dr1").expect("list after revoke");
        assert!(followed.is_empty());
        assert_eq!(store.0.get("followedPatients_Dr1"), Some(&b"[]".to_vec()));
    }

    #[test]
    fn test_grant_is_idempotent() {
        let mut store = MapStore::default();
        grant(&mut store, "Pat1", "Dr1").expect("first grant");
        grant(&mut store, "Pat1", "Dr1").expect("second grant");
        let followed = list(&mut store, "Dr1").expect("list");
        assert_eq!(followed.len(), 1);
        assert!(followed.contains("Pat1"));
    }

    #[test]
    fn test_revoke_and_list_require_existing_set() {
        let mut store = MapStore::default();
        let err = revoke(&mut store, "Pat1", "Dr1").expect_err("no set yet");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        let err = list(&mut store, "Dr1").expect_err("no set yet");
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(store.0.is_empty());
    }

    #[test]
    fn test_revoke_of_absent_patient_is_not_an_error() {
        let mut store = MapStore::default();
        grant(&mut store, "Pat1", "Dr1").expect("grant");
        revoke(&mut store, "Pat2", "Dr1").expect("absent patient");
        assert!(list(&mut store, "Dr1").expect("list").contains("Pat1"));
    }

    #[test]
    fn test_empty_identifiers_are_rejected() {
        let mut store = MapStore::default();
        let err = grant(&mut store, "", "Dr1").expect_err("empty patient");
        assert_eq!(err.kind(), ErrorKind::MissingIdentifier);
        let err = list(&mut store, " ").expect_err("empty practitioner");
        assert_eq!(err.kind(), ErrorKind::MissingIdentifier);
    }

    #[test]
    fn test_corrupt_set_is_a_decode_error() {
        let mut store = MapStore::default();
        store
            .0
            .insert("followedPatients_Dr1".into(), b"{not json".to_vec());
        let err = list(&mut store, "Dr1").expect_err("corrupt set");
        assert_eq!(err.kind(), ErrorKind::DecodeError);
    }
}
