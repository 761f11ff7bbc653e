//! Contracts that expose only the generic resource operations, optionally with a name search.

use crate::args;
use crate::error::ContractResult;
use crate::host::Contract;
use crate::resource::ResourceContract;
use crate::store::ContractContext;
use fhir::Resource;

struct NameSearch {
    function: &'static str,
    paths: &'static [&'static str],
}

/// A [`ResourceContract`] installed as-is.
pub struct StandardContract<R> {
    resources: ResourceContract<R>,
    name_search: Option<NameSearch>,
}

impl<R: Resource> StandardContract<R> {
    pub fn new(resources: ResourceContract<R>) -> Self {
        Self {
            resources,
            name_search: None,
        }
    }

    /// Add `function(text)`, a substring search over the fields at `paths`.
    pub fn with_name_search(mut self, function: &'static str, paths: &'static [&'static str]) -> Self {
        self.name_search = Some(NameSearch { function, paths });
        self
    }
}

impl<R: Resource + 'static> Contract for StandardContract<R> {
    fn name(&self) -> &str {
        self.resources.name()
    }

    fn functions(&self) -> Vec<String> {
        let mut functions = self.resources.function_names();
        if let Some(search) = &self.name_search {
            functions.push(search.function.to_string());
        }
        functions
    }

    fn invoke(
        &self,
        ctx: &mut dyn ContractContext,
        function: &str,
        args: &[String],
    ) -> ContractResult<Vec<u8>> {
        if let Some(result) = self.resources.dispatch(ctx, function, args) {
            return result;
        }
        match &self.name_search {
            Some(search) if search.function == function => {
                let [needle] = args::exact::<1>(function, args)?;
                self.resources.search_by_field(ctx, search.paths, needle)
            }
            _ => Err(self.resources.unknown_function(function)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::FixedChecker;
    use crate::config::CoreConfig;
    use crate::error::ErrorKind;
    use crate::host::{ContractHost, Proposal};
    use fhir::Encounter;
    use std::sync::Arc;

    const ENCOUNTER: &str =
        r#"{"identifier":{"value":"E1"},"subject":{"reference":"Patient/Pat1"},"status":"finished"}"#;

    fn host(allowed: bool) -> ContractHost {
        let mut host = ContractHost::new(Arc::new(CoreConfig::default()));
        let resources = ResourceContract::<Encounter>::new("encounter", "Encounter", "Encounters")
            .with_authorizer(Arc::new(FixedChecker(allowed)));
        host.register(Arc::new(StandardContract::new(resources)));
        host
    }

    fn proposal(function: &str, args: &[&str]) -> Proposal {
        Proposal::new("encounter", function)
            .with_args(args.iter().copied())
            .with_caller("Dr1")
    }

    #[test]
    fn test_functions_follow_labels() {
        let host = host(true);
        let contract = host.contract("encounter").expect("installed");
        assert_eq!(
            contract.functions(),
            vec![
                "CreateEncounter",
                "ReadEncounter",
                "UpdateEncounter",
                "DeleteEncounter",
                "SearchEncounters",
                "SearchEncountersPaginated"
            ]
        );
    }

    #[test]
    fn test_injected_checker_allows_round_trip() {
        let host = host(true);
        assert!(host.submit(&proposal("CreateEncounter", &[ENCOUNTER])).is_success());
        let read = host.evaluate(&proposal("ReadEncounter", &["E1"]));
        let stored: serde_json::Value = serde_json::from_slice(&read.payload).expect("json");
        let expected: serde_json::Value = serde_json::from_str(ENCOUNTER).expect("json");
        assert_eq!(stored, expected);
    }

    #[test]
    fn test_injected_checker_denies_before_write() {
        let host = host(false);
        let response = host.submit(&proposal("CreateEncounter", &[ENCOUNTER]));
        assert_eq!(response.error_kind(), Some(ErrorKind::AuthorizationDenied));
        assert_eq!(host.ledger().height().expect("height"), 0);
    }

    #[test]
    fn test_injected_checker_filters_search_results() {
        let allowed = host(true);
        assert!(allowed.submit(&proposal("CreateEncounter", &[ENCOUNTER])).is_success());
        let found = allowed.evaluate(&proposal("SearchEncounters", &[r#"{"selector":{}}"#]));
        let found: serde_json::Value = serde_json::from_slice(&found.payload).expect("json");
        assert_eq!(found.as_array().map(Vec::len), Some(1));

        let denied = host(false);
        let mut seed = crate::seed::SeedData::new();
        seed.entry("encounter".into()).or_default().insert(
            "E1".into(),
            serde_json::from_str(ENCOUNTER).expect("json"),
        );
        crate::seed::apply_seed(denied.ledger(), &seed).expect("seed");
        let hidden = denied.evaluate(&proposal("SearchEncounters", &[r#"{"selector":{}}"#]));
        assert!(hidden.is_success());
        assert_eq!(hidden.payload, b"[]".to_vec());

        let anonymous = denied.evaluate(
            &Proposal::new("encounter", "SearchEncounters").with_args([r#"{"selector":{}}"#]),
        );
        assert_eq!(anonymous.error_kind(), Some(ErrorKind::IdentityAttributeMissing));
    }

    #[test]
    fn test_field_search_respects_checker() {
        for (allowed, expected) in [(true, 1), (false, 0)] {
            let mut host = ContractHost::new(Arc::new(CoreConfig::default()));
            let resources = ResourceContract::<Encounter>::new("encounter", "Encounter", "Encounters")
                .with_authorizer(Arc::new(FixedChecker(allowed)));
            host.register(Arc::new(
                StandardContract::new(resources).with_name_search("SearchEncountersByStatus", &["status"]),
            ));

            let mut seed = crate::seed::SeedData::new();
            seed.entry("encounter".into()).or_default().insert(
                "E1".into(),
                serde_json::from_str(ENCOUNTER).expect("json"),
            );
            crate::seed::apply_seed(host.ledger(), &seed).expect("seed");

            let found = host.evaluate(&proposal("SearchEncountersByStatus", &["finish"]));
            let found: serde_json::Value = serde_json::from_slice(&found.payload).expect("json");
            assert_eq!(found.as_array().map(Vec::len), Some(expected), "allowed {allowed}");
        }
    }

    #[test]
    fn test_unknown_function() {
        let host = host(true);
        let response = host.submit(&proposal("SearchEncountersByName", &["x"]));
        assert_eq!(response.error_kind(), Some(ErrorKind::UnknownFunction));
    }
}
