//! Assembly of the standard contract host.

use crate::auth::{AuthorizationChecker, PatientContractAuthorizer};
use crate::config::CoreConfig;
use crate::constants::{
    ALLERGY_CONTRACT, CONDITION_CONTRACT, ENCOUNTER_CONTRACT, FOLDER_CONTRACT, LAB_RESULT_CONTRACT,
    ORGANIZATION_CONTRACT, PRESCRIPTION_CONTRACT, PROCEDURE_CONTRACT,
};
use crate::contracts::{FolderContract, PatientContract, PractitionerContract, StandardContract};
use crate::error::ContractResult;
use crate::host::ContractHost;
use crate::resource::ResourceContract;
use crate::seed;
use fhir::{
    AllergyIntolerance, Condition, Encounter, MedicationRequest, Observation, Organization,
    Procedure, Resource,
};
use std::sync::Arc;

fn patient_scoped<R: Resource + 'static>(
    host: &mut ContractHost,
    checker: &Arc<dyn AuthorizationChecker>,
    name: &str,
    singular: &'static str,
    plural: &'static str,
) {
    let resources = ResourceContract::<R>::new(name, singular, plural).with_authorizer(checker.clone());
    host.register(Arc::new(StandardContract::new(resources)));
}

/// Build a host with every standard contract installed and the configured seed loaded.
///
/// # Errors
///
/// Returns an error if the seed file cannot be read or parsed.
pub fn default_host(cfg: Arc<CoreConfig>) -> ContractResult<ContractHost> {
    let checker: Arc<dyn AuthorizationChecker> =
        Arc::new(PatientContractAuthorizer::from_config(&cfg));
    let mut host = ContractHost::new(cfg.clone());

    host.register(Arc::new(PatientContract::new(
        cfg.patient_contract(),
        cfg.practitioner_contract(),
        cfg.channel_id(),
    )));
    host.register(Arc::new(PractitionerContract::new(cfg.practitioner_contract())));
    host.register(Arc::new(
        StandardContract::new(ResourceContract::<Organization>::new(
            ORGANIZATION_CONTRACT,
            "Organization",
            "Organizations",
        ))
        .with_name_search("SearchOrganizationsByName", &["name", "alias"]),
    ));

    patient_scoped::<Encounter>(&mut host, &checker, ENCOUNTER_CONTRACT, "Encounter", "Encounters");
    patient_scoped::<MedicationRequest>(
        &mut host,
        &checker,
        PRESCRIPTION_CONTRACT,
        "Prescription",
        "Prescriptions",
    );
    patient_scoped::<Observation>(&mut host, &checker, LAB_RESULT_CONTRACT, "LabResult", "LabResults");
    patient_scoped::<Condition>(&mut host, &checker, CONDITION_CONTRACT, "Condition", "Conditions");
    patient_scoped::<Procedure>(&mut host, &checker, PROCEDURE_CONTRACT, "Procedure", "Procedures");
    patient_scoped::<AllergyIntolerance>(&mut host, &checker, ALLERGY_CONTRACT, "Allergy", "Allergies");

    host.register(Arc::new(FolderContract::new(
        ResourceContract::new(FOLDER_CONTRACT, "Folder", "Folders").with_authorizer(checker),
    )));

    if let Some(path) = cfg.seed_file() {
        seed::load_seed_file(host.ledger(), path)?;
    }

    tracing::info!(
        channel = cfg.channel_id(),
        contracts = host.contracts().count(),
        "contract host ready"
    );
    Ok(host)
}
