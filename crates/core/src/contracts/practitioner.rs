//! Practitioner contract: practitioner records, qualifications and the followed-patients
//! registry.

use crate::args;
use crate::constants::READ_FOLLOWED_PATIENTS_FUNCTION;
use crate::error::{ContractError, ContractResult};
use crate::host::{ack, Contract};
use crate::registry;
use crate::resource::ResourceContract;
use crate::store::ContractContext;
use fhir::{Practitioner, Qualification};

const GRANT_ACCESS: &str = "GrantAccess";
const REVOKE_ACCESS: &str = "RevokeAccess";
const ADD_QUALIFICATION: &str = "AddQualification";
const REMOVE_QUALIFICATION: &str = "RemoveQualification";
const SEARCH_BY_NAME: &str = "SearchPractitionersByName";

/// Free-text parts of a practitioner's names; `use` codes are not searched.
const NAME_FIELDS: &[&str] = &["name.text", "name.family", "name.given"];

pub struct PractitionerContract {
    resources: ResourceContract<Practitioner>,
}

impl PractitionerContract {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            resources: ResourceContract::new(name, "Practitioner", "Practitioners"),
        }
    }

    fn add_qualification(
        &self,
        ctx: &mut dyn ContractContext,
        id: &str,
        payload: &str,
    ) -> ContractResult<Vec<u8>> {
        let qualification: Qualification = serde_json::from_str(payload)
            .map_err(|err| ContractError::InvalidPayload(format!("qualification: {err}")))?;
        let (id, mut practitioner) = self.resources.load(ctx, id)?;
        practitioner.qualification.push(qualification);
        self.resources.store(ctx, &id, &practitioner)?;
        ack(format!(
            "qualification {} added to practitioner {id}",
            practitioner.qualification.len() - 1
        ))
    }

    fn remove_qualification(
        &self,
        ctx: &mut dyn ContractContext,
        id: &str,
        index: &str,
    ) -> ContractResult<Vec<u8>> {
        let (id, mut practitioner) = self.resources.load(ctx, id)?;
        let index = args::parse_index(index, practitioner.qualification.len())?;
        practitioner.qualification.remove(index);
        self.resources.store(ctx, &id, &practitioner)?;
        ack(format!("qualification {index} removed from practitioner {id}"))
    }
}

impl Contract for PractitionerContract {
    fn name(&self) -> &str {
        self.resources.name()
    }

    fn functions(&self) -> Vec<String> {
        let mut functions = self.resources.function_names();
        functions.extend(
            [
                GRANT_ACCESS,
                REVOKE_ACCESS,
                READ_FOLLOWED_PATIENTS_FUNCTION,
                ADD_QUALIFICATION,
                REMOVE_QUALIFICATION,
                SEARCH_BY_NAME,
            ]
            .map(String::from),
        );
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
        match function {
            GRANT_ACCESS => {
                let [patient_id, practitioner_id] = args::exact::<2>(function, args)?;
                registry::grant(ctx, patient_id, practitioner_id)?;
                ack(format!(
                    "practitioner {practitioner_id} granted access to patient {patient_id}"
                ))
            }
            REVOKE_ACCESS => {
                let [patient_id, practitioner_id] = args::exact::<2>(function, args)?;
                registry::revoke(ctx, patient_id, practitioner_id)?;
                ack(format!(
                    "practitioner {practitioner_id} access to patient {patient_id} revoked"
                ))
            }
            READ_FOLLOWED_PATIENTS_FUNCTION => {
                let [practitioner_id] = args::exact::<1>(function, args)?;
                let followed = registry::list(ctx, practitioner_id)?;
                serde_json::to_vec(&followed).map_err(ContractError::Serialization)
            }
            ADD_QUALIFICATION => {
                let [id, payload] = args::exact::<2>(function, args)?;
                self.add_qualification(ctx, id, payload)
            }
            REMOVE_QUALIFICATION => {
                let [id, index] = args::exact::<2>(function, args)?;
                self.remove_qualification(ctx, id, index)
            }
            SEARCH_BY_NAME => {
                let [needle] = args::exact::<1>(function, args)?;
                self.resources.search_by_field(ctx, NAME_FIELDS, needle)
            }
            _ => Err(self.resources.unknown_function(function)),
        }
    }
}
