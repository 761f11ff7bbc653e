//! Patient contract: patient records plus the `CheckAccess` authorization endpoint.

use crate::args;
use crate::constants::{CHECK_ACCESS_FUNCTION, READ_FOLLOWED_PATIENTS_FUNCTION};
use crate::error::{ContractError, ContractResult};
use crate::host::{ack, Contract};
use crate::keys::{participant_id, resource_id, LedgerKey};
use crate::registry::FollowedPatients;
use crate::resource::ResourceContract;
use crate::store::ContractContext;
use fhir::{patient_id_from_reference, Patient};

pub struct PatientContract {
    resources: ResourceContract<Patient>,
    practitioner_contract: String,
    channel_id: String,
}

impl PatientContract {
    pub fn new(
        name: impl Into<String>,
        practitioner_contract: impl Into<String>,
        channel_id: impl Into<String>,
    ) -> Self {
        Self {
            resources: ResourceContract::new(name, "Patient", "Patients"),
            practitioner_contract: practitioner_contract.into(),
            channel_id: channel_id.into(),
        }
    }

    /// Succeed if `caller_id` is the patient or a practitioner following them.
    ///
    /// `patient_ref` is `Patient/<id>` or a bare id.
    pub fn check_access(
        &self,
        ctx: &mut dyn ContractContext,
        patient_ref: &str,
        caller_id: &str,
    ) -> ContractResult<Vec<u8>> {
        let patient = resource_id("Patient", patient_id_from_reference(patient_ref.trim()))?;
        let caller = participant_id("caller", caller_id)?;

        if ctx.get_state(&LedgerKey::Resource(&patient).encode())?.is_none() {
            return Err(ContractError::NotFound {
                resource_type: "Patient",
                id: patient.into_inner(),
            });
        }

        if caller.as_str() == patient.as_str() {
            return ack(format!("{caller} may access own record"));
        }

        let call = [
            READ_FOLLOWED_PATIENTS_FUNCTION.to_string(),
            caller.as_str().to_string(),
        ];
        let response = ctx.invoke_contract(&self.practitioner_contract, &call, &self.channel_id);
        if response.is_success() {
            let followed: FollowedPatients =
                serde_json::from_slice(&response.payload).map_err(|err| {
                    ContractError::DecodeError {
                        key: LedgerKey::FollowedPatients(&caller).encode(),
                        message: err.to_string(),
                    }
                })?;
            if followed.contains(patient.as_str()) {
                return ack(format!("{caller} may access patient {patient}"));
            }
        }

        Err(ContractError::AuthorizationDenied {
            patient: patient.into_inner(),
            caller: caller.into_inner(),
        })
    }
}

impl Contract for PatientContract {
    fn name(&self) -> &str {
        self.resources.name()
    }

    fn functions(&self) -> Vec<String> {
        let mut functions = self.resources.function_names();
        functions.push(CHECK_ACCESS_FUNCTION.to_string());
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
            CHECK_ACCESS_FUNCTION => {
                let [patient_ref, caller_id] = args::exact::<2>(function, args)?;
                self.check_access(ctx, patient_ref, caller_id)
            }
            _ => Err(self.resources.unknown_function(function)),
        }
    }
}
