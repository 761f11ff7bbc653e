//! Cross-contract authorization delegate.
//!
//! Contracts whose records belong to a patient ask an [`AuthorizationChecker`] whether the
//! caller may act on that patient before they read, search or write. The default checker,
//! [`PatientContractAuthorizer`], asks the patient contract's `CheckAccess` function over the
//! host's cross-contract call.

use crate::config::CoreConfig;
use crate::constants::{CHECK_ACCESS_FUNCTION, USER_ID_ATTRIBUTE};
use crate::error::{ContractError, ContractResult};
use crate::store::ContractContext;

/// Decides whether `caller_id` may act on the patient named by `patient_ref`.
pub trait AuthorizationChecker: Send + Sync {
    fn is_authorized(
        &self,
        ctx: &mut dyn ContractContext,
        patient_ref: &str,
        caller_id: &str,
    ) -> ContractResult<bool>;
}

/// Delegates the decision to the patient contract on a fixed channel.
#[derive(Clone, Debug)]
pub struct PatientContractAuthorizer {
    patient_contract: String,
    channel_id: String,
}

impl PatientContractAuthorizer {
    pub fn new(patient_contract: impl Into<String>, channel_id: impl Into<String>) -> Self {
        Self {
            patient_contract: patient_contract.into(),
            channel_id: channel_id.into(),
        }
    }

    pub fn from_config(cfg: &CoreConfig) -> Self {
        Self::new(cfg.patient_contract(), cfg.channel_id())
    }
}

impl AuthorizationChecker for PatientContractAuthorizer {
    fn is_authorized(
        &self,
        ctx: &mut dyn ContractContext,
        patient_ref: &str,
        caller_id: &str,
    ) -> ContractResult<bool> {
        let args = [
            CHECK_ACCESS_FUNCTION.to_string(),
            patient_ref.to_string(),
            caller_id.to_string(),
        ];
        let response = ctx.invoke_contract(&self.patient_contract, &args, &self.channel_id);
        if !response.is_success() {
            tracing::debug!(
                patient = patient_ref,
                caller = caller_id,
                status = response.status,
                "access check refused: {}",
                response.message
            );
        }
        Ok(response.is_success())
    }
}

/// The caller's `userId` identity attribute.
pub fn caller_id(ctx: &dyn ContractContext) -> ContractResult<String> {
    ctx.caller_attribute(USER_ID_ATTRIBUTE)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ContractError::IdentityAttributeMissing(USER_ID_ATTRIBUTE.to_string()))
}

/// Fail unless the caller may act on `patient_ref`.
///
/// Checks run in order: caller identity, then the record's patient reference, then the
/// delegate.
pub fn authorize(
    checker: &dyn AuthorizationChecker,
    ctx: &mut dyn ContractContext,
    patient_ref: Option<&str>,
) -> ContractResult<()> {
    let caller = caller_id(ctx)?;
    let patient = patient_ref
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ContractError::InvalidPayload("record has no patient reference".into()))?;

    if checker.is_authorized(ctx, patient, &caller)? {
        Ok(())
    } else {
        tracing::warn!(patient, caller = %caller, "authorization denied");
        Err(ContractError::AuthorizationDenied {
            patient: patient.to_string(),
            caller,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Checker with a fixed answer, for contract tests that do not exercise the delegate.
    pub(crate) struct FixedChecker(pub bool);

    impl AuthorizationChecker for FixedChecker {
        fn is_authorized(
            &self,
            _ctx: &mut dyn ContractContext,
            _patient_ref: &str,
            _caller_id: &str,
        ) -> ContractResult<bool> {
            Ok(self.0)
        }
    }
}
