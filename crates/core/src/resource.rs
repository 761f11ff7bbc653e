//! Generic create/read/update/delete/search behaviour shared by every resource contract.

use crate::args;
use crate::auth::{authorize, caller_id, AuthorizationChecker};
use crate::error::{ContractError, ContractResult};
use crate::host::ack;
use crate::keys::{resource_id, LedgerKey};
use crate::search;
use crate::store::ContractContext;
use fhir::Resource;
use hlc_types::ResourceId;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// Storage and access rules for one resource type in one contract namespace.
///
/// Function names are derived from the labels: with singular `Patient` and plural `Patients`
/// the contract answers `CreatePatient`, `ReadPatient`, `UpdatePatient`, `DeletePatient`,
/// `SearchPatients` and `SearchPatientsPaginated`.
pub struct ResourceContract<R> {
    name: String,
    singular: &'static str,
    plural: &'static str,
    authorizer: Option<Arc<dyn AuthorizationChecker>>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> ResourceContract<R> {
    pub fn new(name: impl Into<String>, singular: &'static str, plural: &'static str) -> Self {
        Self {
            name: name.into(),
            singular,
            plural,
            authorizer: None,
            _resource: PhantomData,
        }
    }

    /// Require patient access for every operation on a single record.
    pub fn with_authorizer(mut self, checker: Arc<dyn AuthorizationChecker>) -> Self {
        self.authorizer = Some(checker);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn function_names(&self) -> Vec<String> {
        vec![
            format!("Create{}", self.singular),
            format!("Read{}", self.singular),
            format!("Update{}", self.singular),
            format!("Delete{}", self.singular),
            format!("Search{}", self.plural),
            format!("Search{}Paginated", self.plural),
        ]
    }

    pub fn unknown_function(&self, function: &str) -> ContractError {
        ContractError::UnknownFunction {
            contract: self.name.clone(),
            function: function.to_string(),
        }
    }

    /// Run `function` if it is one of the generic operations; `None` otherwise.
    pub fn dispatch(
        &self,
        ctx: &mut dyn ContractContext,
        function: &str,
        args: &[String],
    ) -> Option<ContractResult<Vec<u8>>> {
        if let Some(verb) = function.strip_suffix(self.singular) {
            let result = match verb {
                "Create" => args::create_args(function, args)
                    .and_then(|(id, payload)| self.create(ctx, id, payload)),
                "Read" => args::exact::<1>(function, args).and_then(|[id]| self.read(ctx, id)),
                "Update" => args::exact::<2>(function, args)
                    .and_then(|[id, payload]| self.update(ctx, id, payload)),
                "Delete" => args::exact::<1>(function, args).and_then(|[id]| self.delete(ctx, id)),
                _ => return None,
            };
            return Some(result);
        }

        match function
            .strip_prefix("Search")
            .and_then(|rest| rest.strip_prefix(self.plural))
        {
            Some("") => Some(args::exact::<1>(function, args).and_then(|[query]| self.search(ctx, query))),
            Some("Paginated") => Some(args::exact::<3>(function, args).and_then(
                |[query, page_size, bookmark]| {
                    let page_size = args::parse_page_size(page_size)?;
                    self.search_paginated(ctx, query, page_size, bookmark)
                },
            )),
            _ => None,
        }
    }

    fn not_found(&self, id: &ResourceId) -> ContractError {
        ContractError::NotFound {
            resource_type: R::RESOURCE_TYPE,
            id: id.to_string(),
        }
    }

    fn resolve_id(&self, explicit: Option<&str>, resource: &R) -> ContractResult<ResourceId> {
        let missing = || ContractError::MissingIdentifier(format!("{} identifier", R::RESOURCE_TYPE));
        let embedded = resource.identifier();
        if embedded.is_some_and(|e| e.trim().is_empty())
            || explicit.is_some_and(|e| e.trim().is_empty())
        {
            return Err(missing());
        }

        match (explicit, embedded) {
            (Some(given), Some(embedded)) if given != embedded => Err(ContractError::InvalidPayload(
                format!("payload identifier '{embedded}' does not match '{given}'"),
            )),
            (Some(id), _) | (None, Some(id)) => resource_id(R::RESOURCE_TYPE, id),
            (None, None) => Err(missing()),
        }
    }

    fn decode_stored(key: &str, bytes: &[u8]) -> ContractResult<R> {
        fhir::parse(bytes).map_err(|err| ContractError::DecodeError {
            key: key.to_string(),
            message: err.to_string(),
        })
    }

    /// Fail unless the caller may act on the patient `resource` belongs to.
    ///
    /// Always succeeds for contracts without an authorizer.
    pub fn check_access(&self, ctx: &mut dyn ContractContext, resource: &R) -> ContractResult<()> {
        match &self.authorizer {
            Some(checker) => authorize(checker.as_ref(), ctx, resource.patient_reference()),
            None => Ok(()),
        }
    }

    /// Decode the stored record `id`.
    ///
    /// # Errors
    ///
    /// [`ContractError::NotFound`] if absent, [`ContractError::DecodeError`] if the stored
    /// bytes no longer match the schema.
    pub fn load(&self, ctx: &mut dyn ContractContext, id: &str) -> ContractResult<(ResourceId, R)> {
        let id = resource_id(R::RESOURCE_TYPE, id)?;
        let key = LedgerKey::Resource(&id).encode();
        let bytes = ctx.get_state(&key)?.ok_or_else(|| self.not_found(&id))?;
        let resource = Self::decode_stored(&key, &bytes)?;
        Ok((id, resource))
    }

    /// Write `resource` at `id` in canonical form.
    pub fn store(&self, ctx: &mut dyn ContractContext, id: &ResourceId, resource: &R) -> ContractResult<()> {
        let bytes = fhir::render(resource)?;
        ctx.put_state(&LedgerKey::Resource(id).encode(), bytes)
    }

    pub fn create(
        &self,
        ctx: &mut dyn ContractContext,
        id: Option<&str>,
        payload: &str,
    ) -> ContractResult<Vec<u8>> {
        let resource: R = fhir::parse(payload.as_bytes())?;
        let id = self.resolve_id(id, &resource)?;
        self.check_access(ctx, &resource)?;

        let key = LedgerKey::Resource(&id).encode();
        if ctx.get_state(&key)?.is_some() {
            return Err(ContractError::AlreadyExists {
                resource_type: R::RESOURCE_TYPE,
                id: id.into_inner(),
            });
        }

        self.store(ctx, &id, &resource)?;
        ack(format!("{} {id} created", R::RESOURCE_TYPE))
    }

    /// Stored bytes of record `id`, unchanged.
    pub fn read(&self, ctx: &mut dyn ContractContext, id: &str) -> ContractResult<Vec<u8>> {
        let id = resource_id(R::RESOURCE_TYPE, id)?;
        let key = LedgerKey::Resource(&id).encode();
        let bytes = ctx.get_state(&key)?.ok_or_else(|| self.not_found(&id))?;

        if self.authorizer.is_some() {
            let existing = Self::decode_stored(&key, &bytes)?;
            self.check_access(ctx, &existing)?;
        }
        Ok(bytes)
    }

    /// Replace record `id` with `payload`. Fields absent from `payload` are dropped.
    pub fn update(&self, ctx: &mut dyn ContractContext, id: &str, payload: &str) -> ContractResult<Vec<u8>> {
        let id = resource_id(R::RESOURCE_TYPE, id)?;
        let key = LedgerKey::Resource(&id).encode();
        let stored = ctx.get_state(&key)?.ok_or_else(|| self.not_found(&id))?;

        let resource: R = fhir::parse(payload.as_bytes())?;
        if let Some(embedded) = resource.identifier() {
            if embedded != id.as_str() {
                return Err(ContractError::InvalidPayload(format!(
                    "payload identifier '{embedded}' does not match '{id}'"
                )));
            }
        }

        if let Some(checker) = &self.authorizer {
            authorize(checker.as_ref(), ctx, resource.patient_reference())?;
            let existing = Self::decode_stored(&key, &stored)?;
            if existing.patient_reference() != resource.patient_reference() {
                authorize(checker.as_ref(), ctx, existing.patient_reference())?;
            }
        }

        self.store(ctx, &id, &resource)?;
        ack(format!("{} {id} updated", R::RESOURCE_TYPE))
    }

    pub fn delete(&self, ctx: &mut dyn ContractContext, id: &str) -> ContractResult<Vec<u8>> {
        let (id, existing) = self.load(ctx, id)?;
        self.check_access(ctx, &existing)?;
        ctx.delete_state(&LedgerKey::Resource(&id).encode())?;
        ack(format!("{} {id} deleted", R::RESOURCE_TYPE))
    }

    /// Keep the records the caller may see.
    ///
    /// Contracts without an authorizer return `records` unchanged. Otherwise the caller must
    /// carry a `userId`, and records without a patient reference are dropped. Each patient is
    /// checked once per search.
    pub fn visible(&self, ctx: &mut dyn ContractContext, records: Vec<R>) -> ContractResult<Vec<R>> {
        let Some(checker) = &self.authorizer else {
            return Ok(records);
        };
        let caller = caller_id(ctx)?;
        let mut decisions: BTreeMap<String, bool> = BTreeMap::new();
        let fetched = records.len();
        let mut visible = Vec::with_capacity(fetched);

        for record in records {
            let Some(patient) = record
                .patient_reference()
                .map(str::trim)
                .filter(|r| !r.is_empty())
            else {
                continue;
            };
            let allowed = match decisions.get(patient) {
                Some(allowed) => *allowed,
                None => {
                    let allowed = checker.is_authorized(ctx, patient, &caller)?;
                    decisions.insert(patient.to_string(), allowed);
                    allowed
                }
            };
            if allowed {
                visible.push(record);
            }
        }

        if visible.len() < fetched {
            tracing::debug!(caller = %caller, hidden = fetched - visible.len(), "search results filtered");
        }
        Ok(visible)
    }

    pub fn search(&self, ctx: &mut dyn ContractContext, query: &str) -> ContractResult<Vec<u8>> {
        let found: Vec<R> = search::execute_query(ctx, query)?;
        let found = self.visible(ctx, found)?;
        search::render_results(&found)
    }

    /// One page of matches the caller may see.
    ///
    /// The metadata describes the page as fetched from the ledger, so the bookmark still
    /// advances past records that were hidden.
    pub fn search_paginated(
        &self,
        ctx: &mut dyn ContractContext,
        query: &str,
        page_size: usize,
        bookmark: &str,
    ) -> ContractResult<Vec<u8>> {
        let mut page: search::Page<R> = search::execute_paginated(ctx, query, page_size, bookmark)?;
        page.records = self.visible(ctx, page.records)?;
        search::render_results(&page)
    }

    /// Linear scan for records where any of `paths` contains `needle`.
    pub fn search_by_field(
        &self,
        ctx: &mut dyn ContractContext,
        paths: &[&str],
        needle: &str,
    ) -> ContractResult<Vec<u8>> {
        let found: Vec<R> = search::search_by_field(ctx, paths, needle)?;
        let found = self.visible(ctx, found)?;
        search::render_results(&found)
    }
}
