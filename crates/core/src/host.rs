//! Contract host: registry, transaction lifecycle and the per-invocation stub.
//!
//! A [`ContractHost`] owns the ledger and every installed [`Contract`]. Each client proposal
//! runs in its own transaction; [`ContractHost::submit`] commits it when the contract
//! succeeds, [`ContractHost::evaluate`] always discards it.

use crate::config::CoreConfig;
use crate::constants::{STATUS_ERROR, STATUS_OK};
use crate::error::{ContractError, ContractResult, ErrorKind, StoreError};
use crate::ledger::{Identity, MemoryLedger, QueryCursor, QueryMetadata, Transaction};
use crate::store::{ContractContext, StateStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A contract installed on the host.
pub trait Contract: Send + Sync {
    /// Contract name, which is also its ledger namespace.
    fn name(&self) -> &str;

    /// Function names accepted by [`Contract::invoke`].
    fn functions(&self) -> Vec<String>;

    fn invoke(
        &self,
        ctx: &mut dyn ContractContext,
        function: &str,
        args: &[String],
    ) -> ContractResult<Vec<u8>>;
}

/// Body of a failure [`Response`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailurePayload {
    pub error: String,
    pub kind: ErrorKind,
}

/// Outcome of a contract invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub status: i32,
    pub message: String,
    pub payload: Vec<u8>,
}

impl Response {
    pub fn success(payload: Vec<u8>) -> Self {
        Self {
            status: STATUS_OK,
            message: String::new(),
            payload,
        }
    }

    pub fn error(err: &ContractError) -> Self {
        let failure = FailurePayload {
            error: err.to_string(),
            kind: err.kind(),
        };
        Self {
            status: STATUS_ERROR,
            message: failure.error.clone(),
            payload: serde_json::to_vec(&failure).unwrap_or_default(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Decoded failure body, for non-success responses.
    pub fn failure(&self) -> Option<FailurePayload> {
        if self.is_success() {
            return None;
        }
        serde_json::from_slice(&self.payload).ok()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.failure().map(|f| f.kind)
    }
}

impl From<ContractResult<Vec<u8>>> for Response {
    fn from(result: ContractResult<Vec<u8>>) -> Self {
        match result {
            Ok(payload) => Response::success(payload),
            Err(err) => Response::error(&err),
        }
    }
}

/// Success acknowledgment payload: `{"message": "<text>"}`.
pub fn ack(message: impl Into<String>) -> ContractResult<Vec<u8>> {
    #[derive(Serialize)]
    struct Ack {
        message: String,
    }

    serde_json::to_vec(&Ack {
        message: message.into(),
    })
    .map_err(ContractError::Serialization)
}

/// A client request to invoke one contract function.
#[derive(Clone, Debug, Default)]
pub struct Proposal {
    /// Channel to run on; the host's configured channel when `None`.
    pub channel_id: Option<String>,
    pub contract: String,
    pub function: String,
    pub args: Vec<String>,
    pub identity: Identity,
}

impl Proposal {
    pub fn new(contract: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            function: function.into(),
            ..Self::default()
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set the caller's `userId` identity attribute.
    pub fn with_caller(mut self, user_id: impl Into<String>) -> Self {
        self.identity
            .insert(crate::constants::USER_ID_ATTRIBUTE, user_id.into());
        self
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    pub fn on_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = Some(channel_id.into());
        self
    }
}

/// Installed contracts plus the ledger they share.
pub struct ContractHost {
    config: Arc<CoreConfig>,
    ledger: MemoryLedger,
    contracts: BTreeMap<String, Arc<dyn Contract>>,
}

impl std::fmt::Debug for ContractHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractHost")
            .field("channel_id", &self.config.channel_id())
            .field("contracts", &self.contracts.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ContractHost {
    pub fn new(config: Arc<CoreConfig>) -> Self {
        let ledger = MemoryLedger::new(config.channel_id());
        Self {
            config,
            ledger,
            contracts: BTreeMap::new(),
        }
    }

    /// Install `contract`, replacing any contract with the same name.
    pub fn register(&mut self, contract: Arc<dyn Contract>) {
        tracing::debug!(contract = contract.name(), "registering contract");
        self.contracts.insert(contract.name().to_string(), contract);
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn ledger(&self) -> &MemoryLedger {
        &self.ledger
    }

    pub fn contract(&self, name: &str) -> Option<&Arc<dyn Contract>> {
        self.contracts.get(name)
    }

    /// Installed contracts in name order.
    pub fn contracts(&self) -> impl Iterator<Item = &Arc<dyn Contract>> {
        self.contracts.values()
    }

    /// Run a proposal and commit its writes if it succeeds.
    pub fn submit(&self, proposal: &Proposal) -> Response {
        self.execute(proposal, true)
    }

    /// Run a proposal without committing anything.
    pub fn evaluate(&self, proposal: &Proposal) -> Response {
        self.execute(proposal, false)
    }

    fn execute(&self, proposal: &Proposal, commit: bool) -> Response {
        let channel = proposal
            .channel_id
            .as_deref()
            .unwrap_or(self.config.channel_id());
        let mut tx = match self.ledger.begin(channel, proposal.identity.clone()) {
            Ok(tx) => tx,
            Err(err) => return Response::error(&err.into()),
        };

        let span = tracing::info_span!(
            "transaction",
            tx_id = %tx.tx_id(),
            contract = %proposal.contract,
            function = %proposal.function,
        );
        let _entered = span.enter();

        let payload = match self.dispatch(
            &mut tx,
            &proposal.contract,
            &proposal.function,
            &proposal.args,
        ) {
            Ok(payload) => payload,
            Err(err) => {
                tracing::debug!(kind = %err.kind(), "invocation failed: {err}");
                return Response::error(&err);
            }
        };

        if !commit {
            return Response::success(payload);
        }

        match self.ledger.commit(tx) {
            Ok(height) => {
                tracing::info!(height, "transaction committed");
                Response::success(payload)
            }
            Err(err) => Response::error(&err.into()),
        }
    }

    fn dispatch(
        &self,
        tx: &mut Transaction,
        contract: &str,
        function: &str,
        args: &[String],
    ) -> ContractResult<Vec<u8>> {
        let target = self
            .contracts
            .get(contract)
            .ok_or_else(|| ContractError::UnknownContract(contract.to_string()))?;
        let mut stub = ContractStub {
            host: self,
            tx,
            namespace: contract,
        };
        target.invoke(&mut stub, function, args)
    }
}

/// A contract's view of the transaction invoking it, bound to the contract's namespace.
pub struct ContractStub<'a> {
    host: &'a ContractHost,
    tx: &'a mut Transaction,
    namespace: &'a str,
}

impl StateStore for ContractStub<'_> {
    fn get_state(&mut self, key: &str) -> ContractResult<Option<Vec<u8>>> {
        Ok(self.host.ledger.get(self.tx, self.namespace, key)?)
    }

    fn put_state(&mut self, key: &str, value: Vec<u8>) -> ContractResult<()> {
        tracing::debug!(namespace = self.namespace, key, "put state");
        self.host.ledger.put(self.tx, self.namespace, key, value);
        Ok(())
    }

    fn delete_state(&mut self, key: &str) -> ContractResult<()> {
        tracing::debug!(namespace = self.namespace, key, "delete state");
        self.host.ledger.delete(self.tx, self.namespace, key);
        Ok(())
    }

    fn get_state_by_range(&mut self, start: &str, end: &str) -> ContractResult<QueryCursor> {
        Ok(self.host.ledger.range(self.tx, self.namespace, start, end)?)
    }

    fn get_query_result(&mut self, query: &str) -> ContractResult<QueryCursor> {
        Ok(self.host.ledger.query(self.namespace, query)?)
    }

    fn get_query_result_with_pagination(
        &mut self,
        query: &str,
        page_size: usize,
        bookmark: &str,
    ) -> ContractResult<(QueryCursor, QueryMetadata)> {
        Ok(self
            .host
            .ledger
            .query_page(self.namespace, query, page_size, bookmark)?)
    }
}

impl ContractContext for ContractStub<'_> {
    fn caller_attribute(&self, name: &str) -> Option<String> {
        self.tx.identity().attribute(name).map(str::to_string)
    }

    fn channel_id(&self) -> &str {
        self.tx.channel_id()
    }

    fn tx_id(&self) -> &str {
        self.tx.tx_id()
    }

    fn tx_timestamp(&self) -> DateTime<Utc> {
        self.tx.timestamp()
    }

    fn invoke_contract(&mut self, contract: &str, args: &[String], channel: &str) -> Response {
        if !channel.is_empty() && channel != self.tx.channel_id() {
            return Response::error(&StoreError::UnknownChannel(channel.to_string()).into());
        }
        let Some((function, rest)) = args.split_first() else {
            return Response::error(&ContractError::InvalidArguments(
                "cross-contract call needs a function name".into(),
            ));
        };
        tracing::debug!(from = self.namespace, to = contract, function = %function, "cross-contract call");
        self.host
            .dispatch(&mut *self.tx, contract, function, rest)
            .into()
    }
}
