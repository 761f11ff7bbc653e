// Re-export the proto module from the shared `api-shared` crate so callers
// can reference `api_grpc::service::pb`.
pub use api_shared::pb;

use api_shared::pb::gateway_server::Gateway;
use api_shared::pb::{HealthRes, ListContractsRes, ProposalReq, TransactionRes};
use api_shared::{auth, HealthService};
use hlc_core::{ContractHost, Proposal};
use std::sync::Arc;
use tonic::{Request, Response, Status};

/// Authentication interceptor for gRPC requests
#[allow(clippy::result_large_err)]
pub fn auth_interceptor(req: Request<()>) -> Result<Request<()>, Status> {
    let api_key = req
        .metadata()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| Status::unauthenticated("Missing x-api-key header"))?;

    auth::validate_api_key(api_key)?;
    Ok(req)
}

/// gRPC gateway onto a shared contract host.
#[derive(Clone)]
pub struct GatewayService {
    host: Arc<ContractHost>,
}

impl GatewayService {
    pub fn new(host: Arc<ContractHost>) -> Self {
        Self { host }
    }
}

#[allow(clippy::result_large_err)]
fn proposal(req: ProposalReq) -> Result<Proposal, Status> {
    if req.contract.trim().is_empty() || req.function.trim().is_empty() {
        return Err(Status::invalid_argument("contract and function are required"));
    }
    Ok(Proposal::from(req))
}

#[tonic::async_trait]
impl Gateway for GatewayService {
    async fn health(&self, _req: Request<()>) -> Result<Response<HealthRes>, Status> {
        Ok(Response::new(HealthService::check_health()))
    }

    async fn list_contracts(
        &self,
        _req: Request<()>,
    ) -> Result<Response<ListContractsRes>, Status> {
        Ok(Response::new(api_shared::list_contracts(&self.host)))
    }

    async fn submit(&self, req: Request<ProposalReq>) -> Result<Response<TransactionRes>, Status> {
        let proposal = proposal(req.into_inner())?;
        let response = self.host.submit(&proposal);
        if !response.is_success() {
            tracing::warn!(
                "Submit {}.{} failed: {}",
                proposal.contract,
                proposal.function,
                response.message
            );
        }
        Ok(Response::new(response.into()))
    }

    async fn evaluate(&self, req: Request<ProposalReq>) -> Result<Response<TransactionRes>, Status> {
        let proposal = proposal(req.into_inner())?;
        Ok(Response::new(self.host.evaluate(&proposal).into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hlc_core::{default_host, CoreConfig};
    use std::collections::HashMap;

    fn service() -> GatewayService {
        let host = default_host(Arc::new(CoreConfig::default())).expect("host should build");
        GatewayService::new(Arc::new(host))
    }

    fn req(function: &str, args: &[&str]) -> Request<ProposalReq> {
        Request::new(ProposalReq {
            channel: String::new(),
            contract: "patient".into(),
            function: function.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            attributes: HashMap::from([("userId".to_string(), "P1".to_string())]),
        })
    }

    #[tokio::test]
    async fn test_health() {
        let res = service()
            .health(Request::new(()))
            .await
            .expect("health should succeed")
            .into_inner();
        assert!(res.ok);
    }

    #[tokio::test]
    async fn test_submit_then_evaluate() {
        let svc = service();
        let created = svc
            .submit(req("CreatePatient", &[r#"{"identifier":{"value":"P1"}}"#]))
            .await
            .expect("submit should succeed")
            .into_inner();
        assert_eq!(created.status, 200);

        let read = svc
            .evaluate(req("ReadPatient", &["P1"]))
            .await
            .expect("evaluate should succeed")
            .into_inner();
        assert_eq!(read.payload, r#"{"identifier":{"value":"P1"}}"#);

        let again = svc
            .submit(req("CreatePatient", &[r#"{"identifier":{"value":"P1"}}"#]))
            .await
            .expect("contract failures are not transport errors")
            .into_inner();
        assert_eq!(again.status, 500);
        assert_eq!(again.error_kind, "AlreadyExists");
    }

    #[tokio::test]
    async fn test_missing_function_is_invalid_argument() {
        let status = service()
            .submit(req("", &[]))
            .await
            .expect_err("function is required");
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }

    #[tokio::test]
    async fn test_list_contracts() {
        let res = service()
            .list_contracts(Request::new(()))
            .await
            .expect("list should succeed")
            .into_inner();
        assert_eq!(res.contracts.len(), 10);
        assert!(res.contracts.iter().any(|c| c.name == "folder"));
    }
}
