//! # API REST
//!
//! REST gateway for the HLC contract host.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, HTTP status mapping)
//!
//! Uses `api-shared` for common types and utilities.

#![warn(rust_2018_idioms)]

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{pb, HealthService};
use hlc_core::{ContractError, ContractHost, ErrorKind, Proposal};

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    host: Arc<ContractHost>,
}

impl AppState {
    pub fn new(host: Arc<ContractHost>) -> Self {
        Self { host }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, list_contracts, submit, evaluate),
    components(schemas(
        pb::HealthRes,
        pb::ContractInfo,
        pb::ListContractsRes,
        pb::ProposalReq,
        pb::TransactionRes,
    ))
)]
pub struct ApiDoc;

/// HTTP status for a contract failure of `kind`.
pub fn http_status(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidPayload
        | ErrorKind::MissingIdentifier
        | ErrorKind::InvalidIdentifier
        | ErrorKind::InvalidArguments
        | ErrorKind::UnknownFunction
        | ErrorKind::InvalidIndex => StatusCode::BAD_REQUEST,
        ErrorKind::AuthorizationDenied | ErrorKind::IdentityAttributeMissing => StatusCode::FORBIDDEN,
        ErrorKind::NotFound | ErrorKind::UnknownContract => StatusCode::NOT_FOUND,
        ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ErrorKind::StoreError | ErrorKind::DecodeError | ErrorKind::Internal => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Build the REST router, including Swagger UI.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/contracts", get(list_contracts))
        .route("/transactions/submit", post(submit))
        .route("/transactions/evaluate", post(evaluate))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn into_http(response: hlc_core::Response) -> Response {
    match response.failure() {
        Some(failure) => (http_status(failure.kind), Json(failure)).into_response(),
        None => (StatusCode::OK, Json(pb::TransactionRes::from(response))).into_response(),
    }
}

fn run(state: &AppState, req: pb::ProposalReq, commit: bool) -> Response {
    if req.contract.trim().is_empty() || req.function.trim().is_empty() {
        let err = ContractError::InvalidArguments("contract and function are required".into());
        return into_http(hlc_core::Response::error(&err));
    }
    let proposal = Proposal::from(req);
    let response = if commit {
        state.host.submit(&proposal)
    } else {
        state.host.evaluate(&proposal)
    };
    if let Some(kind) = response.error_kind() {
        if http_status(kind).is_server_error() {
            tracing::error!(
                "{}.{} failed: {}",
                proposal.contract,
                proposal.function,
                response.message
            );
        }
    }
    into_http(response)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = pb::HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
async fn health(State(_state): State<AppState>) -> Json<pb::HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/contracts",
    responses(
        (status = 200, description = "Installed contracts and their functions", body = pb::ListContractsRes)
    )
)]
async fn list_contracts(State(state): State<AppState>) -> Json<pb::ListContractsRes> {
    Json(api_shared::list_contracts(&state.host))
}

#[utoipa::path(
    post,
    path = "/transactions/submit",
    request_body = pb::ProposalReq,
    responses(
        (status = 200, description = "Transaction committed", body = pb::TransactionRes),
        (status = 400, description = "Invalid payload, identifier, arguments or index"),
        (status = 403, description = "Caller may not act on the referenced patient"),
        (status = 404, description = "Record or contract not found"),
        (status = 409, description = "Record already exists"),
        (status = 500, description = "Ledger or decode failure")
    )
)]
/// Run a proposal and commit its writes
///
/// Failures return the failure body `{"error": "...", "kind": "..."}` with a status mapped from
/// the error kind.
async fn submit(State(state): State<AppState>, Json(req): Json<pb::ProposalReq>) -> Response {
    run(&state, req, true)
}

#[utoipa::path(
    post,
    path = "/transactions/evaluate",
    request_body = pb::ProposalReq,
    responses(
        (status = 200, description = "Query result", body = pb::TransactionRes),
        (status = 400, description = "Invalid payload, identifier, arguments or index"),
        (status = 403, description = "Caller may not act on the referenced patient"),
        (status = 404, description = "Record or contract not found"),
        (status = 500, description = "Ledger or decode failure")
    )
)]
/// Run a proposal without committing
async fn evaluate(State(state): State<AppState>, Json(req): Json<pb::ProposalReq>) -> Response {
    run(&state, req, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(http_status(ErrorKind::InvalidPayload), StatusCode::BAD_REQUEST);
        assert_eq!(http_status(ErrorKind::AuthorizationDenied), StatusCode::FORBIDDEN);
        assert_eq!(http_status(ErrorKind::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(http_status(ErrorKind::AlreadyExists), StatusCode::CONFLICT);
        assert_eq!(
            http_status(ErrorKind::DecodeError),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_openapi_lists_routes() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/transactions/submit"));
        assert!(doc.paths.paths.contains_key("/contracts"));
    }
}
