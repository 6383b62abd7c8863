//! HTTP handlers for tenant provisioning and ledger operations.
//!
//! Transport parsing stops here: multipart forms and JSON bodies are reduced
//! to a typed [`ProvisioningRequest`] before the workflow runs.

use crate::{
    errors::AppError,
    models::{
        ledger::{LedgerFilter, QuotaUpdate},
        request::ProvisioningRequest,
    },
    services::provisioning_service::ProvisioningService,
};
use axum::{
    Json,
    extract::{Multipart, Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

/// Fields where one form value may carry several newline-separated entries.
const LIST_FIELDS: [&str; 3] = ["users", "bucketnames", "bucketquotas"];

/// Query params for `GET /clusters`.
#[derive(Debug, Deserialize)]
pub struct ClusterQuery {
    pub segment: String,
    pub env: String,
}

/// Request body for `POST /ledger/deactivate`.
#[derive(Debug, Deserialize)]
pub struct DeactivateReq {
    pub tenant: String,
    #[serde(default)]
    pub users: Vec<String>,
    #[serde(default)]
    pub buckets: Vec<String>,
}

/// Request body for `POST /ledger/quotas`.
#[derive(Debug, Deserialize)]
pub struct QuotaReq {
    pub tenant: String,
    #[serde(default)]
    pub buckets: Vec<QuotaUpdate>,
}

/// POST `/tenants` — multipart form intake for the full workflow.
pub async fn submit(
    State(service): State<ProvisioningService>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = collect_form(multipart).await?;
    let request = ProvisioningRequest::from_form(&form)?;
    let outcome = service.provision(request).await?;
    Ok(Json(outcome))
}

/// POST `/tenants/select-cluster` — re-entry with an explicit cluster name
/// after an ambiguity round-trip.
pub async fn select_cluster(
    State(service): State<ProvisioningService>,
    Json(mut request): Json<ProvisioningRequest>,
) -> Result<impl IntoResponse, AppError> {
    if request.cluster.as_deref().unwrap_or_default().is_empty() {
        return Err(AppError::bad_request("cluster selection is required"));
    }
    request.normalize();
    let outcome = service.provision(request).await?;
    Ok(Json(outcome))
}

/// POST `/ledger/check` — existence and status lookups over the ledger.
pub async fn check_ledger(
    State(service): State<ProvisioningService>,
    Json(filter): Json<LedgerFilter>,
) -> Result<impl IntoResponse, AppError> {
    let results = service.check(&filter).await?;
    Ok(Json(json!({ "results": results })))
}

/// POST `/ledger/deactivate` — flip the active flag off for tenant resources.
pub async fn deactivate(
    State(service): State<ProvisioningService>,
    Json(req): Json<DeactivateReq>,
) -> Result<impl IntoResponse, AppError> {
    if req.tenant.is_empty() {
        return Err(AppError::bad_request("tenant name is required"));
    }
    let outcome = service
        .deactivate(&req.tenant, &req.users, &req.buckets)
        .await?;
    Ok(Json(outcome))
}

/// POST `/ledger/quotas` — rewrite bucket quotas for a tenant.
pub async fn update_quotas(
    State(service): State<ProvisioningService>,
    Json(req): Json<QuotaReq>,
) -> Result<impl IntoResponse, AppError> {
    if req.tenant.is_empty() {
        return Err(AppError::bad_request("tenant name is required"));
    }
    let outcome = service.update_quotas(&req.tenant, &req.buckets).await?;
    Ok(Json(outcome))
}

/// GET `/clusters?segment=&env=` — candidate clusters for a pair.
pub async fn list_clusters(
    State(service): State<ProvisioningService>,
    Query(query): Query<ClusterQuery>,
) -> Result<impl IntoResponse, AppError> {
    let clusters = service
        .directory()
        .find_matching(&query.segment.to_uppercase(), &query.env.to_uppercase());
    Ok(Json(json!({ "clusters": clusters })))
}

/// Reduce a multipart form to a key → value-list map.
///
/// List fields accept either repeated parts or one newline-separated value;
/// both arrive as multiple entries.
async fn collect_form(mut multipart: Multipart) -> Result<HashMap<String, Vec<String>>, AppError> {
    let mut form: HashMap<String, Vec<String>> = HashMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(format!("invalid multipart form: {err}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|err| AppError::bad_request(format!("invalid multipart field: {err}")))?;

        let values = form.entry(name.clone()).or_default();
        if LIST_FIELDS.contains(&name.as_str()) {
            values.extend(
                value
                    .lines()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string),
            );
        } else {
            values.push(value);
        }
    }
    Ok(form)
}
