//! Defines routes for tenant provisioning and ledger operations.
//!
//! ## Structure
//! - **Provisioning endpoints**
//!   - `POST /tenants`                — multipart form intake, full workflow
//!   - `POST /tenants/select-cluster` — re-entry with an explicit cluster choice
//!
//! - **Ledger endpoints**
//!   - `POST /ledger/check`      — existence/status lookups
//!   - `POST /ledger/deactivate` — flip the active flag on tenant resources
//!   - `POST /ledger/quotas`     — rewrite bucket quotas
//!
//! - **Directory endpoint**
//!   - `GET /clusters?segment=&env=` — candidate clusters for a pair

use crate::{
    handlers::{
        health_handlers::{healthz, readyz},
        tenant_handlers::{
            check_ledger, deactivate, list_clusters, select_cluster, submit, update_quotas,
        },
    },
    services::provisioning_service::ProvisioningService,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build and return the router for all provisioning routes.
///
/// The router carries shared state (`ProvisioningService`) to all handlers.
pub fn routes() -> Router<ProvisioningService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // provisioning workflow
        .route("/tenants", post(submit))
        .route("/tenants/select-cluster", post(select_cluster))
        // ledger operations
        .route("/ledger/check", post(check_ledger))
        .route("/ledger/deactivate", post(deactivate))
        .route("/ledger/quotas", post(update_quotas))
        // cluster directory
        .route("/clusters", get(list_clusters))
}
