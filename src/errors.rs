use crate::models::cluster::ClusterRecord;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use thiserror::Error;

/// Domain errors of the provisioning workflow.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("no matching clusters found for segment `{segment}` and environment `{env}`")]
    NoClusterFound { segment: String, env: String },

    #[error("multiple clusters found for segment `{segment}` and environment `{env}`")]
    AmbiguousCluster {
        segment: String,
        env: String,
        candidates: Vec<ClusterRecord>,
    },

    #[error("required field `{0}` is missing or empty")]
    MissingField(&'static str),

    #[error("{names} bucket names paired with {quotas} quotas")]
    MismatchedArity { names: usize, quotas: usize },

    #[error("naming convention violations: {}", .0.join("; "))]
    ConventionViolations(Vec<String>),

    #[error("tenant `{0}` already exists in the ledger")]
    TenantExists(String),

    #[error("the following entries already exist: {}", .0.join(", "))]
    Conflict(Vec<String>),

    #[error("no ledger rows matched")]
    NotFound,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// A lightweight wrapper for HTTP errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
    /// Structured payload for recoverable errors (e.g. cluster candidates).
    pub details: Option<serde_json::Value>,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            details: None,
        }
    }

    /// Shortcut for a 500 Internal Server Error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut body = json!({
            "error": self.message,
            "status": self.status.as_u16()
        });
        if let Some(details) = self.details {
            body["details"] = details;
        }

        (self.status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::internal(err.to_string())
    }
}

impl From<ProvisionError> for AppError {
    fn from(err: ProvisionError) -> Self {
        let status = match &err {
            ProvisionError::NoClusterFound { .. } | ProvisionError::NotFound => {
                StatusCode::NOT_FOUND
            }
            ProvisionError::AmbiguousCluster { .. }
            | ProvisionError::TenantExists(_)
            | ProvisionError::Conflict(_) => StatusCode::CONFLICT,
            ProvisionError::MissingField(_)
            | ProvisionError::MismatchedArity { .. }
            | ProvisionError::ConventionViolations(_) => StatusCode::BAD_REQUEST,
            ProvisionError::Sqlx(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let details = match &err {
            ProvisionError::AmbiguousCluster { candidates, .. } => {
                Some(json!({ "clusters": candidates }))
            }
            ProvisionError::Conflict(duplicates) => Some(json!({ "duplicates": duplicates })),
            ProvisionError::ConventionViolations(problems) => Some(json!({ "problems": problems })),
            _ => None,
        };

        Self {
            status,
            message: err.to_string(),
            details,
        }
    }
}
