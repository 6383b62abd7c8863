//! Durable ledger records and the resource entries that produce them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Placeholder filling the unused slot of the user/bucket union so both
/// resource kinds share one table.
pub const PLACEHOLDER: &str = "-";

/// One persisted ledger row asserting that a user or bucket was provisioned
/// under a given tenant/cluster/segment/environment.
///
/// Uniqueness contract: no two active rows may share
/// (cluster, segment, env, realm, tenant, s3_user, bucket).
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct LedgerRow {
    /// Cluster the resource lives on.
    pub cluster: String,

    /// Network segment.
    pub segment: String,

    /// Deployment environment.
    pub env: String,

    /// RGW realm.
    pub realm: String,

    /// Owning tenant identifier.
    pub tenant: String,

    /// User name, or `"-"` for bucket rows.
    pub s3_user: String,

    /// Bucket name, or `"-"` for user rows.
    pub bucket: String,

    /// Bucket quota as requested (unit-suffixed), or `"-"` for user rows.
    pub quota: String,

    /// Originating change-request identifier.
    pub request_id: String,

    /// Originating service-ticket identifier.
    pub ticket_id: String,

    /// When the row was written.
    pub created_at: DateTime<Utc>,

    /// Requesting-application code.
    pub app_code: String,

    /// Requesting-application registry id.
    pub app_id: String,

    /// Owning organizational group.
    pub owner_group: String,

    /// Responsible person.
    pub owner_person: String,

    /// Person who filed the request.
    pub requester: String,

    /// Notification email, or `"-"` for bucket rows.
    pub email: String,

    /// Free-text operator comment.
    pub comment: String,

    /// Cleared by deactivation; never deleted.
    pub active: bool,
}

/// Which slot of the ledger union a resource occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKind {
    User,
    Bucket,
}

/// One user or bucket to be provisioned — the unit of the persistence ledger.
#[derive(Clone, Debug)]
pub struct ResourceEntry {
    pub kind: ResourceKind,
    pub name: String,
    /// Buckets only; users carry the placeholder.
    pub quota: Option<String>,
}

impl ResourceEntry {
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::User,
            name: name.into(),
            quota: None,
        }
    }

    pub fn bucket(name: impl Into<String>, quota: impl Into<String>) -> Self {
        Self {
            kind: ResourceKind::Bucket,
            name: name.into(),
            quota: Some(quota.into()),
        }
    }

    /// Value for the `s3_user` column.
    pub fn user_slot(&self) -> &str {
        match self.kind {
            ResourceKind::User => &self.name,
            ResourceKind::Bucket => PLACEHOLDER,
        }
    }

    /// Value for the `bucket` column.
    pub fn bucket_slot(&self) -> &str {
        match self.kind {
            ResourceKind::User => PLACEHOLDER,
            ResourceKind::Bucket => &self.name,
        }
    }

    /// Value for the `quota` column.
    pub fn quota_slot(&self) -> &str {
        self.quota.as_deref().unwrap_or(PLACEHOLDER)
    }

    /// Human-readable descriptor used in conflict reports.
    pub fn describe(&self) -> String {
        match self.kind {
            ResourceKind::User => format!("user: {}", self.name),
            ResourceKind::Bucket => format!("bucket: {}", self.name),
        }
    }
}

/// Optional per-column filters for the ledger read path.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LedgerFilter {
    pub segment: Option<String>,
    pub env: Option<String>,
    pub app_code: Option<String>,
    pub app_id: Option<String>,
    pub tenant: Option<String>,
    pub bucket: Option<String>,
    pub user: Option<String>,
    pub cluster: Option<String>,
}

impl LedgerFilter {
    /// Filter matching every row of one tenant.
    pub fn for_tenant(tenant: impl Into<String>) -> Self {
        Self {
            tenant: Some(tenant.into()),
            ..Self::default()
        }
    }
}

/// A requested quota change for one bucket.
#[derive(Debug, Clone, Deserialize)]
pub struct QuotaUpdate {
    pub name: String,
    pub size: String,
}
