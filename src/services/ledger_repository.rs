//! Ledger persistence — duplicate-checked writes plus the read and mutation
//! paths over the `ledger` table.
//!
//! The write path is all-or-nothing: inside one transaction every resource
//! entry is probed for an existing (cluster, segment, env, realm, tenant,
//! user, bucket) tuple, and a single hit aborts the whole batch. Partial
//! provisioning would leave email and command artifacts referencing resources
//! that were silently skipped.

use crate::errors::{ProvisionError, ProvisionResult};
use crate::models::{
    cluster::ClusterRecord,
    ledger::{LedgerFilter, LedgerRow, PLACEHOLDER, QuotaUpdate, ResourceEntry, ResourceKind},
    request::ProvisioningRequest,
};
use chrono::Utc;
use serde::Serialize;
use sqlx::{QueryBuilder, SqlitePool, Sqlite, Transaction};
use std::sync::Arc;
use tracing::debug;

const LEDGER_COLUMNS: &str = "cluster, segment, env, realm, tenant, s3_user, bucket, quota, \
     request_id, ticket_id, created_at, app_code, app_id, owner_group, \
     owner_person, requester, email, comment, active";

/// Result of one per-row mutation (deactivation or quota update).
#[derive(Serialize, Clone, Debug)]
pub struct MutationStatus {
    pub name: String,
    pub updated: bool,
}

/// Repository over the provisioning ledger.
///
/// Constructed once at startup and handed to the orchestrator by reference;
/// there is no global connection state.
#[derive(Clone)]
pub struct LedgerRepository {
    db: Arc<SqlitePool>,
}

impl LedgerRepository {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db
    }

    /// Persist one batch of resource entries under a tenant.
    ///
    /// Probes every entry's ledger tuple first; any existing row rolls the
    /// transaction back and returns `Conflict` with the full duplicate list.
    /// Returns the inserted user and bucket names on success.
    pub async fn persist(
        &self,
        request: &ProvisioningRequest,
        cluster: &ClusterRecord,
        entries: &[ResourceEntry],
    ) -> ProvisionResult<(Vec<String>, Vec<String>)> {
        let tenant = request.tenant_name();
        let mut tx = self.db.begin().await?;

        let mut duplicates = Vec::new();
        for entry in entries {
            if self
                .tuple_exists(&mut tx, request, cluster, tenant, entry)
                .await?
            {
                duplicates.push(entry.describe());
            }
        }
        if !duplicates.is_empty() {
            tx.rollback().await?;
            return Err(ProvisionError::Conflict(duplicates));
        }

        let created_at = Utc::now();
        let mut inserted_users = Vec::new();
        let mut inserted_buckets = Vec::new();

        for entry in entries {
            // Bucket rows carry no notification email of their own.
            let email = match entry.kind {
                ResourceKind::User => request.email.as_str(),
                ResourceKind::Bucket => PLACEHOLDER,
            };
            sqlx::query(
                "INSERT INTO ledger (cluster, segment, env, realm, tenant, s3_user, bucket, \
                 quota, request_id, ticket_id, created_at, app_code, app_id, owner_group, \
                 owner_person, requester, email, comment, active) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&cluster.name)
            .bind(&request.segment)
            .bind(&request.env)
            .bind(&cluster.realm)
            .bind(tenant)
            .bind(entry.user_slot())
            .bind(entry.bucket_slot())
            .bind(entry.quota_slot())
            .bind(&request.request_id)
            .bind(&request.ticket_id)
            .bind(created_at)
            .bind(&request.app_code)
            .bind(&request.app_id)
            .bind(&request.owner_group)
            .bind(&request.owner_person)
            .bind(&request.requester)
            .bind(email)
            .bind(PLACEHOLDER)
            .bind(true)
            .execute(&mut *tx)
            .await?;

            match entry.kind {
                ResourceKind::User => inserted_users.push(entry.name.clone()),
                ResourceKind::Bucket => inserted_buckets.push(entry.name.clone()),
            }
        }

        tx.commit().await?;
        debug!(
            tenant,
            users = inserted_users.len(),
            buckets = inserted_buckets.len(),
            "ledger batch committed"
        );
        Ok((inserted_users, inserted_buckets))
    }

    /// Probe existence of one exact ledger tuple inside the open transaction.
    async fn tuple_exists(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        request: &ProvisioningRequest,
        cluster: &ClusterRecord,
        tenant: &str,
        entry: &ResourceEntry,
    ) -> ProvisionResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM ledger \
             WHERE cluster = ? AND segment = ? AND env = ? AND realm = ? \
             AND tenant = ? AND s3_user = ? AND bucket = ?)",
        )
        .bind(&cluster.name)
        .bind(&request.segment)
        .bind(&request.env)
        .bind(&cluster.realm)
        .bind(tenant)
        .bind(entry.user_slot())
        .bind(entry.bucket_slot())
        .fetch_one(&mut **tx)
        .await?;
        Ok(exists)
    }

    /// Read path: fetch ledger rows matching the optional per-column filters.
    pub async fn query(&self, filter: &LedgerFilter) -> ProvisionResult<Vec<LedgerRow>> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {LEDGER_COLUMNS} FROM ledger WHERE 1 = 1"
        ));

        let conditions: [(&str, &Option<String>); 8] = [
            ("segment", &filter.segment),
            ("env", &filter.env),
            ("app_code", &filter.app_code),
            ("app_id", &filter.app_id),
            ("tenant", &filter.tenant),
            ("bucket", &filter.bucket),
            ("s3_user", &filter.user),
            ("cluster", &filter.cluster),
        ];
        for (column, value) in conditions {
            if let Some(value) = value {
                builder.push(format!(" AND {column} = "));
                builder.push_bind(value.clone());
            }
        }
        builder.push(" ORDER BY created_at, tenant, s3_user, bucket");

        let rows = builder.build_query_as().fetch_all(&*self.db).await?;
        Ok(rows)
    }

    /// Whether any ledger row records the tenant in this segment/environment.
    pub async fn tenant_exists(
        &self,
        segment: &str,
        env: &str,
        tenant: &str,
    ) -> ProvisionResult<bool> {
        let filter = LedgerFilter {
            segment: Some(segment.to_string()),
            env: Some(env.to_string()),
            tenant: Some(tenant.to_string()),
            ..LedgerFilter::default()
        };
        Ok(!self.query(&filter).await?.is_empty())
    }

    /// Flip the active flag off for the named users and buckets of a tenant.
    ///
    /// Each update is an independent per-row statement; there is no cross-row
    /// atomicity requirement here. Bucket names may arrive as `name|quota`.
    pub async fn deactivate(
        &self,
        tenant: &str,
        users: &[String],
        buckets: &[String],
    ) -> ProvisionResult<(Vec<MutationStatus>, Vec<MutationStatus>)> {
        let mut user_statuses = Vec::new();
        for user in users.iter().filter(|u| !u.is_empty()) {
            let result =
                sqlx::query("UPDATE ledger SET active = 0 WHERE tenant = ? AND s3_user = ?")
                    .bind(tenant)
                    .bind(user)
                    .execute(&*self.db)
                    .await?;
            user_statuses.push(MutationStatus {
                name: user.clone(),
                updated: result.rows_affected() > 0,
            });
        }

        let mut bucket_statuses = Vec::new();
        for bucket in buckets.iter().filter(|b| !b.is_empty()) {
            let name = bucket.split('|').next().unwrap_or(bucket).trim();
            let result =
                sqlx::query("UPDATE ledger SET active = 0 WHERE tenant = ? AND bucket = ?")
                    .bind(tenant)
                    .bind(name)
                    .execute(&*self.db)
                    .await?;
            bucket_statuses.push(MutationStatus {
                name: name.to_string(),
                updated: result.rows_affected() > 0,
            });
        }

        Ok((user_statuses, bucket_statuses))
    }

    /// Rewrite the quota column for the named buckets of a tenant.
    pub async fn update_quotas(
        &self,
        tenant: &str,
        updates: &[QuotaUpdate],
    ) -> ProvisionResult<Vec<MutationStatus>> {
        let mut statuses = Vec::new();
        for update in updates {
            let result =
                sqlx::query("UPDATE ledger SET quota = ? WHERE tenant = ? AND bucket = ?")
                    .bind(&update.size)
                    .bind(tenant)
                    .bind(&update.name)
                    .execute(&*self.db)
                    .await?;
            statuses.push(MutationStatus {
                name: update.name.clone(),
                updated: result.rows_affected() > 0,
            });
        }
        Ok(statuses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_repo() -> LedgerRepository {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        for stmt in include_str!("../../migrations/0001_init.sql")
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            sqlx::query(stmt).execute(&pool).await.unwrap();
        }
        LedgerRepository::new(Arc::new(pool))
    }

    fn cluster() -> ClusterRecord {
        ClusterRecord {
            name: "alpha".into(),
            datacenter: "DC1".into(),
            realm: "alpha-realm".into(),
            issuer: "dir".into(),
            segment: "SEG1".into(),
            environment: "PROD".into(),
            tls_endpoint: "https://alpha.example.com".into(),
            mtls_endpoint: "https://alpha-mtls.example.com".into(),
        }
    }

    fn request() -> ProvisioningRequest {
        ProvisioningRequest {
            segment: "SEG1".into(),
            env: "PROD".into(),
            env_code: "p0".into(),
            app_code: "app1".into(),
            app_id: "1514".into(),
            owner_group: "Storage Ops".into(),
            owner_person: "I. Petrov".into(),
            requester: "A. Smith".into(),
            email: "ops@example.com".into(),
            request_id: "SD-100".into(),
            ticket_id: "SRT-200".into(),
            tenant: Some("p0_app1_gen_01_dc1_seg1".into()),
            ..ProvisioningRequest::default()
        }
    }

    #[tokio::test]
    async fn persist_inserts_one_row_per_entry() {
        let repo = test_repo().await;
        let entries = vec![
            ResourceEntry::user("p0_app1_reader"),
            ResourceEntry::bucket("p0-app1-data", "50"),
        ];
        let (users, buckets) = repo.persist(&request(), &cluster(), &entries).await.unwrap();
        assert_eq!(users, vec!["p0_app1_reader"]);
        assert_eq!(buckets, vec!["p0-app1-data"]);

        let rows = repo
            .query(&LedgerFilter::for_tenant("p0_app1_gen_01_dc1_seg1"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        let bucket_row = rows.iter().find(|r| r.bucket == "p0-app1-data").unwrap();
        assert_eq!(bucket_row.s3_user, "-");
        assert_eq!(bucket_row.quota, "50");
        assert_eq!(bucket_row.email, "-");
        assert!(bucket_row.active);
        let user_row = rows.iter().find(|r| r.s3_user == "p0_app1_reader").unwrap();
        assert_eq!(user_row.bucket, "-");
        assert_eq!(user_row.email, "ops@example.com");
    }

    #[tokio::test]
    async fn replaying_a_batch_reports_conflict() {
        let repo = test_repo().await;
        let entries = vec![ResourceEntry::bucket("p0-app1-data", "50")];
        repo.persist(&request(), &cluster(), &entries).await.unwrap();

        let err = repo
            .persist(&request(), &cluster(), &entries)
            .await
            .unwrap_err();
        match err {
            ProvisionError::Conflict(duplicates) => {
                assert_eq!(duplicates, vec!["bucket: p0-app1-data"]);
            }
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn one_duplicate_aborts_the_whole_batch() {
        let repo = test_repo().await;
        repo.persist(
            &request(),
            &cluster(),
            &[ResourceEntry::bucket("p0-app1-data", "50")],
        )
        .await
        .unwrap();

        let batch = vec![
            ResourceEntry::user("p0_app1_reader"),
            ResourceEntry::user("p0_app1_writer"),
            ResourceEntry::bucket("p0-app1-data", "50"),
        ];
        let err = repo.persist(&request(), &cluster(), &batch).await.unwrap_err();
        assert!(matches!(err, ProvisionError::Conflict(_)));

        // No partial insert: the two new users must not have landed.
        let rows = repo
            .query(&LedgerFilter::for_tenant("p0_app1_gen_01_dc1_seg1"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn query_filters_by_column() {
        let repo = test_repo().await;
        repo.persist(
            &request(),
            &cluster(),
            &[
                ResourceEntry::user("p0_app1_reader"),
                ResourceEntry::bucket("p0-app1-data", "50"),
            ],
        )
        .await
        .unwrap();

        let filter = LedgerFilter {
            bucket: Some("p0-app1-data".into()),
            ..LedgerFilter::default()
        };
        let rows = repo.query(&filter).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].bucket, "p0-app1-data");

        assert!(
            repo.tenant_exists("SEG1", "PROD", "p0_app1_gen_01_dc1_seg1")
                .await
                .unwrap()
        );
        assert!(!repo.tenant_exists("SEG1", "IFT", "nope").await.unwrap());
    }

    #[tokio::test]
    async fn deactivate_flips_active_per_row() {
        let repo = test_repo().await;
        repo.persist(
            &request(),
            &cluster(),
            &[
                ResourceEntry::user("p0_app1_reader"),
                ResourceEntry::bucket("p0-app1-data", "50"),
            ],
        )
        .await
        .unwrap();

        let (users, buckets) = repo
            .deactivate(
                "p0_app1_gen_01_dc1_seg1",
                &["p0_app1_reader".to_string()],
                &["p0-app1-data|50".to_string()],
            )
            .await
            .unwrap();
        assert!(users[0].updated);
        assert_eq!(buckets[0].name, "p0-app1-data");
        assert!(buckets[0].updated);

        let rows = repo
            .query(&LedgerFilter::for_tenant("p0_app1_gen_01_dc1_seg1"))
            .await
            .unwrap();
        assert!(rows.iter().all(|r| !r.active));
    }

    #[tokio::test]
    async fn update_quotas_rewrites_the_quota_column() {
        let repo = test_repo().await;
        repo.persist(
            &request(),
            &cluster(),
            &[ResourceEntry::bucket("p0-app1-data", "50")],
        )
        .await
        .unwrap();

        let statuses = repo
            .update_quotas(
                "p0_app1_gen_01_dc1_seg1",
                &[
                    QuotaUpdate {
                        name: "p0-app1-data".into(),
                        size: "2T".into(),
                    },
                    QuotaUpdate {
                        name: "p0-app1-missing".into(),
                        size: "1".into(),
                    },
                ],
            )
            .await
            .unwrap();
        assert!(statuses[0].updated);
        assert!(!statuses[1].updated);

        let filter = LedgerFilter {
            bucket: Some("p0-app1-data".into()),
            ..LedgerFilter::default()
        };
        let rows = repo.query(&filter).await.unwrap();
        assert_eq!(rows[0].quota, "2T");
    }
}
