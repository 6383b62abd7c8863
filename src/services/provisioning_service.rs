//! Provisioning orchestrator.
//!
//! Sequences the workflow for a single request: cluster resolution, tenant
//! naming, convention validation, optional duplicate-checked persistence, and
//! artifact generation. Each request is handled synchronously; the only
//! isolation requirement lives inside the ledger repository's transaction.

use crate::errors::{ProvisionError, ProvisionResult};
use crate::models::{
    cluster::ClusterRecord,
    ledger::{LedgerFilter, LedgerRow, QuotaUpdate, ResourceEntry},
    request::ProvisioningRequest,
};
use crate::services::{
    artifact_generator, cluster_resolver::ClusterDirectory, ledger_repository::LedgerRepository,
    ledger_repository::MutationStatus, naming_validator, tenant_namer,
};
use serde::Serialize;
use tracing::info;

/// The generated shell command sequence, in execution order.
#[derive(Serialize, Clone, Debug)]
pub struct CommandSet {
    pub buckets: String,
    pub users: String,
    pub verification: String,
}

/// Everything a caller gets back from one provisioning run.
#[derive(Serialize, Clone, Debug)]
pub struct ProvisionOutcome {
    pub tenant: String,
    pub cluster: String,
    pub persisted: bool,
    /// Naming convention problems, advisory unless strict mode is on.
    pub warnings: Vec<String>,
    pub ledger_preview: Vec<String>,
    pub commands: CommandSet,
    pub email: String,
    pub inserted_users: Vec<String>,
    pub inserted_buckets: Vec<String>,
}

/// Outcome of a deactivation run: per-row statuses plus removal commands.
#[derive(Serialize, Clone, Debug)]
pub struct DeactivationOutcome {
    pub tenant: String,
    pub users: Vec<MutationStatus>,
    pub buckets: Vec<MutationStatus>,
    pub commands: String,
}

/// Outcome of a quota-update run.
#[derive(Serialize, Clone, Debug)]
pub struct QuotaOutcome {
    pub tenant: String,
    pub buckets: Vec<MutationStatus>,
    pub commands: String,
}

#[derive(Clone)]
pub struct ProvisioningService {
    directory: ClusterDirectory,
    ledger: LedgerRepository,
    /// Escalates naming convention problems from warnings to hard errors.
    strict_naming: bool,
}

impl ProvisioningService {
    pub fn new(directory: ClusterDirectory, ledger: LedgerRepository, strict_naming: bool) -> Self {
        Self {
            directory,
            ledger,
            strict_naming,
        }
    }

    pub fn directory(&self) -> &ClusterDirectory {
        &self.directory
    }

    pub fn ledger(&self) -> &LedgerRepository {
        &self.ledger
    }

    /// Run the full workflow for one request.
    ///
    /// With `push_to_db` unset this is a dry run that only emits artifacts.
    /// An ambiguous cluster is recoverable: the caller re-submits the same
    /// request with an explicit `cluster` selection.
    pub async fn provision(
        &self,
        mut request: ProvisioningRequest,
    ) -> ProvisionResult<ProvisionOutcome> {
        let cluster = self.resolve_cluster(&request)?;
        self.resolve_tenant(&mut request, &cluster)?;
        let tenant = request.tenant_name().to_string();

        if request.create_tenant {
            if self
                .ledger
                .tenant_exists(&request.segment, &request.env, &tenant)
                .await?
            {
                return Err(ProvisionError::TenantExists(tenant));
            }
            // The tenant's own user leads the batch.
            if !request.users.contains(&tenant) {
                request.users.insert(0, tenant.clone());
            }
        }

        let report = naming_validator::validate_request(&request)?;
        if self.strict_naming && !report.is_clean() {
            return Err(ProvisionError::ConventionViolations(report.problems));
        }

        let entries = collect_entries(&request);
        let (inserted_users, inserted_buckets) = if request.push_to_db {
            self.ledger.persist(&request, &cluster, &entries).await?
        } else {
            (Vec::new(), Vec::new())
        };

        info!(
            tenant = %tenant,
            cluster = %cluster.name,
            persisted = request.push_to_db,
            users = request.users.len(),
            buckets = request.bucket_names.len(),
            "provisioning request completed"
        );

        Ok(ProvisionOutcome {
            tenant,
            cluster: cluster.name.clone(),
            persisted: request.push_to_db,
            warnings: report.problems,
            ledger_preview: artifact_generator::ledger_preview(&request, &cluster),
            commands: CommandSet {
                buckets: artifact_generator::bucket_creation_commands(&request, &cluster),
                users: artifact_generator::user_creation_commands(&request, &cluster),
                verification: artifact_generator::verification_command(&request, &cluster),
            },
            email: artifact_generator::email_body(&request, &cluster),
            inserted_users,
            inserted_buckets,
        })
    }

    /// Read path: ledger rows matching the filter.
    pub async fn check(&self, filter: &LedgerFilter) -> ProvisionResult<Vec<LedgerRow>> {
        self.ledger.query(filter).await
    }

    /// Deactivate users and buckets of a tenant, emitting removal commands.
    pub async fn deactivate(
        &self,
        tenant: &str,
        users: &[String],
        buckets: &[String],
    ) -> ProvisionResult<DeactivationOutcome> {
        let realm = self.realm_of(tenant).await?;
        let (user_statuses, bucket_statuses) =
            self.ledger.deactivate(tenant, users, buckets).await?;
        let commands = artifact_generator::deletion_commands(tenant, users, buckets, &realm);
        Ok(DeactivationOutcome {
            tenant: tenant.to_string(),
            users: user_statuses,
            buckets: bucket_statuses,
            commands,
        })
    }

    /// Update bucket quotas of a tenant, emitting quota-set commands.
    pub async fn update_quotas(
        &self,
        tenant: &str,
        updates: &[QuotaUpdate],
    ) -> ProvisionResult<QuotaOutcome> {
        let realm = self.realm_of(tenant).await?;
        let statuses = self.ledger.update_quotas(tenant, updates).await?;
        let commands = artifact_generator::quota_commands(tenant, updates, &realm);
        Ok(QuotaOutcome {
            tenant: tenant.to_string(),
            buckets: statuses,
            commands,
        })
    }

    fn resolve_cluster(&self, request: &ProvisioningRequest) -> ProvisionResult<ClusterRecord> {
        match &request.cluster {
            Some(name) => self
                .directory
                .resolve_by_name(&request.segment, &request.env, name),
            None => self.directory.resolve(&request.segment, &request.env),
        }
    }

    fn resolve_tenant(
        &self,
        request: &mut ProvisioningRequest,
        cluster: &ClusterRecord,
    ) -> ProvisionResult<()> {
        if request.tenant.is_some() {
            return Ok(());
        }
        let tenant = match request.tenant_override.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => tenant_namer::derive_name(
                &request.env_code,
                &request.app_code,
                &cluster.datacenter,
                &request.segment,
            )?,
        };
        request.tenant = Some(tenant);
        Ok(())
    }

    /// Realm of the cluster a tenant was provisioned on, from its ledger rows.
    async fn realm_of(&self, tenant: &str) -> ProvisionResult<String> {
        let rows = self.ledger.query(&LedgerFilter::for_tenant(tenant)).await?;
        rows.into_iter()
            .map(|row| row.realm)
            .next()
            .ok_or(ProvisionError::NotFound)
    }
}

fn collect_entries(request: &ProvisioningRequest) -> Vec<ResourceEntry> {
    let mut entries: Vec<ResourceEntry> = request
        .users
        .iter()
        .filter(|user| !user.is_empty())
        .map(ResourceEntry::user)
        .collect();
    entries.extend(
        request
            .bucket_pairs()
            .map(|(name, quota)| ResourceEntry::bucket(name, quota)),
    );
    entries
}
