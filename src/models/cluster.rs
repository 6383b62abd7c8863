//! Represents one row of the cluster directory.

use serde::{Deserialize, Serialize};

/// A storage cluster as described by the cluster directory.
///
/// Records are loaded read-only at startup and never mutated by the
/// provisioning workflow. Several records may share the same
/// (segment, environment) pair; that is the ambiguity case the resolver
/// reports back to the caller.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ClusterRecord {
    /// Cluster name, unique within the directory.
    pub name: String,

    /// Datacenter hosting the cluster (feeds the tenant name).
    pub datacenter: String,

    /// RGW realm addressed by the generated shell commands.
    pub realm: String,

    /// Authority that issued the cluster entry.
    pub issuer: String,

    /// Network segment the cluster serves.
    pub segment: String,

    /// Deployment environment (PROD, PREPROD, IFT, HOTFIX).
    pub environment: String,

    /// Endpoint for TLS connections.
    pub tls_endpoint: String,

    /// Endpoint for mutual-TLS connections.
    pub mtls_endpoint: String,
}
