//! Cluster directory lookup.
//!
//! The directory is a read-only list of [`ClusterRecord`]s loaded once at
//! startup. Resolution is a pure lookup: exactly one match wins, zero matches
//! is `NoClusterFound`, and two or more surface `AmbiguousCluster` with the
//! full candidate list so an interactive caller can pick one by name.

use crate::errors::{ProvisionError, ProvisionResult};
use crate::models::cluster::ClusterRecord;
use anyhow::{Context, Result};
use std::{fs, path::Path};

/// In-memory cluster directory.
#[derive(Clone, Debug)]
pub struct ClusterDirectory {
    records: Vec<ClusterRecord>,
}

impl ClusterDirectory {
    pub fn new(records: Vec<ClusterRecord>) -> Self {
        Self { records }
    }

    /// Load the directory from a JSON file (a flat array of records).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading cluster directory {}", path.display()))?;
        let records: Vec<ClusterRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing cluster directory {}", path.display()))?;
        Ok(Self::new(records))
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// All records matching the (segment, environment) pair.
    pub fn find_matching(&self, segment: &str, env: &str) -> Vec<ClusterRecord> {
        self.records
            .iter()
            .filter(|record| record.segment == segment && record.environment == env)
            .cloned()
            .collect()
    }

    /// Resolve to exactly one cluster.
    pub fn resolve(&self, segment: &str, env: &str) -> ProvisionResult<ClusterRecord> {
        let mut matches = self.find_matching(segment, env);
        match matches.len() {
            0 => Err(ProvisionError::NoClusterFound {
                segment: segment.to_string(),
                env: env.to_string(),
            }),
            1 => Ok(matches.remove(0)),
            _ => Err(ProvisionError::AmbiguousCluster {
                segment: segment.to_string(),
                env: env.to_string(),
                candidates: matches,
            }),
        }
    }

    /// Pick one of the matching clusters by name, after an ambiguity
    /// round-trip gave the caller the candidate list.
    pub fn resolve_by_name(
        &self,
        segment: &str,
        env: &str,
        name: &str,
    ) -> ProvisionResult<ClusterRecord> {
        self.find_matching(segment, env)
            .into_iter()
            .find(|record| record.name == name)
            .ok_or_else(|| ProvisionError::NoClusterFound {
                segment: segment.to_string(),
                env: env.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, segment: &str, env: &str) -> ClusterRecord {
        ClusterRecord {
            name: name.to_string(),
            datacenter: "DC1".to_string(),
            realm: format!("{}-realm", name),
            issuer: "dir".to_string(),
            segment: segment.to_string(),
            environment: env.to_string(),
            tls_endpoint: format!("https://{}.example.com", name),
            mtls_endpoint: format!("https://{}-mtls.example.com", name),
        }
    }

    #[test]
    fn single_match_resolves() {
        let dir = ClusterDirectory::new(vec![
            record("alpha", "SEG1", "PROD"),
            record("beta", "SEG2", "PROD"),
        ]);
        let cluster = dir.resolve("SEG1", "PROD").unwrap();
        assert_eq!(cluster.name, "alpha");
    }

    #[test]
    fn zero_matches_is_not_found() {
        let dir = ClusterDirectory::new(vec![record("alpha", "SEG1", "PROD")]);
        let err = dir.resolve("SEG1", "IFT").unwrap_err();
        assert!(matches!(err, ProvisionError::NoClusterFound { .. }));
    }

    #[test]
    fn multiple_matches_list_all_candidates() {
        let dir = ClusterDirectory::new(vec![
            record("alpha", "SEG1", "PROD"),
            record("beta", "SEG1", "PROD"),
            record("gamma", "SEG2", "PROD"),
        ]);
        match dir.resolve("SEG1", "PROD").unwrap_err() {
            ProvisionError::AmbiguousCluster { candidates, .. } => {
                let names: Vec<_> = candidates.iter().map(|c| c.name.as_str()).collect();
                assert_eq!(names, vec!["alpha", "beta"]);
            }
            other => panic!("expected AmbiguousCluster, got {other:?}"),
        }
    }

    #[test]
    fn by_name_picks_among_matches() {
        let dir = ClusterDirectory::new(vec![
            record("alpha", "SEG1", "PROD"),
            record("beta", "SEG1", "PROD"),
        ]);
        let cluster = dir.resolve_by_name("SEG1", "PROD", "beta").unwrap();
        assert_eq!(cluster.name, "beta");
    }

    #[test]
    fn by_name_rejects_unknown_cluster() {
        let dir = ClusterDirectory::new(vec![record("alpha", "SEG1", "PROD")]);
        let err = dir.resolve_by_name("SEG1", "PROD", "delta").unwrap_err();
        assert!(matches!(err, ProvisionError::NoClusterFound { .. }));
    }
}
