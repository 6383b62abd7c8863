//! Typed provisioning request built once at the intake boundary.
//!
//! Incoming multipart forms and JSON bodies are reduced to a key → value-list
//! map by the transport layer; [`ProvisioningRequest::from_form`] validates the
//! shape once and normalizes case, so the workflow never probes raw maps.

use crate::errors::{ProvisionError, ProvisionResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A normalized request to provision users and buckets under one tenant.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ProvisioningRequest {
    /// Network segment, upper-cased.
    pub segment: String,

    /// Deployment environment, upper-cased (PROD, PREPROD, IFT, HOTFIX).
    pub env: String,

    /// Short environment code derived from `env` (p0, rr, if, hf).
    /// Empty when the environment is not a known one.
    #[serde(default)]
    pub env_code: String,

    /// Requesting-application code, lower-cased. Feeds naming prefixes.
    pub app_code: String,

    /// Requesting-application registry id.
    pub app_id: String,

    /// Owning organizational group.
    pub owner_group: String,

    /// Responsible person.
    pub owner_person: String,

    /// Person who filed the request.
    pub requester: String,

    /// Notification email, lower-cased.
    pub email: String,

    /// Change-request tracking id, upper-cased.
    pub request_id: String,

    /// Service-ticket tracking id, upper-cased.
    pub ticket_id: String,

    /// Resolved tenant identifier; set by the orchestrator, never taken
    /// from input.
    #[serde(skip_deserializing)]
    pub tenant: Option<String>,

    /// Explicit tenant name bypassing derivation, lower-cased.
    #[serde(default)]
    pub tenant_override: Option<String>,

    /// Explicit cluster selection after an ambiguity round-trip.
    #[serde(default)]
    pub cluster: Option<String>,

    /// Whether a brand-new tenant is being created.
    #[serde(default)]
    pub create_tenant: bool,

    /// Whether to write the ledger or only emit artifacts.
    #[serde(default)]
    pub push_to_db: bool,

    /// User names to provision, lower-cased.
    #[serde(default)]
    pub users: Vec<String>,

    /// Bucket names, lower-cased; paired by index with `bucket_quotas`.
    #[serde(default)]
    pub bucket_names: Vec<String>,

    /// Unit-suffixed quotas, upper-cased; paired by index with `bucket_names`.
    #[serde(default)]
    pub bucket_quotas: Vec<String>,
}

/// Map an environment name to the short code used in naming prefixes.
pub fn env_code_for(env: &str) -> Option<&'static str> {
    match env {
        "PROD" => Some("p0"),
        "PREPROD" => Some("rr"),
        "IFT" => Some("if"),
        "HOTFIX" => Some("hf"),
        _ => None,
    }
}

impl ProvisioningRequest {
    /// Build a request from a parsed form map, validating shape once.
    ///
    /// Required scalar fields must be present and non-empty; multi-valued
    /// fields default to empty lists. Case is normalized here so every later
    /// stage sees canonical values.
    pub fn from_form(form: &HashMap<String, Vec<String>>) -> ProvisionResult<Self> {
        let mut request = Self {
            segment: required(form, "segment")?.to_uppercase(),
            env: required(form, "env")?.to_uppercase(),
            app_code: required(form, "app_code")?.to_lowercase(),
            app_id: required(form, "app_id")?.to_string(),
            owner_group: required(form, "owner_group")?.to_string(),
            owner_person: required(form, "owner_person")?.to_string(),
            requester: required(form, "requester")?.to_string(),
            email: required(form, "email")?.to_lowercase(),
            request_id: required(form, "request_id")?.to_uppercase(),
            ticket_id: required(form, "ticket_id")?.to_uppercase(),
            tenant: None,
            tenant_override: scalar(form, "tenant_override").map(str::to_lowercase),
            cluster: scalar(form, "cluster").map(str::to_string),
            create_tenant: flag(form, "create_tenant"),
            push_to_db: flag(form, "push_to_db"),
            users: list(form, "users").iter().map(|u| u.to_lowercase()).collect(),
            bucket_names: list(form, "bucketnames")
                .iter()
                .map(|b| b.to_lowercase())
                .collect(),
            bucket_quotas: list(form, "bucketquotas")
                .iter()
                .map(|q| q.to_uppercase())
                .collect(),
            env_code: String::new(),
        };
        request.env_code = env_code_for(&request.env).unwrap_or_default().to_string();
        Ok(request)
    }

    /// Re-apply normalization after JSON deserialization.
    ///
    /// JSON callers send already-structured fields but are not trusted to
    /// send canonical case.
    pub fn normalize(&mut self) {
        // Tenant resolution always re-runs; a preset value is discarded.
        self.tenant = None;
        self.segment = self.segment.to_uppercase();
        self.env = self.env.to_uppercase();
        self.app_code = self.app_code.to_lowercase();
        self.email = self.email.to_lowercase();
        self.request_id = self.request_id.to_uppercase();
        self.ticket_id = self.ticket_id.to_uppercase();
        self.tenant_override = self
            .tenant_override
            .take()
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase());
        for user in &mut self.users {
            *user = user.to_lowercase();
        }
        for name in &mut self.bucket_names {
            *name = name.to_lowercase();
        }
        for quota in &mut self.bucket_quotas {
            *quota = quota.to_uppercase();
        }
        self.env_code = env_code_for(&self.env).unwrap_or_default().to_string();
    }

    /// The tenant identifier, once resolution has run.
    pub fn tenant_name(&self) -> &str {
        self.tenant.as_deref().unwrap_or_default()
    }

    /// (name, quota) pairs; only valid after the arity check passed.
    pub fn bucket_pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bucket_names
            .iter()
            .zip(self.bucket_quotas.iter())
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, quota)| (name.as_str(), quota.as_str()))
    }
}

fn required<'a>(form: &'a HashMap<String, Vec<String>>, key: &'static str) -> ProvisionResult<&'a str> {
    scalar(form, key).ok_or(ProvisionError::MissingField(key))
}

fn scalar<'a>(form: &'a HashMap<String, Vec<String>>, key: &str) -> Option<&'a str> {
    form.get(key)
        .and_then(|values| values.first())
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn list<'a>(form: &'a HashMap<String, Vec<String>>, key: &str) -> &'a [String] {
    form.get(key).map(Vec::as_slice).unwrap_or_default()
}

fn flag(form: &HashMap<String, Vec<String>>, key: &str) -> bool {
    scalar(form, key).is_some_and(|value| value.eq_ignore_ascii_case("true"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &[&str])]) -> HashMap<String, Vec<String>> {
        pairs
            .iter()
            .map(|(k, vs)| (k.to_string(), vs.iter().map(|v| v.to_string()).collect()))
            .collect()
    }

    fn base_form() -> HashMap<String, Vec<String>> {
        form(&[
            ("segment", &["seg1"]),
            ("env", &["prod"]),
            ("app_code", &["App1"]),
            ("app_id", &["1514"]),
            ("owner_group", &["Storage Ops"]),
            ("owner_person", &["I. Petrov"]),
            ("requester", &["A. Smith"]),
            ("email", &["Ops@Example.COM"]),
            ("request_id", &["sd-100"]),
            ("ticket_id", &["srt-200"]),
        ])
    }

    #[test]
    fn from_form_normalizes_case_and_derives_env_code() {
        let req = ProvisioningRequest::from_form(&base_form()).unwrap();
        assert_eq!(req.segment, "SEG1");
        assert_eq!(req.env, "PROD");
        assert_eq!(req.env_code, "p0");
        assert_eq!(req.app_code, "app1");
        assert_eq!(req.email, "ops@example.com");
        assert_eq!(req.request_id, "SD-100");
        assert_eq!(req.ticket_id, "SRT-200");
    }

    #[test]
    fn from_form_rejects_missing_required_field() {
        let mut f = base_form();
        f.remove("app_code");
        let err = ProvisioningRequest::from_form(&f).unwrap_err();
        assert!(matches!(err, ProvisionError::MissingField("app_code")));
    }

    #[test]
    fn from_form_rejects_blank_required_field() {
        let mut f = base_form();
        f.insert("segment".into(), vec!["   ".into()]);
        let err = ProvisioningRequest::from_form(&f).unwrap_err();
        assert!(matches!(err, ProvisionError::MissingField("segment")));
    }

    #[test]
    fn from_form_lowercases_multi_valued_fields() {
        let mut f = base_form();
        f.insert("users".into(), vec!["P0_App1_Reader".into()]);
        f.insert("bucketnames".into(), vec!["P0-App1-Data".into()]);
        f.insert("bucketquotas".into(), vec!["50g".into()]);
        let req = ProvisioningRequest::from_form(&f).unwrap();
        assert_eq!(req.users, vec!["p0_app1_reader"]);
        assert_eq!(req.bucket_names, vec!["p0-app1-data"]);
        assert_eq!(req.bucket_quotas, vec!["50G"]);
    }

    #[test]
    fn unknown_environment_yields_empty_code() {
        let mut f = base_form();
        f.insert("env".into(), vec!["STAGING".into()]);
        let req = ProvisioningRequest::from_form(&f).unwrap();
        assert_eq!(req.env_code, "");
    }

    #[test]
    fn json_body_cannot_inject_a_resolved_tenant() {
        let req: ProvisioningRequest = serde_json::from_str(
            r#"{
                "segment": "seg1", "env": "prod", "app_code": "app1",
                "app_id": "1514", "owner_group": "g", "owner_person": "p",
                "requester": "r", "email": "e@example.com",
                "request_id": "sd-1", "ticket_id": "srt-1",
                "tenant": "UPPER_TENANT"
            }"#,
        )
        .unwrap();
        assert!(req.tenant.is_none());
    }

    #[test]
    fn normalize_clears_any_preset_tenant() {
        let mut req = ProvisioningRequest::from_form(&base_form()).unwrap();
        req.tenant = Some("stale_tenant".into());
        req.normalize();
        assert!(req.tenant.is_none());
    }

    #[test]
    fn flags_parse_from_strings() {
        let mut f = base_form();
        f.insert("create_tenant".into(), vec!["true".into()]);
        f.insert("push_to_db".into(), vec!["false".into()]);
        let req = ProvisioningRequest::from_form(&f).unwrap();
        assert!(req.create_tenant);
        assert!(!req.push_to_db);
    }
}
