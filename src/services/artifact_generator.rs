//! Operator artifacts derived from a validated request and resolved cluster.
//!
//! Everything here is a pure function of its inputs: shell command sequences
//! for the storage cluster, tab-delimited ledger previews for review, and the
//! notification email body. No network or disk I/O.

use crate::models::{cluster::ClusterRecord, ledger::QuotaUpdate, request::ProvisioningRequest};
use chrono::Utc;
use std::fmt::Write;

/// Convert a quota string to a decimal byte count.
///
/// A bare number is gigabytes; K/M/G/T/P suffixes (optionally with a trailing
/// `B`) use 1000-based multipliers. Returns `None` for malformed input, which
/// the validator rejects before commands are generated.
pub fn quota_to_bytes(quota: &str) -> Option<u64> {
    let quota = quota.trim();
    let digits_end = quota
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit())
        .count();
    if digits_end == 0 {
        return None;
    }
    let value: u64 = quota[..digits_end].parse().ok()?;
    let multiplier = match quota[digits_end..].trim_end_matches('B') {
        "" => 1_000_000_000,
        "K" => 1_000,
        "M" => 1_000_000,
        "G" => 1_000_000_000,
        "T" => 1_000_000_000_000,
        "P" => 1_000_000_000_000_000,
        _ => return None,
    };
    value.checked_mul(multiplier)
}

fn quota_size_arg(quota: &str) -> String {
    match quota_to_bytes(quota) {
        Some(bytes) => bytes.to_string(),
        None => quota.to_string(),
    }
}

/// One bucket-creation command per bucket, chained with ` &&\`.
///
/// When a brand-new tenant is being created the first bucket carries a
/// composite display-name identifying the owning group, person, and ticket.
pub fn bucket_creation_commands(request: &ProvisioningRequest, cluster: &ClusterRecord) -> String {
    let tenant = request.tenant_name();
    let mut commands = Vec::new();

    for (i, (bucket, quota)) in request.bucket_pairs().enumerate() {
        let mut command = format!(
            "~/scripts/rgw-create-bucket.sh --config {} --tenant {} --bucket {} --size {}",
            cluster.realm,
            tenant,
            bucket,
            quota_size_arg(quota)
        );
        if i == 0 && request.create_tenant {
            write!(
                command,
                " --display-name \"{};{};{}\"",
                request.owner_group, request.owner_person, request.ticket_id
            )
            .ok();
        }
        command.push(';');
        commands.push(command);
    }

    commands.join(" &&\\\n")
}

/// One user-creation command per user, skipping the tenant's own user
/// (created implicitly together with the tenant).
pub fn user_creation_commands(request: &ProvisioningRequest, cluster: &ClusterRecord) -> String {
    let tenant = request.tenant_name();
    request
        .users
        .iter()
        .filter(|user| !user.is_empty() && user.as_str() != tenant)
        .map(|user| {
            format!(
                "sudo radosgw-admin user create --rgw-realm {} --tenant {} --uid {} \
                 --display-name {} --max-buckets -1 | grep -A2 '\"user\"';",
                cluster.realm, tenant, user, request.ticket_id
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Listing commands to verify the created users and buckets on the cluster.
pub fn verification_command(request: &ProvisioningRequest, cluster: &ClusterRecord) -> String {
    let tenant = request.tenant_name();
    format!(
        "sudo radosgw-admin user list --rgw-realm {realm} | grep {tenant}; \
         sudo radosgw-admin bucket list --rgw-realm {realm} | grep {tenant};",
        realm = cluster.realm,
        tenant = tenant
    )
}

/// Tab-delimited ledger rows for operator review, users first then buckets.
pub fn ledger_preview(request: &ProvisioningRequest, cluster: &ClusterRecord) -> Vec<String> {
    let tenant = request.tenant_name();
    let date = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let mut rows = Vec::new();

    let tail = |user: &str, bucket: &str, quota: &str| {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            cluster.name,
            request.segment,
            request.env,
            cluster.realm,
            tenant,
            user,
            bucket,
            quota,
            request.request_id,
            request.ticket_id,
            date,
            request.app_code,
            request.app_id,
            request.owner_group,
            request.owner_person,
            request.requester
        )
    };

    for user in request.users.iter().filter(|u| !u.is_empty()) {
        rows.push(tail(user, "-", "-"));
    }
    for (bucket, quota) in request.bucket_pairs() {
        rows.push(tail("-", bucket, quota));
    }

    rows
}

/// Plain-text notification email enumerating what was provisioned and where
/// to connect.
pub fn email_body(request: &ProvisioningRequest, cluster: &ClusterRecord) -> String {
    let mut body = String::new();
    writeln!(body, "{}", request.email).ok();
    writeln!(body).ok();
    writeln!(body, "Hello,").ok();
    writeln!(body).ok();
    writeln!(
        body,
        "You are listed as the recipient of credentials created for request {}.",
        request.request_id
    )
    .ok();
    writeln!(body).ok();
    writeln!(body, "Segment: {}", request.segment).ok();
    writeln!(body, "Environment: {}", request.env).ok();
    writeln!(body, "Tenant: {}", request.tenant_name()).ok();
    writeln!(body, "Endpoints:").ok();
    writeln!(body, "{}", cluster.tls_endpoint).ok();
    writeln!(body, "{}", cluster.mtls_endpoint).ok();
    writeln!(body).ok();
    writeln!(body, "Users created:").ok();
    for user in request.users.iter().filter(|u| !u.is_empty()) {
        writeln!(body, "- {user}").ok();
    }
    writeln!(body).ok();
    writeln!(body, "Buckets created:").ok();
    for (bucket, _) in request.bucket_pairs() {
        writeln!(body, "- {bucket}").ok();
    }
    body
}

/// Removal commands for the deactivation flow, skipping the tenant's own user.
pub fn deletion_commands(tenant: &str, users: &[String], buckets: &[String], realm: &str) -> String {
    let mut out = String::new();
    for user in users.iter().filter(|u| !u.is_empty() && u.as_str() != tenant) {
        writeln!(
            out,
            "sudo radosgw-admin user rm --rgw-realm {realm} --tenant {tenant} --uid {user}"
        )
        .ok();
    }
    for bucket in buckets.iter().filter(|b| !b.is_empty()) {
        let name = bucket.split('|').next().unwrap_or(bucket).trim();
        writeln!(
            out,
            "sudo radosgw-admin bucket rm --rgw-realm {realm} --bucket \"{tenant}/{name}\""
        )
        .ok();
    }
    out
}

/// Quota-set commands for the quota-update flow.
pub fn quota_commands(tenant: &str, updates: &[QuotaUpdate], realm: &str) -> String {
    let mut out = String::new();
    for update in updates {
        writeln!(
            out,
            "sudo radosgw-admin quota set --rgw-realm {realm} --quota-scope bucket \
             --bucket \"{tenant}/{name}\" --max-size {size}",
            name = update.name,
            size = quota_size_arg(&update.size)
        )
        .ok();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

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
            users: vec!["p0_app1_gen_01_dc1_seg1".into(), "p0_app1_reader".into()],
            bucket_names: vec!["p0-app1-data".into(), "p0-app1-logs".into()],
            bucket_quotas: vec!["50".into(), "500M".into()],
            create_tenant: true,
            ..ProvisioningRequest::default()
        }
    }

    #[test]
    fn quota_conversion_uses_decimal_multipliers() {
        assert_eq!(quota_to_bytes("5"), Some(5_000_000_000));
        assert_eq!(quota_to_bytes("2T"), Some(2_000_000_000_000));
        assert_eq!(quota_to_bytes("500M"), Some(500_000_000));
        assert_eq!(quota_to_bytes("10KB"), Some(10_000));
        assert_eq!(quota_to_bytes("1P"), Some(1_000_000_000_000_000));
        assert_eq!(quota_to_bytes("junk"), None);
        assert_eq!(quota_to_bytes("5X"), None);
    }

    #[test]
    fn first_bucket_of_a_new_tenant_carries_display_name() {
        let commands = bucket_creation_commands(&request(), &cluster());
        let lines: Vec<&str> = commands.split(" &&\\\n").collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("--bucket p0-app1-data"));
        assert!(lines[0].contains("--size 50000000000"));
        assert!(lines[0].contains("--display-name \"Storage Ops;I. Petrov;SRT-200\""));
        assert!(lines[1].contains("--size 500000000"));
        assert!(!lines[1].contains("--display-name"));
    }

    #[test]
    fn no_display_name_without_create_tenant() {
        let mut req = request();
        req.create_tenant = false;
        let commands = bucket_creation_commands(&req, &cluster());
        assert!(!commands.contains("--display-name"));
    }

    #[test]
    fn tenant_user_is_skipped_in_user_commands() {
        let commands = user_creation_commands(&request(), &cluster());
        assert!(commands.contains("--uid p0_app1_reader"));
        assert!(!commands.contains("--uid p0_app1_gen_01_dc1_seg1"));
        assert!(commands.contains("--rgw-realm alpha-realm"));
    }

    #[test]
    fn verification_lists_users_and_buckets() {
        let command = verification_command(&request(), &cluster());
        assert!(command.contains("user list --rgw-realm alpha-realm"));
        assert!(command.contains("bucket list --rgw-realm alpha-realm"));
        assert!(command.contains("grep p0_app1_gen_01_dc1_seg1"));
    }

    #[test]
    fn preview_emits_one_row_per_resource() {
        let rows = ledger_preview(&request(), &cluster());
        assert_eq!(rows.len(), 4);
        let fields: Vec<&str> = rows[0].split('\t').collect();
        assert_eq!(fields.len(), 16);
        assert_eq!(fields[0], "alpha");
        assert_eq!(fields[5], "p0_app1_gen_01_dc1_seg1");
        let bucket_fields: Vec<&str> = rows[2].split('\t').collect();
        assert_eq!(bucket_fields[5], "-");
        assert_eq!(bucket_fields[6], "p0-app1-data");
        assert_eq!(bucket_fields[7], "50");
    }

    #[test]
    fn email_enumerates_everything() {
        let body = email_body(&request(), &cluster());
        assert!(body.contains("Segment: SEG1"));
        assert!(body.contains("Environment: PROD"));
        assert!(body.contains("Tenant: p0_app1_gen_01_dc1_seg1"));
        assert!(body.contains("https://alpha.example.com"));
        assert!(body.contains("https://alpha-mtls.example.com"));
        assert!(body.contains("- p0_app1_reader"));
        assert!(body.contains("- p0-app1-logs"));
    }

    #[test]
    fn deletion_commands_skip_the_tenant_user() {
        let out = deletion_commands(
            "p0_app1_gen_01_dc1_seg1",
            &[
                "p0_app1_gen_01_dc1_seg1".to_string(),
                "p0_app1_reader".to_string(),
            ],
            &["p0-app1-data|50".to_string()],
            "alpha-realm",
        );
        assert!(out.contains("user rm --rgw-realm alpha-realm --tenant p0_app1_gen_01_dc1_seg1 --uid p0_app1_reader"));
        assert!(!out.contains("--uid p0_app1_gen_01_dc1_seg1"));
        assert!(out.contains("bucket rm --rgw-realm alpha-realm --bucket \"p0_app1_gen_01_dc1_seg1/p0-app1-data\""));
    }

    #[test]
    fn quota_commands_normalize_sizes() {
        let out = quota_commands(
            "p0_app1_gen_01_dc1_seg1",
            &[QuotaUpdate {
                name: "p0-app1-data".into(),
                size: "2T".into(),
            }],
            "alpha-realm",
        );
        assert!(out.contains("--max-size 2000000000000"));
        assert!(out.contains("--bucket \"p0_app1_gen_01_dc1_seg1/p0-app1-data\""));
    }
}
