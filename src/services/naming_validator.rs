//! Naming convention checks for users, buckets, and quotas.
//!
//! Convention violations are collected into a full report rather than
//! short-circuiting on the first problem; operators need the complete set of
//! fixes before resubmitting. Structural defects (missing naming context,
//! mismatched bucket/quota arity) are hard errors instead.

use crate::errors::{ProvisionError, ProvisionResult};
use crate::models::request::ProvisioningRequest;

/// Outcome of a validation pass: the boolean verdict plus every problem found.
#[derive(Debug, Default, Clone)]
pub struct ValidationReport {
    pub problems: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }

    fn flag(&mut self, problem: String) {
        self.problems.push(problem);
    }

    fn merge(&mut self, other: ValidationReport) {
        self.problems.extend(other.problems);
    }
}

/// Check every user name against the `{env_code}_{app_code}_` convention.
///
/// The remainder after the prefix must be non-empty and limited to ASCII
/// letters, digits, underscore, and hyphen.
pub fn validate_users(request: &ProvisioningRequest) -> ProvisionResult<ValidationReport> {
    let prefix = naming_prefix(request, '_')?;
    let mut report = ValidationReport::default();

    for user in request.users.iter().filter(|u| !u.is_empty()) {
        match user.strip_prefix(&prefix) {
            Some(rest) if !rest.is_empty() && is_user_charset(rest) => {}
            Some(rest) if rest.is_empty() => {
                report.flag(format!("user `{user}`: nothing after prefix `{prefix}`"));
            }
            Some(_) => {
                report.flag(format!(
                    "user `{user}`: allowed characters after the prefix are letters, digits, `_` and `-`"
                ));
            }
            None => {
                report.flag(format!("user `{user}`: must start with `{prefix}`"));
            }
        }
    }

    Ok(report)
}

/// Check every bucket name against the `{env_code}-{app_code}-` convention
/// and its paired quota against `\d+[GMTPK]B?`.
///
/// A count mismatch between bucket names and quotas is a hard error; silently
/// truncating either list would provision buckets with the wrong quota.
pub fn validate_buckets(request: &ProvisioningRequest) -> ProvisionResult<ValidationReport> {
    if request.bucket_names.len() != request.bucket_quotas.len() {
        return Err(ProvisionError::MismatchedArity {
            names: request.bucket_names.len(),
            quotas: request.bucket_quotas.len(),
        });
    }

    let prefix = naming_prefix(request, '-')?;
    let mut report = ValidationReport::default();

    for (bucket, quota) in request.bucket_pairs() {
        match bucket.strip_prefix(&prefix) {
            Some(rest) if !rest.is_empty() && is_bucket_charset(rest) => {}
            Some(rest) if rest.is_empty() => {
                report.flag(format!("bucket `{bucket}`: nothing after prefix `{prefix}`"));
            }
            Some(_) => {
                report.flag(format!(
                    "bucket `{bucket}`: allowed characters after the prefix are letters, digits and `-`"
                ));
            }
            None => {
                report.flag(format!("bucket `{bucket}`: must start with `{prefix}`"));
            }
        }

        if !is_valid_quota(quota) {
            report.flag(format!(
                "bucket `{bucket}`: quota `{quota}` must match a number with an optional K/M/G/T/P unit"
            ));
        }
    }

    Ok(report)
}

/// Run both passes and combine the reports.
pub fn validate_request(request: &ProvisioningRequest) -> ProvisionResult<ValidationReport> {
    let mut report = validate_users(request)?;
    report.merge(validate_buckets(request)?);
    Ok(report)
}

fn naming_prefix(request: &ProvisioningRequest, separator: char) -> ProvisionResult<String> {
    if request.env_code.is_empty() {
        return Err(ProvisionError::MissingField("env_code"));
    }
    if request.app_code.is_empty() {
        return Err(ProvisionError::MissingField("app_code"));
    }
    Ok(format!(
        "{}{}{}{}",
        request.env_code, separator, request.app_code, separator
    ))
}

fn is_user_charset(rest: &str) -> bool {
    rest.chars()
        .all(|c| matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '-'))
}

fn is_bucket_charset(rest: &str) -> bool {
    rest.chars()
        .all(|c| matches!(c, 'a'..='z' | 'A'..='Z' | '0'..='9' | '-'))
}

/// Quota format: digits, optionally followed by one of K/M/G/T/P and an
/// optional trailing B. A bare number is taken as gigabytes downstream.
pub fn is_valid_quota(quota: &str) -> bool {
    let digits_end = quota
        .char_indices()
        .take_while(|(_, c)| c.is_ascii_digit())
        .count();
    if digits_end == 0 {
        return false;
    }
    match &quota[digits_end..] {
        "" => true,
        unit => {
            let mut chars = unit.chars();
            let suffix = chars.next();
            let trailing = chars.next();
            matches!(suffix, Some('K' | 'M' | 'G' | 'T' | 'P'))
                && (trailing.is_none() || (trailing == Some('B') && chars.next().is_none()))
        }
    }
}
