//! Deterministic tenant name derivation.

use crate::errors::{ProvisionError, ProvisionResult};

/// Fixed generation token embedded in every derived tenant name.
const GENERATION: &str = "gen_01";

/// Derive the canonical tenant identifier
/// `{env_code}_{app_code}_gen_01_{datacenter}_{segment}`.
///
/// All variable parts are lower-cased and hyphens in the segment token become
/// underscores. Pure and deterministic; identical inputs always produce the
/// identical name.
pub fn derive_name(
    env_code: &str,
    app_code: &str,
    datacenter: &str,
    segment: &str,
) -> ProvisionResult<String> {
    if env_code.is_empty() {
        return Err(ProvisionError::MissingField("env_code"));
    }
    if app_code.is_empty() {
        return Err(ProvisionError::MissingField("app_code"));
    }
    if datacenter.is_empty() {
        return Err(ProvisionError::MissingField("datacenter"));
    }
    if segment.is_empty() {
        return Err(ProvisionError::MissingField("segment"));
    }

    let segment_token = segment.to_lowercase().replace('-', "_");
    Ok(format!(
        "{}_{}_{}_{}_{}",
        env_code.to_lowercase(),
        app_code.to_lowercase(),
        GENERATION,
        datacenter.to_lowercase(),
        segment_token
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_canonical_name() {
        let name = derive_name("p0", "app1", "DC1", "SEG1").unwrap();
        assert_eq!(name, "p0_app1_gen_01_dc1_seg1");
    }

    #[test]
    fn is_deterministic() {
        let a = derive_name("rr", "billing", "DC2", "CORE-NET").unwrap();
        let b = derive_name("rr", "billing", "DC2", "CORE-NET").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn input_case_does_not_matter() {
        let lower = derive_name("if", "app1", "dc1", "seg-a").unwrap();
        let upper = derive_name("IF", "APP1", "DC1", "SEG-A").unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn segment_hyphens_become_underscores() {
        let name = derive_name("hf", "app1", "DC1", "EDGE-ZONE-2").unwrap();
        assert_eq!(name, "hf_app1_gen_01_dc1_edge_zone_2");
    }

    #[test]
    fn empty_inputs_are_rejected() {
        assert!(matches!(
            derive_name("", "app1", "DC1", "SEG1").unwrap_err(),
            ProvisionError::MissingField("env_code")
        ));
        assert!(matches!(
            derive_name("p0", "app1", "", "SEG1").unwrap_err(),
            ProvisionError::MissingField("datacenter")
        ));
    }
}
