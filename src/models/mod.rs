//! Core data models for the tenant provisioning service.
//!
//! These entities cover the cluster directory, the normalized provisioning
//! request, and the durable ledger. Ledger rows map to the database via
//! `sqlx::FromRow` and serialize naturally as JSON via `serde`.

pub mod cluster;
pub mod ledger;
pub mod request;
