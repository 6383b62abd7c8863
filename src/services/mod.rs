//! Provisioning workflow services, leaves first: cluster resolution, tenant
//! naming, convention validation, ledger persistence, artifact generation,
//! and the orchestrator that sequences them.

pub mod artifact_generator;
pub mod cluster_resolver;
pub mod ledger_repository;
pub mod naming_validator;
pub mod provisioning_service;
pub mod tenant_namer;
