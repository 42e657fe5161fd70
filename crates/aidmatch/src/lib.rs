//! Core library for the aidmatch benefit-eligibility service.
//!
//! The interesting machinery lives under [`workflows::benefits::eligibility`]:
//! a rule-tree evaluator, an amount estimator, and the orchestrating service
//! that resolves profiles, runs the catalog, and persists results through
//! injected collaborator traits.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
