//! Benefit-program workflows: the eligibility evaluation pipeline.

pub mod eligibility;
