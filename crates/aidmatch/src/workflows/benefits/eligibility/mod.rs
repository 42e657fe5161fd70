//! Benefit-program eligibility: rule-tree evaluation, amount estimation, and
//! the orchestrating service over injected catalog/profile/result stores.

pub mod domain;
pub(crate) mod engine;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    CombinationLogic, Condition, ConditionOperator, ConditionValue, CriterionResult,
    EstimationRule, EvaluationRequest, EvaluationResponse, GeographicScope, IncomeModifier,
    Profile, ProfileId, Program, ProgramEligibility, ProgramSummary, RuleGroup, RuleNode, UserId,
};
pub use engine::EligibilityEngine;
pub use repository::{
    CatalogError, ProfileStore, ProfileStoreError, ProgramCatalog, ProgramFilter, ResultStore,
    ResultStoreError, StoredEligibility, StoredProfile,
};
pub use router::eligibility_router;
pub use service::{EligibilityService, EligibilityServiceError};
