use std::sync::Arc;

use axum::http::StatusCode;
use chrono::Utc;
use tracing::{debug, info, warn};

use super::domain::{
    EvaluationRequest, EvaluationResponse, Profile, ProfileId, ProgramEligibility, UserId,
};
use super::engine::EligibilityEngine;
use super::repository::{
    CatalogError, ProfileStore, ProfileStoreError, ProgramCatalog, ProgramFilter, ResultStore,
    ResultStoreError, StoredEligibility,
};

/// Orchestrating service for eligibility evaluation: resolves the profile to
/// use, runs the engine over the active catalog, orders results, and applies
/// the persistence policy. All collaborators are injected at construction.
pub struct EligibilityService<C, P, S> {
    catalog: Arc<C>,
    profiles: Arc<P>,
    results: Arc<S>,
    engine: EligibilityEngine,
}

/// Outcome of profile resolution: the snapshot to evaluate, its stable id
/// when one exists, and whether this request may persist results.
struct ResolvedProfile {
    profile: Profile,
    profile_id: Option<ProfileId>,
    should_persist: bool,
}

impl<C, P, S> EligibilityService<C, P, S>
where
    C: ProgramCatalog + 'static,
    P: ProfileStore + 'static,
    S: ResultStore + 'static,
{
    pub fn new(catalog: Arc<C>, profiles: Arc<P>, results: Arc<S>) -> Self {
        Self {
            catalog,
            profiles,
            results,
            engine: EligibilityEngine::new(),
        }
    }

    /// Evaluate the active catalog for the resolved profile and, when a
    /// stable profile id is in play and persistence is not disabled, upsert
    /// the batch of results.
    ///
    /// A persistence failure does not discard the computed results: the
    /// response is still returned with `persisted=false`.
    pub fn evaluate(
        &self,
        caller: Option<&UserId>,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResponse, EligibilityServiceError> {
        let resolved = self.resolve_profile(caller, request)?;

        let filter = ProgramFilter {
            category: request.category.clone(),
            program_ids: request.program_ids.clone(),
        };
        let programs = self.catalog.list_active(&filter)?;

        let mut results: Vec<ProgramEligibility> = programs
            .iter()
            .map(|program| self.engine.evaluate_program(&resolved.profile, program))
            .collect();

        // Stable: catalog order is preserved within each group.
        results.sort_by_key(|result| !result.is_eligible);

        let evaluated_at = Utc::now();
        let persisted = match (&resolved.profile_id, resolved.should_persist) {
            (Some(profile_id), true) => {
                match self.results.upsert_batch(profile_id, &results, evaluated_at) {
                    Ok(()) => true,
                    Err(err) => {
                        warn!(%profile_id, error = %err, "result batch not persisted");
                        false
                    }
                }
            }
            _ => false,
        };

        let eligible_count = results.iter().filter(|result| result.is_eligible).count();
        info!(
            total = results.len(),
            eligible = eligible_count,
            persisted,
            "evaluation completed"
        );

        Ok(EvaluationResponse {
            total_programs_evaluated: results.len(),
            eligible_count,
            results,
            evaluated_at,
            persisted,
            profile_id: resolved.profile_id,
        })
    }

    /// Previously persisted rows for a profile, at most one per program.
    pub fn stored_results(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<StoredEligibility>, EligibilityServiceError> {
        Ok(self.results.list_for_profile(profile_id)?)
    }

    /// Resolution priority: explicit profile data, then an explicit profile
    /// reference, then the caller's own on-file profile. Anything else is a
    /// caller-side precondition failure, raised before any catalog access.
    fn resolve_profile(
        &self,
        caller: Option<&UserId>,
        request: &EvaluationRequest,
    ) -> Result<ResolvedProfile, EligibilityServiceError> {
        if let Some(profile) = &request.profile_data {
            debug!("using caller-supplied profile data, persistence disabled");
            return Ok(ResolvedProfile {
                profile: profile.clone(),
                profile_id: None,
                should_persist: false,
            });
        }

        if let Some(profile_id) = &request.profile_id {
            let stored = self
                .profiles
                .get_by_id(profile_id)?
                .ok_or_else(|| EligibilityServiceError::ProfileNotFound(profile_id.clone()))?;

            let should_persist = request.persist_results != Some(false);
            debug!(%profile_id, should_persist, "using referenced profile");
            return Ok(ResolvedProfile {
                profile: stored.data,
                profile_id: Some(stored.id),
                should_persist,
            });
        }

        if let Some(caller) = caller {
            let stored = self
                .profiles
                .get_by_owner(caller)?
                .ok_or(EligibilityServiceError::ProfileIncomplete)?;

            let should_persist = request.persist_results != Some(false);
            debug!(user = %caller, profile_id = %stored.id, should_persist, "using caller's on-file profile");
            return Ok(ResolvedProfile {
                profile: stored.data,
                profile_id: Some(stored.id),
                should_persist,
            });
        }

        Err(EligibilityServiceError::MissingProfileSource)
    }
}

/// Error raised by the eligibility service.
#[derive(Debug, thiserror::Error)]
pub enum EligibilityServiceError {
    #[error("no profile source available: supply profileData, reference a profileId, or authenticate")]
    MissingProfileSource,
    #[error("profile \"{0}\" not found")]
    ProfileNotFound(ProfileId),
    #[error("no profile on file for the authenticated user; complete the profile questionnaire first")]
    ProfileIncomplete,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    ProfileStore(#[from] ProfileStoreError),
    #[error(transparent)]
    ResultStore(#[from] ResultStoreError),
}

impl EligibilityServiceError {
    /// HTTP status the transport layer maps each variant to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            EligibilityServiceError::MissingProfileSource => StatusCode::BAD_REQUEST,
            EligibilityServiceError::ProfileNotFound(_)
            | EligibilityServiceError::ProfileIncomplete => StatusCode::NOT_FOUND,
            EligibilityServiceError::Catalog(_)
            | EligibilityServiceError::ProfileStore(_)
            | EligibilityServiceError::ResultStore(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
