use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{Profile, ProfileId, Program, ProgramEligibility, UserId};

/// Filter accepted by the program catalog: an optional category and an
/// optional explicit id allow-list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgramFilter {
    pub category: Option<String>,
    pub program_ids: Option<Vec<String>>,
}

/// Read-only access to the external program catalog. Implementations must
/// return programs in catalog order; the orchestrator's eligible-first sort
/// is stable and preserves that order within each group.
pub trait ProgramCatalog: Send + Sync {
    fn list_active(&self, filter: &ProgramFilter) -> Result<Vec<Program>, CatalogError>;
}

/// Catalog access failure.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("program catalog unavailable: {0}")]
    Unavailable(String),
}

/// Profile snapshot with its stable identity and optional owner, as held by
/// the external profile store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProfile {
    pub id: ProfileId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<UserId>,
    pub data: Profile,
}

/// Read access to externally owned profiles, by id or by owning user.
pub trait ProfileStore: Send + Sync {
    fn get_by_id(&self, id: &ProfileId) -> Result<Option<StoredProfile>, ProfileStoreError>;
    fn get_by_owner(&self, owner: &UserId) -> Result<Option<StoredProfile>, ProfileStoreError>;
}

/// Profile store access failure.
#[derive(Debug, thiserror::Error)]
pub enum ProfileStoreError {
    #[error("profile store unavailable: {0}")]
    Unavailable(String),
}

/// Persisted projection of one evaluation result, keyed uniquely by
/// `(profile_id, program_id)`. Each batch overwrites the row for its key;
/// no history is retained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEligibility {
    pub profile_id: ProfileId,
    pub program_id: String,
    pub result: ProgramEligibility,
    pub evaluated_at: DateTime<Utc>,
}

/// Write/read access to persisted evaluation results.
pub trait ResultStore: Send + Sync {
    /// Upsert every result of one evaluation batch atomically: either all
    /// rows land or none do.
    fn upsert_batch(
        &self,
        profile_id: &ProfileId,
        results: &[ProgramEligibility],
        evaluated_at: DateTime<Utc>,
    ) -> Result<(), ResultStoreError>;

    fn list_for_profile(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<StoredEligibility>, ResultStoreError>;
}

/// Result store access failure. A failed batch must leave the store as it
/// was before the call.
#[derive(Debug, thiserror::Error)]
pub enum ResultStoreError {
    #[error("result store unavailable: {0}")]
    Unavailable(String),
}
