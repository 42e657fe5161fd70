use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::workflows::benefits::eligibility::domain::{
    EvaluationRequest, Profile, ProfileId, Program, ProgramEligibility, UserId,
};
use crate::workflows::benefits::eligibility::repository::{
    CatalogError, ProfileStore, ProfileStoreError, ProgramCatalog, ProgramFilter, ResultStore,
    ResultStoreError, StoredEligibility, StoredProfile,
};
use crate::workflows::benefits::eligibility::{
    eligibility_router, EligibilityService, GeographicScope,
};

pub(super) fn renter_profile() -> Profile {
    Profile {
        age: 22,
        professional_status: "EMPLOYED".to_string(),
        family_status: "SINGLE".to_string(),
        children_count: 0,
        annual_income: 8000.0,
        postal_code: "75011".to_string(),
        department: "75".to_string(),
        region: "Ile-de-France".to_string(),
        housing_type: "APARTMENT".to_string(),
        housing_status: "RENTER".to_string(),
        housing_construction_year: None,
        has_renovation_project: false,
        has_business_project: false,
        is_student: false,
    }
}

pub(super) fn program(id: &str, rules: Option<Value>, estimation: Option<Value>) -> Program {
    Program {
        id: id.to_string(),
        name: format!("Program {id}"),
        slug: format!("program-{id}"),
        category: "HOUSING".to_string(),
        short_description: "Test program".to_string(),
        authority: "Test Authority".to_string(),
        geographic_scope: GeographicScope::National,
        eligibility_rules: rules,
        estimation_rules: estimation,
        is_active: true,
    }
}

/// Rental assistance: AND over age, occupancy status, and income ceiling,
/// paying a fixed monthly amount.
pub(super) fn housing_program() -> Program {
    program(
        "housing-aid",
        Some(json!({
            "logic": "AND",
            "conditions": [
                { "field": "age", "operator": ">=", "value": 18 },
                { "field": "housingStatus", "operator": "==", "value": "RENTER",
                  "failureMessage": "Reserved for renters" },
                { "field": "annualIncome", "operator": "<", "value": 30000,
                  "successMessage": "Income within the ceiling" }
            ]
        })),
        Some(json!({ "type": "fixed", "amount": 200 })),
    )
}

/// Energy voucher: income ceiling only, paying an annual range.
pub(super) fn energy_program() -> Program {
    program(
        "energy-voucher",
        Some(json!({
            "logic": "AND",
            "conditions": [
                { "field": "annualIncome", "operator": "<", "value": 11000 }
            ]
        })),
        Some(json!({ "type": "range", "min": 48, "max": 277 })),
    )
}

/// Business grant: requires a declared business project.
pub(super) fn business_program() -> Program {
    program(
        "business-grant",
        Some(json!({
            "logic": "AND",
            "conditions": [
                { "field": "hasBusinessProject", "operator": "==", "value": true }
            ]
        })),
        Some(json!({ "type": "fixed", "amount": 3000 })),
    )
}

pub(super) fn default_catalog() -> Vec<Program> {
    vec![housing_program(), energy_program(), business_program()]
}

#[derive(Default)]
pub(super) struct MemoryCatalog {
    programs: Vec<Program>,
    calls: Mutex<Vec<ProgramFilter>>,
}

impl MemoryCatalog {
    pub(super) fn with_programs(programs: Vec<Program>) -> Self {
        Self {
            programs,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn recorded_filters(&self) -> Vec<ProgramFilter> {
        self.calls.lock().expect("catalog mutex poisoned").clone()
    }
}

impl ProgramCatalog for MemoryCatalog {
    fn list_active(&self, filter: &ProgramFilter) -> Result<Vec<Program>, CatalogError> {
        self.calls
            .lock()
            .expect("catalog mutex poisoned")
            .push(filter.clone());

        Ok(self
            .programs
            .iter()
            .filter(|program| program.is_active)
            .filter(|program| {
                filter
                    .category
                    .as_ref()
                    .map(|category| &program.category == category)
                    .unwrap_or(true)
            })
            .filter(|program| {
                filter
                    .program_ids
                    .as_ref()
                    .map(|ids| ids.contains(&program.id))
                    .unwrap_or(true)
            })
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryProfileStore {
    profiles: Mutex<HashMap<ProfileId, StoredProfile>>,
}

impl MemoryProfileStore {
    pub(super) fn insert(&self, stored: StoredProfile) {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(stored.id.clone(), stored);
    }
}

impl ProfileStore for MemoryProfileStore {
    fn get_by_id(&self, id: &ProfileId) -> Result<Option<StoredProfile>, ProfileStoreError> {
        let guard = self.profiles.lock().expect("profile mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn get_by_owner(&self, owner: &UserId) -> Result<Option<StoredProfile>, ProfileStoreError> {
        let guard = self.profiles.lock().expect("profile mutex poisoned");
        Ok(guard
            .values()
            .find(|stored| stored.owner.as_ref() == Some(owner))
            .cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryResultStore {
    rows: Mutex<HashMap<(ProfileId, String), StoredEligibility>>,
}

impl MemoryResultStore {
    pub(super) fn rows(&self) -> Vec<StoredEligibility> {
        let guard = self.rows.lock().expect("result mutex poisoned");
        let mut rows: Vec<StoredEligibility> = guard.values().cloned().collect();
        rows.sort_by(|a, b| a.program_id.cmp(&b.program_id));
        rows
    }
}

impl ResultStore for MemoryResultStore {
    fn upsert_batch(
        &self,
        profile_id: &ProfileId,
        results: &[ProgramEligibility],
        evaluated_at: DateTime<Utc>,
    ) -> Result<(), ResultStoreError> {
        let mut guard = self.rows.lock().expect("result mutex poisoned");
        for result in results {
            guard.insert(
                (profile_id.clone(), result.program_id.clone()),
                StoredEligibility {
                    profile_id: profile_id.clone(),
                    program_id: result.program_id.clone(),
                    result: result.clone(),
                    evaluated_at,
                },
            );
        }
        Ok(())
    }

    fn list_for_profile(
        &self,
        profile_id: &ProfileId,
    ) -> Result<Vec<StoredEligibility>, ResultStoreError> {
        let guard = self.rows.lock().expect("result mutex poisoned");
        let mut rows: Vec<StoredEligibility> = guard
            .values()
            .filter(|row| &row.profile_id == profile_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.program_id.cmp(&b.program_id));
        Ok(rows)
    }
}

pub(super) struct UnavailableResultStore;

impl ResultStore for UnavailableResultStore {
    fn upsert_batch(
        &self,
        _profile_id: &ProfileId,
        _results: &[ProgramEligibility],
        _evaluated_at: DateTime<Utc>,
    ) -> Result<(), ResultStoreError> {
        Err(ResultStoreError::Unavailable("database offline".to_string()))
    }

    fn list_for_profile(
        &self,
        _profile_id: &ProfileId,
    ) -> Result<Vec<StoredEligibility>, ResultStoreError> {
        Err(ResultStoreError::Unavailable("database offline".to_string()))
    }
}

pub(super) type MemoryService =
    EligibilityService<MemoryCatalog, MemoryProfileStore, MemoryResultStore>;

pub(super) fn build_service() -> (
    MemoryService,
    Arc<MemoryCatalog>,
    Arc<MemoryProfileStore>,
    Arc<MemoryResultStore>,
) {
    build_service_with_catalog(default_catalog())
}

pub(super) fn build_service_with_catalog(
    programs: Vec<Program>,
) -> (
    MemoryService,
    Arc<MemoryCatalog>,
    Arc<MemoryProfileStore>,
    Arc<MemoryResultStore>,
) {
    let catalog = Arc::new(MemoryCatalog::with_programs(programs));
    let profiles = Arc::new(MemoryProfileStore::default());
    let results = Arc::new(MemoryResultStore::default());
    let service = EligibilityService::new(catalog.clone(), profiles.clone(), results.clone());
    (service, catalog, profiles, results)
}

pub(super) fn stored_renter(id: &str, owner: Option<&str>) -> StoredProfile {
    StoredProfile {
        id: ProfileId(id.to_string()),
        owner: owner.map(|user| UserId(user.to_string())),
        data: renter_profile(),
    }
}

pub(super) fn data_request(profile: Profile) -> EvaluationRequest {
    EvaluationRequest {
        profile_data: Some(profile),
        ..EvaluationRequest::default()
    }
}

pub(super) fn reference_request(profile_id: &str) -> EvaluationRequest {
    EvaluationRequest {
        profile_id: Some(ProfileId(profile_id.to_string())),
        ..EvaluationRequest::default()
    }
}

pub(super) fn eligibility_router_with_service(service: MemoryService) -> axum::Router {
    eligibility_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
