use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use aidmatch::workflows::benefits::eligibility::{
    CatalogError, EligibilityService, GeographicScope, Profile, ProfileId, ProfileStore,
    ProfileStoreError, Program, ProgramCatalog, ProgramEligibility, ProgramFilter, ResultStore,
    ResultStoreError, StoredEligibility, StoredProfile, UserId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type InMemoryEligibilityService =
    EligibilityService<InMemoryProgramCatalog, InMemoryProfileStore, InMemoryResultStore>;

pub(crate) fn build_service() -> Arc<InMemoryEligibilityService> {
    Arc::new(EligibilityService::new(
        Arc::new(InMemoryProgramCatalog::seeded()),
        Arc::new(InMemoryProfileStore::seeded()),
        Arc::new(InMemoryResultStore::default()),
    ))
}

/// Catalog backed by a fixed program list, preserving seed order.
pub(crate) struct InMemoryProgramCatalog {
    programs: Vec<Program>,
}

impl InMemoryProgramCatalog {
    pub(crate) fn seeded() -> Self {
        Self {
            programs: seed_programs(),
        }
    }
}

impl ProgramCatalog for InMemoryProgramCatalog {
    fn list_active(&self, filter: &ProgramFilter) -> Result<Vec<Program>, CatalogError> {
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
pub(crate) struct InMemoryProfileStore {
    profiles: Mutex<HashMap<ProfileId, StoredProfile>>,
}

impl InMemoryProfileStore {
    pub(crate) fn seeded() -> Self {
        let store = Self::default();
        store.insert(StoredProfile {
            id: ProfileId("profile-demo".to_string()),
            owner: Some(UserId("user-demo".to_string())),
            data: demo_profile(),
        });
        store
    }

    pub(crate) fn insert(&self, stored: StoredProfile) {
        self.profiles
            .lock()
            .expect("profile mutex poisoned")
            .insert(stored.id.clone(), stored);
    }
}

impl ProfileStore for InMemoryProfileStore {
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

/// Result rows keyed by `(profile, program)`; the whole batch lands under a
/// single lock acquisition so it is all-or-nothing within this process.
#[derive(Default)]
pub(crate) struct InMemoryResultStore {
    rows: Mutex<HashMap<(ProfileId, String), StoredEligibility>>,
}

impl ResultStore for InMemoryResultStore {
    fn upsert_batch(
        &self,
        profile_id: &ProfileId,
        results: &[ProgramEligibility],
        evaluated_at: chrono::DateTime<chrono::Utc>,
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

/// Sample applicant used by the seeded profile store and the CLI demo: a
/// young renter on a modest income.
pub(crate) fn demo_profile() -> Profile {
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

/// Seed catalog covering the three estimation shapes: a formula-based rental
/// subsidy, a range-based energy voucher, and a fixed business grant.
pub(crate) fn seed_programs() -> Vec<Program> {
    vec![
        Program {
            id: "prog-housing-aid".to_string(),
            name: "Rental Housing Assistance".to_string(),
            slug: "rental-housing-assistance".to_string(),
            category: "HOUSING".to_string(),
            short_description: "Monthly support toward rent for tenants on modest incomes."
                .to_string(),
            authority: "National Housing Fund".to_string(),
            geographic_scope: GeographicScope::National,
            eligibility_rules: Some(json!({
                "logic": "AND",
                "conditions": [
                    {
                        "field": "age",
                        "operator": ">=",
                        "value": 18,
                        "failureMessage": "You must be at least 18 years old",
                        "successMessage": "Age requirement met (18 or older)"
                    },
                    {
                        "field": "housingStatus",
                        "operator": "==",
                        "value": "RENTER",
                        "failureMessage": "This program is reserved for renters",
                        "successMessage": "You are a renter"
                    },
                    {
                        "field": "annualIncome",
                        "operator": "<",
                        "value": 30000,
                        "failureMessage": "Your income exceeds the 30,000 ceiling",
                        "successMessage": "Your income is within the ceiling"
                    }
                ]
            })),
            estimation_rules: Some(json!({
                "type": "formula",
                "baseAmount": 200,
                "perChildBonus": 50,
                "maxAmount": 450,
                "incomeModifier": { "threshold": 15000, "reductionPercent": 25 },
                "description": "Estimated monthly amount"
            })),
            is_active: true,
        },
        Program {
            id: "prog-energy-voucher".to_string(),
            name: "Energy Voucher".to_string(),
            slug: "energy-voucher".to_string(),
            category: "ENERGY".to_string(),
            short_description: "Annual voucher toward household energy bills.".to_string(),
            authority: "Ministry of Energy Transition".to_string(),
            geographic_scope: GeographicScope::National,
            eligibility_rules: Some(json!({
                "logic": "AND",
                "conditions": [
                    {
                        "field": "annualIncome",
                        "operator": "<",
                        "value": 11000,
                        "failureMessage": "Your income exceeds the voucher ceiling",
                        "successMessage": "Your income qualifies for the voucher"
                    }
                ]
            })),
            estimation_rules: Some(json!({
                "type": "range",
                "min": 48,
                "max": 277,
                "description": "Annual amount depending on income"
            })),
            is_active: true,
        },
        Program {
            id: "prog-business-grant".to_string(),
            name: "Business Starter Grant".to_string(),
            slug: "business-starter-grant".to_string(),
            category: "BUSINESS".to_string(),
            short_description: "One-off grant for citizens launching a business.".to_string(),
            authority: "Regional Development Agency".to_string(),
            geographic_scope: GeographicScope::Regional,
            eligibility_rules: Some(json!({
                "logic": "AND",
                "conditions": [
                    {
                        "field": "hasBusinessProject",
                        "operator": "==",
                        "value": true,
                        "failureMessage": "A declared business project is required"
                    },
                    {
                        "field": "age",
                        "operator": ">=",
                        "value": 18
                    }
                ]
            })),
            estimation_rules: Some(json!({ "type": "fixed", "amount": 3000 })),
            is_active: true,
        },
    ]
}
