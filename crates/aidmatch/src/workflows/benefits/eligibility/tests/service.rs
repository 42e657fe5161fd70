use serde_json::json;

use super::common::*;
use crate::workflows::benefits::eligibility::domain::{
    EvaluationRequest, ProfileId, UserId,
};
use crate::workflows::benefits::eligibility::repository::ProgramFilter;
use crate::workflows::benefits::eligibility::{EligibilityService, EligibilityServiceError};
use std::sync::Arc;

#[test]
fn explicit_profile_data_is_never_persisted() {
    let (service, _, _, results) = build_service();
    let mut request = data_request(renter_profile());
    request.persist_results = Some(true);

    let response = service.evaluate(None, &request).expect("evaluation succeeds");

    assert!(!response.persisted);
    assert!(response.profile_id.is_none());
    assert_eq!(response.total_programs_evaluated, 3);
    assert_eq!(response.eligible_count, 2);
    assert!(results.rows().is_empty());
}

#[test]
fn unknown_profile_reference_is_not_found() {
    let (service, catalog, _, _) = build_service();

    let error = service
        .evaluate(None, &reference_request("missing"))
        .expect_err("unknown reference must fail");

    assert!(matches!(
        &error,
        EligibilityServiceError::ProfileNotFound(id) if id.0 == "missing"
    ));
    assert!(catalog.recorded_filters().is_empty(), "catalog must not be consulted");
}

#[test]
fn referenced_profile_persists_by_default() {
    let (service, _, profiles, results) = build_service();
    profiles.insert(stored_renter("profile-1", None));

    let response = service
        .evaluate(None, &reference_request("profile-1"))
        .expect("evaluation succeeds");

    assert!(response.persisted);
    assert_eq!(response.profile_id, Some(ProfileId("profile-1".to_string())));
    assert_eq!(results.rows().len(), 3);
}

#[test]
fn referenced_profile_persistence_can_be_disabled() {
    let (service, _, profiles, results) = build_service();
    profiles.insert(stored_renter("profile-1", None));
    let mut request = reference_request("profile-1");
    request.persist_results = Some(false);

    let response = service.evaluate(None, &request).expect("evaluation succeeds");

    assert!(!response.persisted);
    assert!(results.rows().is_empty());
}

#[test]
fn caller_profile_is_used_when_no_explicit_source_given() {
    let (service, _, profiles, results) = build_service();
    profiles.insert(stored_renter("profile-7", Some("user-7")));
    let caller = UserId("user-7".to_string());

    let response = service
        .evaluate(Some(&caller), &EvaluationRequest::default())
        .expect("evaluation succeeds");

    assert!(response.persisted);
    assert_eq!(response.profile_id, Some(ProfileId("profile-7".to_string())));
    assert_eq!(results.rows().len(), 3);
}

#[test]
fn caller_without_stored_profile_is_told_to_complete_it() {
    let (service, _, _, _) = build_service();
    let caller = UserId("user-without-profile".to_string());

    let error = service
        .evaluate(Some(&caller), &EvaluationRequest::default())
        .expect_err("must fail without an on-file profile");

    assert!(matches!(error, EligibilityServiceError::ProfileIncomplete));
    assert!(error.to_string().contains("complete the profile"));
}

#[test]
fn anonymous_request_without_source_fails_before_catalog_access() {
    let (service, catalog, _, _) = build_service();

    let error = service
        .evaluate(None, &EvaluationRequest::default())
        .expect_err("no profile source must fail");

    assert!(matches!(error, EligibilityServiceError::MissingProfileSource));
    assert!(catalog.recorded_filters().is_empty());
}

#[test]
fn explicit_profile_data_wins_over_reference_and_caller() {
    let (service, _, profiles, results) = build_service();
    profiles.insert(stored_renter("profile-1", Some("user-1")));

    let mut ineligible_everywhere = renter_profile();
    ineligible_everywhere.annual_income = 90000.0;
    let mut request = data_request(ineligible_everywhere);
    request.profile_id = Some(ProfileId("profile-1".to_string()));
    let caller = UserId("user-1".to_string());

    let response = service.evaluate(Some(&caller), &request).expect("evaluation succeeds");

    // The supplied data (too much income) was evaluated, not the stored renter.
    assert_eq!(response.eligible_count, 0);
    assert!(!response.persisted);
    assert!(results.rows().is_empty());
}

#[test]
fn eligible_results_precede_ineligible_preserving_catalog_order() {
    // Interleave programs the fixture renter passes and fails.
    let passes_a = housing_program();
    let fails_a = business_program();
    let passes_b = energy_program();
    let fails_b = program(
        "senior-pass",
        Some(json!({
            "logic": "AND",
            "conditions": [{ "field": "age", "operator": ">=", "value": 65 }]
        })),
        None,
    );
    let (service, _, _, _) =
        build_service_with_catalog(vec![fails_a, passes_a, fails_b, passes_b]);

    let response = service
        .evaluate(None, &data_request(renter_profile()))
        .expect("evaluation succeeds");

    let ids: Vec<&str> = response
        .results
        .iter()
        .map(|result| result.program_id.as_str())
        .collect();
    assert_eq!(
        ids,
        ["housing-aid", "energy-voucher", "business-grant", "senior-pass"]
    );
    assert!(response.results[..2].iter().all(|result| result.is_eligible));
    assert!(response.results[2..].iter().all(|result| !result.is_eligible));
}

#[test]
fn repeated_evaluation_overwrites_rows_instead_of_appending() {
    let (service, _, profiles, results) = build_service();
    profiles.insert(stored_renter("profile-1", None));
    let request = reference_request("profile-1");

    let first = service.evaluate(None, &request).expect("first run succeeds");
    let second = service.evaluate(None, &request).expect("second run succeeds");

    assert!(first.persisted && second.persisted);
    let rows = results.rows();
    assert_eq!(rows.len(), 3, "one row per program, not per run");
    for row in &rows {
        assert_eq!(row.evaluated_at, second.evaluated_at);
    }
}

#[test]
fn result_store_outage_still_returns_computed_results() {
    let catalog = Arc::new(MemoryCatalog::with_programs(default_catalog()));
    let profiles = Arc::new(MemoryProfileStore::default());
    profiles.insert(stored_renter("profile-1", None));
    let service = EligibilityService::new(
        catalog,
        profiles,
        Arc::new(UnavailableResultStore),
    );

    let response = service
        .evaluate(None, &reference_request("profile-1"))
        .expect("read path must survive a write-side outage");

    assert!(!response.persisted);
    assert_eq!(response.total_programs_evaluated, 3);
    assert_eq!(response.eligible_count, 2);
    assert_eq!(response.profile_id, Some(ProfileId("profile-1".to_string())));
}

#[test]
fn category_and_id_filters_are_forwarded_to_the_catalog() {
    let (service, catalog, _, _) = build_service();
    let request = EvaluationRequest {
        profile_data: Some(renter_profile()),
        category: Some("HOUSING".to_string()),
        program_ids: Some(vec!["housing-aid".to_string()]),
        ..EvaluationRequest::default()
    };

    let response = service.evaluate(None, &request).expect("evaluation succeeds");

    assert_eq!(response.total_programs_evaluated, 1);
    assert_eq!(
        catalog.recorded_filters(),
        vec![ProgramFilter {
            category: Some("HOUSING".to_string()),
            program_ids: Some(vec!["housing-aid".to_string()]),
        }]
    );
}

#[test]
fn stored_results_are_listed_per_profile() {
    let (service, _, profiles, _) = build_service();
    profiles.insert(stored_renter("profile-1", None));
    profiles.insert(stored_renter("profile-2", None));

    service
        .evaluate(None, &reference_request("profile-1"))
        .expect("evaluation succeeds");

    let rows = service
        .stored_results(&ProfileId("profile-1".to_string()))
        .expect("listing succeeds");
    assert_eq!(rows.len(), 3);
    assert!(rows.iter().all(|row| row.profile_id.0 == "profile-1"));

    let empty = service
        .stored_results(&ProfileId("profile-2".to_string()))
        .expect("listing succeeds");
    assert!(empty.is_empty());
}
