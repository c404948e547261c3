//! Unit tests for API types serialization/deserialization.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use chrono::{TimeZone, Utc};
use sprout::api::{
    CreateChildRequest, ErrorResponse, HealthResponse, OnboardingRequest, StageResponse,
    UpdateChildRequest, UpdateMilestoneRequest, UpdateProfileRequest, parse_instant,
};
use sprout_core::{AgeSpan, Language, SproutError, Stage};

// =============================================================================
// HEALTH / ERROR RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_error_response_serialization() {
    let json = serde_json::to_string(&ErrorResponse::new("Child not found")).unwrap();
    assert!(json.contains("\"success\":false"));
    assert!(json.contains("\"error\":\"Child not found\""));
}

// =============================================================================
// DATE PARSING TESTS
// =============================================================================

#[test]
fn test_parse_instant_plain_date_is_midnight_utc() {
    let instant = parse_instant("date_of_birth", "2024-03-15").unwrap();
    assert_eq!(instant, Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
}

#[test]
fn test_parse_instant_rfc3339_with_offset() {
    let instant = parse_instant("today", "2024-03-15T05:30:00+05:30").unwrap();
    assert_eq!(instant, Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap());
}

#[test]
fn test_parse_instant_rejects_garbage() {
    let result = parse_instant("today", "15/03/2024");
    match result {
        Err(SproutError::InvalidInput(msg)) => assert!(msg.contains("today")),
        other => panic!("expected InvalidInput, got {:?}", other),
    }
}

// =============================================================================
// REQUEST DEFAULTS
// =============================================================================

#[test]
fn test_create_child_defaults_to_primary() {
    let request: CreateChildRequest = serde_json::from_str(
        r#"{"name":"Mira","date_of_birth":"2024-01-01","gender":"Female","relationship":"Mom"}"#,
    )
    .unwrap();

    assert!(request.is_primary);
    let new = request.to_new_child().unwrap();
    assert_eq!(new.name, "Mira");
    assert_eq!(new.height_cm, None);
}

#[test]
fn test_create_child_rejects_unknown_relationship() {
    let result = serde_json::from_str::<CreateChildRequest>(
        r#"{"name":"Mira","date_of_birth":"2024-01-01","gender":"Female","relationship":"Uncle"}"#,
    );
    assert!(result.is_err());
}

#[test]
fn test_onboarding_defaults_to_english() {
    let request: OnboardingRequest = serde_json::from_str("{}").unwrap();
    assert_eq!(request.language, Language::English);
    assert!(request.children.is_empty());
    assert!(request.to_submission().unwrap().children.is_empty());
}

// =============================================================================
// ABSENT VS NULL
// =============================================================================

#[test]
fn test_update_child_absent_and_null_differ() {
    let absent: UpdateChildRequest = serde_json::from_str(r#"{"name":"Mira"}"#).unwrap();
    assert_eq!(absent.weight_kg, None);

    let cleared: UpdateChildRequest = serde_json::from_str(r#"{"weight_kg":null}"#).unwrap();
    assert_eq!(cleared.weight_kg, Some(None));

    let set: UpdateChildRequest = serde_json::from_str(r#"{"weight_kg":6.2}"#).unwrap();
    assert_eq!(set.weight_kg, Some(Some(6.2)));
}

#[test]
fn test_update_milestone_null_photos_clears() {
    let request: UpdateMilestoneRequest = serde_json::from_str(r#"{"photos":null}"#).unwrap();
    let update = request.to_update().unwrap();
    assert_eq!(update.photos, Some(Vec::new()));

    let request: UpdateMilestoneRequest = serde_json::from_str("{}").unwrap();
    assert_eq!(request.to_update().unwrap().photos, None);
}

#[test]
fn test_update_milestone_invalid_date() {
    let request: UpdateMilestoneRequest =
        serde_json::from_str(r#"{"achieved_at":"yesterday"}"#).unwrap();
    assert!(request.to_update().is_err());
}

#[test]
fn test_update_profile_maps_fields() {
    let request: UpdateProfileRequest =
        serde_json::from_str(r#"{"display_name":null,"language":"Bengali"}"#).unwrap();
    let update = request.to_update();
    assert_eq!(update.display_name, Some(None));
    assert_eq!(update.phone, None);
    assert_eq!(update.language, Some(Language::Bengali));
}

// =============================================================================
// STAGE RESPONSE
// =============================================================================

#[test]
fn test_stage_response_labels() {
    let birth = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let age = AgeSpan::between(birth, now);

    let response = StageResponse::new(Stage::Year1, &age, &[Stage::Year1]);
    let json = serde_json::to_value(&response).unwrap();

    assert_eq!(json["stage"], "1 Year");
    assert_eq!(json["next_stage"], "18-24 Months");
    assert_eq!(json["age"]["months"], 12);
    assert_eq!(json["window"][0], "1 Year");
}
