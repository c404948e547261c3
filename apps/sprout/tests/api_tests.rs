//! Integration tests for the Sprout HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
// Allow holding MutexGuard across await in auth tests - tests are serialized
// intentionally to avoid env var conflicts
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::{HeaderName, HeaderValue};
use axum_test::{TestRequest, TestServer};
use serde_json::json;
use sprout::api::{
    ActivitiesResponse, ActivityResponse, AppState, ChildResponse, ChildrenResponse,
    DeleteResponse, ErrorResponse, GuidanceResponse, HealthResponse, MilestoneResponse,
    MilestonesResponse, OnboardingResponse, ProfileResponse, StageResponse, StagesResponse,
    StatusResponse, USER_ID_HEADER, create_router,
};
use sprout_core::{ContentTable, Registry};
use std::sync::Mutex;

/// Mutex to serialize tests since some of them modify env vars.
static AUTH_TEST_MUTEX: Mutex<()> = Mutex::new(());

const CONTENT: &str = "\
Age/Timeframe,Motor,Motor Images,Language
Week 1,Lifts head briefly,img/w1.png,Startles at sounds
Week 2,Moves arms and legs,-,Turns toward voices
6 Months,Sits with support,img/m6.png,Babbles
Newborn,Sleeps a lot,-,-
";

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Guard wrapper that holds the mutex and ensures cleanup on drop.
struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var("SPROUT_API_KEY") };
    }
}

fn content() -> ContentTable {
    ContentTable::from_csv_str(CONTENT).unwrap()
}

/// Create a test server with a fresh in-memory registry.
/// Returns a guard that must be kept alive during the test.
fn create_test_server() -> (TestServer, TestGuard) {
    let guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("SPROUT_API_KEY") };
    let state = AppState::new(Registry::new(), content());
    let router = create_router(state);
    (
        TestServer::new(router).unwrap(),
        TestGuard { _guard: guard },
    )
}

/// Attach the caller identity header.
fn as_user(request: TestRequest, user: &'static str) -> TestRequest {
    request.add_header(
        HeaderName::from_static(USER_ID_HEADER),
        HeaderValue::from_static(user),
    )
}

async fn create_child(server: &TestServer, user: &'static str, name: &str, dob: &str) -> u64 {
    let response = as_user(server.post("/children"), user)
        .json(&json!({
            "name": name,
            "date_of_birth": dob,
            "gender": "Female",
            "relationship": "Mom",
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 201);
    response.json::<ChildResponse>().child.id
}

// =============================================================================
// HEALTH / STATUS TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_status_reports_content_and_children() {
    let (server, _guard) = create_test_server();

    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.child_count, 0);
    assert!(!status.persistent);
    assert_eq!(status.content_rows, 4);
    assert_eq!(status.content_stages, 4);

    create_child(&server, "alice", "Mira", "2024-01-01").await;

    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.child_count, 1);
}

// =============================================================================
// STAGE TESTS
// =============================================================================

#[tokio::test]
async fn test_stages_lists_every_stage_in_order() {
    let (server, _guard) = create_test_server();

    let response = server.get("/stages").await;
    response.assert_status_ok();

    let stages: StagesResponse = response.json();
    assert_eq!(stages.stages.len(), 17);
    assert_eq!(stages.stages[0].label, "Week 1");
    assert_eq!(stages.stages[0].rows, 1);
    assert_eq!(stages.stages[4].label, "Week 5-6");
    assert_eq!(stages.stages[4].rows, 0);
    assert_eq!(stages.stages[16].label, "3 Years");
    assert_eq!(stages.unknown_labels, vec!["Newborn".to_string()]);
}

#[tokio::test]
async fn test_stage_first_week() {
    let (server, _guard) = create_test_server();

    let response = server
        .get("/stage")
        .add_query_param("birth_date", "2024-01-01")
        .add_query_param("today", "2024-01-05")
        .await;

    response.assert_status_ok();
    let stage: StageResponse = response.json();
    assert!(stage.success);
    assert_eq!(stage.stage, "Week 1");
    assert_eq!(stage.next_stage.as_deref(), Some("Week 2"));
    assert_eq!(stage.age.days, 4);
    assert_eq!(stage.window, vec!["Week 1", "Week 2"]);
}

#[tokio::test]
async fn test_stage_window_skips_missing_successor() {
    let (server, _guard) = create_test_server();

    let response = server
        .get("/stage")
        .add_query_param("birth_date", "2024-01-01")
        .add_query_param("today", "2024-07-01")
        .await;

    response.assert_status_ok();
    let stage: StageResponse = response.json();
    assert_eq!(stage.stage, "6 Months");
    assert_eq!(stage.next_stage.as_deref(), Some("7-12 Months"));
    assert_eq!(stage.window, vec!["6 Months"]);
}

#[tokio::test]
async fn test_stage_window_empty_without_content() {
    let (server, _guard) = create_test_server();

    let stage: StageResponse = server
        .get("/stage")
        .add_query_param("birth_date", "2021-01-01")
        .add_query_param("today", "2024-06-01")
        .await
        .json();

    assert_eq!(stage.stage, "3 Years");
    assert_eq!(stage.next_stage, None);
    assert!(stage.window.is_empty());
}

#[tokio::test]
async fn test_stage_future_birth_date_rejected() {
    let (server, _guard) = create_test_server();

    let response = server
        .get("/stage")
        .add_query_param("birth_date", "2024-02-01")
        .add_query_param("today", "2024-01-01")
        .await;

    assert_eq!(response.status_code().as_u16(), 400);
    let error: ErrorResponse = response.json();
    assert!(!error.success);
}

#[tokio::test]
async fn test_stage_invalid_date_rejected() {
    let (server, _guard) = create_test_server();

    let response = server
        .get("/stage")
        .add_query_param("birth_date", "01/02/2024")
        .await;

    assert_eq!(response.status_code().as_u16(), 400);
    let error: ErrorResponse = response.json();
    assert!(error.error.contains("birth_date"));
}

#[tokio::test]
async fn test_stage_missing_birth_date_rejected() {
    let (server, _guard) = create_test_server();

    let response = server.get("/stage").await;
    assert!(response.status_code().is_client_error());
}

// =============================================================================
// CHILD TESTS
// =============================================================================

#[tokio::test]
async fn test_children_require_user_header() {
    let (server, _guard) = create_test_server();

    let response = server.get("/children").await;

    assert_eq!(response.status_code().as_u16(), 401);
    let error: ErrorResponse = response.json();
    assert!(!error.success);
}

#[tokio::test]
async fn test_create_and_list_children() {
    let (server, _guard) = create_test_server();

    let first = create_child(&server, "alice", "Mira", "2024-01-01").await;
    let second = create_child(&server, "alice", "Arjun", "2023-05-10").await;
    assert_ne!(first, second);

    let response = as_user(server.get("/children"), "alice").await;
    response.assert_status_ok();
    let children: ChildrenResponse = response.json();
    assert_eq!(children.children.len(), 2);
    assert_eq!(children.children[0].id, first);
    assert_eq!(children.children[0].name, "Mira");
    assert!(children.children[0].is_primary);
    assert!(children.children[0].stage.is_some());

    let others: ChildrenResponse = as_user(server.get("/children"), "bob").await.json();
    assert!(others.children.is_empty());
}

#[tokio::test]
async fn test_create_child_rejects_blank_name() {
    let (server, _guard) = create_test_server();

    let response = as_user(server.post("/children"), "alice")
        .json(&json!({
            "name": "   ",
            "date_of_birth": "2024-01-01",
            "gender": "Male",
            "relationship": "Dad",
        }))
        .await;

    assert_eq!(response.status_code().as_u16(), 400);
}

#[tokio::test]
async fn test_child_hidden_from_unrelated_user() {
    let (server, _guard) = create_test_server();
    let id = create_child(&server, "alice", "Mira", "2024-01-01").await;

    let response = as_user(server.get(&format!("/children/{}", id)), "bob").await;
    assert_eq!(response.status_code().as_u16(), 404);

    let response = as_user(server.delete(&format!("/children/{}", id)), "bob").await;
    assert_eq!(response.status_code().as_u16(), 404);

    let response = as_user(server.get(&format!("/children/{}", id)), "alice").await;
    response.assert_status_ok();
}

#[tokio::test]
async fn test_update_child_sets_and_clears_fields() {
    let (server, _guard) = create_test_server();
    let id = create_child(&server, "alice", "Mira", "2024-01-01").await;
    let path = format!("/children/{}", id);

    let response = as_user(server.put(&path), "alice")
        .json(&json!({ "name": "Mira K", "weight_kg": 7.5, "relationship": "Grandparent" }))
        .await;
    response.assert_status_ok();
    let child = response.json::<ChildResponse>().child;
    assert_eq!(child.name, "Mira K");
    assert_eq!(child.weight_kg, Some(7.5));

    let response = as_user(server.put(&path), "alice")
        .json(&json!({ "weight_kg": null }))
        .await;
    response.assert_status_ok();
    let child = response.json::<ChildResponse>().child;
    assert_eq!(child.name, "Mira K");
    assert_eq!(child.weight_kg, None);
}

#[tokio::test]
async fn test_delete_child_cascades() {
    let (server, _guard) = create_test_server();
    let id = create_child(&server, "alice", "Mira", "2024-01-01").await;

    let response = as_user(server.post("/milestones"), "alice")
        .json(&json!({ "child_id": id, "title": "First smile", "achieved_at": "2024-02-01" }))
        .await;
    assert_eq!(response.status_code().as_u16(), 201);

    let response = as_user(server.delete(&format!("/children/{}", id)), "alice").await;
    response.assert_status_ok();
    let deleted: DeleteResponse = response.json();
    assert!(deleted.success);
    assert_eq!(deleted.message, "Child deleted");

    let response = as_user(server.get(&format!("/children/{}", id)), "alice").await;
    assert_eq!(response.status_code().as_u16(), 404);

    let milestones: MilestonesResponse = as_user(server.get("/milestones"), "alice").await.json();
    assert!(milestones.milestones.is_empty());
}

// =============================================================================
// GUIDANCE TESTS
// =============================================================================

#[tokio::test]
async fn test_guidance_for_child() {
    let (server, _guard) = create_test_server();
    let id = create_child(&server, "alice", "Mira", "2024-01-01").await;

    let response = as_user(server.get(&format!("/children/{}/guidance", id)), "alice")
        .add_query_param("today", "2024-01-05")
        .await;

    response.assert_status_ok();
    let guidance: GuidanceResponse = response.json();
    assert_eq!(guidance.child_id, id);
    assert_eq!(guidance.stage, "Week 1");
    assert!(guidance.has_content);
    assert_eq!(guidance.window, vec!["Week 1", "Week 2"]);
    assert_eq!(guidance.sections.len(), 2);
    assert_eq!(guidance.sections[0].entries[0].description, "Lifts head briefly");
}

#[tokio::test]
async fn test_guidance_before_birth_rejected() {
    let (server, _guard) = create_test_server();
    let id = create_child(&server, "alice", "Mira", "2024-01-01").await;

    let response = as_user(server.get(&format!("/children/{}/guidance", id)), "alice")
        .add_query_param("today", "2023-12-01")
        .await;

    assert_eq!(response.status_code().as_u16(), 400);
}

#[tokio::test]
async fn test_guidance_for_unrelated_child_not_found() {
    let (server, _guard) = create_test_server();
    let id = create_child(&server, "alice", "Mira", "2024-01-01").await;

    let response = as_user(server.get(&format!("/children/{}/guidance", id)), "bob").await;
    assert_eq!(response.status_code().as_u16(), 404);
}

// =============================================================================
// MILESTONE TESTS
// =============================================================================

#[tokio::test]
async fn test_milestones_newest_first_with_child_name() {
    let (server, _guard) = create_test_server();
    let id = create_child(&server, "alice", "Mira", "2024-01-01").await;

    for (title, date) in [("First smile", "2024-02-01"), ("Rolled over", "2024-05-01")] {
        let response = as_user(server.post("/milestones"), "alice")
            .json(&json!({ "child_id": id, "title": title, "achieved_at": date }))
            .await;
        assert_eq!(response.status_code().as_u16(), 201);
    }

    let milestones: MilestonesResponse = as_user(server.get("/milestones"), "alice").await.json();
    assert_eq!(milestones.milestones.len(), 2);
    assert_eq!(milestones.milestones[0].milestone.title, "Rolled over");
    assert_eq!(milestones.milestones[1].milestone.title, "First smile");
    assert_eq!(milestones.milestones[0].child_name.as_deref(), Some("Mira"));
}

#[tokio::test]
async fn test_milestone_for_unrelated_child_not_found() {
    let (server, _guard) = create_test_server();
    let id = create_child(&server, "alice", "Mira", "2024-01-01").await;

    let response = as_user(server.post("/milestones"), "bob")
        .json(&json!({ "child_id": id, "title": "Sneaky", "achieved_at": "2024-02-01" }))
        .await;
    assert_eq!(response.status_code().as_u16(), 404);
}

#[tokio::test]
async fn test_milestone_update_and_delete() {
    let (server, _guard) = create_test_server();
    let id = create_child(&server, "alice", "Mira", "2024-01-01").await;

    let created: MilestoneResponse = as_user(server.post("/milestones"), "alice")
        .json(&json!({
            "child_id": id,
            "title": "First steps",
            "achieved_at": "2024-11-01T10:30:00Z",
            "photos": ["img/a.png", "img/b.png"],
        }))
        .await
        .json();
    let milestone_id = created.milestone.milestone.id.0;
    assert_eq!(created.milestone.milestone.photos.len(), 2);
    let path = format!("/milestones/{}", milestone_id);

    let updated: MilestoneResponse = as_user(server.put(&path), "alice")
        .json(&json!({ "description": "Three steps to the sofa", "photos": null }))
        .await
        .json();
    assert_eq!(
        updated.milestone.milestone.description.as_deref(),
        Some("Three steps to the sofa")
    );
    assert!(updated.milestone.milestone.photos.is_empty());
    assert_eq!(updated.milestone.milestone.title, "First steps");

    let response = as_user(server.get(&path), "bob").await;
    assert_eq!(response.status_code().as_u16(), 404);

    let response = as_user(server.delete(&path), "alice").await;
    response.assert_status_ok();

    let response = as_user(server.get(&path), "alice").await;
    assert_eq!(response.status_code().as_u16(), 404);
}

// =============================================================================
// ACTIVITY TESTS
// =============================================================================

#[tokio::test]
async fn test_activities_crud() {
    let (server, _guard) = create_test_server();
    let id = create_child(&server, "alice", "Mira", "2024-01-01").await;

    let response = as_user(server.post("/activities"), "alice")
        .json(&json!({
            "child_id": id,
            "title": "Tummy time",
            "duration_minutes": 15,
            "category": "play",
            "recorded_at": "2024-03-01",
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 201);
    let created: ActivityResponse = response.json();
    let path = format!("/activities/{}", created.activity.activity.id.0);

    as_user(server.post("/activities"), "alice")
        .json(&json!({
            "child_id": id,
            "title": "Park walk",
            "category": "outdoor",
            "recorded_at": "2024-03-05",
        }))
        .await;

    let activities: ActivitiesResponse = as_user(server.get("/activities"), "alice").await.json();
    assert_eq!(activities.activities.len(), 2);
    assert_eq!(activities.activities[0].activity.title, "Park walk");
    assert_eq!(activities.activities[1].child_name.as_deref(), Some("Mira"));

    let updated: ActivityResponse = as_user(server.put(&path), "alice")
        .json(&json!({ "duration_minutes": null, "category": "exercise" }))
        .await
        .json();
    assert_eq!(updated.activity.activity.duration_minutes, None);

    let response = as_user(server.get(&path), "alice").await;
    response.assert_status_ok();

    let response = as_user(server.delete(&path), "alice").await;
    response.assert_status_ok();
    let activities: ActivitiesResponse = as_user(server.get("/activities"), "alice").await.json();
    assert_eq!(activities.activities.len(), 1);
}

#[tokio::test]
async fn test_activity_duration_bounds() {
    let (server, _guard) = create_test_server();
    let id = create_child(&server, "alice", "Mira", "2024-01-01").await;

    let response = as_user(server.post("/activities"), "alice")
        .json(&json!({
            "child_id": id,
            "title": "Nap",
            "duration_minutes": 0,
            "category": "sleep",
            "recorded_at": "2024-03-01",
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);
}

// =============================================================================
// PROFILE / ONBOARDING TESTS
// =============================================================================

#[tokio::test]
async fn test_profile_absent_then_saved() {
    let (server, _guard) = create_test_server();

    let profile: ProfileResponse = as_user(server.get("/profile"), "alice").await.json();
    assert!(profile.profile.is_none());

    let response = as_user(server.put("/profile"), "alice")
        .json(&json!({ "display_name": "Asha", "language": "Tamil" }))
        .await;
    response.assert_status_ok();

    let profile = as_user(server.get("/profile"), "alice")
        .await
        .json::<ProfileResponse>()
        .profile
        .unwrap();
    assert_eq!(profile.display_name.as_deref(), Some("Asha"));
    assert_eq!(profile.language.as_str(), "Tamil");
    assert!(!profile.onboarding_completed);
}

#[tokio::test]
async fn test_onboarding_creates_profile_and_children() {
    let (server, _guard) = create_test_server();

    let response = as_user(server.post("/onboarding/complete"), "alice")
        .json(&json!({
            "phone": "+91 98765 43210",
            "language": "Hindi",
            "children": [
                {
                    "name": "Mira",
                    "date_of_birth": "2024-01-01",
                    "gender": "Female",
                    "relationship": "Mom",
                    "is_primary": false,
                },
                {
                    "name": "Arjun",
                    "date_of_birth": "2022-08-15",
                    "gender": "Male",
                    "relationship": "Mom",
                },
            ],
        }))
        .await;

    assert_eq!(response.status_code().as_u16(), 201);
    let outcome: OnboardingResponse = response.json();
    assert!(outcome.profile.onboarding_completed);
    assert_eq!(outcome.profile.phone.as_deref(), Some("+91 98765 43210"));
    assert_eq!(outcome.children.len(), 2);
    assert!(outcome.children.iter().all(|c| c.is_primary));

    let children: ChildrenResponse = as_user(server.get("/children"), "alice").await.json();
    assert_eq!(children.children.len(), 2);
}

#[tokio::test]
async fn test_onboarding_invalid_child_writes_nothing() {
    let (server, _guard) = create_test_server();

    let response = as_user(server.post("/onboarding/complete"), "alice")
        .json(&json!({
            "children": [
                { "name": "Mira", "date_of_birth": "2024-01-01", "gender": "Female", "relationship": "Mom" },
                { "name": "", "date_of_birth": "2024-01-01", "gender": "Female", "relationship": "Mom" },
            ],
        }))
        .await;
    assert_eq!(response.status_code().as_u16(), 400);

    let profile: ProfileResponse = as_user(server.get("/profile"), "alice").await.json();
    assert!(profile.profile.is_none());
    let children: ChildrenResponse = as_user(server.get("/children"), "alice").await.json();
    assert!(children.children.is_empty());
}

// =============================================================================
// ERROR HANDLING TESTS
// =============================================================================

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/unknown").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_method_not_allowed() {
    let (server, _guard) = create_test_server();

    let response = server.post("/health").await;
    assert_eq!(response.status_code().as_u16(), 405);
}

#[tokio::test]
async fn test_invalid_json_body() {
    let (server, _guard) = create_test_server();

    let response = as_user(server.post("/children"), "alice")
        .bytes(bytes::Bytes::from("not valid json"))
        .content_type("application/json")
        .await;

    assert!(response.status_code().is_client_error());
}

// =============================================================================
// AUTHENTICATION MIDDLEWARE TESTS
// =============================================================================

/// Create a test server with authentication enabled.
/// Must be called while holding AUTH_TEST_MUTEX.
fn create_auth_test_server(api_key: &str) -> TestServer {
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::set_var("SPROUT_API_KEY", api_key) };
    let state = AppState::new(Registry::new(), content());
    let router = create_router(state);
    TestServer::new(router).unwrap()
}

/// Clean up auth env var after test.
fn cleanup_auth_env() {
    // SAFETY: Tests run sequentially under AUTH_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("SPROUT_API_KEY") };
}

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let api_key = "test-secret-key-12345";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", api_key)
                .parse::<HeaderValue>()
                .unwrap(),
        )
        .await;

    cleanup_auth_env();

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert_eq!(status.child_count, 0);
}

#[tokio::test]
async fn test_auth_valid_raw_token() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let api_key = "test-raw-key-67890";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            api_key.parse::<HeaderValue>().unwrap(),
        )
        .await;

    cleanup_auth_env();

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let server = create_auth_test_server("correct-key");

    let response = server
        .get("/status")
        .add_header(
            axum::http::header::AUTHORIZATION,
            "Bearer wrong-key".parse::<HeaderValue>().unwrap(),
        )
        .await;

    cleanup_auth_env();

    assert_eq!(
        response.status_code().as_u16(),
        401,
        "Invalid token should return 401 Unauthorized"
    );
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let server = create_auth_test_server("required-key");

    let response = server.get("/status").await;

    cleanup_auth_env();

    assert_eq!(
        response.status_code().as_u16(),
        401,
        "Missing Authorization header should return 401 Unauthorized"
    );
}

#[tokio::test]
async fn test_auth_health_endpoint_bypasses_auth() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let server = create_auth_test_server("secret-key-for-bypass-test");

    let response = server.get("/health").await;

    cleanup_auth_env();

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn test_auth_key_and_user_both_required() {
    let _guard = AUTH_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    let api_key = "both-checks-key";
    let server = create_auth_test_server(api_key);
    let bearer = format!("Bearer {}", api_key).parse::<HeaderValue>().unwrap();

    let without_user = server
        .get("/children")
        .add_header(axum::http::header::AUTHORIZATION, bearer.clone())
        .await;
    let with_user = as_user(server.get("/children"), "alice")
        .add_header(axum::http::header::AUTHORIZATION, bearer)
        .await;

    cleanup_auth_env();

    assert_eq!(without_user.status_code().as_u16(), 401);
    with_user.assert_status_ok();
}
