//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Handlers read the clock once per request and pass it down; the core never
//! reads time itself. Every record endpoint is scoped to the [`CurrentUser`].

use super::{
    AppState,
    auth::CurrentUser,
    types::{
        ActivitiesResponse, ActivityJson, ActivityResponse, ChildJson, ChildResponse,
        ChildrenResponse, CreateActivityRequest, CreateChildRequest, CreateMilestoneRequest,
        DeleteResponse, ErrorResponse, GuidanceQuery, GuidanceResponse, HealthResponse,
        MilestoneJson, MilestoneResponse, MilestonesResponse, OnboardingRequest,
        OnboardingResponse, ProfileResponse, StageCoverage, StageQuery, StageResponse,
        StagesResponse, StatusResponse, UpdateActivityRequest, UpdateChildRequest,
        UpdateMilestoneRequest, UpdateProfileRequest, parse_instant,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use sprout_core::{ActivityId, AgeSpan, ChildId, MilestoneId, SproutError, Stage};

// =============================================================================
// ERROR MAPPING
// =============================================================================

/// A core error on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub SproutError);

impl From<SproutError> for ApiError {
    fn from(err: SproutError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SproutError::InvalidInput(_)
            | SproutError::BirthDateInFuture
            | SproutError::ContentError(_) => StatusCode::BAD_REQUEST,
            err if err.is_not_found() => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "Request failed");
            "Internal server error".to_string()
        } else {
            self.0.to_string()
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Resolve an optional `today` parameter against the wall clock.
fn reference_instant(today: Option<&str>) -> Result<DateTime<Utc>, SproutError> {
    match today {
        Some(value) => parse_instant("today", value),
        None => Ok(Utc::now()),
    }
}

// =============================================================================
// HEALTH / STATUS HANDLERS
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Record counts and content coverage.
pub async fn status_handler(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let registry = state.registry.read().await;

    let response = StatusResponse {
        child_count: registry.child_count()?,
        persistent: registry.is_persistent(),
        content_rows: state.content.len(),
        content_stages: state.content.stage_labels().len(),
    };

    Ok((StatusCode::OK, Json(response)))
}

// =============================================================================
// STAGE HANDLERS
// =============================================================================

/// List every stage in order with its content row count.
pub async fn stages_handler(State(state): State<AppState>) -> impl IntoResponse {
    let stages = state
        .content
        .coverage()
        .into_iter()
        .map(|(stage, rows)| StageCoverage {
            label: stage.label().to_string(),
            rows,
        })
        .collect();
    let unknown_labels = state
        .content
        .unknown_stages()
        .into_iter()
        .map(str::to_string)
        .collect();

    Json(StagesResponse {
        stages,
        unknown_labels,
    })
}

/// Classify an arbitrary birth date.
pub async fn stage_handler(
    State(state): State<AppState>,
    Query(query): Query<StageQuery>,
) -> ApiResult<impl IntoResponse> {
    let birth = parse_instant("birth_date", &query.birth_date)?;
    let now = reference_instant(query.today.as_deref())?;
    if birth > now {
        return Err(SproutError::BirthDateInFuture.into());
    }

    let age = AgeSpan::between(birth, now);
    let stage = Stage::for_age(&age);
    let window = stage.relevant_window(state.content.as_ref());

    Ok(Json(StageResponse::new(stage, &age, &window)))
}

// =============================================================================
// CHILD HANDLERS
// =============================================================================

pub async fn list_children_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let now = Utc::now();
    let registry = state.registry.read().await;
    let children = registry
        .list_children(&user)?
        .into_iter()
        .map(|entry| ChildJson::new(entry, now))
        .collect();

    Ok(Json(ChildrenResponse {
        success: true,
        children,
    }))
}

pub async fn create_child_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateChildRequest>,
) -> ApiResult<impl IntoResponse> {
    let new = request.to_new_child()?;
    let now = Utc::now();

    let mut registry = state.registry.write().await;
    let created = registry.create_child(&user, new, now)?;
    tracing::info!(event = "child_created", child = created.child.id.0, user = %user);

    Ok((
        StatusCode::CREATED,
        Json(ChildResponse {
            success: true,
            child: ChildJson::new(created, now),
        }),
    ))
}

pub async fn get_child_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> ApiResult<impl IntoResponse> {
    let registry = state.registry.read().await;
    let entry = registry.get_child(&user, ChildId(id))?;

    Ok(Json(ChildResponse {
        success: true,
        child: ChildJson::new(entry, Utc::now()),
    }))
}

pub async fn update_child_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
    Json(request): Json<UpdateChildRequest>,
) -> ApiResult<impl IntoResponse> {
    let update = request.to_update()?;
    let now = Utc::now();

    let mut registry = state.registry.write().await;
    let updated = registry.update_child(&user, ChildId(id), update, now)?;

    Ok(Json(ChildResponse {
        success: true,
        child: ChildJson::new(updated, now),
    }))
}

/// Remove the caller's relation to a child; the child goes with its last relation.
pub async fn delete_child_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> ApiResult<impl IntoResponse> {
    let mut registry = state.registry.write().await;
    let removed = registry.delete_child(&user, ChildId(id))?;
    let (event, message) = delete_outcome(removed);
    tracing::info!(event, child = id, user = %user);

    Ok(Json(DeleteResponse::new(message)))
}

/// Log event and response message for a child deletion.
fn delete_outcome(removed: bool) -> (&'static str, &'static str) {
    if removed {
        ("child_deleted", "Child deleted")
    } else {
        ("child_unlinked", "Child unlinked")
    }
}

/// Stage, window and content sections for one of the caller's children.
pub async fn guidance_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
    Query(query): Query<GuidanceQuery>,
) -> ApiResult<impl IntoResponse> {
    let now = reference_instant(query.today.as_deref())?;
    let registry = state.registry.read().await;
    let guidance = registry.guidance(&user, ChildId(id), now, &state.content)?;

    Ok(Json(GuidanceResponse::new(ChildId(id), guidance)))
}

// =============================================================================
// MILESTONE HANDLERS
// =============================================================================

pub async fn list_milestones_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let registry = state.registry.read().await;
    let milestones = registry
        .list_milestones(&user)?
        .into_iter()
        .map(|entry| MilestoneJson {
            milestone: entry.milestone,
            child_name: Some(entry.child_name),
        })
        .collect();

    Ok(Json(MilestonesResponse {
        success: true,
        milestones,
    }))
}

pub async fn create_milestone_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateMilestoneRequest>,
) -> ApiResult<impl IntoResponse> {
    let new = request.to_new_milestone()?;

    let mut registry = state.registry.write().await;
    let milestone = registry.create_milestone(&user, new, Utc::now())?;
    tracing::info!(
        event = "milestone_created",
        milestone = milestone.id.0,
        child = milestone.child_id.0
    );

    Ok((
        StatusCode::CREATED,
        Json(MilestoneResponse {
            success: true,
            milestone: MilestoneJson {
                milestone,
                child_name: None,
            },
        }),
    ))
}

pub async fn get_milestone_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> ApiResult<impl IntoResponse> {
    let registry = state.registry.read().await;
    let milestone = registry.get_milestone(&user, MilestoneId(id))?;

    Ok(Json(MilestoneResponse {
        success: true,
        milestone: MilestoneJson {
            milestone,
            child_name: None,
        },
    }))
}

pub async fn update_milestone_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
    Json(request): Json<UpdateMilestoneRequest>,
) -> ApiResult<impl IntoResponse> {
    let update = request.to_update()?;

    let mut registry = state.registry.write().await;
    let milestone = registry.update_milestone(&user, MilestoneId(id), update, Utc::now())?;

    Ok(Json(MilestoneResponse {
        success: true,
        milestone: MilestoneJson {
            milestone,
            child_name: None,
        },
    }))
}

pub async fn delete_milestone_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> ApiResult<impl IntoResponse> {
    let mut registry = state.registry.write().await;
    registry.delete_milestone(&user, MilestoneId(id))?;

    Ok(Json(DeleteResponse::new("Milestone deleted")))
}

// =============================================================================
// ACTIVITY HANDLERS
// =============================================================================

pub async fn list_activities_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let registry = state.registry.read().await;
    let activities = registry
        .list_activities(&user)?
        .into_iter()
        .map(|entry| ActivityJson {
            activity: entry.activity,
            child_name: Some(entry.child_name),
        })
        .collect();

    Ok(Json(ActivitiesResponse {
        success: true,
        activities,
    }))
}

pub async fn create_activity_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<CreateActivityRequest>,
) -> ApiResult<impl IntoResponse> {
    let new = request.to_new_activity()?;

    let mut registry = state.registry.write().await;
    let activity = registry.create_activity(&user, new, Utc::now())?;
    tracing::info!(
        event = "activity_created",
        activity = activity.id.0,
        child = activity.child_id.0
    );

    Ok((
        StatusCode::CREATED,
        Json(ActivityResponse {
            success: true,
            activity: ActivityJson {
                activity,
                child_name: None,
            },
        }),
    ))
}

pub async fn get_activity_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> ApiResult<impl IntoResponse> {
    let registry = state.registry.read().await;
    let activity = registry.get_activity(&user, ActivityId(id))?;

    Ok(Json(ActivityResponse {
        success: true,
        activity: ActivityJson {
            activity,
            child_name: None,
        },
    }))
}

pub async fn update_activity_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
    Json(request): Json<UpdateActivityRequest>,
) -> ApiResult<impl IntoResponse> {
    let update = request.to_update()?;

    let mut registry = state.registry.write().await;
    let activity = registry.update_activity(&user, ActivityId(id), update, Utc::now())?;

    Ok(Json(ActivityResponse {
        success: true,
        activity: ActivityJson {
            activity,
            child_name: None,
        },
    }))
}

pub async fn delete_activity_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<u64>,
) -> ApiResult<impl IntoResponse> {
    let mut registry = state.registry.write().await;
    registry.delete_activity(&user, ActivityId(id))?;

    Ok(Json(DeleteResponse::new("Activity deleted")))
}

// =============================================================================
// PROFILE / ONBOARDING HANDLERS
// =============================================================================

pub async fn get_profile_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<impl IntoResponse> {
    let registry = state.registry.read().await;
    let profile = registry.profile(&user)?;

    Ok(Json(ProfileResponse {
        success: true,
        profile,
    }))
}

pub async fn update_profile_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> ApiResult<impl IntoResponse> {
    let mut registry = state.registry.write().await;
    let profile = registry.update_profile(&user, request.to_update(), Utc::now())?;

    Ok(Json(ProfileResponse {
        success: true,
        profile: Some(profile),
    }))
}

/// Save the profile and register the first children in one request.
pub async fn onboarding_handler(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<OnboardingRequest>,
) -> ApiResult<impl IntoResponse> {
    let submission = request.to_submission()?;
    let now = Utc::now();

    let mut registry = state.registry.write().await;
    let outcome = registry.complete_onboarding(&user, submission, now)?;
    tracing::info!(event = "onboarding_completed", user = %user, children = outcome.children.len());

    Ok((
        StatusCode::CREATED,
        Json(OnboardingResponse {
            success: true,
            profile: outcome.profile,
            children: outcome
                .children
                .into_iter()
                .map(|entry| ChildJson::new(entry, now))
                .collect(),
        }),
    ))
}
