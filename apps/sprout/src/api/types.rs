//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.
//!
//! Request bodies are converted into core inputs here, so handlers only deal
//! with validated `sprout_core` types. Update bodies distinguish an absent
//! field (leave unchanged) from an explicit `null` (clear).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sprout_core::{
    Activity, ActivityCategory, ActivityUpdate, AgeSpan, ChildId, ChildUpdate, ChildWithRelation,
    ContentRow, Gender, Guidance, Language, Milestone, MilestoneUpdate, NewActivity, NewChild,
    NewMilestone, OnboardingSubmission, ProfileUpdate, Relationship, SproutError, Stage,
    UserProfile, midnight_utc,
};

// =============================================================================
// FIELD HELPERS
// =============================================================================

/// Parse an RFC 3339 timestamp or a `YYYY-MM-DD` date (midnight UTC).
pub fn parse_instant(field: &str, value: &str) -> Result<DateTime<Utc>, SproutError> {
    let value = value.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(midnight_utc)
        .map_err(|_| {
            SproutError::InvalidInput(format!(
                "{} must be an RFC 3339 timestamp or YYYY-MM-DD date, got '{}'",
                field, value
            ))
        })
}

/// Maps a present JSON field (including `null`) to `Some`, leaving absent
/// fields to `#[serde(default)]`.
fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn default_true() -> bool {
    true
}

// =============================================================================
// GENERIC RESPONSES
// =============================================================================

/// Error body for every failed request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: msg.into(),
        }
    }
}

/// Acknowledgement for deletions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

impl DeleteResponse {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            success: true,
            message: msg.into(),
        }
    }
}

// =============================================================================
// HEALTH / STATUS
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Server status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub child_count: usize,
    pub persistent: bool,
    pub content_rows: usize,
    pub content_stages: usize,
}

// =============================================================================
// STAGES
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageCoverage {
    pub label: String,
    pub rows: usize,
}

/// The ordered stage list and how much content each stage has.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagesResponse {
    pub stages: Vec<StageCoverage>,
    pub unknown_labels: Vec<String>,
}

/// Query string for `GET /stage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageQuery {
    pub birth_date: String,
    pub today: Option<String>,
}

/// Query string for `GET /children/{id}/guidance`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GuidanceQuery {
    pub today: Option<String>,
}

/// Age counts plus a readable description.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeJson {
    pub days: i64,
    pub weeks: i64,
    pub months: i64,
    pub description: String,
}

impl From<&AgeSpan> for AgeJson {
    fn from(age: &AgeSpan) -> Self {
        Self {
            days: age.total_days,
            weeks: age.total_weeks,
            months: age.total_months,
            description: age.describe(),
        }
    }
}

/// Classification of an arbitrary birth date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResponse {
    pub success: bool,
    pub stage: String,
    pub next_stage: Option<String>,
    pub age: AgeJson,
    pub window: Vec<String>,
}

impl StageResponse {
    pub fn new(stage: Stage, age: &AgeSpan, window: &[Stage]) -> Self {
        Self {
            success: true,
            stage: stage.label().to_string(),
            next_stage: stage.next().map(|s| s.label().to_string()),
            age: AgeJson::from(age),
            window: window.iter().map(|s| s.label().to_string()).collect(),
        }
    }
}

/// Guidance for one child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidanceResponse {
    pub success: bool,
    pub child_id: u64,
    pub stage: String,
    pub age: AgeJson,
    pub window: Vec<String>,
    pub has_content: bool,
    pub sections: Vec<ContentRow>,
}

impl GuidanceResponse {
    pub fn new(child: ChildId, guidance: Guidance) -> Self {
        Self {
            success: true,
            child_id: child.0,
            stage: guidance.stage.label().to_string(),
            age: AgeJson::from(&guidance.age),
            window: guidance.window.iter().map(|s| s.label().to_string()).collect(),
            has_content: !guidance.is_empty(),
            sections: guidance.sections,
        }
    }
}

// =============================================================================
// CHILDREN
// =============================================================================

/// A child as returned to its related user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildJson {
    pub id: u64,
    pub name: String,
    pub date_of_birth: DateTime<Utc>,
    pub gender: Gender,
    pub head_circumference_cm: Option<f64>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub relationship: Relationship,
    pub is_primary: bool,
    pub relation_created_at: DateTime<Utc>,
    /// Current stage label; absent when the birth date is in the future.
    pub stage: Option<String>,
    pub age: Option<String>,
}

impl ChildJson {
    pub fn new(entry: ChildWithRelation, now: DateTime<Utc>) -> Self {
        let child = entry.child;
        let (stage, age) = if child.date_of_birth <= now {
            let span = AgeSpan::between(child.date_of_birth, now);
            (
                Some(Stage::for_age(&span).label().to_string()),
                Some(span.describe()),
            )
        } else {
            (None, None)
        };

        Self {
            id: child.id.0,
            name: child.name,
            date_of_birth: child.date_of_birth,
            gender: child.gender,
            head_circumference_cm: child.head_circumference_cm,
            height_cm: child.height_cm,
            weight_kg: child.weight_kg,
            profile_image: child.profile_image,
            created_at: child.created_at,
            updated_at: child.updated_at,
            relationship: entry.relationship,
            is_primary: entry.is_primary,
            relation_created_at: entry.relation_created_at,
            stage,
            age,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildResponse {
    pub success: bool,
    pub child: ChildJson,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChildrenResponse {
    pub success: bool,
    pub children: Vec<ChildJson>,
}

/// Body of `POST /children` and of each onboarding child.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChildRequest {
    pub name: String,
    pub date_of_birth: String,
    pub gender: Gender,
    #[serde(default)]
    pub head_circumference_cm: Option<f64>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub profile_image: Option<String>,
    pub relationship: Relationship,
    #[serde(default = "default_true")]
    pub is_primary: bool,
}

impl CreateChildRequest {
    pub fn to_new_child(&self) -> Result<NewChild, SproutError> {
        Ok(NewChild {
            name: self.name.clone(),
            date_of_birth: parse_instant("date_of_birth", &self.date_of_birth)?,
            gender: self.gender,
            head_circumference_cm: self.head_circumference_cm,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            profile_image: self.profile_image.clone(),
            relationship: self.relationship,
            is_primary: self.is_primary,
        })
    }
}

/// Body of `PUT /children/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateChildRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default, deserialize_with = "nullable")]
    pub head_circumference_cm: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub height_cm: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub weight_kg: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub profile_image: Option<Option<String>>,
    #[serde(default)]
    pub relationship: Option<Relationship>,
    #[serde(default)]
    pub is_primary: Option<bool>,
}

impl UpdateChildRequest {
    pub fn to_update(&self) -> Result<ChildUpdate, SproutError> {
        Ok(ChildUpdate {
            name: self.name.clone(),
            date_of_birth: self
                .date_of_birth
                .as_deref()
                .map(|d| parse_instant("date_of_birth", d))
                .transpose()?,
            gender: self.gender,
            head_circumference_cm: self.head_circumference_cm,
            height_cm: self.height_cm,
            weight_kg: self.weight_kg,
            profile_image: self.profile_image.clone(),
            relationship: self.relationship,
            is_primary: self.is_primary,
        })
    }
}

// =============================================================================
// MILESTONES
// =============================================================================

/// A milestone, with the child's name when listed across children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneJson {
    #[serde(flatten)]
    pub milestone: Milestone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestoneResponse {
    pub success: bool,
    pub milestone: MilestoneJson,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MilestonesResponse {
    pub success: bool,
    pub milestones: Vec<MilestoneJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMilestoneRequest {
    pub child_id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub achieved_at: String,
    #[serde(default)]
    pub photos: Vec<String>,
}

impl CreateMilestoneRequest {
    pub fn to_new_milestone(&self) -> Result<NewMilestone, SproutError> {
        Ok(NewMilestone {
            child_id: ChildId(self.child_id),
            title: self.title.clone(),
            description: self.description.clone(),
            achieved_at: parse_instant("achieved_at", &self.achieved_at)?,
            photos: self.photos.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMilestoneRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub achieved_at: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub photos: Option<Option<Vec<String>>>,
}

impl UpdateMilestoneRequest {
    pub fn to_update(&self) -> Result<MilestoneUpdate, SproutError> {
        Ok(MilestoneUpdate {
            title: self.title.clone(),
            description: self.description.clone(),
            achieved_at: self
                .achieved_at
                .as_deref()
                .map(|d| parse_instant("achieved_at", d))
                .transpose()?,
            // null clears the photo list
            photos: self.photos.clone().map(Option::unwrap_or_default),
        })
    }
}

// =============================================================================
// ACTIVITIES
// =============================================================================

/// An activity, with the child's name when listed across children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityJson {
    #[serde(flatten)]
    pub activity: Activity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityResponse {
    pub success: bool,
    pub activity: ActivityJson,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitiesResponse {
    pub success: bool,
    pub activities: Vec<ActivityJson>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateActivityRequest {
    pub child_id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    pub category: ActivityCategory,
    pub recorded_at: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl CreateActivityRequest {
    pub fn to_new_activity(&self) -> Result<NewActivity, SproutError> {
        Ok(NewActivity {
            child_id: ChildId(self.child_id),
            title: self.title.clone(),
            description: self.description.clone(),
            duration_minutes: self.duration_minutes,
            category: self.category,
            recorded_at: parse_instant("recorded_at", &self.recorded_at)?,
            image: self.image.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateActivityRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub duration_minutes: Option<Option<u32>>,
    #[serde(default)]
    pub category: Option<ActivityCategory>,
    #[serde(default)]
    pub recorded_at: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub image: Option<Option<String>>,
}

impl UpdateActivityRequest {
    pub fn to_update(&self) -> Result<ActivityUpdate, SproutError> {
        Ok(ActivityUpdate {
            title: self.title.clone(),
            description: self.description.clone(),
            duration_minutes: self.duration_minutes,
            category: self.category,
            recorded_at: self
                .recorded_at
                .as_deref()
                .map(|d| parse_instant("recorded_at", d))
                .transpose()?,
            image: self.image.clone(),
        })
    }
}

// =============================================================================
// PROFILE / ONBOARDING
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub success: bool,
    /// `None` until the user first saves a profile or completes onboarding.
    pub profile: Option<UserProfile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default, deserialize_with = "nullable")]
    pub display_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default)]
    pub language: Option<Language>,
    #[serde(default, deserialize_with = "nullable")]
    pub avatar: Option<Option<String>>,
}

impl UpdateProfileRequest {
    pub fn to_update(&self) -> ProfileUpdate {
        ProfileUpdate {
            display_name: self.display_name.clone(),
            phone: self.phone.clone(),
            language: self.language,
            avatar: self.avatar.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingRequest {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub children: Vec<CreateChildRequest>,
}

impl OnboardingRequest {
    pub fn to_submission(&self) -> Result<OnboardingSubmission, SproutError> {
        Ok(OnboardingSubmission {
            phone: self.phone.clone(),
            language: self.language,
            children: self
                .children
                .iter()
                .map(CreateChildRequest::to_new_child)
                .collect::<Result<Vec<_>, _>>()?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnboardingResponse {
    pub success: bool,
    pub profile: UserProfile,
    pub children: Vec<ChildJson>,
}
