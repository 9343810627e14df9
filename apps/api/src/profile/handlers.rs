use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::profile::jobs::{summarize_job_description, MatchTier};
use crate::profile::metrics::{compute_dashboard_stats, DashboardStats};
use crate::profile::models::{
    InterviewSession, JobMatch, ProfileUpdate, SessionQuestion, UserProfile,
};
use crate::profile::store::ProfileStore;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub profile: UserProfile,
    pub is_complete: bool,
}

impl From<&UserProfile> for ProfileResponse {
    fn from(profile: &UserProfile) -> Self {
        Self {
            profile: profile.clone(),
            is_complete: profile.is_complete(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletenessResponse {
    pub is_complete: bool,
}

/// A session as submitted by the practice page. `id` and `date` are filled in when absent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub id: Option<String>,
    pub date: Option<String>,
    pub field: String,
    #[serde(default)]
    pub questions: Vec<SessionQuestion>,
    pub average_score: Option<f64>,
}

impl SessionRequest {
    fn into_session(self, now: DateTime<Utc>) -> InterviewSession {
        InterviewSession {
            id: self
                .id
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            date: self
                .date
                .filter(|date| !date.trim().is_empty())
                .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true)),
            field: self.field,
            questions: self.questions,
            average_score: self.average_score,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct MatchedJobsRequest {
    pub jobs: Vec<JobMatch>,
}

#[derive(Debug, Deserialize)]
pub struct ApplyRequest {
    pub job_url: String,
}

/// A matched job decorated for display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    #[serde(flatten)]
    pub job: JobMatch,
    pub tier: MatchTier,
    pub applied: bool,
    pub highlights: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobsResponse {
    pub jobs: Vec<JobView>,
    pub applied_count: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// Runs a mutating store operation on the blocking pool; file storage fsyncs and renames.
/// The store lock is held until the operation returns.
async fn with_store<T, F>(state: &AppState, op: F) -> Result<T, AppError>
where
    F: FnOnce(&mut ProfileStore) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let mut store = state.store.clone().lock_owned().await;
    tokio::task::spawn_blocking(move || op(&mut store))
        .await
        .map_err(|e| AppError::Storage(format!("store task failed: {e}")))?
}

/// GET /api/v1/profile
pub async fn handle_get_profile(State(state): State<AppState>) -> Json<ProfileResponse> {
    let mut store = state.store.lock().await;
    Json(ProfileResponse::from(store.profile()))
}

/// PATCH /api/v1/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<ProfileResponse>, AppError> {
    let response = with_store(&state, move |store| {
        Ok(ProfileResponse::from(store.update(update)?))
    })
    .await?;
    Ok(Json(response))
}

/// DELETE /api/v1/profile
pub async fn handle_clear_profile(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    with_store(&state, |store| {
        store.clear()?;
        Ok(())
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/profile/completeness
pub async fn handle_completeness(State(state): State<AppState>) -> Json<CompletenessResponse> {
    let mut store = state.store.lock().await;
    Json(CompletenessResponse {
        is_complete: store.is_complete(),
    })
}

/// GET /api/v1/profile/dashboard
pub async fn handle_dashboard(State(state): State<AppState>) -> Json<DashboardStats> {
    let mut store = state.store.lock().await;
    Json(compute_dashboard_stats(store.profile()))
}

/// POST /api/v1/profile/sessions
pub async fn handle_add_session(
    State(state): State<AppState>,
    Json(request): Json<SessionRequest>,
) -> Result<(StatusCode, Json<ProfileResponse>), AppError> {
    if request.field.trim().is_empty() {
        return Err(AppError::Validation("field cannot be empty".to_string()));
    }

    let session = request.into_session(Utc::now());
    let response = with_store(&state, move |store| {
        Ok(ProfileResponse::from(store.add_session(session)?))
    })
    .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /api/v1/profile/jobs
pub async fn handle_list_jobs(State(state): State<AppState>) -> Json<JobsResponse> {
    let mut store = state.store.lock().await;
    let profile = store.profile();

    let jobs = profile
        .matched_jobs
        .iter()
        .map(|job| JobView {
            tier: job.tier(),
            applied: profile.has_applied(&job.job_url),
            highlights: job
                .job_description
                .as_deref()
                .map(summarize_job_description)
                .unwrap_or_default(),
            job: job.clone(),
        })
        .collect();

    Json(JobsResponse {
        jobs,
        applied_count: profile.applied_jobs.len(),
    })
}

/// POST /api/v1/profile/jobs
pub async fn handle_add_matched_jobs(
    State(state): State<AppState>,
    Json(request): Json<MatchedJobsRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    if let Some(job) = request.jobs.iter().find(|j| j.job_url.trim().is_empty()) {
        return Err(AppError::Validation(format!(
            "job '{}' has an empty job_url",
            job.job_name
        )));
    }

    let response = with_store(&state, move |store| {
        Ok(ProfileResponse::from(store.add_matched_jobs(request.jobs)?))
    })
    .await?;
    Ok(Json(response))
}

/// POST /api/v1/profile/jobs/apply
pub async fn handle_apply_to_job(
    State(state): State<AppState>,
    Json(request): Json<ApplyRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    if request.job_url.trim().is_empty() {
        return Err(AppError::Validation("job_url cannot be empty".to_string()));
    }

    let response = with_store(&state, move |store| {
        Ok(ProfileResponse::from(store.apply_to_job(&request.job_url)?))
    })
    .await?;
    Ok(Json(response))
}
