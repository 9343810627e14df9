use serde::Serialize;

use crate::profile::models::{InterviewSession, PerformanceMetrics, UserProfile};

/// Number of recent sessions and CV gaps surfaced on the dashboard.
const DASHBOARD_LIST_LIMIT: usize = 5;

/// Recomputes the session-derived metrics.
///
/// `average_score` is the mean of every session's `average_score`, where a session without a
/// score counts as 0 (it is kept in the denominator). Skill scores and improvement areas are
/// carried over from `previous` unchanged.
pub fn derive_metrics(
    sessions: &[InterviewSession],
    previous: &PerformanceMetrics,
) -> PerformanceMetrics {
    let sessions_completed = sessions.len();
    let average_score = if sessions_completed == 0 {
        0.0
    } else {
        let total: f64 = sessions.iter().map(|s| s.average_score.unwrap_or(0.0)).sum();
        total / sessions_completed as f64
    };

    PerformanceMetrics {
        average_score,
        skill_scores: previous.skill_scores.clone(),
        improvement_areas: previous.improvement_areas.clone(),
        sessions_completed,
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: String,
    pub field: String,
    pub date: String,
    pub question_count: usize,
    pub average_score: Option<i64>,
}

/// Headline numbers shown on the progress dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub role: String,
    pub organization: Option<String>,
    pub is_complete: bool,
    pub sessions_completed: usize,
    /// Rounded to the nearest whole point.
    pub average_score: i64,
    pub skills_improved: usize,
    pub jobs_matched: usize,
    pub jobs_applied: usize,
    /// Newest first.
    pub recent_sessions: Vec<SessionSummary>,
    pub top_gaps: Vec<String>,
}

pub fn compute_dashboard_stats(profile: &UserProfile) -> DashboardStats {
    let metrics = &profile.performance_metrics;

    let recent_sessions = profile
        .interview_sessions
        .iter()
        .rev()
        .take(DASHBOARD_LIST_LIMIT)
        .map(|s| SessionSummary {
            id: s.id.clone(),
            field: s.field.clone(),
            date: s.date.clone(),
            question_count: s.questions.len(),
            average_score: s.average_score.map(|v| v.round() as i64),
        })
        .collect();

    let top_gaps = profile
        .cv_analysis
        .as_ref()
        .map(|cv| cv.gaps.iter().take(DASHBOARD_LIST_LIMIT).cloned().collect())
        .unwrap_or_default();

    DashboardStats {
        role: profile.role.clone(),
        organization: profile.organization.clone().filter(|o| !o.is_empty()),
        is_complete: profile.is_complete(),
        sessions_completed: metrics.sessions_completed,
        average_score: metrics.average_score.round() as i64,
        skills_improved: metrics.improvement_areas.len(),
        jobs_matched: profile.matched_jobs.len(),
        jobs_applied: profile.applied_jobs.len(),
        recent_sessions,
        top_gaps,
    }
}
