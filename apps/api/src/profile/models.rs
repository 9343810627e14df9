use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of the remote CV analysis, cached on the profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CvAnalysis {
    pub extracted_skills: Vec<String>,
    pub experience: Vec<String>,
    pub gaps: Vec<String>,
    pub summary: Option<String>,
}

/// A single question asked during a practice session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionQuestion {
    pub id: String,
    #[serde(rename = "type")]
    pub question_type: String,
    #[serde(rename = "question")]
    pub question_text: String,
    #[serde(rename = "answer", default, skip_serializing_if = "Option::is_none")]
    pub answer_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(rename = "feedback", default, skip_serializing_if = "Option::is_none")]
    pub feedback_text: Option<String>,
}

/// One completed interview-practice attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSession {
    pub id: String,
    /// Kept as stored. New sessions use RFC 3339 with millisecond precision; older records may
    /// carry any date string.
    pub date: String,
    pub field: String,
    #[serde(default)]
    pub questions: Vec<SessionQuestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_score: Option<f64>,
}

/// Aggregates over the session history. `average_score` and `sessions_completed` are always
/// derived from `interview_sessions`; the other two are supplied by the UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PerformanceMetrics {
    pub average_score: f64,
    pub skill_scores: BTreeMap<String, f64>,
    pub improvement_areas: Vec<String>,
    pub sessions_completed: usize,
}

/// A recommended job posting with its fit score against the profile. Identity is `job_url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMatch {
    pub job_url: String,
    pub job_name: String,
    pub company_name: String,
    #[serde(rename = "matchScore")]
    pub match_score: f64,
    #[serde(rename = "requiredSkills", default)]
    pub required_skills: Vec<String>,
    #[serde(rename = "missingSkills", default)]
    pub missing_skills: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_requirement: Option<String>,
}

/// The client's accumulated coaching state. There is exactly one per store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub role: String,
    pub organization: Option<String>,
    pub experience_years: Option<f64>,
    pub selected_skills: Vec<String>,
    pub selected_tasks: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cv_analysis: Option<CvAnalysis>,
    pub interview_sessions: Vec<InterviewSession>,
    pub performance_metrics: PerformanceMetrics,
    pub matched_jobs: Vec<JobMatch>,
    pub applied_jobs: Vec<String>,
    pub profile_created_at: DateTime<Utc>,
    pub last_updated_at: DateTime<Utc>,
}

/// Minimum number of selected skills for a profile to count as complete.
pub const MIN_COMPLETE_SKILLS: usize = 3;

impl UserProfile {
    /// A fresh profile stamped with `now`.
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            role: String::new(),
            organization: None,
            experience_years: None,
            selected_skills: Vec::new(),
            selected_tasks: Vec::new(),
            cv_analysis: None,
            interview_sessions: Vec::new(),
            performance_metrics: PerformanceMetrics::default(),
            matched_jobs: Vec::new(),
            applied_jobs: Vec::new(),
            profile_created_at: now,
            last_updated_at: now,
        }
    }

    /// Role set and at least three skills selected. Any non-empty role counts.
    pub fn is_complete(&self) -> bool {
        !self.role.is_empty() && self.selected_skills.len() >= MIN_COMPLETE_SKILLS
    }

    pub fn has_applied(&self, job_url: &str) -> bool {
        self.applied_jobs.iter().any(|u| u == job_url)
    }

    pub fn has_session(&self, session_id: &str) -> bool {
        self.interview_sessions.iter().any(|s| s.id == session_id)
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self::empty(Utc::now())
    }
}

/// Partial update merged shallowly into the profile. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub role: Option<String>,
    pub organization: Option<String>,
    pub experience_years: Option<f64>,
    pub selected_skills: Option<Vec<String>>,
    pub selected_tasks: Option<Vec<String>>,
    pub cv_analysis: Option<CvAnalysis>,
    pub interview_sessions: Option<Vec<InterviewSession>>,
    pub performance_metrics: Option<PerformanceMetrics>,
    pub matched_jobs: Option<Vec<JobMatch>>,
    pub applied_jobs: Option<Vec<String>>,
}
