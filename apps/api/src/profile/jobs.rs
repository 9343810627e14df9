//! Job match helpers: merge by URL, fit tiers and description summaries.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;

use crate::profile::models::JobMatch;

const STRONG_MATCH_MIN: f64 = 70.0;
const MODERATE_MATCH_MIN: f64 = 50.0;
const SUMMARY_MAX_ITEMS: usize = 5;
const SUMMARY_MAX_CHARS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Strong,
    Moderate,
    Weak,
}

impl JobMatch {
    pub fn tier(&self) -> MatchTier {
        match self.match_score {
            s if s >= STRONG_MATCH_MIN => MatchTier::Strong,
            s if s >= MODERATE_MATCH_MIN => MatchTier::Moderate,
            _ => MatchTier::Weak,
        }
    }
}

/// Appends the jobs from `incoming` whose URL is not yet in `existing`, keeping input order.
/// Duplicates within `incoming` itself are also dropped (first wins).
/// Returns the number of jobs appended.
pub fn merge_jobs(existing: &mut Vec<JobMatch>, incoming: Vec<JobMatch>) -> usize {
    let mut seen: HashSet<String> = existing.iter().map(|j| j.job_url.clone()).collect();
    let before = existing.len();
    for job in incoming {
        if seen.insert(job.job_url.clone()) {
            existing.push(job);
        }
    }
    existing.len() - before
}

/// Drops later entries whose URL repeats an earlier one.
pub fn dedup_jobs(jobs: Vec<JobMatch>) -> Vec<JobMatch> {
    let mut merged = Vec::with_capacity(jobs.len());
    merge_jobs(&mut merged, jobs);
    merged
}

/// Turns a scraped job description into at most five display bullets.
///
/// Descriptions scraped as structured markup arrive as JSON shaped
/// `{"div": [{"ul": [{"li": [...]}]}]}`; list items are either strings or `{"_value": "..."}`.
/// Anything else is truncated to 200 characters with a trailing ellipsis.
pub fn summarize_job_description(description: &str) -> Vec<String> {
    if let Some(items) = structured_list_items(description) {
        return items;
    }
    let head: String = description.chars().take(SUMMARY_MAX_CHARS).collect();
    vec![format!("{head}...")]
}

fn structured_list_items(description: &str) -> Option<Vec<String>> {
    let parsed: Value = serde_json::from_str(description).ok()?;
    let items = parsed
        .get("div")?
        .get(0)?
        .get("ul")?
        .get(0)?
        .get("li")?
        .as_array()?;

    Some(
        items
            .iter()
            .take(SUMMARY_MAX_ITEMS)
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other
                    .get("_value")
                    .and_then(|v| v.as_str())
                    .map(String::from)
                    .unwrap_or_else(|| other.to_string()),
            })
            .collect(),
    )
}
