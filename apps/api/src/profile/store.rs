//! Profile store: the single owner of the client's coaching state.
//!
//! Two states: `Unloaded` and `Loaded`. `load()` is the only transition that reads storage.
//! Every other operation works on a loaded profile; called out of order it first moves to
//! `Loaded` with an empty profile (storage is not consulted).
//!
//! Every mutation is applied in memory and then written through immediately. There is no
//! batching and no cross-process coordination: the last write wins.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::profile::jobs::{dedup_jobs, merge_jobs};
use crate::profile::metrics::derive_metrics;
use crate::profile::models::{InterviewSession, JobMatch, ProfileUpdate, UserProfile};
use crate::profile::storage::{ProfileStorage, StorageError};
use crate::profile::versioning::{self, CURRENT_SCHEMA_VERSION};

/// Fixed storage key of the persisted profile.
pub const PROFILE_STORAGE_KEY: &str = "careercoach_user_profile";

#[derive(Debug, Error)]
pub enum StoreError {
    /// The in-memory profile was updated but could not be written through.
    #[error("Failed to persist profile: {0}")]
    Persist(#[from] StorageError),

    #[error("Session '{0}' already recorded")]
    DuplicateSession(String),
}

/// Where an undecodable record is copied before it is overwritten.
pub const PROFILE_BACKUP_KEY: &str = "careercoach_user_profile_unreadable";

/// Outcome of reading the stored record.
enum Persisted {
    Found(UserProfile),
    Absent,
    Undecodable(String),
    Unavailable,
}

#[derive(Debug)]
enum StoreState {
    Unloaded,
    Loaded(UserProfile),
}

pub struct ProfileStore {
    storage: Box<dyn ProfileStorage>,
    state: StoreState,
}

impl ProfileStore {
    pub fn new(storage: Box<dyn ProfileStorage>) -> Self {
        Self {
            storage,
            state: StoreState::Unloaded,
        }
    }

    #[cfg(test)]
    pub fn is_loaded(&self) -> bool {
        matches!(self.state, StoreState::Loaded(_))
    }

    /// Reads the persisted profile. Never fails.
    ///
    /// An absent record is replaced by a fresh empty profile, which is written back. A record that
    /// cannot be decoded (corrupt, or written by a newer schema) is copied to
    /// [`PROFILE_BACKUP_KEY`] before the empty profile replaces it. A storage read error yields an
    /// empty profile in memory only; nothing is written until the next mutation.
    pub fn load(&mut self) -> &UserProfile {
        let profile = match self.read_persisted() {
            Persisted::Found(profile) => profile,
            Persisted::Absent => self.fresh_profile(),
            Persisted::Undecodable(raw) => {
                match self.storage.set(PROFILE_BACKUP_KEY, &raw) {
                    Ok(()) => {
                        warn!("Unreadable profile record moved aside to '{PROFILE_BACKUP_KEY}'");
                        self.fresh_profile()
                    }
                    Err(e) => {
                        error!("Failed to back up unreadable profile, leaving it in place: {e}");
                        UserProfile::empty(Utc::now())
                    }
                }
            }
            Persisted::Unavailable => UserProfile::empty(Utc::now()),
        };

        info!(
            "Profile loaded: role='{}', {} sessions, {} matched jobs",
            profile.role,
            profile.interview_sessions.len(),
            profile.matched_jobs.len()
        );
        self.state = StoreState::Loaded(profile);
        self.loaded_mut()
    }

    fn fresh_profile(&self) -> UserProfile {
        let profile = UserProfile::empty(Utc::now());
        if let Err(e) = self.persist(&profile) {
            error!("Failed to persist new empty profile: {e}");
        }
        profile
    }

    fn read_persisted(&self) -> Persisted {
        let raw = match self.storage.get(PROFILE_STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!("No stored profile found, starting empty");
                return Persisted::Absent;
            }
            Err(e) => {
                warn!("Error reading profile, starting empty: {e}");
                return Persisted::Unavailable;
            }
        };

        match versioning::decode(&raw) {
            Ok(decoded) => {
                if decoded.schema_version < CURRENT_SCHEMA_VERSION {
                    info!(
                        "Migrating stored profile from schema v{} to v{}",
                        decoded.schema_version, CURRENT_SCHEMA_VERSION
                    );
                }
                Persisted::Found(decoded.profile)
            }
            Err(e) => {
                warn!("Error loading profile, starting empty: {e}");
                Persisted::Undecodable(raw)
            }
        }
    }

    /// Current snapshot.
    pub fn profile(&mut self) -> &UserProfile {
        self.loaded_mut()
    }

    /// Role set and at least three skills selected.
    pub fn is_complete(&mut self) -> bool {
        self.loaded_mut().is_complete()
    }

    /// Shallow-merges `update` into the profile and re-derives the session metrics.
    pub fn update(&mut self, update: ProfileUpdate) -> Result<&UserProfile, StoreError> {
        let profile = self.loaded_mut();
        apply_update(profile, update);
        touch(profile);
        self.commit()
    }

    /// Appends a completed session and recomputes the average score and session count.
    pub fn add_session(&mut self, session: InterviewSession) -> Result<&UserProfile, StoreError> {
        let profile = self.loaded_mut();
        if profile.has_session(&session.id) {
            return Err(StoreError::DuplicateSession(session.id));
        }

        debug!("Recording session {} ({})", session.id, session.field);
        profile.interview_sessions.push(session);
        profile.performance_metrics =
            derive_metrics(&profile.interview_sessions, &profile.performance_metrics);
        touch(profile);
        self.commit()
    }

    /// Appends the jobs whose URL is not yet known, in input order.
    pub fn add_matched_jobs(&mut self, jobs: Vec<JobMatch>) -> Result<&UserProfile, StoreError> {
        let profile = self.loaded_mut();
        let added = merge_jobs(&mut profile.matched_jobs, jobs);
        debug!("Merged {added} new matched jobs");
        touch(profile);
        self.commit()
    }

    /// Records an application. Already-applied URLs are a no-op (nothing is written).
    pub fn apply_to_job(&mut self, job_url: &str) -> Result<&UserProfile, StoreError> {
        if self.loaded_mut().has_applied(job_url) {
            return Ok(&*self.loaded_mut());
        }
        let profile = self.loaded_mut();
        profile.applied_jobs.push(job_url.to_string());
        touch(profile);
        self.commit()
    }

    /// Resets to a fresh empty profile and deletes the persisted record.
    pub fn clear(&mut self) -> Result<&UserProfile, StoreError> {
        self.state = StoreState::Loaded(UserProfile::empty(Utc::now()));
        self.storage.remove(PROFILE_STORAGE_KEY)?;
        info!("Profile cleared");
        Ok(&*self.loaded_mut())
    }

    fn loaded_mut(&mut self) -> &mut UserProfile {
        if let StoreState::Unloaded = self.state {
            warn!("Profile accessed before load, initialising an empty profile");
            self.state = StoreState::Loaded(UserProfile::empty(Utc::now()));
        }
        match &mut self.state {
            StoreState::Loaded(profile) => profile,
            StoreState::Unloaded => unreachable!("state set to Loaded above"),
        }
    }

    fn commit(&mut self) -> Result<&UserProfile, StoreError> {
        let result = match &self.state {
            StoreState::Loaded(profile) => self.persist(profile),
            StoreState::Unloaded => Ok(()),
        };
        if let Err(e) = &result {
            error!("Error saving profile: {e}");
        }
        result?;
        Ok(&*self.loaded_mut())
    }

    fn persist(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let raw = versioning::encode(profile)?;
        self.storage.set(PROFILE_STORAGE_KEY, &raw)
    }
}

fn apply_update(profile: &mut UserProfile, update: ProfileUpdate) {
    let ProfileUpdate {
        role,
        organization,
        experience_years,
        selected_skills,
        selected_tasks,
        cv_analysis,
        interview_sessions,
        performance_metrics,
        matched_jobs,
        applied_jobs,
    } = update;

    if let Some(role) = role {
        profile.role = role;
    }
    if organization.is_some() {
        profile.organization = organization;
    }
    if experience_years.is_some() {
        profile.experience_years = experience_years;
    }
    if let Some(skills) = selected_skills {
        profile.selected_skills = dedup_strings(skills);
    }
    if let Some(tasks) = selected_tasks {
        profile.selected_tasks = tasks;
    }
    if cv_analysis.is_some() {
        profile.cv_analysis = cv_analysis;
    }
    if let Some(sessions) = interview_sessions {
        profile.interview_sessions = dedup_sessions(sessions);
    }
    if let Some(metrics) = performance_metrics {
        profile.performance_metrics = metrics;
    }
    if let Some(jobs) = matched_jobs {
        profile.matched_jobs = dedup_jobs(jobs);
    }
    if let Some(applied) = applied_jobs {
        profile.applied_jobs = dedup_strings(applied);
    }

    // Derived fields always follow the session list, whatever the caller sent.
    profile.performance_metrics =
        derive_metrics(&profile.interview_sessions, &profile.performance_metrics);
}

/// Drops later sessions whose id repeats an earlier one.
fn dedup_sessions(sessions: Vec<InterviewSession>) -> Vec<InterviewSession> {
    let mut seen = HashSet::new();
    sessions
        .into_iter()
        .filter(|s| seen.insert(s.id.clone()))
        .collect()
}

/// Keeps the first occurrence of each value, preserving order.
fn dedup_strings(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

/// `last_updated_at` never moves backwards, even if the wall clock does.
fn touch(profile: &mut UserProfile) {
    profile.last_updated_at = next_timestamp(profile.last_updated_at, Utc::now());
}

fn next_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    previous.max(now)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Duration;

    use super::*;
    use crate::profile::models::PerformanceMetrics;
    use crate::profile::storage::{FileStorage, MemoryStorage};

    /// Shares one in-memory storage between a store and the test body.
    #[derive(Clone, Default)]
    struct SharedStorage(Arc<MemoryStorage>);

    impl ProfileStorage for SharedStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.get(key)
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key)
        }
    }

    /// Storage whose writes always fail.
    struct ReadOnlyStorage;

    impl ProfileStorage for ReadOnlyStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Ok(None)
        }
        fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io {
                path: key.into(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Ok(())
        }
    }

    /// Storage whose reads always fail; writes pass through.
    struct UnreadableStorage(SharedStorage);

    impl ProfileStorage for UnreadableStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Io {
                path: key.into(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "disk unavailable"),
            })
        }
        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.set(key, value)
        }
        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.0.remove(key)
        }
    }

    fn loaded_store() -> (ProfileStore, SharedStorage) {
        let storage = SharedStorage::default();
        let mut store = ProfileStore::new(Box::new(storage.clone()));
        store.load();
        (store, storage)
    }

    fn session(id: &str, score: Option<f64>) -> InterviewSession {
        InterviewSession {
            id: id.to_string(),
            date: "2024-05-01T10:00:00.000Z".to_string(),
            field: "frontend".to_string(),
            questions: vec![],
            average_score: score,
        }
    }

    fn job(url: &str, name: &str) -> JobMatch {
        JobMatch {
            job_url: url.to_string(),
            job_name: name.to_string(),
            company_name: "Globex".to_string(),
            match_score: 55.0,
            required_skills: vec!["Rust".to_string()],
            missing_skills: vec![],
            job_description: None,
            job_requirement: None,
        }
    }

    fn stored(storage: &SharedStorage) -> UserProfile {
        let raw = storage.get(PROFILE_STORAGE_KEY).unwrap().expect("record present");
        versioning::decode(&raw).unwrap().profile
    }

    #[test]
    fn test_load_absent_creates_and_persists_empty() {
        let (mut store, storage) = loaded_store();
        assert!(store.is_loaded());
        assert_eq!(store.profile().role, "");
        assert_eq!(stored(&storage).role, "");
    }

    #[test]
    fn test_load_reads_existing_record() {
        let storage = SharedStorage::default();
        let mut profile = UserProfile::default();
        profile.role = "Teacher".to_string();
        storage
            .set(PROFILE_STORAGE_KEY, &versioning::encode(&profile).unwrap())
            .unwrap();

        let mut store = ProfileStore::new(Box::new(storage));
        assert_eq!(store.load().role, "Teacher");
    }

    #[test]
    fn test_load_unparsable_falls_back_to_empty() {
        let storage = SharedStorage::default();
        storage.set(PROFILE_STORAGE_KEY, "{broken").unwrap();

        let mut store = ProfileStore::new(Box::new(storage.clone()));
        assert_eq!(store.load().role, "");
        // The broken record has been replaced with a readable one and kept aside.
        assert!(versioning::decode(&storage.get(PROFILE_STORAGE_KEY).unwrap().unwrap()).is_ok());
        assert_eq!(
            storage.get(PROFILE_BACKUP_KEY).unwrap().as_deref(),
            Some("{broken")
        );
    }

    #[test]
    fn test_load_keeps_record_from_newer_schema() {
        let storage = SharedStorage::default();
        let newer = r#"{"schemaVersion": 9, "profile": {"role": "Future"}}"#;
        storage.set(PROFILE_STORAGE_KEY, newer).unwrap();

        let mut store = ProfileStore::new(Box::new(storage.clone()));
        assert_eq!(store.load().role, "");
        assert_eq!(storage.get(PROFILE_BACKUP_KEY).unwrap().as_deref(), Some(newer));
    }

    #[test]
    fn test_load_read_error_does_not_overwrite() {
        let storage = SharedStorage::default();
        let mut profile = UserProfile::default();
        profile.role = "Kept".to_string();
        let raw = versioning::encode(&profile).unwrap();
        storage.set(PROFILE_STORAGE_KEY, &raw).unwrap();

        let mut store = ProfileStore::new(Box::new(UnreadableStorage(storage.clone())));
        assert_eq!(store.load().role, "");
        assert_eq!(storage.get(PROFILE_STORAGE_KEY).unwrap(), Some(raw));
        assert_eq!(storage.get(PROFILE_BACKUP_KEY).unwrap(), None);
    }

    #[test]
    fn test_load_migrates_legacy_record() {
        let storage = SharedStorage::default();
        storage
            .set(PROFILE_STORAGE_KEY, r#"{"role": "Chef", "selectedSkills": ["knife"]}"#)
            .unwrap();

        let mut store = ProfileStore::new(Box::new(storage.clone()));
        assert_eq!(store.load().role, "Chef");

        store
            .update(ProfileUpdate {
                organization: Some("Bistro".to_string()),
                ..Default::default()
            })
            .unwrap();
        let raw = storage.get(PROFILE_STORAGE_KEY).unwrap().unwrap();
        assert_eq!(
            versioning::decode(&raw).unwrap().schema_version,
            CURRENT_SCHEMA_VERSION
        );
    }

    #[test]
    fn test_operation_before_load_initialises_empty() {
        let storage = SharedStorage::default();
        let mut profile = UserProfile::default();
        profile.role = "Stored".to_string();
        storage
            .set(PROFILE_STORAGE_KEY, &versioning::encode(&profile).unwrap())
            .unwrap();

        let mut store = ProfileStore::new(Box::new(storage));
        assert!(!store.is_loaded());
        let updated = store
            .update(ProfileUpdate {
                role: Some("Fresh".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(updated.role, "Fresh");
        assert!(updated.selected_skills.is_empty());
        assert!(store.is_loaded());
    }

    #[test]
    fn test_update_merges_and_persists() {
        let (mut store, storage) = loaded_store();
        store
            .update(ProfileUpdate {
                role: Some("Engineer".to_string()),
                selected_skills: Some(vec!["Rust".into(), "SQL".into(), "Rust".into()]),
                ..Default::default()
            })
            .unwrap();
        store
            .update(ProfileUpdate {
                selected_tasks: Some(vec!["Code review".into()]),
                ..Default::default()
            })
            .unwrap();

        let persisted = stored(&storage);
        assert_eq!(persisted.role, "Engineer");
        assert_eq!(persisted.selected_skills, vec!["Rust".to_string(), "SQL".to_string()]);
        assert_eq!(persisted.selected_tasks, vec!["Code review".to_string()]);
    }

    #[test]
    fn test_update_cannot_break_derived_metrics() {
        let (mut store, _) = loaded_store();
        let profile = store
            .update(ProfileUpdate {
                interview_sessions: Some(vec![session("a", Some(40.0)), session("b", Some(60.0))]),
                performance_metrics: Some(PerformanceMetrics {
                    average_score: 99.0,
                    sessions_completed: 42,
                    improvement_areas: vec!["clarity".into()],
                    ..Default::default()
                }),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(profile.performance_metrics.sessions_completed, 2);
        assert!((profile.performance_metrics.average_score - 50.0).abs() < f64::EPSILON);
        assert_eq!(profile.performance_metrics.improvement_areas, vec!["clarity".to_string()]);
    }

    #[test]
    fn test_whitespace_role_with_three_skills_is_complete() {
        let (mut store, _) = loaded_store();
        store
            .update(ProfileUpdate {
                role: Some(" ".to_string()),
                selected_skills: Some(vec!["a".into(), "b".into(), "c".into()]),
                ..Default::default()
            })
            .unwrap();
        assert!(store.is_complete());
    }

    #[test]
    fn test_update_dedups_sessions_by_id() {
        let (mut store, storage) = loaded_store();
        let profile = store
            .update(ProfileUpdate {
                interview_sessions: Some(vec![
                    session("x", Some(80.0)),
                    session("x", Some(20.0)),
                    session("y", Some(60.0)),
                ]),
                ..Default::default()
            })
            .unwrap();
        let ids: Vec<_> = profile.interview_sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y"]);
        assert_eq!(profile.performance_metrics.sessions_completed, 2);
        assert!((profile.performance_metrics.average_score - 70.0).abs() < f64::EPSILON);
        assert_eq!(stored(&storage).interview_sessions.len(), 2);
    }

    #[test]
    fn test_update_dedups_matched_jobs() {
        let (mut store, _) = loaded_store();
        let profile = store
            .update(ProfileUpdate {
                matched_jobs: Some(vec![job("1", "A"), job("1", "A2"), job("2", "B")]),
                ..Default::default()
            })
            .unwrap();
        let names: Vec<_> = profile.matched_jobs.iter().map(|j| j.job_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_add_session_recomputes_average() {
        let (mut store, storage) = loaded_store();
        store.add_session(session("s1", Some(80.0))).unwrap();
        let profile = store.add_session(session("s2", Some(60.0))).unwrap();

        assert!((profile.performance_metrics.average_score - 70.0).abs() < f64::EPSILON);
        assert_eq!(profile.performance_metrics.sessions_completed, 2);
        assert_eq!(stored(&storage).performance_metrics.sessions_completed, 2);
    }

    #[test]
    fn test_add_session_rejects_duplicate_id() {
        let (mut store, _) = loaded_store();
        store.add_session(session("s1", Some(80.0))).unwrap();
        let err = store.add_session(session("s1", Some(10.0))).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSession(id) if id == "s1"));
        assert_eq!(store.profile().interview_sessions.len(), 1);
    }

    #[test]
    fn test_add_matched_jobs_dedups_by_url() {
        let (mut store, _) = loaded_store();
        store.add_matched_jobs(vec![job("1", "A"), job("2", "B")]).unwrap();
        let profile = store
            .add_matched_jobs(vec![job("2", "B"), job("3", "C")])
            .unwrap();
        let names: Vec<_> = profile.matched_jobs.iter().map(|j| j.job_name.as_str()).collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_apply_to_job_is_idempotent() {
        let (mut store, _) = loaded_store();
        store.apply_to_job("https://jobs.example/1").unwrap();
        let stamped = store.profile().last_updated_at;

        let profile = store.apply_to_job("https://jobs.example/1").unwrap();
        assert_eq!(profile.applied_jobs, vec!["https://jobs.example/1".to_string()]);
        assert_eq!(profile.last_updated_at, stamped);
    }

    #[test]
    fn test_clear_removes_persisted_record() {
        let (mut store, storage) = loaded_store();
        store
            .update(ProfileUpdate {
                role: Some("Engineer".to_string()),
                ..Default::default()
            })
            .unwrap();

        let profile = store.clear().unwrap();
        assert_eq!(profile.role, "");
        assert_eq!(storage.get(PROFILE_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_is_complete() {
        let (mut store, _) = loaded_store();
        store
            .update(ProfileUpdate {
                role: Some("Engineer".to_string()),
                selected_skills: Some(vec!["a".into(), "b".into()]),
                ..Default::default()
            })
            .unwrap();
        assert!(!store.is_complete());

        store
            .update(ProfileUpdate {
                selected_skills: Some(vec!["a".into(), "b".into(), "c".into()]),
                ..Default::default()
            })
            .unwrap();
        assert!(store.is_complete());
    }

    #[test]
    fn test_last_updated_is_monotonic() {
        let (mut store, _) = loaded_store();
        let before = store.profile().last_updated_at;
        let after = store.apply_to_job("u").unwrap().last_updated_at;
        assert!(after >= before);

        let later = Utc::now() + Duration::hours(1);
        assert_eq!(next_timestamp(later, Utc::now()), later);
    }

    #[test]
    fn test_persist_failure_keeps_memory_state() {
        let mut store = ProfileStore::new(Box::new(ReadOnlyStorage));
        store.load();
        let err = store
            .update(ProfileUpdate {
                role: Some("Engineer".to_string()),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, StoreError::Persist(_)));
        assert_eq!(store.profile().role, "Engineer");
    }

    #[test]
    fn test_file_backed_store_survives_restart() {
        let dir = tempfile::tempdir().unwrap();

        let mut first = ProfileStore::new(Box::new(FileStorage::new(dir.path())));
        first.load();
        first.add_session(session("s1", Some(75.0))).unwrap();
        first.apply_to_job("https://jobs.example/9").unwrap();

        let mut second = ProfileStore::new(Box::new(FileStorage::new(dir.path())));
        let profile = second.load();
        assert_eq!(profile.interview_sessions.len(), 1);
        assert_eq!(profile.performance_metrics.sessions_completed, 1);
        assert!(profile.has_applied("https://jobs.example/9"));
    }
}
