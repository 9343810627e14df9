//! Persisted record layout.
//!
//! Current layout: `{"schemaVersion": 1, "profile": {...}}`.
//! Version 0 is the bare profile object written before the envelope existed; it is migrated on
//! read and upgraded by the next write.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::profile::models::UserProfile;

pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const VERSION_FIELD: &str = "schemaVersion";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredProfileRef<'a> {
    schema_version: u32,
    profile: &'a UserProfile,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredProfile {
    schema_version: u32,
    profile: UserProfile,
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed profile record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Profile record is not a JSON object")]
    NotAnObject,

    #[error("Unsupported schema version {found}")]
    UnsupportedVersion { found: u64 },
}

/// A decoded record and the schema version it was stored with.
#[derive(Debug)]
pub struct Decoded {
    pub profile: UserProfile,
    pub schema_version: u32,
}

pub fn encode(profile: &UserProfile) -> Result<String, serde_json::Error> {
    serde_json::to_string(&StoredProfileRef {
        schema_version: CURRENT_SCHEMA_VERSION,
        profile,
    })
}

pub fn decode(raw: &str) -> Result<Decoded, DecodeError> {
    let value: Value = serde_json::from_str(raw)?;
    let object = value.as_object().ok_or(DecodeError::NotAnObject)?;

    let version = object.get(VERSION_FIELD).map(Value::as_u64);

    match version {
        None => Ok(Decoded {
            profile: serde_json::from_value(value)?,
            schema_version: 0,
        }),
        Some(Some(v)) if v <= u64::from(CURRENT_SCHEMA_VERSION) => {
            let stored: StoredProfile = serde_json::from_value(value)?;
            Ok(Decoded {
                profile: stored.profile,
                schema_version: stored.schema_version,
            })
        }
        Some(Some(found)) => Err(DecodeError::UnsupportedVersion { found }),
        Some(None) => Err(DecodeError::UnsupportedVersion { found: 0 }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_wraps_in_envelope() {
        let mut profile = UserProfile::default();
        profile.role = "QA".to_string();
        let raw = encode(&profile).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["schemaVersion"], 1);
        assert_eq!(value["profile"]["role"], "QA");

        let decoded = decode(&raw).unwrap();
        assert_eq!(decoded.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(decoded.profile, profile);
    }

    #[test]
    fn test_bare_legacy_record_is_version_zero() {
        let decoded = decode(r#"{"role": "Nurse", "selectedSkills": ["triage"]}"#).unwrap();
        assert_eq!(decoded.schema_version, 0);
        assert_eq!(decoded.profile.role, "Nurse");
        assert_eq!(decoded.profile.selected_skills, vec!["triage".to_string()]);
    }

    #[test]
    fn test_future_version_rejected() {
        let err = decode(r#"{"schemaVersion": 7, "profile": {}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedVersion { found: 7 }));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(decode("{not json"), Err(DecodeError::Malformed(_))));
        assert!(matches!(decode("[1, 2]"), Err(DecodeError::NotAnObject)));
        assert!(matches!(
            decode(r#"{"schemaVersion": "one", "profile": {}}"#),
            Err(DecodeError::UnsupportedVersion { .. })
        ));
    }
}
