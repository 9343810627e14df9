use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Where the profile record is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// One JSON file under `profile_dir`.
    File,
    /// Process memory only. Everything is lost on exit.
    Memory,
}

impl StorageBackend {
    fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("PROFILE_STORAGE must be 'file' or 'memory', got '{other}'"),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::File => "file",
            StorageBackend::Memory => "memory",
        }
    }
}

/// Application configuration loaded from environment variables.
/// Every variable has a default; invalid values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageBackend,
    /// Directory holding the durable profile record.
    pub profile_dir: PathBuf,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            storage: StorageBackend::parse(
                &std::env::var("PROFILE_STORAGE").unwrap_or_else(|_| "file".to_string()),
            )?,
            profile_dir: std::env::var("PROFILE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".careercoach")),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests(profile_dir: PathBuf) -> Self {
        Config {
            storage: StorageBackend::Memory,
            profile_dir,
            port: 0,
            rust_log: "debug".to_string(),
        }
    }
}
