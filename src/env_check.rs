//! Presence check for the secrets the binaries need.
//!
//! Only key names and statuses are ever rendered, never values.

use std::fmt::Write as _;
use std::path::PathBuf;

/// Keys without which neither binary can run.
pub const REQUIRED_KEYS: &[&str] = &["PINECONE_API_KEY", "GROQ_API_KEY"];

/// Optional keys and the default used when they are absent.
pub const OPTIONAL_KEYS: &[(&str, &str)] = &[
    ("PINECONE_INDEX", "cv-alumno"),
    ("PINECONE_CLOUD", "aws"),
    ("PINECONE_REGION", "us-east-1"),
];

/// Known misspellings and the name they should have.
pub const MISSPELLINGS: &[(&str, &str)] = &[("PINECODE_API_KEY", "PINECONE_API_KEY")];

/// State of one environment key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// Present and non-blank.
    Set,
    /// Required but absent or blank.
    Missing,
    /// Optional and absent; the default applies.
    Defaulted(&'static str),
}

/// Result of checking the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvReport {
    /// Every checked key with its status, required keys first.
    pub keys: Vec<(&'static str, KeyStatus)>,
    /// Misspelled keys found, paired with the intended name.
    pub misspellings: Vec<(&'static str, &'static str)>,
}

impl EnvReport {
    /// Checks all known keys through `lookup`.
    pub fn collect<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_set = |key: &str| lookup(key).is_some_and(|value| !value.trim().is_empty());

        let mut keys = Vec::new();
        for &key in REQUIRED_KEYS {
            let status = if is_set(key) {
                KeyStatus::Set
            } else {
                KeyStatus::Missing
            };
            keys.push((key, status));
        }
        for &(key, default) in OPTIONAL_KEYS {
            let status = if is_set(key) {
                KeyStatus::Set
            } else {
                KeyStatus::Defaulted(default)
            };
            keys.push((key, status));
        }
        let misspellings = MISSPELLINGS
            .iter()
            .copied()
            .filter(|(wrong, _)| is_set(*wrong))
            .collect();
        Self { keys, misspellings }
    }

    /// Checks the process environment.
    pub fn from_process_env() -> Self {
        Self::collect(|key| std::env::var(key).ok())
    }

    /// Required keys that are missing.
    pub fn missing(&self) -> Vec<&'static str> {
        self.keys
            .iter()
            .filter(|(_, status)| *status == KeyStatus::Missing)
            .map(|(key, _)| *key)
            .collect()
    }

    /// Whether every required key is present.
    pub fn is_ok(&self) -> bool {
        self.missing().is_empty()
    }

    /// Human-readable summary, one line per key.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (key, status) in &self.keys {
            let _ = match status {
                KeyStatus::Set => writeln!(out, "ok      {key} is defined"),
                KeyStatus::Missing => writeln!(out, "MISSING {key} is NOT defined"),
                KeyStatus::Defaulted(default) => {
                    writeln!(out, "default {key} not set, using '{default}'")
                }
            };
        }
        for (wrong, right) in &self.misspellings {
            let _ = writeln!(
                out,
                "warning {wrong} is set; it looks like a typo, rename it to {right}"
            );
        }
        if !self.is_ok() {
            out.push_str(
                "\nCopy .env.example to .env and fill in your keys, or export them in your shell.\n",
            );
        }
        out
    }
}

/// Loads the first existing `.env` among `candidates` without overriding
/// variables that are already set. Returns the file that was loaded.
pub fn load_env_file(candidates: &[PathBuf]) -> Option<PathBuf> {
    let path = candidates.iter().find(|path| path.is_file())?;
    match dotenvy::from_path(path) {
        Ok(()) => Some(path.clone()),
        Err(err) => {
            tracing::warn!("ignoring {}: {err}", path.display());
            None
        }
    }
}
