//! Service configuration

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use courrier_core::{TransitionPolicy, DEFAULT_PREFIX};
use serde::Deserialize;

use crate::crypto::BCRYPT_COST;

/// Where the snapshot is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Memory,
    Json,
    Sqlite,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::Memory => "memory",
            BackendKind::Json => "json",
            BackendKind::Sqlite => "sqlite",
        })
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendKind::Memory),
            "json" => Ok(BackendKind::Json),
            "sqlite" => Ok(BackendKind::Sqlite),
            other => Err(format!("unknown backend '{}' (memory, json, sqlite)", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Snapshot location (file for `json`, database for `sqlite`)
    pub data_path: PathBuf,

    pub backend: BackendKind,

    /// bcrypt cost used for new password hashes
    pub bcrypt_cost: u32,

    /// Prefix of generated courrier references
    pub reference_prefix: String,

    /// Reject transitions outside the standard workflow table
    pub strict_transitions: bool,

    pub min_password_length: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("courrier-data.json"),
            backend: BackendKind::Json,
            bcrypt_cost: BCRYPT_COST,
            reference_prefix: DEFAULT_PREFIX.to_string(),
            strict_transitions: false,
            min_password_length: 8,
        }
    }
}

impl Config {
    /// Defaults overridden by `COURRIER_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = lookup("COURRIER_DATA") {
            config.data_path = PathBuf::from(path);
        }
        if let Some(backend) = parse_var(&lookup, "COURRIER_BACKEND") {
            config.backend = backend;
        }
        if let Some(cost) = parse_var(&lookup, "COURRIER_BCRYPT_COST") {
            config.bcrypt_cost = cost;
        }
        if let Some(prefix) = lookup("COURRIER_REFERENCE_PREFIX") {
            config.reference_prefix = prefix;
        }
        if let Some(strict) = parse_var(&lookup, "COURRIER_STRICT_TRANSITIONS") {
            config.strict_transitions = strict;
        }
        if let Some(min) = parse_var(&lookup, "COURRIER_MIN_PASSWORD_LENGTH") {
            config.min_password_length = min;
        }

        config
    }

    pub fn transition_policy(&self) -> TransitionPolicy {
        if self.strict_transitions {
            TransitionPolicy::strict()
        } else {
            TransitionPolicy::Permissive
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring invalid configuration value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None);
        assert_eq!(config.backend, BackendKind::Json);
        assert_eq!(config.reference_prefix, "ESTSB");
        assert_eq!(config.bcrypt_cost, BCRYPT_COST);
        assert_eq!(config.transition_policy(), TransitionPolicy::Permissive);
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("COURRIER_DATA", "/var/lib/courrier.db"),
            ("COURRIER_BACKEND", "SQLite"),
            ("COURRIER_BCRYPT_COST", "6"),
            ("COURRIER_STRICT_TRANSITIONS", "true"),
        ]));
        assert_eq!(config.data_path, PathBuf::from("/var/lib/courrier.db"));
        assert_eq!(config.backend, BackendKind::Sqlite);
        assert_eq!(config.bcrypt_cost, 6);
        assert_eq!(config.transition_policy(), TransitionPolicy::strict());
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("COURRIER_BACKEND", "postgres"),
            ("COURRIER_BCRYPT_COST", "high"),
        ]));
        assert_eq!(config.backend, BackendKind::Json);
        assert_eq!(config.bcrypt_cost, BCRYPT_COST);
    }
}
