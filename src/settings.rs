//! Runtime settings read from the environment (`.env` is loaded by the binary via dotenvy).

use crate::error::SettingsError;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/strata";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_MODELS_PATH: &str = "models.json";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub max_connections: u32,
    pub models_path: PathBuf,
    pub bind: SocketAddr,
    /// Force debug envelopes on every HTTP call.
    pub debug: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup; unset keys take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let invalid = |key: &'static str, value: &str, reason: String| SettingsError {
            key,
            value: value.to_string(),
            reason,
        };
        let max_connections = match lookup("STRATA_MAX_CONNECTIONS") {
            Some(v) => match v.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                Ok(_) => return Err(invalid("STRATA_MAX_CONNECTIONS", &v, "must be at least 1".into())),
                Err(e) => return Err(invalid("STRATA_MAX_CONNECTIONS", &v, e.to_string())),
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let bind_raw = lookup("STRATA_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| invalid("STRATA_BIND", &bind_raw, e.to_string()))?;
        let debug = match lookup("STRATA_DEBUG").as_deref().map(str::trim) {
            None | Some("") => false,
            Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => true,
            Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => false,
            Some(v) => return Err(invalid("STRATA_DEBUG", v, "expected true or false".into())),
        };
        Ok(Settings {
            database_url: lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            max_connections,
            models_path: PathBuf::from(lookup("STRATA_MODELS_PATH").unwrap_or_else(|| DEFAULT_MODELS_PATH.to_string())),
            bind,
            debug,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> Result<Settings, SettingsError> {
        let env: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(s.max_connections, 5);
        assert_eq!(s.models_path, PathBuf::from("models.json"));
        assert_eq!(s.bind.to_string(), "127.0.0.1:3000");
        assert!(!s.debug);
    }

    #[test]
    fn values_are_parsed() {
        let s = settings(&[("STRATA_MAX_CONNECTIONS", "12"), ("STRATA_DEBUG", "TRUE"), ("STRATA_BIND", "0.0.0.0:8080")]).unwrap();
        assert_eq!(s.max_connections, 12);
        assert!(s.debug);
        assert_eq!(s.bind.port(), 8080);
    }

    #[test]
    fn bad_values_are_errors() {
        assert!(settings(&[("STRATA_MAX_CONNECTIONS", "zero")]).is_err());
        let err = settings(&[("STRATA_MAX_CONNECTIONS", "0")]).unwrap_err();
        assert_eq!(err.key, "STRATA_MAX_CONNECTIONS");
        assert_eq!(err.to_string(), "STRATA_MAX_CONNECTIONS: invalid value '0': must be at least 1");
        assert!(settings(&[("STRATA_DEBUG", "maybe")]).is_err());
        assert!(settings(&[("STRATA_BIND", "nowhere")]).is_err());
    }
}
