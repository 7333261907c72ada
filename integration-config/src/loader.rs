//! Configuration loaders for JSON documents and environment variables.

use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::schema::IntegrationConfig;

/// Overrides [`IntegrationConfig::base_url`].
pub const ENV_BASE_URL: &str = "INTEGRATION_BASE_URL";
/// Overrides [`IntegrationConfig::timeout_secs`].
pub const ENV_TIMEOUT_SECS: &str = "INTEGRATION_TIMEOUT_SECS";
/// Overrides [`IntegrationConfig::metrics_capacity`].
pub const ENV_METRICS_CAPACITY: &str = "INTEGRATION_METRICS_CAPACITY";
/// Overrides [`IntegrationConfig::health_window_secs`].
pub const ENV_HEALTH_WINDOW_SECS: &str = "INTEGRATION_HEALTH_WINDOW_SECS";

impl IntegrationConfig {
    /// Parses a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON or unknown fields,
    /// or [`ConfigError::Invalid`] if the result fails validation.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise
    /// the errors of [`from_json_str`](Self::from_json_str).
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded configuration file");
        Self::from_json_str(&contents)
    }

    /// Defaults overlaid with the process environment.
    ///
    /// # Errors
    ///
    /// See [`with_env_lookup`](Self::with_env_lookup).
    pub fn from_env() -> ConfigResult<Self> {
        Self::default().with_env_lookup(|key| env::var(key).ok())
    }

    /// Overlays `INTEGRATION_*` values obtained through `lookup` onto `self`.
    ///
    /// Unset variables leave the current value untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnv`] when a numeric variable does not
    /// parse, or [`ConfigError::Invalid`] if the result fails validation.
    pub fn with_env_lookup<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = Some(base_url);
        }
        if let Some(timeout) = parse_var(&lookup, ENV_TIMEOUT_SECS)? {
            self.timeout_secs = timeout;
        }
        if let Some(capacity) = parse_var(&lookup, ENV_METRICS_CAPACITY)? {
            self.metrics_capacity = capacity;
        }
        if let Some(window) = parse_var(&lookup, ENV_HEALTH_WINDOW_SECS)? {
            self.health_window_secs = window;
        }
        self.validate()?;
        Ok(self)
    }
}

fn parse_var<T, F>(lookup: &F, key: &'static str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(key) else {
        return Ok(None);
    };
    match value.trim().parse() {
        Ok(parsed) => Ok(Some(parsed)),
        Err(err) => Err(ConfigError::InvalidEnv {
            key,
            reason: format!("{err}"),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = IntegrationConfig::from_json_str(
            r#"{ "base_url": "https://api.example.com", "metrics_capacity": 50 }"#,
        )
        .unwrap();

        assert_eq!(config.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(config.metrics_capacity, 50);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn json_rejects_unknown_fields_and_invalid_values() {
        let err = IntegrationConfig::from_json_str(r#"{ "capacity": 5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        let err = IntegrationConfig::from_json_str(r#"{ "timeout_secs": 0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "timeout_secs", .. }));
    }

    #[test]
    fn env_overrides_defaults() {
        let config = IntegrationConfig::default()
            .with_env_lookup(lookup(&[
                (ENV_BASE_URL, "http://localhost:8080"),
                (ENV_TIMEOUT_SECS, " 5 "),
                (ENV_HEALTH_WINDOW_SECS, "60"),
            ]))
            .unwrap();

        assert_eq!(config.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.health_window_secs, 60);
        assert_eq!(config.metrics_capacity, 1000);
    }

    #[test]
    fn env_rejects_non_numeric_values() {
        let err = IntegrationConfig::default()
            .with_env_lookup(lookup(&[(ENV_METRICS_CAPACITY, "lots")]))
            .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidEnv { key: ENV_METRICS_CAPACITY, ref value, .. } if value == "lots"
        ));
    }

    #[test]
    fn reads_file_and_reports_missing_file() {
        let dir = std::env::temp_dir();
        let path = dir.join(format!("integration-config-{}.json", std::process::id()));
        let mut file = fs::File::create(&path).unwrap();
        write!(file, r#"{{ "health_window_secs": 120 }}"#).unwrap();
        drop(file);

        let config = IntegrationConfig::from_file(&path).unwrap();
        assert_eq!(config.health_window_secs, 120);
        fs::remove_file(&path).unwrap();

        let err = IntegrationConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
