use std::{env, path::PathBuf, time::Duration};

use reqwest::Url;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const SESSION_DIR: &str = ".clinic-admin";
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API URL '{value}' is not a valid URL: {reason}")]
    InvalidApiUrl { value: String, reason: String },
    #[error("CLINIC_HTTP_TIMEOUT_SECS must be a positive number of seconds, got '{0}'")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Values given on the command line. They win over the environment and
/// are applied before anything is validated.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub api_url: Option<String>,
    pub session_file: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub session_file: PathBuf,
    pub http_timeout: Duration,
    pub log_format: LogFormat,
}

impl Config {
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok(); // Load .env file

        Self::from_lookup(|key| env::var(key).ok(), overrides)
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        overrides: Overrides,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_url = overrides
            .api_url
            .filter(|url| !url.trim().is_empty())
            .or_else(|| get("CLINIC_API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.into());
        let api_url = validate_api_url(api_url)?;

        let session_file = overrides
            .session_file
            .or_else(|| get("CLINIC_SESSION_FILE").map(PathBuf::from))
            .unwrap_or_else(|| default_session_file(get("HOME")));

        let http_timeout = match get("CLINIC_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::InvalidTimeout(raw))?,
            None => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let log_format = get("LOG_FORMAT")
            .map(|value| LogFormat::parse(&value))
            .unwrap_or_default();

        Ok(Config {
            api_url,
            session_file,
            http_timeout,
            log_format,
        })
    }
}

fn validate_api_url(value: String) -> Result<String, ConfigError> {
    let parsed = Url::parse(value.trim()).map_err(|err| ConfigError::InvalidApiUrl {
        value: value.clone(),
        reason: err.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidApiUrl {
            value,
            reason: "scheme must be http or https".into(),
        });
    }
    Ok(value.trim().trim_end_matches('/').to_string())
}

fn default_session_file(home: Option<String>) -> PathBuf {
    match home {
        Some(home) => PathBuf::from(home).join(SESSION_DIR).join(SESSION_FILE),
        None => PathBuf::from(SESSION_DIR).join(SESSION_FILE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use once_cell::sync::Lazy;
    use std::collections::HashMap;
    use std::sync::{Mutex, MutexGuard};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config =
            Config::from_lookup(lookup(&[("HOME", "/home/staff")]), Overrides::default()).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(
            config.session_file,
            PathBuf::from("/home/staff/.clinic-admin/session.json")
        );
        assert_eq!(config.http_timeout, Duration::from_secs(10));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn reads_every_setting() {
        let config = Config::from_lookup(
            lookup(&[
                ("CLINIC_API_URL", "https://clinic.example.com/"),
                ("CLINIC_SESSION_FILE", "/tmp/s.json"),
                ("CLINIC_HTTP_TIMEOUT_SECS", "3"),
                ("LOG_FORMAT", "JSON"),
            ]),
            Overrides::default(),
        )
        .unwrap();
        assert_eq!(config.api_url, "https://clinic.example.com");
        assert_eq!(config.session_file, PathBuf::from("/tmp/s.json"));
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn rejects_bad_values() {
        let load = |pairs: &[(&str, &str)]| Config::from_lookup(lookup(pairs), Overrides::default());
        assert!(matches!(
            load(&[("CLINIC_API_URL", "not a url")]),
            Err(ConfigError::InvalidApiUrl { .. })
        ));
        assert!(matches!(
            load(&[("CLINIC_API_URL", "ftp://clinic")]),
            Err(ConfigError::InvalidApiUrl { .. })
        ));
        assert!(matches!(
            load(&[("CLINIC_HTTP_TIMEOUT_SECS", "0")]),
            Err(ConfigError::InvalidTimeout(_))
        ));
    }

    #[test]
    fn without_home_falls_back_to_working_directory() {
        let config = Config::from_lookup(lookup(&[]), Overrides::default()).unwrap();
        assert_eq!(config.session_file, PathBuf::from(".clinic-admin/session.json"));
    }

    #[test]
    fn overrides_replace_environment_values() {
        let config = Config::from_lookup(
            lookup(&[
                ("CLINIC_API_URL", "http://env.clinic.test"),
                ("CLINIC_SESSION_FILE", "/tmp/env.json"),
            ]),
            Overrides {
                api_url: Some("http://127.0.0.1:9000".into()),
                session_file: Some(PathBuf::from("other.json")),
            },
        )
        .unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:9000");
        assert_eq!(config.session_file, PathBuf::from("other.json"));
    }

    #[test]
    fn valid_flag_wins_over_broken_environment_url() {
        let config = Config::from_lookup(
            lookup(&[("CLINIC_API_URL", "not a url")]),
            Overrides {
                api_url: Some("http://127.0.0.1:9000".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn invalid_flag_is_rejected() {
        let result = Config::from_lookup(
            lookup(&[]),
            Overrides {
                api_url: Some("localhost:9000/api".into()),
                ..Default::default()
            },
        );
        assert!(matches!(result, Err(ConfigError::InvalidApiUrl { .. })));
    }

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    struct EnvGuard {
        key: &'static str,
        previous: Option<String>,
        _lock: MutexGuard<'static, ()>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let lock = ENV_LOCK.lock().expect("env mutex poisoned");
            let previous = std::env::var(key).ok();
            std::env::set_var(key, value);
            Self {
                key,
                previous,
                _lock: lock,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(previous) = self.previous.take() {
                std::env::set_var(self.key, previous);
            } else {
                std::env::remove_var(self.key);
            }
        }
    }

    #[test]
    fn from_env_reads_process_environment() {
        let _env = EnvGuard::set("CLINIC_API_URL", "http://api.clinic.test:8081");
        let config = Config::from_env(Overrides::default()).unwrap();
        assert_eq!(config.api_url, "http://api.clinic.test:8081");
    }
}
