//! Configuration types.
//!
//! Everything comes from environment variables. A missing value turns the
//! matching feature off; only a malformed number is an error.

use std::time::Duration;

use secrecy::SecretString;

use crate::dashboards::DashboardConfig;
use crate::error::ConfigError;
use crate::llm::{DEFAULT_BASE_URL, DEFAULT_MODEL, LlmConfig};
use crate::prediction::PredictionConfig;

const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_IDLE_SECS: u64 = 3600;

/// HTTP API settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Idle HTTP sessions are pruned after this duration.
    pub session_idle_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_HTTP_PORT,
            session_idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS), // 1 hour
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    /// `None` when `MIND_PREDICTION_URL` is unset.
    pub prediction: Option<PredictionConfig>,
    /// `None` when `OPENAI_API_KEY` is unset.
    pub llm: Option<LlmConfig>,
    pub dashboards: DashboardConfig,
    /// Whether to run the terminal REPL.
    pub cli_enabled: bool,
    /// Directory for rolling log files; stderr when unset.
    pub log_dir: Option<String>,
}

impl AppConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let timeout_secs = parse_or(
            get("MIND_HTTP_TIMEOUT_SECS"),
            "MIND_HTTP_TIMEOUT_SECS",
            DEFAULT_HTTP_TIMEOUT_SECS,
        )?;
        // A zero timeout fails every outbound call immediately.
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MIND_HTTP_TIMEOUT_SECS".to_string(),
                message: "must be at least 1 second".to_string(),
            });
        }
        let timeout = Duration::from_secs(timeout_secs);

        let server = ServerConfig {
            port: parse_or(get("MIND_HTTP_PORT"), "MIND_HTTP_PORT", DEFAULT_HTTP_PORT)?,
            session_idle_timeout: Duration::from_secs(parse_or(
                get("MIND_SESSION_IDLE_SECS"),
                "MIND_SESSION_IDLE_SECS",
                DEFAULT_SESSION_IDLE_SECS,
            )?),
        };

        let prediction = get("MIND_PREDICTION_URL").map(|endpoint| PredictionConfig {
            endpoint,
            api_key: get("MIND_PREDICTION_API_KEY").map(SecretString::from),
            timeout,
        });

        let llm = get("OPENAI_API_KEY").map(|key| LlmConfig {
            api_key: SecretString::from(key),
            model: get("MIND_OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: get("MIND_OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout,
        });

        let dashboards = DashboardConfig {
            anxiety_url: get("MIND_DASHBOARD_URL_1"),
            depression_url: get("MIND_DASHBOARD_URL_2"),
            factors_url: get("MIND_DASHBOARD_URL_3"),
        };

        let cli_enabled = !matches!(
            get("MIND_CLI").map(|v| v.to_lowercase()).as_deref(),
            Some("0" | "false" | "no" | "off")
        );

        Ok(Self {
            server,
            prediction,
            llm,
            dashboards,
            cli_enabled,
            log_dir: get("MIND_LOG_DIR"),
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("{raw:?}: {e}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = load(&[]).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.session_idle_timeout, Duration::from_secs(3600));
        assert!(config.prediction.is_none());
        assert!(config.llm.is_none());
        assert!(!config.dashboards.any_configured());
        assert!(config.cli_enabled);
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn reads_every_service() {
        let config = load(&[
            ("MIND_PREDICTION_URL", "http://localhost:9000/predict"),
            ("MIND_PREDICTION_API_KEY", "p-key"),
            ("OPENAI_API_KEY", "sk-test"),
            ("MIND_OPENAI_MODEL", "gpt-4o"),
            ("MIND_HTTP_TIMEOUT_SECS", "5"),
            ("MIND_DASHBOARD_URL_2", "https://viz.example/depression"),
            ("MIND_HTTP_PORT", "9090"),
        ])
        .unwrap();

        let prediction = config.prediction.unwrap();
        assert_eq!(prediction.endpoint, "http://localhost:9000/predict");
        assert_eq!(prediction.api_key.unwrap().expose_secret(), "p-key");
        assert_eq!(prediction.timeout, Duration::from_secs(5));

        let llm = config.llm.unwrap();
        assert_eq!(llm.api_key.expose_secret(), "sk-test");
        assert_eq!(llm.model, "gpt-4o");
        assert_eq!(llm.base_url, DEFAULT_BASE_URL);

        assert_eq!(
            config.dashboards.depression_url.as_deref(),
            Some("https://viz.example/depression")
        );
        assert_eq!(config.server.port, 9090);
    }

    #[test]
    fn empty_values_count_as_unset() {
        let config = load(&[("OPENAI_API_KEY", "  "), ("MIND_HTTP_PORT", "")]).unwrap();
        assert!(config.llm.is_none());
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn invalid_number_is_an_error() {
        let err = load(&[("MIND_HTTP_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MIND_HTTP_PORT"));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = load(&[("MIND_HTTP_TIMEOUT_SECS", "0")]).unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "MIND_HTTP_TIMEOUT_SECS")
        );
        assert!(load(&[("MIND_HTTP_TIMEOUT_SECS", "1")]).is_ok());
    }

    #[test]
    fn cli_can_be_disabled() {
        assert!(!load(&[("MIND_CLI", "0")]).unwrap().cli_enabled);
        assert!(!load(&[("MIND_CLI", "False")]).unwrap().cli_enabled);
        assert!(load(&[("MIND_CLI", "1")]).unwrap().cli_enabled);
    }
}
