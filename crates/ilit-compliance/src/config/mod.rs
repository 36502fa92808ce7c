use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_ADVISORY_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_ADVISORY_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_MAIL_ENDPOINT: &str = "https://api.resend.com";
pub const DEFAULT_MAIL_FROM: &str = "TrustFlow360 <alerts@trustflow360.com>";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub advisory: AdvisoryConfig,
    pub mail: MailConfig,
    pub sweeps: SweepConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let timeout_secs = parse_positive("ADVISORY_TIMEOUT_SECS", 20)?;
        let advisory = AdvisoryConfig {
            api_key: non_empty_var("ADVISORY_API_KEY"),
            endpoint: non_empty_var("ADVISORY_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_ADVISORY_ENDPOINT.to_string()),
            model: non_empty_var("ADVISORY_MODEL")
                .unwrap_or_else(|| DEFAULT_ADVISORY_MODEL.to_string()),
            timeout: Duration::from_secs(timeout_secs as u64),
        };

        let mail = MailConfig {
            api_key: non_empty_var("MAIL_API_KEY"),
            endpoint: non_empty_var("MAIL_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_MAIL_ENDPOINT.to_string()),
            from_address: non_empty_var("MAIL_FROM")
                .unwrap_or_else(|| DEFAULT_MAIL_FROM.to_string()),
        };

        let sweeps = SweepConfig {
            alert_window_days: parse_positive("ALERT_WINDOW_DAYS", 7)?,
            withdrawal_period_days: parse_positive("WITHDRAWAL_PERIOD_DAYS", 30)?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            advisory,
            mail,
            sweeps,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_positive(name: &'static str, default: i64) -> Result<i64, ConfigError> {
    match non_empty_var(name) {
        None => Ok(default),
        Some(raw) => match raw.parse::<i64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::NonPositive { name, value: raw }),
        },
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Connection details for the AI inference service. A missing key disables the advisory pass.
#[derive(Debug, Clone)]
pub struct AdvisoryConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

/// Transactional email provider settings.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub from_address: String,
}

/// Defaults for the recurring notice sweeps.
#[derive(Debug, Clone, Copy)]
pub struct SweepConfig {
    pub alert_window_days: i64,
    pub withdrawal_period_days: i64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            alert_window_days: 7,
            withdrawal_period_days: 30,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    NonPositive { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::NonPositive { name, value } => {
                write!(f, "{name} must be a positive integer (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::NonPositive { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for name in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "ADVISORY_API_KEY",
            "ADVISORY_ENDPOINT",
            "ADVISORY_MODEL",
            "ADVISORY_TIMEOUT_SECS",
            "MAIL_API_KEY",
            "MAIL_ENDPOINT",
            "MAIL_FROM",
            "ALERT_WINDOW_DAYS",
            "WITHDRAWAL_PERIOD_DAYS",
        ] {
            env::remove_var(name);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.advisory.api_key.is_none());
        assert_eq!(config.advisory.model, DEFAULT_ADVISORY_MODEL);
        assert_eq!(config.advisory.timeout, Duration::from_secs(20));
        assert!(config.mail.api_key.is_none());
        assert_eq!(config.sweeps.alert_window_days, 7);
        assert_eq!(config.sweeps.withdrawal_period_days, 30);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn rejects_non_positive_alert_window() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ALERT_WINDOW_DAYS", "0");
        match AppConfig::load() {
            Err(ConfigError::NonPositive { name, .. }) => assert_eq!(name, "ALERT_WINDOW_DAYS"),
            other => panic!("expected non-positive error, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn blank_keys_are_treated_as_absent() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ADVISORY_API_KEY", "   ");
        env::set_var("MAIL_API_KEY", "re_live_key");
        let config = AppConfig::load().expect("config loads");
        assert!(config.advisory.api_key.is_none());
        assert_eq!(config.mail.api_key.as_deref(), Some("re_live_key"));
        reset_env();
    }
}
