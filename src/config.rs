use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    #[serde(default)]
    pub geocoding: GeocodingSettings,
    #[serde(default)]
    pub cleaner: CleanerSettings,
    #[serde(default)]
    pub captcha: CaptchaSettings,
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 1 }
fn default_acquire_timeout_secs() -> u64 { 5 }
fn default_idle_timeout_secs() -> u64 { 600 }

/// Nominatim-compatible geocoding service
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodingSettings {
    #[serde(default = "default_geocoding_url")]
    pub base_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_geocoding_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GeocodingSettings {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_url(),
            user_agent: default_user_agent(),
            timeout_secs: default_geocoding_timeout_secs(),
        }
    }
}

fn default_geocoding_url() -> String { "https://nominatim.openstreetmap.org".to_string() }
fn default_user_agent() -> String { "DistanceCalculator/1.0".to_string() }
fn default_geocoding_timeout_secs() -> u64 { 10 }

/// OpenAI-compatible address cleaning service
#[derive(Debug, Clone, Deserialize)]
pub struct CleanerSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_cleaner_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CleanerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            base_url: default_cleaner_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_upstream_timeout_secs(),
        }
    }
}

fn default_true() -> bool { true }
fn default_cleaner_url() -> String { "https://api.openai.com".to_string() }
fn default_model() -> String { "gpt-3.5-turbo".to_string() }
fn default_max_tokens() -> u32 { 150 }
fn default_upstream_timeout_secs() -> u64 { 5 }

/// reCAPTCHA-compatible verification service
#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaSettings {
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_verify_url")]
    pub verify_url: String,
    #[serde(default = "default_upstream_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CaptchaSettings {
    fn default() -> Self {
        Self {
            secret: String::new(),
            verify_url: default_verify_url(),
            timeout_secs: default_upstream_timeout_secs(),
        }
    }
}

fn default_verify_url() -> String { "https://www.google.com/recaptcha/api/siteverify".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct HistorySettings {
    #[serde(default = "default_history_limit")]
    pub default_limit: u32,
    #[serde(default = "default_history_max_limit")]
    pub max_limit: u32,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            default_limit: default_history_limit(),
            max_limit: default_history_max_limit(),
        }
    }
}

impl HistorySettings {
    /// Requested limit, defaulted when absent; `None` when it exceeds the maximum
    pub fn effective_limit(&self, requested: Option<u32>) -> Option<u32> {
        match requested {
            Some(limit) if limit > self.max_limit => None,
            Some(limit) => Some(limit),
            None => Some(self.default_limit.min(self.max_limit)),
        }
    }
}

fn default_history_limit() -> u32 { 20 }
fn default_history_max_limit() -> u32 { 100 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the structs
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with DISTCALC__)
    /// 5. Deployment variables such as DATABASE_URL and RECAPTCHA_SECRET_KEY
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., DISTCALC__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("DISTCALC")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = apply_deployment_env(settings, |name| std::env::var(name).ok())?;

        settings.try_deserialize()
    }
}

/// Overlay the well-known deployment variables on top of loaded settings
///
/// `DATABASE_URL` wins; without it the URL is assembled from the
/// `POSTGRES_*` variables when `POSTGRES_HOST` is present.
fn apply_deployment_env<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    if let Some(url) = lookup("DATABASE_URL").or_else(|| postgres_url_from_parts(&lookup)) {
        builder = builder.set_override("database.url", url)?;
    }

    let overrides = [
        ("RECAPTCHA_SECRET_KEY", "captcha.secret"),
        ("OPENAI_API_KEY", "cleaner.api_key"),
        ("NOMINATIM_BASE_URL", "geocoding.base_url"),
        ("NOMINATIM_USER_AGENT", "geocoding.user_agent"),
    ];
    for (var, key) in overrides {
        if let Some(value) = lookup(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}

fn postgres_url_from_parts<F>(lookup: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let host = lookup("POSTGRES_HOST")?;
    let user = lookup("POSTGRES_USER").unwrap_or_else(|| "postgres".to_string());
    let password = lookup("POSTGRES_PASSWORD").unwrap_or_default();
    let port = lookup("POSTGRES_PORT").unwrap_or_else(|| "5432".to_string());
    let db = lookup("POSTGRES_DB").unwrap_or_else(|| "postgres".to_string());

    Some(format!("postgres://{}:{}@{}:{}/{}", user, password, host, port, db))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_upstream_timeouts() {
        assert_eq!(GeocodingSettings::default().timeout_secs, 10);
        assert_eq!(CleanerSettings::default().timeout_secs, 5);
        assert_eq!(CaptchaSettings::default().timeout_secs, 5);
    }

    #[test]
    fn test_history_limit_bounds() {
        let history = HistorySettings::default();
        assert_eq!(history.effective_limit(None), Some(20));
        assert_eq!(history.effective_limit(Some(5)), Some(5));
        assert_eq!(history.effective_limit(Some(100)), Some(100));
        assert_eq!(history.effective_limit(Some(101)), None);
        assert_eq!(history.effective_limit(Some(500)), None);
        assert_eq!(history.effective_limit(Some(0)), Some(0));
    }

    #[test]
    fn test_database_url_assembled_from_parts() {
        let lookup = lookup_from(&[
            ("POSTGRES_HOST", "db"),
            ("POSTGRES_USER", "app"),
            ("POSTGRES_PASSWORD", "secret"),
            ("POSTGRES_DB", "distances"),
        ]);
        let config = apply_deployment_env(Config::builder().build().unwrap(), lookup).unwrap();
        let settings: Settings = config.try_deserialize().unwrap();

        assert_eq!(settings.database.url, "postgres://app:secret@db:5432/distances");
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.history.max_limit, 100);
    }

    #[test]
    fn test_deployment_variables_override() {
        let lookup = lookup_from(&[
            ("DATABASE_URL", "postgres://u:p@localhost/x"),
            ("POSTGRES_HOST", "ignored"),
            ("RECAPTCHA_SECRET_KEY", "captcha-secret"),
            ("OPENAI_API_KEY", "sk-test"),
            ("NOMINATIM_USER_AGENT", "Tests/0.1"),
        ]);
        let config = apply_deployment_env(Config::builder().build().unwrap(), lookup).unwrap();
        let settings: Settings = config.try_deserialize().unwrap();

        assert_eq!(settings.database.url, "postgres://u:p@localhost/x");
        assert_eq!(settings.captcha.secret, "captcha-secret");
        assert_eq!(settings.cleaner.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.geocoding.user_agent, "Tests/0.1");
        assert_eq!(settings.geocoding.base_url, "https://nominatim.openstreetmap.org");
    }
}
