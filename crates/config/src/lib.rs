use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_CONFIG_FILES: &[&str] = &[
    "warbler.toml",
    "config/warbler.toml",
    "crates/config/warbler.toml",
    "../warbler.toml",
    "../config/warbler.toml",
    "../crates/config/warbler.toml",
];

/// Secret used when nothing is configured. Only suitable for local development.
pub const DEVELOPMENT_JWT_SECRET: &str = "warbler-development-secret";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub registration: RegistrationConfig,
    pub queue: QueueConfig,
    pub email: EmailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
    #[serde(default = "HttpConfig::default_shutdown_grace")]
    pub shutdown_grace_seconds: u64,
}

impl HttpConfig {
    const fn default_shutdown_grace() -> u64 {
        10
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 7070,
            shutdown_grace_seconds: Self::default_shutdown_grace(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://warbler.db".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "AuthConfig::default_secret")]
    pub jwt_secret: String,
    #[serde(default = "AuthConfig::default_access_ttl")]
    pub access_token_ttl_seconds: u64,
    #[serde(default = "AuthConfig::default_refresh_ttl")]
    pub refresh_token_ttl_seconds: u64,
}

impl AuthConfig {
    fn default_secret() -> String {
        DEVELOPMENT_JWT_SECRET.to_string()
    }

    const fn default_access_ttl() -> u64 {
        3_600
    }

    const fn default_refresh_ttl() -> u64 {
        2_592_000
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Self::default_secret(),
            access_token_ttl_seconds: Self::default_access_ttl(),
            refresh_token_ttl_seconds: Self::default_refresh_ttl(),
        }
    }
}

/// Lifetime of pending (unverified) registrations.
///
/// ```
/// use warbler_config::RegistrationConfig;
///
/// let registration = RegistrationConfig::default();
/// assert_eq!(registration.code_ttl_seconds, 300);
/// assert_eq!(registration.sweep_interval_seconds, 600);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    #[serde(default = "RegistrationConfig::default_code_ttl")]
    pub code_ttl_seconds: u64,
    #[serde(default = "RegistrationConfig::default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl RegistrationConfig {
    const fn default_code_ttl() -> u64 {
        300
    }

    const fn default_sweep_interval() -> u64 {
        600
    }
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            code_ttl_seconds: Self::default_code_ttl(),
            sweep_interval_seconds: Self::default_sweep_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    #[serde(default)]
    pub redis_url: Option<String>,
    #[serde(default = "QueueConfig::default_topic")]
    pub topic: String,
}

impl QueueConfig {
    fn default_topic() -> String {
        "send_notification".to_string()
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            topic: Self::default_topic(),
        }
    }
}

/// Settings for the transactional email API.
///
/// ```
/// use warbler_config::EmailConfig;
///
/// let email = EmailConfig::default();
/// assert_eq!(email.base_url, "https://api.brevo.com/v3");
/// assert_eq!(email.request_timeout_seconds, 30);
/// assert!(email.api_key.is_none());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "EmailConfig::default_base_url")]
    pub base_url: String,
    #[serde(default = "EmailConfig::default_sender_email")]
    pub sender_email: String,
    #[serde(default = "EmailConfig::default_sender_name")]
    pub sender_name: String,
    #[serde(default = "EmailConfig::default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl EmailConfig {
    fn default_base_url() -> String {
        "https://api.brevo.com/v3".to_string()
    }

    fn default_sender_email() -> String {
        "no-reply@warbler.local".to_string()
    }

    fn default_sender_name() -> String {
        "Warbler".to_string()
    }

    const fn default_request_timeout() -> u64 {
        30
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Self::default_base_url(),
            sender_email: Self::default_sender_email(),
            sender_name: Self::default_sender_name(),
            request_timeout_seconds: Self::default_request_timeout(),
        }
    }
}

fn clamp_to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Load the application configuration by combining defaults, files, and environment overrides.
///
/// ```
/// use warbler_config::load;
///
/// std::env::remove_var("WARBLER_CONFIG");
///
/// let config = load().expect("configuration should load with defaults");
/// assert!(!config.http.address.is_empty());
/// ```
pub fn load() -> anyhow::Result<AppConfig> {
    let defaults = AppConfig::default();

    let mut builder = config::Config::builder()
        .set_default("http.address", defaults.http.address.clone())?
        .set_default("http.port", i64::from(defaults.http.port))?
        .set_default(
            "http.shutdown_grace_seconds",
            clamp_to_i64(defaults.http.shutdown_grace_seconds),
        )?
        .set_default("database.url", defaults.database.url.clone())?
        .set_default(
            "database.max_connections",
            i64::from(defaults.database.max_connections),
        )?
        .set_default("auth.jwt_secret", defaults.auth.jwt_secret.clone())?
        .set_default(
            "auth.access_token_ttl_seconds",
            clamp_to_i64(defaults.auth.access_token_ttl_seconds),
        )?
        .set_default(
            "auth.refresh_token_ttl_seconds",
            clamp_to_i64(defaults.auth.refresh_token_ttl_seconds),
        )?
        .set_default(
            "registration.code_ttl_seconds",
            clamp_to_i64(defaults.registration.code_ttl_seconds),
        )?
        .set_default(
            "registration.sweep_interval_seconds",
            clamp_to_i64(defaults.registration.sweep_interval_seconds),
        )?
        .set_default("queue.topic", defaults.queue.topic.clone())?
        .set_default("email.base_url", defaults.email.base_url.clone())?
        .set_default("email.sender_email", defaults.email.sender_email.clone())?
        .set_default("email.sender_name", defaults.email.sender_name.clone())?
        .set_default(
            "email.request_timeout_seconds",
            clamp_to_i64(defaults.email.request_timeout_seconds),
        )?;

    let environment_overrides = config::Environment::with_prefix("WARBLER").separator("__");

    let mut config_file_attached = false;

    if let Ok(path) = std::env::var("WARBLER_CONFIG") {
        builder = builder.add_source(config::File::from(PathBuf::from(&path)));
        config_file_attached = true;
        debug!(path, "loading configuration via WARBLER_CONFIG");
    } else if let Ok(cwd) = std::env::current_dir() {
        let fallback = DEFAULT_CONFIG_FILES
            .iter()
            .map(|candidate| cwd.join(candidate))
            .find(|path| path.exists());

        if let Some(path) = fallback {
            debug!(path = %path.display(), "loading configuration file");
            builder = builder.add_source(config::File::from(path));
            config_file_attached = true;
        }
    }

    if !config_file_attached {
        debug!("no configuration file found, relying on defaults and environment overrides");
    }

    builder = builder.add_source(environment_overrides);

    let cfg = builder.build().context("unable to build configuration")?;

    let mut config = cfg
        .try_deserialize::<AppConfig>()
        .context("invalid configuration")?;

    for ttl in [
        &mut config.auth.access_token_ttl_seconds,
        &mut config.auth.refresh_token_ttl_seconds,
        &mut config.registration.code_ttl_seconds,
    ] {
        if *ttl > i64::MAX as u64 {
            *ttl = i64::MAX as u64;
        }
    }

    debug!(
        http = ?config.http,
        database = %config.database.url,
        registration = ?config.registration,
        queue = ?config.queue,
        "loaded backend configuration"
    );
    Ok(config)
}
