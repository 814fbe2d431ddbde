use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct IntakeConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub reference_store: ReferenceStoreBackend,
    pub database: DatabaseConfig,
    pub analysis: AnalysisConfig,
    pub smtp: SmtpConfig,
    pub notifications: NotificationConfig,
    /// Largest accepted insurance card upload.
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceStoreBackend {
    Postgres,
    Memory,
}

impl ReferenceStoreBackend {
    fn parse(raw: &str) -> Result<Self, AppError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(AppError::ConfigError(anyhow::anyhow!(
                "unknown REFERENCE_STORE backend '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub endpoint: String,
    pub api_key: Secret<String>,
    pub enabled: bool,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret<String>,
    pub from_email: String,
    pub from_name: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NotificationConfig {
    pub admin_recipients: Vec<String>,
}

impl IntakeConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = common_config.is_production();

        let reference_store =
            ReferenceStoreBackend::parse(&get_env("REFERENCE_STORE", Some("postgres"), false)?)?;

        // The in-memory backend never opens a connection.
        let database_url = match reference_store {
            ReferenceStoreBackend::Postgres => get_env("DATABASE_URL", None, is_prod)?,
            ReferenceStoreBackend::Memory => env::var("DATABASE_URL").unwrap_or_default(),
        };

        Ok(IntakeConfig {
            common: common_config,
            service_name: get_env("SERVICE_NAME", Some("intake-service"), false)?,
            log_level: get_env("LOG_LEVEL", Some("info"), false)?,
            otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
                .ok()
                .filter(|v| !v.is_empty()),
            reference_store,
            database: DatabaseConfig {
                url: Secret::new(database_url),
                max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10),
                min_connections: parse_or("DATABASE_MIN_CONNECTIONS", 1),
                acquire_timeout_secs: parse_or("DATABASE_ACQUIRE_TIMEOUT_SECS", 5),
            },
            analysis: AnalysisConfig {
                endpoint: get_env("DOCUMENT_ANALYSIS_ENDPOINT", Some(""), is_prod)?,
                api_key: Secret::new(get_env("DOCUMENT_ANALYSIS_API_KEY", Some(""), is_prod)?),
                enabled: parse_or("DOCUMENT_ANALYSIS_ENABLED", false),
                timeout_secs: parse_or("DOCUMENT_ANALYSIS_TIMEOUT_SECS", 30),
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("localhost"), is_prod)?,
                port: parse_or("SMTP_PORT", 587),
                user: get_env("SMTP_USER", Some(""), is_prod)?,
                password: Secret::new(get_env("SMTP_PASSWORD", Some(""), is_prod)?),
                from_email: get_env("SMTP_FROM_EMAIL", Some("noreply@example.com"), is_prod)?,
                from_name: get_env("SMTP_FROM_NAME", Some("Order Intake"), is_prod)?,
                enabled: parse_or("SMTP_ENABLED", false),
            },
            notifications: NotificationConfig {
                admin_recipients: split_list(&env::var("ADMIN_NOTIFICATION_EMAILS").unwrap_or_default()),
            },
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
        })
    }

    /// Settings for tests and local runs: in-memory store, providers disabled.
    pub fn local() -> Self {
        Self {
            common: core_config::Config::default(),
            service_name: "intake-service".to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            reference_store: ReferenceStoreBackend::Memory,
            database: DatabaseConfig {
                url: Secret::new(String::new()),
                max_connections: 1,
                min_connections: 0,
                acquire_timeout_secs: 5,
            },
            analysis: AnalysisConfig {
                endpoint: String::new(),
                api_key: Secret::new(String::new()),
                enabled: false,
                timeout_secs: 30,
            },
            smtp: SmtpConfig {
                host: "localhost".to_string(),
                port: 587,
                user: String::new(),
                password: Secret::new(String::new()),
                from_email: "noreply@example.com".to_string(),
                from_name: "Order Intake".to_string(),
                enabled: false,
            },
            notifications: NotificationConfig::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Split a comma-separated list, dropping blank entries.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(
            split_list(" a@example.com, ,b@example.com,"),
            vec!["a@example.com".to_string(), "b@example.com".to_string()]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!(
            ReferenceStoreBackend::parse("Memory").unwrap(),
            ReferenceStoreBackend::Memory
        );
        assert_eq!(
            ReferenceStoreBackend::parse("postgres").unwrap(),
            ReferenceStoreBackend::Postgres
        );
        assert!(ReferenceStoreBackend::parse("mongo").is_err());
    }
}
