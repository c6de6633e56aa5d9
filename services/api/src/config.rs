//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use tracing::Level;
use tutor_core::validation::DEFAULT_ALLOWED_DOMAINS;

/// Upper bound for `SESSION_TTL_DAYS`, keeping session expiry well inside chrono's range.
pub const MAX_SESSION_TTL_DAYS: i64 = 3650;

pub const DEFAULT_GENERATION_API_BASE: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    /// Absent keys don't stop the server; tutor requests fail until one is set.
    pub gemini_api_key: Option<String>,
    pub generation_api_base: String,
    pub tutor_model: String,
    pub allowed_email_domains: Vec<String>,
    pub admin_emails: Vec<String>,
    pub session_ttl_days: i64,
    pub cors_origin: String,
    pub app_base_url: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load the Generation Service Settings ---
        let gemini_api_key = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let generation_api_base = std::env::var("GENERATION_API_BASE")
            .unwrap_or_else(|_| DEFAULT_GENERATION_API_BASE.to_string());
        let tutor_model =
            std::env::var("TUTOR_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());

        // --- Load Account Settings ---
        let allowed_email_domains = match std::env::var("ALLOWED_EMAIL_DOMAINS") {
            Ok(list) => parse_list(&list),
            Err(_) => DEFAULT_ALLOWED_DOMAINS.iter().map(|d| d.to_string()).collect(),
        };
        if allowed_email_domains.is_empty() {
            return Err(ConfigError::InvalidValue(
                "ALLOWED_EMAIL_DOMAINS".to_string(),
                "at least one domain is required".to_string(),
            ));
        }
        let admin_emails = std::env::var("ADMIN_EMAILS")
            .map(|list| parse_list(&list))
            .unwrap_or_default();

        let session_ttl_str =
            std::env::var("SESSION_TTL_DAYS").unwrap_or_else(|_| "30".to_string());
        let session_ttl_days = parse_session_ttl(&session_ttl_str)?;

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let app_base_url =
            std::env::var("APP_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            gemini_api_key,
            generation_api_base,
            tutor_model,
            allowed_email_domains,
            admin_emails,
            session_ttl_days,
            cors_origin,
            app_base_url: app_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Whether sign-ups with this (normalized) email receive the admin role.
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.iter().any(|admin| admin == email)
    }
}

fn parse_session_ttl(value: &str) -> Result<i64, ConfigError> {
    value
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|days| (1..=MAX_SESSION_TTL_DAYS).contains(days))
        .ok_or_else(|| {
            ConfigError::InvalidValue(
                "SESSION_TTL_DAYS".to_string(),
                format!(
                    "'{}' is not a number of days between 1 and {}",
                    value, MAX_SESSION_TTL_DAYS
                ),
            )
        })
}

/// Splits a comma separated list, lowercasing entries and dropping blanks.
fn parse_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(|item| item.trim().to_ascii_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}
