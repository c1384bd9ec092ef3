use std::env;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use crate::error::AppError;

/// Tokens must expire, and `chrono::Duration::days` panics far below `i64::MAX`.
const TOKEN_TTL_DAYS: RangeInclusive<i64> = 1..=3_650;
const BCRYPT_COSTS: RangeInclusive<u32> = 4..=31;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub event_buffer_size: usize,
    pub request_timeout_ms: u64,
    pub jwt_secret: String,
    pub token_ttl_days: i64,
    pub bcrypt_cost: u32,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let jwt_secret = env::var("JWT_SECRET")
            .ok()
            .filter(|secret| !secret.trim().is_empty())
            .ok_or_else(|| AppError::Internal("JWT_SECRET must be set".to_string()))?;

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 5000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: parse_log_format(env::var("LOG_FORMAT").ok().as_deref())?,
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            request_timeout_ms: parse_or_default("REQUEST_TIMEOUT_MS", 10_000)?,
            jwt_secret,
            token_ttl_days: within(
                "TOKEN_TTL_DAYS",
                parse_or_default("TOKEN_TTL_DAYS", 30)?,
                TOKEN_TTL_DAYS,
            )?,
            bcrypt_cost: within(
                "BCRYPT_COST",
                parse_or_default("BCRYPT_COST", 10)?,
                BCRYPT_COSTS,
            )?,
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("uploads")),
            max_upload_bytes: parse_or_default("MAX_UPLOAD_BYTES", 5 * 1024 * 1024)?,
        })
    }
}

/// Development defaults. `from_env` is the only path that reads the process environment.
impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 5000,
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            event_buffer_size: 1024,
            request_timeout_ms: 10_000,
            jwt_secret: "development-secret".to_string(),
            token_ttl_days: 30,
            bcrypt_cost: 10,
            upload_dir: PathBuf::from("uploads"),
            max_upload_bytes: 5 * 1024 * 1024,
        }
    }
}

fn parse_log_format(raw: Option<&str>) -> Result<LogFormat, AppError> {
    match raw.map(|value| value.trim().to_ascii_lowercase()) {
        None => Ok(LogFormat::Compact),
        Some(value) if value == "compact" => Ok(LogFormat::Compact),
        Some(value) if value == "json" => Ok(LogFormat::Json),
        Some(other) => Err(AppError::Internal(format!(
            "invalid LOG_FORMAT: {other}, expected compact or json"
        ))),
    }
}

fn within<T>(key: &str, value: T, range: RangeInclusive<T>) -> Result<T, AppError>
where
    T: PartialOrd + std::fmt::Display,
{
    if range.contains(&value) {
        return Ok(value);
    }
    Err(AppError::Internal(format!(
        "invalid {key}: {value} is outside {}..={}",
        range.start(),
        range.end()
    )))
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
