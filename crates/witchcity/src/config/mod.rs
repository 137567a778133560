use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use chrono::{DateTime, Duration, Utc};

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

pub const DEFAULT_EARLY_CHECKIN_MINUTES: i64 = 30;
/// Check-in may open at most a day ahead of the event start.
pub const EARLY_CHECKIN_CEILING_MINUTES: i64 = 24 * 60;
pub const DEFAULT_SYNC_MAX_RETRIES: u32 = 5;
/// Upper bound enforced by the offline queue's storage constraint.
pub const SYNC_RETRY_CEILING: u32 = 10;
pub const DEFAULT_ESTIMATED_REVIEW_DAYS: i64 = 14;
pub const ESTIMATED_REVIEW_DAYS_CEILING: i64 = 365;

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub checkin: CheckInConfig,
    pub vetting: VettingConfig,
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

        let early_window_minutes = match env::var("CHECKIN_EARLY_WINDOW_MINUTES") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|minutes| (0..=EARLY_CHECKIN_CEILING_MINUTES).contains(minutes))
                .ok_or(ConfigError::InvalidNumber {
                    key: "CHECKIN_EARLY_WINDOW_MINUTES",
                    value: raw,
                })?,
            Err(_) => DEFAULT_EARLY_CHECKIN_MINUTES,
        };

        let max_sync_retries = match env::var("OFFLINE_SYNC_MAX_RETRIES") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|retries| (1..=SYNC_RETRY_CEILING).contains(retries))
                .ok_or(ConfigError::InvalidNumber {
                    key: "OFFLINE_SYNC_MAX_RETRIES",
                    value: raw,
                })?,
            Err(_) => DEFAULT_SYNC_MAX_RETRIES,
        };

        let estimated_review_days = match env::var("VETTING_ESTIMATED_REVIEW_DAYS") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|days| (1..=ESTIMATED_REVIEW_DAYS_CEILING).contains(days))
                .ok_or(ConfigError::InvalidNumber {
                    key: "VETTING_ESTIMATED_REVIEW_DAYS",
                    value: raw,
                })?,
            Err(_) => DEFAULT_ESTIMATED_REVIEW_DAYS,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
                include_targets: environment != AppEnvironment::Production,
            },
            checkin: CheckInConfig {
                early_window_minutes,
                max_sync_retries,
            },
            vetting: VettingConfig {
                estimated_review_days,
            },
        })
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

/// Tracing output controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
    pub include_targets: bool,
}

/// Door-side rules for check-in and offline reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInConfig {
    pub early_window_minutes: i64,
    pub max_sync_retries: u32,
}

impl CheckInConfig {
    /// Earliest instant door staff may check attendees in for an event starting at
    /// `starts_at`. Windows too large to represent open at the earliest representable time.
    pub fn opens_at(&self, starts_at: DateTime<Utc>) -> DateTime<Utc> {
        Duration::try_minutes(self.early_window_minutes.max(0))
            .and_then(|window| starts_at.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

impl Default for CheckInConfig {
    fn default() -> Self {
        Self {
            early_window_minutes: DEFAULT_EARLY_CHECKIN_MINUTES,
            max_sync_retries: DEFAULT_SYNC_MAX_RETRIES,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VettingConfig {
    pub estimated_review_days: i64,
}

impl Default for VettingConfig {
    fn default() -> Self {
        Self {
            estimated_review_days: DEFAULT_ESTIMATED_REVIEW_DAYS,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} has an out-of-range or non-numeric value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
