use chrono_tz::Tz;
use std::env;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be a number")]
    InvalidNumber(&'static str),
    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Timezone used to resolve "today" when a request carries no date
    pub timezone: Tz,
    /// Household members, always listed first in weekly statistics
    pub members: Vec<String>,
    pub cors_origins: Vec<String>,
    pub static_files_path: Option<String>,
    pub maintenance_hour: u32,
    pub maintenance_minute: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let timezone_name = env::var("TIMEZONE").unwrap_or_else(|_| "Europe/Stockholm".to_string());
        let timezone = timezone_name
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimezone(timezone_name.clone()))?;

        let maintenance_hour = parse_number("MAINTENANCE_HOUR", "3")?;
        if maintenance_hour > 23 {
            return Err(ConfigError::InvalidNumber("MAINTENANCE_HOUR"));
        }
        let maintenance_minute = parse_number("MAINTENANCE_MINUTE", "0")?;
        if maintenance_minute > 59 {
            return Err(ConfigError::InvalidNumber("MAINTENANCE_MINUTE"));
        }

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_number("PORT", "8080")?,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:chores.db?mode=rwc".to_string()),
            timezone,
            members: split_list(&env::var("HOUSEHOLD_MEMBERS").unwrap_or_else(|_| "Ambjörn,Sara".to_string())),
            cors_origins: split_list(
                &env::var("CORS_ORIGINS").unwrap_or_else(|_| "http://localhost".to_string()),
            ),
            static_files_path: env::var("STATIC_FILES_PATH").ok(),
            maintenance_hour,
            maintenance_minute,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError> {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidNumber(key))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
