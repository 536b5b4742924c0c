use std::env;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://mq-warn.db";
pub const DEFAULT_API_PORT: u16 = 8080;
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;
pub const DEFAULT_COUNT_DAYS: u32 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub api_port: u16,
    /// Upper bound the HTTP layer applies to list page sizes.
    pub max_page_size: u32,
    /// Window used by the daily count endpoint when `days` is not given.
    pub default_count_days: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup. Missing keys take their defaults;
    /// present but malformed values are errors.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let api_port = parse_or(&lookup, "API_PORT", DEFAULT_API_PORT)?;

        let max_page_size = parse_or(&lookup, "MAX_PAGE_SIZE", DEFAULT_MAX_PAGE_SIZE)?;
        if max_page_size == 0 {
            return Err("MAX_PAGE_SIZE must be greater than 0".to_string());
        }

        let default_count_days = parse_or(&lookup, "DEFAULT_COUNT_DAYS", DEFAULT_COUNT_DAYS)?;

        Ok(Self {
            database_url,
            api_port,
            max_page_size,
            default_count_days,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, String>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid number, got {:?}", key, raw)),
    }
}
