use dotenv::dotenv;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_ca_file: Option<String>,
    pub database_pool_size: usize,
    pub storage_backend: StorageBackend,
    pub api_football_key: String,
    pub api_football_base_url: String,
    pub api_football_rate_limit: u32,
    pub api_football_timeout_seconds: u64,
    pub api_football_max_retries: u32,
    pub api_football_backoff_ms: u64,
    pub cache_ttl_seconds: u64,
    pub max_page_size: i64,
    pub server_host: String,
    pub server_port: u16,
    pub trusted_proxy_ip: IpAddr,
    pub log_config: String,
}

pub const DEFAULT_BASE_URL: &str = "https://v3.football.api-sports.io";

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        dotenv().ok();
        Config::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let storage_backend = match var("STORAGE_BACKEND") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "STORAGE_BACKEND",
                value,
            })?,
            None => StorageBackend::Postgres,
        };
        let database_url = match (var("DATABASE_URL"), storage_backend) {
            (Some(url), _) => url,
            (None, StorageBackend::Memory) => String::new(),
            (None, StorageBackend::Postgres) => return Err(ConfigError::Missing("DATABASE_URL")),
        };

        Ok(Config {
            database_url,
            database_ca_file: var("DATABASE_CA_FILE"),
            database_pool_size: parse_or(&var, "DATABASE_POOL_SIZE", 10)?,
            storage_backend,
            api_football_key: var("API_FOOTBALL_KEY").unwrap_or_default(),
            api_football_base_url: var("API_FOOTBALL_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_football_rate_limit: parse_or(&var, "API_FOOTBALL_RATE_LIMIT", 30)?,
            api_football_timeout_seconds: parse_or(&var, "API_FOOTBALL_TIMEOUT_SECONDS", 10)?,
            api_football_max_retries: parse_or(&var, "API_FOOTBALL_MAX_RETRIES", 3)?,
            api_football_backoff_ms: parse_or(&var, "API_FOOTBALL_BACKOFF_MS", 500)?,
            cache_ttl_seconds: parse_or(&var, "CACHE_TTL_SECONDS", 60)?,
            max_page_size: parse_or(&var, "MAX_PAGE_SIZE", 1000)?,
            server_host: var("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: parse_or(&var, "SERVER_PORT", 8080)?,
            trusted_proxy_ip: parse_or(&var, "TRUSTED_PROXY_IP", IpAddr::from([127, 0, 0, 1]))?,
            log_config: var("LOG_CONFIG").unwrap_or_else(|| "./log-config.yml".to_string()),
        })
    }
}

fn parse_or<T, F>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}
