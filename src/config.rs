use std::fmt;

pub const DEFAULT_TABLE_PREFIX: &str = "srv_";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 8;

/// Runtime configuration, read from the process environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    /// Concatenated verbatim into every generated statement.
    pub table_prefix: String,
    pub bind_addr: String,
    pub max_connections: u32,
    pub seed_demo: bool,
}

#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{key} must be set"),
            ConfigError::Invalid { key, value } => write!(f, "invalid value for {key}: {value:?}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let table_prefix = lookup("TABLE_PREFIX").unwrap_or_else(|| DEFAULT_TABLE_PREFIX.to_string());
        if !is_valid_prefix(&table_prefix) {
            return Err(ConfigError::Invalid { key: "TABLE_PREFIX", value: table_prefix });
        }

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::Invalid { key: "DB_MAX_CONNECTIONS", value: raw }),
            },
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let seed_demo = match lookup("SEED_DEMO").as_deref().map(str::trim) {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(ConfigError::Invalid { key: "SEED_DEMO", value: other.to_string() });
            }
        };

        Ok(AppConfig {
            database_url,
            table_prefix,
            bind_addr,
            max_connections,
            seed_demo,
        })
    }
}

fn is_valid_prefix(prefix: &str) -> bool {
    prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
