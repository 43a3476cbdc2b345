use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::db::statement::Identifier;

#[derive(Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub host: String,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    pub port: u16,
    pub seed_file: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = env_map
            .get("DATABASE_URL")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let host = env_map
            .get("DB_HOST")
            .cloned()
            .unwrap_or_else(|| "127.0.0.1".to_string());

        let user = env_map
            .get("DB_USER")
            .cloned()
            .unwrap_or_else(|| "root".to_string());

        // No fallback: a password either comes from the environment or the URL.
        let password = env_map.get("DB_PASSWORD").cloned();
        if password.is_none() && database_url.is_none() {
            return Err(ConfigError::MissingEnv("DB_PASSWORD".to_string()));
        }

        let database = env_map
            .get("DB_NAME")
            .cloned()
            .unwrap_or_else(|| "rice".to_string());
        Identifier::new(&database).map_err(|_| {
            ConfigError::InvalidValue(
                "DB_NAME".to_string(),
                "must contain only letters, digits and underscores".to_string(),
            )
        })?;

        let port = env_map
            .get("DB_PORT")
            .map(|s| s.as_str())
            .unwrap_or("3306")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("DB_PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let seed_file = env_map
            .get("SEED_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Ok(Config {
            database_url,
            host,
            user,
            password,
            database,
            port,
            seed_file,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "<redacted>"),
            )
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("database", &self.database)
            .field("port", &self.port)
            .field("seed_file", &self.seed_file)
            .finish()
    }
}
