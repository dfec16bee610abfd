use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PersonConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
    pub app_name: String,
}

/// Upper bounds for database round trips.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    pub connect: Duration,
    pub write: Duration,
    pub read: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            write: Duration::from_secs(5),
            read: Duration::from_secs(30),
        }
    }
}

impl PersonConfig {
    pub fn load() -> Result<Self, AppError> {
        // Handles .env and the APP__ prefix
        let common_config = core_config::Config::load()?;
        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        Ok(PersonConfig {
            common: common_config,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", Some("mongodb://localhost:27017"), is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("senai"), is_prod)?,
                collection: get_env("MONGODB_COLLECTION", Some("people"), is_prod)?,
                app_name: env::var("MONGODB_APP_NAME")
                    .unwrap_or_else(|_| "person-service".to_string()),
            },
            timeouts: TimeoutConfig {
                connect: get_secs("MONGODB_CONNECT_TIMEOUT_SECS", "10", is_prod)?,
                write: get_secs("MONGODB_WRITE_TIMEOUT_SECS", "5", is_prod)?,
                read: get_secs("MONGODB_READ_TIMEOUT_SECS", "30", is_prod)?,
            },
        })
    }
}

fn get_secs(key: &str, default: &str, is_prod: bool) -> Result<Duration, AppError> {
    let raw = get_env(key, Some(default), is_prod)?;
    parse_secs(key, &raw)
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration, AppError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(AppError::ConfigError(anyhow::anyhow!(
            "{} must be a positive number of seconds, got '{}'",
            key,
            raw
        ))),
    }
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
    fn test_parse_secs() {
        assert_eq!(parse_secs("K", "5").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_secs("K", " 30 ").unwrap(), Duration::from_secs(30));
        assert!(parse_secs("K", "0").is_err());
        assert!(parse_secs("K", "-1").is_err());
        assert!(parse_secs("K", "soon").is_err());
    }

    #[test]
    fn test_default_timeouts() {
        let timeouts = TimeoutConfig::default();
        assert_eq!(timeouts.write, Duration::from_secs(5));
        assert_eq!(timeouts.read, Duration::from_secs(30));
        assert_eq!(timeouts.connect, Duration::from_secs(10));
    }

    #[test]
    fn test_get_env_falls_back_to_default_outside_prod() {
        let value = get_env("PERSON_SERVICE_TEST_UNSET_KEY", Some("fallback"), false).unwrap();
        assert_eq!(value, "fallback");
        assert!(get_env("PERSON_SERVICE_TEST_UNSET_KEY", Some("fallback"), true).is_err());
        assert!(get_env("PERSON_SERVICE_TEST_UNSET_KEY", None, false).is_err());
    }
}
