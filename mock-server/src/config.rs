use std::env;

use thiserror::Error;
use tracing::{info, warn};

use crate::Settings;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be {expected}, got {value:?}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
        value: String,
    },
}

pub struct Config {
    pub port: u16,
    pub settings: Settings,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port = var(&lookup, "PORT", "8080");
        let port = port.parse().map_err(|_| {
            warn!("Invalid PORT value: {port}");
            ConfigError::Invalid {
                key: "PORT",
                expected: "a port number",
                value: port.clone(),
            }
        })?;

        let require_auth = var(&lookup, "MOCK_REQUIRE_AUTH", "false");
        let require_auth = match require_auth.as_str() {
            "1" | "true" => true,
            "0" | "false" => false,
            _ => {
                return Err(ConfigError::Invalid {
                    key: "MOCK_REQUIRE_AUTH",
                    expected: "true or false",
                    value: require_auth,
                })
            }
        };

        Ok(Self {
            port,
            settings: Settings { require_auth },
        })
    }
}

fn var(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}
