//! Console settings read from the environment.
//!
//! # Design
//! `CONSOLE_API_URL` and `CONSOLE_TOKEN_FILE` are looked up once at startup.
//! A missing variable falls back to its default, and the fallback is logged;
//! a present but unusable value is a `ConfigError`. `from_lookup` takes the
//! lookup as a closure so tests never touch the process environment.

use std::env;
use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_TOKEN_FILE: &str = ".console-session.json";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be an http(s) URL, got {value:?}")]
    InvalidUrl { key: &'static str, value: String },

    #[error("{key} must not be empty")]
    Empty { key: &'static str },
}

/// Where the console talks to and where it keeps its session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Base URL every resource path is appended to (`CONSOLE_API_URL`).
    pub api_base_url: String,
    /// JSON file holding the session token (`CONSOLE_TOKEN_FILE`).
    pub token_file: PathBuf,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
        }
    }
}

impl ConsoleConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_base_url = load(&lookup, "CONSOLE_API_URL", DEFAULT_API_URL);
        if !(api_base_url.starts_with("http://") || api_base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidUrl {
                key: "CONSOLE_API_URL",
                value: api_base_url,
            });
        }

        let token_file = load(&lookup, "CONSOLE_TOKEN_FILE", DEFAULT_TOKEN_FILE);
        if token_file.trim().is_empty() {
            return Err(ConfigError::Empty {
                key: "CONSOLE_TOKEN_FILE",
            });
        }

        Ok(Self {
            api_base_url,
            token_file: PathBuf::from(token_file),
        })
    }
}

fn load(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    })
}
