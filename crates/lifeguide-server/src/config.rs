//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! - `LIFEGUIDE_HOST` - Bind address (default: 0.0.0.0)
//! - `LIFEGUIDE_PORT` - Listen port (default: 5000)
//! - `LIFEGUIDE_DEMO_MODE` - Use canned responses instead of the completion API
//!   (default: true when no API key is set)
//! - `OPENAI_API_KEY` - Completion API key (`OPENAI_API_KEY_ENV_VAR` is also accepted)
//! - `OPENAI_BASE_URL` - Completion API base URL (default: https://api.openai.com/v1)
//! - `OPENAI_MODEL` - Model name (default: gpt-4o)
//! - `LIFEGUIDE_DB_PATH` - SQLite file; in-memory storage when unset
//! - `LIFEGUIDE_STATIC_DIR` - Directory with the built web client

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

use lifeguide_assistant::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("LIFEGUIDE_DEMO_MODE=false requires OPENAI_API_KEY")]
    MissingApiKey,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub demo_mode: bool,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub db_path: Option<PathBuf>,
    pub static_dir: Option<PathBuf>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = get("LIFEGUIDE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = match get("LIFEGUIDE_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidEnvVar("LIFEGUIDE_PORT".into(), raw))?,
            None => 5000,
        };
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar("LIFEGUIDE_HOST".into(), host))?;

        let openai_api_key = get("OPENAI_API_KEY").or_else(|| get("OPENAI_API_KEY_ENV_VAR"));

        let demo_mode = match get("LIFEGUIDE_DEMO_MODE") {
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| ConfigError::InvalidEnvVar("LIFEGUIDE_DEMO_MODE".into(), raw))?,
            None => openai_api_key.is_none(),
        };
        if !demo_mode && openai_api_key.is_none() {
            return Err(ConfigError::MissingApiKey);
        }

        Ok(Self {
            addr,
            demo_mode,
            openai_api_key,
            openai_base_url: get("OPENAI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            openai_model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            db_path: get("LIFEGUIDE_DB_PATH").map(PathBuf::from),
            static_dir: get("LIFEGUIDE_STATIC_DIR").map(PathBuf::from),
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_demo_mode_without_key() {
        let cfg = config(&[]).unwrap();
        assert!(cfg.demo_mode);
        assert_eq!(cfg.addr.port(), 5000);
        assert_eq!(cfg.openai_model, "gpt-4o");
        assert!(cfg.db_path.is_none());
    }

    #[test]
    fn api_key_disables_demo_mode_by_default() {
        let cfg = config(&[("OPENAI_API_KEY", "sk-test")]).unwrap();
        assert!(!cfg.demo_mode);
        assert_eq!(cfg.openai_api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn legacy_key_variable_is_accepted() {
        let cfg = config(&[("OPENAI_API_KEY_ENV_VAR", "sk-legacy")]).unwrap();
        assert_eq!(cfg.openai_api_key.as_deref(), Some("sk-legacy"));
    }

    #[test]
    fn demo_mode_can_be_forced_with_key() {
        let cfg = config(&[("OPENAI_API_KEY", "sk-test"), ("LIFEGUIDE_DEMO_MODE", "true")]).unwrap();
        assert!(cfg.demo_mode);
    }

    #[test]
    fn live_mode_without_key_is_an_error() {
        let err = config(&[("LIFEGUIDE_DEMO_MODE", "false")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
    }

    #[test]
    fn bad_values_are_rejected() {
        assert!(matches!(
            config(&[("LIFEGUIDE_PORT", "http")]).unwrap_err(),
            ConfigError::InvalidEnvVar(..)
        ));
        assert!(matches!(
            config(&[("LIFEGUIDE_DEMO_MODE", "maybe")]).unwrap_err(),
            ConfigError::InvalidEnvVar(..)
        ));
        assert!(matches!(
            config(&[("LIFEGUIDE_HOST", "not a host")]).unwrap_err(),
            ConfigError::InvalidEnvVar(..)
        ));
    }
}
