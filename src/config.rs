//! Server configuration from environment variables
//!
//! | Variable | Default |
//! |---|---|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `5000` |
//! | `GEMINI_API_KEY` | unset (AI endpoints answer 503) |
//! | `GEMINI_MODEL` | `gemini-1.5-pro` |
//! | `GEMINI_BASE_URL` | `https://generativelanguage.googleapis.com` |
//! | `GEMINI_TIMEOUT_SECS` | `60` |
//! | `GEMINI_TEMPERATURE` | provider default |
//! | `GEMINI_MAX_OUTPUT_TOKENS` | provider default |
//! | `SESSION_TTL_SECS` | `3600` |
//! | `SESSION_CAPACITY` | `1000` |
//! | `STATIC_DIR` | `static` |
//! | `ADMIN_TOKEN` | unset (session purge disabled) |

use anyhow::{Context, Result};
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::ai_client::{GeminiConfig, DEFAULT_BASE_URL, DEFAULT_MODEL};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub gemini: GeminiConfig,
    pub session_ttl: Duration,
    pub session_capacity: u64,
    pub static_dir: String,
    pub admin_token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 5000,
            gemini: GeminiConfig::default(),
            session_ttl: Duration::from_secs(3600),
            session_capacity: 1000,
            static_dir: "static".to_string(),
            admin_token: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let gemini = GeminiConfig {
            api_key: get("GEMINI_API_KEY"),
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: Duration::from_secs(parse_or(get("GEMINI_TIMEOUT_SECS"), "GEMINI_TIMEOUT_SECS", 60)?),
            temperature: parse_opt(get("GEMINI_TEMPERATURE"), "GEMINI_TEMPERATURE")?,
            max_output_tokens: parse_opt(get("GEMINI_MAX_OUTPUT_TOKENS"), "GEMINI_MAX_OUTPUT_TOKENS")?,
        };

        let session_capacity = parse_or(get("SESSION_CAPACITY"), "SESSION_CAPACITY", defaults.session_capacity)?;
        if session_capacity == 0 {
            anyhow::bail!("SESSION_CAPACITY must be at least 1");
        }

        Ok(Self {
            host: parse_or(get("HOST"), "HOST", defaults.host)?,
            port: parse_or(get("PORT"), "PORT", defaults.port)?,
            gemini,
            session_ttl: Duration::from_secs(parse_or(
                get("SESSION_TTL_SECS"),
                "SESSION_TTL_SECS",
                defaults.session_ttl.as_secs(),
            )?),
            session_capacity,
            static_dir: get("STATIC_DIR").unwrap_or(defaults.static_dir),
            admin_token: get("ADMIN_TOKEN"),
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_opt<T>(value: Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .map(|v| v.parse::<T>().with_context(|| format!("Invalid value for {}: '{}'", key, v)))
        .transpose()
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok(parse_opt(value, key)?.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:5000");
        assert_eq!(config.gemini.model, "gemini-1.5-pro");
        assert!(config.gemini.api_key.is_none());
        assert_eq!(config.session_ttl, Duration::from_secs(3600));
        assert_eq!(config.session_capacity, 1000);
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("GEMINI_API_KEY", "secret"),
            ("GEMINI_MODEL", "gemini-1.5-flash"),
            ("GEMINI_TEMPERATURE", "0.2"),
            ("SESSION_TTL_SECS", "600"),
            ("ADMIN_TOKEN", "  "),
        ]))
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.gemini.api_key.as_deref(), Some("secret"));
        assert_eq!(config.gemini.model, "gemini-1.5-flash");
        assert_eq!(config.gemini.temperature, Some(0.2));
        assert_eq!(config.session_ttl, Duration::from_secs(600));
        // Blank values are treated as unset
        assert!(config.admin_token.is_none());
    }

    #[test]
    fn test_invalid_values_fail() {
        let err = ServerConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        assert!(ServerConfig::from_lookup(lookup(&[("SESSION_CAPACITY", "0")])).is_err());
    }
}
