//! Server configuration, read from the environment.
//!
//! | Variable                 | Default                   |
//! |--------------------------|---------------------------|
//! | `HOST`                   | `127.0.0.1`               |
//! | `PORT`                   | `3000`                    |
//! | `GROQ_API_KEY`           | unset                     |
//! | `CHATKIT_DATA_DIR`       | unset (in-memory settings)|
//! | `CHAT_MAX_DURATION_SECS` | `30`                      |
//! | `CHAT_DEFAULT_MODEL`     | `llama-3.3-70b-versatile` |

use std::path::PathBuf;
use std::time::Duration;

/// Default chat model.
pub const LLAMA_MODEL: &str = "llama-3.3-70b-versatile";
/// Reasoning model; its reasoning is returned separately from the text.
pub const DEEPSEEK_MODEL: &str = "deepseek-r1-distill-llama-70b";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Key for the Groq chat and transcription APIs.
    pub groq_api_key: Option<String>,
    /// Directory for persisted tool settings. In-memory when unset.
    pub data_dir: Option<PathBuf>,
    /// Hard wall-clock limit for one chat response.
    pub chat_max_duration: Duration,
    pub default_model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            groq_api_key: None,
            data_dir: None,
            chat_max_duration: Duration::from_secs(30),
            default_model: LLAMA_MODEL.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let non_empty = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let port = match non_empty("PORT") {
            Some(v) => parse_var("PORT", &v)?,
            None => defaults.port,
        };
        let chat_max_duration = match non_empty("CHAT_MAX_DURATION_SECS") {
            Some(v) => {
                let secs: u64 = parse_var("CHAT_MAX_DURATION_SECS", &v)?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        var: "CHAT_MAX_DURATION_SECS",
                        value: v,
                    });
                }
                Duration::from_secs(secs)
            }
            None => defaults.chat_max_duration,
        };

        Ok(Self {
            host: non_empty("HOST").unwrap_or(defaults.host),
            port,
            groq_api_key: non_empty("GROQ_API_KEY"),
            data_dir: non_empty("CHATKIT_DATA_DIR").map(PathBuf::from),
            chat_max_duration,
            default_model: non_empty("CHAT_DEFAULT_MODEL").unwrap_or(defaults.default_model),
        })
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.groq_api_key, None);
        assert_eq!(config.chat_max_duration, Duration::from_secs(30));
        assert_eq!(config.default_model, LLAMA_MODEL);
    }

    #[test]
    fn test_overrides_and_blank_key() {
        let config = config_from(&[
            ("PORT", "8080"),
            ("GROQ_API_KEY", "   "),
            ("CHATKIT_DATA_DIR", "/tmp/chatkit"),
            ("CHAT_MAX_DURATION_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.groq_api_key, None);
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/chatkit")));
        assert_eq!(config.chat_max_duration, Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_numbers() {
        assert_eq!(
            config_from(&[("PORT", "http")]).unwrap_err(),
            ConfigError::InvalidValue {
                var: "PORT",
                value: "http".to_string()
            }
        );
        assert!(config_from(&[("CHAT_MAX_DURATION_SECS", "0")]).is_err());
    }
}
