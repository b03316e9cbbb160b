//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::BlogConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load configuration: TOML file (defaults when `path` is None), then
/// environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<BlogConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(ConfigError::Parse)?
        }
        None => BlogConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply `BLOG_*` overrides. Empty values are ignored.
pub fn apply_env_overrides<F>(config: &mut BlogConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(v) = get("BLOG_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = get("BLOG_SALT") {
        config.auth.salt = v;
    }
    if let Some(v) = get("BLOG_STORE") {
        config.store.path = Some(v);
    }
    if let Some(v) = get("BLOG_USR") {
        config.users.admin_login = v;
    }
    if let Some(v) = get("BLOG_PASS") {
        config.users.admin_password = v;
    }
    if let Some(v) = get("BLOG_GUEST_USR") {
        config.users.guest_login = v;
    }
    if let Some(v) = get("BLOG_GUEST_PASS") {
        config.users.guest_password = v;
    }
}
