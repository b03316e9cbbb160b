//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, lifetimes > 0)
//! - Check bootstrap users are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BlogConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::BlogConfig;

/// Longest accepted session or ticket lifetime: a hundred years.
pub const MAX_TTL_DAYS: u64 = 36_500;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub fn validate_config(config: &BlogConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let address = &config.listener.bind_address;
    // Host names such as "localhost:9001" are resolved at bind time.
    if address.parse::<SocketAddr>().is_err() && !has_port(address) {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("expected host:port, got {:?}", address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than 0"));
    }
    if config.auth.session_ttl_days == 0 {
        errors.push(ValidationError::new("auth.session_ttl_days", "must be greater than 0"));
    }
    if config.auth.ticket_ttl_days == 0 {
        errors.push(ValidationError::new("auth.ticket_ttl_days", "must be greater than 0"));
    }
    for (field, days) in [
        ("auth.session_ttl_days", config.auth.session_ttl_days),
        ("auth.ticket_ttl_days", config.auth.ticket_ttl_days),
    ] {
        if days > MAX_TTL_DAYS {
            errors.push(ValidationError::new(field, format!("must be at most {}", MAX_TTL_DAYS)));
        }
    }
    if config.auth.ticket_ttl_days > config.auth.session_ttl_days {
        errors.push(ValidationError::new(
            "auth.ticket_ttl_days",
            "must not exceed auth.session_ttl_days",
        ));
    }

    let users = &config.users;
    if users.admin_login.is_empty() || users.admin_password.is_empty() {
        errors.push(ValidationError::new("users.admin_login", "admin login and password are required"));
    }
    if users.guest_login.is_empty() || users.guest_password.is_empty() {
        errors.push(ValidationError::new("users.guest_login", "guest login and password are required"));
    }
    if users.admin_login == users.guest_login {
        errors.push(ValidationError::new("users.guest_login", "must differ from users.admin_login"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("not a socket address: {:?}", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn has_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&BlogConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = BlogConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.timeouts.request_secs = 0;
        config.auth.ticket_ttl_days = 400;
        config.users.guest_login = "user1".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "timeouts.request_secs",
                "auth.ticket_ttl_days",
                "users.guest_login",
            ]
        );
    }

    #[test]
    fn test_bind_address_forms() {
        assert!(has_port("localhost:9001"));
        assert!(!has_port(":9001"));
        assert!(!has_port("localhost"));
        let mut config = BlogConfig::default();
        config.listener.bind_address = "0.0.0.0:8080".into();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_ttl_upper_bound() {
        let mut config = BlogConfig::default();
        config.auth.session_ttl_days = MAX_TTL_DAYS;
        config.auth.ticket_ttl_days = MAX_TTL_DAYS;
        assert_eq!(validate_config(&config), Ok(()));

        config.auth.session_ttl_days = u64::MAX;
        config.auth.ticket_ttl_days = MAX_TTL_DAYS + 1;
        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert!(fields.contains(&"auth.session_ttl_days"));
        assert!(fields.contains(&"auth.ticket_ttl_days"));
    }
}
