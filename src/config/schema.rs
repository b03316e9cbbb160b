//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the blog.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BlogConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Session and password settings.
    pub auth: AuthConfig,

    /// Where users and sessions are kept.
    pub store: StoreConfig,

    /// Static site files.
    pub site: SiteConfig,

    /// Users created on first start.
    pub users: UsersConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "localhost:9001").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "localhost:9001".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Session and password settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Appended to every password before hashing. Constant per deployment.
    pub salt: String,

    /// Lifetime of a password login session in days.
    pub session_ttl_days: u64,

    /// Lifetime of a ticket session in days.
    pub ticket_ttl_days: u64,

    /// Mark session cookies `Secure` (HTTPS only).
    pub secure_cookies: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            salt: String::new(),
            session_ttl_days: 365,
            ticket_ttl_days: 60,
            secure_cookies: false,
        }
    }
}

/// Store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON file for users and sessions. In-memory only when unset.
    pub path: Option<String>,
}

/// Static file configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Directory served under `/public/`, plus `favicon.ico` and `robots.txt`.
    pub public_dir: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            public_dir: "./public".to_string(),
        }
    }
}

/// Bootstrap accounts.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UsersConfig {
    pub admin_login: String,
    pub admin_password: String,
    pub guest_login: String,
    pub guest_password: String,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            admin_login: "user1".to_string(),
            // WARNING: placeholders, override with BLOG_PASS / BLOG_GUEST_PASS.
            admin_password: "welcome1".to_string(),
            guest_login: "user2".to_string(),
            guest_password: "welcome2".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
