//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → BLOG_* environment overrides
//!     → validation.rs (semantic checks)
//!     → BlogConfig (validated, immutable)
//!     → passed by value/reference to each subsystem at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; no lazily computed globals
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::AuthConfig;
pub use schema::BlogConfig;
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::UsersConfig;
