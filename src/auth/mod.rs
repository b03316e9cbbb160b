//! Session and authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request (cookies, ?ticket=)
//!     → resolver.rs (session cookie → ticket cookie → ticket param → anonymous)
//!     → store.rs (SessionStore / CredentialStore contracts)
//!     → Identity (per request, passed explicitly)
//!
//! Login:
//!     password → password.rs (salted SHA-256) → CredentialStore::verify
//!     → admin? drop every other session of the owner
//!     → sweep expired sessions
//!     → token.rs (random token) → SessionStore::create → cookies.rs
//! ```
//!
//! # Design Decisions
//! - Invalid or expired tokens downgrade to the next mechanism, never error
//! - Touch failures are logged and ignored
//! - Sessions and tickets share storage, told apart by their lifetime
//! - No in-process locking; the store's per-entry atomicity is enough

pub mod accounts;
pub mod cookies;
pub mod error;
pub mod identity;
pub mod memory;
pub mod password;
pub mod resolver;
pub mod store;
pub mod token;

pub use accounts::Accounts;
pub use error::AuthError;
pub use identity::{Identity, Role};
pub use memory::MemoryStore;
pub use password::PasswordHasher;
pub use resolver::{SessionPolicy, SessionResolver};
pub use store::{Credential, CredentialStore, SessionKind, SessionRecord, SessionStore, StoreError};
