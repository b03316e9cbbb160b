//! Storage contracts for credentials and sessions.
//!
//! The resolver only talks to these traits. Each operation must be atomic at
//! the store; the resolver adds no locking of its own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::auth::identity::Role;

/// Seconds since the Unix epoch.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Error returned by a store operation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("store data is malformed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("login already exists: {0}")]
    DuplicateLogin(String),

    #[error("unknown login: {0}")]
    UnknownLogin(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A stored user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: Uuid,
    pub login: String,
    pub name: String,
    /// Hex digest produced by [`crate::auth::PasswordHasher`]. Empty for
    /// tickets.
    pub password_hash: String,
    pub role: Role,
    /// Password-less guest reached through a `?ticket=` link.
    #[serde(default)]
    pub ticket: bool,
}

impl Credential {
    /// An account that signs in with a password.
    pub fn with_password(login: &str, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            login: login.to_string(),
            name: login.to_string(),
            password_hash,
            role,
            ticket: false,
        }
    }

    /// A guest that can only be reached by ticket. It has no password, so
    /// password login never accepts it.
    pub fn ticket(ticket: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            login: ticket.to_string(),
            name: ticket.to_string(),
            password_hash: String::new(),
            role: Role::Guest,
            ticket: true,
        }
    }

    /// True when a `?ticket=` link may open a session for this account.
    pub fn redeemable(&self) -> bool {
        self.ticket && self.role == Role::Guest && self.password_hash.is_empty()
    }
}

/// How a session was established; decides its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// Password login, long-lived.
    Session,
    /// Password-less ticket login, short-lived.
    Ticket,
}

/// A persisted proof of identity keyed by an opaque token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub owner_id: Uuid,
    pub owner_login: String,
    pub role: Role,
    pub kind: SessionKind,
    /// Expiry, seconds since epoch. Fixed at creation.
    pub expires_on: u64,
    /// Last successful resolution, seconds since epoch.
    pub last_seen_on: u64,
}

impl SessionRecord {
    /// A record is live strictly before its expiry.
    pub fn is_live(&self, now: u64) -> bool {
        self.expires_on > now
    }
}

/// User account lookups.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_credential(&self, login: &str) -> Result<Option<Credential>, StoreError>;

    /// True when `login` is a password account with exactly this hash.
    /// Ticket credentials never verify.
    async fn verify(&self, login: &str, password_hash: &str) -> Result<bool, StoreError>;

    async fn create_user(&self, credential: Credential) -> Result<(), StoreError>;

    async fn set_password(&self, login: &str, password_hash: &str) -> Result<(), StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;
}

/// Session record persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Look up a record. Expired records may still be returned.
    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError>;

    async fn create(&self, record: SessionRecord) -> Result<(), StoreError>;

    /// Update `last_seen_on` without touching the expiry.
    async fn touch(&self, session_id: &str, now: u64) -> Result<(), StoreError>;

    /// Deleting a missing record is not an error.
    async fn delete_by_token(&self, session_id: &str) -> Result<(), StoreError>;

    /// Remove every record with `expires_on <= now`. Returns how many went.
    async fn delete_expired(&self, now: u64) -> Result<usize, StoreError>;

    /// Remove every record owned by `owner_id`, live or not.
    async fn delete_all_for_owner(&self, owner_id: Uuid) -> Result<usize, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_liveness() {
        let now = unix_now();
        let mut record = SessionRecord {
            session_id: "t".into(),
            owner_id: Uuid::new_v4(),
            owner_login: "user1".into(),
            role: Role::Admin,
            kind: SessionKind::Session,
            expires_on: now + 10,
            last_seen_on: now,
        };
        assert!(record.is_live(now));
        record.expires_on = now;
        assert!(!record.is_live(now));
        record.expires_on = now - 10;
        assert!(!record.is_live(now));
    }

    #[test]
    fn test_only_tickets_are_redeemable() {
        assert!(Credential::ticket("t-1").redeemable());
        assert!(!Credential::with_password("user2", "hash".into(), Role::Guest).redeemable());
        assert!(!Credential::with_password("user1", "hash".into(), Role::Admin).redeemable());

        let mut forged = Credential::ticket("t-2");
        forged.password_hash = "hash".into();
        assert!(!forged.redeemable());
    }

    #[test]
    fn test_ticket_flag_defaults_off() {
        let json = r#"{"id":"67e55044-10b1-426f-9247-bb680e5fe0c8","login":"user2","name":"user2","password_hash":"h","role":"guest"}"#;
        let credential: Credential = serde_json::from_str(json).unwrap();
        assert!(!credential.ticket);
    }
}
