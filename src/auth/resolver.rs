//! Session resolution, login, logout and ticket redemption.
//!
//! # Resolution order
//! ```text
//! sessionId cookie  → live record? → touch → Identity
//!        ↓ missing / expired / store error
//! ticketId cookie   → live record? → touch → Identity
//!        ↓
//! ?ticket= param    → guest login? → new ticket session + cookie → Identity
//!        ↓
//! anonymous
//! ```
//!
//! Invalid or expired tokens never surface as errors; resolution just moves
//! on to the next mechanism.

use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;

use crate::auth::cookies::{self, SESSION_COOKIE, TICKET_COOKIE};
use crate::auth::error::AuthError;
use crate::auth::identity::Identity;
use crate::auth::password::PasswordHasher;
use crate::auth::store::{
    unix_now, Credential, CredentialStore, SessionKind, SessionRecord, SessionStore,
};
use crate::auth::token::new_session_id;
use crate::config::AuthConfig;
use crate::observability::metrics;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Session lifetimes and cookie flags.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    pub session_ttl_secs: u64,
    pub ticket_ttl_secs: u64,
    pub secure_cookies: bool,
}

impl SessionPolicy {
    fn ttl(&self, kind: SessionKind) -> u64 {
        match kind {
            SessionKind::Session => self.session_ttl_secs,
            SessionKind::Ticket => self.ticket_ttl_secs,
        }
    }

    fn cookie_name(kind: SessionKind) -> &'static str {
        match kind {
            SessionKind::Session => SESSION_COOKIE,
            SessionKind::Ticket => TICKET_COOKIE,
        }
    }
}

impl From<&AuthConfig> for SessionPolicy {
    fn from(config: &AuthConfig) -> Self {
        Self {
            session_ttl_secs: config.session_ttl_days.saturating_mul(SECS_PER_DAY),
            ticket_ttl_secs: config.ticket_ttl_days.saturating_mul(SECS_PER_DAY),
            secure_cookies: config.secure_cookies,
        }
    }
}

/// Turns inbound cookies and tickets into an [`Identity`].
pub struct SessionResolver {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionStore>,
    hasher: PasswordHasher,
    policy: SessionPolicy,
}

impl SessionResolver {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionStore>,
        hasher: PasswordHasher,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            credentials,
            sessions,
            hasher,
            policy,
        }
    }

    /// Resolve the caller of one request.
    ///
    /// Returns the jar to send back; it only changes when a ticket from the
    /// query string was redeemed.
    pub async fn resolve(&self, jar: CookieJar, query_ticket: Option<&str>) -> (Identity, CookieJar) {
        if let Some(token) = cookies::token(&jar, SESSION_COOKIE) {
            if let Some(identity) = self.lookup(&token, SESSION_COOKIE).await {
                metrics::record_session_resolved("session_cookie");
                return (identity, jar);
            }
        }

        if let Some(token) = cookies::token(&jar, TICKET_COOKIE) {
            if let Some(identity) = self.lookup(&token, TICKET_COOKIE).await {
                metrics::record_session_resolved("ticket_cookie");
                return (identity, jar);
            }
        }

        if let Some(ticket) = query_ticket.filter(|t| !t.is_empty()) {
            match self.redeem_ticket(ticket).await {
                Ok((identity, cookie)) => {
                    metrics::record_session_resolved("ticket_param");
                    return (identity, jar.add(cookie));
                }
                Err(e) => tracing::info!(error = %e, "Ticket was not valid"),
            }
        }

        metrics::record_session_resolved("anonymous");
        (Identity::anonymous(), jar)
    }

    /// Look up a live record and touch it.
    async fn lookup(&self, token: &str, source: &'static str) -> Option<Identity> {
        let now = unix_now();
        let record = match self.sessions.get(token).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::debug!(cookie = source, "Session token not found");
                return None;
            }
            Err(e) => {
                tracing::warn!(cookie = source, error = %e, "Session lookup failed");
                return None;
            }
        };

        if !record.is_live(now) {
            tracing::debug!(cookie = source, login = %record.owner_login, "Session token expired");
            return None;
        }

        if let Err(e) = self.sessions.touch(token, now).await {
            tracing::warn!(login = %record.owner_login, error = %e, "Could not update session last seen on");
        }

        Some(identity_from(record))
    }

    /// Password login. On success returns the new identity and the
    /// `sessionId` cookie to set.
    pub async fn login(
        &self,
        login: &str,
        password: &str,
    ) -> Result<(Identity, Cookie<'static>), AuthError> {
        let result = self.try_login(login, password).await;
        match &result {
            Ok(_) => {
                metrics::record_login("ok");
                tracing::info!(login = %login, "Login OK");
            }
            Err(AuthError::Store(e)) => {
                metrics::record_login("error");
                tracing::error!(login = %login, error = %e, "Login failed on store error");
            }
            Err(_) => {
                metrics::record_login("rejected");
                tracing::warn!(login = %login, "Invalid user/password received");
            }
        }
        result
    }

    async fn try_login(
        &self,
        login: &str,
        password: &str,
    ) -> Result<(Identity, Cookie<'static>), AuthError> {
        if !self.verify_password(login, password).await? {
            return Err(AuthError::InvalidCredentials);
        }
        let credential = self
            .credentials
            .find_credential(login)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        self.open_session(&credential, SessionKind::Session).await
    }

    /// Check a password without creating a session.
    pub async fn verify_password(&self, login: &str, password: &str) -> Result<bool, AuthError> {
        let hash = self.hasher.hash(password);
        Ok(self.credentials.verify(login, &hash).await?)
    }

    /// Password-less login through a ticket link.
    ///
    /// The ticket names a password-less guest credential. Accounts with a
    /// password, admin or guest, are never redeemable.
    pub async fn redeem_ticket(&self, ticket: &str) -> Result<(Identity, Cookie<'static>), AuthError> {
        let credential = self
            .credentials
            .find_credential(ticket)
            .await?
            .filter(Credential::redeemable)
            .ok_or(AuthError::InvalidTicket)?;
        let opened = self.open_session(&credential, SessionKind::Ticket).await?;
        tracing::info!(login = %credential.login, "Ticket redeemed");
        Ok(opened)
    }

    /// Mint a record for `credential`, enforcing single admin sessions and
    /// sweeping expired records first.
    async fn open_session(
        &self,
        credential: &Credential,
        kind: SessionKind,
    ) -> Result<(Identity, Cookie<'static>), AuthError> {
        let now = unix_now();

        if credential.role.single_session() {
            let closed = self.sessions.delete_all_for_owner(credential.id).await?;
            if closed > 0 {
                tracing::info!(login = %credential.login, closed, "Closed superseded sessions");
            }
        }

        match self.sessions.delete_expired(now).await {
            Ok(0) => {}
            Ok(swept) => tracing::debug!(swept, "Swept expired sessions"),
            Err(e) => tracing::warn!(error = %e, "Error cleaning expired sessions"),
        }

        let record = SessionRecord {
            session_id: new_session_id(),
            owner_id: credential.id,
            owner_login: credential.login.clone(),
            role: credential.role,
            kind,
            expires_on: now.saturating_add(self.policy.ttl(kind)),
            last_seen_on: now,
        };
        self.sessions.create(record.clone()).await?;

        let cookie = cookies::session_cookie(
            SessionPolicy::cookie_name(kind),
            &record.session_id,
            record.expires_on,
            self.policy.secure_cookies,
        );
        Ok((identity_from(record), cookie))
    }

    /// End the caller's session.
    ///
    /// Deletes every token the request carried and clears both cookies.
    /// Missing records are not an error, so repeating this is harmless.
    pub async fn logout(&self, identity: &Identity, jar: CookieJar) -> CookieJar {
        let mut tokens: Vec<String> = [SESSION_COOKIE, TICKET_COOKIE]
            .into_iter()
            .filter_map(|name| cookies::token(&jar, name))
            .collect();
        if let Some(token) = &identity.session_id {
            if !tokens.contains(token) {
                tokens.push(token.clone());
            }
        }

        for token in &tokens {
            if let Err(e) = self.sessions.delete_by_token(token).await {
                tracing::warn!(error = %e, "Could not delete session on logout");
            }
        }
        tracing::info!(login = %identity.display_name, "Logged out");

        jar.add(cookies::cleared_cookie(SESSION_COOKIE))
            .add(cookies::cleared_cookie(TICKET_COOKIE))
    }
}

fn identity_from(record: SessionRecord) -> Identity {
    Identity {
        subject_id: Some(record.owner_id),
        display_name: record.owner_login,
        role: record.role,
        session_id: Some(record.session_id),
    }
}
