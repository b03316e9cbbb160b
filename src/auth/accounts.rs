//! Account management: bootstrap users, new guests, password changes.

use std::sync::Arc;

use crate::auth::error::AuthError;
use crate::auth::identity::Role;
use crate::auth::password::PasswordHasher;
use crate::auth::store::{Credential, CredentialStore};
use crate::config::UsersConfig;

pub struct Accounts {
    credentials: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
}

impl Accounts {
    pub fn new(credentials: Arc<dyn CredentialStore>, hasher: PasswordHasher) -> Self {
        Self { credentials, hasher }
    }

    pub async fn create_user(
        &self,
        login: &str,
        password: &str,
        role: Role,
    ) -> Result<Credential, AuthError> {
        let credential = Credential::with_password(login, self.hasher.hash(password), role);
        self.credentials.create_user(credential.clone()).await?;
        tracing::info!(login = %login, role = %role, "User created");
        Ok(credential)
    }

    /// Create a password-less guest reachable through `?ticket=<ticket>`.
    pub async fn create_ticket(&self, ticket: &str) -> Result<Credential, AuthError> {
        let credential = Credential::ticket(ticket);
        self.credentials.create_user(credential.clone()).await?;
        tracing::info!(ticket = %ticket, "Ticket created");
        Ok(credential)
    }

    pub async fn set_password(&self, login: &str, new_password: &str) -> Result<(), AuthError> {
        self.credentials
            .set_password(login, &self.hasher.hash(new_password))
            .await?;
        tracing::info!(login = %login, "Password changed");
        Ok(())
    }

    /// Create the configured admin and guest when no user exists yet.
    ///
    /// Returns true when the users were created.
    pub async fn ensure_default_users(&self, users: &UsersConfig) -> Result<bool, AuthError> {
        if self.credentials.count().await? > 0 {
            return Ok(false);
        }
        tracing::info!(login = %users.admin_login, "Creating initial admin user");
        self.create_user(&users.admin_login, &users.admin_password, Role::Admin)
            .await?;
        tracing::info!(login = %users.guest_login, "Creating initial guest user");
        self.create_user(&users.guest_login, &users.guest_password, Role::Guest)
            .await?;
        Ok(true)
    }
}

/// Split a `login/password` argument as taken by the add-user command.
pub fn parse_user_password(arg: &str) -> Option<(&str, &str)> {
    let (login, password) = arg.split_once('/')?;
    if login.is_empty() || password.is_empty() || password.contains('/') {
        return None;
    }
    Some((login, password))
}
