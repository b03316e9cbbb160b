//! Startup orchestration.
//!
//! Store first, then accounts and the session resolver, then the route
//! tables. Any failure here is fatal.

use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::{Accounts, AuthError, MemoryStore, PasswordHasher, SessionPolicy, SessionResolver, StoreError};
use crate::config::BlogConfig;
use crate::http::{build_dispatcher, AppState, Pages};
use crate::routing::RouteError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("accounts: {0}")]
    Auth(#[from] AuthError),
    #[error("routes: {0}")]
    Route(#[from] RouteError),
}

/// Everything built from the config.
pub struct App {
    pub state: AppState,
    pub accounts: Arc<Accounts>,
    pub store: MemoryStore,
}

/// Open the configured store. Without a path nothing outlives the process.
pub fn open_store(config: &BlogConfig) -> Result<MemoryStore, StoreError> {
    match &config.store.path {
        Some(path) => MemoryStore::load_from_file(PathBuf::from(path)),
        None => {
            tracing::warn!("No store path configured, users and sessions are kept in memory only");
            Ok(MemoryStore::new(None))
        }
    }
}

/// Build the application state and create the default users if the store
/// has none.
pub async fn build_app(config: &BlogConfig) -> Result<App, StartupError> {
    let store = open_store(config)?;
    let hasher = PasswordHasher::new(config.auth.salt.clone());
    if config.auth.salt.is_empty() {
        tracing::warn!("Password salt is empty");
    }

    let accounts = Arc::new(Accounts::new(Arc::new(store.clone()), hasher.clone()));
    if accounts.ensure_default_users(&config.users).await? {
        tracing::info!("Default users created");
    }

    let resolver = Arc::new(SessionResolver::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        hasher,
        SessionPolicy::from(&config.auth),
    ));
    let dispatcher = Arc::new(build_dispatcher(resolver.clone())?);
    let pages = Arc::new(Pages::new(resolver, accounts.clone()));

    Ok(App {
        state: AppState { dispatcher, pages },
        accounts,
        store,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialStore;

    #[tokio::test]
    async fn test_build_app_creates_default_users_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BlogConfig::default();
        config.store.path = Some(dir.path().join("store.json").to_string_lossy().into_owned());

        let app = build_app(&config).await.unwrap();
        assert_eq!(app.store.count().await.unwrap(), 2);
        assert_eq!(app.state.dispatcher.groups().len(), 2);

        app.accounts
            .create_user("reader", "secret", crate::auth::Role::Guest)
            .await
            .unwrap();
        drop(app);

        let app = build_app(&config).await.unwrap();
        assert_eq!(app.store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_in_memory_store_without_path() {
        let app = build_app(&BlogConfig::default()).await.unwrap();
        assert!(app
            .store
            .find_credential("user1")
            .await
            .unwrap()
            .is_some());
    }
}
