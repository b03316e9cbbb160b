//! In-process credential and session store.

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::auth::store::{Credential, CredentialStore, SessionRecord, SessionStore, StoreError};
use crate::observability::metrics;

/// On-disk snapshot format.
#[derive(Default, Serialize, Deserialize)]
struct Snapshot {
    users: Vec<Credential>,
    sessions: Vec<SessionRecord>,
}

/// Snapshot file plus the lock that orders writes to it.
#[derive(Debug)]
struct Persistence {
    path: PathBuf,
    /// Held while a snapshot is taken and written, so writes land in the
    /// order their snapshots were taken.
    writer: Mutex<()>,
}

/// A thread-safe store for users and sessions backed by `DashMap`.
///
/// Every operation is atomic per entry. When a persistence path is set the
/// whole store is written to it after each mutation, except `touch`. A
/// mutation whose write fails is undone in memory and reported as an error.
#[derive(Clone, Default)]
pub struct MemoryStore {
    /// login -> credential
    users: Arc<DashMap<String, Credential>>,
    /// token -> session
    sessions: Arc<DashMap<String, SessionRecord>>,
    persistence: Option<Arc<Persistence>>,
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new(persistence_path: Option<PathBuf>) -> Self {
        Self {
            users: Arc::new(DashMap::new()),
            sessions: Arc::new(DashMap::new()),
            persistence: persistence_path.map(|path| {
                Arc::new(Persistence {
                    path,
                    writer: Mutex::new(()),
                })
            }),
        }
    }

    /// Load from file if it exists; later mutations are saved back to it.
    ///
    /// Blocking; meant for startup.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let store = Self::new(Some(path.to_path_buf()));
        if path.exists() {
            let reader = BufReader::new(File::open(path)?);
            let snapshot: Snapshot = serde_json::from_reader(reader)?;
            for user in snapshot.users {
                store.users.insert(user.login.clone(), user);
            }
            for session in snapshot.sessions {
                store.sessions.insert(session.session_id.clone(), session);
            }
            metrics::record_session_count(store.sessions.len());
            tracing::info!(
                path = %path.display(),
                users = store.users.len(),
                sessions = store.sessions.len(),
                "Loaded store from file"
            );
        }
        Ok(store)
    }

    pub fn persistence_path(&self) -> Option<&Path> {
        self.persistence.as_ref().map(|p| p.path.as_path())
    }

    /// Write the whole store to the persistence path, if any.
    ///
    /// File I/O runs on the blocking pool.
    pub async fn save(&self) -> Result<(), StoreError> {
        let Some(persistence) = &self.persistence else {
            return Ok(());
        };

        let _writer = persistence.writer.lock().await;
        let snapshot = self.snapshot();
        let sessions = snapshot.sessions.len();
        let path = persistence.path.clone();
        tokio::task::spawn_blocking(move || write_snapshot(&path, &snapshot))
            .await
            .map_err(|e| StoreError::Io(std::io::Error::other(e)))??;

        tracing::debug!(path = %persistence.path.display(), sessions, "Saved store");
        Ok(())
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            users: self.users.iter().map(|r| r.value().clone()).collect(),
            sessions: self.sessions.iter().map(|r| r.value().clone()).collect(),
        }
    }

    /// Save, or run `undo` and return the error.
    async fn save_or_undo<F>(&self, undo: F) -> Result<(), StoreError>
    where
        F: FnOnce(&Self) + Send,
    {
        let result = self.save().await;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Could not save store, change undone");
            undo(self);
        }
        metrics::record_session_count(self.sessions.len());
        result
    }

    fn remove_sessions_where<P>(&self, pred: P) -> Vec<SessionRecord>
    where
        P: Fn(&SessionRecord) -> bool,
    {
        let tokens: Vec<String> = self
            .sessions
            .iter()
            .filter(|r| pred(r.value()))
            .map(|r| r.key().clone())
            .collect();
        tokens
            .iter()
            .filter_map(|token| self.sessions.remove_if(token, |_, r| pred(r)))
            .map(|(_, record)| record)
            .collect()
    }

    fn restore_sessions(&self, records: Vec<SessionRecord>) {
        for record in records {
            self.sessions.insert(record.session_id.clone(), record);
        }
    }

    /// Remove a batch of sessions and persist, counting what went.
    async fn delete_sessions_where<P>(&self, pred: P) -> Result<usize, StoreError>
    where
        P: Fn(&SessionRecord) -> bool,
    {
        let removed = self.remove_sessions_where(pred);
        if removed.is_empty() {
            return Ok(0);
        }
        let count = removed.len();
        self.save_or_undo(move |store| store.restore_sessions(removed))
            .await?;
        Ok(count)
    }
}

/// Serialise into a sibling temp file, then rename it over `path`.
fn write_snapshot(path: &Path, snapshot: &Snapshot) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let written = (|| -> Result<(), StoreError> {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer(&mut writer, snapshot)?;
        writer.flush()?;
        fs::rename(&tmp, path)?;
        Ok(())
    })();
    if written.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    written
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_credential(&self, login: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self.users.get(login).map(|r| r.value().clone()))
    }

    async fn verify(&self, login: &str, password_hash: &str) -> Result<bool, StoreError> {
        Ok(self
            .users
            .get(login)
            .map(|r| !r.ticket && !password_hash.is_empty() && r.password_hash == password_hash)
            .unwrap_or(false))
    }

    async fn create_user(&self, credential: Credential) -> Result<(), StoreError> {
        let login = credential.login.clone();
        match self.users.entry(login.clone()) {
            Entry::Occupied(_) => return Err(StoreError::DuplicateLogin(login)),
            Entry::Vacant(slot) => {
                slot.insert(credential);
            }
        }
        self.save_or_undo(move |store| {
            store.users.remove(&login);
        })
        .await
    }

    async fn set_password(&self, login: &str, password_hash: &str) -> Result<(), StoreError> {
        let previous = match self.users.get_mut(login) {
            Some(mut user) => std::mem::replace(&mut user.password_hash, password_hash.to_string()),
            None => return Err(StoreError::UnknownLogin(login.to_string())),
        };
        self.save_or_undo(move |store| {
            if let Some(mut user) = store.users.get_mut(login) {
                user.password_hash = previous;
            }
        })
        .await
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.users.len())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.sessions.get(session_id).map(|r| r.value().clone()))
    }

    async fn create(&self, record: SessionRecord) -> Result<(), StoreError> {
        let token = record.session_id.clone();
        self.sessions.insert(token.clone(), record);
        self.save_or_undo(move |store| {
            store.sessions.remove(&token);
        })
        .await
    }

    async fn touch(&self, session_id: &str, now: u64) -> Result<(), StoreError> {
        if let Some(mut record) = self.sessions.get_mut(session_id) {
            record.last_seen_on = now;
        }
        Ok(())
    }

    async fn delete_by_token(&self, session_id: &str) -> Result<(), StoreError> {
        let Some((_, record)) = self.sessions.remove(session_id) else {
            return Ok(());
        };
        self.save_or_undo(move |store| store.restore_sessions(vec![record]))
            .await
    }

    async fn delete_expired(&self, now: u64) -> Result<usize, StoreError> {
        self.delete_sessions_where(|record| !record.is_live(now)).await
    }

    async fn delete_all_for_owner(&self, owner_id: Uuid) -> Result<usize, StoreError> {
        self.delete_sessions_where(|record| record.owner_id == owner_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::Role;
    use crate::auth::store::{unix_now, SessionKind};

    fn credential(login: &str, role: Role) -> Credential {
        Credential::with_password(login, "hash".into(), role)
    }

    fn record(token: &str, owner: Uuid, expires_on: u64) -> SessionRecord {
        SessionRecord {
            session_id: token.into(),
            owner_id: owner,
            owner_login: "user1".into(),
            role: Role::Admin,
            kind: SessionKind::Session,
            expires_on,
            last_seen_on: 0,
        }
    }

    #[tokio::test]
    async fn test_credentials() {
        let store = MemoryStore::new(None);
        store.create_user(credential("user1", Role::Admin)).await.unwrap();
        assert!(matches!(
            store.create_user(credential("user1", Role::Guest)).await,
            Err(StoreError::DuplicateLogin(_))
        ));
        assert_eq!(store.count().await.unwrap(), 1);

        assert!(store.verify("user1", "hash").await.unwrap());
        assert!(!store.verify("user1", "other").await.unwrap());
        assert!(!store.verify("nobody", "hash").await.unwrap());

        store.set_password("user1", "new-hash").await.unwrap();
        assert!(store.verify("user1", "new-hash").await.unwrap());
        assert!(matches!(
            store.set_password("nobody", "x").await,
            Err(StoreError::UnknownLogin(_))
        ));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let store = MemoryStore::new(None);
        let now = unix_now();
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        store.create(record("live", owner, now + 100)).await.unwrap();
        store.create(record("dead", other, now - 1)).await.unwrap();
        store.create(record("second", owner, now + 100)).await.unwrap();

        store.touch("live", now + 5).await.unwrap();
        assert_eq!(store.get("live").await.unwrap().unwrap().last_seen_on, now + 5);
        // Touching a missing token is a no-op.
        store.touch("missing", now).await.unwrap();

        assert_eq!(store.delete_expired(now).await.unwrap(), 1);
        assert!(store.get("dead").await.unwrap().is_none());

        assert_eq!(store.delete_all_for_owner(owner).await.unwrap(), 2);
        assert_eq!(store.session_count(), 0);

        store.delete_by_token("live").await.unwrap();
    }

    #[tokio::test]
    async fn test_persistence() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = MemoryStore::load_from_file(&path).unwrap();
        let user = credential("user1", Role::Admin);
        let owner = user.id;
        store.create_user(user).await.unwrap();
        store.create(record("token", owner, unix_now() + 100)).await.unwrap();

        let loaded = MemoryStore::load_from_file(&path).unwrap();
        assert_eq!(loaded.find_credential("user1").await.unwrap().unwrap().id, owner);
        assert_eq!(loaded.get("token").await.unwrap().unwrap().owner_id, owner);
    }

    /// A store whose target path is a directory: every save fails.
    fn unwritable() -> (MemoryStore, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        (MemoryStore::new(Some(dir.path().to_path_buf())), dir)
    }

    #[tokio::test]
    async fn test_failed_save_undoes_change() {
        let (store, _dir) = unwritable();
        let now = unix_now();
        let owner = Uuid::new_v4();

        assert!(matches!(
            store.create_user(credential("user1", Role::Admin)).await,
            Err(StoreError::Io(_))
        ));
        assert_eq!(store.count().await.unwrap(), 0);

        assert!(store.create(record("new", owner, now + 100)).await.is_err());
        assert_eq!(store.session_count(), 0);

        // Seed records behind the store's back, then fail to delete them.
        store.sessions.insert("live".into(), record("live", owner, now + 100));
        store.sessions.insert("dead".into(), record("dead", owner, now - 1));

        assert!(store.delete_all_for_owner(owner).await.is_err());
        assert!(store.delete_expired(now).await.is_err());
        assert!(store.delete_by_token("live").await.is_err());
        assert_eq!(store.session_count(), 2);
        assert!(store.get("live").await.unwrap().is_some());
        assert!(store.get("dead").await.unwrap().is_some());

        store.users.insert("user1".into(), credential("user1", Role::Admin));
        assert!(store.set_password("user1", "new-hash").await.is_err());
        assert!(store.verify("user1", "hash").await.unwrap());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_saves_keep_every_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let store = MemoryStore::load_from_file(&path).unwrap();
        let owner = Uuid::new_v4();
        let expires_on = unix_now() + 100;

        let tasks: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store.create(record(&format!("t{}", i), owner, expires_on)).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let loaded = MemoryStore::load_from_file(&path).unwrap();
        assert_eq!(loaded.session_count(), 32);
    }
}
