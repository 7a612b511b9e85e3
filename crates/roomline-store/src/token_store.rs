//! Durable storage for the session token.
//!
//! The client persists exactly one value across restarts: the bearer token
//! issued by the room server.  It lives under the fixed
//! [`SESSION_TOKEN_KEY`] and has no client-side expiry; the server decides
//! when it stops being valid.

use std::sync::Mutex;

use roomline_shared::constants::SESSION_TOKEN_KEY;

use crate::database::Database;
use crate::error::{Result, StoreError};

/// Load/save/clear access to the persisted session token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Result<Option<String>>;
    fn save(&self, token: &str) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Token store backed by the SQLite `kv` table.
pub struct SqliteTokenStore {
    db: Mutex<Database>,
}

impl SqliteTokenStore {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    fn with_db<T>(&self, f: impl FnOnce(&Database) -> Result<T>) -> Result<T> {
        let guard = self.db.lock().map_err(|_| StoreError::Poisoned)?;
        f(&guard)
    }
}

impl TokenStore for SqliteTokenStore {
    fn load(&self) -> Result<Option<String>> {
        self.with_db(|db| db.get_value(SESSION_TOKEN_KEY))
    }

    fn save(&self, token: &str) -> Result<()> {
        self.with_db(|db| db.set_value(SESSION_TOKEN_KEY, token))
    }

    fn clear(&self) -> Result<()> {
        self.with_db(|db| {
            if db.delete_value(SESSION_TOKEN_KEY)? {
                tracing::debug!("session token removed from store");
            }
            Ok(())
        })
    }
}

/// Process-local token store, used by tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.token.lock().map_err(|_| StoreError::Poisoned)?.clone())
    }

    fn save(&self, token: &str) -> Result<()> {
        *self.token.lock().map_err(|_| StoreError::Poisoned)? = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.token.lock().map_err(|_| StoreError::Poisoned)? = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_token_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let store = SqliteTokenStore::new(Database::open_in_dir(dir.path()).unwrap());
        assert_eq!(store.load().unwrap(), None);
        store.save("tok-1").unwrap();
        drop(store);

        let reopened = SqliteTokenStore::new(Database::open_in_dir(dir.path()).unwrap());
        assert_eq!(reopened.load().unwrap().as_deref(), Some("tok-1"));

        reopened.clear().unwrap();
        assert_eq!(reopened.load().unwrap(), None);
    }

    #[test]
    fn clearing_twice_is_harmless() {
        let store = SqliteTokenStore::new(Database::open_in_memory().unwrap());
        store.clear().unwrap();
        store.clear().unwrap();
    }

    #[test]
    fn memory_store_round_trip() {
        let store = MemoryTokenStore::with_token("abc");
        assert_eq!(store.load().unwrap().as_deref(), Some("abc"));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
