//! Access-token cache with a durable and an ephemeral slot.
//!
//! Mirrors the two storage scopes a browser offers: the durable slot is a
//! file that survives restarts of the embedding application, the
//! ephemeral slot lives only as long as this store value. The remember-me
//! choice at login decides which slot the token goes into; the refresh
//! token is never stored here (it rides in the HTTP client's cookie jar).

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub struct TokenStore {
    durable_path: PathBuf,
    ephemeral: Mutex<Option<String>>,
}

impl TokenStore {
    /// Open a store rooted at the given directory, creating it if needed.
    /// Re-opening the same directory sees the durable slot's contents.
    pub fn open(dir: impl AsRef<Path>) -> io::Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        Ok(Self {
            durable_path: dir.join("access_token"),
            ephemeral: Mutex::new(None),
        })
    }

    fn durable(&self) -> Option<String> {
        fs::read_to_string(&self.durable_path)
            .ok()
            .filter(|t| !t.is_empty())
    }

    fn ephemeral(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.ephemeral.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The current access token, durable slot first.
    pub fn get(&self) -> Option<String> {
        self.durable().or_else(|| self.ephemeral().clone())
    }

    /// Store a freshly issued token. Exactly one slot holds a token
    /// afterwards: durable if the user asked to be remembered, ephemeral
    /// otherwise.
    pub fn set(&self, token: &str, remember: bool) -> io::Result<()> {
        if remember {
            fs::write(&self.durable_path, token)?;
            *self.ephemeral() = None;
        } else {
            self.remove_durable()?;
            *self.ephemeral() = Some(token.to_string());
        }
        Ok(())
    }

    /// Overwrite whichever slot currently holds a token, preserving the
    /// remember-me choice made at login. Falls back to the ephemeral slot
    /// when neither holds one.
    pub fn replace(&self, token: &str) -> io::Result<()> {
        if self.durable().is_some() {
            fs::write(&self.durable_path, token)
        } else {
            *self.ephemeral() = Some(token.to_string());
            Ok(())
        }
    }

    /// Drop the token from both slots.
    pub fn clear(&self) {
        let _ = self.remove_durable();
        *self.ephemeral() = None;
    }

    fn remove_durable(&self) -> io::Result<()> {
        match fs::remove_file(&self.durable_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store_dir() -> PathBuf {
        std::env::temp_dir().join(format!("taskdeck-store-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_durable_token_survives_reopen() {
        let dir = temp_store_dir();

        let store = TokenStore::open(&dir).unwrap();
        store.set("tok-1", true).unwrap();
        assert_eq!(store.get().as_deref(), Some("tok-1"));
        drop(store);

        // Simulated context restart
        let store = TokenStore::open(&dir).unwrap();
        assert_eq!(store.get().as_deref(), Some("tok-1"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_ephemeral_token_does_not_survive_reopen() {
        let dir = temp_store_dir();

        let store = TokenStore::open(&dir).unwrap();
        store.set("tok-1", false).unwrap();
        assert_eq!(store.get().as_deref(), Some("tok-1"));
        drop(store);

        let store = TokenStore::open(&dir).unwrap();
        assert_eq!(store.get(), None);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_replace_preserves_slot_choice() {
        let dir = temp_store_dir();

        let store = TokenStore::open(&dir).unwrap();
        store.set("tok-1", true).unwrap();
        store.replace("tok-2").unwrap();
        drop(store);

        // Replacement landed in the durable slot
        let store = TokenStore::open(&dir).unwrap();
        assert_eq!(store.get().as_deref(), Some("tok-2"));

        store.set("tok-3", false).unwrap();
        store.replace("tok-4").unwrap();
        assert_eq!(store.get().as_deref(), Some("tok-4"));
        drop(store);

        // Replacement stayed ephemeral
        let store = TokenStore::open(&dir).unwrap();
        assert_eq!(store.get(), None);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_set_leaves_exactly_one_slot() {
        let dir = temp_store_dir();

        let store = TokenStore::open(&dir).unwrap();
        store.set("tok-1", true).unwrap();
        store.set("tok-2", false).unwrap();

        // Durable slot was cleared by the non-remember set
        drop(store);
        let store = TokenStore::open(&dir).unwrap();
        assert_eq!(store.get(), None);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_clear_empties_both_slots() {
        let dir = temp_store_dir();

        let store = TokenStore::open(&dir).unwrap();
        store.set("tok-1", true).unwrap();
        store.clear();
        assert_eq!(store.get(), None);

        store.set("tok-2", false).unwrap();
        store.clear();
        assert_eq!(store.get(), None);

        let _ = fs::remove_dir_all(&dir);
    }
}
