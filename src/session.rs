use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use dashmap::DashMap;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Storage key of the credential.
pub const TOKEN_KEY: &str = "token";
/// Storage key of the role hint derived from the credential.
pub const ROLE_KEY: &str = "role";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to write session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// String key-value storage backing a [`SessionStore`].
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError>;
    fn remove_item(&self, key: &str) -> Result<(), SessionError>;

    /// Apply several writes at once; `None` removes the key. Backends that
    /// can persist everything in one step override this.
    fn set_items(&self, items: &[(&str, Option<&str>)]) -> Result<(), SessionError> {
        for (key, value) in items {
            match value {
                Some(value) => self.set_item(key, value)?,
                None => self.remove_item(key)?,
            }
        }
        Ok(())
    }
}

/// Typed access to the current credential and role hint. Cloning shares the
/// same underlying storage.
#[derive(Clone)]
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStorage::default()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileSessionStorage::new(path)))
    }

    /// Store `credential` and its role hint. An empty role removes any
    /// previous hint instead of storing an empty value. On failure no
    /// credential is left behind.
    pub fn set_session(&self, credential: &str, role: &str) -> Result<(), SessionError> {
        let role_hint = (!role.is_empty()).then_some(role);
        let written = self
            .storage
            .set_items(&[(TOKEN_KEY, Some(credential)), (ROLE_KEY, role_hint)]);

        if let Err(error) = written {
            if let Err(cleanup) = self.storage.remove_item(TOKEN_KEY) {
                warn!(error = %cleanup, "could not remove partially stored session");
            }
            return Err(error);
        }

        info!(has_role = role_hint.is_some(), "session stored");
        Ok(())
    }

    pub fn credential(&self) -> Option<String> {
        self.storage
            .get_item(TOKEN_KEY)
            .filter(|token| !token.is_empty())
    }

    pub fn role(&self) -> Option<String> {
        self.storage.get_item(ROLE_KEY).filter(|role| !role.is_empty())
    }

    /// Remove both the credential and the role hint.
    pub fn clear(&self) -> Result<(), SessionError> {
        self.storage.remove_item(TOKEN_KEY)?;
        self.storage.remove_item(ROLE_KEY)?;
        info!("session cleared");
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    items: DashMap<String, String>,
}

impl SessionStorage for MemorySessionStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items.get(key).map(|value| value.clone())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        self.items.remove(key);
        Ok(())
    }
}

/// Session persisted as a flat JSON object on disk, re-read on every access
/// so separate invocations of the CLI share it.
#[derive(Debug, Clone)]
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> BTreeMap<String, String> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no session file yet");
                return BTreeMap::new();
            }
            Err(error) => {
                warn!(path = %self.path.display(), %error, "session file unreadable, treating as empty");
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|error| {
            warn!(path = %self.path.display(), %error, "session file corrupt, treating as empty");
            BTreeMap::new()
        })
    }

    fn save(&self, items: &BTreeMap<String, String>) -> Result<(), SessionError> {
        let io_err = |source: io::Error| SessionError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let encoded = serde_json::to_vec_pretty(items)?;
        let tmp = self.path.with_extension("tmp");
        write_private(&tmp, &encoded).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

/// Write `bytes` to a freshly created file that is owner-only from the
/// moment it exists. A leftover file at `path` is replaced.
fn write_private(path: &Path, bytes: &[u8]) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(error) if error.kind() != io::ErrorKind::NotFound => return Err(error),
        _ => {}
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

impl SessionStorage for FileSessionStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let mut items = self.load();
        items.insert(key.to_string(), value.to_string());
        self.save(&items)
    }

    fn remove_item(&self, key: &str) -> Result<(), SessionError> {
        let mut items = self.load();
        if items.remove(key).is_none() {
            return Ok(());
        }
        self.save(&items)
    }

    // One load and one save for the whole batch.
    fn set_items(&self, changes: &[(&str, Option<&str>)]) -> Result<(), SessionError> {
        let mut items = self.load();
        for (key, value) in changes {
            match value {
                Some(value) => items.insert(key.to_string(), value.to_string()),
                None => items.remove(*key),
            };
        }
        self.save(&items)
    }
}
