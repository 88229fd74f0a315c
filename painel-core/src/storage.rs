// File: painel-core/src/storage.rs
//
// Client-side persisted state: the access token and the serialized operator
// profile, written together and removed together. A credential login also
// keeps its signed session token, which goes away with the rest.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::{debug, warn};

use painel_common::models::Operator;

use crate::Error;

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const USER_DATA_KEY: &str = "user_data";
pub const SESSION_TOKEN_KEY: &str = "session_token";

/// Key/value string store with localStorage semantics.
pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;
    fn set(&self, key: &str, value: &str) -> Result<(), Error>;
    fn remove(&self, key: &str) -> Result<(), Error>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let map = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut map = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let mut map = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        map.remove(key);
        Ok(())
    }
}

/// JSON object on disk. Every write rewrites the file through a temp file in
/// the same directory.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), lock: Mutex::new(()) }
    }

    /// `<data dir>/painel/storage.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("painel").join("storage.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<HashMap<String, String>, Error> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(HashMap::new()),
            Ok(text) => match serde_json::from_str(&text) {
                Ok(map) => Ok(map),
                Err(e) => {
                    warn!("storage file {:?} is corrupt ({}); starting empty", self.path, e);
                    Ok(HashMap::new())
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, map: &HashMap<String, String>) -> Result<(), Error> {
        let dir = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dir)?;

        let tmp = dir.join(format!(
            ".{}.tmp",
            self.path.file_name().and_then(|n| n.to_str()).unwrap_or("storage")
        ));
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(serde_json::to_string_pretty(map)?.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        debug!("storage saved to {:?} ({} keys)", self.path, map.len());
        Ok(())
    }
}

impl LocalStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        Ok(self.load()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut map = self.load()?;
        map.insert(key.to_string(), value.to_string());
        self.save(&map)
    }

    fn remove(&self, key: &str) -> Result<(), Error> {
        let _guard = self.lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut map = self.load()?;
        if map.remove(key).is_some() {
            self.save(&map)?;
        }
        Ok(())
    }
}

/// Persists token and profile as one unit.
pub fn save_login(store: &dyn LocalStore, token: &str, operator: &Operator) -> Result<(), Error> {
    let user_data = serde_json::to_string(operator)?;
    store.set(USER_DATA_KEY, &user_data)?;
    store.set(ACCESS_TOKEN_KEY, token)
}

/// Returns the stored login only when both halves are present and readable.
pub fn load_login(store: &dyn LocalStore) -> Result<Option<(String, Operator)>, Error> {
    let token = store.get(ACCESS_TOKEN_KEY)?;
    let user_data = store.get(USER_DATA_KEY)?;
    match (token, user_data) {
        (Some(token), Some(user_data)) if !token.is_empty() => {
            match serde_json::from_str::<Operator>(&user_data) {
                Ok(op) => Ok(Some((token, op))),
                Err(e) => {
                    warn!("stored user_data unreadable: {}", e);
                    Ok(None)
                }
            }
        }
        _ => Ok(None),
    }
}

pub fn clear_login(store: &dyn LocalStore) -> Result<(), Error> {
    store.remove(ACCESS_TOKEN_KEY)?;
    store.remove(USER_DATA_KEY)?;
    store.remove(SESSION_TOKEN_KEY)
}

pub fn save_session_token(store: &dyn LocalStore, token: &str) -> Result<(), Error> {
    store.set(SESSION_TOKEN_KEY, token)
}

pub fn load_session_token(store: &dyn LocalStore) -> Result<Option<String>, Error> {
    Ok(store.get(SESSION_TOKEN_KEY)?.filter(|t| !t.is_empty()))
}
