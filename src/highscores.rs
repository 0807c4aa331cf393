//! High score persistence
//!
//! A single best score survives between sessions. The game touches the store
//! only at construction (load) and on reset (save); failures are logged by
//! the caller and never reach the simulation.

use std::cell::Cell;
use std::rc::Rc;

/// Storage key, shared by LocalStorage and the native JSON file
pub const STORAGE_KEY: &str = "blockRunnerHighScore";

/// Persistence failures
#[derive(Debug)]
pub enum StorageError {
    /// Backend missing (no window, storage disabled, ...)
    Unavailable(String),
    Io(std::io::Error),
    /// Stored value is not a score
    Malformed(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Unavailable(why) => write!(f, "storage unavailable: {why}"),
            StorageError::Io(e) => write!(f, "storage io error: {e}"),
            StorageError::Malformed(value) => write!(f, "malformed high score: {value:?}"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

/// Where the best score lives between sessions
pub trait HighScoreStore {
    /// Stored best, 0 when nothing has been saved yet
    fn load(&mut self) -> Result<u64, StorageError>;
    fn save(&mut self, score: u64) -> Result<(), StorageError>;
}

/// Load the stored best, falling back to 0 on any failure
pub fn load_or_default(store: &mut dyn HighScoreStore) -> u64 {
    match store.load() {
        Ok(score) => {
            log::info!("Loaded high score {score}");
            score
        }
        Err(e) => {
            log::warn!("Could not load high score, starting from 0: {e}");
            0
        }
    }
}

/// Parse a stored value. An absent or empty value means no score yet.
fn parse_score(raw: Option<&str>) -> Result<u64, StorageError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(0),
        Some(text) => text
            .parse::<u64>()
            .map_err(|_| StorageError::Malformed(text.to_string())),
    }
}

/// In-memory store. Clones share the same slot, so a test can keep a handle
/// after giving one to the game.
#[derive(Debug, Clone, Default)]
pub struct MemoryHighScoreStore {
    slot: Rc<Cell<Option<u64>>>,
}

impl MemoryHighScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_score(score: u64) -> Self {
        Self {
            slot: Rc::new(Cell::new(Some(score))),
        }
    }

    /// Last saved value, if any
    pub fn value(&self) -> Option<u64> {
        self.slot.get()
    }
}

impl HighScoreStore for MemoryHighScoreStore {
    fn load(&mut self) -> Result<u64, StorageError> {
        Ok(self.slot.get().unwrap_or(0))
    }

    fn save(&mut self, score: u64) -> Result<(), StorageError> {
        self.slot.set(Some(score));
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file::FileHighScoreStore;

#[cfg(not(target_arch = "wasm32"))]
mod file {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use super::{HighScoreStore, STORAGE_KEY, StorageError, parse_score};

    /// JSON file holding `{"blockRunnerHighScore": "<score>"}`, the same
    /// key/value shape the browser build keeps in LocalStorage
    #[derive(Debug, Clone)]
    pub struct FileHighScoreStore {
        path: PathBuf,
    }

    impl FileHighScoreStore {
        pub fn new(path: impl Into<PathBuf>) -> Self {
            Self { path: path.into() }
        }

        pub fn path(&self) -> &std::path::Path {
            &self.path
        }

        fn read_map(&self) -> Result<BTreeMap<String, String>, StorageError> {
            match std::fs::read_to_string(&self.path) {
                Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
                Ok(text) => serde_json::from_str(&text)
                    .map_err(|e| StorageError::Malformed(format!("{}: {e}", self.path.display()))),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
                Err(e) => Err(e.into()),
            }
        }
    }

    impl HighScoreStore for FileHighScoreStore {
        fn load(&mut self) -> Result<u64, StorageError> {
            let map = self.read_map()?;
            parse_score(map.get(STORAGE_KEY).map(String::as_str))
        }

        fn save(&mut self, score: u64) -> Result<(), StorageError> {
            // Keep unrelated keys; a corrupt file is replaced
            let mut map = self.read_map().unwrap_or_default();
            map.insert(STORAGE_KEY.to_string(), score.to_string());
            let json = serde_json::to_string_pretty(&map)
                .map_err(|e| StorageError::Malformed(e.to_string()))?;
            if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir)?;
            }
            std::fs::write(&self.path, json)?;
            log::debug!("High score {score} written to {}", self.path.display());
            Ok(())
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use local::LocalStorageHighScoreStore;

#[cfg(target_arch = "wasm32")]
mod local {
    use super::{HighScoreStore, STORAGE_KEY, StorageError, parse_score};

    /// Browser LocalStorage, stored as a decimal string
    #[derive(Debug, Clone, Copy, Default)]
    pub struct LocalStorageHighScoreStore;

    impl LocalStorageHighScoreStore {
        fn storage() -> Result<web_sys::Storage, StorageError> {
            web_sys::window()
                .ok_or_else(|| StorageError::Unavailable("no window".into()))?
                .local_storage()
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
                .ok_or_else(|| StorageError::Unavailable("localStorage disabled".into()))
        }
    }

    impl HighScoreStore for LocalStorageHighScoreStore {
        fn load(&mut self) -> Result<u64, StorageError> {
            let raw = Self::storage()?
                .get_item(STORAGE_KEY)
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?;
            parse_score(raw.as_deref())
        }

        fn save(&mut self, score: u64) -> Result<(), StorageError> {
            Self::storage()?
                .set_item(STORAGE_KEY, &score.to_string())
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
        }
    }
}
