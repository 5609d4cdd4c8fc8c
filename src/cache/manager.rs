//! Durable store for monthly fuel prices
//!
//! Provides a `PriceCacheStore` that keeps one price per calendar period in a
//! single JSON file, mirrored in memory for the lifetime of the store.

use directories::ProjectDirs;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::data::CachedPrice;

/// File name of the price cache inside the data directory
const CACHE_FILE_NAME: &str = "fuel_prices.json";

/// Errors that can occur reading or writing the price cache file
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading, writing or creating the cache file failed
    #[error("Cache file I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The cache file exists but is not a valid price map
    #[error("Cache file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable mapping from period key (e.g. "March-2025") to price
///
/// Every lookup re-reads the file and refreshes the in-memory mirror, so
/// several processes (or a restarted one) sharing the same file agree on its
/// contents. There is no cross-process locking; the last write wins.
#[derive(Debug)]
pub struct PriceCacheStore {
    /// Path of the JSON file backing the store
    path: PathBuf,
    /// Entries seen in this process, refreshed from disk on every lookup
    mirror: Mutex<HashMap<String, CachedPrice>>,
}

impl PriceCacheStore {
    /// Creates a store backed by the given file
    ///
    /// The file and its directory are created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            mirror: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the default cache file location
    ///
    /// Uses `~/.local/share/fleetfuel/fuel_prices.json` on Linux, or the
    /// equivalent XDG data path on other platforms. Returns `None` if no home
    /// directory can be determined.
    pub fn default_path() -> Option<PathBuf> {
        let project_dirs = ProjectDirs::from("", "", "fleetfuel")?;
        Some(project_dirs.data_dir().join(CACHE_FILE_NAME))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Looks up the price stored for `period_key`
    ///
    /// A missing file is an empty store. Entries on disk replace mirrored
    /// entries with the same key. If the file cannot be read, a mirrored
    /// entry is still returned; the error is reported only on a miss.
    pub fn get(&self, period_key: &str) -> Result<Option<CachedPrice>, CacheError> {
        let loaded = self.load();
        let mut mirror = self.mirror.lock().unwrap_or_else(PoisonError::into_inner);
        match loaded {
            Ok(on_disk) => {
                mirror.extend(on_disk);
                Ok(mirror.get(period_key).copied())
            }
            Err(e) => match mirror.get(period_key) {
                Some(cached) => Ok(Some(*cached)),
                None => Err(e),
            },
        }
    }

    /// Stores `price` under `period_key`, overwriting any existing entry
    ///
    /// The mirror is updated even if persisting fails, so the price stays
    /// available to this process.
    pub fn put(&self, period_key: &str, price: CachedPrice) -> Result<(), CacheError> {
        self.mirror
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(period_key.to_string(), price);

        // Merge with the file as it is now so entries written by other
        // processes survive this write.
        let mut entries = match self.load() {
            Ok(entries) => entries,
            Err(CacheError::Corrupt { .. }) => HashMap::new(),
            Err(e) => return Err(e),
        };
        entries.insert(period_key.to_string(), price);
        self.persist(&entries)
    }

    /// Reads the whole price map from disk
    fn load(&self) -> Result<HashMap<String, CachedPrice>, CacheError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| CacheError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes the whole price map, replacing the file atomically
    ///
    /// Each write goes through its own uniquely named temporary file in the
    /// same directory, so concurrent writers never share one.
    fn persist(&self, entries: &HashMap<String, CachedPrice>) -> Result<(), CacheError> {
        let io_err = |source: io::Error| CacheError::Io {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            Some(dir) => dir,
            None => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(io_err)?;

        let json = serde_json::to_string_pretty(entries).map_err(|source| {
            CacheError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;

        let mut temp_file = temp_file_in(dir).map_err(io_err)?;
        temp_file.write_all(json.as_bytes()).map_err(io_err)?;
        temp_file.persist(&self.path).map_err(|e| io_err(e.error))?;
        Ok(())
    }
}

#[cfg(unix)]
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;
    tempfile::Builder::new()
        .prefix(".fuel_prices-")
        .suffix(".tmp")
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn temp_file_in(dir: &Path) -> io::Result<NamedTempFile> {
    tempfile::Builder::new()
        .prefix(".fuel_prices-")
        .suffix(".tmp")
        .tempfile_in(dir)
}
