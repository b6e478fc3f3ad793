//! Durable storage backends for settings.
//!
//! Settings are stored as one document. Two file backends exist:
//!
//! - [`JsonDocumentStore`]: the primary store, a JSON document in the config
//!   directory holding a single `"settings"` record
//! - [`KeyedStore`]: a lower-durability key/value file in the cache
//!   directory, written on every save and read when the primary is unusable
//!
//! [`LayeredPersistence`] combines them.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use tracing::{debug, warn};

use crate::types::Settings;

use super::error::SettingsError;

/// Application directory name under the config and cache roots.
pub const APP_DIR_NAME: &str = "break-reminder";

/// File name of the primary settings document.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// File name of the fallback key/value store.
pub const FALLBACK_FILE_NAME: &str = "kv.json";

/// Key of the settings record inside the primary document.
pub const SETTINGS_RECORD_KEY: &str = "settings";

/// Key of the settings record inside the fallback store.
pub const FALLBACK_KEY: &str = "reminder-settings";

// ============================================================================
// SettingsPersistence
// ============================================================================

/// A place settings can be loaded from and persisted to.
pub trait SettingsPersistence: Send + Sync {
    /// Short name used in log messages.
    fn name(&self) -> &'static str;

    /// Loads the stored settings.
    ///
    /// Returns `Ok(None)` if nothing has been stored yet. Stored records are
    /// merged over defaults field by field.
    fn load(&self) -> Result<Option<Settings>, SettingsError>;

    /// Persists the full settings record.
    fn persist(&self, settings: &Settings) -> Result<(), SettingsError>;
}

// ============================================================================
// JsonDocumentStore
// ============================================================================

/// Primary store: `{"settings": {...}}` in a JSON file.
#[derive(Debug, Clone)]
pub struct JsonDocumentStore {
    path: PathBuf,
}

impl JsonDocumentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the document path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsPersistence for JsonDocumentStore {
    fn name(&self) -> &'static str {
        "document"
    }

    fn load(&self) -> Result<Option<Settings>, SettingsError> {
        let Some(document) = read_json_file(&self.path)? else {
            return Ok(None);
        };
        Ok(document
            .get(SETTINGS_RECORD_KEY)
            .map(Settings::merged_over_defaults))
    }

    fn persist(&self, settings: &Settings) -> Result<(), SettingsError> {
        let record = serde_json::to_value(settings).map_err(SettingsError::Serialize)?;
        let mut document = serde_json::Map::new();
        document.insert(SETTINGS_RECORD_KEY.to_string(), record);
        write_json_file(&self.path, &serde_json::Value::Object(document))
    }
}

// ============================================================================
// KeyedStore
// ============================================================================

/// Fallback store: a flat map of keys to JSON-encoded strings.
#[derive(Debug, Clone)]
pub struct KeyedStore {
    path: PathBuf,
    key: String,
}

impl KeyedStore {
    pub fn new(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    fn read_entries(&self) -> Result<BTreeMap<String, String>, SettingsError> {
        match read_json_file(&self.path)? {
            Some(value) => serde_json::from_value(value).map_err(SettingsError::Parse),
            None => Ok(BTreeMap::new()),
        }
    }
}

impl SettingsPersistence for KeyedStore {
    fn name(&self) -> &'static str {
        "keyed"
    }

    fn load(&self) -> Result<Option<Settings>, SettingsError> {
        let entries = self.read_entries()?;
        let Some(raw) = entries.get(&self.key) else {
            return Ok(None);
        };
        let value: serde_json::Value = serde_json::from_str(raw).map_err(SettingsError::Parse)?;
        Ok(Some(Settings::merged_over_defaults(&value)))
    }

    fn persist(&self, settings: &Settings) -> Result<(), SettingsError> {
        // A damaged store is simply overwritten.
        let mut entries = self.read_entries().unwrap_or_default();
        let raw = serde_json::to_string(settings).map_err(SettingsError::Serialize)?;
        entries.insert(self.key.clone(), raw);
        let value = serde_json::to_value(&entries).map_err(SettingsError::Serialize)?;
        write_json_file(&self.path, &value)
    }
}

// ============================================================================
// LayeredPersistence
// ============================================================================

/// Primary store with a keyed fallback.
///
/// Saving always writes the fallback first, then the primary. Loading prefers
/// the primary and falls back when it is empty or unreadable.
pub struct LayeredPersistence {
    primary: Box<dyn SettingsPersistence>,
    fallback: Box<dyn SettingsPersistence>,
}

impl LayeredPersistence {
    pub fn new(
        primary: Box<dyn SettingsPersistence>,
        fallback: Box<dyn SettingsPersistence>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// Builds the file-backed stores for the application.
    ///
    /// With `config_dir` set, both files live under it (the fallback in a
    /// `cache` subdirectory). Otherwise the platform config and cache
    /// directories are used.
    pub fn for_app(config_dir: Option<&Path>) -> Self {
        let paths = SettingsPaths::resolve(config_dir);
        debug!(
            primary = %paths.primary.display(),
            fallback = %paths.fallback.display(),
            "settings paths resolved"
        );
        Self::new(
            Box::new(JsonDocumentStore::new(paths.primary)),
            Box::new(KeyedStore::new(paths.fallback, FALLBACK_KEY)),
        )
    }
}

impl SettingsPersistence for LayeredPersistence {
    fn name(&self) -> &'static str {
        "layered"
    }

    fn load(&self) -> Result<Option<Settings>, SettingsError> {
        let primary_error = match self.primary.load() {
            Ok(Some(settings)) => return Ok(Some(settings)),
            Ok(None) => None,
            Err(e) => {
                warn!(
                    "{} ストアから設定を読み込めません、フォールバックを使用します: {}",
                    self.primary.name(),
                    e
                );
                Some(e)
            }
        };

        match self.fallback.load() {
            Ok(Some(settings)) => Ok(Some(settings)),
            Ok(None) => match primary_error {
                Some(e) => Err(e),
                None => Ok(None),
            },
            Err(e) => {
                warn!("{} ストアから設定を読み込めません: {}", self.fallback.name(), e);
                Err(primary_error.unwrap_or(e))
            }
        }
    }

    fn persist(&self, settings: &Settings) -> Result<(), SettingsError> {
        let fallback_result = self.fallback.persist(settings);
        if let Err(e) = &fallback_result {
            warn!("{} ストアへの保存に失敗しました: {}", self.fallback.name(), e);
        }

        match self.primary.persist(settings) {
            Ok(()) => Ok(()),
            Err(e) if fallback_result.is_ok() => {
                warn!(
                    "{} ストアへの保存に失敗しました（フォールバックには保存済み）: {}",
                    self.primary.name(),
                    e
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

// ============================================================================
// SettingsPaths
// ============================================================================

/// Resolved file locations of both stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsPaths {
    /// Primary document
    pub primary: PathBuf,
    /// Fallback key/value file
    pub fallback: PathBuf,
}

impl SettingsPaths {
    /// Resolves the store paths, honoring an explicit directory override.
    pub fn resolve(config_dir: Option<&Path>) -> Self {
        match config_dir {
            Some(dir) => Self {
                primary: dir.join(SETTINGS_FILE_NAME),
                fallback: dir.join("cache").join(FALLBACK_FILE_NAME),
            },
            None => {
                let config_root = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
                let cache_root = dirs::cache_dir().unwrap_or_else(|| config_root.clone());
                Self {
                    primary: config_root.join(APP_DIR_NAME).join(SETTINGS_FILE_NAME),
                    fallback: cache_root.join(APP_DIR_NAME).join(FALLBACK_FILE_NAME),
                }
            }
        }
    }
}

// ============================================================================
// MemoryPersistence
// ============================================================================

/// In-memory persistence for testing.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    stored: Mutex<Option<serde_json::Value>>,
    persist_count: AtomicUsize,
    fail_load: AtomicBool,
    fail_persist: AtomicBool,
}

impl MemoryPersistence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given settings.
    #[must_use]
    pub fn with_settings(settings: &Settings) -> Self {
        let store = Self::new();
        store.set_raw(serde_json::to_value(settings).unwrap_or_default());
        store
    }

    /// Replaces the stored record with an arbitrary JSON value.
    pub fn set_raw(&self, value: serde_json::Value) {
        *self.stored.lock().unwrap() = Some(value);
    }

    /// Returns the stored record, if any.
    #[must_use]
    pub fn stored(&self) -> Option<Settings> {
        self.stored
            .lock()
            .unwrap()
            .as_ref()
            .map(Settings::merged_over_defaults)
    }

    #[must_use]
    pub fn persist_count(&self) -> usize {
        self.persist_count.load(Ordering::SeqCst)
    }

    pub fn set_fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_persist(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::SeqCst);
    }
}

impl SettingsPersistence for MemoryPersistence {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn load(&self) -> Result<Option<Settings>, SettingsError> {
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(SettingsError::Unavailable("mock load failure".to_string()));
        }
        Ok(self.stored())
    }

    fn persist(&self, settings: &Settings) -> Result<(), SettingsError> {
        self.persist_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(SettingsError::Unavailable("mock persist failure".to_string()));
        }
        let value = serde_json::to_value(settings).map_err(SettingsError::Serialize)?;
        *self.stored.lock().unwrap() = Some(value);
        Ok(())
    }
}

// ============================================================================
// File helpers
// ============================================================================

fn read_json_file(path: &Path) -> Result<Option<serde_json::Value>, SettingsError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&contents)
        .map(Some)
        .map_err(SettingsError::Parse)
}

/// Writes through a temporary file so readers never see a half-written document.
fn write_json_file(path: &Path, value: &serde_json::Value) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(SettingsError::DirectoryCreation)?;
    }

    let contents = serde_json::to_string_pretty(value).map_err(SettingsError::Serialize)?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents).map_err(|source| SettingsError::Write {
        path: tmp_path.clone(),
        source,
    })?;
    fs::rename(&tmp_path, path).map_err(|source| SettingsError::Write {
        path: path.to_path_buf(),
        source,
    })
}

// ============================================================================
// Tests
// ============================================================================
