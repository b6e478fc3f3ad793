//! Settings store for the break reminder.
//!
//! The store keeps the authoritative settings in memory and publishes them
//! through a `tokio::sync::watch` channel:
//!
//! ```text
//! update(patch) ──▶ watch::Sender<Settings> ──▶ TimerEngine (interval)
//!                              │             ──▶ runner (dnd, sound, mode)
//!                              ▼
//!                       SettingsWriter ──▶ LayeredPersistence
//! ```
//!
//! Updates are visible immediately. Persistence happens on the writer task,
//! which only ever sees the latest value: a write that is still in flight is
//! superseded by whatever was stored last, never queued behind it.
//!
//! Another process (`settings set` in a second shell) may change the stored
//! record while a reminder runs. [`SettingsStore::reload`] picks that up
//! unless a local change is still waiting to be written.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use break_reminder::settings::{LayeredPersistence, SettingsStore};
//! use break_reminder::types::SettingsPatch;
//!
//! # async fn demo() {
//! let persistence = Arc::new(LayeredPersistence::for_app(None));
//! let (store, writer) = SettingsStore::load(persistence);
//! let writer = tokio::spawn(writer.run());
//!
//! store.update(&SettingsPatch::dnd(true));
//!
//! // Dropping the store lets the writer flush the last value and exit.
//! drop(store);
//! let _ = writer.await;
//! # }
//! ```

pub mod error;
pub mod persistence;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::types::{Settings, SettingsPatch};

pub use error::SettingsError;
pub use persistence::{
    JsonDocumentStore, KeyedStore, LayeredPersistence, MemoryPersistence, SettingsPaths,
    SettingsPersistence,
};

// ============================================================================
// SettingsStore
// ============================================================================

/// Owner of the in-memory settings.
pub struct SettingsStore {
    tx: watch::Sender<Settings>,
    persistence: Arc<dyn SettingsPersistence>,
    /// Set while a local change has not reached persistence yet
    unsaved: Arc<AtomicBool>,
}

impl SettingsStore {
    /// Loads settings and creates the store with its writer.
    ///
    /// Never fails: unreadable stores yield defaults. On first run (nothing
    /// stored anywhere) the defaults are written back.
    pub fn load(persistence: Arc<dyn SettingsPersistence>) -> (Self, SettingsWriter) {
        let settings = load_or_default(persistence.as_ref());
        Self::new(settings, persistence)
    }

    /// Creates a store holding `settings` without touching persistence.
    pub fn new(
        settings: Settings,
        persistence: Arc<dyn SettingsPersistence>,
    ) -> (Self, SettingsWriter) {
        let (tx, _) = watch::channel(settings);
        let unsaved = Arc::new(AtomicBool::new(false));
        let writer = SettingsWriter {
            rx: tx.subscribe(),
            persistence: Arc::clone(&persistence),
            unsaved: Arc::clone(&unsaved),
        };
        (
            Self {
                tx,
                persistence,
                unsaved,
            },
            writer,
        )
    }

    /// Returns a copy of the current settings.
    pub fn snapshot(&self) -> Settings {
        self.tx.borrow().clone()
    }

    /// Returns a read-only view that always sees the latest settings.
    pub fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }

    /// Merges `patch` into the current settings and schedules persistence.
    ///
    /// Returns the merged settings. Persistence failures are logged by the
    /// writer and never roll this back.
    pub fn update(&self, patch: &SettingsPatch) -> Settings {
        self.unsaved.store(true, Ordering::SeqCst);
        self.tx.send_modify(|settings| patch.apply_to(settings));
        let settings = self.snapshot();
        debug!(?patch, "settings updated");
        settings
    }

    /// Restores and persists the default settings.
    pub fn reset_to_defaults(&self) -> Settings {
        self.unsaved.store(true, Ordering::SeqCst);
        self.tx.send_replace(Settings::default());
        info!("settings reset to defaults");
        Settings::default()
    }

    /// Returns true while a local change waits for the writer.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved.load(Ordering::SeqCst)
    }

    /// Replaces the in-memory settings with the stored record.
    ///
    /// Skipped while a local change is unsaved, so this never reverts it.
    /// Returns true if the settings changed.
    pub fn reload(&self) -> bool {
        if self.has_unsaved_changes() {
            debug!("local settings change not yet saved, reload skipped");
            return false;
        }

        let stored = match self.persistence.load() {
            Ok(Some(stored)) => stored,
            Ok(None) => return false,
            Err(e) => {
                warn!("設定の再読み込みに失敗しました: {}", e);
                return false;
            }
        };

        let changed = self.tx.send_if_modified(|current| {
            if *current == stored {
                return false;
            }
            *current = stored;
            true
        });
        if changed {
            info!("settings changed by another process, reloaded");
        }
        changed
    }
}

/// Loads settings, falling back to defaults on any failure.
pub fn load_or_default(persistence: &dyn SettingsPersistence) -> Settings {
    match persistence.load() {
        Ok(Some(settings)) => settings,
        Ok(None) => {
            info!("no stored settings, writing defaults");
            let settings = Settings::default();
            if let Err(e) = persistence.persist(&settings) {
                warn!("初期設定の保存に失敗しました: {}", e);
            }
            settings
        }
        Err(e) => {
            warn!("設定の読み込みに失敗しました、既定値を使用します: {}", e);
            Settings::default()
        }
    }
}

// ============================================================================
// SettingsWriter
// ============================================================================

/// Background task that persists the latest settings.
pub struct SettingsWriter {
    rx: watch::Receiver<Settings>,
    persistence: Arc<dyn SettingsPersistence>,
    unsaved: Arc<AtomicBool>,
}

impl SettingsWriter {
    /// Persists every settings change until the store is dropped.
    ///
    /// A change made while a write is in flight is picked up afterwards; the
    /// intermediate values are skipped.
    pub async fn run(mut self) {
        while self.rx.changed().await.is_ok() {
            let settings = self.rx.borrow_and_update().clone();
            let persistence = Arc::clone(&self.persistence);

            match tokio::task::spawn_blocking(move || persistence.persist(&settings)).await {
                Ok(Ok(())) => {
                    if !self.rx.has_changed().unwrap_or(false) {
                        self.unsaved.store(false, Ordering::SeqCst);
                    }
                    debug!("settings persisted");
                }
                Ok(Err(e)) => warn!("設定の保存に失敗しました: {}", e),
                Err(e) => warn!("設定保存タスクが異常終了しました: {}", e),
            }
        }
        debug!("settings writer stopped");
    }
}

// ============================================================================
// Tests
// ============================================================================
