//! Launch-at-login registration.
//!
//! The stored `autostart` preference and the OS registration can drift
//! apart (the user may remove the entry by hand). [`reconcile`] treats the
//! OS as the source of truth and corrects the stored preference.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use break_reminder::autostart;
//! use break_reminder::settings::{LayeredPersistence, SettingsStore};
//!
//! let (store, _writer) = SettingsStore::load(Arc::new(LayeredPersistence::for_app(None)));
//! let manager = autostart::platform_manager()?;
//! autostart::set_autostart(&store, manager.as_ref(), true)?;
//! # Ok::<(), autostart::AutostartError>(())
//! ```

pub mod error;
pub mod launch_agent;
pub mod xdg;

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::{debug, info, warn};

use crate::settings::SettingsStore;
use crate::types::SettingsPatch;

pub use error::{AutostartError, Result};
pub use launch_agent::{LaunchAgentAutostart, LaunchAgentPlist};
pub use xdg::XdgAutostart;

/// Trait for OS launch-at-login registration.
pub trait AutostartManager {
    /// Registers or unregisters the app.
    ///
    /// # Errors
    /// Returns an error if the OS registration could not be changed.
    fn set_enabled(&self, enabled: bool) -> Result<()>;

    /// Returns whether the app is registered.
    ///
    /// # Errors
    /// Returns an error if the registration could not be inspected.
    fn is_enabled(&self) -> Result<bool>;
}

/// Returns the autostart mechanism of the current platform.
///
/// # Errors
/// Returns an error if the platform has none or paths cannot be resolved.
pub fn platform_manager() -> Result<Box<dyn AutostartManager>> {
    #[cfg(target_os = "macos")]
    {
        Ok(Box::new(LaunchAgentAutostart::for_current_user()?))
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        Ok(Box::new(XdgAutostart::for_current_user()?))
    }
    #[cfg(not(unix))]
    {
        Err(AutostartError::Unsupported)
    }
}

/// Resolves the absolute path of the running binary.
fn resolve_binary_path() -> Result<PathBuf> {
    let path = std::env::current_exe()
        .map_err(|e| AutostartError::BinaryPathResolution(e.to_string()))?;
    Ok(path.canonicalize().unwrap_or(path))
}

/// Aligns the stored preference with the OS registration.
///
/// Returns the OS state.
///
/// # Errors
/// Returns an error if the registration could not be inspected; the stored
/// preference is left alone in that case.
pub fn reconcile(store: &SettingsStore, manager: &dyn AutostartManager) -> Result<bool> {
    let registered = manager.is_enabled()?;
    if registered != store.snapshot().autostart {
        info!(registered, "autostart preference drifted, correcting");
        store.update(&SettingsPatch::autostart(registered));
    } else {
        debug!(registered, "autostart preference in sync");
    }
    Ok(registered)
}

/// Best-effort [`reconcile`] for display surfaces.
///
/// Failures are logged and the stored preference is kept. Returns the
/// preference after the check.
pub fn refresh(store: &SettingsStore, manager: &dyn AutostartManager) -> bool {
    match reconcile(store, manager) {
        Ok(registered) => registered,
        Err(e) => {
            warn!("自動起動の状態を確認できませんでした: {}", e);
            store.snapshot().autostart
        }
    }
}

/// Stores the preference, then changes the OS registration.
///
/// # Errors
/// Returns an error if the OS registration failed. The stored preference
/// keeps the new value; the next [`reconcile`] corrects it.
pub fn set_autostart(
    store: &SettingsStore,
    manager: &dyn AutostartManager,
    enabled: bool,
) -> Result<()> {
    store.update(&SettingsPatch::autostart(enabled));
    manager.set_enabled(enabled)
}

/// Mock autostart manager for testing.
#[derive(Debug, Default)]
pub struct MockAutostart {
    enabled: AtomicBool,
    set_calls: AtomicUsize,
    should_fail: AtomicBool,
}

impl MockAutostart {
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled: AtomicBool::new(enabled),
            ..Self::default()
        }
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    /// Simulates the user removing or adding the entry by hand.
    pub fn set_registered(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    #[must_use]
    pub fn set_call_count(&self) -> usize {
        self.set_calls.load(Ordering::SeqCst)
    }
}

impl AutostartManager for MockAutostart {
    fn set_enabled(&self, enabled: bool) -> Result<()> {
        self.set_calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(AutostartError::ServiceLoad("Mock failure".to_string()));
        }
        self.enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }

    fn is_enabled(&self) -> Result<bool> {
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(AutostartError::LaunchctlExecution("Mock failure".to_string()));
        }
        Ok(self.enabled.load(Ordering::SeqCst))
    }
}
