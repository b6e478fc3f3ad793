//! XDG autostart entry for Linux and BSD desktops.

use std::fs;
use std::path::{Path, PathBuf};

use super::error::{AutostartError, Result};
use super::{resolve_binary_path, AutostartManager};

/// File name of the desktop entry.
pub const DESKTOP_FILE_NAME: &str = "break-reminder.desktop";

/// Autostart through `$XDG_CONFIG_HOME/autostart/break-reminder.desktop`.
#[derive(Debug, Clone)]
pub struct XdgAutostart {
    desktop_path: PathBuf,
    binary_path: PathBuf,
}

impl XdgAutostart {
    pub fn new(autostart_dir: impl AsRef<Path>, binary_path: impl Into<PathBuf>) -> Self {
        Self {
            desktop_path: autostart_dir.as_ref().join(DESKTOP_FILE_NAME),
            binary_path: binary_path.into(),
        }
    }

    /// Creates the manager for the current user and binary.
    ///
    /// # Errors
    /// Returns an error if the config directory or binary path is unknown.
    pub fn for_current_user() -> Result<Self> {
        let config_dir = dirs::config_dir().ok_or(AutostartError::HomeDirectoryNotFound)?;
        Ok(Self::new(config_dir.join("autostart"), resolve_binary_path()?))
    }

    pub fn desktop_path(&self) -> &Path {
        &self.desktop_path
    }
}

/// Renders the desktop entry launching `binary_path run`.
#[must_use]
pub fn desktop_entry(binary_path: &Path) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name=Break Reminder\n\
         Comment=Reminds you to take regular breaks\n\
         Exec=\"{}\" run\n\
         Terminal=true\n\
         X-GNOME-Autostart-enabled=true\n",
        binary_path.display()
    )
}

impl AutostartManager for XdgAutostart {
    fn set_enabled(&self, enabled: bool) -> Result<()> {
        if enabled {
            if let Some(parent) = self.desktop_path.parent() {
                fs::create_dir_all(parent).map_err(AutostartError::DirectoryCreation)?;
            }
            fs::write(&self.desktop_path, desktop_entry(&self.binary_path))
                .map_err(AutostartError::EntryWrite)?;
            tracing::info!("autostart entry written to {:?}", self.desktop_path);
        } else if self.desktop_path.exists() {
            fs::remove_file(&self.desktop_path).map_err(AutostartError::EntryRemove)?;
            tracing::info!("autostart entry removed");
        }
        Ok(())
    }

    fn is_enabled(&self) -> Result<bool> {
        match fs::read_to_string(&self.desktop_path) {
            Ok(content) => Ok(!content.lines().any(|line| {
                let line = line.trim();
                line == "Hidden=true" || line == "X-GNOME-Autostart-enabled=false"
            })),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AutostartError::EntryRead(e)),
        }
    }
}
