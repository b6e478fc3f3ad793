//! macOS LaunchAgent registration.
//!
//! The agent runs `break-reminder run` at login. Its plist lives in
//! `~/Library/LaunchAgents/` and is loaded with `launchctl`.

use std::fs;
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use super::error::{AutostartError, Result};
use super::{resolve_binary_path, AutostartManager};

/// LaunchAgent plist structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LaunchAgentPlist {
    /// Service label (reverse domain format)
    #[serde(rename = "Label")]
    pub label: String,

    /// Program to execute with its arguments
    #[serde(rename = "ProgramArguments")]
    pub program_arguments: Vec<String>,

    /// Whether to start at login
    #[serde(rename = "RunAtLoad")]
    pub run_at_load: bool,

    /// Whether launchd restarts the process when it exits
    #[serde(rename = "KeepAlive")]
    pub keep_alive: bool,

    /// Path to stdout log file
    #[serde(rename = "StandardOutPath")]
    pub standard_out_path: String,

    /// Path to stderr log file
    #[serde(rename = "StandardErrorPath")]
    pub standard_error_path: String,

    /// launchd scheduling hint
    #[serde(rename = "ProcessType", skip_serializing_if = "Option::is_none")]
    pub process_type: Option<String>,
}

impl LaunchAgentPlist {
    /// The service label for the break reminder LaunchAgent.
    pub const LABEL: &'static str = "com.example.break-reminder";

    /// Creates the agent configuration for `binary_path`, logging to `log_dir`.
    pub fn new(binary_path: impl Into<String>, log_dir: impl Into<String>) -> Self {
        let log_dir = log_dir.into();

        Self {
            label: Self::LABEL.to_string(),
            program_arguments: vec![binary_path.into(), "run".to_string()],
            run_at_load: true,
            keep_alive: false,
            standard_out_path: format!("{}/stdout.log", log_dir),
            standard_error_path: format!("{}/stderr.log", log_dir),
            process_type: Some("Interactive".to_string()),
        }
    }

    /// Generates the plist XML string.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_xml(&self) -> Result<String> {
        let mut buf = Vec::new();
        plist::to_writer_xml(&mut buf, self).map_err(AutostartError::PlistSerialize)?;
        String::from_utf8(buf).map_err(AutostartError::PlistUtf8)
    }
}

/// Autostart through a per-user LaunchAgent.
#[derive(Debug, Clone)]
pub struct LaunchAgentAutostart {
    plist_path: PathBuf,
    log_dir: PathBuf,
    binary_path: PathBuf,
    /// Whether `launchctl` is invoked after writing or before removing
    manage_service: bool,
}

impl LaunchAgentAutostart {
    /// Creates a manager that writes into `agents_dir` without calling
    /// `launchctl`.
    pub fn new(
        agents_dir: impl AsRef<Path>,
        log_dir: impl Into<PathBuf>,
        binary_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            plist_path: agents_dir
                .as_ref()
                .join(format!("{}.plist", LaunchAgentPlist::LABEL)),
            log_dir: log_dir.into(),
            binary_path: binary_path.into(),
            manage_service: false,
        }
    }

    /// Creates the manager for the current user and binary.
    ///
    /// # Errors
    /// Returns an error if the home directory or binary path is unknown.
    pub fn for_current_user() -> Result<Self> {
        let home_dir = dirs::home_dir().ok_or(AutostartError::HomeDirectoryNotFound)?;
        let binary_path = resolve_binary_path()?;
        let mut manager = Self::new(
            home_dir.join("Library/LaunchAgents"),
            home_dir.join("Library/Logs/break-reminder"),
            binary_path,
        );
        manager.manage_service = true;
        Ok(manager)
    }

    /// Path of the plist file.
    pub fn plist_path(&self) -> &Path {
        &self.plist_path
    }

    fn install(&self) -> Result<()> {
        fs::create_dir_all(&self.log_dir).map_err(AutostartError::DirectoryCreation)?;

        let plist = LaunchAgentPlist::new(
            self.binary_path.to_string_lossy(),
            self.log_dir.to_string_lossy(),
        );
        let plist_xml = plist.to_xml()?;

        if let Some(parent) = self.plist_path.parent() {
            fs::create_dir_all(parent).map_err(AutostartError::DirectoryCreation)?;
        }
        fs::write(&self.plist_path, plist_xml).map_err(AutostartError::EntryWrite)?;

        #[cfg(unix)]
        {
            let mut perms = fs::metadata(&self.plist_path)
                .map_err(AutostartError::PermissionSet)?
                .permissions();
            perms.set_mode(0o644);
            fs::set_permissions(&self.plist_path, perms).map_err(AutostartError::PermissionSet)?;
        }

        if self.manage_service {
            // An older registration may still be loaded.
            let _ = launchctl_unload(&self.plist_path);
            launchctl_load(&self.plist_path)?;
        }

        tracing::info!("LaunchAgent installed at {:?}", self.plist_path);
        Ok(())
    }

    fn uninstall(&self) -> Result<()> {
        if !self.plist_path.exists() {
            tracing::info!("LaunchAgent plist file does not exist, nothing to remove");
            return Ok(());
        }

        if self.manage_service {
            let _ = launchctl_unload(&self.plist_path);
        }
        fs::remove_file(&self.plist_path).map_err(AutostartError::EntryRemove)?;

        tracing::info!("LaunchAgent removed");
        Ok(())
    }
}

impl AutostartManager for LaunchAgentAutostart {
    fn set_enabled(&self, enabled: bool) -> Result<()> {
        if enabled {
            self.install()
        } else {
            self.uninstall()
        }
    }

    fn is_enabled(&self) -> Result<bool> {
        Ok(self.plist_path.exists())
    }
}

/// Executes `launchctl load <plist_path>`.
fn launchctl_load(plist_path: &Path) -> Result<()> {
    let output = Command::new("launchctl")
        .arg("load")
        .arg(plist_path)
        .output()
        .map_err(|e| AutostartError::LaunchctlExecution(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AutostartError::ServiceLoad(stderr.to_string()));
    }

    tracing::debug!("launchctl load succeeded for {:?}", plist_path);
    Ok(())
}

/// Executes `launchctl unload <plist_path>`.
///
/// Fails when the service was not loaded; callers ignore that.
fn launchctl_unload(plist_path: &Path) -> Result<()> {
    let output = Command::new("launchctl")
        .arg("unload")
        .arg(plist_path)
        .output()
        .map_err(|e| AutostartError::LaunchctlExecution(e.to_string()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!("launchctl unload failed (may be already unloaded): {}", stderr);
        return Err(AutostartError::LaunchctlExecution(stderr.to_string()));
    }

    tracing::debug!("launchctl unload succeeded for {:?}", plist_path);
    Ok(())
}
