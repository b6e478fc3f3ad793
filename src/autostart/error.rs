//! Error types for autostart registration.

use std::io;
use thiserror::Error;

/// Autostart registration error type.
#[derive(Debug, Error)]
pub enum AutostartError {
    /// Failed to resolve the path of the running binary.
    #[error("Failed to resolve break-reminder binary path: {0}")]
    BinaryPathResolution(String),

    /// Home or config directory not found.
    #[error("Failed to get home directory")]
    HomeDirectoryNotFound,

    /// Failed to create directory.
    #[error("Failed to create directory: {0}")]
    DirectoryCreation(#[source] io::Error),

    /// Failed to read the login entry.
    #[error("Failed to read autostart entry: {0}")]
    EntryRead(#[source] io::Error),

    /// Failed to write the login entry.
    #[error("Failed to write autostart entry: {0}")]
    EntryWrite(#[source] io::Error),

    /// Failed to remove the login entry.
    #[error("Failed to remove autostart entry: {0}")]
    EntryRemove(#[source] io::Error),

    /// Failed to serialize plist.
    #[error("Failed to serialize plist: {0}")]
    PlistSerialize(#[source] plist::Error),

    /// Failed to convert plist to UTF-8 string.
    #[error("Failed to convert plist to UTF-8: {0}")]
    PlistUtf8(#[source] std::string::FromUtf8Error),

    /// Failed to set file permissions.
    #[error("Failed to set file permissions: {0}")]
    PermissionSet(#[source] io::Error),

    /// Failed to execute launchctl command.
    #[error("Failed to execute launchctl: {0}")]
    LaunchctlExecution(String),

    /// Failed to load LaunchAgent.
    #[error("Failed to load LaunchAgent: {0}")]
    ServiceLoad(String),

    /// No autostart mechanism exists for this platform.
    #[error("Autostart is not supported on this platform")]
    Unsupported,
}

impl AutostartError {
    /// Returns true if retrying with different permissions might help.
    #[must_use]
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            Self::DirectoryCreation(_)
                | Self::EntryRead(_)
                | Self::EntryWrite(_)
                | Self::EntryRemove(_)
                | Self::PermissionSet(_)
        )
    }
}

/// Result type for autostart operations.
pub type Result<T> = std::result::Result<T, AutostartError>;
