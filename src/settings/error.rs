//! Settings persistence error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading or writing settings.
///
/// None of these reach the user-facing mutation path; they are logged by the
/// store and the in-memory settings stay authoritative.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Failed to read a settings file.
    #[error("設定ファイルの読み込みに失敗しました ({path}): {source}")]
    Read {
        /// File that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Failed to write a settings file.
    #[error("設定ファイルの書き込みに失敗しました ({path}): {source}")]
    Write {
        /// File that could not be written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Failed to create the settings directory.
    #[error("設定ディレクトリの作成に失敗しました: {0}")]
    DirectoryCreation(#[source] io::Error),

    /// Stored data is not valid JSON.
    #[error("設定データの解析に失敗しました: {0}")]
    Parse(#[source] serde_json::Error),

    /// Settings could not be serialized.
    #[error("設定データのシリアライズに失敗しました: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The backing store is not available.
    #[error("設定ストアが利用できません: {0}")]
    Unavailable(String),
}

impl SettingsError {
    /// Returns true if this error came from file system I/O.
    #[must_use]
    pub fn is_io_error(&self) -> bool {
        matches!(
            self,
            Self::Read { .. } | Self::Write { .. } | Self::DirectoryCreation(_)
        )
    }

    /// Returns true if the stored data itself is damaged.
    #[must_use]
    pub fn is_corrupt_data(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_includes_path() {
        let err = SettingsError::Read {
            path: PathBuf::from("/tmp/settings.json"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let message = err.to_string();
        assert!(message.contains("/tmp/settings.json"));
        assert!(message.contains("denied"));
    }

    #[test]
    fn test_classification() {
        let io_err = SettingsError::DirectoryCreation(io::Error::other("x"));
        assert!(io_err.is_io_error());
        assert!(!io_err.is_corrupt_data());

        let parse_err =
            SettingsError::Parse(serde_json::from_str::<serde_json::Value>("{").unwrap_err());
        assert!(parse_err.is_corrupt_data());
        assert!(!parse_err.is_io_error());

        assert!(!SettingsError::Unavailable("x".into()).is_io_error());
    }
}
