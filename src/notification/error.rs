//! Notification system error types.
//!
//! These errors come from the collaborators that signal an expired timer.
//! None of them is fatal: the dispatcher logs them and moves on to the next
//! signal.

use thiserror::Error;

/// Errors that can occur while signalling an expired timer.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Failed to request the user's attention.
    #[error("注意喚起に失敗しました: {0}")]
    AttentionFailed(String),

    /// Failed to show, update or close the expiry popup.
    #[error("ポップアップの表示に失敗しました: {0}")]
    PopupFailed(String),

    /// The output surface is not available (e.g., stdout closed).
    #[error("通知先が利用できません")]
    NotAvailable,
}

impl NotificationError {
    /// Returns true if this error concerns the expiry popup.
    #[must_use]
    pub fn is_popup_error(&self) -> bool {
        matches!(self, Self::PopupFailed(_))
    }

    /// Returns a user-friendly suggestion for resolving this error.
    #[must_use]
    pub fn suggestion(&self) -> &'static str {
        match self {
            Self::AttentionFailed(_) => "端末のベル設定を確認してください",
            Self::PopupFailed(_) => "端末の出力先を確認してください",
            Self::NotAvailable => "対話可能な端末で run を実行してください",
        }
    }
}

impl From<std::io::Error> for NotificationError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::BrokenPipe {
            Self::NotAvailable
        } else {
            Self::PopupFailed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NotificationError::NotAvailable;
        assert_eq!(err.to_string(), "通知先が利用できません");

        let err = NotificationError::AttentionFailed("bell".to_string());
        assert!(err.to_string().contains("bell"));
    }

    #[test]
    fn test_is_popup_error() {
        assert!(NotificationError::PopupFailed("x".into()).is_popup_error());
        assert!(!NotificationError::NotAvailable.is_popup_error());
    }

    #[test]
    fn test_from_io_error() {
        let err: NotificationError =
            std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed").into();
        assert!(matches!(err, NotificationError::NotAvailable));

        let err: NotificationError = std::io::Error::other("boom").into();
        assert!(err.is_popup_error());
    }

    #[test]
    fn test_suggestion() {
        assert!(NotificationError::NotAvailable.suggestion().contains("run"));
    }
}
