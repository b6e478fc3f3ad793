//! Surfaces that render the expiry popup.

use std::io::Write;
use std::sync::Mutex;

use crate::notification::NotificationError;
use crate::types::{NotificationMode, AUTO_RESTART_COUNTDOWN};

/// Trait for the window that appears when a break is due.
pub trait PopupSurface {
    /// Shows the popup with the resolutions offered by `mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the popup could not be shown.
    fn show_expiry_popup(&self, mode: NotificationMode) -> Result<(), NotificationError>;

    /// Closes the popup.
    ///
    /// # Errors
    ///
    /// Returns an error if the popup could not be closed.
    fn close_expiry_popup(&self) -> Result<(), NotificationError>;

    /// Shows the seconds left before an auto-mode restart.
    ///
    /// # Errors
    ///
    /// Returns an error if the counter could not be updated.
    fn update_countdown(&self, remaining: u32) -> Result<(), NotificationError>;
}

// ============================================================================
// TerminalPopup
// ============================================================================

/// Renders the popup as a boxed prompt on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalPopup;

impl TerminalPopup {
    fn write(text: &str) -> Result<(), NotificationError> {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }
}

impl PopupSurface for TerminalPopup {
    fn show_expiry_popup(&self, mode: NotificationMode) -> Result<(), NotificationError> {
        Self::write(&render_popup(mode))
    }

    fn close_expiry_popup(&self) -> Result<(), NotificationError> {
        Self::write("╰─ ポップアップを閉じました\n")
    }

    fn update_countdown(&self, remaining: u32) -> Result<(), NotificationError> {
        Self::write(&render_countdown(remaining))
    }
}

/// Renders the popup body for `mode`.
#[must_use]
pub fn render_popup(mode: NotificationMode) -> String {
    let mut out = String::new();
    out.push_str("\n╭─ 休憩の時間です ──────────────────────\n");
    out.push_str("│  少し体を動かして目を休めましょう\n");
    match mode {
        NotificationMode::Confirm => {
            out.push_str("│\n");
            out.push_str("│  ok       休憩する（タイマーを一時停止）\n");
            out.push_str("│  restart  次のサイクルを開始する\n");
        }
        NotificationMode::Auto => {
            out.push_str(&render_countdown(AUTO_RESTART_COUNTDOWN));
            out.push_str("│  close    閉じる（再開しない）\n");
        }
    }
    out.push_str("╰────────────────────────────────────────\n");
    out
}

/// Renders one countdown line.
#[must_use]
pub fn render_countdown(remaining: u32) -> String {
    format!("│  {} 秒後にタイマーを再開します\n", remaining)
}

// ============================================================================
// MockPopupSurface
// ============================================================================

/// A call recorded by [`MockPopupSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupCall {
    Show(NotificationMode),
    Close,
    Countdown(u32),
}

/// Mock popup surface for testing.
#[derive(Debug, Default)]
pub struct MockPopupSurface {
    calls: Mutex<Vec<PopupCall>>,
    should_fail: std::sync::atomic::AtomicBool,
}

impl MockPopupSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail
            .store(should_fail, std::sync::atomic::Ordering::SeqCst);
    }

    #[must_use]
    pub fn get_calls(&self) -> Vec<PopupCall> {
        self.calls.lock().unwrap().clone()
    }

    #[must_use]
    pub fn show_count(&self) -> usize {
        self.count(|call| matches!(call, PopupCall::Show(_)))
    }

    #[must_use]
    pub fn close_count(&self) -> usize {
        self.count(|call| matches!(call, PopupCall::Close))
    }

    pub fn clear_recorded(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn count(&self, pred: impl Fn(&PopupCall) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: PopupCall) -> Result<(), NotificationError> {
        self.calls.lock().unwrap().push(call);
        if self.should_fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(NotificationError::PopupFailed("Mock failure".to_string()));
        }
        Ok(())
    }
}

impl PopupSurface for MockPopupSurface {
    fn show_expiry_popup(&self, mode: NotificationMode) -> Result<(), NotificationError> {
        self.record(PopupCall::Show(mode))
    }

    fn close_expiry_popup(&self) -> Result<(), NotificationError> {
        self.record(PopupCall::Close)
    }

    fn update_countdown(&self, remaining: u32) -> Result<(), NotificationError> {
        self.record(PopupCall::Countdown(remaining))
    }
}
