//! Attention requests.
//!
//! On a desktop this would flash the taskbar entry; in the terminal the bell
//! character does the same job.

use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::error::NotificationError;

/// ASCII bell.
const BELL: &[u8] = b"\x07";

/// Trait for asking the desktop to draw the user's eye to the app.
pub trait AttentionRequester {
    /// Requests attention. Must not block.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be delivered.
    fn request_attention(&self) -> Result<(), NotificationError>;
}

/// Rings the terminal bell on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalAttention;

impl AttentionRequester for TerminalAttention {
    fn request_attention(&self) -> Result<(), NotificationError> {
        let mut stderr = std::io::stderr().lock();
        stderr
            .write_all(BELL)
            .and_then(|()| stderr.flush())
            .map_err(|e| NotificationError::AttentionFailed(e.to_string()))
    }
}

/// Mock attention requester for testing.
#[derive(Debug, Default)]
pub struct MockAttentionRequester {
    calls: AtomicUsize,
    should_fail: AtomicBool,
}

impl MockAttentionRequester {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_should_fail(&self, should_fail: bool) {
        self.should_fail.store(should_fail, Ordering::SeqCst);
    }

    #[must_use]
    pub fn request_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AttentionRequester for MockAttentionRequester {
    fn request_attention(&self) -> Result<(), NotificationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail.load(Ordering::SeqCst) {
            return Err(NotificationError::AttentionFailed("Mock failure".to_string()));
        }
        Ok(())
    }
}
