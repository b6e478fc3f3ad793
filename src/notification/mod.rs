//! Expiry notification dispatch.
//!
//! The dispatcher watches timer status events and fans out to the signal
//! collaborators on the edge into Expired:
//!
//! ```text
//! StatusChanged { to: Expired } ──▶ dnd? ──yes──▶ Suppressed
//!                                     │ no
//!                                     ├──▶ SoundPlayer       (if sound_enabled)
//!                                     ├──▶ AttentionRequester
//!                                     └──▶ PopupSurface      ──▶ Delivered
//! ```
//!
//! Collaborator failures are logged and never stop the next signal.

mod attention;
pub mod error;

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::daemon::TimerEvent;
use crate::popup::PopupSurface;
use crate::sound::{SoundPlayer, SoundSource};
use crate::types::{NotificationMode, Settings, TimerStatus};

pub use attention::{AttentionRequester, MockAttentionRequester, TerminalAttention};
pub use error::NotificationError;

/// What the dispatcher did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Not an edge into Expired.
    Ignored,
    /// Edge into Expired while do-not-disturb was on.
    Suppressed,
    /// Signals were sent; the popup was shown in `mode`.
    Delivered {
        /// Mode read at the moment of expiry
        mode: NotificationMode,
    },
}

/// Sends the expiry signals exactly once per transition into Expired.
pub struct NotificationDispatcher {
    /// Status seen on the previous event
    last_status: TimerStatus,
    settings: watch::Receiver<Settings>,
    sound: Option<Arc<dyn SoundPlayer>>,
    sound_source: SoundSource,
    attention: Arc<dyn AttentionRequester>,
    popup: Arc<dyn PopupSurface>,
}

impl NotificationDispatcher {
    /// Creates a dispatcher without sound.
    pub fn new(
        settings: watch::Receiver<Settings>,
        attention: Arc<dyn AttentionRequester>,
        popup: Arc<dyn PopupSurface>,
    ) -> Self {
        Self {
            last_status: TimerStatus::Idle,
            settings,
            sound: None,
            sound_source: SoundSource::Chime,
            attention,
            popup,
        }
    }

    /// Adds a sound player and the sound it plays.
    #[must_use]
    pub fn with_sound(mut self, player: Arc<dyn SoundPlayer>, source: SoundSource) -> Self {
        info!("expiry sound: {}", source.name());
        self.sound = Some(player);
        self.sound_source = source;
        self
    }

    /// Handles a timer event. Only status changes matter.
    pub fn handle(&mut self, event: &TimerEvent) -> DispatchOutcome {
        match event {
            TimerEvent::StatusChanged { to, .. } => self.on_status(*to),
            TimerEvent::Tick { .. } | TimerEvent::IntervalChanged { .. } => {
                DispatchOutcome::Ignored
            }
        }
    }

    /// Records `status` and signals if it is a fresh transition into Expired.
    pub fn on_status(&mut self, status: TimerStatus) -> DispatchOutcome {
        let previous = std::mem::replace(&mut self.last_status, status);
        if status != TimerStatus::Expired || previous == TimerStatus::Expired {
            return DispatchOutcome::Ignored;
        }

        let settings = self.settings.borrow().clone();
        if settings.dnd {
            debug!("do not disturb is on, expiry signals suppressed");
            return DispatchOutcome::Suppressed;
        }

        if settings.sound_enabled {
            if let Some(player) = &self.sound {
                if let Err(e) = player.play(&self.sound_source) {
                    warn!("通知音の再生に失敗しました: {}", e);
                }
            }
        }

        if let Err(e) = self.attention.request_attention() {
            warn!("{} ({})", e, e.suggestion());
        }

        if let Err(e) = self.popup.show_expiry_popup(settings.mode) {
            warn!("{} ({})", e, e.suggestion());
        }

        info!(mode = settings.mode.as_str(), "break reminder delivered");
        DispatchOutcome::Delivered {
            mode: settings.mode,
        }
    }

    /// Status seen on the most recent event.
    pub fn last_status(&self) -> TimerStatus {
        self.last_status
    }
}
