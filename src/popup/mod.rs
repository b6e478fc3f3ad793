//! Expiry popup interaction.
//!
//! The controller decides what a popup interaction resolves to; the runner
//! applies that resolution to the engine and closes the surface.
//!
//! ```text
//!            open(mode)                     acknowledge / close
//! (closed) ─────────────▶ Confirm ─────────────────────────────▶ Pause
//!                           │ acknowledge_and_restart ─────────▶ RestartCycle
//!                           │
//!                         Auto ── on_tick × 10 ───────────────▶ RestartCycle
//!                           │ close ──────────────────────────▶ Pause
//! ```
//!
//! The mode is latched at `open`; a settings change while the popup is
//! showing only affects the next interaction.

mod surface;

use tracing::{debug, warn};

use crate::daemon::TimerEngine;
use crate::types::{NotificationMode, AUTO_RESTART_COUNTDOWN};

pub use surface::{
    render_countdown, render_popup, MockPopupSurface, PopupCall, PopupSurface, TerminalPopup,
};

/// What a finished interaction asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupResolution {
    /// `pause()`; a no-op when the timer is expired.
    Pause,
    /// `reset_and_start()`.
    RestartCycle,
}

/// Result of one auto-mode countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownTick {
    /// No countdown is running.
    Inactive,
    /// Seconds left after this tick.
    Remaining(u32),
    /// The countdown reached zero and the interaction closed.
    Elapsed(PopupResolution),
}

#[derive(Debug, Clone, Copy)]
struct Interaction {
    mode: NotificationMode,
    countdown: Option<u32>,
}

/// State of the expiry popup interaction.
#[derive(Debug, Default)]
pub struct PopupController {
    interaction: Option<Interaction>,
}

impl PopupController {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an interaction in `mode`.
    ///
    /// Returns false if one is already open; its mode is kept.
    pub fn open(&mut self, mode: NotificationMode) -> bool {
        if let Some(current) = self.interaction {
            debug!(mode = current.mode.as_str(), "popup already open");
            return false;
        }

        let countdown = match mode {
            NotificationMode::Confirm => None,
            NotificationMode::Auto => Some(AUTO_RESTART_COUNTDOWN),
        };
        self.interaction = Some(Interaction { mode, countdown });
        debug!(mode = mode.as_str(), "popup opened");
        true
    }

    pub fn is_open(&self) -> bool {
        self.interaction.is_some()
    }

    /// Mode latched by the open interaction.
    pub fn mode(&self) -> Option<NotificationMode> {
        self.interaction.map(|i| i.mode)
    }

    /// Seconds left before an auto-mode restart.
    pub fn countdown(&self) -> Option<u32> {
        self.interaction.and_then(|i| i.countdown)
    }

    pub fn is_counting_down(&self) -> bool {
        self.countdown().is_some()
    }

    /// "OK": take the break. Pauses the timer and closes.
    pub fn acknowledge(&mut self) -> Option<PopupResolution> {
        self.finish(PopupResolution::Pause)
    }

    /// "OK and restart": only offered in confirm mode.
    pub fn acknowledge_and_restart(&mut self) -> Option<PopupResolution> {
        match self.mode() {
            Some(NotificationMode::Confirm) => self.finish(PopupResolution::RestartCycle),
            Some(NotificationMode::Auto) => {
                debug!("restart is not offered in auto mode, ignoring");
                None
            }
            None => None,
        }
    }

    /// Manual close. Never restarts, even during an auto countdown.
    pub fn close(&mut self) -> Option<PopupResolution> {
        self.finish(PopupResolution::Pause)
    }

    /// Closes without resolving, e.g. when the timer left Expired by other
    /// means. Returns true if an interaction was open.
    pub fn dismiss(&mut self) -> bool {
        self.interaction.take().is_some()
    }

    /// Advances the auto-mode countdown by one tick.
    pub fn on_tick(&mut self) -> CountdownTick {
        let Some(interaction) = self.interaction.as_mut() else {
            return CountdownTick::Inactive;
        };
        let Some(countdown) = interaction.countdown.as_mut() else {
            return CountdownTick::Inactive;
        };

        *countdown = countdown.saturating_sub(1);
        let left = *countdown;
        if left == 0 {
            self.interaction = None;
            debug!("auto restart countdown elapsed");
            CountdownTick::Elapsed(PopupResolution::RestartCycle)
        } else {
            CountdownTick::Remaining(left)
        }
    }

    fn finish(&mut self, resolution: PopupResolution) -> Option<PopupResolution> {
        let interaction = self.interaction.take()?;
        debug!(mode = interaction.mode.as_str(), ?resolution, "popup resolved");
        Some(resolution)
    }
}

/// Applies `resolution` to the engine, then closes the surface.
pub fn apply_resolution(
    resolution: PopupResolution,
    engine: &mut TimerEngine,
    surface: &dyn PopupSurface,
) {
    match resolution {
        PopupResolution::Pause => {
            engine.pause();
        }
        PopupResolution::RestartCycle => {
            engine.reset_and_start();
        }
    }
    if let Err(e) = surface.close_expiry_popup() {
        warn!("ポップアップを閉じられませんでした: {}", e);
    }
}
