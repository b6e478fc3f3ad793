//! Break Reminder Library
//!
//! This library provides the core functionality for the break reminder CLI.
//! It includes:
//! - Timer engine with an Idle/Running/Paused/Expired state machine
//! - Settings store with optimistic updates and background persistence
//! - Expiry notification dispatch (sound, attention request, popup)
//! - Popup interaction in confirm and auto-restart modes
//! - Launch-at-login registration (LaunchAgent on macOS, XDG elsewhere)
//! - CLI command parsing and display utilities

pub mod autostart;
pub mod cli;
pub mod daemon;
pub mod notification;
pub mod popup;
pub mod settings;
pub mod sound;
pub mod types;

// Re-export commonly used types for convenience
pub use types::{NotificationMode, Settings, SettingsPatch, Theme, TimerState, TimerStatus};

pub use daemon::{
    Clock, DaemonCommand, ManualClock, Runner, SystemClock, TimerEngine, TimerEvent,
};

pub use settings::{LayeredPersistence, MemoryPersistence, SettingsError, SettingsStore};

pub use notification::{
    AttentionRequester, DispatchOutcome, MockAttentionRequester, NotificationDispatcher,
    NotificationError, TerminalAttention,
};

pub use popup::{
    MockPopupSurface, PopupController, PopupResolution, PopupSurface, TerminalPopup,
};

pub use sound::{
    get_default_sound, MockSoundPlayer, RodioSoundPlayer, SoundError, SoundPlayer, SoundSource,
};

pub use autostart::{AutostartError, AutostartManager, MockAutostart};
