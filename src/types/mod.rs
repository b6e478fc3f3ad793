//! Core data types for the break reminder.
//!
//! This module defines the data structures used for:
//! - Timer status and state
//! - User settings with field-by-field default recovery
//! - Partial settings updates

use std::time::{Duration, Instant};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

// ============================================================================
// Constants
// ============================================================================

/// Default reminder interval in minutes.
pub const DEFAULT_INTERVAL_MINUTES: u32 = 60;

/// Smallest accepted interval in minutes.
pub const MIN_INTERVAL_MINUTES: u32 = 1;

/// Largest accepted interval in minutes.
pub const MAX_INTERVAL_MINUTES: u32 = 999;

/// Interval presets offered by the settings surface.
pub const INTERVAL_PRESETS: [u32; 4] = [40, 60, 90, 120];

/// Number of countdown ticks before an auto-mode popup restarts the cycle.
pub const AUTO_RESTART_COUNTDOWN: u32 = 10;

/// Cadence of both the engine tick and the auto-mode countdown.
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Normalizes a raw interval value.
///
/// Non-positive values fall back to [`DEFAULT_INTERVAL_MINUTES`]; values above
/// [`MAX_INTERVAL_MINUTES`] are clamped.
#[must_use]
pub fn normalize_interval_minutes(raw: i64) -> u32 {
    if raw < i64::from(MIN_INTERVAL_MINUTES) {
        DEFAULT_INTERVAL_MINUTES
    } else if raw > i64::from(MAX_INTERVAL_MINUTES) {
        MAX_INTERVAL_MINUTES
    } else {
        raw as u32
    }
}

/// Parses interval text typed by a user.
///
/// Unparsable text counts as zero and therefore yields the default.
#[must_use]
pub fn parse_interval_input(text: &str) -> u32 {
    normalize_interval_minutes(text.trim().parse::<i64>().unwrap_or(0))
}

/// Converts an interval in minutes to a duration.
#[must_use]
pub fn minutes_to_duration(minutes: u32) -> Duration {
    Duration::from_secs(u64::from(minutes) * 60)
}

// ============================================================================
// TimerStatus
// ============================================================================

/// Represents the current status of the reminder timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerStatus {
    /// Not counting, holding a full interval
    #[default]
    Idle,
    /// Counting down
    Running,
    /// Counting suspended, remaining time kept
    Paused,
    /// The interval ran out; waiting for resolution
    Expired,
}

impl TimerStatus {
    /// Returns the string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
            TimerStatus::Expired => "expired",
        }
    }

    /// Returns true if `start()` is allowed from this status.
    pub fn can_start(&self) -> bool {
        matches!(self, TimerStatus::Idle | TimerStatus::Paused)
    }
}

impl std::fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// TimerState
// ============================================================================

/// Mutable state of the reminder timer.
///
/// `remaining` is authoritative only when the timer is not running. While
/// running, the true remaining time is derived from `start_instant`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerState {
    /// Current status
    pub status: TimerStatus,
    /// When the current run began; present iff `status` is `Running`
    pub start_instant: Option<Instant>,
    /// Total duration of the current cycle
    pub interval: Duration,
    /// Cached remaining time
    pub remaining: Duration,
}

impl TimerState {
    /// Creates an idle state holding a full interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            status: TimerStatus::Idle,
            start_instant: None,
            interval,
            remaining: interval,
        }
    }

    /// Computes the remaining time as of `now`.
    ///
    /// Returns the cached value unless the timer is running.
    pub fn remaining_at(&self, now: Instant) -> Duration {
        match (self.status, self.start_instant) {
            (TimerStatus::Running, Some(start)) => self
                .interval
                .saturating_sub(now.saturating_duration_since(start)),
            _ => self.remaining,
        }
    }

    /// Returns true if the timer is counting down.
    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }
}

// ============================================================================
// Settings
// ============================================================================

/// How an expired interval is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationMode {
    /// Wait for the user to acknowledge
    #[default]
    Confirm,
    /// Count down and restart automatically
    Auto,
}

impl NotificationMode {
    /// Returns the string representation of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationMode::Confirm => "confirm",
            NotificationMode::Auto => "auto",
        }
    }
}

/// Color theme preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Light theme
    Light,
    /// Dark theme
    Dark,
    /// Follow the system preference
    #[default]
    System,
}

impl Theme {
    /// Returns the string representation of the theme.
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        }
    }
}

/// User settings, persisted as a single document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Reminder interval in minutes (1-999)
    pub interval_minutes: u32,
    /// How an expired interval is resolved
    pub mode: NotificationMode,
    /// Do not disturb: suppress sound, attention and popup
    pub dnd: bool,
    /// Keep the main surface above other windows
    pub always_on_top: bool,
    /// Color theme
    pub theme: Theme,
    /// Launch at login
    pub autostart: bool,
    /// Play a sound on expiry
    pub sound_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            interval_minutes: DEFAULT_INTERVAL_MINUTES,
            mode: NotificationMode::Confirm,
            dnd: false,
            always_on_top: false,
            theme: Theme::System,
            autostart: true,
            sound_enabled: true,
        }
    }
}

impl Settings {
    /// Builds settings from a stored JSON record, taking each field that
    /// parses and falling back to the default for the rest.
    pub fn merged_over_defaults(value: &serde_json::Value) -> Self {
        let mut settings = Self::default();
        let Some(map) = value.as_object() else {
            return settings;
        };

        if let Some(raw) = map.get("intervalMinutes").and_then(interval_from_json) {
            settings.interval_minutes = raw;
        }
        if let Some(mode) = field(map, "mode") {
            settings.mode = mode;
        }
        if let Some(dnd) = field(map, "dnd") {
            settings.dnd = dnd;
        }
        if let Some(always_on_top) = field(map, "alwaysOnTop") {
            settings.always_on_top = always_on_top;
        }
        if let Some(theme) = field(map, "theme") {
            settings.theme = theme;
        }
        if let Some(autostart) = field(map, "autostart") {
            settings.autostart = autostart;
        }
        if let Some(sound_enabled) = field(map, "soundEnabled") {
            settings.sound_enabled = sound_enabled;
        }

        settings
    }

    /// Returns the configured interval as a duration.
    pub fn interval(&self) -> Duration {
        minutes_to_duration(normalize_interval_minutes(i64::from(self.interval_minutes)))
    }

    /// Returns a copy with `patch` applied.
    #[must_use]
    pub fn with_patch(mut self, patch: &SettingsPatch) -> Self {
        patch.apply_to(&mut self);
        self
    }
}

fn field<T: DeserializeOwned>(
    map: &serde_json::Map<String, serde_json::Value>,
    key: &str,
) -> Option<T> {
    map.get(key)
        .and_then(|value| serde_json::from_value(value.clone()).ok())
}

fn interval_from_json(value: &serde_json::Value) -> Option<u32> {
    let raw = match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?,
        serde_json::Value::String(s) => return Some(parse_interval_input(s)),
        _ => return None,
    };
    Some(normalize_interval_minutes(raw))
}

// ============================================================================
// SettingsPatch
// ============================================================================

/// A partial settings update. Only `Some` fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    /// Interval in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval_minutes: Option<u32>,
    /// Resolution mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<NotificationMode>,
    /// Do not disturb
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dnd: Option<bool>,
    /// Always on top
    #[serde(skip_serializing_if = "Option::is_none")]
    pub always_on_top: Option<bool>,
    /// Theme
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,
    /// Launch at login
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autostart: Option<bool>,
    /// Sound on expiry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_enabled: Option<bool>,
}

impl SettingsPatch {
    /// Patch that only changes the interval.
    pub fn interval(minutes: u32) -> Self {
        Self {
            interval_minutes: Some(minutes),
            ..Self::default()
        }
    }

    /// Patch that only changes do-not-disturb.
    pub fn dnd(enabled: bool) -> Self {
        Self {
            dnd: Some(enabled),
            ..Self::default()
        }
    }

    /// Patch that only changes the autostart preference.
    pub fn autostart(enabled: bool) -> Self {
        Self {
            autostart: Some(enabled),
            ..Self::default()
        }
    }

    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the present fields to `settings`, leaving the rest untouched.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(minutes) = self.interval_minutes {
            settings.interval_minutes = normalize_interval_minutes(i64::from(minutes));
        }
        if let Some(mode) = self.mode {
            settings.mode = mode;
        }
        if let Some(dnd) = self.dnd {
            settings.dnd = dnd;
        }
        if let Some(always_on_top) = self.always_on_top {
            settings.always_on_top = always_on_top;
        }
        if let Some(theme) = self.theme {
            settings.theme = theme;
        }
        if let Some(autostart) = self.autostart {
            settings.autostart = autostart;
        }
        if let Some(sound_enabled) = self.sound_enabled {
            settings.sound_enabled = sound_enabled;
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
