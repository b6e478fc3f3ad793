//! Command definitions for the break reminder CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::{parse_interval_input, NotificationMode, SettingsPatch, Theme};

// ============================================================================
// CLI Structure
// ============================================================================

/// Break Reminder - nudges you to step away from the screen
#[derive(Parser, Debug)]
#[command(
    name = "break-reminder",
    version,
    about = "定期的に休憩を促すリマインダー",
    long_about = "設定した間隔ごとに休憩の時間を知らせるタイマー。\n\
                  通知音・ベル・ポップアップで知らせ、確認モードと自動再開モードを選べます。",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory for settings files instead of the platform default
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the reminder in the foreground
    Run(RunArgs),

    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Manage launch at login
    #[command(subcommand)]
    Autostart(AutostartCommand),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Arguments for the run command
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Stay idle until `start` is typed
    #[arg(long)]
    pub paused: bool,
}

/// Settings subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommand {
    /// Show the current settings
    Show,

    /// Change one or more settings
    Set(SetArgs),

    /// Restore the default settings
    Reset,
}

/// Autostart subcommands
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutostartCommand {
    /// Launch at login
    Enable,

    /// Do not launch at login
    Disable,

    /// Show the registration, correcting the stored preference if needed
    Status,
}

// ============================================================================
// Set Command Arguments
// ============================================================================

/// Arguments for `settings set`
#[derive(Args, Debug, Clone, Default)]
pub struct SetArgs {
    /// Reminder interval in minutes (1-999; invalid values become 60)
    #[arg(short, long, value_parser = parse_interval_arg)]
    pub interval: Option<u32>,

    /// What happens when the popup appears
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Do not disturb: suppress every expiry signal
    #[arg(long, value_name = "BOOL")]
    pub dnd: Option<bool>,

    /// Play a sound on expiry
    #[arg(long, value_name = "BOOL")]
    pub sound: Option<bool>,

    /// Keep the window above others
    #[arg(long, value_name = "BOOL")]
    pub always_on_top: Option<bool>,

    /// Color theme
    #[arg(long, value_enum)]
    pub theme: Option<ThemeArg>,
}

impl SetArgs {
    /// Converts the given options into a settings patch.
    #[must_use]
    pub fn to_patch(&self) -> SettingsPatch {
        SettingsPatch {
            interval_minutes: self.interval,
            mode: self.mode.map(Into::into),
            dnd: self.dnd,
            always_on_top: self.always_on_top,
            theme: self.theme.map(Into::into),
            autostart: None,
            sound_enabled: self.sound,
        }
    }
}

/// `--mode` values
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeArg {
    /// Ask before restarting
    Confirm,
    /// Restart after a 10 second countdown
    Auto,
}

impl From<ModeArg> for NotificationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Confirm => Self::Confirm,
            ModeArg::Auto => Self::Auto,
        }
    }
}

/// `--theme` values
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeArg {
    Light,
    Dark,
    System,
}

impl From<ThemeArg> for Theme {
    fn from(theme: ThemeArg) -> Self {
        match theme {
            ThemeArg::Light => Self::Light,
            ThemeArg::Dark => Self::Dark,
            ThemeArg::System => Self::System,
        }
    }
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Parses the interval, normalizing out-of-range or unparsable input.
fn parse_interval_arg(s: &str) -> Result<u32, String> {
    Ok(parse_interval_input(s))
}

// ============================================================================
// Tests
// ============================================================================
