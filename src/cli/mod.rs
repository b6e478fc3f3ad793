//! CLI module for the break reminder.
//!
//! This module provides the command-line interface:
//! - `commands`: Command definitions using clap derive
//! - `display`: Output formatting and display logic

pub mod commands;
pub mod display;

pub use commands::{
    AutostartCommand, Cli, Commands, ModeArg, RunArgs, SetArgs, SettingsCommand, ThemeArg,
};
pub use display::Display;
