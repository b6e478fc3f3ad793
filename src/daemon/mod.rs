//! Daemon module for the break reminder.
//!
//! This module contains the core daemon functionality:
//! - `clock`: Time sources (system and manual)
//! - `timer`: Timer engine with state transitions and countdown logic
//! - `runner`: Foreground loop wiring the engine to notifications and input

pub mod clock;
pub mod runner;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use runner::{CommandParseError, CommandReply, DaemonCommand, Runner, StatusReport};
pub use timer::{TimerEngine, TimerEvent};
