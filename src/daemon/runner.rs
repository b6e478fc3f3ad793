//! Foreground runner for the break reminder.
//!
//! The runner owns the engine, the dispatcher and the popup controller and
//! drives them from one `tokio::select!` loop:
//!
//! ```text
//!   engine tick (1s) ──▶ TimerEngine::tick ──▶ events ──▶ NotificationDispatcher
//!                                                              │ Delivered
//!                                                              ▼
//!   countdown tick (1s, auto mode only) ──────────────▶ PopupController
//!   stdin commands ──▶ handle_command ──▶ engine / popup / settings
//! ```
//!
//! Settings written by another process are reloaded before a command changes
//! settings, on `status`, and when the timer expires.
//!
//! Nothing here is shared across threads, so no locks guard the timer state.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::time::{self, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cli::Display;
use crate::notification::{DispatchOutcome, NotificationDispatcher};
use crate::popup::{
    apply_resolution, CountdownTick, PopupController, PopupResolution, PopupSurface,
};
use crate::settings::SettingsStore;
use crate::types::{
    parse_interval_input, NotificationMode, Settings, SettingsPatch, TimerStatus, TICK_PERIOD,
};

use super::clock::Clock;
use super::timer::{TimerEngine, TimerEvent};

// ============================================================================
// DaemonCommand
// ============================================================================

/// Commands accepted on stdin while the reminder runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonCommand {
    /// Start, or restart the cycle if the timer expired
    Start,
    Pause,
    Reset,
    /// Change the interval (minutes, already normalized)
    Interval(u32),
    /// Turn do-not-disturb on or off
    Dnd(bool),
    /// Change how the next popup resolves
    Mode(NotificationMode),
    /// Turn the expiry sound on or off
    Sound(bool),
    Status,
    /// Popup: take the break
    Ok,
    /// Popup: take the break and start the next cycle
    Restart,
    /// Popup: close without restarting
    Close,
    Quit,
}

/// Errors from parsing a command line.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("コマンドが空です")]
    Empty,

    #[error("不明なコマンド: {0}")]
    Unknown(String),

    #[error("{0} には引数が必要です")]
    MissingArgument(&'static str),

    #[error("{command} の値が不正です: {value}")]
    InvalidArgument {
        command: &'static str,
        value: String,
    },
}

fn parse_switch(command: &'static str, word: Option<&str>) -> Result<bool, CommandParseError> {
    let word = word.ok_or(CommandParseError::MissingArgument(command))?;
    match word.to_ascii_lowercase().as_str() {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(CommandParseError::InvalidArgument {
            command,
            value: word.to_string(),
        }),
    }
}

fn parse_mode(word: Option<&str>) -> Result<NotificationMode, CommandParseError> {
    let word = word.ok_or(CommandParseError::MissingArgument("mode"))?;
    match word.to_ascii_lowercase().as_str() {
        "confirm" => Ok(NotificationMode::Confirm),
        "auto" => Ok(NotificationMode::Auto),
        _ => Err(CommandParseError::InvalidArgument {
            command: "mode",
            value: word.to_string(),
        }),
    }
}

impl FromStr for DaemonCommand {
    type Err = CommandParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(CommandParseError::Empty);
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "start" | "s" => Self::Start,
            "pause" | "p" => Self::Pause,
            "reset" => Self::Reset,
            "interval" | "i" => {
                let raw = words
                    .next()
                    .ok_or(CommandParseError::MissingArgument("interval"))?;
                Self::Interval(parse_interval_input(raw))
            }
            "dnd" => Self::Dnd(parse_switch("dnd", words.next())?),
            "mode" => Self::Mode(parse_mode(words.next())?),
            "sound" => Self::Sound(parse_switch("sound", words.next())?),
            "status" | "st" => Self::Status,
            "ok" => Self::Ok,
            "restart" | "r" => Self::Restart,
            "close" | "c" => Self::Close,
            "quit" | "q" | "exit" => Self::Quit,
            other => return Err(CommandParseError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

// ============================================================================
// CommandReply
// ============================================================================

/// Snapshot shown by the `status` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: TimerStatus,
    pub remaining: Duration,
    pub interval_minutes: u32,
    pub mode: NotificationMode,
    pub dnd: bool,
    pub popup_open: bool,
}

/// Result of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandReply {
    Started,
    /// The expired cycle was reset and a new one started
    Restarted,
    Paused,
    Reset,
    IntervalSet(u32),
    DndSet(bool),
    ModeSet(NotificationMode),
    SoundSet(bool),
    Status(StatusReport),
    Resolved(PopupResolution),
    /// The command does not apply in the current state
    Rejected(DaemonCommand),
    Quit,
}

impl fmt::Display for CommandReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => write!(f, "* タイマーを開始しました"),
            Self::Restarted => write!(f, "* 新しいサイクルを開始しました"),
            Self::Paused => write!(f, "|| タイマーを一時停止しました"),
            Self::Reset => write!(f, "[] タイマーをリセットしました"),
            Self::IntervalSet(minutes) => write!(f, "* 間隔を {} 分に設定しました", minutes),
            Self::DndSet(true) => write!(f, "* おやすみモードをオンにしました"),
            Self::DndSet(false) => write!(f, "* おやすみモードをオフにしました"),
            Self::ModeSet(mode) => write!(f, "* モードを {} に設定しました", mode.as_str()),
            Self::SoundSet(true) => write!(f, "* 通知音をオンにしました"),
            Self::SoundSet(false) => write!(f, "* 通知音をオフにしました"),
            Self::Status(report) => write!(f, "{}", Display::format_status(report)),
            Self::Resolved(PopupResolution::Pause) => write!(f, "|| 休憩中です"),
            Self::Resolved(PopupResolution::RestartCycle) => {
                write!(f, "* 新しいサイクルを開始しました")
            }
            Self::Rejected(command) => {
                write!(f, "現在の状態では {:?} を実行できません", command)
            }
            Self::Quit => write!(f, "終了します"),
        }
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Owner of the reminder's live state.
pub struct Runner {
    engine: TimerEngine,
    events: mpsc::UnboundedReceiver<TimerEvent>,
    dispatcher: NotificationDispatcher,
    popup: PopupController,
    surface: Arc<dyn PopupSurface>,
    store: SettingsStore,
}

impl Runner {
    /// Creates a runner with an idle engine.
    ///
    /// `surface` must be the popup surface `dispatcher` shows.
    pub fn new(
        store: SettingsStore,
        clock: Arc<dyn Clock>,
        dispatcher: NotificationDispatcher,
        surface: Arc<dyn PopupSurface>,
    ) -> Self {
        let (event_tx, events) = mpsc::unbounded_channel();
        let engine = TimerEngine::new(store.subscribe(), clock, event_tx);
        Self {
            engine,
            events,
            dispatcher,
            popup: PopupController::new(),
            surface,
            store,
        }
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn popup(&self) -> &PopupController {
        &self.popup
    }

    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// Applies one command and returns what happened.
    pub fn handle_command(&mut self, command: DaemonCommand) -> CommandReply {
        let reply = match command {
            DaemonCommand::Start if self.engine.status() == TimerStatus::Expired => {
                self.engine.reset_and_start();
                CommandReply::Restarted
            }
            DaemonCommand::Start => {
                if self.engine.start() {
                    CommandReply::Started
                } else {
                    CommandReply::Rejected(command)
                }
            }
            DaemonCommand::Pause => {
                if self.engine.pause() {
                    CommandReply::Paused
                } else {
                    CommandReply::Rejected(command)
                }
            }
            DaemonCommand::Reset => {
                self.engine.reset();
                CommandReply::Reset
            }
            DaemonCommand::Interval(minutes) => {
                let settings = self.update_settings(&SettingsPatch::interval(minutes));
                self.engine.set_interval(settings.interval_minutes);
                CommandReply::IntervalSet(settings.interval_minutes)
            }
            DaemonCommand::Dnd(enabled) => {
                let settings = self.update_settings(&SettingsPatch::dnd(enabled));
                CommandReply::DndSet(settings.dnd)
            }
            DaemonCommand::Mode(mode) => {
                let settings = self.update_settings(&SettingsPatch {
                    mode: Some(mode),
                    ..SettingsPatch::default()
                });
                CommandReply::ModeSet(settings.mode)
            }
            DaemonCommand::Sound(enabled) => {
                let settings = self.update_settings(&SettingsPatch {
                    sound_enabled: Some(enabled),
                    ..SettingsPatch::default()
                });
                CommandReply::SoundSet(settings.sound_enabled)
            }
            DaemonCommand::Status => {
                self.store.reload();
                CommandReply::Status(self.status_report())
            }
            DaemonCommand::Ok => self.resolve(command, PopupController::acknowledge),
            DaemonCommand::Restart => {
                self.resolve(command, PopupController::acknowledge_and_restart)
            }
            DaemonCommand::Close => self.resolve(command, PopupController::close),
            DaemonCommand::Quit => CommandReply::Quit,
        };

        self.drain_events();
        reply
    }

    /// Drives one engine tick.
    ///
    /// On expiry the stored settings are reloaded first, so do-not-disturb
    /// set from another shell is honored.
    pub fn on_engine_tick(&mut self) {
        if self.engine.tick() {
            self.store.reload();
        }
        self.drain_events();
    }

    /// Drives one auto-mode countdown tick.
    pub fn on_countdown_tick(&mut self) {
        match self.popup.on_tick() {
            CountdownTick::Inactive => {}
            CountdownTick::Remaining(left) => {
                if let Err(e) = self.surface.update_countdown(left) {
                    warn!("{} ({})", e, e.suggestion());
                }
            }
            CountdownTick::Elapsed(resolution) => {
                apply_resolution(resolution, &mut self.engine, self.surface.as_ref());
            }
        }
        self.drain_events();
    }

    /// Current state for the `status` command.
    pub fn status_report(&self) -> StatusReport {
        let settings = self.store.snapshot();
        StatusReport {
            status: self.engine.status(),
            remaining: self.engine.remaining(),
            interval_minutes: settings.interval_minutes,
            mode: settings.mode,
            dnd: settings.dnd,
            popup_open: self.popup.is_open(),
        }
    }

    /// Runs until `quit`, end of a closed loop, or Ctrl-C.
    ///
    /// End of input is not a reason to stop: under a login agent stdin is
    /// `/dev/null` and the reminder keeps running.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the input fails.
    pub async fn run<R>(mut self, input: R) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        let mut input_open = true;

        let mut engine_tick = time::interval(TICK_PERIOD);
        engine_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut countdown: Option<Interval> = None;

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        info!(status = %self.engine.status(), "reminder running");

        loop {
            self.sync_countdown(&mut countdown);

            tokio::select! {
                _ = engine_tick.tick() => self.on_engine_tick(),
                _ = next_countdown_tick(&mut countdown) => self.on_countdown_tick(),
                line = lines.next_line(), if input_open => match line? {
                    Some(line) => {
                        if self.handle_line(&line) == CommandReply::Quit {
                            break;
                        }
                    }
                    None => {
                        debug!("input closed, continuing without commands");
                        input_open = false;
                    }
                },
                _ = &mut ctrl_c => {
                    info!("interrupted");
                    break;
                }
            }
        }

        info!("reminder stopped");
        Ok(())
    }

    /// Parses and applies one input line, printing the reply.
    fn handle_line(&mut self, line: &str) -> CommandReply {
        match line.parse::<DaemonCommand>() {
            Ok(command) => {
                let reply = self.handle_command(command);
                println!("{}", reply);
                reply
            }
            Err(CommandParseError::Empty) => CommandReply::Status(self.status_report()),
            Err(e) => {
                Display::show_error(&e.to_string());
                Display::show_command_help();
                CommandReply::Rejected(DaemonCommand::Status)
            }
        }
    }

    /// Creates or drops the countdown interval to match the popup.
    ///
    /// Dropping the interval is what cancels the countdown.
    fn sync_countdown(&self, countdown: &mut Option<Interval>) {
        match (self.popup.is_counting_down(), countdown.is_some()) {
            (true, false) => {
                let mut interval =
                    time::interval_at(time::Instant::now() + TICK_PERIOD, TICK_PERIOD);
                interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
                *countdown = Some(interval);
                debug!("auto restart countdown started");
            }
            (false, true) => {
                *countdown = None;
                debug!("auto restart countdown cancelled");
            }
            _ => {}
        }
    }

    /// Applies `patch` on top of the latest stored settings.
    fn update_settings(&self, patch: &SettingsPatch) -> Settings {
        self.store.reload();
        self.store.update(patch)
    }

    fn resolve(
        &mut self,
        command: DaemonCommand,
        choose: fn(&mut PopupController) -> Option<PopupResolution>,
    ) -> CommandReply {
        match choose(&mut self.popup) {
            Some(resolution) => {
                apply_resolution(resolution, &mut self.engine, self.surface.as_ref());
                CommandReply::Resolved(resolution)
            }
            None => CommandReply::Rejected(command),
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            self.process_event(&event);
        }
    }

    fn process_event(&mut self, event: &TimerEvent) {
        if let DispatchOutcome::Delivered { mode } = self.dispatcher.handle(event) {
            self.popup.open(mode);
        }

        if let TimerEvent::StatusChanged {
            from: TimerStatus::Expired,
            ..
        } = event
        {
            if self.popup.dismiss() {
                debug!("timer left expired state, closing popup");
                if let Err(e) = self.surface.close_expiry_popup() {
                    warn!("{} ({})", e, e.suggestion());
                }
            }
        }
    }
}

async fn next_countdown_tick(countdown: &mut Option<Interval>) {
    match countdown {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

// ============================================================================
// Tests
// ============================================================================
