//! Timer engine for the break reminder.
//!
//! This module provides the core timer functionality:
//! - Status transitions (Idle → Running → Expired, Paused, reset)
//! - Remaining time derived from a start instant, not from tick counts
//! - Discrete events for every status change

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::types::{
    minutes_to_duration, normalize_interval_minutes, Settings, TimerState, TimerStatus,
};

use super::clock::Clock;

// ============================================================================
// TimerEvent
// ============================================================================

/// Timer events for the dispatcher and status display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    /// The status changed
    StatusChanged {
        /// Status before the transition
        from: TimerStatus,
        /// Status after the transition
        to: TimerStatus,
    },
    /// A running tick recomputed the remaining time
    Tick {
        /// Remaining time after the tick
        remaining: Duration,
    },
    /// The cycle interval changed
    IntervalChanged {
        /// New interval
        interval: Duration,
    },
}

// ============================================================================
// TimerEngine
// ============================================================================

/// Timer engine that owns the reminder state machine.
///
/// Operations whose preconditions do not hold are ignored and return `false`.
pub struct TimerEngine {
    /// Current timer state
    state: TimerState,
    /// Time source
    clock: Arc<dyn Clock>,
    /// Read-only view of the settings; only the interval is read
    settings: watch::Receiver<Settings>,
    /// Event sender channel
    event_tx: mpsc::UnboundedSender<TimerEvent>,
}

impl TimerEngine {
    /// Creates an idle engine holding the currently configured interval.
    pub fn new(
        settings: watch::Receiver<Settings>,
        clock: Arc<dyn Clock>,
        event_tx: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        let interval = settings.borrow().interval();
        Self {
            state: TimerState::new(interval),
            clock,
            settings,
            event_tx,
        }
    }

    /// Starts a cycle from Idle or Paused with a freshly read interval.
    pub fn start(&mut self) -> bool {
        if !self.state.status.can_start() {
            debug!(status = %self.state.status, "start ignored");
            return false;
        }

        let interval = self.configured_interval();
        self.state.start_instant = Some(self.clock.now());
        self.state.interval = interval;
        self.state.remaining = interval;
        self.transition(TimerStatus::Running);
        true
    }

    /// Pauses a running cycle, keeping the remaining time.
    ///
    /// A cycle whose deadline already passed expires instead.
    pub fn pause(&mut self) -> bool {
        if !self.state.is_running() {
            debug!(status = %self.state.status, "pause ignored");
            return false;
        }
        if self.tick() {
            return false;
        }

        let remaining = self.state.remaining_at(self.clock.now());
        self.state.start_instant = None;
        self.state.remaining = remaining;
        self.transition(TimerStatus::Paused);
        true
    }

    /// Returns to Idle with a full, freshly read interval.
    pub fn reset(&mut self) -> bool {
        let interval = self.configured_interval();
        self.state.start_instant = None;
        self.state.interval = interval;
        self.state.remaining = interval;
        self.transition(TimerStatus::Idle);
        true
    }

    /// Resets and starts a new cycle.
    ///
    /// Listeners always observe the Idle transition before the Running one.
    pub fn reset_and_start(&mut self) -> bool {
        self.reset();
        self.start()
    }

    /// Changes the cycle interval.
    ///
    /// A running cycle restarts now with the new interval. Idle and paused
    /// timers hold the new full interval. An expired timer keeps zero
    /// remaining until it is reset.
    pub fn set_interval(&mut self, minutes: u32) -> bool {
        let interval = minutes_to_duration(normalize_interval_minutes(i64::from(minutes)));
        self.state.interval = interval;

        match self.state.status {
            TimerStatus::Running => {
                self.state.start_instant = Some(self.clock.now());
                self.state.remaining = interval;
            }
            TimerStatus::Idle | TimerStatus::Paused => {
                self.state.remaining = interval;
            }
            TimerStatus::Expired => {}
        }

        self.emit(TimerEvent::IntervalChanged { interval });
        true
    }

    /// Recomputes the remaining time of a running cycle.
    ///
    /// Returns true if this tick expired the cycle.
    pub fn tick(&mut self) -> bool {
        if !self.state.is_running() {
            return false;
        }

        let remaining = self
            .state
            .remaining_at(self.clock.now())
            .min(self.state.remaining);
        self.state.remaining = remaining;
        self.emit(TimerEvent::Tick { remaining });

        if remaining.is_zero() {
            self.state.start_instant = None;
            self.state.remaining = Duration::ZERO;
            self.transition(TimerStatus::Expired);
            return true;
        }

        false
    }

    /// Returns the live remaining time.
    pub fn remaining(&self) -> Duration {
        self.state.remaining_at(self.clock.now())
    }

    /// Returns the current status.
    pub fn status(&self) -> TimerStatus {
        self.state.status
    }

    /// Returns a reference to the current timer state.
    pub fn get_state(&self) -> &TimerState {
        &self.state
    }

    fn configured_interval(&self) -> Duration {
        self.settings.borrow().interval()
    }

    fn transition(&mut self, to: TimerStatus) {
        let from = self.state.status;
        self.state.status = to;
        if from != to {
            debug!(%from, %to, "timer status changed");
            self.emit(TimerEvent::StatusChanged { from, to });
        }
    }

    fn emit(&self, event: TimerEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("timer event receiver dropped");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
