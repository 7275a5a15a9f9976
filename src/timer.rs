//! Cooperative countdown
//!
//! The countdown never owns a thread or a clock. When running, it asks the
//! driver to deliver a tick alarm one interval later through the same
//! `schedule_message` function the rest of the crate uses, and it acts on the
//! alarm once the driver hands it back. Each alarm carries the generation of
//! the run that scheduled it; cancelling or restarting bumps the generation,
//! so alarms from a previous run are dropped before any callback fires.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use web_time::Duration;

use crate::constants::countdown::TICK_INTERVAL;

/// Lifecycle of a countdown
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
pub enum TimerState {
    /// Never started
    #[default]
    Idle,
    /// Ticking
    Running,
    /// Stopped before reaching zero
    Cancelled,
    /// Reached zero
    Expired,
}

/// Errors raised when the countdown is misused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The operation is not allowed in the current state
    #[error("countdown cannot start while {0}")]
    InvalidState(TimerState),
    /// A countdown needs at least one second to run
    #[error("countdown duration must be at least one second")]
    ZeroDuration,
}

/// Alarms scheduled by the countdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// One tick interval has elapsed for the run with this generation
    Tick {
        /// Generation of the run that scheduled the alarm
        generation: u64,
    },
}

/// Countdown events surfaced to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdateMessage {
    /// A second has passed
    Tick {
        /// Seconds left on the clock
        remaining: u64,
    },
    /// Remaining time reached the warning threshold
    Warning {
        /// Seconds left on the clock
        remaining: u64,
    },
    /// The clock reached zero
    Expired,
}

/// Receiver for countdown callbacks
pub trait CountdownListener {
    /// Called on every tick with the seconds left
    fn on_tick(&mut self, remaining: u64);

    /// Called once, on the first tick at or below the warning threshold
    fn on_warning(&mut self, remaining: u64);

    /// Called once, when the clock reaches zero
    fn on_expire(&mut self);
}

/// A single cooperative countdown clock
#[derive(Debug, Clone, Serialize)]
pub struct CountdownTimer {
    state: TimerState,
    remaining: u64,
    warning_threshold: u64,
    warning_raised: bool,
    generation: u64,
}

impl CountdownTimer {
    /// Creates an idle countdown that warns at `warning_threshold` seconds left
    pub fn new(warning_threshold: u64) -> Self {
        Self {
            state: TimerState::Idle,
            remaining: 0,
            warning_threshold,
            warning_raised: false,
            generation: 0,
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Seconds left on the clock
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Whether the low-time warning has fired during the current run
    pub fn warning_raised(&self) -> bool {
        self.warning_raised
    }

    /// Starts a new run and schedules its first tick
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidState`] if the countdown is already running
    /// and [`Error::ZeroDuration`] if `initial_seconds` is zero.
    pub fn start<S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        initial_seconds: u64,
        mut schedule_message: S,
    ) -> Result<(), Error> {
        if self.state == TimerState::Running {
            return Err(Error::InvalidState(self.state));
        }
        if initial_seconds == 0 {
            return Err(Error::ZeroDuration);
        }

        self.generation = self.generation.wrapping_add(1);
        self.state = TimerState::Running;
        self.remaining = initial_seconds;
        self.warning_raised = false;

        debug!(generation = self.generation, initial_seconds, "countdown started");

        self.schedule_tick(&mut schedule_message);

        Ok(())
    }

    /// Stops the current run
    ///
    /// Any tick already scheduled is invalidated, so no callback fires after
    /// this returns. Cancelling a countdown that is not running does nothing.
    ///
    /// # Returns
    ///
    /// `true` if a running countdown was stopped
    pub fn cancel(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }

        self.state = TimerState::Cancelled;
        self.generation = self.generation.wrapping_add(1);

        debug!(remaining = self.remaining, "countdown cancelled");

        true
    }

    /// Handles a tick alarm delivered by the driver
    ///
    /// # Returns
    ///
    /// `true` if the alarm belonged to the current run and callbacks were
    /// delivered, `false` if it was stale and ignored
    pub fn receive_alarm<S: FnMut(crate::AlarmMessage, Duration), L: CountdownListener>(
        &mut self,
        message: &AlarmMessage,
        mut schedule_message: S,
        listener: &mut L,
    ) -> bool {
        let AlarmMessage::Tick { generation } = *message;

        if self.state != TimerState::Running || generation != self.generation {
            debug!(generation, current = self.generation, "stale tick ignored");
            return false;
        }

        self.remaining = self.remaining.saturating_sub(1);
        listener.on_tick(self.remaining);

        if !self.warning_raised && self.remaining <= self.warning_threshold {
            self.warning_raised = true;
            listener.on_warning(self.remaining);
        }

        if self.remaining == 0 {
            self.state = TimerState::Expired;
            listener.on_expire();
        } else {
            self.schedule_tick(&mut schedule_message);
        }

        true
    }

    fn schedule_tick<S: FnMut(crate::AlarmMessage, Duration)>(&self, schedule_message: &mut S) {
        schedule_message(
            AlarmMessage::Tick {
                generation: self.generation,
            }
            .into(),
            TICK_INTERVAL,
        );
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new(crate::constants::session::DEFAULT_WARNING_THRESHOLD)
    }
}

/// Renders seconds as a `m:ss` clock
pub fn format_clock(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
