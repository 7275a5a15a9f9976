//! Session options
//!
//! Timing parameters of a session are configuration rather than literals, so
//! that start and retry always share the same budget.

use garde::Validate;
use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::constants::session::{
    DEFAULT_DURATION, DEFAULT_WARNING_THRESHOLD, MAX_DURATION, MIN_DURATION,
};

type ValidationResult = garde::Result;

/// Validates that the countdown budget falls within the allowed bounds
fn validate_duration(val: &Duration) -> ValidationResult {
    if (MIN_DURATION..=MAX_DURATION).contains(&val.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "duration is outside of the bounds [{MIN_DURATION},{MAX_DURATION}]",
        )))
    }
}

/// Validates that the warning would fire before the countdown ends
fn validate_warning_threshold(val: &Duration, duration: &Duration) -> ValidationResult {
    if val < duration {
        Ok(())
    } else {
        Err(garde::Error::new(
            "warning_threshold must be shorter than duration",
        ))
    }
}

/// Options shared by every run of a session
#[serde_with::serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Options {
    /// Countdown budget for a whole session
    #[garde(custom(|v, _| validate_duration(v)))]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    duration: Duration,
    /// Remaining time at which the low-time warning is raised
    #[garde(custom(|v, _| validate_warning_threshold(v, &self.duration)))]
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    warning_threshold: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            duration: Duration::from_secs(DEFAULT_DURATION),
            warning_threshold: Duration::from_secs(DEFAULT_WARNING_THRESHOLD),
        }
    }
}

impl Options {
    /// Creates options from whole seconds
    pub fn new(duration: u64, warning_threshold: u64) -> Self {
        Self {
            duration: Duration::from_secs(duration),
            warning_threshold: Duration::from_secs(warning_threshold),
        }
    }

    /// Countdown budget in seconds
    pub fn duration(&self) -> u64 {
        self.duration.as_secs()
    }

    /// Warning threshold in seconds
    pub fn warning_threshold(&self) -> u64 {
        self.warning_threshold.as_secs()
    }
}
