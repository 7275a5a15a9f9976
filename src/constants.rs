//! Configuration constants for the trivia session
//!
//! This module contains the limits and defaults used throughout the
//! crate to keep question data and session options within sane bounds.

/// Session lifecycle constants
pub mod session {
    /// Default countdown budget in seconds, used by both start and retry
    pub const DEFAULT_DURATION: u64 = 600;
    /// Minimum countdown budget in seconds
    pub const MIN_DURATION: u64 = 5;
    /// Maximum countdown budget in seconds
    pub const MAX_DURATION: u64 = 3600;
    /// Default remaining time in seconds at which the low-time warning is raised
    pub const DEFAULT_WARNING_THRESHOLD: u64 = 60;
    /// Fraction of correct answers needed for a session to count as passed
    pub const PASS_RATIO: f64 = 0.5;
}

/// Question data constants
pub mod question {
    /// Maximum number of questions accepted for a single session
    pub const MAX_QUESTION_COUNT: usize = 100;
    /// Maximum length of a question text in characters
    pub const MAX_TEXT_LENGTH: usize = 500;
    /// Maximum length of an answer in characters
    pub const MAX_ANSWER_LENGTH: usize = 200;
    /// Maximum number of incorrect answers attached to a question
    pub const MAX_INCORRECT_ANSWER_COUNT: usize = 7;
}

/// Countdown constants
pub mod countdown {
    /// Interval between two consecutive ticks
    pub const TICK_INTERVAL: web_time::Duration = web_time::Duration::from_secs(1);
}
