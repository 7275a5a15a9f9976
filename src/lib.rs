//! # Trivia Session Library
//!
//! This library provides the core logic for a single-player, timed
//! multiple-choice trivia session. It tracks the active question, shuffles
//! answer presentation order, scores selections, records the answer history
//! and runs a cooperative countdown that completes the session when time is
//! up. Fetching questions and rendering them are left to the caller.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::doc_markdown)]
use serde::{Deserialize, Serialize};

pub mod config;
pub mod constants;
pub mod question;
pub mod session;
pub mod shuffle;
pub mod timer;
pub mod tunnel;

/// Messages sent to synchronize the presentation layer with the session
///
/// A sync message carries everything needed to render the session from
/// scratch.
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum SyncMessage {
    /// Snapshot of the whole session state
    Session(session::SessionState),
}

impl SyncMessage {
    /// Converts the sync message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Messages describing a single change in the session
///
/// Update messages are used to notify the presentation layer about events
/// such as countdown ticks, the low-time warning and completion.
#[derive(Debug, Serialize, Clone, derive_more::From)]
pub enum UpdateMessage {
    /// Session lifecycle updates
    Session(session::UpdateMessage),
    /// Countdown updates
    Countdown(timer::UpdateMessage),
}

impl UpdateMessage {
    /// Converts the update message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// Alarm messages for timed events
///
/// The driver delivers each alarm back to [`session::QuizSession::receive_alarm`]
/// once its delay has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::From, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// Countdown alarms
    Countdown(timer::AlarmMessage),
}
