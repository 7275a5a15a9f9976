//! Presentation layer channel
//!
//! This module defines the trait through which the session controller pushes
//! events and state snapshots to whatever renders the quiz. The tunnel
//! abstraction keeps the controller free of any UI toolkit.

use super::{SyncMessage, UpdateMessage};

/// Trait for sending messages to the presentation layer
pub trait Tunnel {
    /// Sends an update message
    ///
    /// Update messages describe a single change, such as a countdown tick
    /// or the session completing.
    ///
    /// # Arguments
    ///
    /// * `message` - The update message to send
    fn send_message(&self, message: &UpdateMessage);

    /// Sends a full state snapshot
    ///
    /// A snapshot is sent after every successful mutating call so the
    /// presentation layer can re-render from scratch.
    ///
    /// # Arguments
    ///
    /// * `state` - The synchronization message to send
    fn send_state(&self, state: &SyncMessage);
}
