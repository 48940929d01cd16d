// src/exec/peer.rs

//! Pluggable participant abstraction.
//!
//! The relay loop talks to a `Peer` instead of a concrete child process.
//! Production code uses [`ManagedProcess`](super::ManagedProcess); tests can
//! plug in a scripted fake that never spawns anything, which keeps the state
//! machine deterministic.

use std::future::Future;
use std::pin::Pin;

use crate::types::{Side, StreamKind};

/// One end of an interactive session.
///
/// Every method except [`write`](Peer::write) must return without waiting on
/// the participant.
pub trait Peer: Send {
    /// Which participant this is; used for logging and styling.
    fn side(&self) -> Side;

    /// Poll liveness, caching the exit code once the participant has exited.
    fn is_running(&mut self) -> bool;

    /// Exit code cached by the last [`is_running`](Peer::is_running) call,
    /// `None` while still running (or never polled).
    fn exit_code(&self) -> Option<i32>;

    /// Pop the oldest pending line from `stream`, if any.
    fn get_line(&mut self, stream: StreamKind) -> Option<String>;

    /// True while `stream` may still produce lines.
    fn stream_open(&self, stream: StreamKind) -> bool;

    fn any_stream_pump_alive(&self) -> bool {
        StreamKind::ALL.iter().any(|&s| self.stream_open(s))
    }

    /// Send `text` to the participant's input.
    ///
    /// Writing to a participant that already exited is not an error; the
    /// text is dropped.
    fn write<'a>(&'a mut self, text: &'a str) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

    /// Request termination. Idempotent and non-blocking.
    fn terminate(&mut self);
}
