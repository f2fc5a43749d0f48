//! Reader Device Channel
//!
//! This module defines the request/response interface every reader
//! connection provides. Exactly one request is outstanding at a time: the
//! caller sends a command, then blocks until the matching response arrives
//! or the timeout expires.
//!
//! Responses carry the sequence number of their request. Anything arriving
//! with a different number is left over from an earlier exchange and is
//! discarded, and callers clear the channel before starting a new command
//! sequence so such leftovers never pile up.

use std::time::Duration;

use crate::agent::protocol::{ReaderCommand, ReaderResponse};
use crate::error::DeviceResult;

/// How long to wait for the acknowledgment of a block write.
pub const ACK_TIMEOUT: Duration = Duration::from_millis(1000);

/// How long to wait for LF acquisition and demodulation steps.
pub const READ_TIMEOUT: Duration = Duration::from_millis(2500);

/// Common interface for reader connections
pub trait DeviceChannel {
    /// Human-readable name of the connection
    fn name(&self) -> &str;

    /// Discard responses still queued from earlier requests.
    ///
    /// Returns the number of messages dropped.
    fn clear(&mut self) -> DeviceResult<usize>;

    /// Send a command and return the sequence number assigned to it.
    fn send(&mut self, command: &ReaderCommand) -> DeviceResult<u32>;

    /// Block until the response to request `seq` arrives.
    ///
    /// Fails with `DeviceError::Timeout` if nothing matching arrives within
    /// `timeout`.
    fn wait_for_response(&mut self, seq: u32, timeout: Duration) -> DeviceResult<ReaderResponse>;

    /// Send a command and wait for its response. Reader-side errors come
    /// back as `DeviceError::Rejected`.
    fn transact(&mut self, command: &ReaderCommand, timeout: Duration) -> DeviceResult<ReaderResponse> {
        let seq = self.send(command)?;
        self.wait_for_response(seq, timeout)?.into_result(seq)
    }
}

impl<T: DeviceChannel + ?Sized> DeviceChannel for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn clear(&mut self) -> DeviceResult<usize> {
        (**self).clear()
    }

    fn send(&mut self, command: &ReaderCommand) -> DeviceResult<u32> {
        (**self).send(command)
    }

    fn wait_for_response(&mut self, seq: u32, timeout: Duration) -> DeviceResult<ReaderResponse> {
        (**self).wait_for_response(seq, timeout)
    }
}

/// Monotonic request numbering. Zero is never handed out.
#[derive(Debug, Clone, Default)]
pub struct SequenceCounter {
    last: u32,
}

impl SequenceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next sequence number, wrapping past `u32::MAX` back to 1.
    pub fn next_seq(&mut self) -> u32 {
        self.last = self.last.checked_add(1).unwrap_or(1);
        self.last
    }

    /// Most recently issued number, or 0 if none yet.
    pub fn last(&self) -> u32 {
        self.last
    }
}
