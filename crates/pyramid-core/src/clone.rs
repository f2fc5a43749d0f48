//! Clone Orchestration
//!
//! Writes a [`BlockSet`] to a T55x7 tag, one block at a time, in ascending
//! address order:
//!
//! ```text
//! Idle ─► Writing(0) ─► Acked(0) ─► Writing(1) ─► … ─► Acked(4) ─► Done
//!             │                         │
//!             └──── no ack in 1000 ms ──┴──────────────────────► Aborted
//! ```
//!
//! Each write must be acknowledged before the next starts. The first
//! missing acknowledgment ends the whole sequence; nothing is retried and
//! blocks already written stay written.

use std::fmt;
use std::time::Duration;

use crate::agent::protocol::{ReaderCommand, ReaderResponse};
use crate::credential::Credential;
use crate::device::{DeviceChannel, ACK_TIMEOUT};
use crate::error::{DeviceError, PyramidError, PyramidResult};
use crate::frame::PyramidFrame;
use crate::t55xx::BlockSet;

/// Progress of a clone operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloneState {
    Idle,
    /// Write request for this block is outstanding
    Writing(u8),
    /// This block was acknowledged
    Acked(u8),
    /// Every block was acknowledged
    Done,
    /// Stopped at this block
    Aborted(u8),
}

impl CloneState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CloneState::Done | CloneState::Aborted(_))
    }
}

impl fmt::Display for CloneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloneState::Idle => write!(f, "idle"),
            CloneState::Writing(b) => write!(f, "writing block {}", b),
            CloneState::Acked(b) => write!(f, "block {} acknowledged", b),
            CloneState::Done => write!(f, "done"),
            CloneState::Aborted(b) => write!(f, "aborted at block {}", b),
        }
    }
}

/// Outcome of a successful clone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneReport {
    /// Words that were written
    pub blocks: BlockSet,
    /// Every state the orchestrator passed through, in order
    pub transitions: Vec<CloneState>,
}

/// Drives the block-by-block write sequence over a device channel.
pub struct CloneOrchestrator<'a, C: DeviceChannel + ?Sized> {
    channel: &'a mut C,
    ack_timeout: Duration,
    state: CloneState,
    transitions: Vec<CloneState>,
}

impl<'a, C: DeviceChannel + ?Sized> CloneOrchestrator<'a, C> {
    pub fn new(channel: &'a mut C) -> Self {
        Self {
            channel,
            ack_timeout: ACK_TIMEOUT,
            state: CloneState::Idle,
            transitions: vec![CloneState::Idle],
        }
    }

    /// Current state
    pub fn state(&self) -> CloneState {
        self.state
    }

    fn enter(&mut self, state: CloneState) {
        tracing::trace!(from = %self.state, to = %state, "clone state change");
        self.state = state;
        self.transitions.push(state);
    }

    /// Write every block of `blocks`, stopping at the first failure.
    pub fn run(mut self, blocks: &BlockSet) -> PyramidResult<CloneReport> {
        for (address, word) in blocks.iter() {
            if let Err(err) = self.write_block(address, word) {
                self.enter(CloneState::Aborted(address));
                tracing::warn!(block = address, error = %err, "clone aborted");
                return Err(err);
            }
        }

        self.enter(CloneState::Done);
        tracing::info!(
            device = self.channel.name(),
            blocks = blocks.as_words().len(),
            "clone complete"
        );
        Ok(CloneReport {
            blocks: *blocks,
            transitions: self.transitions,
        })
    }

    fn write_block(&mut self, address: u8, word: u32) -> PyramidResult<()> {
        self.channel.clear()?;
        self.enter(CloneState::Writing(address));

        let seq = self.channel.send(&ReaderCommand::WriteBlock {
            data: word,
            block: address as u32,
        })?;
        tracing::debug!(block = address, data = format_args!("{:08x}", word), seq, "write block");

        match self.channel.wait_for_response(seq, self.ack_timeout) {
            Ok(ReaderResponse::Ack) => {
                self.enter(CloneState::Acked(address));
                Ok(())
            }
            Ok(ReaderResponse::Error { message, .. }) => {
                Err(DeviceError::Rejected { seq, message }.into())
            }
            Ok(other) => Err(DeviceError::UnexpectedResponse {
                seq,
                response: format!("{:?}", other),
            }
            .into()),
            Err(DeviceError::Timeout { timeout, .. }) => Err(PyramidError::DeviceTimeout {
                block: address,
                timeout_ms: timeout.as_millis() as u64,
            }),
            Err(err) => Err(err.into()),
        }
    }
}

/// Encode `credential` and write it to the tag behind `channel`.
pub fn clone_credential<C: DeviceChannel + ?Sized>(
    channel: &mut C,
    credential: &Credential,
) -> PyramidResult<CloneReport> {
    let frame = PyramidFrame::encode(credential)?;
    let blocks = BlockSet::from_frame(&frame);
    CloneOrchestrator::new(channel).run(&blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeviceResult;
    use crate::t55xx::PYRAMID_CONFIG_WORD;
    use std::collections::VecDeque;

    /// Channel that acknowledges every write except those to `silent_block`.
    #[derive(Default)]
    struct ScriptedChannel {
        silent_block: Option<u32>,
        queued: VecDeque<(u32, ReaderResponse)>,
        writes: Vec<(u32, u32)>,
        clears: usize,
        next_seq: u32,
    }

    impl DeviceChannel for ScriptedChannel {
        fn name(&self) -> &str {
            "scripted"
        }

        fn clear(&mut self) -> DeviceResult<usize> {
            self.clears += 1;
            let n = self.queued.len();
            self.queued.clear();
            Ok(n)
        }

        fn send(&mut self, command: &ReaderCommand) -> DeviceResult<u32> {
            self.next_seq += 1;
            if let ReaderCommand::WriteBlock { data, block } = *command {
                self.writes.push((block, data));
                if self.silent_block != Some(block) {
                    self.queued.push_back((self.next_seq, ReaderResponse::Ack));
                }
            }
            Ok(self.next_seq)
        }

        fn wait_for_response(&mut self, seq: u32, timeout: Duration) -> DeviceResult<ReaderResponse> {
            while let Some((s, resp)) = self.queued.pop_front() {
                if s == seq {
                    return Ok(resp);
                }
            }
            Err(DeviceError::Timeout { seq, timeout })
        }
    }

    #[test]
    fn test_clone_writes_all_blocks_in_order() {
        let mut channel = ScriptedChannel::default();
        let report = clone_credential(&mut channel, &Credential::new(123, 11223)).unwrap();

        assert_eq!(
            channel.writes,
            vec![
                (0, PYRAMID_CONFIG_WORD),
                (1, 0x0000_8040),
                (2, 0x2010_0804),
                (3, 0x0201_f6ab),
                (4, 0xabe0_1005),
            ]
        );
        assert_eq!(channel.clears, 5, "channel is cleared before every write");
        assert_eq!(report.transitions.first(), Some(&CloneState::Idle));
        assert_eq!(report.transitions.last(), Some(&CloneState::Done));
        assert_eq!(report.transitions.len(), 1 + 5 * 2 + 1);
    }

    #[test]
    fn test_timeout_aborts_remaining_blocks() {
        let mut channel = ScriptedChannel {
            silent_block: Some(2),
            ..Default::default()
        };
        let err = clone_credential(&mut channel, &Credential::new(123, 11223)).unwrap_err();

        assert!(matches!(
            err,
            PyramidError::DeviceTimeout {
                block: 2,
                timeout_ms: 1000
            }
        ));
        assert_eq!(err.exit_code(), -1);
        let written: Vec<u32> = channel.writes.iter().map(|&(b, _)| b).collect();
        assert_eq!(written, vec![0, 1, 2], "blocks 3 and 4 must not be attempted");
    }

    #[test]
    fn test_state_sequence_on_abort() {
        let mut channel = ScriptedChannel {
            silent_block: Some(0),
            ..Default::default()
        };
        let frame = PyramidFrame::encode(&Credential::new(1, 1)).unwrap();
        let blocks = BlockSet::from_frame(&frame);
        let orchestrator = CloneOrchestrator::new(&mut channel);
        assert_eq!(orchestrator.state(), CloneState::Idle);
        assert!(orchestrator.run(&blocks).is_err());
        assert_eq!(channel.writes.len(), 1);
    }

    #[test]
    fn test_stale_ack_is_flushed_before_write() {
        let mut channel = ScriptedChannel::default();
        // Left over from an earlier exchange; must not satisfy block 0.
        channel.queued.push_back((1, ReaderResponse::Ack));
        channel.silent_block = Some(0);
        let err = clone_credential(&mut channel, &Credential::new(5, 5)).unwrap_err();
        assert!(matches!(err, PyramidError::DeviceTimeout { block: 0, .. }));
    }

    #[test]
    fn test_terminal_states() {
        assert!(CloneState::Done.is_terminal());
        assert!(CloneState::Aborted(3).is_terminal());
        assert!(!CloneState::Writing(3).is_terminal());
        assert_eq!(CloneState::Aborted(2).to_string(), "aborted at block 2");
    }
}
