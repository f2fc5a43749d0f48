//! Simulated LF Reader
//!
//! An in-process reader with a [`T55xxTag`] in its field. It answers the
//! reader command set immediately and implements [`DeviceChannel`] so the
//! clone and read orchestrators can run against it without hardware.
//!
//! ## Fault Injection
//!
//! - [`SimulatedReader::drop_ack_for_block`]: writes to that block are
//!   ignored and never acknowledged, so the caller times out.
//! - [`SimulatedReader::queue_stale_ack`]: leaves an acknowledgment for an
//!   old request in the outbound queue, ahead of the next real response.

use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;

use pyramid_core::agent::protocol::{ReaderCommand, ReaderResponse, Request, Response};
use pyramid_core::device::{DeviceChannel, SequenceCounter};
use pyramid_core::error::{DeviceError, DeviceResult};

use crate::tag::T55xxTag;

/// Error code reported for requests the reader refuses.
const REJECT_CODE: i32 = 400;

/// One block write as seen by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteRecord {
    pub block: u32,
    pub data: u32,
    /// False when the write was dropped by fault injection or refused
    pub acked: bool,
}

/// Software model of an LF reader with a tag on the antenna.
#[derive(Debug, Default)]
pub struct SimulatedReader {
    tag: T55xxTag,
    seq: SequenceCounter,
    /// Most recent sequence number seen, issued locally or by a remote client
    last_seq: u32,
    /// Responses not yet collected, oldest first
    outbound: VecDeque<Response>,
    silent_blocks: BTreeSet<u32>,
    write_log: Vec<WriteRecord>,
    /// Samples held by the last acquisition
    acquired: Option<usize>,
}

impl SimulatedReader {
    /// A reader with a blank tag in its field.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tag(tag: T55xxTag) -> Self {
        Self {
            tag,
            ..Self::default()
        }
    }

    pub fn tag(&self) -> &T55xxTag {
        &self.tag
    }

    /// Ignore writes to `block` and never acknowledge them.
    pub fn drop_ack_for_block(&mut self, block: u32) {
        self.silent_blocks.insert(block);
    }

    /// Queue an acknowledgment carrying the sequence number of an earlier
    /// request.
    pub fn queue_stale_ack(&mut self) {
        self.outbound.push_back(Response {
            seq: self.last_seq,
            response: ReaderResponse::Ack,
        });
    }

    /// Every block write received, in order.
    pub fn write_log(&self) -> &[WriteRecord] {
        &self.write_log
    }

    /// Execute one command against the simulated hardware.
    ///
    /// Returns `None` when the reader stays silent.
    pub fn handle(&mut self, command: &ReaderCommand) -> Option<ReaderResponse> {
        match *command {
            ReaderCommand::WriteBlock { data, block } => self.write_block(block, data),
            ReaderCommand::LfRead { .. } => {
                self.acquired = Some(0);
                Some(ReaderResponse::Ack)
            }
            ReaderCommand::GetSamples { count, .. } => match self.acquired {
                Some(_) => {
                    self.acquired = Some(count);
                    Some(ReaderResponse::Samples { count })
                }
                None => Some(reject("no LF acquisition to transfer")),
            },
            ReaderCommand::DemodPyramid => Some(self.demod_pyramid()),
        }
    }

    /// Serve one request from a remote client.
    ///
    /// The response is queued behind anything already outbound and the
    /// whole queue is returned.
    pub fn exchange(&mut self, request: &Request) -> Vec<Response> {
        self.last_seq = request.seq;
        if let Some(response) = self.handle(&request.command) {
            self.outbound.push_back(Response {
                seq: request.seq,
                response,
            });
        }
        self.outbound.drain(..).collect()
    }

    fn write_block(&mut self, block: u32, data: u32) -> Option<ReaderResponse> {
        if self.silent_blocks.contains(&block) {
            tracing::debug!(block, "dropping write without acknowledgment");
            self.write_log.push(WriteRecord {
                block,
                data,
                acked: false,
            });
            return None;
        }

        let result = self.tag.write_block(block, data);
        self.write_log.push(WriteRecord {
            block,
            data,
            acked: result.is_ok(),
        });
        match result {
            Ok(()) => {
                tracing::debug!(block, data = format_args!("{:08x}", data), "block written");
                Some(ReaderResponse::Ack)
            }
            Err(message) => Some(reject(message)),
        }
    }

    fn demod_pyramid(&self) -> ReaderResponse {
        if self.acquired.is_none() || !self.tag.is_pyramid() {
            return ReaderResponse::Demod {
                code: 0,
                output: String::new(),
            };
        }

        let raw: String = self
            .tag
            .transmitted_words()
            .iter()
            .map(|w| format!("{:08x}", w))
            .collect();
        ReaderResponse::Demod {
            code: 1,
            output: format!("Pyramid tag found, raw: {}", raw),
        }
    }
}

fn reject(message: impl Into<String>) -> ReaderResponse {
    ReaderResponse::Error {
        message: message.into(),
        code: Some(REJECT_CODE),
    }
}

impl DeviceChannel for SimulatedReader {
    fn name(&self) -> &str {
        "simulator"
    }

    fn clear(&mut self) -> DeviceResult<usize> {
        let dropped = self.outbound.len();
        self.outbound.clear();
        Ok(dropped)
    }

    fn send(&mut self, command: &ReaderCommand) -> DeviceResult<u32> {
        let seq = self.seq.next_seq();
        self.last_seq = seq;
        if let Some(response) = self.handle(command) {
            self.outbound.push_back(Response { seq, response });
        }
        Ok(seq)
    }

    fn wait_for_response(&mut self, seq: u32, timeout: Duration) -> DeviceResult<ReaderResponse> {
        while let Some(response) = self.outbound.pop_front() {
            if response.seq == seq {
                return Ok(response.response);
            }
            tracing::debug!(expected = seq, got = response.seq, "discarding stale response");
        }
        Err(DeviceError::Timeout { seq, timeout })
    }
}
