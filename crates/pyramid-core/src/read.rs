//! Tag read path.
//!
//! Reading is delegated end to end: the reader acquires LF samples, hands
//! them to the demodulator for the Pyramid format, and whatever the
//! demodulator reports is passed straight back to the caller.

use crate::agent::protocol::{ReaderCommand, ReaderResponse};
use crate::device::{DeviceChannel, READ_TIMEOUT};
use crate::error::{DeviceError, DeviceResult, PyramidResult};

/// Samples acquired per read when not configured otherwise.
pub const DEFAULT_SAMPLE_COUNT: usize = 30_000;

/// Result reported by the demodulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOutcome {
    /// Demodulator return code, used as the command's exit code
    pub code: i32,
    /// Demodulator output, printed verbatim
    pub output: String,
    /// Samples transferred before demodulation
    pub samples: usize,
}

/// Acquire samples silently, then run Pyramid demodulation on them.
pub fn read_tag<C: DeviceChannel + ?Sized>(
    channel: &mut C,
    sample_count: usize,
) -> PyramidResult<ReadOutcome> {
    channel.clear()?;

    match request(channel, &ReaderCommand::LfRead { silent: true })? {
        (_, ReaderResponse::Ack) => {}
        (seq, other) => return Err(unexpected(channel, seq, other).into()),
    }

    let get_samples = ReaderCommand::GetSamples {
        count: sample_count,
        graph: false,
    };
    let samples = match request(channel, &get_samples)? {
        (_, ReaderResponse::Samples { count }) => count,
        (_, ReaderResponse::Ack) => sample_count,
        (seq, other) => return Err(unexpected(channel, seq, other).into()),
    };
    tracing::debug!(samples, "samples transferred");

    match request(channel, &ReaderCommand::DemodPyramid)? {
        (_, ReaderResponse::Demod { code, output }) => {
            tracing::info!(code, "pyramid demodulation finished");
            Ok(ReadOutcome {
                code,
                output,
                samples,
            })
        }
        (seq, other) => Err(unexpected(channel, seq, other).into()),
    }
}

fn request<C: DeviceChannel + ?Sized>(
    channel: &mut C,
    command: &ReaderCommand,
) -> DeviceResult<(u32, ReaderResponse)> {
    let seq = channel.send(command)?;
    let response = channel.wait_for_response(seq, READ_TIMEOUT)?.into_result(seq)?;
    Ok((seq, response))
}

fn unexpected<C: DeviceChannel + ?Sized>(
    channel: &C,
    seq: u32,
    response: ReaderResponse,
) -> DeviceError {
    tracing::warn!(device = channel.name(), seq, ?response, "unexpected response during read");
    DeviceError::UnexpectedResponse {
        seq,
        response: format!("{:?}", response),
    }
}
