//! Reader agent protocol definitions
//!
//! JSON request/response protocol spoken between the host and the LF reader
//! (or a process bridging to it). Each message is one JSON object on its own
//! line, carrying a sequence number so a response can be matched to the
//! request that caused it.
//!
//! ```text
//! → {"seq":3,"cmd":"write_block","data":32832,"block":1}
//! ← {"seq":3,"status":"ack"}
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{DeviceError, DeviceResult};

/// Commands sent from the host to the reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum ReaderCommand {
    /// Program one 32-bit block of a T55x7 tag
    WriteBlock {
        /// Word to write
        data: u32,
        /// Block address
        block: u32,
    },

    /// Acquire an LF sample buffer from the antenna
    LfRead {
        /// Suppress the reader's own progress output
        #[serde(default)]
        silent: bool,
    },

    /// Transfer acquired samples to the host-side demodulation buffer
    GetSamples {
        /// Number of samples to transfer
        count: usize,
        /// Plot the samples after transfer
        #[serde(default)]
        graph: bool,
    },

    /// Run FSK demodulation for the Pyramid format on the sample buffer
    DemodPyramid,
}

impl ReaderCommand {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            ReaderCommand::WriteBlock { .. } => "write_block",
            ReaderCommand::LfRead { .. } => "lf_read",
            ReaderCommand::GetSamples { .. } => "get_samples",
            ReaderCommand::DemodPyramid => "demod_pyramid",
        }
    }
}

/// Responses sent from the reader to the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReaderResponse {
    /// Command completed
    Ack,

    /// Samples transferred
    Samples { count: usize },

    /// Demodulation result
    Demod {
        /// Demodulator return code (non-zero when a tag was found)
        code: i32,
        /// Human-readable demodulator output
        #[serde(default)]
        output: String,
    },

    /// Command failed on the reader
    Error {
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<i32>,
    },
}

impl ReaderResponse {
    /// Turn an `Error` response into a `DeviceError::Rejected`.
    pub fn into_result(self, seq: u32) -> DeviceResult<ReaderResponse> {
        match self {
            ReaderResponse::Error { message, .. } => Err(DeviceError::Rejected { seq, message }),
            other => Ok(other),
        }
    }
}

/// A command tagged with its sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub seq: u32,
    #[serde(flatten)]
    pub command: ReaderCommand,
}

/// A response tagged with the sequence number of its request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub seq: u32,
    #[serde(flatten)]
    pub response: ReaderResponse,
}

impl Request {
    pub fn to_line(&self) -> DeviceResult<String> {
        serde_json::to_string(self)
            .map_err(|e| DeviceError::Protocol(format!("Serialization error: {}", e)))
    }

    pub fn from_line(line: &str) -> DeviceResult<Self> {
        serde_json::from_str(line)
            .map_err(|e| DeviceError::Protocol(format!("Parse error: {} (request: {})", e, line)))
    }
}

impl Response {
    pub fn to_line(&self) -> DeviceResult<String> {
        serde_json::to_string(self)
            .map_err(|e| DeviceError::Protocol(format!("Serialization error: {}", e)))
    }

    pub fn from_line(line: &str) -> DeviceResult<Self> {
        serde_json::from_str(line)
            .map_err(|e| DeviceError::Protocol(format!("Parse error: {} (response: {})", e, line)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_block_wire_format() {
        let req = Request {
            seq: 3,
            command: ReaderCommand::WriteBlock {
                data: 0x0010_7080,
                block: 0,
            },
        };
        let line = req.to_line().unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["seq"], 3);
        assert_eq!(value["cmd"], "write_block");
        assert_eq!(value["data"], 0x0010_7080);
        assert_eq!(value["block"], 0);
        assert_eq!(Request::from_line(&line).unwrap(), req);
    }

    #[test]
    fn test_ack_wire_format() {
        let line = r#"{"seq":9,"status":"ack"}"#;
        let resp = Response::from_line(line).unwrap();
        assert_eq!(resp.seq, 9);
        assert_eq!(resp.response, ReaderResponse::Ack);
    }

    #[test]
    fn test_defaults_on_parse() {
        let req = Request::from_line(r#"{"seq":1,"cmd":"get_samples","count":30000}"#).unwrap();
        assert_eq!(
            req.command,
            ReaderCommand::GetSamples {
                count: 30000,
                graph: false
            }
        );
        let resp = Response::from_line(r#"{"seq":2,"status":"demod","code":0}"#).unwrap();
        assert_eq!(
            resp.response,
            ReaderResponse::Demod {
                code: 0,
                output: String::new()
            }
        );
    }

    #[test]
    fn test_error_into_result() {
        let err = ReaderResponse::Error {
            message: "bad block".into(),
            code: Some(400),
        }
        .into_result(4)
        .unwrap_err();
        assert!(matches!(err, DeviceError::Rejected { seq: 4, .. }));
        assert!(ReaderResponse::Ack.into_result(4).is_ok());
    }

    #[test]
    fn test_garbage_is_protocol_error() {
        assert!(matches!(
            Response::from_line("not json"),
            Err(DeviceError::Protocol(_))
        ));
    }
}
