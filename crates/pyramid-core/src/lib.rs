//! # Farpointe/Pyramid Core Library
//!
//! This crate encodes Farpointe Data "Pyramid" 125 kHz proximity credentials
//! and writes them to T55x7-compatible writable tags through an LF reader.
//!
//! ## Overview
//!
//! A credential is a facility code and a card number. It becomes a 26-bit
//! Wiegand word, which is spread with parity into a 128-bit Pyramid frame
//! and sealed with a CRC-8. The frame fills four 32-bit tag blocks behind a
//! configuration block selecting FSK2a modulation at RF/50.
//!
//! - **Codec**: Wiegand 26, parity insertion, CRC-8/MAXIM, frame assembly
//! - **Tag layout**: T55x7 configuration word and block set
//! - **Device**: request/response channel to the reader, TCP agent client
//! - **Orchestration**: clone (write with per-block acknowledgment), read
//!
//! ## Signal Flow
//!
//! ```text
//! clone: (fc, cn) → Wiegand26 → add parity (8+1 odd) → frame[8..120]
//!                 → CRC-8 over bytes 2..14 → frame[120..128]
//!                 → blocks 1..4, config → block 0 → write + ack, one by one
//! read:  clear → LF acquire → fetch samples → demodulate → (code, text)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use pyramid_core::{BlockSet, Credential, PyramidFrame};
//!
//! let credential = Credential::new(123, 11223);
//! let frame = PyramidFrame::encode(&credential).unwrap();
//! let blocks = BlockSet::from_frame(&frame);
//!
//! assert_eq!(
//!     blocks.as_words(),
//!     &[0x0010_7080, 0x0000_8040, 0x2010_0804, 0x0201_f6ab, 0xabe0_1005]
//! );
//! ```

pub mod agent;
pub mod bits;
pub mod clone;
pub mod config;
pub mod credential;
pub mod crc;
pub mod device;
pub mod error;
pub mod frame;
pub mod logging;
pub mod parity;
pub mod read;
pub mod sim;
pub mod t55xx;
pub mod wiegand;

pub use agent::{AgentClient, ReaderCommand, ReaderResponse};
pub use clone::{clone_credential, CloneOrchestrator, CloneReport, CloneState};
pub use config::{ConfigError, DeviceDriver, PyramidConfig};
pub use credential::Credential;
pub use crc::{Crc8Maxim, CrcComputer};
pub use device::{DeviceChannel, ACK_TIMEOUT, READ_TIMEOUT};
pub use error::{DeviceError, DeviceResult, PyramidError, PyramidResult};
pub use frame::PyramidFrame;
pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
pub use read::{read_tag, ReadOutcome};
pub use sim::simulate;
pub use t55xx::{BlockSet, T55xxConfig, PYRAMID_CONFIG_WORD};
pub use wiegand::Wiegand26;
