//! Reader Agent
//!
//! The LF reader is driven through a small agent process that owns the
//! hardware link and accepts commands over TCP.
//!
//! ## Architecture
//!
//! ```text
//! pyramid (CLI) ──TCP:6125──> Agent ──USB──> LF reader ──125 kHz──> T55x7 tag
//! ```
//!
//! ## Protocol
//!
//! JSON-based commands over TCP with newline delimiters, see [`protocol`].

pub mod client;
pub mod protocol;

pub use client::AgentClient;
pub use protocol::{ReaderCommand, ReaderResponse, Request, Response};

/// Default agent control port
pub const DEFAULT_AGENT_PORT: u16 = 6125;
