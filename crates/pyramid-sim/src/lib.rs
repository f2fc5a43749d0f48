//! # Simulated Pyramid Hardware
//!
//! A software stand-in for the LF reader and the T55x7 tag it programs,
//! for testing and for running the `pyramid` CLI without hardware.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │               SimulatedReader                 │
//! │                                               │
//! │  send() ──► handle() ──► T55xxTag (8 blocks)  │
//! │                │                              │
//! │                ▼                              │
//! │          outbound queue ──► wait_for_response │
//! └───────────────────────────────────────────────┘
//!          ▲
//!          │ exchange()
//! ReaderAgent (TCP, newline JSON) ◄── AgentClient
//! ```

pub mod agent;
pub mod reader;
pub mod tag;

pub use agent::ReaderAgent;
pub use reader::{SimulatedReader, WriteRecord};
pub use tag::T55xxTag;
