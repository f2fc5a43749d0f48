//! Field emulation of a Pyramid credential.
//!
//! The reader-side FSK emulation path is not wired up for this tag type.
//! `simulate` still normalizes and encodes the credential, so argument and
//! encoding problems surface exactly as they would for `clone`, and then
//! reports the command as not implemented instead of pretending to run.

use crate::credential::Credential;
use crate::error::{PyramidError, PyramidResult};
use crate::frame::PyramidFrame;

/// Encode `credential` for emulation. Always ends in
/// [`PyramidError::NotImplemented`] once encoding succeeds.
pub fn simulate(credential: &Credential) -> PyramidResult<PyramidFrame> {
    let frame = PyramidFrame::encode(credential)?;
    tracing::debug!(%credential, %frame, "field emulation requested");
    Err(PyramidError::NotImplemented { command: "sim" })
}
