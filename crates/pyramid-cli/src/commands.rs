//! Command implementations
//!
//! Each command opens its own reader channel and drops it when done.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};

use pyramid_core::agent::AgentClient;
use pyramid_core::clone::CloneOrchestrator;
use pyramid_core::config::{DeviceDriver, PyramidConfig};
use pyramid_core::credential::Credential;
use pyramid_core::device::DeviceChannel;
use pyramid_core::error::{DeviceError, PyramidError};
use pyramid_core::frame::PyramidFrame;
use pyramid_core::read::read_tag;
use pyramid_core::sim::simulate;
use pyramid_core::t55xx::BlockSet;
use pyramid_sim::SimulatedReader;

/// Map a command failure to the process exit code.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    if let Some(e) = err.downcast_ref::<PyramidError>() {
        e.exit_code()
    } else if err.downcast_ref::<DeviceError>().is_some() {
        -2
    } else {
        1
    }
}

/// Open the reader channel named by the configuration.
fn open_channel(config: &PyramidConfig) -> Result<Box<dyn DeviceChannel>> {
    match config.device.driver {
        DeviceDriver::Simulator => {
            tracing::debug!("using simulated reader");
            Ok(Box::new(SimulatedReader::new()))
        }
        DeviceDriver::Agent => {
            let address = &config.device.address;
            let timeout = Duration::from_millis(config.device.connect_timeout_ms);
            let client = AgentClient::connect(address.as_str(), timeout)
                .with_context(|| format!("failed to connect to reader agent at {}", address))?;
            Ok(Box::new(client))
        }
    }
}

fn normalize(facility_code: u32, card_number: u32) -> Credential {
    if Credential::is_truncated(facility_code, card_number) {
        tracing::warn!(
            facility_code,
            card_number,
            "input wider than 8/16 bits, keeping the low bits"
        );
    }
    Credential::normalize(facility_code, card_number)
}

/// `clone <facility-code> <card-number>`
pub fn clone(
    config: &PyramidConfig,
    facility_code: u32,
    card_number: u32,
    out: &mut dyn Write,
) -> Result<i32> {
    let credential = normalize(facility_code, card_number);
    let frame = PyramidFrame::encode(&credential)?;
    let blocks = BlockSet::from_frame(&frame);

    writeln!(
        out,
        "Preparing to clone Farpointe/Pyramid to T55x7 with {}",
        credential
    )?;
    write!(out, "{}", blocks)?;

    let mut channel = open_channel(config)?;
    CloneOrchestrator::new(&mut *channel).run(&blocks)?;

    writeln!(out, "Clone complete")?;
    Ok(0)
}

/// `sim <facility-code> <card-number>`
///
/// Encodes the credential so argument problems surface, then reports the
/// command as not implemented. No reader is opened.
pub fn sim(facility_code: u32, card_number: u32) -> Result<i32> {
    let credential = normalize(facility_code, card_number);
    simulate(&credential)?;
    Ok(0)
}

/// `read`
pub fn read(config: &PyramidConfig, out: &mut dyn Write) -> Result<i32> {
    let mut channel = open_channel(config)?;
    let outcome = read_tag(&mut *channel, config.read.sample_count)?;

    if !outcome.output.is_empty() {
        writeln!(out, "{}", outcome.output)?;
    }
    Ok(outcome.code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_mapping() {
        let timeout: anyhow::Error = PyramidError::DeviceTimeout {
            block: 2,
            timeout_ms: 1000,
        }
        .into();
        assert_eq!(exit_code(&timeout), -1);

        let device = anyhow::Error::new(DeviceError::Disconnected).context("failed to connect");
        assert_eq!(exit_code(&device), -2);

        let not_implemented = sim(1, 1).unwrap_err();
        assert_eq!(exit_code(&not_implemented), 3);

        assert_eq!(exit_code(&anyhow::anyhow!("broken pipe")), 1);
    }

    #[test]
    fn test_agent_connect_failure() {
        let mut config = PyramidConfig::default();
        // Reserved port on loopback, nothing listens there.
        config.device.address = "127.0.0.1:1".to_string();
        config.device.connect_timeout_ms = 200;

        let mut out = Vec::new();
        let err = clone(&config, 123, 11223, &mut out).unwrap_err();
        assert_eq!(exit_code(&err), -2);
        // The block table is printed before the reader is opened.
        assert!(String::from_utf8(out).unwrap().contains("Blk | Data"));
    }

    #[test]
    fn test_read_reports_demod_code() {
        let mut config = PyramidConfig::default();
        config.device.driver = DeviceDriver::Simulator;
        let mut out = Vec::new();
        assert_eq!(read(&config, &mut out).unwrap(), 0);
        assert!(out.is_empty());
    }
}
