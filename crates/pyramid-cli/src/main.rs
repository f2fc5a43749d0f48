//! pyramid - Farpointe/Pyramid credential cloning tool
//!
//! Encodes a facility code and card number into the Pyramid tag format and
//! writes it to a T55x7 tag through an LF reader agent.
//!
//! ```text
//! pyramid clone 123 11223        write the credential to a T55x7
//! pyramid sim 123 11223          field emulation (not available)
//! pyramid read                   acquire and demodulate a Pyramid tag
//! pyramid --simulate clone 1 1   use the built-in simulated reader
//! ```

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use pyramid_core::config::{ConfigError, DeviceDriver, PyramidConfig};
use pyramid_core::error::PyramidError;
use pyramid_core::logging::{init_logging, LogLevel};

mod commands;

/// Farpointe/Pyramid credential tool
#[derive(Parser, Debug)]
#[command(name = "pyramid")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (overrides the search path)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Use the in-process simulated reader instead of a reader agent
    #[arg(long, global = true)]
    simulate: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Clone a Farpointe/Pyramid credential to a T55x7 tag
    Clone {
        /// Facility code (8 bits, wider values are truncated)
        facility_code: u32,
        /// Card number (16 bits, wider values are truncated)
        card_number: u32,
    },

    /// Simulate a Farpointe/Pyramid tag in the reader's field
    Sim {
        /// Facility code (8 bits, wider values are truncated)
        facility_code: u32,
        /// Card number (16 bits, wider values are truncated)
        card_number: u32,
    },

    /// Read and demodulate a Farpointe/Pyramid tag
    Read,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version go to stdout and succeed; anything else is a
            // usage error.
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return ExitCode::from(code);
        }
    };

    let code = run(cli, &mut std::io::stdout().lock());
    // Negative codes wrap the way a C `exit(-1)` does.
    ExitCode::from(code as u8)
}

/// Execute a parsed command line, writing user output to `out`.
///
/// Returns the process exit code.
fn run(cli: Cli, out: &mut dyn Write) -> i32 {
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => apply_overrides(config, &cli),
        Err(e) => {
            let err = PyramidError::Config(e);
            eprintln!("Error: {}", err);
            return err.exit_code();
        }
    };

    init_logging(&config.logging);
    tracing::debug!(driver = ?config.device.driver, "configuration loaded");

    let result = match cli.command {
        Commands::Clone {
            facility_code,
            card_number,
        } => commands::clone(&config, facility_code, card_number, out),
        Commands::Sim {
            facility_code,
            card_number,
        } => commands::sim(facility_code, card_number),
        Commands::Read => commands::read(&config, out),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            commands::exit_code(&err)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<PyramidConfig, ConfigError> {
    match path {
        Some(path) => PyramidConfig::load_from(path),
        None => PyramidConfig::load(),
    }
}

fn apply_overrides(mut config: PyramidConfig, cli: &Cli) -> PyramidConfig {
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    if cli.simulate {
        config.device.driver = DeviceDriver::Simulator;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("pyramid").chain(args.iter().copied()))
    }

    fn run_args(args: &[&str]) -> (i32, String) {
        let mut out = Vec::new();
        let code = run(parse(args).unwrap(), &mut out);
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_usage_errors_never_reach_a_device() {
        assert_eq!(
            parse(&["clone"]).unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
        assert_eq!(
            parse(&["clone", "123"]).unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
        assert_eq!(parse(&["clone", "-h"]).unwrap_err().kind(), ErrorKind::DisplayHelp);
        assert!(parse(&[]).is_err());
        assert!(parse(&["clone", "-5", "1"]).is_err());
        assert!(parse(&["clone", "abc", "1"]).is_err());
    }

    #[test]
    fn test_parse_clone() {
        let cli = parse(&["--simulate", "clone", "300", "70000"]).unwrap();
        assert!(cli.simulate);
        assert_eq!(
            cli.command,
            Commands::Clone {
                facility_code: 300,
                card_number: 70000
            }
        );
    }

    #[test]
    fn test_log_level_override() {
        let cli = parse(&["--log-level", "debug", "read"]).unwrap();
        let config = apply_overrides(PyramidConfig::default(), &cli);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.device.driver, DeviceDriver::Agent);
        assert!(parse(&["--log-level", "loud", "read"]).is_err());
    }

    #[test]
    fn test_clone_with_simulator() {
        let (code, out) = run_args(&["--simulate", "clone", "123", "11223"]);
        assert_eq!(code, 0);
        assert!(out.starts_with(
            "Preparing to clone Farpointe/Pyramid to T55x7 with Facility Code: 123, Card Number: 11223"
        ));
        assert!(out.contains(" 0 | 00107080"));
        assert!(out.contains(" 4 | abe01005"));
    }

    #[test]
    fn test_sim_not_implemented() {
        let (code, out) = run_args(&["--simulate", "sim", "123", "11223"]);
        assert_eq!(code, 3);
        assert!(out.is_empty());
    }

    #[test]
    fn test_read_blank_simulated_tag() {
        let (code, _) = run_args(&["--simulate", "read"]);
        assert_eq!(code, 0);
    }

    #[test]
    fn test_config_file_selects_simulator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pyramid.yaml");
        std::fs::write(&path, "device:\n  driver: simulator\n").unwrap();

        let (code, out) = run_args(&["--config", path.to_str().unwrap(), "clone", "1", "1"]);
        assert_eq!(code, 0);
        assert!(out.contains(" 3 | 02010200"));
    }

    #[test]
    fn test_bad_config_is_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pyramid.yaml");
        std::fs::write(&path, "read:\n  sample_count: 0\n").unwrap();

        let (code, out) = run_args(&["--config", path.to_str().unwrap(), "read"]);
        assert_eq!(code, 1);
        assert!(out.is_empty());

        let missing = dir.path().join("missing.yaml");
        let (code, _) = run_args(&["--config", missing.to_str().unwrap(), "read"]);
        assert_eq!(code, 1);
    }
}
