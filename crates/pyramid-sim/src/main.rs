//! pyramid-reader-sim - simulated LF reader agent
//!
//! Serves the reader protocol over TCP with a blank T55x7 tag on the
//! simulated antenna, so `pyramid` can be pointed at it instead of hardware.

use anyhow::{Context, Result};
use clap::Parser;

use pyramid_core::agent::DEFAULT_AGENT_PORT;
use pyramid_core::logging::{init_logging, LogConfig, LogLevel};
use pyramid_sim::{ReaderAgent, SimulatedReader};

#[derive(Parser, Debug)]
#[command(name = "pyramid-reader-sim")]
#[command(version, about = "Simulated LF reader agent for Farpointe/Pyramid tags")]
struct Args {
    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// TCP port to listen on
    #[arg(short, long, default_value_t = DEFAULT_AGENT_PORT)]
    port: u16,

    /// Never acknowledge writes to this block
    #[arg(long, value_name = "BLOCK")]
    drop_ack: Option<u32>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: LogLevel,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&LogConfig {
        level: args.log_level,
        ..Default::default()
    });

    let mut reader = SimulatedReader::new();
    if let Some(block) = args.drop_ack {
        tracing::warn!(block, "writes to this block will not be acknowledged");
        reader.drop_ack_for_block(block);
    }

    let agent = ReaderAgent::bind((args.bind.as_str(), args.port), reader)
        .with_context(|| format!("failed to bind {}:{}", args.bind, args.port))?;
    agent.run().context("reader agent failed")?;

    Ok(())
}
