//! CLI argument parsing types using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use iftopwatch_core::ControlAction;

/// Streams per-connection bandwidth snapshots from iftop
#[derive(Parser)]
#[command(name = "iftopwatch")]
#[command(author, version, about = "Stream iftop bandwidth snapshots as JSON or text")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the settings file (TOML)
    #[arg(short, long, global = true, env = "IFTOPWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Run iftop on an interface and print every snapshot
    #[command(about = "Run iftop on an interface and stream its snapshots")]
    Watch {
        /// Capture interface (overrides the settings file)
        #[arg(short, long)]
        interface: Option<String>,

        /// Rows per report, 1-500
        #[arg(short = 'n', long)]
        max_rows: Option<u16>,

        /// pcap filter expression
        #[arg(short, long)]
        filter: Option<String>,

        /// iftop binary to run
        #[arg(short, long)]
        binary: Option<String>,

        /// Display toggle to apply once iftop is running (repeatable)
        #[arg(short, long, value_enum)]
        toggle: Vec<Toggle>,

        /// Literal keys to send once iftop is running
        #[arg(short, long)]
        keys: Option<String>,

        /// Output format
        #[arg(long, default_value = "json", value_enum)]
        format: OutputFormat,

        /// Stop after this many snapshots
        #[arg(long)]
        count: Option<usize>,
    },

    /// Parse captured iftop text output
    #[command(about = "Parse a captured iftop -t transcript")]
    Parse {
        /// Transcript file, or `-` for stdin
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Output format
        #[arg(long, default_value = "json", value_enum)]
        format: OutputFormat,

        /// Feed the transcript in chunks of this many bytes
        #[arg(long, default_value_t = 512, value_parser = clap::value_parser!(u32).range(1..))]
        chunk_size: u32,

        /// Fail if any frame is malformed
        #[arg(long)]
        strict: bool,
    },

    /// Check that the iftop binary is a supported version
    #[command(about = "Probe the iftop version")]
    Check {
        /// iftop binary to probe
        #[arg(short, long)]
        binary: Option<String>,
    },
}

/// Output format options
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One JSON object per snapshot per line
    Json,
    /// Human-readable summary
    Text,
}

/// Display toggles accepted by `watch --toggle`
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    /// Aggregate by source host
    Source,
    /// Aggregate by destination host
    Destination,
    /// DNS resolution
    Dns,
    /// Port display
    Ports,
}

impl From<Toggle> for ControlAction {
    fn from(toggle: Toggle) -> Self {
        match toggle {
            Toggle::Source => Self::ToggleSourceAggregation,
            Toggle::Destination => Self::ToggleDestinationAggregation,
            Toggle::Dns => Self::ToggleDnsResolution,
            Toggle::Ports => Self::TogglePortDisplay,
        }
    }
}
