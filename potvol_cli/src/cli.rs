//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();
/// Startup retry budget of the current run (for JSON error details).
pub static LAST_STARTUP: OnceLock<CliStartup> = OnceLock::new();

#[derive(Copy, Clone, Debug)]
pub struct CliStartup {
    pub retries: u32,
    pub poll_ms: u64,
}

#[derive(Parser, Debug)]
#[command(
    name = "potvol",
    version,
    about = "Drive a PulseAudio sink volume from a potentiometer on an ADC channel"
)]
pub struct Cli {
    /// Path to config TOML (typed); stock defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); overrides logging.level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the daemon: follow the knob until interrupted
    Run {
        /// Sink to control (positional form of --sink)
        #[arg(value_name = "SINK")]
        sink: Option<String>,
        /// State file (positional form of --state-file)
        #[arg(value_name = "STATE_FILE")]
        state_file: Option<PathBuf>,
        /// ADC channel 0..=7 (positional form of --channel)
        #[arg(value_name = "CHANNEL", value_parser = clap::value_parser!(u8).range(0..=7))]
        channel: Option<u8>,
        /// Sink name, e.g. alsa_output.platform-hdmi
        #[arg(long = "sink", id = "sink_flag", value_name = "NAME", conflicts_with = "sink")]
        sink_flag: Option<String>,
        /// File receiving "mute:volume/norm" on every sink change
        #[arg(
            long = "state-file",
            id = "state_file_flag",
            value_name = "FILE",
            conflicts_with = "state_file"
        )]
        state_file_flag: Option<PathBuf>,
        /// ADC channel 0..=7
        #[arg(
            long = "channel",
            id = "channel_flag",
            value_name = "N",
            conflicts_with = "channel",
            value_parser = clap::value_parser!(u8).range(0..=7)
        )]
        channel_flag: Option<u8>,
        /// Use the simulated knob and sink instead of real devices
        #[arg(long, action = ArgAction::SetTrue)]
        sim: bool,
        /// Stop after this many milliseconds (0 = run until interrupted)
        #[arg(long, value_name = "MS", default_value_t = 0)]
        duration_ms: u64,
    },
    /// Quick health check: read the knob and ask the sink for its volume
    SelfCheck {
        /// Use the simulated knob and sink instead of real devices
        #[arg(long, action = ArgAction::SetTrue)]
        sim: bool,
        /// Raw reads to average
        #[arg(long, value_name = "N", default_value_t = 16)]
        reads: u32,
    },
}
