//! Device backends for potvol: the SARADC sysfs source, the `pactl` sink and
//! in-memory simulations of both.

pub mod error;
pub mod pactl;
pub mod saradc;
pub mod sim;

pub use error::HwError;
pub use pactl::{PactlCommand, PactlSink, SinkMonitor};
pub use saradc::SaradcSource;
pub use sim::{SimKnob, SimulatedSink, SimulatedSource};

/// Observed state of the sink: mute flag and per-channel native volumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    pub muted: bool,
    pub volumes: Vec<u32>,
}

impl SinkReport {
    /// Average over channels, 0 for a report without channels.
    pub fn average(&self) -> u32 {
        if self.volumes.is_empty() {
            return 0;
        }
        let sum: u64 = self.volumes.iter().map(|&v| u64::from(v)).sum();
        let avg = sum / self.volumes.len() as u64;
        u32::try_from(avg).unwrap_or(u32::MAX)
    }
}
