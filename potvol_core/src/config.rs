//! Configuration types for the potvol engine.
//!
//! These are the runtime configuration structs used by the filter, the
//! sampling loop and the actuation worker. They are separate from the
//! TOML-deserialized config in `potvol_config`.

use std::time::Duration;

use crate::level::{OutputRange, Remap, VolumeMap};
use crate::util::alpha_for_window;

/// Filter and scan-rate configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCfg {
    /// Coefficient of the fast ("unstable") EMA. Default 2/8.
    pub fast_alpha: f64,
    /// Coefficient of the slow ("stable") EMA. Default 2/151.
    pub stable_alpha: f64,
    /// |ema - committed| at or above this is a disturbance. Default 0.01.
    pub noise_band: f64,
    /// In-band samples before the stable commit. Default 200.
    pub commit_threshold: u32,
    /// Scan interval while the knob is moving.
    pub fast_interval: Duration,
    /// Scan interval once settled.
    pub slow_interval: Duration,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            fast_alpha: alpha_for_window(7),
            stable_alpha: alpha_for_window(150),
            noise_band: 0.01,
            commit_threshold: 200,
            fast_interval: Duration::from_millis(8),
            slow_interval: Duration::from_millis(50),
        }
    }
}

impl FilterCfg {
    pub(crate) fn check(&self) -> Result<(), &'static str> {
        let alpha_ok = |a: f64| a > 0.0 && a <= 1.0;
        if !alpha_ok(self.fast_alpha) || !alpha_ok(self.stable_alpha) {
            return Err("filter alphas must be in (0, 1]");
        }
        if !(self.noise_band > 0.0 && self.noise_band.is_finite()) {
            return Err("noise band must be > 0");
        }
        if self.commit_threshold == 0 {
            return Err("commit threshold must be >= 1");
        }
        if self.fast_interval.is_zero() || self.slow_interval.is_zero() {
            return Err("scan intervals must be non-zero");
        }
        Ok(())
    }
}

/// What a failed sensor read contributes to a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadErrorPolicy {
    /// Exclude the read; a sample with no good reads is skipped.
    #[default]
    Skip,
    /// Treat the read as raw 0.
    Zero,
}

/// Sampling-loop configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingCfg {
    pub remap: Remap,
    /// Reads averaged for the startup seed. Default 32.
    pub seed_reads: u32,
    /// Reads averaged per steady-state sample. Default 16.
    pub reads_per_sample: u32,
    pub on_read_error: ReadErrorPolicy,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            remap: Remap::default(),
            seed_reads: 32,
            reads_per_sample: 16,
            on_read_error: ReadErrorPolicy::Skip,
        }
    }
}

/// Actuation-worker configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ActuationCfg {
    /// Fixed polling cadence, independent of the scan interval.
    pub interval: Duration,
    pub volume_map: VolumeMap,
    /// Range committed levels are clamped into.
    pub range: OutputRange,
}

impl Default for ActuationCfg {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(50),
            volume_map: VolumeMap::Cubic,
            range: OutputRange::default(),
        }
    }
}

/// Startup barrier: bounded wait for the sink's first report.
#[derive(Debug, Clone, PartialEq)]
pub struct StartupCfg {
    pub retries: u32,
    pub poll: Duration,
}

impl Default for StartupCfg {
    fn default() -> Self {
        Self {
            retries: 100,
            poll: Duration::from_millis(50),
        }
    }
}
