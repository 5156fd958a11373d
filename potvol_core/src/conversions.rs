//! `From` implementations bridging `potvol_config` types to `potvol_core` types.

use std::time::Duration;

use crate::builder::ControllerParams;
use crate::config::{ActuationCfg, FilterCfg, ReadErrorPolicy, SamplingCfg, StartupCfg};
use crate::level::{OutputRange, Remap, VolumeMap};
use crate::util::alpha_for_window;

// ── FilterCfg ────────────────────────────────────────────────────────────────

impl From<&potvol_config::FilterCfg> for FilterCfg {
    fn from(c: &potvol_config::FilterCfg) -> Self {
        Self {
            fast_alpha: alpha_for_window(c.fast_window),
            stable_alpha: alpha_for_window(c.stable_window),
            noise_band: c.noise_band,
            commit_threshold: c.commit_threshold,
            fast_interval: Duration::from_millis(c.fast_interval_ms),
            slow_interval: Duration::from_millis(c.slow_interval_ms),
        }
    }
}

// ── SamplingCfg ──────────────────────────────────────────────────────────────

impl From<potvol_config::ReadErrorPolicy> for ReadErrorPolicy {
    fn from(p: potvol_config::ReadErrorPolicy) -> Self {
        match p {
            potvol_config::ReadErrorPolicy::Skip => Self::Skip,
            potvol_config::ReadErrorPolicy::Zero => Self::Zero,
        }
    }
}

impl From<&potvol_config::AdcCfg> for SamplingCfg {
    fn from(c: &potvol_config::AdcCfg) -> Self {
        Self {
            remap: Remap {
                full_scale: c.full_scale,
                offset: c.offset,
            },
            seed_reads: c.seed_reads,
            reads_per_sample: c.reads_per_sample,
            on_read_error: c.on_read_error.into(),
        }
    }
}

// ── ActuationCfg / StartupCfg ────────────────────────────────────────────────

impl From<potvol_config::VolumeEncoding> for VolumeMap {
    fn from(e: potvol_config::VolumeEncoding) -> Self {
        match e {
            potvol_config::VolumeEncoding::Cubic => Self::Cubic,
            potvol_config::VolumeEncoding::Linear => Self::Linear,
        }
    }
}

impl From<&potvol_config::SinkCfg> for ActuationCfg {
    fn from(c: &potvol_config::SinkCfg) -> Self {
        Self {
            interval: Duration::from_millis(c.actuation_interval_ms),
            volume_map: c.encoding.into(),
            range: OutputRange {
                min: c.min_level,
                max: c.max_level,
            },
        }
    }
}

impl From<&potvol_config::SinkCfg> for StartupCfg {
    fn from(c: &potvol_config::SinkCfg) -> Self {
        Self {
            retries: c.startup_retries,
            poll: Duration::from_millis(c.startup_poll_ms),
        }
    }
}

// ── ControllerParams ─────────────────────────────────────────────────────────

impl From<&potvol_config::Config> for ControllerParams {
    fn from(c: &potvol_config::Config) -> Self {
        Self {
            filter: (&c.filter).into(),
            sampling: (&c.adc).into(),
            actuation: (&c.sink).into(),
            startup: (&c.sink).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_maps_to_default_params() {
        let cfg = potvol_config::Config::default();
        let params: ControllerParams = (&cfg).into();
        assert_eq!(params, ControllerParams::default());
    }
}
