#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the potvol daemon.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - Every section is optional; defaults reproduce the stock Odroid setup
//!   (SARADC channel 0 driving a PulseAudio sink).
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default sysfs node template; `{channel}` is replaced by the ADC channel.
pub const DEFAULT_ADC_PATH: &str = "/sys/class/saradc/saradc_ch{channel}";

/// Highest SARADC channel index exposed by the kernel driver.
pub const MAX_ADC_CHANNEL: u8 = 7;

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceBackend {
    #[default]
    Sysfs,
    Sim,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReadErrorPolicy {
    /// Drop failed reads from the average; skip the cycle when all fail.
    #[default]
    Skip,
    /// Count a failed read as raw 0.
    Zero,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AdcCfg {
    pub channel: u8,
    /// Optional explicit path; may contain `{channel}`.
    pub path: Option<String>,
    /// Raw counts per unit level.
    pub full_scale: f64,
    /// Added after scaling; lets the pot slightly overshoot both ends.
    pub offset: f64,
    /// Reads averaged for the startup seed.
    pub seed_reads: u32,
    /// Reads averaged per steady-state sample.
    pub reads_per_sample: u32,
    pub on_read_error: ReadErrorPolicy,
    pub backend: SourceBackend,
}

impl Default for AdcCfg {
    fn default() -> Self {
        Self {
            channel: 0,
            path: None,
            full_scale: 1002.9,
            offset: -0.01,
            seed_reads: 32,
            reads_per_sample: 16,
            on_read_error: ReadErrorPolicy::Skip,
            backend: SourceBackend::Sysfs,
        }
    }
}

impl AdcCfg {
    /// Resolve the sysfs node for the configured channel.
    pub fn resolved_path(&self) -> PathBuf {
        let template = self.path.as_deref().unwrap_or(DEFAULT_ADC_PATH);
        PathBuf::from(template.replace("{channel}", &self.channel.to_string()))
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct FilterCfg {
    /// Effective window of the fast EMA (alpha = 2 / (n + 1)).
    pub fast_window: u32,
    /// Effective window of the stable EMA.
    pub stable_window: u32,
    /// Deviation from the committed level that counts as a disturbance.
    pub noise_band: f64,
    /// In-band samples required before the stable commit.
    pub commit_threshold: u32,
    pub fast_interval_ms: u64,
    pub slow_interval_ms: u64,
}

impl Default for FilterCfg {
    fn default() -> Self {
        Self {
            fast_window: 7,
            stable_window: 150,
            noise_band: 0.01,
            commit_threshold: 200,
            fast_interval_ms: 8,
            slow_interval_ms: 50,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SinkBackend {
    #[default]
    Pactl,
    Sim,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VolumeEncoding {
    /// PulseAudio software volume (cubic).
    #[default]
    Cubic,
    Linear,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SinkCfg {
    pub name: Option<String>,
    pub backend: SinkBackend,
    pub actuation_interval_ms: u64,
    pub startup_retries: u32,
    pub startup_poll_ms: u64,
    pub min_level: f64,
    pub max_level: f64,
    pub encoding: VolumeEncoding,
    pub client_name: String,
    /// `pactl` executable used by the pactl backend.
    pub pactl: String,
}

impl Default for SinkCfg {
    fn default() -> Self {
        Self {
            name: None,
            backend: SinkBackend::Pactl,
            actuation_interval_ms: 50,
            startup_retries: 100,
            startup_poll_ms: 50,
            min_level: 0.0,
            max_level: 1.0,
            encoding: VolumeEncoding::Cubic,
            client_name: "volume-pot".to_string(),
            pactl: "pactl".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct StateCfg {
    /// File receiving "mute:volume/norm" lines on every sink change.
    pub file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub adc: AdcCfg,
    pub filter: FilterCfg,
    pub sink: SinkCfg,
    pub state: StateCfg,
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Read and parse a config file.
pub fn load_file(path: &Path) -> eyre::Result<Config> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("read config {:?}: {}", path, e))?;
    load_toml(&text).map_err(|e| eyre::eyre!("parse config {:?}: {}", path, e))
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // ADC
        if self.adc.channel > MAX_ADC_CHANNEL {
            eyre::bail!("adc.channel must be in 0..={MAX_ADC_CHANNEL}");
        }
        if !(self.adc.full_scale.is_finite() && self.adc.full_scale > 0.0) {
            eyre::bail!("adc.full_scale must be > 0");
        }
        if !self.adc.offset.is_finite() || self.adc.offset.abs() >= 1.0 {
            eyre::bail!("adc.offset must be in (-1.0, 1.0)");
        }
        if self.adc.seed_reads == 0 {
            eyre::bail!("adc.seed_reads must be >= 1");
        }
        if self.adc.reads_per_sample == 0 {
            eyre::bail!("adc.reads_per_sample must be >= 1");
        }

        // Filter
        if self.filter.fast_window == 0 {
            eyre::bail!("filter.fast_window must be >= 1");
        }
        if self.filter.stable_window == 0 {
            eyre::bail!("filter.stable_window must be >= 1");
        }
        if !(self.filter.noise_band > 0.0 && self.filter.noise_band <= 1.0) {
            eyre::bail!("filter.noise_band must be in (0.0, 1.0]");
        }
        if self.filter.commit_threshold == 0 {
            eyre::bail!("filter.commit_threshold must be >= 1");
        }
        if self.filter.fast_interval_ms == 0 || self.filter.slow_interval_ms == 0 {
            eyre::bail!("filter.fast_interval_ms and filter.slow_interval_ms must be >= 1");
        }
        if self.filter.fast_interval_ms > self.filter.slow_interval_ms {
            eyre::bail!("filter.fast_interval_ms must not exceed filter.slow_interval_ms");
        }

        // Sink
        if let Some(name) = &self.sink.name
            && name.trim().is_empty()
        {
            eyre::bail!("sink.name must not be empty");
        }
        if self.sink.pactl.trim().is_empty() {
            eyre::bail!("sink.pactl must not be empty");
        }
        if self.sink.actuation_interval_ms == 0 {
            eyre::bail!("sink.actuation_interval_ms must be >= 1");
        }
        if self.sink.startup_retries == 0 {
            eyre::bail!("sink.startup_retries must be >= 1");
        }
        if self.sink.startup_poll_ms == 0 {
            eyre::bail!("sink.startup_poll_ms must be >= 1");
        }
        if !(self.sink.min_level.is_finite() && self.sink.max_level.is_finite()) {
            eyre::bail!("sink.min_level and sink.max_level must be finite");
        }
        if self.sink.min_level < 0.0 || self.sink.min_level >= self.sink.max_level {
            eyre::bail!("sink output range must satisfy 0.0 <= min_level < max_level");
        }
        if self.sink.max_level > 1.5 {
            eyre::bail!("sink.max_level is unreasonably large (>1.5)");
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_stock_defaults() {
        let cfg = load_toml("").expect("empty TOML parses");
        assert_eq!(cfg.adc.channel, 0);
        assert_eq!(cfg.filter.commit_threshold, 200);
        assert_eq!(cfg.sink.actuation_interval_ms, 50);
        assert_eq!(cfg.adc.on_read_error, ReadErrorPolicy::Skip);
        cfg.validate().expect("defaults are valid");
    }

    #[test]
    fn resolved_path_substitutes_channel() {
        let adc = AdcCfg {
            channel: 3,
            ..AdcCfg::default()
        };
        assert_eq!(
            adc.resolved_path(),
            PathBuf::from("/sys/class/saradc/saradc_ch3")
        );
    }
}
