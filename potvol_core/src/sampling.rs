//! Sampling loop: the process's driving loop.
//!
//! Sleeps for the interval the filter last selected, reads one averaged
//! sample, runs it through the filter and writes any commit into the target
//! register. The filter state is owned here and nowhere else.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use potvol_traits::{Clock, SampleSource};

use crate::config::{ReadErrorPolicy, SamplingCfg};
use crate::filter::{CommitKind, FilterEngine, FilterStep};
use crate::hw_error::map_source_error;
use crate::register::TargetRegister;

/// Result of averaging several raw reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AveragedRead {
    /// Mean raw value, `None` when no read contributed.
    pub mean: Option<f64>,
    /// Reads that failed.
    pub failures: u32,
}

/// Average `count` raw reads under the given read-failure policy.
pub fn read_averaged<S: SampleSource + ?Sized>(
    source: &mut S,
    count: u32,
    policy: ReadErrorPolicy,
) -> AveragedRead {
    let count = count.max(1);
    let mut sum = 0.0f64;
    let mut used = 0u32;
    let mut failures = 0u32;
    for _ in 0..count {
        match source.read_raw() {
            Ok(raw) => {
                sum += f64::from(raw);
                used += 1;
            }
            Err(e) => {
                failures += 1;
                let err = map_source_error(&*e);
                tracing::trace!(error = %err, "adc read failed");
                if policy == ReadErrorPolicy::Zero {
                    used += 1;
                }
            }
        }
    }
    let mean = (used > 0).then(|| sum / f64::from(used));
    AveragedRead { mean, failures }
}

/// Counters kept by the sampling loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub samples: u64,
    /// Cycles dropped because no read succeeded.
    pub skipped: u64,
    pub read_errors: u64,
    pub unstable_commits: u64,
    pub stable_commits: u64,
}

pub struct SamplingLoop<S: SampleSource, C: Clock> {
    source: S,
    engine: FilterEngine,
    register: Arc<TargetRegister>,
    clock: C,
    cfg: SamplingCfg,
    stats: LoopStats,
}

impl<S: SampleSource, C: Clock> SamplingLoop<S, C> {
    pub fn new(
        source: S,
        engine: FilterEngine,
        register: Arc<TargetRegister>,
        clock: C,
        cfg: SamplingCfg,
    ) -> Self {
        Self {
            source,
            engine,
            register,
            clock,
            cfg,
            stats: LoopStats::default(),
        }
    }

    pub fn engine(&self) -> &FilterEngine {
        &self.engine
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    /// Read, filter and commit once, without sleeping.
    ///
    /// Returns `None` when the sample was skipped because no read succeeded.
    pub fn step(&mut self) -> Option<FilterStep> {
        let read = read_averaged(
            &mut self.source,
            self.cfg.reads_per_sample,
            self.cfg.on_read_error,
        );
        self.stats.read_errors += u64::from(read.failures);
        let Some(mean) = read.mean else {
            self.stats.skipped += 1;
            tracing::debug!(failures = read.failures, "no readable adc sample, skipping cycle");
            return None;
        };

        self.stats.samples += 1;
        let val = self.cfg.remap.to_level(mean);
        let step = self.engine.step(val);

        if let Some(commit) = step.commit {
            self.register.write(commit.level);
            match commit.kind {
                CommitKind::Unstable => {
                    self.stats.unstable_commits += 1;
                    tracing::debug!(volume_pct = 100.0 * commit.level, "volume committed");
                }
                CommitKind::Stable => {
                    self.stats.stable_commits += 1;
                    tracing::debug!(volume_pct = 100.0 * commit.level, "volume committed (stable)");
                }
            }
        }
        Some(step)
    }

    /// Loop until `shutdown` is set.
    pub fn run(&mut self, shutdown: &AtomicBool) -> LoopStats {
        tracing::info!("starting ADC read loop");
        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            self.clock.sleep(self.engine.interval());
            if shutdown.load(Ordering::Relaxed) {
                break;
            }
            self.step();
        }
        tracing::info!(
            samples = self.stats.samples,
            skipped = self.stats.skipped,
            read_errors = self.stats.read_errors,
            unstable_commits = self.stats.unstable_commits,
            stable_commits = self.stats.stable_commits,
            "ADC read loop stopped"
        );
        self.stats
    }
}
