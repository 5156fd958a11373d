use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use eyre::WrapErr;
use potvol_traits::{Clock, LevelSink, SampleSource};

use crate::actuator::ActuationWorker;
use crate::builder::Controller;
use crate::config::{ReadErrorPolicy, StartupCfg};
use crate::error::{PotvolError, Result as CoreResult};
use crate::filter::FilterEngine;
use crate::level::VolumeMap;
use crate::register::TargetRegister;
use crate::sampling::{LoopStats, SamplingLoop, read_averaged};

/// Summary returned once the sampling loop has been stopped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub stats: LoopStats,
    /// Level the sink was at when the engine started.
    pub initial_level: f64,
    /// Target in the register when the loop stopped.
    pub final_target: f64,
    pub applies_issued: u64,
    pub apply_failures: u64,
}

/// Poll the sink for its first known volume, with bounded retries.
///
/// Running without a seeded register is never allowed, so exhausting the
/// retry budget is fatal.
pub fn wait_initial_level<K, C>(
    sink: &K,
    volume_map: VolumeMap,
    startup: &StartupCfg,
    clock: &C,
) -> Result<f64, PotvolError>
where
    K: LevelSink + ?Sized,
    C: Clock + ?Sized,
{
    for attempt in 0..startup.retries {
        if let Some(native) = sink.initial_state() {
            let level = volume_map.to_level(native);
            tracing::debug!(attempt, native, level, "sink reported initial volume");
            return Ok(level);
        }
        clock.sleep(startup.poll);
    }
    Err(PotvolError::StartupTimeout {
        retries: startup.retries,
    })
}

/// Seed level from a burst of reads, larger than a steady-state sample.
pub fn seed_level<S: SampleSource + ?Sized>(
    source: &mut S,
    reads: u32,
    policy: ReadErrorPolicy,
    remap: crate::level::Remap,
) -> Result<f64, PotvolError> {
    let read = read_averaged(source, reads, policy);
    match read.mean {
        Some(mean) => Ok(remap.to_level(mean)),
        None => Err(PotvolError::SensorUnavailable(format!(
            "all {} seed reads failed",
            read.failures
        ))),
    }
}

impl<C: Clock + Clone + Send + 'static> Controller<C> {
    /// Seed, start the actuation worker, and drive the sampling loop until
    /// `shutdown` is set.
    pub fn run(self, shutdown: Arc<AtomicBool>) -> CoreResult<RunSummary> {
        let Controller {
            mut source,
            sink,
            params,
            clock,
        } = self;

        let initial_level =
            wait_initial_level(&sink, params.actuation.volume_map, &params.startup, &clock)?;
        tracing::info!(volume_pct = 100.0 * initial_level, "sink state received");

        let seed = seed_level(
            &mut source,
            params.sampling.seed_reads,
            params.sampling.on_read_error,
            params.sampling.remap,
        )?;
        tracing::debug!(seed, "unstable ema seeded");

        let register = Arc::new(TargetRegister::new(initial_level));
        let handle = ActuationWorker::new(
            register.clone(),
            sink,
            params.actuation.volume_map,
            initial_level,
        )
        .spawn(params.actuation.interval, clock.clone())
        .wrap_err("spawn actuation thread")?;

        let engine = FilterEngine::new(
            params.filter.clone(),
            params.actuation.range,
            seed,
            initial_level,
        );
        let mut sampling = SamplingLoop::new(
            source,
            engine,
            register.clone(),
            clock,
            params.sampling.clone(),
        );
        let stats = sampling.run(&shutdown);

        let report = handle.stop();

        Ok(RunSummary {
            stats,
            initial_level,
            final_target: register.read(),
            applies_issued: report.issued,
            apply_failures: report.failures,
        })
    }
}
