//! Daemon assembly: config mapping, device backends, and the run itself.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eyre::WrapErr;
use potvol_config::{Config, SinkBackend, SourceBackend};
use potvol_core::error::{PotvolError, Result as CoreResult};
use potvol_core::hw_error::map_source_error;
use potvol_core::{Controller, ControllerParams, RunSummary, VOLUME_NORM, read_averaged};
use potvol_hardware::pactl::{PactlCommand, PactlSink, SinkMonitor};
use potvol_hardware::{SaradcSource, SimulatedSink, SimulatedSource};
use potvol_traits::{LevelSink, SampleSource};

use crate::cli::{CliStartup, LAST_STARTUP};
use crate::state::{create_state_file, report_handler};

/// Simulated knob position: about 40% with the stock remap.
const SIM_RAW: u16 = 410;
const SIM_JITTER: u16 = 1;

/// Options of a `run` invocation that are not part of the config file.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOpts {
    pub sim: bool,
    pub duration_ms: u64,
}

fn sim_source(cfg: &Config, sim: bool) -> bool {
    sim || cfg.adc.backend == SourceBackend::Sim
}

fn sim_sink(cfg: &Config, sim: bool) -> bool {
    sim || cfg.sink.backend == SinkBackend::Sim
}

fn open_source(cfg: &Config, sim: bool) -> CoreResult<Box<dyn SampleSource + Send>> {
    if sim_source(cfg, sim) {
        tracing::info!(raw = SIM_RAW, "using simulated knob");
        return Ok(Box::new(SimulatedSource::new(SIM_RAW, SIM_JITTER)));
    }
    let path = cfg.adc.resolved_path();
    let src = SaradcSource::open(&path).map_err(|e| map_source_error(&e))?;
    tracing::info!(path = %path.display(), "adc opened");
    Ok(Box::new(src))
}

fn pactl_command(cfg: &Config) -> CoreResult<PactlCommand> {
    let Some(name) = cfg.sink.name.as_deref() else {
        eyre::bail!("no sink name given; pass it as the first argument of `run` or set sink.name");
    };
    Ok(PactlCommand::new(name)
        .with_program(cfg.sink.pactl.clone())
        .with_client_name(cfg.sink.client_name.clone()))
}

/// Run the daemon until `shutdown` is set (or `duration_ms` elapses).
pub fn run_daemon(
    cfg: &Config,
    opts: RunOpts,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<RunSummary> {
    let params = ControllerParams::from(cfg);
    let _ = LAST_STARTUP.set(CliStartup {
        retries: params.startup.retries,
        poll_ms: cfg.sink.startup_poll_ms,
    });

    let state_file: Option<PathBuf> = cfg.state.file.clone();
    if let Some(path) = &state_file {
        create_state_file(path)
            .wrap_err_with(|| format!("open state file {}", path.display()))?;
    }
    let source = open_source(cfg, opts.sim)?;

    if opts.duration_ms > 0 {
        let flag = shutdown.clone();
        let limit = Duration::from_millis(opts.duration_ms);
        std::thread::Builder::new()
            .name("potvol-deadline".into())
            .spawn(move || {
                std::thread::sleep(limit);
                tracing::debug!("run duration elapsed");
                flag.store(true, Ordering::Relaxed);
            })
            .wrap_err("spawn deadline thread")?;
    }

    if sim_sink(cfg, opts.sim) {
        let sink = SimulatedSink::new(VOLUME_NORM / 2, 2);
        let mut on_report = report_handler("sim".to_string(), state_file);
        on_report(sink.report());
        let summary = build(source, sink.clone(), params)?.run(shutdown)?;
        on_report(sink.report());
        return Ok(summary);
    }

    let cmd = pactl_command(cfg)?;
    let sink_name = cmd.sink_name().to_string();
    let _monitor = match SinkMonitor::spawn(cmd.clone(), report_handler(sink_name, state_file)) {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(error = %e, "sink monitor unavailable; state file will not be updated");
            None
        }
    };
    let sink = PactlSink::spawn(cmd).wrap_err("start pactl command thread")?;
    build(source, sink, params)?.run(shutdown)
}

fn build(
    source: Box<dyn SampleSource + Send>,
    sink: impl LevelSink + Send + 'static,
    params: ControllerParams,
) -> CoreResult<Controller> {
    Controller::builder()
        .with_source(source)
        .with_sink(sink)
        .with_params(params)
        .try_build()
}

/// Result of `self-check`.
#[derive(Debug, Clone, Copy)]
pub struct SelfCheck {
    pub raw_mean: f64,
    pub level: f64,
    pub read_failures: u32,
    pub sink_volume: Option<u32>,
    pub sink_level: Option<f64>,
}

/// Read the knob a few times and ask the sink for its volume once.
pub fn self_check(cfg: &Config, sim: bool, reads: u32) -> CoreResult<SelfCheck> {
    let params = ControllerParams::from(cfg);
    let mut source = open_source(cfg, sim)?;
    let read = read_averaged(&mut source, reads, params.sampling.on_read_error);
    let Some(raw_mean) = read.mean else {
        return Err(PotvolError::SensorUnavailable(format!(
            "all {} reads failed",
            read.failures
        ))
        .into());
    };

    let sink_volume = if sim_sink(cfg, sim) {
        SimulatedSink::new(VOLUME_NORM / 2, 2).initial_state()
    } else {
        PactlSink::spawn(pactl_command(cfg)?)
            .wrap_err("start pactl command thread")?
            .initial_state()
    };
    let map = params.actuation.volume_map;
    Ok(SelfCheck {
        raw_mean,
        level: params.sampling.remap.to_level(raw_mean),
        read_failures: read.failures,
        sink_volume,
        sink_level: sink_volume.map(|v| map.to_level(v)),
    })
}
