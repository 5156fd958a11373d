use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use potvol_core::mocks::ScriptedSource;
use potvol_core::{
    FilterCfg, FilterEngine, OutputRange, ReadErrorPolicy, Remap, SamplingCfg, SamplingLoop,
    ScanMode, TargetRegister,
};
use potvol_traits::{BoxError, ManualClock, SampleSource};

/// Replays a list of raw values and raises `stop` once it runs out.
struct FiniteSource {
    values: Vec<u16>,
    idx: usize,
    stop: Arc<AtomicBool>,
}

impl SampleSource for FiniteSource {
    fn read_raw(&mut self) -> Result<u16, BoxError> {
        let v = self.values[self.idx.min(self.values.len() - 1)];
        self.idx += 1;
        if self.idx >= self.values.len() {
            self.stop.store(true, Ordering::Relaxed);
        }
        Ok(v)
    }
}

fn cfg() -> SamplingCfg {
    SamplingCfg {
        remap: Remap {
            full_scale: 1000.0,
            offset: 0.0,
        },
        reads_per_sample: 1,
        ..SamplingCfg::default()
    }
}

#[test]
fn sleeps_follow_the_selected_scan_mode() {
    let stop = Arc::new(AtomicBool::new(false));
    // Two settled samples, then the knob jumps.
    let values = vec![300, 300, 700, 700, 700];
    let src = FiniteSource {
        values,
        idx: 0,
        stop: stop.clone(),
    };
    let clock = ManualClock::new();
    let reg = Arc::new(TargetRegister::new(0.3));
    let engine = FilterEngine::new(FilterCfg::default(), OutputRange::default(), 0.3, 0.3);
    let mut lp = SamplingLoop::new(src, engine, reg.clone(), clock.clone(), cfg());

    let stats = lp.run(&stop);

    let slow = Duration::from_millis(50);
    let fast = Duration::from_millis(8);
    assert_eq!(clock.sleeps(), vec![slow, slow, slow, fast, fast]);
    assert_eq!(stats.samples, 5);
    assert_eq!(stats.unstable_commits, 3);
    assert_eq!(lp.engine().mode(), ScanMode::Fast);
    assert!(reg.read() > 0.3);
}

#[test]
fn preset_shutdown_never_samples() {
    let stop = AtomicBool::new(true);
    let clock = ManualClock::new();
    let reg = Arc::new(TargetRegister::new(0.5));
    let engine = FilterEngine::new(FilterCfg::default(), OutputRange::default(), 0.5, 0.5);
    let mut lp = SamplingLoop::new(ScriptedSource::constant(500), engine, reg, clock.clone(), cfg());
    let stats = lp.run(&stop);
    assert_eq!(stats.samples, 0);
    assert!(clock.sleeps().is_empty());
}

#[test]
fn unreadable_cycles_are_skipped_under_skip_policy() {
    let reg = Arc::new(TargetRegister::new(0.5));
    let engine = FilterEngine::new(FilterCfg::default(), OutputRange::default(), 0.5, 0.5);
    let src = ScriptedSource::new(vec![Err("eio"), Err("eio"), Ok(500)]);
    let mut lp = SamplingLoop::new(src, engine, reg.clone(), ManualClock::new(), cfg());

    assert!(lp.step().is_none());
    assert!(lp.step().is_none());
    let step = lp.step().expect("third read succeeds");
    assert_eq!(step.commit, None);
    let stats = lp.stats();
    assert_eq!(stats.skipped, 2);
    assert_eq!(stats.read_errors, 2);
    assert_eq!(stats.samples, 1);
    assert_eq!(reg.read(), 0.5);
}

#[test]
fn zero_policy_folds_failures_in_as_a_low_spike() {
    let reg = Arc::new(TargetRegister::new(0.5));
    let engine = FilterEngine::new(FilterCfg::default(), OutputRange::default(), 0.5, 0.5);
    let src = ScriptedSource::new(vec![Err("eio")]);
    let sampling = SamplingCfg {
        on_read_error: ReadErrorPolicy::Zero,
        ..cfg()
    };
    let mut lp = SamplingLoop::new(src, engine, reg.clone(), ManualClock::new(), sampling);

    let step = lp.step().expect("zero policy always yields a sample");
    // 0.25 * 0.0 + 0.75 * 0.5
    let commit = step.commit.expect("a zero spike is a disturbance");
    assert!((commit.level - 0.375).abs() < 1e-12);
    assert_eq!(reg.read(), commit.level);
}

#[test]
fn commits_are_written_to_the_register() {
    let reg = Arc::new(TargetRegister::new(0.1));
    let engine = FilterEngine::new(FilterCfg::default(), OutputRange::default(), 0.1, 0.1);
    let mut lp = SamplingLoop::new(
        ScriptedSource::constant(900),
        engine,
        reg.clone(),
        ManualClock::new(),
        cfg(),
    );
    let step = lp.step().expect("sample");
    let c = step.commit.expect("commit");
    assert_eq!(reg.read(), c.level);
    assert_eq!(lp.stats().unstable_commits, 1);
}
