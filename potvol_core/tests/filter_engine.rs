use std::time::Duration;

use potvol_core::{
    CommitKind, FilterCfg, FilterEngine, FilterState, OutputRange, ScanMode,
};
use rstest::rstest;

fn engine_at(level: f64, stability: u32, mode: ScanMode) -> FilterEngine {
    FilterEngine::from_state(
        FilterCfg::default(),
        OutputRange::default(),
        FilterState {
            unstable_ema: level,
            stable_ema: level,
            stability,
            committed: level,
            mode,
        },
    )
}

fn settled_at(level: f64) -> FilterEngine {
    engine_at(level, 201, ScanMode::Slow)
}

#[test]
fn two_hundred_in_band_samples_commit_once_and_go_slow() {
    let mut engine = engine_at(0.50, 0, ScanMode::Fast);
    let mut commits = Vec::new();
    for i in 1..=200u32 {
        let step = engine.step(0.50);
        if let Some(c) = step.commit {
            commits.push((i, c));
        }
        if i < 200 {
            assert_eq!(engine.stability(), i);
            assert_eq!(step.mode, ScanMode::Fast);
        }
    }
    assert_eq!(commits.len(), 1);
    let (at, commit) = commits[0];
    assert_eq!(at, 200);
    assert_eq!(commit.kind, CommitKind::Stable);
    assert!((commit.level - 0.50).abs() < 1e-12);
    assert_eq!(engine.mode(), ScanMode::Slow);
    assert_eq!(engine.interval(), Duration::from_millis(50));
    assert!(engine.is_settled());
}

#[test]
fn jump_from_settled_level_is_a_disturbance() {
    let mut engine = settled_at(0.50);
    let step = engine.step(0.70);

    let commit = step.commit.expect("disturbance commits");
    assert_eq!(commit.kind, CommitKind::Unstable);
    // 0.25 * 0.70 + 0.75 * 0.50
    assert!((commit.level - 0.55).abs() < 1e-12);
    assert!(commit.level < 0.70);
    assert_eq!(step.mode, ScanMode::Fast);
    assert_eq!(step.interval, Duration::from_millis(8));
    assert_eq!(engine.stability(), 0);
    assert_eq!(engine.stable_ema(), engine.unstable_ema());
}

#[test]
fn counter_increases_by_one_then_parks_past_threshold() {
    let mut engine = engine_at(0.30, 0, ScanMode::Fast);
    let mut prev = engine.stability();
    for _ in 0..199 {
        engine.step(0.30);
        assert_eq!(engine.stability(), prev + 1);
        prev = engine.stability();
    }
    engine.step(0.30);
    assert_eq!(engine.stability(), 201);
    for _ in 0..500 {
        assert_eq!(engine.step(0.30).commit, None);
        assert_eq!(engine.stability(), 201);
    }
}

#[test]
fn stable_commit_equals_stable_ema_at_threshold() {
    let mut engine = engine_at(0.40, 0, ScanMode::Fast);
    // Small in-band wiggle so the stable EMA actually moves.
    let mut last = None;
    for i in 0..200 {
        let v = if i % 2 == 0 { 0.402 } else { 0.399 };
        let step = engine.step(v);
        if let Some(c) = step.commit {
            last = Some(c);
        }
    }
    let commit = last.expect("stable commit");
    assert_eq!(commit.kind, CommitKind::Stable);
    assert_eq!(commit.level, engine.stable_ema());
    assert_eq!(engine.state().committed, engine.stable_ema());
}

#[test]
fn disturbance_is_measured_against_committed_level_not_previous_ema() {
    // Each sample moves the fast EMA by less than the band, but the drift
    // accumulates against the committed level.
    let mut engine = settled_at(0.50);
    let mut fired_at = None;
    for i in 1..=20 {
        let level = 0.50 + 0.002 * f64::from(i);
        if let Some(c) = engine.step(level).commit {
            assert_eq!(c.kind, CommitKind::Unstable);
            fired_at = Some(i);
            break;
        }
    }
    assert!(fired_at.is_some(), "slow drift must eventually disturb");
}

#[test]
fn settled_engine_with_unchanged_input_is_idempotent() {
    let mut engine = settled_at(0.65);
    let before = engine.state();
    for _ in 0..1000 {
        let step = engine.step(0.65);
        assert_eq!(step.commit, None);
        assert_eq!(step.mode, ScanMode::Slow);
    }
    assert_eq!(engine.state(), before);
}

#[rstest]
#[case(1.30, 1.0)]
#[case(-0.40, 0.0)]
fn commits_are_clamped_to_output_range(#[case] input: f64, #[case] clamped: f64) {
    let mut engine = settled_at(0.5);
    let mut commits = Vec::new();
    for _ in 0..400 {
        if let Some(c) = engine.step(input).commit {
            commits.push(c);
        }
    }
    assert!(commits.iter().all(|c| (0.0..=1.0).contains(&c.level)));
    assert_eq!(commits.last().map(|c| c.level), Some(clamped));
    // The engine itself still tracks the out-of-range value.
    assert!(engine.unstable_ema() > 1.0 || engine.unstable_ema() < 0.0);
}

#[test]
fn custom_range_clamps_commits() {
    let mut engine = FilterEngine::new(
        FilterCfg::default(),
        OutputRange { min: 0.1, max: 0.8 },
        0.5,
        0.5,
    );
    let step = engine.step(0.95);
    assert!(step.commit.is_some());
    for _ in 0..50 {
        engine.step(0.95);
    }
    let s = engine.step(0.0);
    assert_eq!(s.commit.map(|c| c.level <= 0.8 && c.level >= 0.1), Some(true));
}

#[test]
fn fresh_engine_tolerates_seed_far_from_committed_level() {
    // Sink at 20%, knob at 60%: the first sample is a disturbance.
    let mut engine = FilterEngine::new(FilterCfg::default(), OutputRange::default(), 0.6, 0.2);
    let step = engine.step(0.6);
    let commit = step.commit.expect("seed mismatch commits immediately");
    assert!((commit.level - 0.6).abs() < 1e-12);
    assert_eq!(step.mode, ScanMode::Fast);
}

#[test]
fn custom_intervals_follow_mode() {
    let cfg = FilterCfg {
        fast_interval: Duration::from_millis(3),
        slow_interval: Duration::from_millis(90),
        commit_threshold: 2,
        ..FilterCfg::default()
    };
    let mut engine = FilterEngine::new(cfg, OutputRange::default(), 0.5, 0.5);
    assert_eq!(engine.interval(), Duration::from_millis(90));
    assert_eq!(engine.step(0.9).interval, Duration::from_millis(3));
    let mut last = engine.step(engine.unstable_ema());
    while last.commit.is_none() || last.mode == ScanMode::Fast {
        last = engine.step(engine.unstable_ema());
    }
    assert_eq!(last.interval, Duration::from_millis(90));
}
