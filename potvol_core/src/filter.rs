//! Two-tier EMA filter and stability state machine.
//!
//! A fast EMA tracks the knob closely and is committed as soon as it leaves
//! the noise band around the last committed level, so active adjustment feels
//! immediate. Once the fast EMA stays inside the band, a slow EMA seeded at
//! the moment of the last disturbance accumulates for `commit_threshold`
//! samples and is committed once, which gives a clean resting value.
//!
//! Every adjustment therefore produces two kinds of commits: a rough
//! [`CommitKind::Unstable`] one per disturbed cycle and a single
//! [`CommitKind::Stable`] one when the knob has settled.

use std::time::Duration;

use crate::config::FilterCfg;
use crate::level::OutputRange;
use crate::util::ema_update;

/// Scan rate selected by the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// The knob is moving.
    Fast,
    /// Settled; the stable level has been committed.
    Slow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    Unstable,
    Stable,
}

/// A level to write into the target register, already clamped to the output range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Commit {
    pub level: f64,
    pub kind: CommitKind,
}

/// Outcome of one filter cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterStep {
    pub commit: Option<Commit>,
    pub mode: ScanMode,
    /// Interval to sleep before the next sample.
    pub interval: Duration,
}

/// Snapshot of the filter's internal state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterState {
    pub unstable_ema: f64,
    pub stable_ema: f64,
    /// In-band samples since the last disturbance; `commit_threshold + 1`
    /// once the stable level has been committed.
    pub stability: u32,
    /// Last committed level before output clamping.
    pub committed: f64,
    pub mode: ScanMode,
}

#[derive(Debug, Clone)]
pub struct FilterEngine {
    cfg: FilterCfg,
    range: OutputRange,
    state: FilterState,
}

impl FilterEngine {
    /// Engine seeded at startup.
    ///
    /// `seed` is the burst-averaged sensor level, `committed` the level the
    /// sink reported. The engine starts settled (nothing pending) in slow mode.
    pub fn new(cfg: FilterCfg, range: OutputRange, seed: f64, committed: f64) -> Self {
        let committed = if committed.is_finite() { committed } else { 0.0 };
        let seed = if seed.is_finite() { seed } else { committed };
        let stability = cfg.commit_threshold.saturating_add(1);
        Self {
            cfg,
            range,
            state: FilterState {
                unstable_ema: seed,
                stable_ema: seed,
                stability,
                committed,
                mode: ScanMode::Slow,
            },
        }
    }

    /// Resume from an explicit state snapshot.
    pub fn from_state(cfg: FilterCfg, range: OutputRange, state: FilterState) -> Self {
        Self { cfg, range, state }
    }

    pub fn state(&self) -> FilterState {
        self.state
    }

    pub fn unstable_ema(&self) -> f64 {
        self.state.unstable_ema
    }

    pub fn stable_ema(&self) -> f64 {
        self.state.stable_ema
    }

    pub fn stability(&self) -> u32 {
        self.state.stability
    }

    pub fn mode(&self) -> ScanMode {
        self.state.mode
    }

    /// True once the stable level of the current episode has been committed.
    pub fn is_settled(&self) -> bool {
        self.state.stability > self.cfg.commit_threshold
    }

    /// Interval the sampling loop should sleep before the next sample.
    pub fn interval(&self) -> Duration {
        match self.state.mode {
            ScanMode::Fast => self.cfg.fast_interval,
            ScanMode::Slow => self.cfg.slow_interval,
        }
    }

    /// Feed one normalized sample.
    pub fn step(&mut self, val: f64) -> FilterStep {
        if !val.is_finite() {
            tracing::warn!(val, "ignoring non-finite sample");
            return self.outcome(None);
        }

        let st = &mut self.state;
        st.unstable_ema = ema_update(st.unstable_ema, val, self.cfg.fast_alpha);
        let delta = (st.unstable_ema - st.committed).abs();

        if delta >= self.cfg.noise_band {
            st.mode = ScanMode::Fast;
            st.stability = 0;
            st.stable_ema = st.unstable_ema;
            st.committed = st.unstable_ema;
            let commit = Commit {
                level: self.range.clamp(st.unstable_ema),
                kind: CommitKind::Unstable,
            };
            return self.outcome(Some(commit));
        }

        if st.stability >= self.cfg.commit_threshold {
            return self.outcome(None);
        }

        st.stability += 1;
        st.stable_ema = ema_update(st.stable_ema, val, self.cfg.stable_alpha);
        if st.stability < self.cfg.commit_threshold {
            return self.outcome(None);
        }

        // Threshold reached: bump into the committed zone so this fires once.
        st.stability += 1;
        st.mode = ScanMode::Slow;
        st.committed = st.stable_ema;
        let commit = Commit {
            level: self.range.clamp(st.stable_ema),
            kind: CommitKind::Stable,
        };
        self.outcome(Some(commit))
    }

    fn outcome(&self, commit: Option<Commit>) -> FilterStep {
        FilterStep {
            commit,
            mode: self.state.mode,
            interval: self.interval(),
        }
    }
}
