//! Simulated knob and sink, used by `--sim` runs and tests.

use std::sync::atomic::{AtomicU16, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use potvol_traits::{ApplyCallback, BoxError, LevelSink, SampleSource};

use crate::SinkReport;

/// Handle used to turn the simulated knob from another thread.
#[derive(Debug, Clone)]
pub struct SimKnob {
    position: Arc<AtomicU16>,
}

impl SimKnob {
    pub fn set(&self, raw: u16) {
        self.position.store(raw.min(1023), Ordering::Relaxed);
    }

    pub fn get(&self) -> u16 {
        self.position.load(Ordering::Relaxed)
    }
}

/// A 10-bit pot with a small deterministic jitter on every read.
#[derive(Debug)]
pub struct SimulatedSource {
    knob: SimKnob,
    jitter: u16,
    tick: u32,
}

impl SimulatedSource {
    pub fn new(raw: u16, jitter: u16) -> Self {
        let knob = SimKnob {
            position: Arc::new(AtomicU16::new(raw.min(1023))),
        };
        Self {
            knob,
            jitter,
            tick: 0,
        }
    }

    pub fn knob(&self) -> SimKnob {
        self.knob.clone()
    }
}

impl SampleSource for SimulatedSource {
    fn read_raw(&mut self) -> Result<u16, BoxError> {
        let base = self.knob.get();
        self.tick = self.tick.wrapping_add(1);
        let raw = match self.tick % 4 {
            1 => base.saturating_add(self.jitter).min(1023),
            3 => base.saturating_sub(self.jitter),
            _ => base,
        };
        Ok(raw)
    }
}

/// In-memory sink that accepts every volume immediately.
#[derive(Debug, Clone)]
pub struct SimulatedSink {
    volume: Arc<AtomicU32>,
    applied: Arc<AtomicU64>,
    channels: u8,
    history: Arc<Mutex<Vec<u32>>>,
}

impl SimulatedSink {
    pub fn new(volume: u32, channels: u8) -> Self {
        Self {
            volume: Arc::new(AtomicU32::new(volume)),
            applied: Arc::new(AtomicU64::new(0)),
            channels: channels.max(1),
            history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn volume(&self) -> u32 {
        self.volume.load(Ordering::Relaxed)
    }

    pub fn applied_count(&self) -> u64 {
        self.applied.load(Ordering::Relaxed)
    }

    pub fn history(&self) -> Vec<u32> {
        self.history.lock().map(|g| g.clone()).unwrap_or_default()
    }

    pub fn report(&self) -> SinkReport {
        SinkReport {
            muted: false,
            volumes: vec![self.volume(); usize::from(self.channels)],
        }
    }
}

impl LevelSink for SimulatedSink {
    fn apply_async(&self, volume: u32, on_result: ApplyCallback) {
        self.volume.store(volume, Ordering::Relaxed);
        self.applied.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut h) = self.history.lock() {
            h.push(volume);
        }
        tracing::info!(volume, "sim sink volume set");
        on_result(Ok(()));
    }

    fn initial_state(&self) -> Option<u32> {
        Some(self.volume())
    }
}
