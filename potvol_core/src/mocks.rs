//! Test and helper mocks for potvol_core

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use potvol_traits::{ApplyCallback, BoxError, LevelSink, SampleSource};

/// A source that replays a script of reads and then repeats the last entry.
pub struct ScriptedSource {
    script: VecDeque<Result<u16, &'static str>>,
    last: Result<u16, &'static str>,
}

impl ScriptedSource {
    pub fn new(script: Vec<Result<u16, &'static str>>) -> Self {
        Self {
            script: script.into(),
            last: Err("script exhausted"),
        }
    }

    /// A source that always reads `raw`.
    pub fn constant(raw: u16) -> Self {
        Self::new(vec![Ok(raw)])
    }
}

impl SampleSource for ScriptedSource {
    fn read_raw(&mut self) -> Result<u16, BoxError> {
        if let Some(next) = self.script.pop_front() {
            self.last = next;
        }
        self.last.map_err(|msg| Box::new(std::io::Error::other(msg)) as BoxError)
    }
}

/// A source whose reading can be changed from another thread.
#[derive(Clone, Default)]
pub struct SharedSource {
    raw: Arc<Mutex<u16>>,
}

impl SharedSource {
    pub fn new(raw: u16) -> Self {
        Self {
            raw: Arc::new(Mutex::new(raw)),
        }
    }

    pub fn set(&self, raw: u16) {
        if let Ok(mut g) = self.raw.lock() {
            *g = raw;
        }
    }
}

impl SampleSource for SharedSource {
    fn read_raw(&mut self) -> Result<u16, BoxError> {
        self.raw
            .lock()
            .map(|g| *g)
            .map_err(|_| "shared source poisoned".into())
    }
}

/// A sink that records every apply and completes it synchronously.
#[derive(Clone, Default)]
pub struct RecordingSink {
    applied: Arc<Mutex<Vec<u32>>>,
    initial: Option<u32>,
    fail: bool,
}

impl RecordingSink {
    /// Sink that reports `initial` as its current volume.
    pub fn new(initial: Option<u32>) -> Self {
        Self {
            applied: Arc::new(Mutex::new(Vec::new())),
            initial,
            fail: false,
        }
    }

    /// Sink whose applies all report failure.
    pub fn failing(initial: Option<u32>) -> Self {
        Self {
            fail: true,
            ..Self::new(initial)
        }
    }

    /// Every native volume applied so far, oldest first.
    pub fn applied(&self) -> Vec<u32> {
        self.applied.lock().map(|g| g.clone()).unwrap_or_default()
    }
}

impl LevelSink for RecordingSink {
    fn apply_async(&self, volume: u32, on_result: ApplyCallback) {
        if let Ok(mut g) = self.applied.lock() {
            g.push(volume);
        }
        if self.fail {
            on_result(Err("sink rejected volume".into()));
        } else {
            on_result(Ok(()));
        }
    }

    fn initial_state(&self) -> Option<u32> {
        self.initial
    }
}
