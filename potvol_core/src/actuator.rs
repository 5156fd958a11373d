//! Actuation worker: applies committed targets to the sink at a fixed cadence.
//!
//! Runs on its own thread, independent of the sampling interval. Each poll
//! copies the target out of the register and, only when it differs from the
//! last applied level, issues one asynchronous apply. Completion is reported
//! through a callback that logs failures and counts them; there are no
//! retries, the next change of target produces a fresh apply.
//!
//! The thread is stopped and joined when the [`ActuationHandle`] is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use potvol_traits::{BoxError, Clock, LevelSink};

use crate::hw_error::map_sink_error;
use crate::level::VolumeMap;
use crate::register::TargetRegister;

pub struct ActuationWorker<K: LevelSink> {
    register: Arc<TargetRegister>,
    sink: K,
    volume_map: VolumeMap,
    applied: f64,
    issued: u64,
    failures: Arc<AtomicU64>,
}

impl<K: LevelSink> ActuationWorker<K> {
    /// `applied` is the level the sink is already known to be at.
    pub fn new(register: Arc<TargetRegister>, sink: K, volume_map: VolumeMap, applied: f64) -> Self {
        Self {
            register,
            sink,
            volume_map,
            applied,
            issued: 0,
            failures: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Last level handed to the sink.
    pub fn applied(&self) -> f64 {
        self.applied
    }

    /// Number of apply calls issued so far.
    pub fn issued(&self) -> u64 {
        self.issued
    }

    /// Failed applies reported back by the sink so far.
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// One actuation cycle. Returns the native volume when an apply was issued.
    pub fn poll_once(&mut self) -> Option<u32> {
        let target = self.register.read();
        if target == self.applied {
            return None;
        }
        self.applied = target;

        let volume = self.volume_map.to_native(target);
        let failures = self.failures.clone();
        self.sink.apply_async(
            volume,
            Box::new(move |res: Result<(), BoxError>| {
                if let Err(e) = res {
                    failures.fetch_add(1, Ordering::Relaxed);
                    let err = map_sink_error(&*e);
                    tracing::warn!(error = %err, volume, "failed to set volume");
                }
            }),
        );
        self.issued += 1;
        tracing::debug!(volume_pct = 100.0 * target, volume, "volume set");
        Some(volume)
    }

    /// Move the worker onto its own thread, polling every `interval`.
    ///
    /// Fails only if the OS refuses to create the thread.
    pub fn spawn<C: Clock + Send + 'static>(
        self,
        interval: Duration,
        clock: C,
    ) -> std::io::Result<ActuationHandle>
    where
        K: Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let failures = self.failures.clone();
        let issued = Arc::new(AtomicU64::new(0));
        let issued_clone = issued.clone();
        let mut worker = self;

        let join_handle = std::thread::Builder::new()
            .name("potvol-actuator".into())
            .spawn(move || {
                loop {
                    if shutdown_clone.load(Ordering::Relaxed) {
                        tracing::debug!("Actuation thread received shutdown signal");
                        break;
                    }
                    if worker.poll_once().is_some() {
                        issued_clone.store(worker.issued(), Ordering::Relaxed);
                    }
                    clock.sleep(interval);
                }
                tracing::trace!("Actuation thread exiting cleanly");
            })?;

        Ok(ActuationHandle {
            shutdown,
            join_handle: Some(join_handle),
            failures,
            issued,
        })
    }
}

/// Owner of a running actuation thread.
pub struct ActuationHandle {
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
    failures: Arc<AtomicU64>,
    issued: Arc<AtomicU64>,
}

impl ActuationHandle {
    pub fn is_running(&self) -> bool {
        self.join_handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }

    /// Stop and join the thread, then report its final counters.
    pub fn stop(mut self) -> ActuationReport {
        self.shutdown_and_join();
        ActuationReport {
            issued: self.issued(),
            failures: self.failures(),
        }
    }

    fn shutdown_and_join(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        // The thread exits after at most one cadence sleep.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("Actuation thread joined successfully");
                }
                Err(e) => {
                    tracing::warn!(?e, "Actuation thread panicked during shutdown");
                }
            }
        }
    }
}

/// Final counters of a stopped actuation thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuationReport {
    pub issued: u64,
    pub failures: u64,
}

impl Drop for ActuationHandle {
    fn drop(&mut self) {
        self.shutdown_and_join();
    }
}
