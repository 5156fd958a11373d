#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Signal-conditioning and dual-rate scheduling engine (hardware-agnostic).
//!
//! This crate turns noisy potentiometer readings into a stable volume target.
//! All hardware interactions go through `potvol_traits::SampleSource` and
//! `potvol_traits::LevelSink`.
//!
//! ## Architecture
//!
//! - **Filter**: fast/stable EMAs and the stability state machine (`filter`)
//! - **Register**: last-write-wins hand-off between threads (`register`)
//! - **Actuation**: fixed-cadence worker applying targets to the sink (`actuator`)
//! - **Sampling**: the driving loop with adaptive scan interval (`sampling`)
//! - **Runner**: startup barrier, seeding and orchestration (`runner`)
//!
//! The sampling loop and the actuation worker only share the
//! [`register::TargetRegister`]; the filter state never leaves the sampling thread.

pub mod actuator;
pub mod builder;
pub mod config;
pub mod conversions;
pub mod error;
pub mod filter;
pub mod hw_error;
pub mod level;
pub mod mocks;
pub mod register;
pub mod runner;
pub mod sampling;
pub mod util;

pub use actuator::{ActuationHandle, ActuationReport, ActuationWorker};
pub use builder::{Controller, ControllerBuilder, ControllerParams};
pub use config::{ActuationCfg, FilterCfg, ReadErrorPolicy, SamplingCfg, StartupCfg};
pub use error::{BuildError, PotvolError};
pub use filter::{Commit, CommitKind, FilterEngine, FilterState, FilterStep, ScanMode};
pub use level::{OutputRange, Remap, VOLUME_MUTED, VOLUME_NORM, VolumeMap};
pub use register::TargetRegister;
pub use runner::{RunSummary, wait_initial_level};
pub use sampling::{AveragedRead, LoopStats, SamplingLoop, read_averaged};
