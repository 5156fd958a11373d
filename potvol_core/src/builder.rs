//! Builder for the `Controller` that wires a source and a sink to the engine.
//!
//! `try_build()` validates the runtime configuration and reports missing
//! collaborators as typed `BuildError`s wrapped in an `eyre::Report`.

use potvol_traits::clock::{Clock, MonotonicClock};
use potvol_traits::{LevelSink, SampleSource};

use crate::config::{ActuationCfg, FilterCfg, SamplingCfg, StartupCfg};
use crate::error::{BuildError, Result};

/// Validated parameters of a controller run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerParams {
    pub filter: FilterCfg,
    pub sampling: SamplingCfg,
    pub actuation: ActuationCfg,
    pub startup: StartupCfg,
}

impl ControllerParams {
    pub fn validate(&self) -> std::result::Result<(), BuildError> {
        self.filter.check().map_err(BuildError::InvalidConfig)?;

        let s = &self.sampling;
        if !(s.remap.full_scale.is_finite() && s.remap.full_scale > 0.0) || !s.remap.offset.is_finite()
        {
            return Err(BuildError::InvalidConfig("remap constants must be finite, full scale > 0"));
        }
        if s.seed_reads == 0 || s.reads_per_sample == 0 {
            return Err(BuildError::InvalidConfig("read counts must be >= 1"));
        }

        let a = &self.actuation;
        if a.interval.is_zero() {
            return Err(BuildError::InvalidConfig("actuation interval must be non-zero"));
        }
        if !(a.range.min.is_finite() && a.range.max.is_finite()) || a.range.min >= a.range.max {
            return Err(BuildError::InvalidConfig("output range must satisfy min < max"));
        }

        if self.startup.retries == 0 {
            return Err(BuildError::InvalidConfig("startup retries must be >= 1"));
        }
        Ok(())
    }
}

/// Source, sink and parameters of one daemon run.
pub struct Controller<C: Clock = MonotonicClock> {
    pub(crate) source: Box<dyn SampleSource + Send>,
    pub(crate) sink: Box<dyn LevelSink + Send>,
    pub(crate) params: ControllerParams,
    pub(crate) clock: C,
}

impl<C: Clock> core::fmt::Debug for Controller<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Controller")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl Controller {
    /// Start building a Controller.
    pub fn builder() -> ControllerBuilder<MonotonicClock> {
        ControllerBuilder::default()
    }
}

impl<C: Clock> Controller<C> {
    pub fn params(&self) -> &ControllerParams {
        &self.params
    }
}

pub struct ControllerBuilder<C: Clock> {
    source: Option<Box<dyn SampleSource + Send>>,
    sink: Option<Box<dyn LevelSink + Send>>,
    params: ControllerParams,
    clock: C,
}

impl Default for ControllerBuilder<MonotonicClock> {
    fn default() -> Self {
        Self {
            source: None,
            sink: None,
            params: ControllerParams::default(),
            clock: MonotonicClock::new(),
        }
    }
}

impl<C: Clock> ControllerBuilder<C> {
    pub fn with_source(mut self, source: impl SampleSource + Send + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn with_sink(mut self, sink: impl LevelSink + Send + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn with_filter(mut self, filter: FilterCfg) -> Self {
        self.params.filter = filter;
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingCfg) -> Self {
        self.params.sampling = sampling;
        self
    }

    pub fn with_actuation(mut self, actuation: ActuationCfg) -> Self {
        self.params.actuation = actuation;
        self
    }

    pub fn with_startup(mut self, startup: StartupCfg) -> Self {
        self.params.startup = startup;
        self
    }

    pub fn with_params(mut self, params: ControllerParams) -> Self {
        self.params = params;
        self
    }

    /// Swap the clock driving both cadences and the startup wait.
    pub fn with_clock<C2: Clock>(self, clock: C2) -> ControllerBuilder<C2> {
        ControllerBuilder {
            source: self.source,
            sink: self.sink,
            params: self.params,
            clock,
        }
    }

    pub fn try_build(self) -> Result<Controller<C>> {
        let source = self.source.ok_or(BuildError::MissingSource)?;
        let sink = self.sink.ok_or(BuildError::MissingSink)?;
        self.params.validate()?;
        Ok(Controller {
            source,
            sink,
            params: self.params,
            clock: self.clock,
        })
    }
}
