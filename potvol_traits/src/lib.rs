//! Collaborator interfaces for the potvol engine.
//!
//! The engine only ever talks to the outside world through these traits: a
//! blocking raw sensor read, and an asynchronous "set volume" on the output
//! sink. Errors at these boundaries are boxed so that backends stay free to
//! use whatever error types they like.
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Boxed error crossing a collaborator boundary.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Completion callback for [`LevelSink::apply_async`]. Must not block.
pub type ApplyCallback = Box<dyn FnOnce(Result<(), BoxError>) + Send + 'static>;

pub trait SampleSource {
    /// One blocking hardware read in the converter's native range.
    fn read_raw(&mut self) -> Result<u16, BoxError>;
}

impl<T: SampleSource + ?Sized> SampleSource for Box<T> {
    fn read_raw(&mut self) -> Result<u16, BoxError> {
        (**self).read_raw()
    }
}

pub trait LevelSink {
    /// Fire-and-forget request to set the sink to `volume` (native encoding).
    ///
    /// `on_result` runs once the sink has accepted or rejected the request,
    /// possibly on another thread.
    fn apply_async(&self, volume: u32, on_result: ApplyCallback);

    /// Current native volume of the first channel, if the sink has reported it.
    fn initial_state(&self) -> Option<u32>;
}

impl<T: LevelSink + ?Sized> LevelSink for std::sync::Arc<T> {
    fn apply_async(&self, volume: u32, on_result: ApplyCallback) {
        (**self).apply_async(volume, on_result)
    }

    fn initial_state(&self) -> Option<u32> {
        (**self).initial_state()
    }
}

impl<T: LevelSink + ?Sized> LevelSink for Box<T> {
    fn apply_async(&self, volume: u32, on_result: ApplyCallback) {
        (**self).apply_async(volume, on_result)
    }

    fn initial_state(&self) -> Option<u32> {
        (**self).initial_state()
    }
}
