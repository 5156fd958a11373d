//! Maps `Box<dyn Error>` from trait boundaries to typed `PotvolError`.
//!
//! The traits in `potvol_traits` use `Box<dyn Error + Send + Sync>` so that
//! backends stay free in their error types; this module converts those to our
//! typed error enum, with an optional feature-gated path for
//! `potvol_hardware::HwError` downcasting.

use crate::error::PotvolError;

/// Map a sample-source error to a typed `PotvolError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_source_error(e: &(dyn std::error::Error + 'static)) -> PotvolError {
    // Feature-gated: try to downcast to HwError for precise mapping
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<potvol_hardware::error::HwError>() {
            return match hw {
                potvol_hardware::error::HwError::Io(io)
                    if io.kind() == std::io::ErrorKind::NotFound =>
                {
                    PotvolError::SensorUnavailable(hw.to_string())
                }
                other => PotvolError::Sensor(other.to_string()),
            };
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("no such file") {
        PotvolError::SensorUnavailable(s)
    } else {
        PotvolError::Sensor(s)
    }
}

/// Map a sink-side failure reported through an apply callback.
pub fn map_sink_error(e: &(dyn std::error::Error + 'static)) -> PotvolError {
    PotvolError::Sink(e.to_string())
}
