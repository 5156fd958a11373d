//! Level arithmetic: ADC remap, output range, and the sink's native volume scale.

/// Native volume of a sink channel at 100% (PulseAudio `PA_VOLUME_NORM`).
pub const VOLUME_NORM: u32 = 0x10000;
/// Native volume of a muted channel.
pub const VOLUME_MUTED: u32 = 0;
/// Largest native volume the sink accepts (`PA_VOLUME_MAX`).
pub const VOLUME_MAX: u32 = u32::MAX / 2;

/// Fixed linear map from averaged raw counts to a normalized level.
///
/// With the stock constants a 10-bit converter spans roughly -0.01 ..= 1.01,
/// so both ends of the pot travel reliably reach the clamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Remap {
    pub full_scale: f64,
    pub offset: f64,
}

impl Default for Remap {
    fn default() -> Self {
        Self {
            full_scale: 1002.9,
            offset: -0.01,
        }
    }
}

impl Remap {
    #[inline]
    pub fn to_level(&self, mean_raw: f64) -> f64 {
        mean_raw / self.full_scale + self.offset
    }

    /// Raw value that maps onto `level`; handy for building test inputs.
    #[inline]
    pub fn to_raw(&self, level: f64) -> f64 {
        (level - self.offset) * self.full_scale
    }
}

/// Valid range of committed levels. Applied when a level is committed,
/// never to intermediate filter values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputRange {
    pub min: f64,
    pub max: f64,
}

impl Default for OutputRange {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl OutputRange {
    #[inline]
    pub fn clamp(&self, level: f64) -> f64 {
        level.clamp(self.min, self.max)
    }
}

/// Encoding of a normalized level on the sink side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VolumeMap {
    /// PulseAudio software volume: native = cbrt(level) * NORM.
    #[default]
    Cubic,
    Linear,
}

impl VolumeMap {
    /// Convert a level into native volume: muted at or below 0, NORM at or above 1.
    pub fn to_native(self, level: f64) -> u32 {
        if level.is_nan() || level <= 0.0 {
            return VOLUME_MUTED;
        }
        if level >= 1.0 {
            return VOLUME_NORM;
        }
        let scaled = match self {
            Self::Cubic => level.cbrt(),
            Self::Linear => level,
        } * f64::from(VOLUME_NORM);
        // 0 < scaled < NORM here.
        scaled.round() as u32
    }

    /// Convert native volume back into a level.
    pub fn to_level(self, native: u32) -> f64 {
        let ratio = f64::from(native.min(VOLUME_MAX)) / f64::from(VOLUME_NORM);
        match self {
            Self::Cubic => ratio * ratio * ratio,
            Self::Linear => ratio,
        }
    }
}
