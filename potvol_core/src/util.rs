//! Small numeric helpers shared by the filter and the sampling loop.

/// Smoothing coefficient of an EMA with an effective window of `n` samples.
/// - `n` is clamped to at least 1, which yields alpha = 1 (no smoothing).
#[inline]
pub fn alpha_for_window(n: u32) -> f64 {
    2.0 / (f64::from(n.max(1)) + 1.0)
}

/// One EMA update: `alpha * x + (1 - alpha) * prev`.
#[inline]
pub fn ema_update(prev: f64, x: f64, alpha: f64) -> f64 {
    alpha * x + (1.0 - alpha) * prev
}
