//! Series indicators: simple moving averages, period-over-period change, rounding.

/// Window of the short moving average.
pub const MA_SHORT: usize = 50;
/// Window of the long moving average.
pub const MA_LONG: usize = 200;

/// Round half away from zero to 2 decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Simple moving average over a trailing window.
///
/// The output has one entry per input value. Entries before the window is
/// full are `None`; the first defined entry is at index `window - 1`.
/// A zero window yields all `None`.
pub fn sma(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }

    for i in (window - 1)..values.len() {
        let start = i + 1 - window;
        let sum: f64 = values[start..=i].iter().sum();
        out[i] = Some(sum / window as f64);
    }
    out
}

/// Percent change from the previous entry, rounded to 2 decimals.
///
/// The first entry is `None`, and so is any entry whose predecessor is zero.
pub fn pct_change(values: &[f64]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    for (i, value) in values.iter().enumerate() {
        if i == 0 {
            out.push(None);
            continue;
        }
        let prev = values[i - 1];
        if prev == 0.0 {
            out.push(None);
        } else {
            out.push(Some(round2(100.0 * (value - prev) / prev)));
        }
    }
    out
}
