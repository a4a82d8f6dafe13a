//! Median-based spike correction.
//!
//! A centered rolling median is taken over `window` samples. At the ends of
//! the series the window is truncated to the samples that exist, so the
//! reference curve is defined at every index. Missing entries are ignored
//! inside a window; a window with nothing present yields a missing median.
//! An even count of present values resolves to the mean of the two middle
//! values.

/// Centered rolling median with a truncated window at the series edges.
pub fn rolling_median(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let half = window / 2;
    let mut scratch: Vec<f64> = Vec::with_capacity(window);

    (0..n)
        .map(|idx| {
            let start = idx.saturating_sub(half);
            let end = (idx + half).min(n - 1);
            scratch.clear();
            scratch.extend(values[start..=end].iter().flatten().copied());
            median(&mut scratch)
        })
        .collect()
}

/// Median of the slice, reordering it in place. `None` when empty.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Replaces spikes and gaps with the local median.
///
/// A present value further than `threshold` from its median is replaced by
/// the median, and a missing value takes the median (which may itself be
/// missing). Every other value passes through untouched.
///
/// A series shorter than `window` is returned unchanged: the median reference
/// is not defined for it.
pub fn despike(values: &[Option<f64>], window: usize, threshold: f64) -> Vec<Option<f64>> {
    if values.len() < window {
        return values.to_vec();
    }

    let medians = rolling_median(values, window);
    values
        .iter()
        .zip(medians)
        .map(|(value, median)| match (*value, median) {
            (Some(v), Some(m)) if (v - m).abs() > threshold => Some(m),
            (Some(v), _) => Some(v),
            (None, m) => m,
        })
        .collect()
}
