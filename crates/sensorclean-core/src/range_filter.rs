/// Marks readings outside `[low, high]` as missing.
///
/// Bounds are inclusive. Non-finite readings are missing as well, so NaN never
/// reaches the numeric stages. Already-missing entries stay missing and no
/// position is removed.
pub fn apply_range_filter(values: &[Option<f64>], low: f64, high: f64) -> Vec<Option<f64>> {
    values
        .iter()
        .map(|value| value.filter(|v| v.is_finite() && *v >= low && *v <= high))
        .collect()
}
