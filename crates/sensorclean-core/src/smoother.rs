//! Adaptive local polynomial (Savitzky-Golay style) smoothing.
//!
//! The window length is derived from the series length: the longest odd
//! window that fits (`n` or `n - 1`), never below the configured minimum.
//! For short and mid-sized batches this means one polynomial is fitted to
//! (almost) the whole series. That is coarse smoothing, and it is the
//! behavior downstream consumers expect.
//!
//! Positions closer than half a window to either end are evaluated from the
//! polynomial fitted to the first or last full window. Missing entries are
//! left out of the fit and receive the fitted value.

/// Effective window for a series of `n` samples, or `None` when the series is
/// too short to smooth.
pub fn effective_window(n: usize, min_window: usize) -> Option<usize> {
    if n < min_window {
        return None;
    }
    let window = if n % 2 == 1 { n } else { n - 1 };
    Some(window.max(min_window))
}

/// Smooths `values` with a degree-`poly_order` local least-squares fit.
///
/// Returns the input unchanged when it is shorter than `min_window`.
pub fn smooth(values: &[Option<f64>], min_window: usize, poly_order: usize) -> Vec<Option<f64>> {
    let n = values.len();
    let Some(window) = effective_window(n, min_window) else {
        return values.to_vec();
    };
    let half = window / 2;
    let mut output = values.to_vec();

    // Leading edge and the first center share one fit over [0, window).
    fill_from_fit(values, &mut output, 0, window, 0..half, poly_order);

    for center in half..n - half {
        fill_from_fit(
            values,
            &mut output,
            center - half,
            window,
            center..center + 1,
            poly_order,
        );
    }

    fill_from_fit(values, &mut output, n - window, window, n - half..n, poly_order);

    output
}

/// Fits the polynomial over `values[start..start + window]` and writes its
/// value at each index of `targets`. Leaves `output` untouched when the window
/// holds too few present points for the requested degree.
fn fill_from_fit(
    values: &[Option<f64>],
    output: &mut [Option<f64>],
    start: usize,
    window: usize,
    targets: std::ops::Range<usize>,
    poly_order: usize,
) {
    if targets.is_empty() {
        return;
    }

    let center = start as f64 + (window as f64 - 1.0) / 2.0;
    let scale = ((window - 1) as f64 / 2.0).max(1.0);
    let scaled = |idx: usize| (idx as f64 - center) / scale;

    let points: Vec<(f64, f64)> = values[start..start + window]
        .iter()
        .enumerate()
        .filter_map(|(offset, value)| value.map(|v| (scaled(start + offset), v)))
        .collect();

    let Some(coefficients) = fit_polynomial(&points, poly_order) else {
        return;
    };

    for idx in targets {
        output[idx] = Some(evaluate(&coefficients, scaled(idx)));
    }
}

/// Least-squares polynomial coefficients (constant term first) through the
/// normal equations. `None` when there are not enough points to pin the
/// requested degree.
pub fn fit_polynomial(points: &[(f64, f64)], order: usize) -> Option<Vec<f64>> {
    let terms = order + 1;
    if points.len() < terms {
        return None;
    }

    let mut normal = vec![vec![0.0; terms]; terms];
    let mut rhs = vec![0.0; terms];
    let mut powers = vec![1.0; terms];

    for &(x, y) in points {
        for k in 1..terms {
            powers[k] = powers[k - 1] * x;
        }
        for row in 0..terms {
            rhs[row] += powers[row] * y;
            for col in 0..terms {
                normal[row][col] += powers[row] * powers[col];
            }
        }
    }

    solve_linear_system(normal, rhs)
}

/// Gaussian elimination with partial pivoting.
fn solve_linear_system(mut matrix: Vec<Vec<f64>>, mut rhs: Vec<f64>) -> Option<Vec<f64>> {
    const PIVOT_EPSILON: f64 = 1e-12;
    let size = rhs.len();

    for col in 0..size {
        let pivot_row =
            (col..size).max_by(|&a, &b| matrix[a][col].abs().total_cmp(&matrix[b][col].abs()))?;
        if matrix[pivot_row][col].abs() < PIVOT_EPSILON {
            return None;
        }
        matrix.swap(col, pivot_row);
        rhs.swap(col, pivot_row);

        for row in col + 1..size {
            let factor = matrix[row][col] / matrix[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..size {
                matrix[row][k] -= factor * matrix[col][k];
            }
            rhs[row] -= factor * rhs[col];
        }
    }

    let mut solution = vec![0.0; size];
    for row in (0..size).rev() {
        let tail: f64 = (row + 1..size)
            .map(|k| matrix[row][k] * solution[k])
            .sum();
        solution[row] = (rhs[row] - tail) / matrix[row][row];
    }
    Some(solution)
}

fn evaluate(coefficients: &[f64], x: f64) -> f64 {
    coefficients
        .iter()
        .rev()
        .fold(0.0, |acc, coefficient| acc * x + coefficient)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quadratic_is_recovered_exactly() {
        let points: Vec<(f64, f64)> = (-3..=3)
            .map(|i| {
                let x = i as f64;
                (x, 1.0 + 2.0 * x - 0.5 * x * x)
            })
            .collect();
        let coefficients = fit_polynomial(&points, 2).unwrap();
        assert!((coefficients[0] - 1.0).abs() < 1e-9);
        assert!((coefficients[1] - 2.0).abs() < 1e-9);
        assert!((coefficients[2] + 0.5).abs() < 1e-9);
    }

    #[test]
    fn pivoting_handles_a_zero_leading_entry() {
        let matrix = vec![vec![0.0, 2.0], vec![4.0, 1.0]];
        let solution = solve_linear_system(matrix, vec![6.0, 11.0]).unwrap();
        assert!((solution[0] - 2.0).abs() < 1e-12);
        assert!((solution[1] - 3.0).abs() < 1e-12);

        let singular = vec![vec![1.0, 2.0], vec![2.0, 4.0]];
        assert!(solve_linear_system(singular, vec![1.0, 2.0]).is_none());
    }

    #[test]
    fn too_few_points_gives_no_fit() {
        assert!(fit_polynomial(&[(0.0, 1.0), (1.0, 2.0)], 2).is_none());
    }

    #[test]
    fn matches_classic_seven_point_center_weight() {
        // Savitzky-Golay 7-point quadratic weights are [-2, 3, 6, 7, 6, 3, -2] / 21.
        let impulse: Vec<Option<f64>> = (0..7)
            .map(|i| Some(if i == 3 { 21.0 } else { 0.0 }))
            .collect();
        let smoothed = smooth(&impulse, 7, 2);
        assert!((smoothed[3].unwrap() - 7.0).abs() < 1e-9);
    }

    #[test]
    fn window_follows_series_length() {
        assert_eq!(effective_window(6, 7), None);
        assert_eq!(effective_window(7, 7), Some(7));
        assert_eq!(effective_window(8, 7), Some(7));
        assert_eq!(effective_window(9, 7), Some(9));
        assert_eq!(effective_window(20, 7), Some(19));
    }
}
