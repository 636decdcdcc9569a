//! Shared windowing and smoothing primitives for indicator calculations.
//!
//! All functions return a vector of the same length as their input, with
//! `None` wherever the window or shift lacks history.

/// Lift a fully defined sequence into the `Option` representation.
pub fn defined(values: &[f64]) -> Vec<Option<f64>> {
    values.iter().copied().map(Some).collect()
}

/// Exponentially weighted mean, non-adjusted form.
///
/// Seeded with the first defined input: ema[s] = x[s], then
/// ema[i] = alpha * x[i] + (1 - alpha) * ema[i-1]. Positions before the seed
/// are undefined; an undefined input after the seed carries the previous mean.
pub fn ewm(values: &[Option<f64>], alpha: f64) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut prev: Option<f64> = None;

    for value in values {
        let next = match (prev, *value) {
            (None, x) => x,
            (Some(p), Some(x)) => Some(alpha * x + (1.0 - alpha) * p),
            (Some(p), None) => Some(p),
        };
        out.push(next);
        prev = next;
    }

    out
}

/// Trailing mean over exactly `window` entries ending at each index.
/// Undefined until the window is full or while any entry in it is undefined.
pub fn rolling_mean(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }

    for (start, slice) in values.windows(window).enumerate() {
        let sum: Option<f64> = slice.iter().copied().sum();
        out[start + window - 1] = sum.map(|s| s / window as f64);
    }

    out
}

pub fn rolling_max(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().copied().fold(f64::NEG_INFINITY, f64::max))
}

pub fn rolling_min(values: &[f64], window: usize) -> Vec<Option<f64>> {
    rolling(values, window, |w| w.iter().copied().fold(f64::INFINITY, f64::min))
}

fn rolling<F>(values: &[f64], window: usize, reduce: F) -> Vec<Option<f64>>
where
    F: Fn(&[f64]) -> f64,
{
    let mut out = vec![None; values.len()];
    if window == 0 {
        return out;
    }

    for (start, slice) in values.windows(window).enumerate() {
        out[start + window - 1] = Some(reduce(slice));
    }

    out
}

/// Positional shift. A positive offset moves values later in time
/// (out[i + offset] = values[i]); a negative offset pulls future values back
/// (out[i] = values[i - offset]). Vacated positions are undefined.
pub fn shift(values: &[Option<f64>], offset: isize) -> Vec<Option<f64>> {
    let n = values.len();
    let mut out = vec![None; n];
    let magnitude = offset.unsigned_abs();
    if magnitude >= n {
        return out;
    }

    if offset >= 0 {
        out[magnitude..].copy_from_slice(&values[..n - magnitude]);
    } else {
        out[..n - magnitude].copy_from_slice(&values[magnitude..]);
    }

    out
}

/// Element-wise combination of two aligned sequences; undefined if either side is.
pub fn zip_with<F>(a: &[Option<f64>], b: &[Option<f64>], f: F) -> Vec<Option<f64>>
where
    F: Fn(f64, f64) -> f64,
{
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(f(*x, *y)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn ewm_seeds_with_first_value() {
        let out = ewm(&defined(&[10.0, 20.0, 30.0]), 0.5);
        assert_eq!(out[0], Some(10.0));
        assert_eq!(out[1], Some(15.0));
        assert_eq!(out[2], Some(22.5));
    }

    #[test]
    fn ewm_skips_leading_undefined() {
        let out = ewm(&[None, None, Some(4.0), Some(8.0)], 0.25);
        assert_eq!(out[0], None);
        assert_eq!(out[1], None);
        assert_eq!(out[2], Some(4.0));
        assert_abs_diff_eq!(out[3].unwrap(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn ewm_carries_through_gap() {
        let out = ewm(&[Some(4.0), None, Some(8.0)], 0.5);
        assert_eq!(out[1], Some(4.0));
        assert_eq!(out[2], Some(6.0));
    }

    #[test]
    fn rolling_mean_requires_full_window() {
        let out = rolling_mean(&defined(&[1.0, 2.0, 3.0, 4.0]), 3);
        assert_eq!(out, vec![None, None, Some(2.0), Some(3.0)]);
    }

    #[test]
    fn rolling_mean_propagates_undefined() {
        let out = rolling_mean(&[None, Some(2.0), Some(4.0), Some(6.0)], 2);
        assert_eq!(out, vec![None, None, Some(3.0), Some(5.0)]);
    }

    #[test]
    fn rolling_mean_window_longer_than_input() {
        let out = rolling_mean(&defined(&[1.0, 2.0]), 5);
        assert_eq!(out, vec![None, None]);
    }

    #[test]
    fn rolling_extremes() {
        let values = [3.0, 1.0, 4.0, 1.0, 5.0];
        assert_eq!(
            rolling_max(&values, 2),
            vec![None, Some(3.0), Some(4.0), Some(4.0), Some(5.0)]
        );
        assert_eq!(
            rolling_min(&values, 3),
            vec![None, None, Some(1.0), Some(1.0), Some(1.0)]
        );
    }

    #[test]
    fn rolling_zero_window_is_undefined() {
        assert_eq!(rolling_max(&[1.0, 2.0], 0), vec![None, None]);
        assert_eq!(rolling_mean(&defined(&[1.0, 2.0]), 0), vec![None, None]);
    }

    #[test]
    fn shift_forward_and_backward() {
        let values = defined(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(shift(&values, 2), vec![None, None, Some(1.0), Some(2.0)]);
        assert_eq!(shift(&values, -1), vec![Some(2.0), Some(3.0), Some(4.0), None]);
        assert_eq!(shift(&values, 0), values);
    }

    #[test]
    fn shift_beyond_length_is_all_undefined() {
        let values = defined(&[1.0, 2.0]);
        assert_eq!(shift(&values, 2), vec![None, None]);
        assert_eq!(shift(&values, -5), vec![None, None]);
    }

    #[test]
    fn zip_with_requires_both_sides() {
        let out = zip_with(&[Some(1.0), None, Some(3.0)], &[Some(1.0), Some(2.0), None], |a, b| a + b);
        assert_eq!(out, vec![Some(2.0), None, None]);
    }
}
