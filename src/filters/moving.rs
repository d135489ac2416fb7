use crate::error::Result;
use crate::filters::window::SlidingWindow;

/// One average per input sample, taken after the sample enters the window.
/// The first `window - 1` outputs still include part of the `seed`.
pub fn moving_average(values: &[f64], window: usize, seed: f64) -> Result<Vec<f64>> {
    let mut acc = SlidingWindow::new(window, seed)?;
    Ok(values
        .iter()
        .map(|&v| {
            acc.push(v);
            acc.mean()
        })
        .collect())
}

/// Sample variance (divisor `window - 1`) over a sliding window.
pub fn moving_variance(values: &[f64], window: usize, seed: f64) -> Result<Vec<f64>> {
    let mut acc = SlidingWindow::with_squares(window, seed)?;
    Ok(values
        .iter()
        .map(|&v| {
            acc.push(v);
            acc.variance()
        })
        .collect())
}

/// The short moving average applied to its own output.
pub fn double_moving_average(values: &[f64], window: usize, seed: f64) -> Result<Vec<f64>> {
    let once = moving_average(values, window, seed)?;
    moving_average(&once, window, seed)
}

/// How far the fast average sits above the slow baseline, floored at zero.
pub fn baseline_subtract(
    values: &[f64],
    fast_window: usize,
    fast_seed: f64,
    baseline_window: usize,
    baseline_seed: f64,
) -> Result<Vec<f64>> {
    let fast = moving_average(values, fast_window, fast_seed)?;
    let baseline = moving_average(values, baseline_window, baseline_seed)?;
    Ok(fast
        .iter()
        .zip(&baseline)
        .map(|(f, b)| (f - b).max(0.0))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warm_up_blends_seed() {
        for (x, seed, n) in [(10.0, 0.0, 5), (42.0, 5000.0, 500), (-3.0, 7.0, 2)] {
            let out = moving_average(&[x], n, seed).unwrap();
            let expected = (x + (n as f64 - 1.0) * seed) / n as f64;
            assert!((out[0] - expected).abs() < 1e-9, "{x} {seed} {n}");
        }
    }

    #[test]
    fn constant_input_converges_exactly() {
        let c = 1234.0;
        let n = 8;
        let input = vec![c; 20];
        for seed in [0.0, 5000.0, -17.0] {
            let avg = moving_average(&input, n, seed).unwrap();
            let var = moving_variance(&input, n, seed).unwrap();
            for i in (n - 1)..input.len() {
                assert_eq!(avg[i], c);
                assert!(var[i].abs() < 1e-6, "variance {} at {i}", var[i]);
            }
        }
    }

    #[test]
    fn variance_matches_direct_computation() {
        let input = [3.0, 9.0, 4.0, 4.0, 10.0, 1.0, 6.0, 2.0];
        let n = 3;
        let out = moving_variance(&input, n, 0.0).unwrap();
        for i in (n - 1)..input.len() {
            let slice = &input[i + 1 - n..=i];
            let mean = slice.iter().sum::<f64>() / n as f64;
            let direct = slice.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
            assert!((out[i] - direct).abs() < 1e-9, "index {i}");
        }
    }

    #[test]
    fn outputs_keep_input_length() {
        let input: Vec<f64> = (0..37).map(|i| (i * 13 % 7) as f64).collect();
        assert_eq!(moving_average(&input, 5, 0.0).unwrap().len(), input.len());
        assert_eq!(moving_variance(&input, 5, 0.0).unwrap().len(), input.len());
        assert_eq!(double_moving_average(&input, 5, 0.0).unwrap().len(), input.len());
        assert_eq!(baseline_subtract(&input, 5, 0.0, 20, 50.0).unwrap().len(), input.len());
        assert!(moving_average(&[], 5, 0.0).unwrap().is_empty());
    }

    #[test]
    fn baseline_subtract_is_never_negative() {
        let input = [100.0, 100.0, 900.0, 900.0, 100.0];
        let out = baseline_subtract(&input, 2, 0.0, 4, 5000.0).unwrap();
        // baseline: 3775, 2550, 1525, 500, 500; fast: 50, 100, 500, 900, 500
        assert_eq!(out, vec![0.0, 0.0, 0.0, 400.0, 0.0]);
    }
}
