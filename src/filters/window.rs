use crate::error::{Result, SensorLogError};

/// Fixed-capacity circular buffer with a running sum, and optionally a
/// running sum of squares over the same slots.
///
/// The buffer starts out full of `init_value`, so the statistics are defined
/// from the first sample on.
#[derive(Clone, Debug)]
pub struct SlidingWindow {
    values: Vec<f64>,
    squares: Option<Vec<f64>>,
    cursor: usize,
    sum: f64,
    sum_sq: f64,
}

impl SlidingWindow {
    pub fn new(capacity: usize, init_value: f64) -> Result<Self> {
        Self::build(capacity, init_value, false)
    }

    /// Window that also tracks squares, needed for [`SlidingWindow::variance`].
    pub fn with_squares(capacity: usize, init_value: f64) -> Result<Self> {
        if capacity < 2 {
            return Err(SensorLogError::InvalidWindow { capacity });
        }
        Self::build(capacity, init_value, true)
    }

    fn build(capacity: usize, init_value: f64, track_squares: bool) -> Result<Self> {
        if capacity == 0 {
            return Err(SensorLogError::InvalidWindow { capacity });
        }
        let n = capacity as f64;
        let squared = init_value * init_value;
        Ok(Self {
            values: vec![init_value; capacity],
            squares: track_squares.then(|| vec![squared; capacity]),
            cursor: 0,
            sum: n * init_value,
            sum_sq: if track_squares { n * squared } else { 0.0 },
        })
    }

    pub fn capacity(&self) -> usize {
        self.values.len()
    }

    /// Overwrite the oldest slot with `value`. Both buffers share one cursor,
    /// which advances exactly once per sample.
    pub fn push(&mut self, value: f64) {
        let slot = self.cursor;
        self.sum += value - self.values[slot];
        self.values[slot] = value;
        if let Some(squares) = self.squares.as_mut() {
            let squared = value * value;
            self.sum_sq += squared - squares[slot];
            squares[slot] = squared;
        }
        self.cursor = (slot + 1) % self.capacity();
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.capacity() as f64
    }

    /// Sample variance (divisor N-1) of the window contents. Zero when the
    /// window does not track squares.
    pub fn variance(&self) -> f64 {
        if self.squares.is_none() {
            return 0.0;
        }
        let n = self.capacity() as f64;
        let variance = (self.sum_sq - self.sum * self.sum / n) / (n - 1.0);
        // Cancellation can leave a tiny negative residue on flat input.
        variance.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            SlidingWindow::new(0, 0.0),
            Err(SensorLogError::InvalidWindow { capacity: 0 })
        ));
        assert!(matches!(
            SlidingWindow::with_squares(1, 0.0),
            Err(SensorLogError::InvalidWindow { capacity: 1 })
        ));
    }

    #[test]
    fn seeded_window_reports_seed_statistics() {
        let window = SlidingWindow::with_squares(4, 7.0).unwrap();
        assert_eq!(window.sum(), 28.0);
        assert_eq!(window.mean(), 7.0);
        assert_eq!(window.variance(), 0.0);
    }

    #[test]
    fn evicts_oldest_sample() {
        let mut window = SlidingWindow::new(3, 0.0).unwrap();
        for v in [1.0, 2.0, 3.0, 4.0] {
            window.push(v);
        }
        assert_eq!(window.capacity(), 3);
        // holds 4, 2, 3
        assert_eq!(window.sum(), 9.0);
        assert_eq!(window.mean(), 3.0);
    }

    #[test]
    fn sum_and_squares_stay_on_the_same_window_after_wrapping() {
        let mut window = SlidingWindow::with_squares(3, 0.0).unwrap();
        let samples = [5.0, 1.0, 9.0, 2.0, 8.0, 3.0, 7.0];
        for v in samples {
            window.push(v);
        }
        // Last three samples: 8, 3, 7
        let last = [8.0, 3.0, 7.0];
        let mean = last.iter().sum::<f64>() / 3.0;
        let expected = last.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / 2.0;
        assert_eq!(window.sum(), 18.0);
        assert!((window.variance() - expected).abs() < 1e-9);
    }
}
