/// Distance between neighbouring display levels.
pub const QUANTIZE_STEP: f64 = 500.0;
/// Number of levels before the cycle repeats.
pub const QUANTIZE_LEVELS: usize = 5;

/// Caller-owned position in the display level cycle
/// (500, 1000, 1500, 2000, 2500, 500, ...).
///
/// Pass the same cursor to several calls to keep numbering consistent across
/// them; a fresh cursor starts again at the first level.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuantizeCursor {
    next: usize,
}

impl QuantizeCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the current level and move to the next one.
    pub fn advance(&mut self) -> f64 {
        let level = (self.next % QUANTIZE_LEVELS + 1) as f64 * QUANTIZE_STEP;
        self.next = (self.next + 1) % QUANTIZE_LEVELS;
        level
    }
}

/// Map non-zero samples to one display level and zero samples to zero. The
/// cursor moves once per call, not per sample.
pub fn quantize(values: &[f64], cursor: &mut QuantizeCursor) -> Vec<f64> {
    let level = cursor.advance();
    values
        .iter()
        .map(|&v| if v != 0.0 { level } else { 0.0 })
        .collect()
}
