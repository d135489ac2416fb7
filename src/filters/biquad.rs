use std::f64::consts::PI;

/// Second-order low-pass section, the same shape the newer firmware runs on
/// the device before thresholding.
#[derive(Clone, Copy, Debug)]
struct BiquadCoeffs {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

#[derive(Clone, Copy, Debug, Default)]
struct BiquadState {
    z1: f64,
    z2: f64,
}

#[derive(Clone, Copy, Debug)]
pub struct Lowpass {
    coeffs: BiquadCoeffs,
    state: BiquadState,
}

impl Lowpass {
    pub fn new(cutoff_hz: f64, sample_rate_hz: f64, q: f64) -> Self {
        let nyquist = sample_rate_hz * 0.5;
        let cutoff = cutoff_hz.clamp(0.01, nyquist - 0.01);
        let w0 = 2.0 * PI * cutoff / sample_rate_hz;
        let alpha = w0.sin() / (2.0 * q.max(0.1));
        let cos_w0 = w0.cos();
        let a0 = 1.0 + alpha;
        let b1 = (1.0 - cos_w0) / a0;
        Self {
            coeffs: BiquadCoeffs {
                b0: b1 * 0.5,
                b1,
                b2: b1 * 0.5,
                a1: -2.0 * cos_w0 / a0,
                a2: (1.0 - alpha) / a0,
            },
            state: BiquadState::default(),
        }
    }

    /// Start from the steady state for a constant `value`, so a log that
    /// begins at a resting level does not ring up from zero.
    pub fn primed(mut self, value: f64) -> Self {
        let c = self.coeffs;
        // Unity DC gain: y == value, solve the TDF-II delay line for it.
        self.state.z2 = c.b2 * value - c.a2 * value;
        self.state.z1 = c.b1 * value - c.a1 * value + self.state.z2;
        self
    }

    pub fn process_sample(&mut self, input: f64) -> f64 {
        // Transposed direct form II
        let y = self.coeffs.b0 * input + self.state.z1;
        self.state.z1 = self.coeffs.b1 * input - self.coeffs.a1 * y + self.state.z2;
        self.state.z2 = self.coeffs.b2 * input - self.coeffs.a2 * y;
        y
    }
}

pub fn lowpass(values: &[f64], cutoff_hz: f64, sample_rate_hz: f64, q: f64) -> Vec<f64> {
    let Some(&first) = values.first() else {
        return Vec::new();
    };
    let mut filter = Lowpass::new(cutoff_hz, sample_rate_hz, q).primed(first);
    values.iter().map(|&v| filter.process_sample(v)).collect()
}
