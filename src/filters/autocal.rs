use crate::config::FilterSettings;
use crate::error::Result;
use crate::filters::window::SlidingWindow;

/// Adaptive touch detector for one channel.
///
/// A sample counts as a touch when the fast average rises above the slow
/// baseline and the squared excursion beats the baseline window's variance.
/// The output is the fast average on a touch and zero otherwise.
#[derive(Clone, Debug)]
pub struct Autocalibrator {
    fast: SlidingWindow,
    baseline: SlidingWindow,
    noise: SlidingWindow,
}

impl Autocalibrator {
    pub fn new(settings: &FilterSettings) -> Result<Self> {
        Ok(Self {
            fast: SlidingWindow::new(settings.fast_window, settings.fast_seed)?,
            baseline: SlidingWindow::new(settings.baseline_window, settings.baseline_seed)?,
            noise: SlidingWindow::with_squares(settings.baseline_window, settings.variance_seed)?,
        })
    }

    pub fn process_sample(&mut self, value: f64) -> f64 {
        self.fast.push(value);
        self.baseline.push(value);
        self.noise.push(value);

        let fast = self.fast.mean();
        let excursion = fast - self.baseline.mean();
        if excursion > 0.0 && excursion * excursion > self.noise.variance() {
            fast
        } else {
            0.0
        }
    }
}

pub fn autocalibrate(values: &[f64], settings: &FilterSettings) -> Result<Vec<f64>> {
    let mut detector = Autocalibrator::new(settings)?;
    Ok(values.iter().map(|&v| detector.process_sample(v)).collect())
}
