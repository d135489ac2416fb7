use std::fmt;
use std::str::FromStr;

use log::debug;

use crate::config::FilterSettings;
use crate::error::{Result, SensorLogError};
use crate::filters::autocal::autocalibrate;
use crate::filters::biquad::lowpass;
use crate::filters::moving::{baseline_subtract, double_moving_average, moving_average, moving_variance};
use crate::filters::quantize::{quantize, QuantizeCursor};
use crate::types::{ChannelSeries, LogDump};

const QUANTIZED_PREFIX: &str = "quantized_";

/// Every analog filter the inspector knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterKind {
    MovingAverage,
    MovingAverageLong,
    DoubleMovingAverage,
    MovingVariance,
    BaselineSubtract,
    Autocalibrate,
    IirLowpass,
}

impl FilterKind {
    pub const ALL: [FilterKind; 7] = [
        FilterKind::MovingAverage,
        FilterKind::MovingAverageLong,
        FilterKind::DoubleMovingAverage,
        FilterKind::MovingVariance,
        FilterKind::BaselineSubtract,
        FilterKind::Autocalibrate,
        FilterKind::IirLowpass,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterKind::MovingAverage => "moving_average",
            FilterKind::MovingAverageLong => "moving_average_long",
            FilterKind::DoubleMovingAverage => "double_moving_average",
            FilterKind::MovingVariance => "moving_variance",
            FilterKind::BaselineSubtract => "baseline_subtract",
            FilterKind::Autocalibrate => "autocalibrate",
            FilterKind::IirLowpass => "iir_lowpass",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Run the filter over one channel. Output has the input's length.
    pub fn run(self, values: &[f64], s: &FilterSettings) -> Result<Vec<f64>> {
        match self {
            FilterKind::MovingAverage => moving_average(values, s.fast_window, s.fast_seed),
            FilterKind::MovingAverageLong => {
                moving_average(values, s.baseline_window, s.baseline_seed)
            }
            FilterKind::DoubleMovingAverage => {
                double_moving_average(values, s.fast_window, s.fast_seed)
            }
            FilterKind::MovingVariance => {
                moving_variance(values, s.baseline_window, s.variance_seed)
            }
            FilterKind::BaselineSubtract => baseline_subtract(
                values,
                s.fast_window,
                s.fast_seed,
                s.baseline_window,
                s.baseline_seed,
            ),
            FilterKind::Autocalibrate => autocalibrate(values, s),
            FilterKind::IirLowpass => Ok(lowpass(
                values,
                s.lowpass_cutoff_hz,
                s.lowpass_sample_rate_hz,
                s.lowpass_q,
            )),
        }
    }
}

/// A registry entry: a filter, optionally followed by display quantization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub quantized: bool,
}

impl FilterSpec {
    pub fn plain(kind: FilterKind) -> Self {
        Self {
            kind,
            quantized: false,
        }
    }

    pub fn quantized(kind: FilterKind) -> Self {
        Self {
            kind,
            quantized: true,
        }
    }

    /// Resolve a registry name such as `autocalibrate` or
    /// `quantized_autocalibrate`.
    pub fn lookup(name: &str) -> Result<Self> {
        let (base, quantized) = match name.strip_prefix(QUANTIZED_PREFIX) {
            Some(base) => (base, true),
            None => (name, false),
        };
        FilterKind::from_name(base)
            .map(|kind| Self { kind, quantized })
            .ok_or_else(|| SensorLogError::UnknownFilter(name.to_owned()))
    }

    /// Every registered name, plain variants first.
    pub fn registered_names() -> Vec<String> {
        let plain = FilterKind::ALL.iter().map(|k| FilterSpec::plain(*k));
        let quantized = FilterKind::ALL.iter().map(|k| FilterSpec::quantized(*k));
        plain.chain(quantized).map(|spec| spec.to_string()).collect()
    }

    /// Filter one channel. Quantized specs draw one level from `cursor`.
    pub fn apply(
        &self,
        values: &[f64],
        settings: &FilterSettings,
        cursor: &mut QuantizeCursor,
    ) -> Result<Vec<f64>> {
        let filtered = self.kind.run(values, settings)?;
        let out = if self.quantized {
            quantize(&filtered, cursor)
        } else {
            filtered
        };
        if out.len() != values.len() {
            return Err(SensorLogError::ShapeMismatch {
                channel: 0,
                expected: values.len(),
                actual: out.len(),
            });
        }
        Ok(out)
    }

    /// Filter every analog channel of `dump` in channel order, leaving the
    /// threshold, debounce and tx streams untouched.
    pub fn apply_to_dump(
        &self,
        dump: &LogDump,
        settings: &FilterSettings,
        cursor: &mut QuantizeCursor,
    ) -> Result<LogDump<f64>> {
        let mut readings: ChannelSeries<f64> = Default::default();
        for (channel, (raw, out)) in dump.analog_readings.iter().zip(readings.iter_mut()).enumerate() {
            let values: Vec<f64> = raw.iter().map(|&v| f64::from(v)).collect();
            *out = self.apply(&values, settings, cursor).map_err(|err| match err {
                SensorLogError::ShapeMismatch {
                    expected, actual, ..
                } => SensorLogError::ShapeMismatch {
                    channel,
                    expected,
                    actual,
                },
                other => other,
            })?;
            debug!("{}: filtered channel {channel} with {}", dump.source, self);
        }
        dump.with_analog_readings(readings)
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quantized {
            f.write_str(QUANTIZED_PREFIX)?;
        }
        f.write_str(self.kind.name())
    }
}

impl FromStr for FilterSpec {
    type Err = SensorLogError;

    fn from_str(s: &str) -> Result<Self> {
        Self::lookup(s)
    }
}
