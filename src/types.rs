// src/types.rs
use std::fmt;

use crate::error::{Result, SensorLogError};

/// Number of analog sensor inputs on the device.
pub const CHANNEL_COUNT: usize = 5;

/// One sequence per sensor channel, indexed 0..CHANNEL_COUNT.
pub type ChannelSeries<T> = [Vec<T>; CHANNEL_COUNT];

/// Label attached to an accepted input character.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxLabel {
    Char(char),
    /// Control character 127, shown as `del`.
    Delete,
}

impl TxLabel {
    pub fn from_char(c: char) -> Self {
        if c == '\u{7f}' {
            TxLabel::Delete
        } else {
            TxLabel::Char(c)
        }
    }
}

impl fmt::Display for TxLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxLabel::Char(c) => write!(f, "{c}"),
            TxLabel::Delete => f.write_str("del"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TxEvent {
    pub timestamp: i64,
    pub label: TxLabel,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CalibrationPhase {
    Enter,
    Exit,
}

/// Start or end of the device calibration window, with the raw readings
/// sampled at that moment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalibrationMarker {
    pub timestamp: i64,
    pub phase: CalibrationPhase,
    pub readings: [i32; CHANNEL_COUNT],
}

/// Everything reconstructed from one sensor log.
///
/// `R` is the analog reading type: `i32` straight out of the parser, `f64`
/// once a filter has replaced the analog streams.
#[derive(Clone, Debug, PartialEq)]
pub struct LogDump<R = i32> {
    pub source: String,
    pub analog_timestamps: Vec<i64>,
    pub analog_readings: ChannelSeries<R>,
    pub calibration_timestamps: Vec<i64>,
    pub calibration_readings: ChannelSeries<i32>,
    pub debounce_timestamps: Vec<i64>,
    pub debounce_readings: ChannelSeries<i32>,
    pub calibration_markers: Vec<CalibrationMarker>,
    pub tx_events: Vec<TxEvent>,
}

impl<R> LogDump<R> {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            analog_timestamps: Vec::new(),
            analog_readings: Default::default(),
            calibration_timestamps: Vec::new(),
            calibration_readings: Default::default(),
            debounce_timestamps: Vec::new(),
            debounce_readings: Default::default(),
            calibration_markers: Vec::new(),
            tx_events: Vec::new(),
        }
    }

    pub fn push_analog(&mut self, timestamp: i64, readings: [R; CHANNEL_COUNT]) {
        self.analog_timestamps.push(timestamp);
        for (channel, value) in self.analog_readings.iter_mut().zip(readings) {
            channel.push(value);
        }
    }

    pub fn push_calibration(&mut self, timestamp: i64, thresholds: [i32; CHANNEL_COUNT]) {
        self.calibration_timestamps.push(timestamp);
        for (channel, value) in self.calibration_readings.iter_mut().zip(thresholds) {
            channel.push(value);
        }
    }

    pub fn push_debounce(&mut self, timestamp: i64, widths: [i32; CHANNEL_COUNT]) {
        self.debounce_timestamps.push(timestamp);
        for (channel, value) in self.debounce_readings.iter_mut().zip(widths) {
            channel.push(value);
        }
    }

    pub fn analog_len(&self) -> usize {
        self.analog_timestamps.len()
    }

    /// Copy of this dump whose analog streams are replaced by `readings`.
    ///
    /// Every channel must have exactly one value per analog timestamp.
    pub fn with_analog_readings<U>(&self, readings: ChannelSeries<U>) -> Result<LogDump<U>> {
        let expected = self.analog_timestamps.len();
        for (channel, values) in readings.iter().enumerate() {
            if values.len() != expected {
                return Err(SensorLogError::ShapeMismatch {
                    channel,
                    expected,
                    actual: values.len(),
                });
            }
        }
        Ok(LogDump {
            source: self.source.clone(),
            analog_timestamps: self.analog_timestamps.clone(),
            analog_readings: readings,
            calibration_timestamps: self.calibration_timestamps.clone(),
            calibration_readings: self.calibration_readings.clone(),
            debounce_timestamps: self.debounce_timestamps.clone(),
            debounce_readings: self.debounce_readings.clone(),
            calibration_markers: self.calibration_markers.clone(),
            tx_events: self.tx_events.clone(),
        })
    }

    pub fn summary(&self) -> DumpSummary {
        let span = match (self.analog_timestamps.first(), self.analog_timestamps.last()) {
            (Some(first), Some(last)) => Some((*first, *last)),
            _ => None,
        };
        DumpSummary {
            analog_samples: self.analog_timestamps.len(),
            calibration_snapshots: self.calibration_timestamps.len(),
            debounce_snapshots: self.debounce_timestamps.len(),
            calibration_markers: self.calibration_markers.len(),
            tx_events: self.tx_events.len(),
            analog_span: span,
        }
    }
}

impl<R: Copy + Into<f64>> LogDump<R> {
    /// Same dump with analog readings widened to `f64` for filtering and plotting.
    pub fn analog_as_f64(&self) -> Result<LogDump<f64>> {
        let readings = self
            .analog_readings
            .each_ref()
            .map(|channel| channel.iter().map(|&v| v.into()).collect::<Vec<f64>>());
        self.with_analog_readings(readings)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DumpSummary {
    pub analog_samples: usize,
    pub calibration_snapshots: usize,
    pub debounce_snapshots: usize,
    pub calibration_markers: usize,
    pub tx_events: usize,
    /// First and last analog timestamp.
    pub analog_span: Option<(i64, i64)>,
}

impl fmt::Display for DumpSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} analog samples, {} threshold snapshots, {} debounce snapshots, {} calibration markers, {} tx events",
            self.analog_samples,
            self.calibration_snapshots,
            self.debounce_snapshots,
            self.calibration_markers,
            self.tx_events
        )?;
        if let Some((first, last)) = self.analog_span {
            write!(f, " (t = {first}..{last})")?;
        }
        Ok(())
    }
}
