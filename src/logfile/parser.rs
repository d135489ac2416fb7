use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::error::{Result, SensorLogError};
use crate::types::{CalibrationMarker, CalibrationPhase, LogDump, TxEvent, TxLabel, CHANNEL_COUNT};

// Five `%4d` columns: `| 1234 |  567 | ... |`. Columns after the fifth are ignored.
const FIVE_FIELDS: &str =
    r"\s*\|\s*(\d*)\s*\|\s*(\d*)\s*\|\s*(\d*)\s*\|\s*(\d*)\s*\|\s*(\d*)\s*\|";

static SENSOR_LINE: Lazy<Regex> = Lazy::new(|| five_field_pattern(r"SENSOR: SENSORLOG"));
static THRESHOLD_LINE: Lazy<Regex> = Lazy::new(|| five_field_pattern(r"SENSOR: Thresholds"));
static DEBOUNCE_LINE: Lazy<Regex> = Lazy::new(|| five_field_pattern(r"FILTER: Debounce"));
static MARKER_LINE: Lazy<Regex> =
    Lazy::new(|| five_field_pattern(r"FILTER: (Enter|Exit) calibration"));
static INPUT_ACCEPT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\((\d+)\) ENCODING: \| (.) \|").expect("input acceptance pattern")
});

fn five_field_pattern(tag: &str) -> Regex {
    Regex::new(&format!(r"\((\d+)\) {tag}{FIVE_FIELDS}")).expect("five field pattern")
}

/// Line formats the parser recognizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineFormat {
    Sensor,
    Threshold,
    InputAccept,
    Debounce,
    CalibrationMarker,
}

impl LineFormat {
    fn describe(self) -> &'static str {
        match self {
            LineFormat::Sensor => "sensor",
            LineFormat::Threshold => "threshold",
            LineFormat::InputAccept => "input acceptance",
            LineFormat::Debounce => "debounce",
            LineFormat::CalibrationMarker => "calibration marker",
        }
    }
}

/// One successfully captured record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineRecord {
    Sensor {
        timestamp: i64,
        readings: [i32; CHANNEL_COUNT],
    },
    Threshold {
        timestamp: i64,
        thresholds: [i32; CHANNEL_COUNT],
    },
    InputAccept(TxEvent),
    Debounce {
        timestamp: i64,
        widths: [i32; CHANNEL_COUNT],
    },
    CalibrationMarker(CalibrationMarker),
}

/// Test `line` against every format independently. A line can match more
/// than one format; each match yields its own entry.
pub fn parse_line(line_no: usize, line: &str) -> Vec<Result<LineRecord>> {
    let mut out = Vec::new();

    if let Some(caps) = SENSOR_LINE.captures(line) {
        out.push(
            timestamp_and_fields(&caps, 1, line_no, LineFormat::Sensor)
                .map(|(timestamp, readings)| LineRecord::Sensor { timestamp, readings }),
        );
    }
    if let Some(caps) = THRESHOLD_LINE.captures(line) {
        out.push(
            timestamp_and_fields(&caps, 1, line_no, LineFormat::Threshold)
                .map(|(timestamp, thresholds)| LineRecord::Threshold { timestamp, thresholds }),
        );
    }
    if let Some(caps) = INPUT_ACCEPT_LINE.captures(line) {
        out.push(input_accept(&caps, line_no));
    }
    if let Some(caps) = DEBOUNCE_LINE.captures(line) {
        out.push(
            timestamp_and_fields(&caps, 1, line_no, LineFormat::Debounce)
                .map(|(timestamp, widths)| LineRecord::Debounce { timestamp, widths }),
        );
    }
    if let Some(caps) = MARKER_LINE.captures(line) {
        let phase = if &caps[2] == "Enter" {
            CalibrationPhase::Enter
        } else {
            CalibrationPhase::Exit
        };
        out.push(
            timestamp_and_fields(&caps, 2, line_no, LineFormat::CalibrationMarker).map(
                |(timestamp, readings)| {
                    LineRecord::CalibrationMarker(CalibrationMarker {
                        timestamp,
                        phase,
                        readings,
                    })
                },
            ),
        );
    }
    out
}

fn input_accept(caps: &Captures<'_>, line_no: usize) -> Result<LineRecord> {
    let timestamp = parse_number::<i64>(&caps[1], line_no, LineFormat::InputAccept, "timestamp")?;
    let label = caps[2]
        .chars()
        .next()
        .map(TxLabel::from_char)
        .ok_or_else(|| line_error(line_no, LineFormat::InputAccept, "missing character"))?;
    Ok(LineRecord::InputAccept(TxEvent { timestamp, label }))
}

/// Timestamp in group 1, channel values in the five groups after `skip`.
fn timestamp_and_fields(
    caps: &Captures<'_>,
    skip: usize,
    line_no: usize,
    format: LineFormat,
) -> Result<(i64, [i32; CHANNEL_COUNT])> {
    let timestamp = parse_number::<i64>(&caps[1], line_no, format, "timestamp")?;
    let mut values = [0i32; CHANNEL_COUNT];
    for (channel, value) in values.iter_mut().enumerate() {
        let raw = &caps[skip + 1 + channel];
        *value = parse_number::<i32>(raw, line_no, format, &format!("channel {channel}"))?;
    }
    Ok((timestamp, values))
}

fn parse_number<T: std::str::FromStr>(
    raw: &str,
    line_no: usize,
    format: LineFormat,
    field: &str,
) -> Result<T> {
    if raw.is_empty() {
        return Err(line_error(line_no, format, &format!("empty {field} field")));
    }
    raw.parse::<T>().map_err(|_| {
        line_error(
            line_no,
            format,
            &format!("{field} field '{raw}' is out of range"),
        )
    })
}

fn line_error(line_no: usize, format: LineFormat, reason: &str) -> SensorLogError {
    SensorLogError::LineParse {
        line: line_no,
        reason: format!("{} line rejected: {reason}", format.describe()),
    }
}

/// Outcome of a full parse besides the dump itself.
#[derive(Debug, Default)]
pub struct ParseReport {
    pub lines_read: usize,
    pub records: usize,
    /// Every rejected match, in log order. Always `SensorLogError::LineParse`.
    pub rejected: Vec<SensorLogError>,
}

impl ParseReport {
    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// Folds log lines into a [`LogDump`].
pub struct LogParser {
    dump: LogDump,
    report: ParseReport,
}

impl LogParser {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            dump: LogDump::new(source),
            report: ParseReport::default(),
        }
    }

    pub fn parse_lines<'a>(
        source: impl Into<String>,
        lines: impl IntoIterator<Item = &'a str>,
    ) -> (LogDump, ParseReport) {
        let mut parser = Self::new(source);
        for line in lines {
            parser.feed_line(line);
        }
        parser.finish()
    }

    pub fn parse_text(source: impl Into<String>, text: &str) -> (LogDump, ParseReport) {
        Self::parse_lines(source, text.lines())
    }

    pub fn feed_line(&mut self, line: &str) {
        self.report.lines_read += 1;
        let line_no = self.report.lines_read;
        for outcome in parse_line(line_no, line) {
            match outcome {
                Ok(record) => {
                    self.report.records += 1;
                    self.apply(record);
                }
                Err(err) => {
                    warn!("{}: {err}", self.dump.source);
                    self.report.rejected.push(err);
                }
            }
        }
    }

    fn apply(&mut self, record: LineRecord) {
        match record {
            LineRecord::Sensor { timestamp, readings } => self.dump.push_analog(timestamp, readings),
            LineRecord::Threshold {
                timestamp,
                thresholds,
            } => self.dump.push_calibration(timestamp, thresholds),
            LineRecord::InputAccept(event) => {
                debug!("tx {} at {}", event.label, event.timestamp);
                self.dump.tx_events.push(event);
            }
            LineRecord::Debounce { timestamp, widths } => self.dump.push_debounce(timestamp, widths),
            LineRecord::CalibrationMarker(marker) => self.dump.calibration_markers.push(marker),
        }
    }

    pub fn finish(self) -> (LogDump, ParseReport) {
        info!(
            "{}: {} lines, {} records, {} rejected; {}",
            self.dump.source,
            self.report.lines_read,
            self.report.records,
            self.report.rejected_count(),
            self.dump.summary()
        );
        (self.dump, self.report)
    }
}
