use log::info;

use crate::config::RunConfig;
use crate::error::Result;
use crate::filters::{FilterSpec, QuantizeCursor};
use crate::logfile::{read_log, LogParser, ParseReport};
use crate::plot::{PlotStyle, PngVisualizer, Visualizer};
use crate::types::LogDump;

/// Everything one run produced.
#[derive(Debug)]
pub struct RunOutput {
    pub raw: LogDump,
    pub report: ParseReport,
    /// Analog streams after the selected filter, or the raw readings widened.
    pub shown: LogDump<f64>,
    pub png: Vec<u8>,
}

/// High level driver: decode, parse, filter and render one log.
pub struct Session {
    config: RunConfig,
    filter: Option<FilterSpec>,
}

impl Session {
    /// Resolves the filter name up front so an unknown filter fails before
    /// the log is touched.
    pub fn new(config: RunConfig) -> Result<Self> {
        let filter = config
            .filter
            .as_deref()
            .map(FilterSpec::lookup)
            .transpose()?;
        Ok(Self { config, filter })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn filter(&self) -> Option<FilterSpec> {
        self.filter
    }

    pub fn load(&self) -> Result<(LogDump, ParseReport)> {
        let decoded = read_log(
            &self.config.path,
            self.config.encoding,
            self.config.decode_policy,
        )?;
        let source = self.config.path.display().to_string();
        Ok(LogParser::parse_text(source, &decoded.text))
    }

    /// Apply the configured filter with a fresh quantize cursor, so channel
    /// `c` of this dump always gets the `c`-th display level.
    pub fn apply_filter(&self, dump: &LogDump) -> Result<LogDump<f64>> {
        match self.filter {
            Some(spec) => {
                info!("applying {spec} to {}", dump.source);
                let mut cursor = QuantizeCursor::new();
                spec.apply_to_dump(dump, &self.config.settings, &mut cursor)
            }
            None => dump.analog_as_f64(),
        }
    }

    pub fn render(&self, dump: &LogDump<f64>) -> Result<Vec<u8>> {
        let title = match self.filter {
            Some(spec) => format!("{} ({spec})", dump.source),
            None => dump.source.clone(),
        };
        let mut visualizer = PngVisualizer::new(title, PlotStyle::from(&self.config.plot));
        visualizer.render_all(dump);
        visualizer.render_png()
    }

    pub fn run(&self) -> Result<RunOutput> {
        let (raw, report) = self.load()?;
        let shown = self.apply_filter(&raw)?;
        let png = self.render(&shown)?;
        Ok(RunOutput {
            raw,
            report,
            shown,
            png,
        })
    }
}
