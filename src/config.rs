use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Text encoding of the raw log file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    #[serde(rename = "utf-8")]
    Utf8,
    /// UTF-16 with byte-order detection; little-endian when no BOM is present.
    /// This is what the serial monitor on the capture host writes.
    #[default]
    #[serde(rename = "utf-16")]
    Utf16,
    #[serde(rename = "utf-16le")]
    Utf16Le,
    #[serde(rename = "utf-16be")]
    Utf16Be,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16 => "utf-16",
            TextEncoding::Utf16Le => "utf-16le",
            TextEncoding::Utf16Be => "utf-16be",
        };
        f.write_str(name)
    }
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "utf-16" | "utf16" => Ok(TextEncoding::Utf16),
            "utf-16le" | "utf16le" => Ok(TextEncoding::Utf16Le),
            "utf-16be" | "utf16be" => Ok(TextEncoding::Utf16Be),
            _ => Err(format!(
                "unknown encoding '{s}' (expected utf-8, utf-16, utf-16le or utf-16be)"
            )),
        }
    }
}

/// What to do with bytes that are not valid under the selected encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecodePolicy {
    /// Abort the run with a decode error.
    #[default]
    Strict,
    /// Substitute U+FFFD and keep going.
    Replace,
}

impl FromStr for DecodePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "strict" => Ok(DecodePolicy::Strict),
            "replace" => Ok(DecodePolicy::Replace),
            _ => Err(format!("unknown decode policy '{s}' (expected strict or replace)")),
        }
    }
}

/// Window sizes and seeds shared by the analog filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub fast_window: usize,
    pub fast_seed: f64,
    pub baseline_window: usize,
    pub baseline_seed: f64,
    pub variance_seed: f64,
    pub lowpass_sample_rate_hz: f64,
    pub lowpass_cutoff_hz: f64,
    pub lowpass_q: f64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        // Matches the device: 50 ms polling, a 500-sample calibration countdown
        // and a 12-bit ADC idling well below 5000.
        Self {
            fast_window: 5,
            fast_seed: 0.0,
            baseline_window: 500,
            baseline_seed: 5000.0,
            variance_seed: 0.0,
            lowpass_sample_rate_hz: 500.0,
            lowpass_cutoff_hz: 15.0,
            lowpass_q: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotSettings {
    pub width: u32,
    pub height: u32,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            width: 1600,
            height: 600,
        }
    }
}

/// One inspection run: which log to read, how to decode it, which filter to
/// apply and where to put the chart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub encoding: TextEncoding,
    #[serde(default)]
    pub decode_policy: DecodePolicy,
    /// Registry name, e.g. `autocalibrate` or `quantized_autocalibrate`.
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(default)]
    pub settings: FilterSettings,
    #[serde(default)]
    pub plot: PlotSettings,
    /// PNG destination. Defaults to the log path with a `.png` extension.
    #[serde(default)]
    pub output: Option<PathBuf>,
}

impl RunConfig {
    pub fn for_log(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            encoding: TextEncoding::default(),
            decode_policy: DecodePolicy::default(),
            filter: None,
            settings: FilterSettings::default(),
            plot: PlotSettings::default(),
            output: None,
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.path.with_extension("png"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = RunConfig::from_json_str(r#"{ "path": "logs/sensorlog" }"#).unwrap();
        assert_eq!(config.encoding, TextEncoding::Utf16);
        assert_eq!(config.decode_policy, DecodePolicy::Strict);
        assert_eq!(config.filter, None);
        assert_eq!(config.settings, FilterSettings::default());
        assert_eq!(config.output_path(), PathBuf::from("logs/sensorlog.png"));
    }

    #[test]
    fn partial_settings_are_merged_with_defaults() {
        let config = RunConfig::from_json_str(
            r#"{
                "path": "capture.txt",
                "encoding": "utf-8",
                "decode_policy": "replace",
                "filter": "quantized_autocalibrate",
                "settings": { "baseline_window": 200 },
                "output": "out/chart.png"
            }"#,
        )
        .unwrap();
        assert_eq!(config.encoding, TextEncoding::Utf8);
        assert_eq!(config.decode_policy, DecodePolicy::Replace);
        assert_eq!(config.filter.as_deref(), Some("quantized_autocalibrate"));
        assert_eq!(config.settings.baseline_window, 200);
        assert_eq!(config.settings.fast_window, 5);
        assert_eq!(config.output_path(), PathBuf::from("out/chart.png"));
    }

    #[test]
    fn unknown_encoding_is_a_config_error() {
        let err = RunConfig::from_json_str(r#"{ "path": "x", "encoding": "latin-1" }"#).unwrap_err();
        assert!(matches!(err, crate::error::SensorLogError::Config(_)));
    }

    #[test]
    fn selectors_parse_from_their_config_names() {
        for encoding in [
            TextEncoding::Utf8,
            TextEncoding::Utf16,
            TextEncoding::Utf16Le,
            TextEncoding::Utf16Be,
        ] {
            assert_eq!(encoding.to_string().parse::<TextEncoding>(), Ok(encoding));
        }
        assert_eq!("UTF8".parse::<TextEncoding>(), Ok(TextEncoding::Utf8));
        assert!("latin-1".parse::<TextEncoding>().is_err());
        assert_eq!("replace".parse::<DecodePolicy>(), Ok(DecodePolicy::Replace));
        assert!("lenient".parse::<DecodePolicy>().is_err());
    }
}
