// src/main.rs
use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;

use sensorlog::{DecodePolicy, FilterSpec, RunConfig, Session, TextEncoding};

fn filter_help() -> String {
    format!(
        "Filter applied to the analog channels: {}",
        FilterSpec::registered_names().join(", ")
    )
}

#[derive(Parser, Debug)]
#[command(
    name = "sensorlog",
    version,
    about = "Plot SENSORLOG captures from the glove firmware"
)]
struct Cli {
    /// Sensor log to read
    #[arg(required_unless_present = "config")]
    path: Option<PathBuf>,

    /// JSON run configuration; flags given here override its values
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Text encoding of the log: utf-8, utf-16, utf-16le, utf-16be
    #[arg(long)]
    encoding: Option<TextEncoding>,

    /// How to treat invalid byte sequences: strict or replace
    #[arg(long)]
    decode_policy: Option<DecodePolicy>,

    #[arg(long, value_name = "NAME", help = filter_help())]
    filter: Option<FilterSpec>,

    /// Chart destination (default: the log path with a .png extension)
    #[arg(long, short, value_name = "FILE")]
    output: Option<PathBuf>,
}

impl Cli {
    // 命令行参数覆盖配置文件
    fn into_run_config(self) -> Result<RunConfig> {
        let mut config = match (self.config, self.path) {
            (Some(file), path) => {
                let mut config = RunConfig::load(&file)
                    .with_context(|| format!("loading {}", file.display()))?;
                if let Some(path) = path {
                    config.path = path;
                }
                config
            }
            (None, Some(path)) => RunConfig::for_log(path),
            (None, None) => bail!("no sensor log given"),
        };
        if let Some(encoding) = self.encoding {
            config.encoding = encoding;
        }
        if let Some(policy) = self.decode_policy {
            config.decode_policy = policy;
        }
        if let Some(filter) = self.filter {
            config.filter = Some(filter.to_string());
        }
        if let Some(output) = self.output {
            config.output = Some(output);
        }
        Ok(config)
    }
}

// 入口函数
fn main() -> Result<()> {
    env_logger::init();

    let config = Cli::parse().into_run_config()?;
    let output = config.output_path();

    let session = Session::new(config)?;
    let run = session
        .run()
        .with_context(|| format!("processing {}", session.config().path.display()))?;

    fs::write(&output, &run.png).with_context(|| format!("writing {}", output.display()))?;
    info!(
        "{}: {} ({} lines rejected), chart at {}",
        run.raw.source,
        run.shown.summary(),
        run.report.rejected_count(),
        output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensorlog::FilterKind;

    #[test]
    fn flags_select_encoding_policy_and_filter() {
        let cli = Cli::try_parse_from([
            "sensorlog",
            "capture.log",
            "--encoding",
            "utf-8",
            "--decode-policy",
            "replace",
            "--filter",
            "quantized_autocalibrate",
        ])
        .unwrap();
        let config = cli.into_run_config().unwrap();
        assert_eq!(config.path, PathBuf::from("capture.log"));
        assert_eq!(config.encoding, TextEncoding::Utf8);
        assert_eq!(config.decode_policy, DecodePolicy::Replace);
        assert_eq!(config.filter.as_deref(), Some("quantized_autocalibrate"));
        assert_eq!(config.output_path(), PathBuf::from("capture.png"));
    }

    #[test]
    fn defaults_without_flags() {
        let config = Cli::try_parse_from(["sensorlog", "capture.log"])
            .unwrap()
            .into_run_config()
            .unwrap();
        assert_eq!(config, RunConfig::for_log("capture.log"));
    }

    #[test]
    fn unknown_filter_or_encoding_is_rejected() {
        assert!(Cli::try_parse_from(["sensorlog", "a.log", "--filter", "doesnotexist"]).is_err());
        assert!(Cli::try_parse_from(["sensorlog", "a.log", "--encoding", "latin-1"]).is_err());
        assert!(Cli::try_parse_from(["sensorlog"]).is_err());
    }

    #[test]
    fn flags_override_config_file() {
        let file = std::env::temp_dir().join(format!("sensorlog-cli-{}.json", std::process::id()));
        fs::write(
            &file,
            r#"{ "path": "from-config.log", "filter": "moving_average", "settings": { "fast_window": 9 } }"#,
        )
        .unwrap();
        let cli = Cli::try_parse_from([
            "sensorlog",
            "--config",
            file.to_str().unwrap(),
            "--filter",
            "iir_lowpass",
            "-o",
            "chart.png",
        ])
        .unwrap();
        let config = cli.into_run_config().unwrap();
        fs::remove_file(&file).ok();
        assert_eq!(config.path, PathBuf::from("from-config.log"));
        assert_eq!(config.settings.fast_window, 9);
        assert_eq!(
            config.filter.as_deref().map(FilterSpec::lookup).transpose().unwrap(),
            Some(FilterSpec::plain(FilterKind::IirLowpass))
        );
        assert_eq!(config.output_path(), PathBuf::from("chart.png"));
    }
}
