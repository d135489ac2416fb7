use std::fs;
use std::path::PathBuf;

use sensorlog::{
    DecodePolicy, FilterKind, FilterSpec, RunConfig, SensorLogError, Session, TextEncoding, TxLabel,
};

const CAPTURE: &str = "\
I (1000) SENSOR: Init sensors
I (1040) FILTER: Enter calibration | 1500 | 1600 | 1700 | 1800 | 1900 |
I (1050) SENSOR: SENSORLOG | 1500 | 1600 | 1700 | 1800 | 1900 |
I (1100) SENSOR: SENSORLOG | 1510 | 1605 | 1700 | 1795 | 1890 |
I (1150) SENSOR: SENSORLOG | 1520 |      | 1700 | 1790 | 1880 |
I (1200) SENSOR: SENSORLOG | 2900 | 1610 | 1700 | 1785 | 1870 |
I (1210) SENSOR: Thresholds | 2200 | 2400 | 2500 | 2600 | 2700 |
I (1210) FILTER: Debounce |   87 |   90 |   95 |  100 |  105 |
I (1250) ENCODING: | e |
I (1300) ENCODING: | \u{7f} |
";

fn write_capture(name: &str, bytes: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("sensorlog-{}-{name}", std::process::id()));
    fs::write(&path, bytes).unwrap();
    path
}

fn utf16le_with_bom(text: &str) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    bytes
}

#[test]
fn utf16_capture_parses_into_all_streams() {
    let path = write_capture("streams.log", &utf16le_with_bom(CAPTURE));
    let session = Session::new(RunConfig::for_log(&path)).unwrap();
    let (dump, report) = session.load().unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(report.lines_read, 10);
    assert_eq!(report.rejected_count(), 1);
    assert_eq!(dump.analog_timestamps, vec![1050, 1100, 1200]);
    assert_eq!(dump.analog_readings[0], vec![1500, 1510, 2900]);
    assert_eq!(dump.analog_readings[1], vec![1600, 1605, 1610]);
    assert_eq!(dump.calibration_timestamps, vec![1210]);
    assert_eq!(dump.debounce_readings[4], vec![105]);
    assert_eq!(dump.calibration_markers.len(), 1);
    let labels: Vec<TxLabel> = dump.tx_events.iter().map(|e| e.label).collect();
    assert_eq!(labels, vec![TxLabel::Char('e'), TxLabel::Delete]);
}

#[test]
fn filtering_keeps_timestamps_and_event_streams() {
    let path = write_capture("filtered.log", CAPTURE.as_bytes());
    let mut config = RunConfig::for_log(&path);
    config.encoding = TextEncoding::Utf8;
    config.filter = Some("quantized_autocalibrate".into());
    config.settings.fast_window = 1;
    config.settings.baseline_window = 3;
    config.settings.baseline_seed = 1500.0;
    config.settings.variance_seed = 1500.0;

    let session = Session::new(config).unwrap();
    assert_eq!(
        session.filter(),
        Some(FilterSpec::quantized(FilterKind::Autocalibrate))
    );
    let (raw, _) = session.load().unwrap();
    let shown = session.apply_filter(&raw).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(shown.analog_timestamps, raw.analog_timestamps);
    assert_eq!(shown.calibration_readings, raw.calibration_readings);
    assert_eq!(shown.debounce_readings, raw.debounce_readings);
    assert_eq!(shown.tx_events, raw.tx_events);
    for channel in &shown.analog_readings {
        assert_eq!(channel.len(), raw.analog_len());
    }
    // Channel 0 jumps from ~1500 to 2900 on the last sample; quantized
    // channel 0 only ever shows zero or the first display level.
    assert_eq!(shown.analog_readings[0][2], 500.0);
    assert!(shown.analog_readings[0].iter().all(|v| *v == 0.0 || *v == 500.0));
}

#[test]
fn strict_decoding_aborts_on_bad_bytes() {
    let mut bytes = utf16le_with_bom("I (1) SENSOR: SENSORLOG | 1 | 2 | 3 | 4 | 5 |\n");
    bytes.push(0x00);
    let path = write_capture("truncated.log", &bytes);

    let strict = Session::new(RunConfig::for_log(&path)).unwrap();
    let err = strict.load().unwrap_err();
    assert!(matches!(err, SensorLogError::Decode { .. }), "{err}");

    let mut config = RunConfig::for_log(&path);
    config.decode_policy = DecodePolicy::Replace;
    let (dump, _) = Session::new(config).unwrap().load().unwrap();
    fs::remove_file(&path).ok();
    assert_eq!(dump.analog_timestamps, vec![1]);
}
