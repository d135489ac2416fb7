use std::io::Cursor;

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use plotters::prelude::*;

use crate::config::PlotSettings;
use crate::error::{Result, SensorLogError};
use crate::types::{LogDump, TxEvent, CHANNEL_COUNT};

/// Largest accepted chart side, in pixels.
pub const MAX_PLOT_SIDE: u32 = 16_384;

/// One color per finger, in channel order.
pub const CHANNEL_PALETTE: [RGBColor; CHANNEL_COUNT] = [BLUE, RED, GREEN, BLACK, YELLOW];

/// Consumer of a parsed (and possibly filtered) log.
///
/// Implementors draw individual pieces; [`Visualizer::render_all`] composes
/// them the usual way: every channel trace, its threshold snapshots, then the
/// tx markers on the shared time axis.
pub trait Visualizer {
    fn plot_analog_channel(&mut self, dump: &LogDump<f64>, channel: usize, color: RGBColor);

    fn scatter_calibration(&mut self, dump: &LogDump<f64>, channel: usize, color: RGBColor);

    fn mark_tx_events(&mut self, events: &[TxEvent]);

    fn render_all(&mut self, dump: &LogDump<f64>) {
        for (channel, color) in CHANNEL_PALETTE.iter().enumerate() {
            self.plot_analog_channel(dump, channel, *color);
            self.scatter_calibration(dump, channel, *color);
        }
        self.mark_tx_events(&dump.tx_events);
    }
}

#[derive(Clone, Debug)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub background: RGBColor,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self::from(&PlotSettings::default())
    }
}

impl From<&PlotSettings> for PlotStyle {
    fn from(settings: &PlotSettings) -> Self {
        Self {
            width: settings.width,
            height: settings.height,
            background: WHITE,
        }
    }
}

impl PlotStyle {
    /// Size of the RGB backing buffer, or an error for a zero-sized or
    /// oversized chart.
    fn buffer_len(&self) -> Result<usize> {
        let (width, height) = (self.width, self.height);
        if width == 0 || height == 0 || width > MAX_PLOT_SIDE || height > MAX_PLOT_SIDE {
            return Err(SensorLogError::Plot(format!(
                "chart size {width}x{height} outside 1..={MAX_PLOT_SIDE}"
            )));
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(3))
            .ok_or_else(|| SensorLogError::Plot(format!("chart size {width}x{height} overflows")))
    }
}

#[derive(Clone, Debug)]
enum Layer {
    Trace {
        label: String,
        color: RGBColor,
        points: Vec<(f64, f64)>,
    },
    Thresholds {
        color: RGBColor,
        points: Vec<(f64, f64)>,
    },
    TxMarks(Vec<(f64, String)>),
}

/// Collects drawing calls and renders them into a PNG in one go.
#[derive(Clone, Debug)]
pub struct PngVisualizer {
    title: String,
    style: PlotStyle,
    layers: Vec<Layer>,
}

impl PngVisualizer {
    pub fn new(title: impl Into<String>, style: PlotStyle) -> Self {
        Self {
            title: title.into(),
            style,
            layers: Vec::new(),
        }
    }

    /// Time range and value range covered by everything recorded so far.
    fn bounds(&self) -> Option<((f64, f64), (f64, f64))> {
        let mut xs = (f64::MAX, f64::MIN);
        let mut ys = (f64::MAX, f64::MIN);
        let mut any = false;
        for layer in &self.layers {
            match layer {
                Layer::Trace { points, .. } | Layer::Thresholds { points, .. } => {
                    for &(x, y) in points {
                        any = true;
                        xs = (xs.0.min(x), xs.1.max(x));
                        ys = (ys.0.min(y), ys.1.max(y));
                    }
                }
                Layer::TxMarks(marks) => {
                    for (x, _) in marks {
                        any = true;
                        xs = (xs.0.min(*x), xs.1.max(*x));
                    }
                }
            }
        }
        if !any {
            return None;
        }
        if ys.0 > ys.1 {
            // only tx markers
            ys = (0.0, 1.0);
        }
        Some((pad(xs), pad(ys)))
    }

    pub fn render_png(&self) -> Result<Vec<u8>> {
        let ((x_min, x_max), (y_min, y_max)) = self
            .bounds()
            .ok_or_else(|| SensorLogError::Plot("log has nothing to draw".into()))?;
        let style = &self.style;
        let mut buffer = vec![0u8; style.buffer_len()?];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
                .into_drawing_area();
            root.fill(&style.background)?;
            let mut chart = ChartBuilder::on(&root)
                .margin(10)
                .caption(&self.title, ("sans-serif", 20).into_font().color(&BLACK))
                .set_label_area_size(LabelAreaPosition::Left, 50)
                .set_label_area_size(LabelAreaPosition::Bottom, 40)
                .build_cartesian_2d(x_min..x_max, y_min..y_max)?;
            chart
                .configure_mesh()
                .light_line_style(&BLACK.mix(0.05))
                .draw()?;

            let dash = (x_max - x_min) * 0.002;
            for layer in &self.layers {
                match layer {
                    Layer::Trace {
                        label,
                        color,
                        points,
                    } => {
                        let color = *color;
                        chart
                            .draw_series(LineSeries::new(points.iter().copied(), &color))?
                            .label(label.as_str())
                            .legend(move |(x, y)| {
                                PathElement::new(vec![(x, y), (x + 20, y)], &color)
                            });
                    }
                    Layer::Thresholds { color, points } => {
                        let color = *color;
                        chart.draw_series(points.iter().map(|&(x, y)| {
                            PathElement::new(vec![(x - dash, y), (x + dash, y)], color.stroke_width(2))
                        }))?;
                    }
                    Layer::TxMarks(marks) => {
                        chart.draw_series(marks.iter().map(|(x, _)| {
                            PathElement::new(vec![(*x, y_min), (*x, y_max)], BLACK.mix(0.15))
                        }))?;
                        chart.draw_series(marks.iter().map(|(x, label)| {
                            Text::new(
                                label.clone(),
                                (*x, y_max),
                                ("sans-serif", 14).into_font().color(&BLACK),
                            )
                        }))?;
                    }
                }
            }
            chart
                .configure_series_labels()
                .border_style(&BLACK.mix(0.2))
                .background_style(&style.background.mix(0.8))
                .draw()?;
            root.present()?;
        }
        encode_png(buffer, style)
    }
}

impl Visualizer for PngVisualizer {
    fn plot_analog_channel(&mut self, dump: &LogDump<f64>, channel: usize, color: RGBColor) {
        let Some(values) = dump.analog_readings.get(channel) else {
            return;
        };
        let points = dump
            .analog_timestamps
            .iter()
            .zip(values)
            .map(|(&t, &v)| (t as f64, v))
            .collect();
        self.layers.push(Layer::Trace {
            label: format!("ch {channel}"),
            color,
            points,
        });
    }

    fn scatter_calibration(&mut self, dump: &LogDump<f64>, channel: usize, color: RGBColor) {
        let Some(values) = dump.calibration_readings.get(channel) else {
            return;
        };
        let points = dump
            .calibration_timestamps
            .iter()
            .zip(values)
            .map(|(&t, &v)| (t as f64, f64::from(v)))
            .collect();
        self.layers.push(Layer::Thresholds { color, points });
    }

    fn mark_tx_events(&mut self, events: &[TxEvent]) {
        let marks = events
            .iter()
            .map(|e| (e.timestamp as f64, e.label.to_string()))
            .collect();
        self.layers.push(Layer::TxMarks(marks));
    }
}

fn pad((lo, hi): (f64, f64)) -> (f64, f64) {
    let margin = ((hi - lo) * 0.05).max(1.0);
    (lo - margin, hi + margin)
}

/// Wrap the rendered RGB pixels as a PNG file image.
fn encode_png(pixels: Vec<u8>, style: &PlotStyle) -> Result<Vec<u8>> {
    let frame = ImageBuffer::<Rgb<u8>, _>::from_raw(style.width, style.height, pixels)
        .ok_or_else(|| {
            SensorLogError::Plot(format!(
                "pixel buffer does not fit a {}x{} chart",
                style.width, style.height
            ))
        })?;
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(frame).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TxLabel;

    fn dump() -> LogDump<f64> {
        let mut dump = LogDump::new("plot");
        dump.push_analog(100, [1.0, 2.0, 3.0, 4.0, 5.0]);
        dump.push_analog(200, [10.0, 20.0, 30.0, 40.0, 50.0]);
        dump.push_calibration(150, [60, 0, 0, 0, 0]);
        dump.tx_events.push(TxEvent {
            timestamp: 400,
            label: TxLabel::Delete,
        });
        dump
    }

    #[test]
    fn render_all_records_every_channel_and_markers() {
        let mut vis = PngVisualizer::new("t", PlotStyle::default());
        vis.render_all(&dump());
        let traces = vis
            .layers
            .iter()
            .filter(|l| matches!(l, Layer::Trace { .. }))
            .count();
        let thresholds = vis
            .layers
            .iter()
            .filter(|l| matches!(l, Layer::Thresholds { .. }))
            .count();
        assert_eq!(traces, CHANNEL_COUNT);
        assert_eq!(thresholds, CHANNEL_COUNT);
        match vis.layers.last() {
            Some(Layer::TxMarks(marks)) => assert_eq!(marks, &vec![(400.0, "del".to_string())]),
            other => panic!("unexpected layer {other:?}"),
        }
        match &vis.layers[0] {
            Layer::Trace { color, points, .. } => {
                assert_eq!(*color, BLUE);
                assert_eq!(points, &vec![(100.0, 1.0), (200.0, 10.0)]);
            }
            other => panic!("unexpected layer {other:?}"),
        }
    }

    #[test]
    fn bounds_cover_all_layers_with_padding() {
        let mut vis = PngVisualizer::new("t", PlotStyle::default());
        vis.render_all(&dump());
        let ((x0, x1), (y0, y1)) = vis.bounds().unwrap();
        assert!(x0 < 100.0 && x1 > 400.0);
        assert!(y0 < 0.0 && y1 > 60.0);
    }

    #[test]
    fn empty_visualizer_refuses_to_render() {
        let vis = PngVisualizer::new("t", PlotStyle::default());
        assert!(vis.bounds().is_none());
        assert!(matches!(vis.render_png(), Err(SensorLogError::Plot(_))));
    }

    #[test]
    fn oversized_chart_is_an_error() {
        for (width, height) in [(65_536, 65_536), (u32::MAX, 2), (0, 600), (1600, 0)] {
            let style = PlotStyle::from(&PlotSettings { width, height });
            let mut vis = PngVisualizer::new("t", style);
            vis.render_all(&dump());
            match vis.render_png() {
                Err(SensorLogError::Plot(reason)) => assert!(reason.contains("chart size"), "{reason}"),
                other => panic!("{width}x{height}: {other:?}"),
            }
        }
        assert_eq!(PlotStyle::default().buffer_len().unwrap(), 1600 * 600 * 3);
    }
}
