use thiserror::Error;

use crate::config::TextEncoding;

#[derive(Debug, Error)]
pub enum SensorLogError {
    #[error("line {line}: {reason}")]
    LineParse { line: usize, reason: String },
    #[error("invalid {encoding} sequence at byte offset {offset}")]
    Decode {
        encoding: TextEncoding,
        offset: usize,
    },
    #[error("unknown filter '{0}'")]
    UnknownFilter(String),
    #[error("channel {channel} length mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        channel: usize,
        expected: usize,
        actual: usize,
    },
    #[error("window capacity {capacity} is too small for this statistic")]
    InvalidWindow { capacity: usize },
    #[error("failed to read log: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid run configuration: {0}")]
    Config(#[from] serde_json::Error),
    #[error("failed to render plot: {0}")]
    Plot(String),
}

// plotters and image failures only surface while drawing the chart.
impl<E> From<plotters::drawing::DrawingAreaErrorKind<E>> for SensorLogError
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        SensorLogError::Plot(format!("drawing: {err}"))
    }
}

impl From<image::ImageError> for SensorLogError {
    fn from(err: image::ImageError) -> Self {
        SensorLogError::Plot(format!("png encoding: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, SensorLogError>;
