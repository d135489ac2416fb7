//! Reconstructs sensor, threshold and keystroke streams from the glove
//! firmware's text logs and runs the analog channels through the same
//! windowed filters used to tune touch detection.
pub mod config;
pub mod error;
pub mod filters;
pub mod logfile;
pub mod plot;
pub mod session;
pub mod types;

pub use config::{DecodePolicy, FilterSettings, RunConfig, TextEncoding};
pub use error::{Result, SensorLogError};
pub use filters::{FilterKind, FilterSpec, QuantizeCursor};
pub use logfile::{LogParser, ParseReport};
pub use session::{RunOutput, Session};
pub use types::{LogDump, TxEvent, TxLabel, CHANNEL_COUNT};
