// src/filters/mod.rs
pub mod autocal;
pub mod biquad;
pub mod moving;
pub mod quantize;
pub mod registry;
pub mod window;

pub use autocal::{autocalibrate, Autocalibrator};
pub use biquad::{lowpass, Lowpass};
pub use moving::{baseline_subtract, double_moving_average, moving_average, moving_variance};
pub use quantize::{quantize, QuantizeCursor};
pub use registry::{FilterKind, FilterSpec};
pub use window::SlidingWindow;
