// Domain layer - Trend windows and the calibration chain
pub mod calibration;
pub mod generation;
pub mod merge;
pub mod sample;
