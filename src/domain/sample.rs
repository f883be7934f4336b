// Trend sample domain models
use std::collections::HashMap;

/// One point of a trend window.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: String,
    pub display_time: String,
    pub value: f32,
}

impl Sample {
    pub fn new(timestamp: impl Into<String>, display_time: impl Into<String>, value: f32) -> Self {
        Self {
            timestamp: timestamp.into(),
            display_time: display_time.into(),
            value,
        }
    }
}

/// A sample exactly as the upstream trend service reported it, before any
/// calibration. Values are only meaningful relative to the same fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub timestamp: String,
    pub display_time: String,
    pub value: f32,
}

impl From<RawSample> for Sample {
    fn from(raw: RawSample) -> Self {
        Sample {
            timestamp: raw.timestamp,
            display_time: raw.display_time,
            value: raw.value,
        }
    }
}

/// Ordered samples from a single fetch or a single persisted generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Window {
    samples: Vec<Sample>,
}

impl Window {
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    pub fn from_raw(raw: Vec<RawSample>) -> Self {
        Self::new(raw.into_iter().map(Sample::from).collect())
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Timestamp to value lookup used as a calibration baseline.
    /// A timestamp repeated within the window keeps its last value.
    pub fn value_map(&self) -> HashMap<String, f32> {
        self.samples
            .iter()
            .map(|s| (s.timestamp.clone(), s.value))
            .collect()
    }
}

impl FromIterator<Sample> for Window {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
