// Calibration engine - Scale factors from the overlap of two windows
use super::sample::Window;
use std::collections::HashMap;

/// Factor applied when no usable ratio exists for a timestamp.
pub const NEUTRAL_FACTOR: f32 = 1.0;

/// Per-timestamp multiplicative corrections for a raw window.
///
/// Only timestamps shared by the previous generation and the new raw window
/// have an entry. Anything else is applied with [`NEUTRAL_FACTOR`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CorrectionMap {
    factors: HashMap<String, f32>,
}

/// Aggregate view of a correction map, for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrectionSummary {
    pub overlap: usize,
    pub min: f32,
    pub mean: f32,
    pub max: f32,
}

impl CorrectionMap {
    pub fn get(&self, timestamp: &str) -> Option<f32> {
        self.factors.get(timestamp).copied()
    }

    pub fn factor_for(&self, timestamp: &str) -> f32 {
        self.get(timestamp).unwrap_or(NEUTRAL_FACTOR)
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn summary(&self) -> Option<CorrectionSummary> {
        if self.factors.is_empty() {
            return None;
        }

        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0f64;
        for &factor in self.factors.values() {
            min = min.min(factor);
            max = max.max(factor);
            sum += f64::from(factor);
        }

        Some(CorrectionSummary {
            overlap: self.factors.len(),
            min,
            mean: (sum / self.factors.len() as f64) as f32,
            max,
        })
    }
}

impl FromIterator<(String, f32)> for CorrectionMap {
    fn from_iter<I: IntoIterator<Item = (String, f32)>>(iter: I) -> Self {
        Self {
            factors: iter.into_iter().collect(),
        }
    }
}

/// Compute a correction factor for every timestamp of `current` that also
/// appears in `previous`.
///
/// The factor maps the freshly normalised value back onto the scale of the
/// previous generation: `previous / current`. A zero baseline, a zero or
/// negative current value, and any ratio that is not a positive finite
/// number all fall back to [`NEUTRAL_FACTOR`].
pub fn compute_correction(previous: &HashMap<String, f32>, current: &Window) -> CorrectionMap {
    current
        .samples()
        .iter()
        .filter_map(|sample| {
            previous
                .get(&sample.timestamp)
                .map(|&baseline| (sample.timestamp.clone(), factor(baseline, sample.value)))
        })
        .collect()
}

fn factor(baseline: f32, current: f32) -> f32 {
    if baseline == 0.0 || current <= 0.0 {
        return NEUTRAL_FACTOR;
    }
    let ratio = baseline / current;
    if ratio.is_finite() && ratio > 0.0 {
        ratio
    } else {
        NEUTRAL_FACTOR
    }
}
