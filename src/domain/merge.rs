// Series merger - Apply a correction map to a raw window
use super::calibration::CorrectionMap;
use super::sample::{Sample, Window};

/// Rescale every raw sample by its correction factor.
///
/// Sample count and order are preserved; timestamps without a factor are
/// carried over unchanged.
pub fn merge(raw: &Window, correction: &CorrectionMap) -> Window {
    raw.samples()
        .iter()
        .map(|sample| Sample {
            timestamp: sample.timestamp.clone(),
            display_time: sample.display_time.clone(),
            value: sample.value * correction.factor_for(&sample.timestamp),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calibration::compute_correction;
    use std::collections::HashMap;

    fn window(points: &[(&str, f32)]) -> Window {
        points
            .iter()
            .map(|(t, v)| Sample::new(*t, format!("at {}", t), *v))
            .collect()
    }

    #[test]
    fn test_first_generation_identity() {
        let raw = window(&[("t1", 12.0), ("t2", 0.0), ("t3", 100.0)]);
        let merged = merge(&raw, &CorrectionMap::default());
        assert_eq!(merged, raw);
    }

    #[test]
    fn test_non_overlap_pass_through() {
        let correction: CorrectionMap = vec![("t1".to_string(), 3.0)].into_iter().collect();
        let merged = merge(&window(&[("t1", 10.0), ("t9", 7.5)]), &correction);

        assert_eq!(merged.samples()[0].value, 30.0);
        assert_eq!(merged.samples()[1].value, 7.5);
        assert_eq!(merged.samples()[1].display_time, "at t9");
    }

    #[test]
    fn test_preserves_order_and_count() {
        let raw = window(&[("t3", 1.0), ("t1", 2.0), ("t2", 3.0), ("t1", 4.0)]);
        let correction: CorrectionMap = vec![("t1".to_string(), 0.5)].into_iter().collect();
        let merged = merge(&raw, &correction);

        assert_eq!(merged.len(), raw.len());
        let stamps: Vec<&str> = merged.samples().iter().map(|s| s.timestamp.as_str()).collect();
        assert_eq!(stamps, vec!["t3", "t1", "t2", "t1"]);
        assert_eq!(merged.samples()[3].value, 2.0);
    }

    #[test]
    fn test_overlap_scenario() {
        let previous: HashMap<String, f32> =
            window(&[("t1", 40.0), ("t2", 60.0)]).value_map();
        let raw = window(&[("t1", 20.0), ("t2", 60.0), ("t3", 10.0)]);

        let correction = compute_correction(&previous, &raw);
        let calibrated = merge(&raw, &correction);

        let values: Vec<f32> = calibrated.samples().iter().map(|s| s.value).collect();
        assert_eq!(values, vec![40.0, 60.0, 10.0]);
    }
}
