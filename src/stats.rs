use serde::Serialize;

use crate::observation::DisplayRecord;

/// Summary altitude statistics over the current record sequence.
///
/// Derived, never stored: recomputed from the sequence on every
/// observation, so they can never drift from the displayed records.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AltitudeStats {
    pub count: usize,
    pub avg_altitude: f64,
    pub max_altitude: f64,
    pub min_altitude: f64,
}

impl AltitudeStats {
    /// Compute count, average, max and min altitude.
    ///
    /// Returns `None` for an empty sequence; the empty case is a defined
    /// "no data" result, not a NaN from dividing by zero.
    pub fn compute(records: &[DisplayRecord]) -> Option<AltitudeStats> {
        if records.is_empty() {
            return None;
        }

        let mut sum = 0.0;
        let mut max = f64::NEG_INFINITY;
        let mut min = f64::INFINITY;
        for record in records {
            sum += record.altitude;
            if record.altitude > max {
                max = record.altitude;
            }
            if record.altitude < min {
                min = record.altitude;
            }
        }

        Some(AltitudeStats {
            count: records.len(),
            avg_altitude: sum / records.len() as f64,
            max_altitude: max,
            min_altitude: min,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observation::{fallback_records, FALLBACK_SET};
    use approx::assert_relative_eq;

    #[test]
    fn test_stats_over_fallback_set() {
        let stats = AltitudeStats::compute(&fallback_records()).unwrap();

        assert_eq!(stats.count, 6);
        assert_relative_eq!(stats.max_altitude, 17.35895906484483);
        assert_relative_eq!(stats.min_altitude, 2.3123602919294157);

        let expected_avg =
            FALLBACK_SET.iter().map(|obs| obs.altitude()).sum::<f64>() / FALLBACK_SET.len() as f64;
        assert_relative_eq!(stats.avg_altitude, expected_avg);
        assert_relative_eq!(stats.avg_altitude, 8.398836755579804, epsilon = 1e-9);
    }

    #[test]
    fn test_stats_empty_sequence_is_none() {
        assert_eq!(AltitudeStats::compute(&[]), None);
    }

    #[test]
    fn test_stats_single_record() {
        let records = vec![DisplayRecord {
            id: 1,
            latitude: 0.0,
            longitude: 0.0,
            altitude: 12.5,
        }];
        let stats = AltitudeStats::compute(&records).unwrap();

        assert_eq!(stats.count, 1);
        assert_relative_eq!(stats.avg_altitude, 12.5);
        assert_relative_eq!(stats.max_altitude, 12.5);
        assert_relative_eq!(stats.min_altitude, 12.5);
    }

    #[test]
    fn test_stats_negative_altitudes() {
        let records = vec![
            DisplayRecord {
                id: 1,
                latitude: 0.0,
                longitude: 0.0,
                altitude: -2.0,
            },
            DisplayRecord {
                id: 2,
                latitude: 0.0,
                longitude: 0.0,
                altitude: 4.0,
            },
        ];
        let stats = AltitudeStats::compute(&records).unwrap();

        assert_relative_eq!(stats.avg_altitude, 1.0);
        assert_relative_eq!(stats.min_altitude, -2.0);
        assert_relative_eq!(stats.max_altitude, 4.0);
    }
}
