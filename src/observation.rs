use serde::{Deserialize, Serialize};

/// One reported balloon position from the upstream feed.
///
/// The feed is a bare JSON array of `[latitude, longitude, altitude]`
/// triples, so this deserializes from a 3-element array rather than an
/// object. Altitude is in kilometers and may be negative (below the
/// reference datum). There is no identity field; position in the source
/// sequence is the only ordering.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawObservation(pub f64, pub f64, pub f64);

impl RawObservation {
    pub fn latitude(&self) -> f64 {
        self.0
    }

    pub fn longitude(&self) -> f64 {
        self.1
    }

    pub fn altitude(&self) -> f64 {
        self.2
    }

    /// Range check: latitude in [-90, 90], longitude in [-180, 180],
    /// all components finite. Altitude sign is unconstrained.
    pub fn is_valid(&self) -> bool {
        self.0.is_finite()
            && self.1.is_finite()
            && self.2.is_finite()
            && (-90.0..=90.0).contains(&self.0)
            && (-180.0..=180.0).contains(&self.1)
    }
}

/// Chart-ready balloon record with a 1-based positional id.
///
/// The id is assigned at normalization time and is not stable across
/// fetches if the upstream ordering changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DisplayRecord {
    pub id: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Built-in sample positions substituted whenever the live feed is
/// unavailable. Values are fixed; statistics computed over them are part
/// of the test contract.
pub const FALLBACK_SET: [RawObservation; 6] = [
    RawObservation(-0.8234947986247869, 172.81706041445517, 3.6808595556242256),
    RawObservation(50.813010401735646, 141.85201829486707, 3.369649522061529),
    RawObservation(72.66130077522725, 108.53954442453075, 17.35895906484483),
    RawObservation(-62.981731785279365, 24.196209658094762, 14.06707702682182),
    RawObservation(74.84547263518624, -77.2062158124169, 2.3123602919294157),
    RawObservation(-3.4126363322169935, 114.54269440305465, 9.604115072197002),
];

/// Map raw triples to display records in source order, `id = index + 1`.
///
/// Pure and deterministic: identical input yields identical output.
pub fn normalize_records(raw: &[RawObservation]) -> Vec<DisplayRecord> {
    raw.iter()
        .enumerate()
        .map(|(index, obs)| DisplayRecord {
            id: (index + 1) as u32,
            latitude: obs.latitude(),
            longitude: obs.longitude(),
            altitude: obs.altitude(),
        })
        .collect()
}

/// The fallback set in display form, ids 1 through 6.
pub fn fallback_records() -> Vec<DisplayRecord> {
    normalize_records(&FALLBACK_SET)
}
