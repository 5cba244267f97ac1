use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the query an address belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AddressRole {
    Source,
    Destination,
}

impl AddressRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddressRole::Source => "source",
            AddressRole::Destination => "destination",
        }
    }
}

impl fmt::Display for AddressRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved point on the Earth's surface, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Addresses after the best-effort cleaning step
///
/// When cleaning is skipped or fails, the raw text is carried through
/// unchanged and both flags are `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanedAddresses {
    pub source: String,
    pub destination: String,
    #[serde(rename = "sourceCorrected")]
    pub source_corrected: bool,
    #[serde(rename = "destinationCorrected")]
    pub destination_corrected: bool,
}

impl CleanedAddresses {
    /// Identity result: raw text, no corrections
    pub fn passthrough(source: &str, destination: &str) -> Self {
        Self {
            source: source.to_string(),
            destination: destination.to_string(),
            source_corrected: false,
            destination_corrected: false,
        }
    }
}

/// Great-circle distance rounded to two decimal places
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceResult {
    pub kilometers: f64,
    pub miles: f64,
}

/// A computed query waiting to be persisted
#[derive(Debug, Clone, PartialEq)]
pub struct NewQueryRecord {
    pub source: String,
    pub destination: String,
    pub kilometers: f64,
    pub miles: f64,
}

/// A persisted query. `id` and `created_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHistoryRecord {
    pub id: i64,
    pub source: String,
    pub destination: String,
    pub kilometers: f64,
    pub miles: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
