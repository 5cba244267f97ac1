use serde::{Deserialize, Serialize};
use crate::models::domain::{CleanedAddresses, DistanceResult};

/// Response for the distance endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceResponse {
    pub kilometers: f64,
    pub miles: f64,
    pub source_address: String,
    pub destination_address: String,
    pub source_corrected: bool,
    pub destination_corrected: bool,
}

impl DistanceResponse {
    pub fn new(distance: DistanceResult, cleaned: CleanedAddresses) -> Self {
        Self {
            kilometers: distance.kilometers,
            miles: distance.miles,
            source_address: cleaned.source,
            destination_address: cleaned.destination,
            source_corrected: cleaned.source_corrected,
            destination_corrected: cleaned.destination_corrected,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}
