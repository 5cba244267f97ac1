//! Distance Calculator - great-circle distance between two free-text addresses
//!
//! Each query passes a captcha gate, an optional address-cleaning step,
//! geocoding of both addresses, a haversine distance calculation, and is
//! finally persisted to the query history.

pub mod config;
pub mod core;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{QueryPipeline, PipelineError, PipelineOutcome, distance::{calculate_distance, haversine_distance}};
pub use error::ApiError;
pub use models::{AddressQuery, AddressRole, CleanedAddresses, Coordinates, DistanceResult, QueryHistoryRecord};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        let result = calculate_distance(51.5074, -0.1278, 48.8566, 2.3522);
        assert!(result.kilometers > 300.0);
    }
}
