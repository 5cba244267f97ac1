// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{AddressRole, Coordinates, CleanedAddresses, DistanceResult, NewQueryRecord, QueryHistoryRecord};
pub use requests::{AddressQuery, HistoryQuery};
pub use responses::{DistanceResponse, HealthResponse, ErrorResponse};
