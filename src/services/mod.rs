// Service exports
pub mod captcha;
pub mod cleaner;
pub mod geocoding;
pub mod postgres;

pub use captcha::{CaptchaVerifier, CaptchaError};
pub use cleaner::{AddressCleaner, CleanerError};
pub use geocoding::{GeocodingClient, GeocodingError};
pub use postgres::{HistoryStore, PostgresClient, StoreError};
