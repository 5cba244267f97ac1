use crate::core::distance::distance_between;
use crate::models::{AddressQuery, AddressRole, CleanedAddresses, DistanceResult, NewQueryRecord, QueryHistoryRecord};
use crate::services::{AddressCleaner, CaptchaError, CaptchaVerifier, GeocodingClient, GeocodingError, HistoryStore, StoreError};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use validator::Validate;

/// Terminal outcomes of a failed pipeline run
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("captcha invalid: {0}")]
    CaptchaInvalid(#[source] CaptchaError),

    #[error("Could not find coordinates for {role} address: {address}")]
    AddressNotFound { address: String, role: AddressRole },

    #[error("geocoding unavailable: {0}")]
    GeocodingUnavailable(String),

    #[error("persistence failed: {0}")]
    PersistenceFailed(#[source] StoreError),
}

impl From<GeocodingError> for PipelineError {
    fn from(err: GeocodingError) -> Self {
        match err {
            GeocodingError::AddressNotFound { address, role } => {
                PipelineError::AddressNotFound { address, role }
            }
            GeocodingError::Unavailable(reason) => PipelineError::GeocodingUnavailable(reason),
        }
    }
}

/// Successful pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub distance: DistanceResult,
    pub cleaned: CleanedAddresses,
    pub record: QueryHistoryRecord,
}

/// Pipeline stages, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CaptchaVerified,
    AddressesCleaned,
    SourceResolved,
    DestinationResolved,
    DistanceComputed,
    Persisted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::CaptchaVerified => "captcha_verified",
            Stage::AddressesCleaned => "addresses_cleaned",
            Stage::SourceResolved => "source_resolved",
            Stage::DestinationResolved => "destination_resolved",
            Stage::DistanceComputed => "distance_computed",
            Stage::Persisted => "persisted",
        };
        f.write_str(name)
    }
}

/// Captcha gate, best-effort cleaning, geocoding, distance, persistence
///
/// Any failure aborts the run before anything is written; the record is
/// persisted only once both coordinates and the distance exist.
pub struct QueryPipeline<S> {
    captcha: CaptchaVerifier,
    cleaner: AddressCleaner,
    geocoder: GeocodingClient,
    store: Arc<S>,
}

impl<S: HistoryStore> QueryPipeline<S> {
    pub fn new(
        captcha: CaptchaVerifier,
        cleaner: AddressCleaner,
        geocoder: GeocodingClient,
        store: Arc<S>,
    ) -> Self {
        Self {
            captcha,
            cleaner,
            geocoder,
            store,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    #[tracing::instrument(name = "query_pipeline", skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
    pub async fn run(&self, query: &AddressQuery) -> Result<PipelineOutcome, PipelineError> {
        query
            .validate()
            .map_err(|e| PipelineError::Validation(e.to_string()))?;

        if let Err(e) = self.captcha.verify(&query.captcha_token).await {
            tracing::warn!("Captcha verification failed: {}", e);
            return Err(PipelineError::CaptchaInvalid(e));
        }
        tracing::debug!(stage = %Stage::CaptchaVerified);

        let cleaned = self.cleaner.clean(&query.source, &query.destination).await;
        tracing::debug!(stage = %Stage::AddressesCleaned);

        // Both lookups run together; the source outcome is checked first so
        // a double failure reports the source side.
        let (source, destination) = tokio::join!(
            self.geocoder.resolve(&cleaned.source, AddressRole::Source),
            self.geocoder.resolve(&cleaned.destination, AddressRole::Destination),
        );
        let from = source.map_err(log_geocoding_failure)?;
        tracing::debug!(stage = %Stage::SourceResolved);
        let to = destination.map_err(log_geocoding_failure)?;
        tracing::debug!(stage = %Stage::DestinationResolved);

        let distance = distance_between(from, to);
        tracing::debug!(stage = %Stage::DistanceComputed);

        let record = self
            .store
            .insert_query(NewQueryRecord {
                source: cleaned.source.clone(),
                destination: cleaned.destination.clone(),
                kilometers: distance.kilometers,
                miles: distance.miles,
            })
            .await
            .map_err(|e| {
                tracing::error!("Failed to persist query: {}", e);
                PipelineError::PersistenceFailed(e)
            })?;
        tracing::debug!(stage = %Stage::Persisted, id = record.id);

        tracing::info!(
            "Calculated distance: {:.2} km / {:.2} miles",
            distance.kilometers,
            distance.miles
        );

        Ok(PipelineOutcome {
            distance,
            cleaned,
            record,
        })
    }
}

fn log_geocoding_failure(err: GeocodingError) -> PipelineError {
    match &err {
        GeocodingError::AddressNotFound { .. } => tracing::info!("{}", err),
        GeocodingError::Unavailable(reason) => tracing::error!("Geocoding failed: {}", reason),
    }
    err.into()
}
