use crate::config::GeocodingSettings;
use crate::models::{AddressRole, Coordinates};
use reqwest::{header::USER_AGENT, Client};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when resolving an address
#[derive(Debug, Error)]
pub enum GeocodingError {
    /// The service answered but had no candidate for the address
    #[error("Could not find coordinates for {role} address: {address}")]
    AddressNotFound { address: String, role: AddressRole },

    /// Transport failure, non-2xx status, or an unusable payload
    #[error("geocoding service unavailable: {0}")]
    Unavailable(String),
}

impl From<reqwest::Error> for GeocodingError {
    fn from(err: reqwest::Error) -> Self {
        GeocodingError::Unavailable(err.to_string())
    }
}

/// One candidate from a Nominatim-style `/search` response
#[derive(Debug, Deserialize)]
struct Candidate {
    lat: String,
    lon: String,
}

/// Nominatim-style geocoding client
///
/// Issues one free-text search per address with a result limit of 1.
/// No retries, no caching.
#[derive(Debug, Clone)]
pub struct GeocodingClient {
    client: Client,
    base_url: String,
    user_agent: String,
    timeout: Duration,
}

impl GeocodingClient {
    pub fn new(client: Client, settings: &GeocodingSettings) -> Self {
        Self {
            client,
            base_url: settings.base_url.clone(),
            user_agent: settings.user_agent.clone(),
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }

    /// Resolve a free-text address to coordinates
    ///
    /// `role` only shapes the not-found error, never the lookup itself.
    pub async fn resolve(&self, address: &str, role: AddressRole) -> Result<Coordinates, GeocodingError> {
        let url = format!("{}/search", self.base_url.trim_end_matches('/'));

        tracing::debug!("Geocoding {} address: {}", role, address);

        let response = self
            .client
            .get(&url)
            .query(&[("q", address), ("format", "json"), ("limit", "1")])
            .header(USER_AGENT, &self.user_agent)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeocodingError::Unavailable(format!(
                "search returned status {}",
                response.status()
            )));
        }

        let candidates: Vec<Candidate> = response.json().await?;

        let first = candidates.first().ok_or_else(|| {
            tracing::warn!("No coordinates found for {} address: {}", role, address);
            GeocodingError::AddressNotFound {
                address: address.to_string(),
                role,
            }
        })?;

        parse_candidate(first)
    }
}

fn parse_candidate(candidate: &Candidate) -> Result<Coordinates, GeocodingError> {
    let latitude: f64 = candidate
        .lat
        .trim()
        .parse()
        .map_err(|_| GeocodingError::Unavailable(format!("invalid latitude {:?}", candidate.lat)))?;
    let longitude: f64 = candidate
        .lon
        .trim()
        .parse()
        .map_err(|_| GeocodingError::Unavailable(format!("invalid longitude {:?}", candidate.lon)))?;

    let coordinates = Coordinates::new(latitude, longitude);
    if !coordinates.is_valid() {
        return Err(GeocodingError::Unavailable(format!(
            "coordinates out of range: {}, {}",
            latitude, longitude
        )));
    }

    Ok(coordinates)
}
