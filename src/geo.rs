// Geocoding collaborator for address resolution and radius search.
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::config;

/// Earth radius used to turn great-circle angles into distances.
pub const EARTH_RADIUS_MILES: f64 = 3963.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Error)]
pub enum GeoError {
    #[error("geocoder request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("No results for location {0}")]
    NoResult(String),

    #[error("geocoder response malformed: {0}")]
    Malformed(String),

    #[error("geocoder is not configured")]
    NotConfigured,
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, location: &str) -> Result<GeoPoint, GeoError>;
}

/// Nominatim-style HTTP geocoder: `?q=<location>&format=json&limit=1`,
/// answered by a JSON array whose entries carry `lat`/`lon` strings.
pub struct HttpGeocoder {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpGeocoder {
    pub fn from_config() -> Result<Self, GeoError> {
        let geo = &config().geocoder;
        Self::new(geo.endpoint.clone(), geo.api_key.clone())
    }

    pub fn new(endpoint: String, api_key: Option<String>) -> Result<Self, GeoError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("campdir/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            endpoint,
            api_key,
        })
    }
}

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, location: &str) -> Result<GeoPoint, GeoError> {
        let mut request = self.client.get(&self.endpoint).query(&[
            ("q", location),
            ("format", "json"),
            ("limit", "1"),
        ]);
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key.as_str())]);
        }

        let places: Vec<Place> = request.send().await?.error_for_status()?.json().await?;
        let place = places
            .into_iter()
            .next()
            .ok_or_else(|| GeoError::NoResult(location.to_string()))?;

        let latitude = place
            .lat
            .parse()
            .map_err(|_| GeoError::Malformed(format!("lat {:?}", place.lat)))?;
        let longitude = place
            .lon
            .parse()
            .map_err(|_| GeoError::Malformed(format!("lon {:?}", place.lon)))?;
        Ok(GeoPoint {
            latitude,
            longitude,
        })
    }
}

/// Stand-in used when no geocoder endpoint is configured; every lookup
/// reports the collaborator as unavailable.
pub struct DisabledGeocoder;

#[async_trait]
impl Geocoder for DisabledGeocoder {
    async fn geocode(&self, _location: &str) -> Result<GeoPoint, GeoError> {
        Err(GeoError::NotConfigured)
    }
}
