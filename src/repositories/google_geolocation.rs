// src/repositories/google_geolocation.rs - GeolocationService via the Google API
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::models::geo::GeoPoint;
use crate::repositories::ports::{GeolocationService, PermissionState, StoreError};

pub const GEOLOCATION_ENDPOINT: &str = "https://www.googleapis.com/geolocation/v1/geolocate";

/// Server-side stand-in for the browser geolocation sensor. Permission maps
/// to whether an API key is configured at all.
#[derive(Clone)]
pub struct GoogleGeolocation {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct GeolocateResponse {
    location: GeolocateLocation,
}

#[derive(Deserialize)]
struct GeolocateLocation {
    lat: f64,
    lng: f64,
}

impl GoogleGeolocation {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self::with_endpoint(client, GEOLOCATION_ENDPOINT.to_string(), api_key)
    }

    pub fn with_endpoint(client: Client, endpoint: String, api_key: Option<String>) -> Self {
        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl GeolocationService for GoogleGeolocation {
    async fn request_permission(&self) -> PermissionState {
        match self.api_key {
            Some(_) => PermissionState::Granted,
            None => PermissionState::Denied,
        }
    }

    async fn current_position(&self) -> Result<GeoPoint, StoreError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or_else(|| StoreError::Geolocation("no geolocation api key".to_string()))?;

        let url = format!("{}?key={}", self.endpoint, key);
        let resp = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "considerIp": true }))
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(StoreError::Geolocation(format!(
                "geolocate failed: {} -> {}",
                status.as_u16(),
                text
            )));
        }

        let parsed: GeolocateResponse = serde_json::from_str(&text)?;
        Ok(GeoPoint::new(parsed.location.lat, parsed.location.lng))
    }
}
