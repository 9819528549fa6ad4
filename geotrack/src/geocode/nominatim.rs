//! Nominatim reverse geocoder.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use super::error::GeocodeError;
use super::http::{AsyncHttpClient, ReqwestClient};
use crate::BoxFuture;

/// Default public endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://nominatim.openstreetmap.org";

/// Number of leading `display_name` segments kept for display.
pub const ADDRESS_SEGMENTS: usize = 3;

/// Resolves coordinates to a short human-readable address.
pub trait ReverseGeocoder: Send + Sync {
    fn lookup(&self, latitude: f64, longitude: f64) -> BoxFuture<'_, Result<String, GeocodeError>>;
}

/// Configuration for [`NominatimGeocoder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeocodeConfig {
    /// Base URL, without the `/reverse` path.
    pub endpoint: String,
    /// Detail level, 18 = building.
    pub zoom: u8,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for GeocodeConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            zoom: 18,
            timeout: Duration::from_secs(10),
            user_agent: concat!("geotrack/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl GeocodeConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    display_name: Option<String>,
}

/// Reverse geocoder backed by a Nominatim-compatible HTTP API.
pub struct NominatimGeocoder {
    client: Arc<dyn AsyncHttpClient>,
    config: GeocodeConfig,
}

impl NominatimGeocoder {
    pub fn new(client: Arc<dyn AsyncHttpClient>, config: GeocodeConfig) -> Self {
        Self { client, config }
    }

    /// Geocoder using a reqwest client built from `config`.
    pub fn from_config(config: GeocodeConfig) -> Result<Self, GeocodeError> {
        let client = ReqwestClient::new(&config.user_agent, config.timeout)?;
        Ok(Self::new(Arc::new(client), config))
    }

    /// Request URL for a coordinate.
    pub fn lookup_url(&self, latitude: f64, longitude: f64) -> String {
        format!(
            "{}/reverse?format=json&lat={}&lon={}&zoom={}&addressdetails=1",
            self.config.endpoint.trim_end_matches('/'),
            latitude,
            longitude,
            self.config.zoom
        )
    }
}

impl ReverseGeocoder for NominatimGeocoder {
    fn lookup(&self, latitude: f64, longitude: f64) -> BoxFuture<'_, Result<String, GeocodeError>> {
        let url = self.lookup_url(latitude, longitude);
        Box::pin(async move {
            let body = self.client.get(&url).await?;
            parse_address(&body)
        })
    }
}

/// Extract the short address from a reverse-geocoding response body.
pub fn parse_address(body: &[u8]) -> Result<String, GeocodeError> {
    let response: ReverseResponse =
        serde_json::from_slice(body).map_err(|e| GeocodeError::Parse(e.to_string()))?;

    match response.display_name {
        Some(name) if !name.trim().is_empty() => Ok(short_address(&name)),
        _ => Err(GeocodeError::MissingDisplayName),
    }
}

/// Keep the first [`ADDRESS_SEGMENTS`] comma-separated segments.
pub fn short_address(display_name: &str) -> String {
    display_name
        .split(',')
        .take(ADDRESS_SEGMENTS)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::MockHttpClient;

    const PAULISTA: &str = r#"{
        "place_id": 1,
        "display_name": "Avenida Paulista, 1578, Bela Vista, São Paulo, Região Metropolitana de São Paulo, Brasil"
    }"#;

    #[test]
    fn test_short_address() {
        assert_eq!(short_address("A, B, C, D, E"), "A, B, C");
        assert_eq!(short_address("Only one"), "Only one");
    }

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address(PAULISTA.as_bytes()),
            Ok("Avenida Paulista, 1578, Bela Vista".to_string())
        );
        assert_eq!(
            parse_address(br#"{"error":"Unable to geocode"}"#),
            Err(GeocodeError::MissingDisplayName)
        );
        assert_eq!(
            parse_address(br#"{"display_name":""}"#),
            Err(GeocodeError::MissingDisplayName)
        );
        assert!(matches!(
            parse_address(b"<html>"),
            Err(GeocodeError::Parse(_))
        ));
    }

    #[test]
    fn test_lookup_url() {
        let geocoder = NominatimGeocoder::new(
            Arc::new(MockHttpClient::json("{}")),
            GeocodeConfig::default().with_endpoint("http://localhost:8080/"),
        );
        assert_eq!(
            geocoder.lookup_url(10.5, -20.25),
            "http://localhost:8080/reverse?format=json&lat=10.5&lon=-20.25&zoom=18&addressdetails=1"
        );
    }

    #[tokio::test]
    async fn test_lookup_success() {
        let client = Arc::new(MockHttpClient::json(PAULISTA));
        let geocoder = NominatimGeocoder::new(client.clone(), GeocodeConfig::default());

        let address = geocoder.lookup(-23.56, -46.65).await.unwrap();
        assert_eq!(address, "Avenida Paulista, 1578, Bela Vista");
        assert_eq!(client.requests().len(), 1);
        assert!(client.requests()[0].contains("lat=-23.56"));
    }

    #[tokio::test]
    async fn test_lookup_propagates_status_error() {
        let client = Arc::new(MockHttpClient::new(Err(GeocodeError::Status {
            status: 503,
            url: "x".to_string(),
        })));
        let geocoder = NominatimGeocoder::new(client, GeocodeConfig::default());

        assert!(matches!(
            geocoder.lookup(0.0, 0.0).await,
            Err(GeocodeError::Status { status: 503, .. })
        ));
    }
}
