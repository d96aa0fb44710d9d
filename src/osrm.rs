//! OSRM HTTP adapter for walking paths.

use serde::Deserialize;

use crate::error::DirectionsError;
use crate::itinerary::Coordinate;
use crate::traits::WalkingDirections;

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "foot".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn route_url(&self, stops: &[Coordinate]) -> String {
        // OSRM takes lng,lat pairs.
        let coords = stops
            .iter()
            .map(|point| format!("{:.6},{:.6}", point.lng, point.lat))
            .collect::<Vec<_>>()
            .join(";");

        format!(
            "{}/route/v1/{}/{}?overview=full&geometries=polyline",
            self.config.base_url, self.config.profile, coords
        )
    }
}

impl WalkingDirections for OsrmClient {
    async fn walking_path(&self, stops: &[Coordinate]) -> Result<String, DirectionsError> {
        if stops.len() < 2 {
            return Err(DirectionsError::TooFewStops(stops.len()));
        }

        let body = self
            .client
            .get(self.route_url(stops))
            .send()
            .await?
            .json::<OsrmRouteResponse>()
            .await?;

        if body.code != "Ok" {
            return match body.code.as_str() {
                "NoRoute" | "NoSegment" => Err(DirectionsError::NoRoute(stops.len())),
                _ => Err(DirectionsError::Status {
                    status: body.code,
                    message: body.message.unwrap_or_default(),
                }),
            };
        }

        body.routes
            .into_iter()
            .next()
            .map(|route| route.geometry)
            .filter(|geometry| !geometry.is_empty())
            .ok_or(DirectionsError::NoRoute(stops.len()))
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: String,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_foot_profile() {
        let config = OsrmConfig::default();
        assert_eq!(config.profile, "foot");
        assert_eq!(config.base_url, "http://localhost:5000");
    }

    #[test]
    fn route_url_uses_lng_lat_order() {
        let client = OsrmClient::new(OsrmConfig::default()).unwrap();
        let url = client.route_url(&[Coordinate::new(35.5767, 137.5958), Coordinate::new(35.5256, 137.565)]);
        assert_eq!(
            url,
            "http://localhost:5000/route/v1/foot/137.595800,35.576700;137.565000,35.525600?overview=full&geometries=polyline"
        );
    }

    #[test]
    fn error_response_parses() {
        let json = r#"{"code": "NoRoute", "message": "Impossible route between points"}"#;
        let body: OsrmRouteResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.code, "NoRoute");
        assert!(body.routes.is_empty());
    }

    #[tokio::test]
    async fn single_stop_is_rejected_locally() {
        let client = OsrmClient::new(OsrmConfig::default()).unwrap();
        let err = client
            .walking_path(&[Coordinate::new(35.5, 137.5)])
            .await
            .unwrap_err();
        assert!(matches!(err, DirectionsError::TooFewStops(1)));
    }
}
