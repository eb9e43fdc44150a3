use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use receiptly_agent::tools::LocationResolver;
use receiptly_core::config::LocationConfig;
use receiptly_core::domain::price::Location;

/// The subset of the ipapi.co response this crate reads.
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    city: Option<String>,
    region: Option<String>,
    country_name: Option<String>,
}

impl IpApiResponse {
    /// Gaps in an otherwise successful response become "Unknown" per field;
    /// [`Location::default`] (with its "United States" country) is reserved
    /// for lookups that fail outright.
    fn into_location(self) -> Location {
        Location {
            city: self.city.unwrap_or_else(|| "Unknown".to_string()),
            region: self.region.unwrap_or_else(|| "Unknown".to_string()),
            country: self.country_name.unwrap_or_else(|| "Unknown".to_string()),
        }
    }
}

/// Resolves the server's public-IP location. Every failure path returns
/// [`Location::default`]; price queries still work, just unlocalized.
pub struct IpLocator {
    http: reqwest::Client,
    endpoint: String,
}

impl IpLocator {
    pub fn new(config: &LocationConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, endpoint: config.endpoint.clone() })
    }
}

#[async_trait]
impl LocationResolver for IpLocator {
    async fn resolve(&self) -> Location {
        let response = match self.http.get(&self.endpoint).send().await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "location lookup failed, using default");
                return Location::default();
            }
        };

        if !response.status().is_success() {
            warn!(status = response.status().as_u16(), "location lookup rejected");
            return Location::default();
        }

        match response.json::<IpApiResponse>().await {
            Ok(parsed) => {
                let location = parsed.into_location();
                debug!(city = %location.city, country = %location.country, "resolved location");
                location
            }
            Err(err) => {
                warn!(error = %err, "location response did not parse, using default");
                Location::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use receiptly_core::domain::price::Location;

    use super::IpApiResponse;

    #[test]
    fn maps_the_ipapi_field_names() {
        let parsed: IpApiResponse = serde_json::from_str(
            r#"{"ip": "203.0.113.9", "city": "Lisbon", "region": "Lisbon", "country_name": "Portugal"}"#,
        )
        .expect("should parse");

        let location = parsed.into_location();
        assert_eq!(location.city, "Lisbon");
        assert_eq!(location.country, "Portugal");
    }

    #[test]
    fn missing_fields_fall_back_to_unknown_per_field() {
        let parsed: IpApiResponse =
            serde_json::from_str(r#"{"city": "Lisbon"}"#).expect("should parse");

        let location = parsed.into_location();
        assert_eq!(location.city, "Lisbon");
        assert_eq!(location.region, "Unknown");
        assert_eq!(location.country, "Unknown");
    }

    #[test]
    fn successful_but_empty_responses_never_claim_the_failure_default() {
        let empty: IpApiResponse = serde_json::from_str("{}").expect("should parse");

        let location = empty.into_location();
        assert_eq!(location.country, "Unknown");
        assert_ne!(location, Location::default());
    }
}
