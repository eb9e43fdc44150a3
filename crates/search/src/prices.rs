use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use receiptly_agent::tools::PriceSearch;
use receiptly_core::config::SearchConfig;
use receiptly_core::domain::price::{Location, PriceLookup};

const CUSTOM_SEARCH_ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";
const RESULT_COUNT: u32 = 5;

/// Google Custom Search scoped to shopping-flavored queries. Credentials are
/// optional; without them every search degrades to an unavailability value.
pub struct CustomSearchClient {
    http: reqwest::Client,
    api_key: Option<SecretString>,
    engine_id: Option<String>,
}

impl CustomSearchClient {
    pub fn new(config: &SearchConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, api_key: config.api_key.clone(), engine_id: config.engine_id.clone() })
    }

    fn shopping_query(query: &str, location: &Location) -> String {
        format!(
            "{query} best prices in {city} {country}, more emphasis on online availability \
             and country",
            city = location.city,
            country = location.country,
        )
    }
}

#[async_trait]
impl PriceSearch for CustomSearchClient {
    async fn search(&self, query: &str, location: &Location) -> PriceLookup {
        let (Some(api_key), Some(engine_id)) = (self.api_key.as_ref(), self.engine_id.as_ref())
        else {
            return PriceLookup::Unavailable {
                reason: "Price search unavailable - missing API credentials".to_string(),
            };
        };

        let shopping_query = Self::shopping_query(query, location);
        debug!(query = %shopping_query, "querying custom search");

        let result_count = RESULT_COUNT.to_string();
        let response = self
            .http
            .get(CUSTOM_SEARCH_ENDPOINT)
            .query(&[
                ("key", api_key.expose_secret()),
                ("cx", engine_id.as_str()),
                ("q", shopping_query.as_str()),
                ("num", result_count.as_str()),
            ])
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "price search transport failure");
                return PriceLookup::Unavailable {
                    reason: format!("Network or request error: {err}"),
                };
            }
        };

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "price search rejected");
            return PriceLookup::Unavailable {
                reason: format!("API returned status {}", status.as_u16()),
            };
        }

        match response.json::<serde_json::Value>().await {
            Ok(results) => PriceLookup::Available { results },
            Err(err) => {
                PriceLookup::Unavailable { reason: format!("Network or request error: {err}") }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use receiptly_agent::tools::PriceSearch;
    use receiptly_core::config::SearchConfig;
    use receiptly_core::domain::price::{Location, PriceLookup};

    use super::CustomSearchClient;

    #[tokio::test]
    async fn missing_credentials_degrade_without_a_request() {
        let client = CustomSearchClient::new(&SearchConfig {
            api_key: None,
            engine_id: None,
            timeout_secs: 10,
        })
        .expect("should build");

        let lookup = client.search("oat milk", &Location::default()).await;
        assert_eq!(
            lookup,
            PriceLookup::Unavailable {
                reason: "Price search unavailable - missing API credentials".to_string()
            }
        );
    }

    #[test]
    fn query_carries_the_resolved_location() {
        let location = Location {
            city: "Lisbon".to_string(),
            region: "Lisbon".to_string(),
            country: "Portugal".to_string(),
        };

        let query = CustomSearchClient::shopping_query("iphone 15", &location);
        assert_eq!(
            query,
            "iphone 15 best prices in Lisbon Portugal, more emphasis on online availability \
             and country"
        );
    }
}
