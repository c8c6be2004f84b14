//! Price catalog client.
//!
//! Talks to the Azure Retail Prices API.
//! https://learn.microsoft.com/en-us/rest/api/cost-management/retail-prices/azure-retail-prices

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{CatalogError, CatalogResult};
use crate::models::{CatalogItem, CatalogPage};
use crate::query::CatalogQuery;

/// Azure Retail Prices API endpoint
pub const AZURE_PRICING_API: &str = "https://prices.azure.com/api/retail/prices";

/// API version that returns reservation items with their term
pub const AZURE_PRICING_API_VERSION: &str = "2023-01-01-preview";

/// Source of unit prices for catalog queries
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceCatalog: Send + Sync {
    /// Run `query` and return every matching item, in catalog order
    async fn query(&self, query: &CatalogQuery) -> CatalogResult<Vec<CatalogItem>>;
}

#[derive(Debug, Clone)]
pub struct AzureRetailCatalogConfig {
    pub base_url: String,
    pub api_version: String,
    /// Timeout for a single HTTP call
    pub request_timeout: Duration,
    /// Stop following `NextPageLink` after this many pages
    pub max_pages: usize,
}

impl Default for AzureRetailCatalogConfig {
    fn default() -> Self {
        Self {
            base_url: AZURE_PRICING_API.to_string(),
            api_version: AZURE_PRICING_API_VERSION.to_string(),
            request_timeout: Duration::from_secs(10),
            max_pages: 5,
        }
    }
}

/// HTTP client for the Azure Retail Prices API
#[derive(Debug, Clone)]
pub struct AzureRetailCatalog {
    config: AzureRetailCatalogConfig,
    client: Client,
}

impl AzureRetailCatalog {
    pub fn new(config: AzureRetailCatalogConfig) -> CatalogResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("plan-estimator/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &AzureRetailCatalogConfig {
        &self.config
    }

    fn query_url(&self, query: &CatalogQuery) -> String {
        format!(
            "{}?api-version={}&$filter={}",
            self.config.base_url,
            urlencoding::encode(&self.config.api_version),
            urlencoding::encode(&query.filter())
        )
    }

    async fn fetch_page(&self, url: &str) -> CatalogResult<CatalogPage> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CatalogError::RateLimited);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<CatalogPage>()
            .await
            .map_err(|e| CatalogError::Parse(e.to_string()))
    }

    /// Verify the API answers at all
    pub async fn health_check(&self) -> CatalogResult<bool> {
        let url = format!(
            "{}?api-version={}&$top=1",
            self.config.base_url,
            urlencoding::encode(&self.config.api_version)
        );
        let response = self.client.get(&url).send().await?;
        Ok(response.status().is_success())
    }
}

#[async_trait]
impl PriceCatalog for AzureRetailCatalog {
    #[instrument(skip_all, fields(filter = %query))]
    async fn query(&self, query: &CatalogQuery) -> CatalogResult<Vec<CatalogItem>> {
        let mut url = self.query_url(query);
        let mut items = Vec::new();
        let mut pages = 0;

        loop {
            let page = self.fetch_page(&url).await?;
            pages += 1;
            items.extend(page.items);

            match page.next_page_link {
                Some(next) if !next.is_empty() => {
                    if pages >= self.config.max_pages {
                        warn!(pages, items = items.len(), "Catalog page limit reached, truncating");
                        break;
                    }
                    url = next;
                }
                _ => break,
            }
        }

        debug!(pages, items = items.len(), "Fetched catalog items");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VirtualMachine;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn catalog(server: &MockServer) -> AzureRetailCatalog {
        AzureRetailCatalog::new(AzureRetailCatalogConfig {
            base_url: format!("{}/api/retail/prices", server.uri()),
            max_pages: 2,
            ..Default::default()
        })
        .unwrap()
    }

    fn query() -> CatalogQuery {
        VirtualMachine::new("vm", "Standard_D2s_v3", "eastus")
            .catalog_query()
            .unwrap()
    }

    #[tokio::test]
    async fn test_query_sends_filter_and_decodes_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/retail/prices"))
            .and(query_param("api-version", AZURE_PRICING_API_VERSION))
            .and(query_param("$filter", query().filter()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Items": [
                    {
                        "currencyCode": "USD",
                        "unitPrice": 0.096,
                        "retailPrice": 0.096,
                        "armRegionName": "eastus",
                        "armSkuName": "Standard_D2s_v3",
                        "skuName": "D2s v3",
                        "productName": "Virtual Machines DSv3 Series",
                        "serviceName": "Virtual Machines",
                        "unitOfMeasure": "1 Hour",
                        "type": "Consumption"
                    }
                ],
                "NextPageLink": null
            })))
            .expect(1)
            .mount(&server)
            .await;

        let items = catalog(&server).query(&query()).await.unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price, 0.096);
        assert_eq!(items[0].arm_sku_name, "Standard_D2s_v3");
        assert_eq!(items[0].reservation_term, None);
    }

    #[tokio::test]
    async fn test_query_follows_next_page_link_up_to_limit() {
        let server = MockServer::start().await;
        let page = |price: f64, next: Option<String>| {
            ResponseTemplate::new(200).set_body_json(json!({
                "Items": [{ "unitPrice": price, "reservationTerm": "1 Year" }],
                "NextPageLink": next
            }))
        };

        Mock::given(path("/api/retail/prices"))
            .respond_with(page(1.0, Some(format!("{}/page/2", server.uri()))))
            .mount(&server)
            .await;
        Mock::given(path("/page/2"))
            .respond_with(page(2.0, Some(format!("{}/page/3", server.uri()))))
            .mount(&server)
            .await;
        Mock::given(path("/page/3"))
            .respond_with(page(3.0, None))
            .expect(0)
            .mount(&server)
            .await;

        let items = catalog(&server).query(&query()).await.unwrap();

        let prices: Vec<f64> = items.iter().map(|i| i.unit_price).collect();
        assert_eq!(prices, vec![1.0, 2.0]);
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let err = catalog(&server).query(&query()).await.unwrap_err();
        assert!(matches!(err, CatalogError::Api { status: 500, ref message } if message == "upstream down"));
    }

    #[tokio::test]
    async fn test_rate_limit_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = catalog(&server).query(&query()).await.unwrap_err();
        assert!(matches!(err, CatalogError::RateLimited));
    }

    #[tokio::test]
    async fn test_garbage_body_is_parse_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>nope</html>"))
            .mount(&server)
            .await;

        let err = catalog(&server).query(&query()).await.unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[tokio::test]
    async fn test_health_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("$top", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Items": [] })))
            .mount(&server)
            .await;

        assert!(catalog(&server).health_check().await.unwrap());
    }
}
