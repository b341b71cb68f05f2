use super::util::{RetryPolicy, http_client, with_retry};
use crate::core::convert::price_per_gram_from_troy_ounce;
use crate::core::error::{FetchError, FetchResult};
use crate::core::quote::MetalType;
use crate::core::source::MetalPriceProvider;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Spot prices in USD per troy ounce from a gold-api compatible service.
pub struct GoldApiProvider {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl GoldApiProvider {
    pub fn new(base_url: &str) -> Self {
        Self::with_retry(base_url, RetryPolicy::default())
    }

    pub fn with_retry(base_url: &str, retry: RetryPolicy) -> Self {
        GoldApiProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(),
            retry,
        }
    }
}

#[derive(Deserialize, Debug)]
struct SpotPriceResponse {
    price: f64,
}

#[async_trait]
impl MetalPriceProvider for GoldApiProvider {
    #[instrument(
        name = "MetalPriceFetch",
        skip(self),
        fields(symbol = %metal.symbol())
    )]
    async fn fetch_price_per_gram(&self, metal: MetalType) -> FetchResult<f64> {
        let symbol = metal.symbol();
        let url = format!("{}/price/{}", self.base_url, symbol);
        debug!("Requesting spot price from {}", url);

        let response = with_retry(
            || self.client.get(&url).send(),
            self.retry.retries,
            self.retry.delay_ms,
        )
        .await
        .map_err(|source| FetchError::Request {
            key: symbol.to_string(),
            source,
        })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                key: symbol.to_string(),
                status: response.status(),
            });
        }

        let text = response.text().await.map_err(|source| FetchError::Request {
            key: symbol.to_string(),
            source,
        })?;
        let data: SpotPriceResponse =
            serde_json::from_str(&text).map_err(|e| FetchError::Malformed {
                key: symbol.to_string(),
                reason: e.to_string(),
            })?;

        if !data.price.is_finite() || data.price <= 0.0 {
            return Err(FetchError::Malformed {
                key: symbol.to_string(),
                reason: format!("non-positive price {}", data.price),
            });
        }

        let per_gram = price_per_gram_from_troy_ounce(data.price);
        debug!(per_ounce = data.price, per_gram, "Received spot price");
        Ok(per_gram)
    }
}
