use super::util::{RetryPolicy, http_client, with_retry};
use crate::core::error::{FetchError, FetchResult};
use crate::core::source::CurrencyRateProvider;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Mid-market exchange rates from a hexarate compatible service.
pub struct HexarateProvider {
    base_url: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl HexarateProvider {
    pub fn new(base_url: &str) -> Self {
        Self::with_retry(base_url, RetryPolicy::default())
    }

    pub fn with_retry(base_url: &str, retry: RetryPolicy) -> Self {
        HexarateProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: http_client(),
            retry,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RateResponse {
    data: RateData,
}

#[derive(Debug, Deserialize)]
struct RateData {
    mid: f64,
}

#[async_trait]
impl CurrencyRateProvider for HexarateProvider {
    #[instrument(name = "ExchangeRateFetch", skip(self))]
    async fn get_rate(&self, from: &str, to: &str) -> FetchResult<f64> {
        let pair = format!("{from}/{to}");
        let url = format!("{}/api/rates/latest/{}?target={}", self.base_url, from, to);
        debug!("Requesting exchange rate {} from {}", pair, url);

        let response = with_retry(
            || self.client.get(&url).send(),
            self.retry.retries,
            self.retry.delay_ms,
        )
        .await
        .map_err(|source| FetchError::Request {
            key: pair.clone(),
            source,
        })?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                key: pair,
                status: response.status(),
            });
        }

        let text = response.text().await.map_err(|source| FetchError::Request {
            key: pair.clone(),
            source,
        })?;

        let data: RateResponse = serde_json::from_str(&text).map_err(|e| FetchError::Malformed {
            key: pair.clone(),
            reason: e.to_string(),
        })?;

        let rate = data.data.mid;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(FetchError::Malformed {
                key: pair,
                reason: format!("non-positive rate {rate}"),
            });
        }
        Ok(rate)
    }
}
