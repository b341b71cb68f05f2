//! Metal price and exchange rate lookups, fronted by the quote cache.

use crate::core::cache::QuoteCache;
use crate::core::error::FetchResult;
use crate::core::quote::{BASE_CURRENCY, Currency, MetalType};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Spot price of a metal in USD per gram.
#[async_trait]
pub trait MetalPriceProvider: Send + Sync {
    async fn fetch_price_per_gram(&self, metal: MetalType) -> FetchResult<f64>;
}

/// Units of `to` for one unit of `from`.
#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn get_rate(&self, from: &str, to: &str) -> FetchResult<f64>;
}

/// What the conversion session needs from the outside world.
#[async_trait]
pub trait QuoteSource: Send + Sync {
    async fn metal_price_per_gram(&self, metal: MetalType) -> Result<f64>;

    /// `custom_rate` is used as-is when `currency` is the custom sentinel.
    async fn currency_rate(&self, currency: &Currency, custom_rate: f64) -> Result<f64>;
}

/// What to do when an upstream fetch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Last cached value for the key, however old; otherwise 0 for metal
    /// prices and 1 for exchange rates.
    #[default]
    CachedOrNeutral,
    /// Give up on the recalculation and leave the fields untouched.
    Abort,
}

const NEUTRAL_METAL_PRICE: f64 = 0.0;
const NEUTRAL_EXCHANGE_RATE: f64 = 1.0;

pub struct RateSource {
    metal: Arc<dyn MetalPriceProvider>,
    currency: Arc<dyn CurrencyRateProvider>,
    cache: QuoteCache,
    policy: FailurePolicy,
}

impl RateSource {
    pub fn new(
        metal: Arc<dyn MetalPriceProvider>,
        currency: Arc<dyn CurrencyRateProvider>,
        cache: QuoteCache,
        policy: FailurePolicy,
    ) -> Self {
        Self {
            metal,
            currency,
            cache,
            policy,
        }
    }

    #[cfg(test)]
    pub(crate) fn cache(&self) -> &QuoteCache {
        &self.cache
    }

    async fn fall_back(&self, key: &str, neutral: f64, err: anyhow::Error) -> Result<f64> {
        warn!(key = %key, error = %err, "Unable to fetch quote");
        match self.policy {
            FailurePolicy::Abort => Err(err),
            FailurePolicy::CachedOrNeutral => {
                let value = self
                    .cache
                    .get_any(key)
                    .await
                    .map_or(neutral, |quote| quote.value);
                debug!(key = %key, value, "Using fallback quote");
                Ok(value)
            }
        }
    }

    pub async fn fetch_metal_price_per_gram(&self, metal: MetalType) -> Result<f64> {
        let key = metal.cache_key();
        if let Some(quote) = self.cache.get(key).await {
            return Ok(quote.value);
        }

        match self.metal.fetch_price_per_gram(metal).await {
            Ok(price) => {
                self.cache.put(key, price).await;
                Ok(price)
            }
            Err(e) => self.fall_back(key, NEUTRAL_METAL_PRICE, e.into()).await,
        }
    }

    pub async fn fetch_currency_rate(&self, currency: &Currency, custom_rate: f64) -> Result<f64> {
        let code = match currency {
            Currency::Custom => {
                debug!(rate = custom_rate, "Using custom exchange rate");
                return if custom_rate > 0.0 {
                    Ok(custom_rate)
                } else {
                    Err(anyhow!("Custom rate must be positive, got {}", custom_rate))
                };
            }
            Currency::Code(code) if code == BASE_CURRENCY => return Ok(NEUTRAL_EXCHANGE_RATE),
            Currency::Code(code) => code,
        };

        if let Some(quote) = self.cache.get(code).await {
            return Ok(quote.value);
        }

        match self.currency.get_rate(BASE_CURRENCY, code).await {
            Ok(rate) => {
                self.cache.put(code, rate).await;
                Ok(rate)
            }
            Err(e) => self.fall_back(code, NEUTRAL_EXCHANGE_RATE, e.into()).await,
        }
    }
}

#[async_trait]
impl QuoteSource for RateSource {
    async fn metal_price_per_gram(&self, metal: MetalType) -> Result<f64> {
        self.fetch_metal_price_per_gram(metal).await
    }

    async fn currency_rate(&self, currency: &Currency, custom_rate: f64) -> Result<f64> {
        self.fetch_currency_rate(currency, custom_rate).await
    }
}
