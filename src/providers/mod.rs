pub mod gold_api;
pub mod hexarate;
pub mod util;

use crate::core::config::AppConfig;
use crate::core::{QuoteCache, RateSource, SystemClock};
use chrono::Duration;
use std::sync::Arc;
use util::RetryPolicy;

/// Builds the cached rate source described by `config`.
pub fn rate_source(config: &AppConfig) -> RateSource {
    let retry = RetryPolicy {
        retries: config.retries,
        delay_ms: config.retry_delay_ms,
    };
    let metal = gold_api::GoldApiProvider::with_retry(config.providers.metal_base_url(), retry);
    let exchange =
        hexarate::HexarateProvider::with_retry(config.providers.exchange_base_url(), retry);
    let ttl = i64::try_from(config.cache_ttl_secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX);
    let cache = QuoteCache::with_clock(Arc::new(SystemClock), ttl);

    RateSource::new(
        Arc::new(metal),
        Arc::new(exchange),
        cache,
        config.on_fetch_failure,
    )
}
