//! Data Aggregator: chains market-data providers behind retry, a
//! per-provider circuit breaker, a TTL cache, and a per-operation deadline,
//! assembling the result into a single `MarketSnapshot` that degrades field
//! by field rather than failing the whole request.

pub mod cache;
pub mod circuit_breaker;
pub mod providers;
pub mod rate_limiter;
pub mod retry;

use chrono::Utc;
use rust_decimal::Decimal;
use signal_core::{HistoricalBar, MarketDataProvider, MarketSnapshot, MarketSource, Ticker, VolumeTrend};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use cache::{Operation, TtlCache};
use circuit_breaker::{BreakerRegistry, CircuitBreakerConfig};
use retry::with_retry;

const OPERATION_DEADLINE: Duration = Duration::from_secs(10);

const SOURCE_BY_INDEX: [MarketSource; 3] = [
    MarketSource::Primary,
    MarketSource::Secondary,
    MarketSource::Tertiary,
];

pub struct MarketDataAggregator {
    providers: Vec<Arc<dyn MarketDataProvider>>,
    breakers: BreakerRegistry,
    quote_cache: TtlCache<Decimal>,
    historical_cache: TtlCache<Vec<HistoricalBar>>,
    indicator_cache: TtlCache<HashMap<String, f64>>,
}

impl MarketDataAggregator {
    pub fn new(providers: Vec<Arc<dyn MarketDataProvider>>) -> Self {
        Self {
            providers,
            breakers: BreakerRegistry::new(CircuitBreakerConfig::default()),
            quote_cache: TtlCache::new(),
            historical_cache: TtlCache::new(),
            indicator_cache: TtlCache::new(),
        }
    }

    pub async fn snapshot(&self, ticker: &Ticker, historical_days: u32) -> MarketSnapshot {
        let (price_result, historical_result, indicator_result) = tokio::join!(
            self.fetch_with_chain(ticker, Operation::Quote, &self.quote_cache, |p, t| {
                let t = t.clone();
                Box::pin(async move { p.quote(&t).await })
            }),
            self.fetch_with_chain(ticker, Operation::Historical, &self.historical_cache, move |p, t| {
                let t = t.clone();
                Box::pin(async move { p.historical(&t, historical_days).await })
            }),
            self.fetch_with_chain(ticker, Operation::Indicators, &self.indicator_cache, |p, t| {
                let t = t.clone();
                Box::pin(async move { p.indicators(&t).await })
            }),
        );

        let mut snapshot = MarketSnapshot::empty(ticker.clone(), Utc::now());

        let mut source_used = None;
        if let Some((price, source)) = price_result {
            snapshot.current_price = Some(price);
            source_used = Some(source);
        }
        if let Some((bars, source)) = historical_result {
            snapshot.volume_trend = volume_trend(&bars);
            snapshot.historical = bars;
            source_used = source_used.or(Some(source));
        }
        if let Some((indicators, source)) = indicator_result {
            snapshot.indicators = indicators;
            source_used = source_used.or(Some(source));
        }
        snapshot.source_used = source_used;

        snapshot
    }

    async fn fetch_with_chain<T, F>(
        &self,
        ticker: &Ticker,
        op: Operation,
        cache: &TtlCache<T>,
        call: F,
    ) -> Option<(T, MarketSource)>
    where
        T: Clone,
        F: for<'a> Fn(
            &'a Arc<dyn MarketDataProvider>,
            &'a Ticker,
        ) -> std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<T, signal_core::SignalError>> + Send + 'a>,
        >,
    {
        for (idx, provider) in self.providers.iter().enumerate() {
            let breaker = self.breakers.get(provider.name());
            if !breaker.is_call_permitted() {
                continue;
            }

            let attempt = tokio::time::timeout(OPERATION_DEADLINE, with_retry(|| call(provider, ticker))).await;

            match attempt {
                Ok(Ok(value)) => {
                    breaker.record_success();
                    cache.put(ticker.as_str(), op, provider.name(), value.clone());
                    let source = SOURCE_BY_INDEX.get(idx).copied().unwrap_or(MarketSource::Tertiary);
                    return Some((value, source));
                }
                Ok(Err(err)) => {
                    tracing::warn!(provider = provider.name(), %err, "provider call failed");
                    breaker.record_failure();
                }
                Err(_) => {
                    tracing::warn!(provider = provider.name(), "provider call timed out");
                    breaker.record_failure();
                }
            }
        }

        for provider in &self.providers {
            match cache.get(ticker.as_str(), op, provider.name()) {
                cache::Lookup::Fresh(value) | cache::Lookup::Stale(value) => {
                    return Some((value, MarketSource::StaleCache));
                }
                cache::Lookup::Miss => continue,
            }
        }
        None
    }
}

fn volume_trend(bars: &[HistoricalBar]) -> VolumeTrend {
    if bars.len() < 2 {
        return VolumeTrend::Unknown;
    }
    // `historical` returns newest-first.
    let recent: u64 = bars.iter().take(5).map(|b| b.volume).sum::<u64>() / bars.len().min(5) as u64;
    let baseline: u64 = bars.iter().skip(5).take(15).map(|b| b.volume).sum::<u64>()
        / bars.len().saturating_sub(5).min(15).max(1) as u64;

    if baseline == 0 {
        return VolumeTrend::Unknown;
    }
    let ratio = recent as f64 / baseline as f64;
    if ratio > 1.2 {
        VolumeTrend::Increasing
    } else if ratio < 0.8 {
        VolumeTrend::Decreasing
    } else {
        VolumeTrend::Neutral
    }
}
