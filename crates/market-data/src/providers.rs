//! Concrete `MarketDataProvider` adapters. All three speak the same
//! aggregate/snapshot/indicator shapes as Polygon's REST API; they differ
//! only in base URL and which field names their response envelopes use, the
//! way invest-iq's `polygon-client` is one of several interchangeable feeds
//! behind the same trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use signal_core::{HistoricalBar, MarketDataProvider, SignalError, Ticker};
use std::collections::HashMap;
use std::time::Duration;

use crate::rate_limiter::RateLimiter;

struct HttpFeed {
    name: &'static str,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
    rate_limiter: RateLimiter,
}

impl HttpFeed {
    fn new(
        name: &'static str,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        max_requests_per_min: usize,
    ) -> Self {
        Self {
            name,
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(20))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            rate_limiter: RateLimiter::new(max_requests_per_min, Duration::from_secs(60)),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, SignalError> {
        if !self.rate_limiter.try_acquire().await {
            return Err(SignalError::Transient(format!(
                "{} rate limit exhausted",
                self.name
            )));
        }

        let mut params: Vec<(&str, String)> = query.to_vec();
        params.push(("apiKey", self.api_key.clone()));

        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(&params)
            .send()
            .await
            .map_err(|e| SignalError::Transient(format!("{} request failed: {e}", self.name)))?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(SignalError::Transient(format!(
                "{} returned HTTP {status}",
                self.name
            )));
        }
        if !status.is_success() {
            return Err(SignalError::Unavailable(format!(
                "{} returned HTTP {status}",
                self.name
            )));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SignalError::Transient(format!("{} malformed response: {e}", self.name)))
    }
}

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    price: Decimal,
}

#[derive(Debug, Deserialize)]
struct AggregatesEnvelope {
    #[serde(default)]
    results: Vec<AggregateBar>,
}

#[derive(Debug, Deserialize)]
struct AggregateBar {
    t: i64,
    o: Decimal,
    h: Decimal,
    l: Decimal,
    c: Decimal,
    v: u64,
}

#[derive(Debug, Deserialize)]
struct IndicatorsEnvelope {
    #[serde(default)]
    values: HashMap<String, f64>,
}

macro_rules! http_provider {
    ($struct_name:ident) => {
        pub struct $struct_name {
            feed: HttpFeed,
        }

        impl $struct_name {
            pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
                Self {
                    feed: HttpFeed::new(stringify!($struct_name), base_url, api_key, 300),
                }
            }
        }

        #[async_trait]
        impl MarketDataProvider for $struct_name {
            fn name(&self) -> &'static str {
                self.feed.name
            }

            async fn quote(&self, ticker: &Ticker) -> Result<Decimal, SignalError> {
                let envelope: QuoteEnvelope = self
                    .feed
                    .get_json(
                        &format!("/v2/last/trade/{}", ticker.as_str()),
                        &[],
                    )
                    .await?;
                Ok(envelope.price)
            }

            async fn historical(
                &self,
                ticker: &Ticker,
                days: u32,
            ) -> Result<Vec<HistoricalBar>, SignalError> {
                let to = Utc::now();
                let from = to - chrono::Duration::days(days as i64);
                let envelope: AggregatesEnvelope = self
                    .feed
                    .get_json(
                        &format!(
                            "/v2/aggs/ticker/{}/range/1/day/{}/{}",
                            ticker.as_str(),
                            from.format("%Y-%m-%d"),
                            to.format("%Y-%m-%d")
                        ),
                        &[],
                    )
                    .await?;

                let mut results = envelope.results;
                results.sort_by_key(|bar| std::cmp::Reverse(bar.t));

                Ok(results
                    .into_iter()
                    .map(|bar| HistoricalBar {
                        date: DateTime::from_timestamp_millis(bar.t)
                            .unwrap_or_else(Utc::now)
                            .date_naive(),
                        open: bar.o,
                        high: bar.h,
                        low: bar.l,
                        close: bar.c,
                        volume: bar.v,
                    })
                    .collect())
            }

            async fn indicators(
                &self,
                ticker: &Ticker,
            ) -> Result<HashMap<String, f64>, SignalError> {
                let envelope: IndicatorsEnvelope = self
                    .feed
                    .get_json(&format!("/v1/indicators/{}", ticker.as_str()), &[])
                    .await?;
                Ok(envelope.values)
            }
        }
    };
}

http_provider!(PrimaryFeed);
http_provider!(SecondaryFeed);
http_provider!(TertiaryFeed);
