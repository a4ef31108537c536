use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use signal_core::{SentimentSource, SignalError, Ticker};

use crate::scoring::{score_items, TextItem};

pub struct NewsSource {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl NewsSource {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NewsResponse {
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    title: String,
    #[serde(default)]
    description: Option<String>,
    published_at: String,
}

#[async_trait]
impl SentimentSource for NewsSource {
    fn name(&self) -> &'static str {
        "news"
    }

    async fn fetch(&self, ticker: &Ticker) -> Result<(f64, u64), SignalError> {
        let response = self
            .client
            .get(format!("{}/v2/everything", self.base_url))
            .query(&[
                ("q", ticker.as_str()),
                ("apiKey", self.api_key.as_str()),
                ("sortBy", "publishedAt"),
                ("pageSize", "50"),
            ])
            .send()
            .await
            .map_err(|e| SignalError::Transient(format!("news request failed: {e}")))?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(SignalError::Transient(format!("news HTTP {status}")));
        }
        if !status.is_success() {
            return Err(SignalError::Unavailable(format!("news HTTP {status}")));
        }

        let body: NewsResponse = response
            .json()
            .await
            .map_err(|e| SignalError::Transient(format!("news malformed response: {e}")))?;

        let texts: Vec<(String, DateTime<Utc>)> = body
            .articles
            .into_iter()
            .map(|a| {
                let published_at = DateTime::parse_from_rfc3339(&a.published_at)
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|_| Utc::now());
                let text = format!("{} {}", a.title, a.description.unwrap_or_default());
                (text, published_at)
            })
            .collect();

        let items: Vec<TextItem> = texts
            .iter()
            .map(|(text, published_at)| TextItem {
                text,
                published_at: *published_at,
            })
            .collect();

        Ok(score_items(&items))
    }
}
