use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use signal_core::{SentimentSource, SignalError, Ticker};

use crate::scoring::{score_items, TextItem};

pub struct RedditSource {
    base_url: String,
    client: reqwest::Client,
    subreddits: Vec<&'static str>,
}

impl RedditSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
            subreddits: vec!["wallstreetbets", "stocks", "investing"],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListingResponse {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<ListingChild>,
}

#[derive(Debug, Deserialize)]
struct ListingChild {
    data: PostData,
}

#[derive(Debug, Deserialize)]
struct PostData {
    title: String,
    #[serde(default)]
    selftext: String,
    created_utc: f64,
}

#[async_trait]
impl SentimentSource for RedditSource {
    fn name(&self) -> &'static str {
        "reddit"
    }

    async fn fetch(&self, ticker: &Ticker) -> Result<(f64, u64), SignalError> {
        let mut items_text: Vec<(String, DateTime<Utc>)> = Vec::new();

        for sub in &self.subreddits {
            let url = format!("{}/r/{}/search.json", self.base_url, sub);
            let response = self
                .client
                .get(&url)
                .query(&[
                    ("q", ticker.as_str()),
                    ("restrict_sr", "1"),
                    ("sort", "new"),
                    ("limit", "25"),
                ])
                .send()
                .await
                .map_err(|e| SignalError::Transient(format!("reddit request failed: {e}")))?;

            let status = response.status();
            if status.as_u16() == 429 || status.is_server_error() {
                return Err(SignalError::Transient(format!("reddit HTTP {status}")));
            }
            if !status.is_success() {
                continue;
            }

            let listing: ListingResponse = response
                .json()
                .await
                .map_err(|e| SignalError::Transient(format!("reddit malformed response: {e}")))?;

            for child in listing.data.children {
                let published = DateTime::from_timestamp(child.data.created_utc as i64, 0)
                    .unwrap_or_else(Utc::now);
                let text = format!("{} {}", child.data.title, child.data.selftext);
                items_text.push((text, published));
            }
        }

        let items: Vec<TextItem> = items_text
            .iter()
            .map(|(text, published_at)| TextItem {
                text,
                published_at: *published_at,
            })
            .collect();

        Ok(score_items(&items))
    }
}
