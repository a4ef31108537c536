//! Sentiment half of the Data Aggregator: independent reddit/news sources
//! combined into a single `SentimentSnapshot`. Each source failing
//! is reflected in its own `available: false` flag rather than failing the
//! whole fetch.

pub mod news;
pub mod reddit;
pub mod scoring;

pub use news::NewsSource;
pub use reddit::RedditSource;

use chrono::Utc;
use signal_core::{NewsSignal, RedditSignal, SentimentSnapshot, SentimentSource, Ticker};

pub struct SentimentAggregator {
    reddit: Box<dyn SentimentSource>,
    news: Box<dyn SentimentSource>,
}

impl SentimentAggregator {
    pub fn new(reddit: Box<dyn SentimentSource>, news: Box<dyn SentimentSource>) -> Self {
        Self { reddit, news }
    }

    pub async fn snapshot(&self, ticker: &Ticker) -> SentimentSnapshot {
        let (reddit_result, news_result) =
            tokio::join!(self.reddit.fetch(ticker), self.news.fetch(ticker));

        let reddit = match reddit_result {
            Ok((score, mentions)) => RedditSignal {
                mentions,
                score,
                available: true,
            },
            Err(err) => {
                tracing::warn!(source = "reddit", %err, "sentiment source failed");
                RedditSignal {
                    mentions: 0,
                    score: 0.0,
                    available: false,
                }
            }
        };

        let news = match news_result {
            Ok((score, article_count)) => NewsSignal {
                article_count,
                score,
                available: true,
            },
            Err(err) => {
                tracing::warn!(source = "news", %err, "sentiment source failed");
                NewsSignal {
                    article_count: 0,
                    score: 0.0,
                    available: false,
                }
            }
        };

        SentimentSnapshot::combine(ticker.clone(), Utc::now(), reddit, news)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use signal_core::SignalError;

    struct StubSource {
        result: Result<(f64, u64), &'static str>,
        label: &'static str,
    }

    #[async_trait]
    impl SentimentSource for StubSource {
        fn name(&self) -> &'static str {
            self.label
        }

        async fn fetch(&self, _ticker: &Ticker) -> Result<(f64, u64), SignalError> {
            self.result
                .map_err(|e| SignalError::Unavailable(e.to_string()))
        }
    }

    #[tokio::test]
    async fn both_sources_available_blend_scores() {
        let aggregator = SentimentAggregator::new(
            Box::new(StubSource {
                result: Ok((0.8, 50)),
                label: "reddit",
            }),
            Box::new(StubSource {
                result: Ok((0.2, 10)),
                label: "news",
            }),
        );
        let ticker = Ticker::parse("NVDA").unwrap();
        let snapshot = aggregator.snapshot(&ticker).await;
        assert!(snapshot.available);
        assert!((snapshot.combined_sentiment - (0.6 * 0.8 + 0.4 * 0.2)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn one_source_down_degrades_not_fails() {
        let aggregator = SentimentAggregator::new(
            Box::new(StubSource {
                result: Err("reddit down"),
                label: "reddit",
            }),
            Box::new(StubSource {
                result: Ok((0.5, 10)),
                label: "news",
            }),
        );
        let ticker = Ticker::parse("NVDA").unwrap();
        let snapshot = aggregator.snapshot(&ticker).await;
        assert!(snapshot.available);
        assert!(!snapshot.reddit.available);
        assert_eq!(snapshot.combined_sentiment, 0.5);
    }

    #[tokio::test]
    async fn both_sources_down_marks_unavailable() {
        let aggregator = SentimentAggregator::new(
            Box::new(StubSource {
                result: Err("down"),
                label: "reddit",
            }),
            Box::new(StubSource {
                result: Err("down"),
                label: "news",
            }),
        );
        let ticker = Ticker::parse("NVDA").unwrap();
        let snapshot = aggregator.snapshot(&ticker).await;
        assert!(!snapshot.available);
        assert_eq!(snapshot.combined_sentiment, 0.0);
    }
}
