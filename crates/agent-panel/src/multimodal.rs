use async_trait::async_trait;
use signal_core::{Agent, AgentVerdict, MarketSnapshot, SentimentSnapshot, Ticker};
use std::collections::HashMap;
use std::sync::Arc;

use crate::common::clamped_inputs;
use crate::llm::LlmClient;

const SYSTEM_PROMPT: &str = "You synthesize numeric indicators with recent news and social \
snippets to form a single trading recommendation. Weigh both modalities; do not let one \
dominate without cause. Respond ONLY with JSON: {\"recommendation\": \"BUY\"|\"SELL\"|\"HOLD\", \
\"confidence\": 1-5, \"reasoning\": string}.";

pub struct MultiModalAgent {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl MultiModalAgent {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self { client, model: model.into() }
    }
}

#[async_trait]
impl Agent for MultiModalAgent {
    fn name(&self) -> &'static str {
        "multimodal"
    }

    async fn analyze(
        &self,
        ticker: &Ticker,
        market: &MarketSnapshot,
        sentiment: &SentimentSnapshot,
    ) -> AgentVerdict {
        let inputs = clamped_inputs(market, sentiment);
        let price = inputs
            .current_price
            .map(|p| p.to_string())
            .unwrap_or_else(|| "unknown".to_string());

        let reddit_note = if sentiment.reddit.available {
            format!("{} reddit mentions, score {:.2}", sentiment.reddit.mentions, sentiment.reddit.score)
        } else {
            "reddit data unavailable".to_string()
        };
        let news_note = if sentiment.news.available {
            format!("{} news articles, score {:.2}", sentiment.news.article_count, sentiment.news.score)
        } else {
            "news data unavailable".to_string()
        };

        let user_prompt = format!(
            "Ticker: {ticker}\nCurrent price: {price}\nRSI: {:.1}\nAggregate sentiment: {:.2}\n\
             Social/news summary: {reddit_note}; {news_note}",
            inputs.rsi, inputs.sentiment
        );

        let mut data_used = HashMap::new();
        data_used.insert("rsi".to_string(), inputs.rsi);
        data_used.insert("sentiment".to_string(), inputs.sentiment);

        crate::common::run_llm_verdict(
            self.name(),
            self.client.as_ref(),
            &self.model,
            SYSTEM_PROMPT,
            &user_prompt,
            data_used,
        )
        .await
    }
}
