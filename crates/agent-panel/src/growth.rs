use async_trait::async_trait;
use signal_core::{Agent, AgentVerdict, MarketSnapshot, SentimentSnapshot, Ticker};
use std::collections::HashMap;
use std::sync::Arc;

use crate::common::{clamped_inputs, momentum_pct};
use crate::llm::LlmClient;

const MOMENTUM_WINDOW_DAYS: usize = 30;

const SYSTEM_PROMPT: &str = "You are a growth-momentum equity analyst. Strong positive momentum \
combined with positive sentiment favors BUY. Negative momentum favors avoidance. An overbought \
reading without volume confirmation should be skipped in favor of HOLD. Respond ONLY with JSON: \
{\"recommendation\": \"BUY\"|\"SELL\"|\"HOLD\", \"confidence\": 1-5, \"reasoning\": string}.";

pub struct GrowthAgent {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl GrowthAgent {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self { client, model: model.into() }
    }
}

#[async_trait]
impl Agent for GrowthAgent {
    fn name(&self) -> &'static str {
        "growth"
    }

    async fn analyze(
        &self,
        ticker: &Ticker,
        market: &MarketSnapshot,
        sentiment: &SentimentSnapshot,
    ) -> AgentVerdict {
        let inputs = clamped_inputs(market, sentiment);
        let momentum = momentum_pct(market, MOMENTUM_WINDOW_DAYS);

        let user_prompt = format!(
            "Ticker: {ticker}\n30-day momentum: {momentum:.2}%\nAggregate sentiment: {:.2}\n\
             Volume trend: {:?}",
            inputs.sentiment, inputs.volume_trend
        );

        let mut data_used = HashMap::new();
        data_used.insert("momentum_pct".to_string(), momentum);
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
