use async_trait::async_trait;
use signal_core::{Agent, AgentVerdict, MarketSnapshot, SentimentSnapshot, Ticker};
use std::collections::HashMap;
use std::sync::Arc;

use crate::common::clamped_inputs;
use crate::llm::LlmClient;

const SYSTEM_PROMPT: &str = "You are a contrarian equity analyst. Negative sentiment combined \
with an oversold RSI below 30 favors BUY. Positive sentiment combined with an overbought RSI \
above 70 favors SELL. Respond ONLY with JSON: {\"recommendation\": \"BUY\"|\"SELL\"|\"HOLD\", \
\"confidence\": 1-5, \"reasoning\": string}.";

pub struct ContrarianAgent {
    client: Arc<dyn LlmClient>,
    model: String,
}

impl ContrarianAgent {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self { client, model: model.into() }
    }
}

#[async_trait]
impl Agent for ContrarianAgent {
    fn name(&self) -> &'static str {
        "contrarian"
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

        let user_prompt = format!(
            "Ticker: {ticker}\nCurrent price: {price}\nRSI: {:.1}\nAggregate sentiment: {:.2}\n\
             Mention count: {}",
            inputs.rsi, inputs.sentiment, inputs.mentions
        );

        let mut data_used = HashMap::new();
        data_used.insert("rsi".to_string(), inputs.rsi);
        data_used.insert("sentiment".to_string(), inputs.sentiment);
        data_used.insert("mentions".to_string(), inputs.mentions as f64);

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
