//! Shared plumbing between the three LLM-backed agents: prompt dispatch,
//! schema parsing, and the edge-case clamps every agent applies uniformly
//!

use signal_core::clamp::{clamp_rsi, clamp_sentiment};
use signal_core::{AgentVerdict, MarketSnapshot, SentimentSnapshot, SignalLevel};
use std::collections::HashMap;

use crate::llm::{parse_llm_verdict, LlmClient};

/// Numeric inputs every agent reads off a snapshot pair, with the
/// edge-case defaults already applied.
pub struct ClampedInputs {
    pub rsi: f64,
    pub sentiment: f64,
    pub current_price: Option<rust_decimal::Decimal>,
    pub mentions: u64,
    pub volume_trend: signal_core::VolumeTrend,
}

pub fn clamped_inputs(market: &MarketSnapshot, sentiment: &SentimentSnapshot) -> ClampedInputs {
    ClampedInputs {
        rsi: clamp_rsi(market.indicators.get("rsi").copied()),
        sentiment: clamp_sentiment(if sentiment.available {
            Some(sentiment.combined_sentiment)
        } else {
            None
        }),
        current_price: market.current_price,
        mentions: sentiment.reddit.mentions + sentiment.news.article_count,
        volume_trend: market.volume_trend,
    }
}

/// 30-day momentum percent from a newest-first historical series. Zero
/// when the series is empty or too short.
pub fn momentum_pct(market: &MarketSnapshot, days: usize) -> f64 {
    if market.historical.len() < days + 1 {
        return 0.0;
    }
    let recent = market.historical[0].close;
    let past = market.historical[days].close;
    if past.is_zero() {
        return 0.0;
    }
    ((recent - past) / past * rust_decimal::Decimal::from(100))
        .try_into()
        .unwrap_or(0.0)
}

/// Run an LLM-backed agent end to end: call, parse, convert. Never returns
/// an `Err` — every failure collapses into a `failed=true` HOLD verdict.
pub async fn run_llm_verdict(
    agent_name: &'static str,
    client: &dyn LlmClient,
    model: &str,
    system_prompt: &str,
    user_prompt: &str,
    data_used: HashMap<String, f64>,
) -> AgentVerdict {
    let raw_response = match client.complete(model, system_prompt, user_prompt).await {
        Ok(text) => text,
        Err(err) => return AgentVerdict::failed_hold(agent_name, err.to_string()),
    };

    let parsed = match parse_llm_verdict(&raw_response) {
        Ok(p) => p,
        Err(err) => return AgentVerdict::failed_hold(agent_name, err.to_string()),
    };

    if !(1..=5).contains(&parsed.confidence) {
        return AgentVerdict::failed_hold(
            agent_name,
            format!("confidence {} outside 1..=5", parsed.confidence),
        );
    }
    let confidence = parsed.confidence as f64 / 5.0;
    let direction = match parsed.recommendation.to_ascii_uppercase().as_str() {
        "BUY" => 1.0,
        "SELL" => -1.0,
        "HOLD" => 0.0,
        other => {
            return AgentVerdict::failed_hold(
                agent_name,
                format!("unrecognized recommendation {other:?}"),
            )
        }
    };
    let raw_score = direction * confidence;

    AgentVerdict {
        agent_name: agent_name.to_string(),
        signal: SignalLevel::from_score(raw_score),
        raw_score,
        confidence,
        reasoning: parsed.reasoning,
        data_used,
        failed: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use signal_core::{HistoricalBar, Ticker};
    use rust_decimal_macros::dec;

    fn bar(close: rust_decimal::Decimal) -> HistoricalBar {
        HistoricalBar {
            date: Utc::now().date_naive(),
            open: close,
            high: close,
            low: close,
            close,
            volume: 1000,
        }
    }

    #[test]
    fn momentum_is_zero_for_short_series() {
        let mut market = MarketSnapshot::empty(Ticker::parse("NVDA").unwrap(), Utc::now());
        market.historical = vec![bar(dec!(100))];
        assert_eq!(momentum_pct(&market, 30), 0.0);
    }

    #[test]
    fn momentum_computed_over_window() {
        let mut market = MarketSnapshot::empty(Ticker::parse("NVDA").unwrap(), Utc::now());
        let mut bars = vec![bar(dec!(110))];
        for _ in 0..30 {
            bars.push(bar(dec!(100)));
        }
        market.historical = bars;
        let momentum = momentum_pct(&market, 30);
        assert!((momentum - 10.0).abs() < 1e-9);
    }

    struct StubLlmClient {
        response: &'static str,
    }

    #[async_trait::async_trait]
    impl LlmClient for StubLlmClient {
        fn vendor(&self) -> &'static str {
            "stub"
        }

        async fn complete(&self, _model: &str, _system: &str, _user: &str) -> signal_core::SignalResult<String> {
            Ok(self.response.to_string())
        }
    }

    #[tokio::test]
    async fn zero_confidence_is_rejected_like_a_bad_recommendation() {
        let client = StubLlmClient {
            response: r#"{"recommendation":"BUY","confidence":0,"reasoning":"shaky"}"#,
        };
        let verdict = run_llm_verdict("contrarian", &client, "m", "s", "u", HashMap::new()).await;
        assert!(verdict.failed);
    }

    #[tokio::test]
    async fn in_range_confidence_is_accepted() {
        let client = StubLlmClient {
            response: r#"{"recommendation":"BUY","confidence":4,"reasoning":"solid"}"#,
        };
        let verdict = run_llm_verdict("contrarian", &client, "m", "s", "u", HashMap::new()).await;
        assert!(!verdict.failed);
        assert_eq!(verdict.confidence, 0.8);
    }
}
