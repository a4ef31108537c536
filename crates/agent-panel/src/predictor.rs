//! Deterministic baseline agent: combines RSI (mean-reversion), a
//! percentile-rank trend read off the historical series, and sentiment into
//! a single raw score using the adaptive threshold primitives, then maps it
//! to the five-level signal with the shared thresholds.

use async_trait::async_trait;
use signal_core::adaptive::{percentile_rank, percentile_to_signal, z_score_of, z_score_to_weight};
use signal_core::{Agent, AgentVerdict, MarketSnapshot, SentimentSnapshot, SignalLevel, Ticker};
use std::collections::HashMap;

use crate::common::clamped_inputs;

const RSI_WEIGHT: f64 = 0.4;
const MOMENTUM_WEIGHT: f64 = 0.3;
const SENTIMENT_WEIGHT: f64 = 0.3;

pub struct PredictorAgent;

impl PredictorAgent {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PredictorAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Agent for PredictorAgent {
    fn name(&self) -> &'static str {
        "predictor"
    }

    async fn analyze(
        &self,
        _ticker: &Ticker,
        market: &MarketSnapshot,
        sentiment: &SentimentSnapshot,
    ) -> AgentVerdict {
        let inputs = clamped_inputs(market, sentiment);

        // Mean-reversion: a low RSI percentile (oversold) should score
        // positive, hence invert=true.
        let rsi_component = percentile_to_signal(inputs.rsi / 100.0, 0.3, 0.7, true) / 100.0;

        // Trend: where the latest close sits in its own recent history.
        let closes: Vec<f64> = market
            .historical
            .iter()
            .filter_map(|bar| bar.close.try_into().ok())
            .collect();
        let momentum_component = match closes.first() {
            Some(&latest) if closes.len() > 1 => {
                let percentile = percentile_rank(latest, &closes[1..]);
                percentile_to_signal(percentile, 0.4, 0.6, false) / 100.0
            }
            _ => 0.0,
        };

        // Recent-return z-score scales how much weight momentum gets today:
        // an unremarkable day's move is noise, an outlier day is signal.
        let returns: Vec<f64> = closes
            .windows(2)
            .map(|w| if w[1] != 0.0 { (w[0] - w[1]) / w[1] } else { 0.0 })
            .collect();
        let momentum_confidence = match returns.first() {
            Some(&today) if returns.len() > 1 => {
                z_score_to_weight(z_score_of(today, &returns[1..])) as f64 / 4.0
            }
            _ => 1.0,
        };

        let raw_score = RSI_WEIGHT * rsi_component
            + MOMENTUM_WEIGHT * momentum_component * momentum_confidence
            + SENTIMENT_WEIGHT * inputs.sentiment;
        let raw_score = raw_score.clamp(-1.0, 1.0);

        let mut data_used = HashMap::new();
        data_used.insert("rsi".to_string(), inputs.rsi);
        data_used.insert("sentiment".to_string(), inputs.sentiment);
        data_used.insert("momentum_component".to_string(), momentum_component);

        AgentVerdict {
            agent_name: self.name().to_string(),
            signal: SignalLevel::from_score(raw_score),
            raw_score,
            confidence: raw_score.abs().clamp(0.0, 1.0).max(0.5),
            reasoning: format!(
                "rsi={:.1} sentiment={:.2} momentum_component={:.3} -> raw_score={:.3}",
                inputs.rsi, inputs.sentiment, momentum_component, raw_score
            ),
            data_used,
            failed: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use signal_core::{HistoricalBar, NewsSignal, RedditSignal};

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

    #[tokio::test]
    async fn oversold_rsi_and_positive_sentiment_favors_buy() {
        let ticker = Ticker::parse("NVDA").unwrap();
        let mut market = MarketSnapshot::empty(ticker.clone(), Utc::now());
        market.indicators.insert("rsi".to_string(), 20.0);
        market.historical = vec![bar(dec!(105)), bar(dec!(100)), bar(dec!(98))];

        let sentiment = SentimentSnapshot::combine(
            ticker.clone(),
            Utc::now(),
            RedditSignal {
                mentions: 10,
                score: 0.6,
                available: true,
            },
            NewsSignal {
                article_count: 5,
                score: 0.4,
                available: true,
            },
        );

        let agent = PredictorAgent::new();
        let verdict = agent.analyze(&ticker, &market, &sentiment).await;
        assert!(!verdict.failed);
        assert!(verdict.raw_score > 0.0, "expected positive score, got {}", verdict.raw_score);
    }

    #[tokio::test]
    async fn missing_inputs_default_to_neutral() {
        let ticker = Ticker::parse("NVDA").unwrap();
        let market = MarketSnapshot::empty(ticker.clone(), Utc::now());
        let sentiment = SentimentSnapshot::combine(
            ticker.clone(),
            Utc::now(),
            RedditSignal {
                mentions: 0,
                score: 0.0,
                available: false,
            },
            NewsSignal {
                article_count: 0,
                score: 0.0,
                available: false,
            },
        );

        let agent = PredictorAgent::new();
        let verdict = agent.analyze(&ticker, &market, &sentiment).await;
        assert_eq!(verdict.signal, SignalLevel::Hold);
    }
}
