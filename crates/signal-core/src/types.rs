use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::SignalError;

/// Uppercase alphabetic 1-5 char ticker symbol. Only constructible through
/// `parse`, so every `Ticker` in the system is already valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(raw: &str) -> Result<Self, SignalError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.len() > 5 {
            return Err(SignalError::BadInput(format!(
                "ticker must be 1-5 characters, got {:?}",
                raw
            )));
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(SignalError::BadInput(format!(
                "ticker must be alphabetic, got {:?}",
                raw
            )));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single daily OHLCV bar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalBar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeTrend {
    Increasing,
    Decreasing,
    Neutral,
    Unknown,
}

/// Which link in the provider chain actually served the quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketSource {
    Primary,
    Secondary,
    Tertiary,
    /// Served from a stale cache entry past normal TTL but inside the
    /// stale-allowed window.
    StaleCache,
}

/// Immutable per-request bundle of market inputs. Degrades gracefully:
/// any field may be absent if every provider in its chain failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub ticker: Ticker,
    pub as_of: DateTime<Utc>,
    pub current_price: Option<Decimal>,
    /// Newest to oldest, length 0-100.
    pub historical: Vec<HistoricalBar>,
    pub indicators: HashMap<String, f64>,
    pub volume_trend: VolumeTrend,
    pub source_used: Option<MarketSource>,
}

impl MarketSnapshot {
    pub fn empty(ticker: Ticker, as_of: DateTime<Utc>) -> Self {
        Self {
            ticker,
            as_of,
            current_price: None,
            historical: Vec::new(),
            indicators: HashMap::new(),
            volume_trend: VolumeTrend::Unknown,
            source_used: None,
        }
    }

    /// RSI if present, clamped into [0, 100]. Callers never see out-of-range
    /// indicator values per the edge-case policy.
    pub fn rsi(&self) -> Option<f64> {
        self.indicators.get("rsi").map(|v| v.clamp(0.0, 100.0))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditSignal {
    pub mentions: u64,
    pub score: f64,
    pub available: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsSignal {
    pub article_count: u64,
    pub score: f64,
    pub available: bool,
}

/// Immutable per-request bundle of sentiment inputs, already combined per
/// the reddit/news weighting rule below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentSnapshot {
    pub ticker: Ticker,
    pub as_of: DateTime<Utc>,
    pub combined_sentiment: f64,
    pub reddit: RedditSignal,
    pub news: NewsSignal,
    /// False only when both reddit and news are unavailable.
    pub available: bool,
}

impl SentimentSnapshot {
    /// Combine independent reddit/news scores per the weighting rule:
    /// (0.6, 0.4) when both available, 1.0 to whichever one is available,
    /// 0 (and `available = false`) when neither is.
    pub fn combine(ticker: Ticker, as_of: DateTime<Utc>, reddit: RedditSignal, news: NewsSignal) -> Self {
        let (combined_sentiment, available) = match (reddit.available, news.available) {
            (true, true) => (0.6 * reddit.score + 0.4 * news.score, true),
            (true, false) => (reddit.score, true),
            (false, true) => (news.score, true),
            (false, false) => (0.0, false),
        };
        Self {
            ticker,
            as_of,
            combined_sentiment: combined_sentiment.clamp(-1.0, 1.0),
            reddit,
            news,
            available,
        }
    }
}

/// Five-level signal classification produced by individual agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalLevel {
    StrongSell,
    Sell,
    Hold,
    Buy,
    StrongBuy,
}

impl SignalLevel {
    /// Map a raw score in [-1, 1] to a level using the default thresholds
    /// Thresholds are configuration in `consensus-engine`; this
    /// free function captures the *default* mapping used by the Predictor
    /// agent and by tests that don't wire a custom threshold set.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.5 {
            SignalLevel::StrongBuy
        } else if score >= 0.1 {
            SignalLevel::Buy
        } else if score > -0.1 {
            SignalLevel::Hold
        } else if score > -0.5 {
            SignalLevel::Sell
        } else {
            SignalLevel::StrongSell
        }
    }
}

/// Three-level consensus collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalType {
    Buy,
    Sell,
    Hold,
}

/// One verdict per agent per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentVerdict {
    pub agent_name: String,
    pub signal: SignalLevel,
    pub raw_score: f64,
    pub confidence: f64,
    pub reasoning: String,
    pub data_used: HashMap<String, f64>,
    pub failed: bool,
}

impl AgentVerdict {
    pub fn failed_hold(agent_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self {
            agent_name: agent_name.into(),
            signal: SignalLevel::Hold,
            raw_score: 0.0,
            confidence: 0.0,
            reasoning: format!("Analysis failed: {reason}"),
            data_used: HashMap::new(),
            failed: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerdictStatus {
    Pending,
    Approved,
    Executed,
    Closed,
}

impl VerdictStatus {
    /// Lifecycle is linear and monotonic: Pending -> Approved -> Executed
    /// -> Closed. Any other transition, including a repeat of the current
    /// state, is illegal.
    pub fn can_transition_to(self, next: VerdictStatus) -> bool {
        matches!(
            (self, next),
            (VerdictStatus::Pending, VerdictStatus::Approved)
                | (VerdictStatus::Approved, VerdictStatus::Executed)
                | (VerdictStatus::Executed, VerdictStatus::Closed)
        )
    }
}

/// The persisted consensus output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Verdict {
    pub id: Option<Uuid>,
    pub ticker: Ticker,
    pub created_at: DateTime<Utc>,
    pub signal_type: SignalType,
    pub confidence: f64,
    pub entry_price: Decimal,
    pub stop_loss: Option<Decimal>,
    pub target_price: Option<Decimal>,
    pub position_size: u64,
    pub status: VerdictStatus,
    pub agent_verdicts: Vec<AgentVerdict>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllocationMode {
    CoreFocus,
    Balanced,
    Diversified,
}

impl AllocationMode {
    pub fn parse(raw: &str) -> Result<Self, SignalError> {
        match raw.to_ascii_uppercase().as_str() {
            "CORE_FOCUS" => Ok(AllocationMode::CoreFocus),
            "BALANCED" => Ok(AllocationMode::Balanced),
            "DIVERSIFIED" => Ok(AllocationMode::Diversified),
            other => Err(SignalError::BadInput(format!(
                "unknown allocation mode: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeResult {
    Win,
    Loss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    StopLoss,
    TakeProfit,
    HoldPeriodEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionType {
    Core,
    Satellite,
    Equal,
}

/// One simulated trade produced during backtesting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestTrade {
    pub verdict_id: Uuid,
    pub ticker: Ticker,
    pub entry_date: NaiveDate,
    pub exit_date: NaiveDate,
    pub entry_price: Decimal,
    pub exit_price: Decimal,
    pub shares: u64,
    pub pnl: Decimal,
    pub pnl_pct: f64,
    pub result: TradeResult,
    pub exit_reason: ExitReason,
    pub position_type: PositionType,
    pub allocation_pct: f64,
    /// Agents (non-failed) that contributed to the source verdict, for
    /// per-agent attribution in the aggregated report.
    pub contributing_agents: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentAttribution {
    pub win_rate: f64,
    pub average_pnl: Decimal,
    pub trade_count: u32,
}

/// The output of a single backtest run (one allocation mode).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub mode: AllocationMode,
    pub starting_capital: Decimal,
    pub trades: Vec<BacktestTrade>,
    pub total_pnl: Decimal,
    pub total_return_pct: f64,
    pub win_rate: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub per_agent_attribution: HashMap<String, AgentAttribution>,
    pub warnings: Vec<String>,
}
