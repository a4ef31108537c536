use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::SignalError;
use crate::types::{
    AllocationMode, BacktestReport, HistoricalBar, SentimentSnapshot, Ticker, Verdict,
    VerdictStatus,
};

/// One link in the market-data provider chain. `quote`, `historical`, and
/// `indicators` are independent operations — a provider may serve one and
/// fail the others.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Stable name used in logging, breaker keys, and cache keys.
    fn name(&self) -> &'static str;

    async fn quote(&self, ticker: &Ticker) -> Result<rust_decimal::Decimal, SignalError>;

    async fn historical(
        &self,
        ticker: &Ticker,
        days: u32,
    ) -> Result<Vec<HistoricalBar>, SignalError>;

    async fn indicators(&self, ticker: &Ticker) -> Result<HashMap<String, f64>, SignalError>;
}

/// One independent sentiment source (reddit or news).
#[async_trait]
pub trait SentimentSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns `(score in [-1,1], sample_count)`. The caller wraps this in
    /// the appropriate `RedditSignal`/`NewsSignal` with `available: true`;
    /// an `Err` is treated as `available: false`, never retried at this
    /// layer (retry happens inside the adapter, below the trait).
    async fn fetch(&self, ticker: &Ticker) -> Result<(f64, u64), SignalError>;
}

/// Capability every panel member satisfies. Implementations must never
/// propagate an error out of `analyze` — internal failures convert to a
/// `failed = true` HOLD verdict.
#[async_trait]
pub trait Agent: Send + Sync {
    fn name(&self) -> &'static str;

    fn weight(&self) -> f64 {
        1.0
    }

    async fn analyze(
        &self,
        ticker: &Ticker,
        market: &crate::types::MarketSnapshot,
        sentiment: &SentimentSnapshot,
    ) -> crate::types::AgentVerdict;
}

/// Persistence boundary. A real implementation is out of scope for the
/// core (relational store is an external collaborator); the core only
/// depends on this trait, never on a concrete database.
#[async_trait]
pub trait SignalRepository: Send + Sync {
    async fn save_verdict(&self, verdict: Verdict) -> Result<Uuid, SignalError>;
    async fn load_verdict(&self, id: Uuid) -> Result<Verdict, SignalError>;
    async fn list_verdicts(&self, filter: VerdictFilter) -> Result<Vec<Verdict>, SignalError>;
    async fn update_status(
        &self,
        id: Uuid,
        new_status: VerdictStatus,
    ) -> Result<Verdict, SignalError>;
    async fn save_backtest(&self, report: BacktestReport) -> Result<Uuid, SignalError>;
}

#[derive(Debug, Clone, Default)]
pub struct VerdictFilter {
    pub ticker: Option<Ticker>,
    pub signal_type: Option<crate::types::SignalType>,
    pub status: Option<VerdictStatus>,
    pub window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub limit: usize,
    pub offset: usize,
}

/// Backtest selection/report comparison is keyed by allocation mode.
pub fn all_allocation_modes() -> [AllocationMode; 3] {
    [
        AllocationMode::CoreFocus,
        AllocationMode::Balanced,
        AllocationMode::Diversified,
    ]
}
