pub mod adaptive;
pub mod clamp;
pub mod error;
pub mod traits;
pub mod types;

pub use error::{SignalError, SignalResult};
pub use traits::{Agent, MarketDataProvider, SentimentSource, SignalRepository, VerdictFilter};
pub use types::{
    AgentAttribution, AgentVerdict, AllocationMode, BacktestReport, BacktestTrade,
    ExitReason, HistoricalBar, MarketSnapshot, MarketSource, NewsSignal, PositionType,
    RedditSignal, SentimentSnapshot, SignalLevel, SignalType, Ticker, TradeResult, Verdict,
    VerdictStatus, VolumeTrend,
};
