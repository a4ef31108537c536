use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use signal_core::AllocationMode;

/// Inputs to a single backtest run. `start`/`end` bound the verdict
/// selection window; `hold_period_days` bounds how long the simulator
/// walks forward before forcing a HOLD_PERIOD_END exit.
#[derive(Debug, Clone)]
pub struct BacktestRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub mode: AllocationMode,
    pub starting_capital: Decimal,
    pub hold_period_days: u32,
}

impl BacktestRequest {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, mode: AllocationMode) -> Self {
        Self {
            start,
            end,
            mode,
            starting_capital: Decimal::from(100_000),
            hold_period_days: 30,
        }
    }
}
