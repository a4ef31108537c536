//! Trade Simulator: walks each allocated position forward day by day
//! against its own price history, exiting on stop-loss, take-profit, or
//! the hold period elapsing.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use signal_core::{BacktestTrade, ExitReason, HistoricalBar, TradeResult};
use uuid::Uuid;

use crate::allocator::Allocation;

/// Simulate one allocated position against its ticker's bars. `bars` need
/// not be sorted or pre-filtered; only bars strictly after `entry_date` and
/// within `hold_period_days` are considered. Returns `None` (with a warning
/// pushed by the caller) when no bars exist in that window at all.
pub fn simulate(
    verdict_id: Uuid,
    allocation: &Allocation,
    entry_date: NaiveDate,
    bars: &[HistoricalBar],
    hold_period_days: u32,
    contributing_agents: Vec<String>,
) -> Option<BacktestTrade> {
    let horizon = entry_date.checked_add_days(Days::new(hold_period_days as u64))?;

    let mut window: Vec<&HistoricalBar> = bars
        .iter()
        .filter(|bar| bar.date > entry_date && bar.date <= horizon)
        .collect();
    window.sort_by_key(|bar| bar.date);

    if window.is_empty() {
        return None;
    }

    let verdict = &allocation.ranked.verdict;
    let entry_price = verdict.entry_price;
    let stop_loss = verdict.stop_loss?;
    let target_price = verdict.target_price?;
    let shares = allocation.shares;

    let mut exit: Option<(NaiveDate, Decimal, ExitReason)> = None;
    for bar in &window {
        let hit_target = bar.high >= target_price;
        let hit_stop = bar.low <= stop_loss;
        if hit_stop && hit_target {
            exit = Some((bar.date, stop_loss, ExitReason::StopLoss));
            break;
        } else if hit_target {
            exit = Some((bar.date, target_price, ExitReason::TakeProfit));
            break;
        } else if hit_stop {
            exit = Some((bar.date, stop_loss, ExitReason::StopLoss));
            break;
        }
    }

    let (exit_date, exit_price, exit_reason) = exit.unwrap_or_else(|| {
        let last = window.last().expect("window non-empty, checked above");
        (last.date, last.close, ExitReason::HoldPeriodEnd)
    });

    let pnl = (exit_price - entry_price) * Decimal::from(shares);
    let pnl_pct: f64 = ((exit_price - entry_price) / entry_price).try_into().unwrap_or(0.0);
    let result = if pnl > Decimal::ZERO { TradeResult::Win } else { TradeResult::Loss };

    Some(BacktestTrade {
        verdict_id,
        ticker: verdict.ticker.clone(),
        entry_date,
        exit_date,
        entry_price,
        exit_price,
        shares,
        pnl,
        pnl_pct,
        result,
        exit_reason,
        position_type: allocation.position_type,
        allocation_pct: allocation.allocation_pct,
        contributing_agents,
    })
}
