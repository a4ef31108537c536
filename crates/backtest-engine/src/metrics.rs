//! Report Aggregation: rolls simulated trades into a day-by-day equity
//! curve, Sharpe ratio, max drawdown, and per-agent attribution
//! step 5).

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use signal_core::{AgentAttribution, BacktestTrade, HistoricalBar, Ticker, TradeResult};

pub struct AggregateMetrics {
    pub total_pnl: Decimal,
    pub total_return_pct: f64,
    pub win_rate: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
    pub per_agent_attribution: HashMap<String, AgentAttribution>,
}

/// Mark-to-market equity on `day` for a single open or closed trade.
/// Closed trades before `day` contribute nothing further (already folded
/// into realized pnl); trades still open on `day` are valued at that
/// ticker's close, falling back to the entry price if no bar exists yet.
fn trade_value_on(
    trade: &BacktestTrade,
    day: NaiveDate,
    price_history: &HashMap<Ticker, Vec<HistoricalBar>>,
) -> Decimal {
    if day >= trade.exit_date {
        return trade.pnl;
    }

    let close = price_history
        .get(&trade.ticker)
        .and_then(|bars| bars.iter().filter(|b| b.date <= day).max_by_key(|b| b.date))
        .map(|b| b.close)
        .unwrap_or(trade.entry_price);

    (close - trade.entry_price) * Decimal::from(trade.shares)
}

fn equity_curve(
    trades: &[BacktestTrade],
    starting_capital: Decimal,
    price_history: &HashMap<Ticker, Vec<HistoricalBar>>,
) -> Vec<(NaiveDate, Decimal)> {
    let Some(start) = trades.iter().map(|t| t.entry_date).min() else {
        return Vec::new();
    };
    let end = trades.iter().map(|t| t.exit_date).max().unwrap_or(start);

    let mut curve = Vec::new();
    let mut day = start;
    while day <= end {
        let mut equity = starting_capital;
        for trade in trades {
            if day < trade.entry_date {
                continue;
            }
            equity += trade_value_on(trade, day, price_history);
        }
        curve.push((day, equity));
        day = match day.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }
    curve
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn std_dev(values: &[f64], avg: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

fn sharpe_ratio(curve: &[(NaiveDate, Decimal)]) -> f64 {
    if curve.len() < 2 {
        return 0.0;
    }
    let daily_returns: Vec<f64> = curve
        .windows(2)
        .filter_map(|pair| {
            let prev: f64 = pair[0].1.try_into().ok()?;
            let next: f64 = pair[1].1.try_into().ok()?;
            if prev == 0.0 {
                None
            } else {
                Some((next - prev) / prev)
            }
        })
        .collect();

    let avg = mean(&daily_returns);
    let sd = std_dev(&daily_returns, avg);
    if sd == 0.0 {
        0.0
    } else {
        (avg / sd) * (252.0_f64).sqrt()
    }
}

fn max_drawdown(curve: &[(NaiveDate, Decimal)]) -> f64 {
    let mut peak = Decimal::MIN;
    let mut worst = 0.0_f64;
    for (_, equity) in curve {
        if *equity > peak {
            peak = *equity;
        }
        if peak <= Decimal::ZERO {
            continue;
        }
        let drawdown: f64 = ((peak - *equity) / peak).try_into().unwrap_or(0.0);
        if drawdown > worst {
            worst = drawdown;
        }
    }
    worst
}

fn per_agent_attribution(trades: &[BacktestTrade]) -> HashMap<String, AgentAttribution> {
    let mut by_agent: BTreeMap<String, Vec<&BacktestTrade>> = BTreeMap::new();
    for trade in trades {
        for agent in &trade.contributing_agents {
            by_agent.entry(agent.clone()).or_default().push(trade);
        }
    }

    by_agent
        .into_iter()
        .map(|(agent, trades)| {
            let trade_count = trades.len() as u32;
            let wins = trades.iter().filter(|t| t.result == TradeResult::Win).count();
            let win_rate = wins as f64 / trade_count as f64;
            let total_pnl: Decimal = trades.iter().map(|t| t.pnl).sum();
            let average_pnl = total_pnl / Decimal::from(trade_count);
            (agent, AgentAttribution { win_rate, average_pnl, trade_count })
        })
        .collect()
}

pub fn aggregate(
    trades: &[BacktestTrade],
    starting_capital: Decimal,
    price_history: &HashMap<Ticker, Vec<HistoricalBar>>,
) -> AggregateMetrics {
    let total_pnl: Decimal = trades.iter().map(|t| t.pnl).sum();
    let total_return_pct: f64 = if starting_capital > Decimal::ZERO {
        (total_pnl / starting_capital).try_into().unwrap_or(0.0)
    } else {
        0.0
    };
    let win_rate = if trades.is_empty() {
        0.0
    } else {
        trades.iter().filter(|t| t.result == TradeResult::Win).count() as f64 / trades.len() as f64
    };

    let curve = equity_curve(trades, starting_capital, price_history);

    AggregateMetrics {
        total_pnl,
        total_return_pct,
        win_rate,
        sharpe: sharpe_ratio(&curve),
        max_drawdown: max_drawdown(&curve),
        per_agent_attribution: per_agent_attribution(trades),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use signal_core::{ExitReason, PositionType};
    use uuid::Uuid;

    fn trade(
        entry_date: NaiveDate,
        exit_date: NaiveDate,
        entry: Decimal,
        exit: Decimal,
        shares: u64,
        agents: &[&str],
    ) -> BacktestTrade {
        let pnl = (exit - entry) * Decimal::from(shares);
        BacktestTrade {
            verdict_id: Uuid::new_v4(),
            ticker: Ticker::parse("NVDA").unwrap(),
            entry_date,
            exit_date,
            entry_price: entry,
            exit_price: exit,
            shares,
            pnl,
            pnl_pct: ((exit - entry) / entry).try_into().unwrap_or(0.0),
            result: if pnl > Decimal::ZERO { TradeResult::Win } else { TradeResult::Loss },
            exit_reason: ExitReason::TakeProfit,
            position_type: PositionType::Core,
            allocation_pct: 0.6,
            contributing_agents: agents.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn total_pnl_and_win_rate_across_trades() {
        let d1 = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let trades = vec![
            trade(d1, d2, dec!(100), dec!(125), 100, &["predictor"]),
            trade(d1, d2, dec!(50), dec!(45), 100, &["growth"]),
        ];
        let metrics = aggregate(&trades, dec!(100_000), &HashMap::new());
        assert_eq!(metrics.total_pnl, dec!(2000));
        assert_eq!(metrics.win_rate, 0.5);
    }

    #[test]
    fn per_agent_attribution_splits_by_contributor() {
        let d1 = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let trades = vec![
            trade(d1, d2, dec!(100), dec!(125), 100, &["predictor", "growth"]),
            trade(d1, d2, dec!(50), dec!(45), 100, &["growth"]),
        ];
        let metrics = aggregate(&trades, dec!(100_000), &HashMap::new());
        assert_eq!(metrics.per_agent_attribution["predictor"].trade_count, 1);
        assert_eq!(metrics.per_agent_attribution["growth"].trade_count, 2);
        assert_eq!(metrics.per_agent_attribution["growth"].win_rate, 0.5);
    }

    #[test]
    fn no_trades_yields_zeroed_metrics() {
        let metrics = aggregate(&[], dec!(100_000), &HashMap::new());
        assert_eq!(metrics.total_pnl, Decimal::ZERO);
        assert_eq!(metrics.sharpe, 0.0);
        assert_eq!(metrics.max_drawdown, 0.0);
    }

    #[test]
    fn drawdown_is_zero_on_a_monotonically_rising_curve() {
        let curve = vec![
            (NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), dec!(100_000)),
            (NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(), dec!(101_000)),
            (NaiveDate::from_ymd_opt(2026, 1, 3).unwrap(), dec!(102_000)),
        ];
        assert_eq!(max_drawdown(&curve), 0.0);
    }

    #[test]
    fn drawdown_measures_drop_from_peak() {
        let curve = vec![
            (NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), dec!(100_000)),
            (NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(), dec!(120_000)),
            (NaiveDate::from_ymd_opt(2026, 1, 3).unwrap(), dec!(90_000)),
        ];
        let dd = max_drawdown(&curve);
        assert!((dd - 0.25).abs() < 1e-9);
    }
}
