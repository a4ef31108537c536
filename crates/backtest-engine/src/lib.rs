//! Backtest Engine: replays a set of BUY verdicts against real price
//! history under a chosen allocation mode — select, rank, allocate,
//! simulate, aggregate.

pub mod allocator;
pub mod metrics;
pub mod models;
pub mod ranker;
pub mod simulator;

use std::collections::HashMap;

use signal_core::{
    AllocationMode, BacktestReport, HistoricalBar, SignalError, SignalType, Ticker, Verdict,
};

pub use models::BacktestRequest;

/// Run one backtest over `verdicts`, using `price_history` (keyed by the
/// ticker each verdict names) to simulate trade exits. Verdicts outside
/// the request's date window, or that are not BUY, are not selected.
pub fn run_backtest(
    verdicts: &[Verdict],
    price_history: &HashMap<Ticker, Vec<HistoricalBar>>,
    request: &BacktestRequest,
) -> Result<BacktestReport, SignalError> {
    signal_validation::validate_backtest_range(request.start, request.end, request.hold_period_days as i64)?;

    let selected: Vec<Verdict> = verdicts
        .iter()
        .filter(|v| v.signal_type == SignalType::Buy && v.created_at >= request.start && v.created_at <= request.end)
        .cloned()
        .collect();
    signal_validation::validate_non_empty_selection(&selected)?;

    let mut warnings = Vec::new();
    let ranked = ranker::rank(selected, &mut warnings);
    let allocations = allocator::allocate(ranked, request.starting_capital, request.mode);

    let mut trades = Vec::new();
    for allocation in &allocations {
        let verdict = &allocation.ranked.verdict;
        let entry_date = verdict.created_at.date_naive();
        let bars = price_history.get(&verdict.ticker).map(Vec::as_slice).unwrap_or(&[]);
        let contributing_agents: Vec<String> = verdict
            .agent_verdicts
            .iter()
            .filter(|a| !a.failed)
            .map(|a| a.agent_name.clone())
            .collect();

        let verdict_id = verdict.id.unwrap_or_else(uuid::Uuid::new_v4);
        match simulator::simulate(
            verdict_id,
            allocation,
            entry_date,
            bars,
            request.hold_period_days,
            contributing_agents,
        ) {
            Some(trade) => trades.push(trade),
            None => warnings.push(format!(
                "{}: no price history in hold window, excluded from simulation",
                verdict.ticker
            )),
        }
    }

    let agg = metrics::aggregate(&trades, request.starting_capital, price_history);

    Ok(BacktestReport {
        mode: request.mode,
        starting_capital: request.starting_capital,
        trades,
        total_pnl: agg.total_pnl,
        total_return_pct: agg.total_return_pct,
        win_rate: agg.win_rate,
        sharpe: agg.sharpe,
        max_drawdown: agg.max_drawdown,
        per_agent_attribution: agg.per_agent_attribution,
        warnings,
    })
}

/// Run the same selection against all three allocation modes, for
/// side-by-side comparison.
pub fn compare_modes(
    verdicts: &[Verdict],
    price_history: &HashMap<Ticker, Vec<HistoricalBar>>,
    base: &BacktestRequest,
) -> Result<HashMap<AllocationMode, BacktestReport>, SignalError> {
    let mut reports = HashMap::new();
    for mode in signal_core::traits::all_allocation_modes() {
        let request = BacktestRequest { mode, ..base.clone() };
        reports.insert(mode, run_backtest(verdicts, price_history, &request)?);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use signal_core::VerdictStatus;

    fn bar(date: NaiveDate, high: Decimal, low: Decimal, close: Decimal) -> HistoricalBar {
        HistoricalBar { date, open: close, high, low, close, volume: 1_000_000 }
    }

    fn buy_verdict(ticker: &str, entry: Decimal) -> Verdict {
        Verdict {
            id: None,
            ticker: Ticker::parse(ticker).unwrap(),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            signal_type: SignalType::Buy,
            confidence: 0.8,
            entry_price: entry,
            stop_loss: Some(entry * dec!(0.9)),
            target_price: Some(entry * dec!(1.25)),
            position_size: 0,
            status: VerdictStatus::Pending,
            agent_verdicts: Vec::new(),
        }
    }

    #[test]
    fn full_run_produces_a_report_with_one_trade() {
        let verdict = buy_verdict("NVDA", dec!(100));
        let mut price_history = HashMap::new();
        price_history.insert(
            Ticker::parse("NVDA").unwrap(),
            vec![
                bar(NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(), dec!(105), dec!(98), dec!(103)),
                bar(NaiveDate::from_ymd_opt(2026, 1, 3).unwrap(), dec!(126), dec!(102), dec!(124)),
            ],
        );
        let request = BacktestRequest::new(
            Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            AllocationMode::CoreFocus,
        );
        let report = run_backtest(&[verdict], &price_history, &request).unwrap();
        assert_eq!(report.trades.len(), 1);
        assert!(report.total_pnl > Decimal::ZERO);
    }

    #[test]
    fn empty_selection_is_invalid_state() {
        let request = BacktestRequest::new(
            Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            AllocationMode::CoreFocus,
        );
        let result = run_backtest(&[], &HashMap::new(), &request);
        assert!(matches!(result, Err(SignalError::InvalidState(_))));
    }

    #[test]
    fn sell_verdicts_are_not_selected() {
        let mut verdict = buy_verdict("NVDA", dec!(100));
        verdict.signal_type = SignalType::Sell;
        let request = BacktestRequest::new(
            Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            AllocationMode::CoreFocus,
        );
        let result = run_backtest(&[verdict], &HashMap::new(), &request);
        assert!(matches!(result, Err(SignalError::InvalidState(_))));
    }

    #[test]
    fn compare_modes_runs_all_three() {
        let verdict = buy_verdict("NVDA", dec!(100));
        let mut price_history = HashMap::new();
        price_history.insert(
            Ticker::parse("NVDA").unwrap(),
            vec![bar(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(), dec!(101), dec!(99), dec!(100))],
        );
        let base = BacktestRequest::new(
            Utc.with_ymd_and_hms(2025, 12, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap(),
            AllocationMode::CoreFocus,
        );
        let reports = compare_modes(&[verdict], &price_history, &base).unwrap();
        assert_eq!(reports.len(), 3);
    }
}
