//! Signal Ranker: scores each BUY verdict selected for a backtest by
//! expected return relative to its own risk, highest first.

use rust_decimal::Decimal;
use signal_core::Verdict;

pub struct RankedVerdict {
    pub verdict: Verdict,
    pub composite: f64,
}

/// `composite = confidence * expected_return * (1 / risk_factor)`. A
/// verdict missing stop_loss/target_price (should not happen for BUY, but
/// defends against a corrupted record) is dropped with a note pushed to
/// `warnings`.
pub fn rank(verdicts: Vec<Verdict>, warnings: &mut Vec<String>) -> Vec<RankedVerdict> {
    let mut ranked: Vec<RankedVerdict> = verdicts
        .into_iter()
        .filter_map(|verdict| {
            let target = verdict.target_price?;
            let stop = verdict.stop_loss?;
            let entry = verdict.entry_price;
            if entry <= Decimal::ZERO {
                warnings.push(format!(
                    "{}: dropped from ranking, non-positive entry price",
                    verdict.ticker
                ));
                return None;
            }

            let expected_return: f64 = ((target - entry) / entry).try_into().unwrap_or(0.0);
            let risk_factor: f64 = ((entry - stop) / entry).try_into().unwrap_or(0.0);
            if risk_factor <= 0.0 {
                warnings.push(format!(
                    "{}: dropped from ranking, non-positive risk factor",
                    verdict.ticker
                ));
                return None;
            }

            let composite = verdict.confidence * expected_return * (1.0 / risk_factor);
            Some(RankedVerdict { verdict, composite })
        })
        .collect();

    ranked.sort_by(|a, b| b.composite.partial_cmp(&a.composite).unwrap_or(std::cmp::Ordering::Equal));
    ranked
}
