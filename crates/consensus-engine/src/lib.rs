//! Consensus Engine: collapses the panel's `AgentVerdict`s into a single
//! `Verdict` with risk parameters and position sizing. An all-agents-failed
//! panel still produces a HOLD verdict with the failures preserved for
//! audit; `build_verdict` only fails when a non-HOLD signal is blended from
//! a snapshot with no usable entry price, which would otherwise bracket a
//! zero entry price with a zero stop-loss and target.

use chrono::Utc;
use rust_decimal::Decimal;
use signal_core::{AgentVerdict, SignalError, SignalType, Ticker, Verdict, VerdictStatus};

const TIE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy)]
pub struct RiskConfig {
    /// Stop-loss distance from entry, fraction of entry price. Default 0.10.
    pub stop_loss_pct: f64,
    /// First scale-out target distance from entry. Default 0.25.
    pub target_pct: f64,
    /// Total deployable capital.
    pub capital: Decimal,
    /// Max fraction of capital committed to a single position.
    pub max_position_pct: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            stop_loss_pct: 0.10,
            target_pct: 0.25,
            capital: Decimal::from(50_000),
            max_position_pct: 0.10,
        }
    }
}

pub struct ConsensusResult {
    pub blended_score: f64,
    pub agreement_ratio: f64,
    pub consensus_confidence: f64,
    pub signal_type: SignalType,
}

/// Weighted aggregation of agent verdicts into a blended score, agreement
/// ratio, and consensus confidence. Agents with `failed=true` contribute
/// nothing to the numerator or denominator.
pub fn aggregate(agent_verdicts: &[AgentVerdict], weight_of: impl Fn(&str) -> f64) -> ConsensusResult {
    let mut numerator = 0.0;
    let mut denominator = 0.0;
    let mut positive = 0usize;
    let mut negative = 0usize;
    let mut zero = 0usize;
    let mut non_failed = 0usize;

    for verdict in agent_verdicts {
        if verdict.failed {
            continue;
        }
        non_failed += 1;
        let w = weight_of(&verdict.agent_name) * verdict.confidence;
        numerator += w * verdict.raw_score;
        denominator += w;

        if verdict.raw_score > TIE_EPSILON {
            positive += 1;
        } else if verdict.raw_score < -TIE_EPSILON {
            negative += 1;
        } else {
            zero += 1;
        }
    }

    let blended_score = if denominator > 0.0 { numerator / denominator } else { 0.0 };

    let agreement_ratio = if non_failed > 0 {
        positive.max(negative).max(zero) as f64 / non_failed as f64
    } else {
        0.0
    };

    // A true split: positive and negative weighted mass effectively equal.
    let is_tie = positive > 0 && negative > 0 && blended_score.abs() < TIE_EPSILON;

    let signal_type = if is_tie {
        SignalType::Hold
    } else if blended_score >= 0.1 {
        SignalType::Buy
    } else if blended_score <= -0.1 {
        SignalType::Sell
    } else {
        SignalType::Hold
    };

    let consensus_confidence = if is_tie {
        agreement_ratio
    } else {
        (0.5 * blended_score.abs() + 0.5 * agreement_ratio).clamp(0.0, 1.0)
    };

    ConsensusResult {
        blended_score,
        agreement_ratio,
        consensus_confidence,
        signal_type,
    }
}

/// Risk parameters are only computed for a non-HOLD signal.
pub fn risk_params(
    signal_type: SignalType,
    entry_price: Decimal,
    config: &RiskConfig,
) -> (Option<Decimal>, Option<Decimal>) {
    match signal_type {
        SignalType::Hold => (None, None),
        SignalType::Buy => {
            let sl = entry_price * Decimal::try_from(1.0 - config.stop_loss_pct).unwrap_or(Decimal::ONE);
            let tp = entry_price * Decimal::try_from(1.0 + config.target_pct).unwrap_or(Decimal::ONE);
            (Some(sl), Some(tp))
        }
        SignalType::Sell => {
            let sl = entry_price * Decimal::try_from(1.0 + config.stop_loss_pct).unwrap_or(Decimal::ONE);
            let tp = entry_price * Decimal::try_from(1.0 - config.target_pct).unwrap_or(Decimal::ONE);
            (Some(sl), Some(tp))
        }
    }
}

/// `floor(scaled_value / entry_price)`, zero for HOLD or a non-positive
/// entry price (the source bug this repository fixes explicitly).
pub fn position_size(
    signal_type: SignalType,
    entry_price: Decimal,
    consensus_confidence: f64,
    config: &RiskConfig,
) -> u64 {
    if signal_type == SignalType::Hold || entry_price <= Decimal::ZERO {
        return 0;
    }

    let max_position_value = config.capital * Decimal::try_from(config.max_position_pct).unwrap_or_default();
    let scaled_value = max_position_value * Decimal::try_from(consensus_confidence).unwrap_or_default();
    let shares = (scaled_value / entry_price).floor();
    shares.try_into().unwrap_or(0)
}

/// Build the final `Verdict` from panel outputs, the current price, and a
/// risk configuration. Escalates to `SignalError::Fatal` if the resulting
/// risk parameters would not bracket the entry price in the signal's
/// direction — the one way a non-HOLD verdict can become internally
/// inconsistent, when `entry_price` is missing or non-positive.
pub fn build_verdict(
    ticker: Ticker,
    entry_price: Option<Decimal>,
    agent_verdicts: Vec<AgentVerdict>,
    weight_of: impl Fn(&str) -> f64,
    config: &RiskConfig,
) -> Result<Verdict, SignalError> {
    let consensus = aggregate(&agent_verdicts, weight_of);

    let entry_price = entry_price.unwrap_or(Decimal::ZERO);
    let (stop_loss, target_price) = risk_params(consensus.signal_type, entry_price, config);
    let size = position_size(consensus.signal_type, entry_price, consensus.consensus_confidence, config);

    signal_validation::validate_risk_params(consensus.signal_type, entry_price, stop_loss, target_price)?;

    Ok(Verdict {
        id: None,
        ticker,
        created_at: Utc::now(),
        signal_type: consensus.signal_type,
        confidence: consensus.consensus_confidence,
        entry_price,
        stop_loss,
        target_price,
        position_size: size,
        status: VerdictStatus::Pending,
        agent_verdicts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn verdict(name: &str, raw_score: f64, confidence: f64, failed: bool) -> AgentVerdict {
        AgentVerdict {
            agent_name: name.to_string(),
            signal: signal_core::SignalLevel::from_score(raw_score),
            raw_score,
            confidence,
            reasoning: "test".to_string(),
            data_used: HashMap::new(),
            failed,
        }
    }

    fn equal_weight(_name: &str) -> f64 {
        1.0
    }

    #[test]
    fn unanimous_buy_blends_to_buy() {
        let verdicts = vec![
            verdict("a", 0.8, 1.0, false),
            verdict("b", 0.6, 1.0, false),
        ];
        let result = aggregate(&verdicts, equal_weight);
        assert_eq!(result.signal_type, SignalType::Buy);
        assert!(result.blended_score > 0.1);
    }

    #[test]
    fn true_split_results_in_hold() {
        let verdicts = vec![
            verdict("a", 0.5, 1.0, false),
            verdict("b", -0.5, 1.0, false),
        ];
        let result = aggregate(&verdicts, equal_weight);
        assert_eq!(result.signal_type, SignalType::Hold);
        assert_eq!(result.consensus_confidence, result.agreement_ratio);
    }

    #[test]
    fn all_failed_produces_hold_with_zero_confidence() {
        let verdicts = vec![verdict("a", 0.9, 1.0, true), verdict("b", -0.9, 1.0, true)];
        let result = aggregate(&verdicts, equal_weight);
        assert_eq!(result.signal_type, SignalType::Hold);
        assert_eq!(result.blended_score, 0.0);
    }

    #[test]
    fn zero_entry_price_yields_zero_position_size() {
        let config = RiskConfig::default();
        let size = position_size(SignalType::Buy, Decimal::ZERO, 0.9, &config);
        assert_eq!(size, 0);
    }

    #[test]
    fn negative_entry_price_yields_zero_position_size() {
        let config = RiskConfig::default();
        let size = position_size(SignalType::Buy, dec!(-10), 0.9, &config);
        assert_eq!(size, 0);
    }

    #[test]
    fn buy_risk_params_bracket_entry() {
        let config = RiskConfig::default();
        let (sl, tp) = risk_params(SignalType::Buy, dec!(100), &config);
        assert_eq!(sl, Some(dec!(90.00)));
        assert_eq!(tp, Some(dec!(125.00)));
    }

    #[test]
    fn sell_risk_params_bracket_entry_inverted() {
        let config = RiskConfig::default();
        let (sl, tp) = risk_params(SignalType::Sell, dec!(100), &config);
        assert_eq!(sl, Some(dec!(110.00)));
        assert_eq!(tp, Some(dec!(75.00)));
    }

    #[test]
    fn build_verdict_without_price_on_a_buy_signal_is_fatal() {
        let err = build_verdict(
            Ticker::parse("NVDA").unwrap(),
            None,
            vec![verdict_buy()],
            equal_weight,
            &RiskConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SignalError::Fatal { .. }));
    }

    #[test]
    fn build_verdict_without_price_on_a_hold_signal_succeeds() {
        let verdict = build_verdict(
            Ticker::parse("NVDA").unwrap(),
            None,
            vec![verdict("a", 0.0, 1.0, false)],
            equal_weight,
            &RiskConfig::default(),
        )
        .unwrap();
        assert_eq!(verdict.entry_price, Decimal::ZERO);
        assert_eq!(verdict.position_size, 0);
        assert_eq!(verdict.signal_type, SignalType::Hold);
    }

    #[test]
    fn build_verdict_with_price_on_a_buy_signal_succeeds() {
        let verdict = build_verdict(
            Ticker::parse("NVDA").unwrap(),
            Some(dec!(100)),
            vec![verdict_buy()],
            equal_weight,
            &RiskConfig::default(),
        )
        .unwrap();
        assert_eq!(verdict.signal_type, SignalType::Buy);
        assert!(verdict.stop_loss.unwrap() < verdict.entry_price);
        assert!(verdict.entry_price < verdict.target_price.unwrap());
    }

    fn verdict_buy() -> AgentVerdict {
        verdict("predictor", 0.7, 1.0, false)
    }
}
