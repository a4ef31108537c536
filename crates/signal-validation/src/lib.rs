//! Boundary validation for the signal engine. Every function here returns
//! `SignalError::BadInput` or `SignalError::InvalidState` — never panics,
//! never retries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use signal_core::{AllocationMode, SignalError, SignalType, Ticker, VerdictStatus};

/// Reject a malformed ticker before any network call.
pub fn validate_ticker(raw: &str) -> Result<Ticker, SignalError> {
    Ticker::parse(raw)
}

pub fn validate_allocation_mode(raw: &str) -> Result<AllocationMode, SignalError> {
    AllocationMode::parse(raw)
}

/// A status transition is legal only along the linear lifecycle
/// Pending -> Approved -> Executed -> Closed. Applying the same transition
/// twice, or skipping a step, is rejected — never a silent no-op.
pub fn validate_status_transition(
    current: VerdictStatus,
    next: VerdictStatus,
) -> Result<(), SignalError> {
    if current.can_transition_to(next) {
        Ok(())
    } else {
        Err(SignalError::InvalidState(format!(
            "cannot transition from {current:?} to {next:?}"
        )))
    }
}

/// `start <= end` and a positive hold period; an empty date range or a
/// non-positive hold period is a caller error, not an empty-result case.
pub fn validate_backtest_range(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    hold_period_days: i64,
) -> Result<(), SignalError> {
    if start > end {
        return Err(SignalError::BadInput(format!(
            "start {start} is after end {end}"
        )));
    }
    if hold_period_days <= 0 {
        return Err(SignalError::BadInput(format!(
            "hold_period_days must be positive, got {hold_period_days}"
        )));
    }
    Ok(())
}

/// A non-empty selection is required before ranking/allocation can proceed
/// An empty selection is always InvalidState, never a silent empty report.
pub fn validate_non_empty_selection<T>(selection: &[T]) -> Result<(), SignalError> {
    if selection.is_empty() {
        Err(SignalError::InvalidState(
            "backtest selection is empty".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// A verdict's risk parameters must bracket the entry price in the
/// signal's direction; this guard rejects the zero/negative-price and
/// inverted-bracket cases a naive position-sizing calculation would miss.
pub fn validate_risk_params(
    signal_type: SignalType,
    entry_price: Decimal,
    stop_loss: Option<Decimal>,
    target_price: Option<Decimal>,
) -> Result<(), SignalError> {
    match signal_type {
        SignalType::Hold => {
            if stop_loss.is_some() || target_price.is_some() {
                return Err(SignalError::fatal(
                    "HOLD verdict must not carry risk parameters",
                ));
            }
            Ok(())
        }
        SignalType::Buy => {
            let (sl, tp) = (
                stop_loss.ok_or_else(|| SignalError::fatal("BUY missing stop_loss"))?,
                target_price.ok_or_else(|| SignalError::fatal("BUY missing target_price"))?,
            );
            if !(sl < entry_price && entry_price < tp) {
                return Err(SignalError::fatal(format!(
                    "BUY risk params out of order: {sl} < {entry_price} < {tp} violated"
                )));
            }
            Ok(())
        }
        SignalType::Sell => {
            let (sl, tp) = (
                stop_loss.ok_or_else(|| SignalError::fatal("SELL missing stop_loss"))?,
                target_price.ok_or_else(|| SignalError::fatal("SELL missing target_price"))?,
            );
            if !(tp < entry_price && entry_price < sl) {
                return Err(SignalError::fatal(format!(
                    "SELL risk params out of order: {tp} < {entry_price} < {sl} violated"
                )));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_ticker() {
        assert_eq!(validate_ticker("nvda").unwrap().as_str(), "NVDA");
    }

    #[test]
    fn rejects_numeric_ticker() {
        assert!(validate_ticker("NV1A").is_err());
    }

    #[test]
    fn rejects_overlong_ticker() {
        assert!(validate_ticker("TOOLONG").is_err());
    }

    #[test]
    fn linear_lifecycle_transitions_accepted() {
        assert!(validate_status_transition(VerdictStatus::Pending, VerdictStatus::Approved).is_ok());
        assert!(validate_status_transition(VerdictStatus::Approved, VerdictStatus::Executed).is_ok());
        assert!(validate_status_transition(VerdictStatus::Executed, VerdictStatus::Closed).is_ok());
    }

    #[test]
    fn repeat_transition_rejected() {
        assert!(validate_status_transition(VerdictStatus::Approved, VerdictStatus::Approved).is_err());
    }

    #[test]
    fn skipping_a_step_rejected() {
        assert!(validate_status_transition(VerdictStatus::Pending, VerdictStatus::Executed).is_err());
    }

    #[test]
    fn backward_transition_rejected() {
        assert!(validate_status_transition(VerdictStatus::Closed, VerdictStatus::Pending).is_err());
    }

    #[test]
    fn unknown_allocation_mode_rejected() {
        assert!(validate_allocation_mode("YOLO").is_err());
    }

    #[test]
    fn empty_selection_rejected() {
        let empty: Vec<u8> = Vec::new();
        assert!(validate_non_empty_selection(&empty).is_err());
    }
}
