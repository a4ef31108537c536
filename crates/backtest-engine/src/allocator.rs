//! Portfolio Allocator: turns a ranked list of BUY verdicts into dollar
//! positions against the starting capital, per allocation mode.

use rust_decimal::Decimal;
use signal_core::{AllocationMode, PositionType};

use crate::ranker::RankedVerdict;

pub struct Allocation {
    pub ranked: RankedVerdict,
    pub allocation_pct: f64,
    pub position_value: Decimal,
    pub shares: u64,
    pub position_type: PositionType,
}

/// Diversified treats every slot equally; the other two modes concentrate
/// in rank 1 and call everything else a satellite position.
fn position_type_for(mode: AllocationMode, index: usize) -> PositionType {
    match mode {
        AllocationMode::Diversified => PositionType::Equal,
        _ if index == 0 => PositionType::Core,
        _ => PositionType::Satellite,
    }
}

/// `(rank1_pct, per_slot_pct, slots, cash_pct)`. Ranks beyond `slots` (plus
/// rank 1) receive nothing and are left unallocated.
fn table(mode: AllocationMode) -> (f64, f64, usize, f64) {
    match mode {
        AllocationMode::CoreFocus => (0.60, 0.10, 3, 0.10),
        AllocationMode::Balanced => (0.40, 0.125, 4, 0.10),
        AllocationMode::Diversified => (0.16, 0.16, 4, 0.20),
    }
}

/// Allocate capital across the ranked verdicts, highest composite first.
/// Verdicts ranked beyond the mode's slot count receive no position.
pub fn allocate(ranked: Vec<RankedVerdict>, starting_capital: Decimal, mode: AllocationMode) -> Vec<Allocation> {
    let (rank1_pct, per_slot_pct, extra_slots, _cash_pct) = table(mode);

    ranked
        .into_iter()
        .enumerate()
        .filter_map(|(index, r)| {
            let allocation_pct = if index == 0 {
                rank1_pct
            } else if index <= extra_slots {
                per_slot_pct
            } else {
                return None;
            };

            let entry = r.verdict.entry_price;
            if entry <= Decimal::ZERO {
                return None;
            }

            let position_value = starting_capital * Decimal::try_from(allocation_pct).unwrap_or_default();
            let shares: u64 = (position_value / entry).floor().try_into().unwrap_or(0);
            if shares == 0 {
                return None;
            }

            Some(Allocation {
                position_type: position_type_for(mode, index),
                ranked: r,
                allocation_pct,
                position_value,
                shares,
            })
        })
        .collect()
}
