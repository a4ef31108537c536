//! In-process `SignalRepository`. A real deployment backs this with a
//! relational store; this implementation exists so the service is
//! runnable and testable without one.

use async_trait::async_trait;
use dashmap::DashMap;
use signal_core::{
    BacktestReport, SignalError, SignalRepository, Verdict, VerdictFilter, VerdictStatus,
};
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryRepository {
    verdicts: DashMap<Uuid, Verdict>,
    backtests: DashMap<Uuid, BacktestReport>,
    insertion_order: AtomicU64,
    order: DashMap<Uuid, u64>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SignalRepository for InMemoryRepository {
    async fn save_verdict(&self, mut verdict: Verdict) -> Result<Uuid, SignalError> {
        let id = verdict.id.unwrap_or_else(Uuid::new_v4);
        verdict.id = Some(id);
        let seq = self.insertion_order.fetch_add(1, Ordering::SeqCst);
        self.order.insert(id, seq);
        self.verdicts.insert(id, verdict);
        Ok(id)
    }

    async fn load_verdict(&self, id: Uuid) -> Result<Verdict, SignalError> {
        self.verdicts
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| SignalError::BadInput(format!("no verdict with id {id}")))
    }

    async fn list_verdicts(&self, filter: VerdictFilter) -> Result<Vec<Verdict>, SignalError> {
        let mut matches: Vec<(u64, Verdict)> = self
            .verdicts
            .iter()
            .filter(|entry| {
                let v = entry.value();
                filter.ticker.as_ref().is_none_or(|t| t == &v.ticker)
                    && filter.signal_type.is_none_or(|s| s == v.signal_type)
                    && filter.status.is_none_or(|s| s == v.status)
                    && filter
                        .window
                        .is_none_or(|(start, end)| v.created_at >= start && v.created_at <= end)
            })
            .map(|entry| {
                let id = *entry.key();
                let seq = self.order.get(&id).map(|s| *s).unwrap_or(0);
                (seq, entry.value().clone())
            })
            .collect();

        matches.sort_by_key(|(seq, _)| *seq);
        let page: Vec<Verdict> = matches
            .into_iter()
            .map(|(_, v)| v)
            .skip(filter.offset)
            .take(if filter.limit == 0 { usize::MAX } else { filter.limit })
            .collect();
        Ok(page)
    }

    async fn update_status(&self, id: Uuid, new_status: VerdictStatus) -> Result<Verdict, SignalError> {
        let mut entry = self
            .verdicts
            .get_mut(&id)
            .ok_or_else(|| SignalError::BadInput(format!("no verdict with id {id}")))?;
        signal_validation::validate_status_transition(entry.status, new_status)?;
        entry.status = new_status;
        Ok(entry.clone())
    }

    async fn save_backtest(&self, report: BacktestReport) -> Result<Uuid, SignalError> {
        let id = Uuid::new_v4();
        self.backtests.insert(id, report);
        Ok(id)
    }
}
