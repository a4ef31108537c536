//! Agent Panel: runs every registered `Agent` concurrently against the same
//! snapshot pair under a shared deadline, converting any agent that blows
//! the deadline into a `failed=true` HOLD rather than dropping it.

pub mod common;
pub mod contrarian;
pub mod growth;
pub mod llm;
pub mod multimodal;
pub mod predictor;

pub use contrarian::ContrarianAgent;
pub use growth::GrowthAgent;
pub use multimodal::MultiModalAgent;
pub use predictor::PredictorAgent;

use signal_core::{Agent, AgentVerdict, MarketSnapshot, SentimentSnapshot, Ticker};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const PANEL_DEADLINE: Duration = Duration::from_secs(30);

pub struct Panel {
    agents: Vec<Arc<dyn Agent>>,
    deadline: Duration,
}

impl Panel {
    pub fn new(agents: Vec<Arc<dyn Agent>>) -> Self {
        Self {
            agents,
            deadline: PANEL_DEADLINE,
        }
    }

    pub fn with_deadline(agents: Vec<Arc<dyn Agent>>, deadline: Duration) -> Self {
        Self { agents, deadline }
    }

    /// Per-agent weights as configured at construction, for the consensus
    /// engine's weighted aggregation. Keyed by agent name.
    pub fn weights(&self) -> HashMap<String, f64> {
        self.agents
            .iter()
            .map(|agent| (agent.name().to_string(), agent.weight()))
            .collect()
    }

    pub async fn run(
        &self,
        ticker: &Ticker,
        market: &MarketSnapshot,
        sentiment: &SentimentSnapshot,
    ) -> Vec<AgentVerdict> {
        let mut handles = Vec::with_capacity(self.agents.len());
        for agent in &self.agents {
            let agent = Arc::clone(agent);
            let ticker = ticker.clone();
            let market = market.clone();
            let sentiment = sentiment.clone();
            handles.push(tokio::spawn(async move {
                agent.analyze(&ticker, &market, &sentiment).await
            }));
        }

        let mut verdicts = Vec::with_capacity(handles.len());
        for (agent, handle) in self.agents.iter().zip(handles) {
            let verdict = match tokio::time::timeout(self.deadline, handle).await {
                Ok(Ok(verdict)) => verdict,
                Ok(Err(join_err)) => AgentVerdict::failed_hold(agent.name(), join_err),
                Err(_) => AgentVerdict::failed_hold(agent.name(), "panel deadline exceeded"),
            };
            verdicts.push(verdict);
        }
        verdicts
    }
}
