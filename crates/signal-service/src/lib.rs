//! Signal Service: the transport-agnostic core. Wires market data,
//! sentiment, the agent panel, consensus, and the backtest engine behind
//! the seven operations an HTTP or CLI layer calls.

pub mod config;
pub mod repository;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use backtest_engine::BacktestRequest;
use chrono::{DateTime, Utc};
use consensus_engine::RiskConfig;
use market_data::MarketDataAggregator;
use rust_decimal::Decimal;
use sentiment_data::SentimentAggregator;
use signal_core::{
    AllocationMode, BacktestReport, HistoricalBar, SignalError, SignalRepository, Ticker,
    Verdict, VerdictFilter, VerdictStatus,
};
use uuid::Uuid;

pub use agent_panel::Panel;

/// Input to `run_backtest`/`compare_backtest_modes`.
#[derive(Debug, Clone)]
pub struct BacktestRunRequest {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub mode: AllocationMode,
    pub starting_capital: Decimal,
    pub hold_period_days: u32,
}

pub struct SignalService<R: SignalRepository> {
    market: MarketDataAggregator,
    sentiment: SentimentAggregator,
    panel: Panel,
    risk_config: RiskConfig,
    repository: R,
    signal_deadline: Duration,
    backtest_deadline: Duration,
    historical_days: u32,
}

impl<R: SignalRepository> SignalService<R> {
    pub fn new(
        market: MarketDataAggregator,
        sentiment: SentimentAggregator,
        panel: Panel,
        risk_config: RiskConfig,
        repository: R,
        signal_deadline: Duration,
        backtest_deadline: Duration,
    ) -> Self {
        Self {
            market,
            sentiment,
            panel,
            risk_config,
            repository,
            signal_deadline,
            backtest_deadline,
            historical_days: 100,
        }
    }

    /// Fetch market + sentiment, run the panel, collapse to a consensus
    /// verdict, and persist it. The top-level deadline bounds the whole
    /// pipeline; on expiry the request reports Unavailable rather than
    /// returning a verdict assembled from a half-finished panel run.
    pub async fn generate_signal(&self, ticker: &str) -> Result<Verdict, SignalError> {
        let ticker = signal_validation::validate_ticker(ticker)?;

        let pipeline = async {
            let (market, sentiment) =
                tokio::join!(self.market.snapshot(&ticker, self.historical_days), self.sentiment.snapshot(&ticker));

            let agent_verdicts = self.panel.run(&ticker, &market, &sentiment).await;
            let weights = self.panel.weights();

            let verdict = consensus_engine::build_verdict(
                ticker.clone(),
                market.current_price,
                agent_verdicts,
                |name: &str| weights.get(name).copied().unwrap_or(1.0),
                &self.risk_config,
            )?;

            let id = self.repository.save_verdict(verdict).await?;
            self.repository.load_verdict(id).await
        };

        match tokio::time::timeout(self.signal_deadline, pipeline).await {
            Ok(result) => result,
            Err(_) => Err(SignalError::Unavailable(format!(
                "generate_signal({ticker}) exceeded {:?} deadline",
                self.signal_deadline
            ))),
        }
    }

    /// One verdict per valid ticker; a malformed ticker is skipped and
    /// logged rather than failing the whole batch.
    pub async fn generate_batch(&self, tickers: &[String]) -> Vec<Verdict> {
        let mut verdicts = Vec::with_capacity(tickers.len());
        for ticker in tickers {
            match self.generate_signal(ticker).await {
                Ok(verdict) => verdicts.push(verdict),
                Err(err) => tracing::warn!(ticker, %err, "generate_batch: skipping ticker"),
            }
        }
        verdicts
    }

    pub async fn list_signals(&self, filter: VerdictFilter) -> Result<Vec<Verdict>, SignalError> {
        self.repository.list_verdicts(filter).await
    }

    pub async fn get_signal(&self, id: Uuid) -> Result<Verdict, SignalError> {
        self.repository.load_verdict(id).await
    }

    pub async fn update_signal_status(
        &self,
        id: Uuid,
        new_status: VerdictStatus,
        pnl: Option<Decimal>,
        notes: Option<String>,
    ) -> Result<Verdict, SignalError> {
        if let Some(pnl) = pnl {
            tracing::info!(%id, %pnl, "update_signal_status: realized pnl recorded");
        }
        if let Some(notes) = &notes {
            tracing::info!(%id, notes, "update_signal_status: notes recorded");
        }
        self.repository.update_status(id, new_status).await
    }

    async fn price_history_for(&self, tickers: &[Ticker], hold_period_days: u32) -> HashMap<Ticker, Vec<HistoricalBar>> {
        let days = self.historical_days.max(hold_period_days + 30);
        let mut out = HashMap::new();
        for ticker in tickers {
            let snapshot = self.market.snapshot(ticker, days).await;
            out.insert(ticker.clone(), snapshot.historical);
        }
        out
    }

    /// The selection and price history steps (2 and the historical fetch
    /// ahead of it) are identical regardless of which allocation mode ends
    /// up simulating them, so `run_backtest` and `compare_backtest_modes`
    /// share this rather than each re-querying the repository.
    async fn select_for_backtest(
        &self,
        request: &BacktestRunRequest,
    ) -> Result<(Vec<Verdict>, HashMap<Ticker, Vec<HistoricalBar>>), SignalError> {
        signal_validation::validate_backtest_range(request.start, request.end, request.hold_period_days as i64)?;

        let filter = VerdictFilter {
            signal_type: Some(signal_core::SignalType::Buy),
            window: Some((request.start, request.end)),
            limit: 0,
            offset: 0,
            ..Default::default()
        };
        let selection = self.repository.list_verdicts(filter).await?;
        signal_validation::validate_non_empty_selection(&selection)?;

        let tickers: Vec<Ticker> = {
            let mut seen = Vec::new();
            for v in &selection {
                if !seen.contains(&v.ticker) {
                    seen.push(v.ticker.clone());
                }
            }
            seen
        };
        let price_history = self.price_history_for(&tickers, request.hold_period_days).await;
        Ok((selection, price_history))
    }

    async fn run_one_backtest(
        &self,
        request: &BacktestRunRequest,
    ) -> Result<BacktestReport, SignalError> {
        let (selection, price_history) = self.select_for_backtest(request).await?;

        let backtest_request = BacktestRequest {
            start: request.start,
            end: request.end,
            mode: request.mode,
            starting_capital: request.starting_capital,
            hold_period_days: request.hold_period_days,
        };

        backtest_engine::run_backtest(&selection, &price_history, &backtest_request)
    }

    pub async fn run_backtest(&self, request: BacktestRunRequest) -> Result<BacktestReport, SignalError> {
        match tokio::time::timeout(self.backtest_deadline, self.run_one_backtest(&request)).await {
            Ok(result) => {
                let report = result?;
                self.repository.save_backtest(report.clone()).await?;
                Ok(report)
            }
            Err(_) => Err(SignalError::Unavailable(format!(
                "run_backtest exceeded {:?} deadline",
                self.backtest_deadline
            ))),
        }
    }

    /// Selects the BUY verdicts once, then runs steps 2-5 independently for
    /// each allocation mode over that same selection, via
    /// `backtest_engine::compare_modes`.
    pub async fn compare_backtest_modes(
        &self,
        request: BacktestRunRequest,
    ) -> Result<Vec<BacktestReport>, SignalError> {
        let pipeline = async {
            let (selection, price_history) = self.select_for_backtest(&request).await?;
            let base = BacktestRequest {
                start: request.start,
                end: request.end,
                mode: request.mode,
                starting_capital: request.starting_capital,
                hold_period_days: request.hold_period_days,
            };

            let mut reports = backtest_engine::compare_modes(&selection, &price_history, &base)?;

            let mut ordered = Vec::with_capacity(reports.len());
            for mode in signal_core::traits::all_allocation_modes() {
                if let Some(report) = reports.remove(&mode) {
                    self.repository.save_backtest(report.clone()).await?;
                    ordered.push(report);
                }
            }
            Ok(ordered)
        };

        match tokio::time::timeout(self.backtest_deadline, pipeline).await {
            Ok(result) => result,
            Err(_) => Err(SignalError::Unavailable(format!(
                "compare_backtest_modes exceeded {:?} deadline",
                self.backtest_deadline
            ))),
        }
    }
}

/// Construct the production wiring: three market-data providers, reddit +
/// news sentiment, and the four-agent panel behind three independent LLM
/// vendors, per the configured base URLs and keys.
pub fn build_production_panel(config: &config::ServiceConfig) -> Panel {
    use agent_panel::llm::HttpLlmClient;
    use agent_panel::{ContrarianAgent, GrowthAgent, MultiModalAgent, PredictorAgent};

    let contrarian_client: Arc<dyn agent_panel::llm::LlmClient> = Arc::new(HttpLlmClient::new(
        "contrarian-llm",
        config.contrarian_llm_base_url.clone(),
        config.contrarian_llm_api_key.clone(),
    ));
    let growth_client: Arc<dyn agent_panel::llm::LlmClient> = Arc::new(HttpLlmClient::new(
        "growth-llm",
        config.growth_llm_base_url.clone(),
        config.growth_llm_api_key.clone(),
    ));
    let multimodal_client: Arc<dyn agent_panel::llm::LlmClient> = Arc::new(HttpLlmClient::new(
        "multimodal-llm",
        config.multimodal_llm_base_url.clone(),
        config.multimodal_llm_api_key.clone(),
    ));

    Panel::new(vec![
        Arc::new(ContrarianAgent::new(contrarian_client, config.contrarian_model.clone())),
        Arc::new(GrowthAgent::new(growth_client, config.growth_model.clone())),
        Arc::new(MultiModalAgent::new(multimodal_client, config.multimodal_model.clone())),
        Arc::new(PredictorAgent::new()),
    ])
}

pub fn build_production_market_data(config: &config::ServiceConfig) -> MarketDataAggregator {
    use market_data::providers::{PrimaryFeed, SecondaryFeed, TertiaryFeed};
    use signal_core::MarketDataProvider;

    let providers: Vec<Arc<dyn MarketDataProvider>> = vec![
        Arc::new(PrimaryFeed::new(config.primary_market_base_url.clone(), config.primary_market_api_key.clone())),
        Arc::new(SecondaryFeed::new(config.secondary_market_base_url.clone(), config.secondary_market_api_key.clone())),
        Arc::new(TertiaryFeed::new(config.tertiary_market_base_url.clone(), config.tertiary_market_api_key.clone())),
    ];
    MarketDataAggregator::new(providers)
}

pub fn build_production_sentiment(config: &config::ServiceConfig) -> SentimentAggregator {
    use sentiment_data::{NewsSource, RedditSource};

    SentimentAggregator::new(
        Box::new(RedditSource::new(config.reddit_base_url.clone())),
        Box::new(NewsSource::new(config.news_base_url.clone(), config.news_api_key.clone())),
    )
}
