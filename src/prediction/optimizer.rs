//! Optimizer Registry
//!
//! Maps a `Strategy` to the optimizer configured for it, so request handlers stay
//! agnostic of which back-ends a deployment actually has.

use super::types::{PredictionReport, SiteParameters, Strategy};

use anyhow::Result;
use dashmap::DashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type PredictionFuture<'a> = Pin<Box<dyn Future<Output = Result<PredictionReport>> + Send + 'a>>;

pub trait Optimizer: Send + Sync + 'static {
    fn strategy(&self) -> Strategy;

    fn recommend<'a>(&'a self, site: &'a SiteParameters) -> PredictionFuture<'a>;
}

pub struct OptimizerRegistry {
    optimizers: DashMap<Strategy, Arc<dyn Optimizer>>,
    default_strategy: Strategy,
}

impl OptimizerRegistry {
    pub fn new(default_strategy: Strategy) -> Arc<Self> {
        Arc::new(Self {
            optimizers: DashMap::new(),
            default_strategy,
        })
    }

    /// Registers `optimizer` under its own strategy, replacing any earlier one.
    pub fn register(&self, optimizer: Arc<dyn Optimizer>) {
        let strategy = optimizer.strategy();
        self.optimizers.insert(strategy, optimizer);
        tracing::info!("Registered optimizer: {}", strategy);
    }

    pub fn default_strategy(&self) -> Strategy {
        self.default_strategy
    }

    pub fn has_strategy(&self, strategy: Strategy) -> bool {
        self.optimizers.contains_key(&strategy)
    }

    pub fn strategies(&self) -> Vec<Strategy> {
        self.optimizers.iter().map(|entry| *entry.key()).collect()
    }

    /// Runs the optimizer for `strategy` (or the default) against `site`.
    pub async fn recommend(
        &self,
        strategy: Option<Strategy>,
        site: &SiteParameters,
    ) -> Result<PredictionReport> {
        let strategy = strategy.unwrap_or(self.default_strategy);

        // Clone the Arc out so the map shard is not locked across the await.
        let optimizer = self
            .optimizers
            .get(&strategy)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| anyhow::anyhow!("Optimizer not configured: {}", strategy))?;

        tracing::debug!(
            "Running {} optimizer for ({}, {})",
            strategy,
            site.lat,
            site.lon
        );
        optimizer.recommend(site).await
    }
}
