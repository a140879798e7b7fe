//! Simulated optimizer.
//!
//! Produces plausible-looking numbers without any network access, for demos and for
//! running the service with no upstream credentials. The values are random and carry
//! no physical meaning.

use super::optimizer::{Optimizer, PredictionFuture};
use super::types::{round2, EnergyProfile, PredictionReport, SeriesPoint, SiteParameters, Strategy};

use anyhow::Result;
use rand::Rng;
use std::time::Duration;

pub const DEFAULT_SIMULATED_LATENCY: Duration = Duration::from_millis(1200);

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub struct SimulatedOptimizer {
    latency: Duration,
}

impl SimulatedOptimizer {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    async fn simulate_after_latency(&self) -> Result<PredictionReport> {
        tokio::time::sleep(self.latency).await;
        Ok(simulate(&mut rand::thread_rng()))
    }
}

impl Default for SimulatedOptimizer {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATED_LATENCY)
    }
}

impl Optimizer for SimulatedOptimizer {
    fn strategy(&self) -> Strategy {
        Strategy::Simulated
    }

    fn recommend<'a>(&'a self, _site: &'a SiteParameters) -> PredictionFuture<'a> {
        Box::pin(self.simulate_after_latency())
    }
}

/// Draws one simulated report from `rng`.
pub fn simulate<R: Rng>(rng: &mut R) -> PredictionReport {
    let monthly = MONTHS
        .iter()
        .map(|month| SeriesPoint {
            label: month.to_string(),
            value: rng.gen_range(20..120) as f64,
        })
        .collect();

    let daily_total = round2(rng.gen_range(0.0..50.0));
    let optimal_tilt = rng.gen_range(15..45) as f64;
    let optimal_azimuth = rng.gen_range(0..360) as f64;
    let optimal_daily_total = round2(rng.gen_range(10.0..60.0));

    PredictionReport {
        strategy: Strategy::Simulated,
        optimal_tilt_deg: optimal_tilt,
        optimal_azimuth_deg: optimal_azimuth,
        reasoning: None,
        current: Some(EnergyProfile {
            daily_total_kwh: daily_total,
            hourly: Vec::new(),
        }),
        optimal: Some(EnergyProfile {
            daily_total_kwh: optimal_daily_total,
            hourly: Vec::new(),
        }),
        monthly,
    }
}
