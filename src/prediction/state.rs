//! Per-session prediction slice.

use super::optimizer::OptimizerRegistry;
use super::types::{PredictionReport, SiteParameters, Strategy};

use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

pub const GENERATIVE_FAILED_NOTICE: &str = "Failed to parse API response. Please try again later.";
pub const NO_LOCATION_NOTICE: &str = "Please select a location from the search suggestions first.";

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PredictionSnapshot {
    pub loading: bool,
    pub report: Option<PredictionReport>,
    pub notice: Option<String>,
}

#[derive(Default)]
struct PredictionSlice {
    snapshot: PredictionSnapshot,
    ticket: u64,
}

#[derive(Default)]
pub struct PredictionState {
    slice: Mutex<PredictionSlice>,
}

impl PredictionState {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PredictionSlice> {
        self.slice.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn snapshot(&self) -> PredictionSnapshot {
        self.lock().snapshot.clone()
    }

    /// Records that a prediction was requested before any location was accepted.
    pub fn reject_missing_location(&self) -> PredictionSnapshot {
        let mut slice = self.lock();
        slice.snapshot.notice = Some(NO_LOCATION_NOTICE.to_string());
        slice.snapshot.clone()
    }

    /// Runs one prediction and stores its outcome, unless a newer run started meanwhile.
    pub async fn run(
        &self,
        registry: &OptimizerRegistry,
        strategy: Option<Strategy>,
        site: &SiteParameters,
    ) -> PredictionSnapshot {
        let ticket = {
            let mut slice = self.lock();
            slice.ticket += 1;
            slice.snapshot.loading = true;
            slice.snapshot.notice = None;
            slice.ticket
        };

        let strategy = strategy.unwrap_or_else(|| registry.default_strategy());
        let result = registry.recommend(Some(strategy), site).await;

        let mut slice = self.lock();
        if slice.ticket != ticket {
            tracing::debug!("Discarding superseded {} prediction", strategy);
            return slice.snapshot.clone();
        }
        slice.snapshot.loading = false;

        match result {
            Ok(report) => {
                tracing::info!(
                    "{} prediction: tilt {:.1}°, azimuth {:.1}°",
                    strategy,
                    report.optimal_tilt_deg,
                    report.optimal_azimuth_deg
                );
                slice.snapshot.report = Some(report);
            }
            Err(err) => {
                tracing::error!("{} prediction failed: {:#}", strategy, err);
                slice.snapshot.report = None;
                slice.snapshot.notice = Some(match strategy {
                    Strategy::Generative => GENERATIVE_FAILED_NOTICE.to_string(),
                    _ => format!("Prediction failed: {}", err),
                });
            }
        }

        slice.snapshot.clone()
    }
}
