use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};

use crate::domain::{BatchReport, DayResult, ParameterSet, ScenarioInput};
use crate::error::ScheduleError;
use crate::optimizer::SchedulingStrategy;
use crate::simulation::ReplayVerifier;

/// Runs one independent solve per scenario-day and collects every outcome.
///
/// Days never share model state: each gets its own model, a failure is
/// recorded against its own day index and the rest of the batch continues.
pub struct BatchDriver {
    strategy: Arc<dyn SchedulingStrategy>,
    params: Arc<ParameterSet>,
    workers: usize,
    verifier: Option<ReplayVerifier>,
}

impl BatchDriver {
    pub fn new(strategy: Arc<dyn SchedulingStrategy>, params: Arc<ParameterSet>) -> Self {
        Self {
            strategy,
            params,
            workers: default_workers(),
            verifier: None,
        }
    }

    /// Maximum number of days solved concurrently.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Replay every solved day and log what the replay disagrees with.
    pub fn with_verifier(mut self, verifier: ReplayVerifier) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub async fn run(&self, scenarios: Vec<ScenarioInput>, cancel: CancellationToken) -> BatchReport {
        let total = scenarios.len();
        info!(
            days = total,
            workers = self.workers,
            strategy = self.strategy.name(),
            "batch started"
        );

        let days: BTreeMap<usize, Result<DayResult, ScheduleError>> = stream::iter(scenarios)
            .map(|scenario| {
                let day = scenario.day;
                let cancel = cancel.clone();
                async move {
                    let outcome = self.run_day(scenario, cancel).await;
                    (day, outcome)
                }
                .instrument(info_span!("day", day))
            })
            .buffer_unordered(self.workers)
            .collect()
            .await;

        let report = BatchReport { days };
        let summary = report.summary();
        info!(
            days = summary.days,
            solved = summary.solved,
            failed = summary.failed.len(),
            total_cost = summary.total_cost,
            "batch finished"
        );
        report
    }

    async fn run_day(
        &self,
        scenario: ScenarioInput,
        cancel: CancellationToken,
    ) -> Result<DayResult, ScheduleError> {
        let day = scenario.day;
        if cancel.is_cancelled() {
            return Err(ScheduleError::Cancelled { day });
        }

        let replay_input = self.verifier.map(|_| scenario.clone());
        let outcome = tokio::select! {
            _ = cancel.cancelled() => Err(ScheduleError::Cancelled { day }),
            result = self.strategy.schedule_day(self.params.clone(), scenario) => result,
        };

        match &outcome {
            Ok(result) => {
                if let (Some(verifier), Some(scenario)) = (&self.verifier, &replay_input) {
                    let violations = verifier.verify(&self.params, scenario, result);
                    for violation in &violations {
                        warn!(%violation, "replay disagrees with solver");
                    }
                }
            }
            Err(e) => warn!(error = %e, kind = e.kind(), "day failed"),
        }
        outcome
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
