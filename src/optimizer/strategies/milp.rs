//! MILP (Mixed-Integer Linear Programming) scheduler
//!
//! Exact day-ahead schedule of both room heaters and the ventilation. Each
//! day is an independent model; see [`crate::optimizer::model`] for the
//! formulation:
//! - Coupled room temperature and shared humidity dynamics
//! - Low/high temperature and humidity overrule controllers (big-M hysteresis)
//! - Ventilation minimum up-time
//! - Electricity cost of heating and ventilation as objective

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::domain::{DayResult, ParameterSet, ScenarioInput};
use crate::error::ScheduleError;
use crate::optimizer::{DayModel, ModelSettings, SchedulingStrategy};

/// MILP scheduler backed by the pure-Rust `microlp` branch-and-bound solver.
#[derive(Debug, Clone)]
pub struct MilpScheduler {
    settings: ModelSettings,
    /// Wall-clock budget of one day's solve
    time_limit: Duration,
}

impl Default for MilpScheduler {
    fn default() -> Self {
        Self {
            settings: ModelSettings::default(),
            time_limit: Duration::from_secs(60),
        }
    }
}

impl MilpScheduler {
    pub fn new(settings: ModelSettings, time_limit: Duration) -> Self {
        Self {
            settings,
            time_limit,
        }
    }

    /// Build and solve one day on the calling thread.
    pub fn solve_day(
        &self,
        params: &ParameterSet,
        scenario: &ScenarioInput,
    ) -> Result<DayResult, ScheduleError> {
        let started = Instant::now();
        let model = DayModel::build(params, scenario, &self.settings)?;
        let result = model.solve(scenario)?;

        debug!(
            day = scenario.day,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "day solved"
        );
        Ok(result)
    }
}

#[async_trait]
impl SchedulingStrategy for MilpScheduler {
    async fn schedule_day(
        &self,
        params: Arc<ParameterSet>,
        scenario: ScenarioInput,
    ) -> Result<DayResult, ScheduleError> {
        let day = scenario.day;
        scenario.check_shape(params.horizon)?;

        // The solver is synchronous; keep it off the async workers. A solve
        // that overruns its budget is abandoned, its thread finishes unobserved.
        let scheduler = self.clone();
        let solve = tokio::task::spawn_blocking(move || scheduler.solve_day(&params, &scenario));

        match tokio::time::timeout(self.time_limit, solve).await {
            Ok(Ok(result)) => {
                if let Ok(day_result) = &result {
                    info!(day, cost = day_result.total_cost, "schedule found");
                }
                result
            }
            Ok(Err(join_error)) => Err(ScheduleError::SolverFailure {
                day,
                reason: format!("solver task failed: {join_error}"),
            }),
            Err(_) => Err(ScheduleError::SolverFailure {
                day,
                reason: format!("time limit of {}s exceeded", self.time_limit.as_secs_f64()),
            }),
        }
    }

    fn name(&self) -> &str {
        "milp"
    }
}
