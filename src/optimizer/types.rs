use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::{DayResult, ParameterSet, ScenarioInput};
use crate::error::{ConfigError, ScheduleError};

/// Big-M constant of the controller linearization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BigM {
    /// Derived per day from interval bounds of the model's state variables.
    #[default]
    Derived,
    /// Fixed value. Too small a value silently yields a wrong optimum.
    Fixed(f64),
}

/// Modelling constants handed to every day's model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    pub big_m: BigM,
    /// Hold tolerance of the low-temperature controller (°C).
    pub epsilon: f64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            big_m: BigM::Derived,
            epsilon: 0.01,
        }
    }
}

impl ModelSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(ConfigError::InvalidSolverSettings(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        if let BigM::Fixed(m) = self.big_m {
            if !(m > self.epsilon && m.is_finite()) {
                return Err(ConfigError::InvalidSolverSettings(format!(
                    "big_m must be finite and larger than epsilon, got {m}"
                )));
            }
        }
        Ok(())
    }
}

/// A way of computing one day's schedule.
#[async_trait]
pub trait SchedulingStrategy: Send + Sync {
    async fn schedule_day(
        &self,
        params: Arc<ParameterSet>,
        scenario: ScenarioInput,
    ) -> Result<DayResult, ScheduleError>;

    fn name(&self) -> &str;
}
