use thiserror::Error;

/// Failure of a single day's schedule. Never fatal to a batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScheduleError {
    #[error("day {day}: {series} has {actual} values, expected {expected}")]
    InputShape {
        day: usize,
        series: String,
        expected: usize,
        actual: usize,
    },

    #[error("day {day}: no schedule satisfies the model constraints")]
    Infeasible { day: usize },

    #[error("day {day}: solver failure: {reason}")]
    SolverFailure { day: usize, reason: String },

    #[error("day {day}: cancelled before the solve finished")]
    Cancelled { day: usize },
}

impl ScheduleError {
    pub fn day(&self) -> usize {
        match self {
            ScheduleError::InputShape { day, .. }
            | ScheduleError::Infeasible { day }
            | ScheduleError::SolverFailure { day, .. }
            | ScheduleError::Cancelled { day } => *day,
        }
    }

    /// Short machine-readable category, written to the daily result file.
    pub fn kind(&self) -> &'static str {
        match self {
            ScheduleError::InputShape { .. } => "input_shape",
            ScheduleError::Infeasible { .. } => "infeasible",
            ScheduleError::SolverFailure { .. } => "solver_failure",
            ScheduleError::Cancelled { .. } => "cancelled",
        }
    }
}

/// Invalid building parameters or solver settings, detected at start-up.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid building parameters: {0}")]
    InvalidParameters(#[from] validator::ValidationErrors),

    #[error("invalid solver settings: {0}")]
    InvalidSolverSettings(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_day_and_kind() {
        let err = ScheduleError::SolverFailure {
            day: 3,
            reason: "time limit of 1s exceeded".into(),
        };
        assert_eq!(err.day(), 3);
        assert_eq!(err.kind(), "solver_failure");
        assert_eq!(err.to_string(), "day 3: solver failure: time limit of 1s exceeded");
    }

    #[test]
    fn test_error_display() {
        let err = ScheduleError::InputShape {
            day: 2,
            series: "price".into(),
            expected: 10,
            actual: 9,
        };
        assert_eq!(err.to_string(), "day 2: price has 9 values, expected 10");
    }
}
