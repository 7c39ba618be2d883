use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{PerRoom, Room};
use crate::error::ScheduleError;

/// Activation of the overrule controllers at one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OverruleFlags {
    pub low_temperature: PerRoom<bool>,
    pub high_temperature: PerRoom<bool>,
    pub humidity: bool,
}

/// Solved values of one hourly slot, as returned by the solver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourRecord {
    pub hour: usize,
    pub price: f64,
    pub occupancy: PerRoom<f64>,
    pub temperature: PerRoom<f64>,
    pub heater_power: PerRoom<f64>,
    pub ventilation: f64,
    pub humidity: f64,
    pub overrule: OverruleFlags,
}

impl HourRecord {
    pub fn ventilation_on(&self) -> bool {
        self.ventilation > 0.5
    }
}

/// Optimal schedule of one scenario-day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayResult {
    pub day: usize,
    pub total_cost: f64,
    /// Big-M constant the day's model was built with.
    pub big_m: f64,
    pub hours: Vec<HourRecord>,
}

impl DayResult {
    pub fn temperature(&self, room: Room) -> Vec<f64> {
        self.hours.iter().map(|h| h.temperature[room]).collect()
    }

    pub fn heater_power(&self, room: Room) -> Vec<f64> {
        self.hours.iter().map(|h| h.heater_power[room]).collect()
    }

    pub fn ventilation(&self) -> Vec<bool> {
        self.hours.iter().map(HourRecord::ventilation_on).collect()
    }

    pub fn humidity(&self) -> Vec<f64> {
        self.hours.iter().map(|h| h.humidity).collect()
    }

    pub fn ventilation_hours(&self) -> usize {
        self.hours.iter().filter(|h| h.ventilation_on()).count()
    }
}

/// Per-day outcomes of a batch, ordered by day index.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub days: BTreeMap<usize, Result<DayResult, ScheduleError>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub days: usize,
    pub solved: usize,
    pub failed: Vec<FailedDay>,
    pub total_cost: f64,
    /// Mean cost over the solved days; `None` when no day solved.
    pub average_cost: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedDay {
    pub day: usize,
    pub kind: &'static str,
    pub error: String,
}

impl BatchReport {
    pub fn solved(&self) -> impl Iterator<Item = &DayResult> {
        self.days.values().filter_map(|r| r.as_ref().ok())
    }

    pub fn summary(&self) -> BatchSummary {
        let costs: Vec<f64> = self.solved().map(|d| d.total_cost).collect();
        let total_cost: f64 = costs.iter().sum();
        let failed = self
            .days
            .iter()
            .filter_map(|(&day, result)| {
                result.as_ref().err().map(|e| FailedDay {
                    day,
                    kind: e.kind(),
                    error: e.to_string(),
                })
            })
            .collect();

        BatchSummary {
            days: self.days.len(),
            solved: costs.len(),
            failed,
            total_cost,
            average_cost: (!costs.is_empty()).then(|| total_cost / costs.len() as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(day: usize, cost: f64) -> DayResult {
        DayResult {
            day,
            total_cost: cost,
            big_m: 100.0,
            hours: vec![],
        }
    }

    #[test]
    fn test_summary_skips_failed_days() {
        let mut report = BatchReport::default();
        report.days.insert(0, Ok(day(0, 4.0)));
        report.days.insert(2, Ok(day(2, 2.0)));
        report.days.insert(1, Err(ScheduleError::Infeasible { day: 1 }));

        let summary = report.summary();
        assert_eq!(summary.days, 3);
        assert_eq!(summary.solved, 2);
        assert_eq!(summary.total_cost, 6.0);
        assert_eq!(summary.average_cost, Some(3.0));
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].day, 1);
        assert_eq!(summary.failed[0].kind, "infeasible");
    }

    #[test]
    fn test_summary_of_all_failed_batch_has_no_average() {
        let mut report = BatchReport::default();
        report.days.insert(
            0,
            Err(ScheduleError::SolverFailure {
                day: 0,
                reason: "boom".into(),
            }),
        );
        let summary = report.summary();
        assert_eq!(summary.solved, 0);
        assert_eq!(summary.average_cost, None);
        assert_eq!(summary.total_cost, 0.0);
    }
}
