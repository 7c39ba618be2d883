#![allow(dead_code)]

use hvac_planner::domain::{DayResult, ParameterSet, ScenarioInput};
use hvac_planner::optimizer::MilpScheduler;

pub const TOL: f64 = 1e-6;

/// Default building with a flat outdoor temperature.
pub fn params_with_outdoor(outdoor: f64) -> ParameterSet {
    let params = ParameterSet::default();
    ParameterSet {
        outdoor_temperature: vec![outdoor; params.horizon],
        ..params
    }
}

pub fn price_curve() -> Vec<f64> {
    vec![0.8, 0.6, 0.5, 0.7, 1.2, 1.6, 1.9, 1.4, 1.0, 0.9]
}

pub fn empty_building(day: usize) -> ScenarioInput {
    ScenarioInput::new(day, price_curve(), vec![0.0; 10], vec![0.0; 10])
}

/// Both rooms fill up with `people` occupants during `slot`.
pub fn occupancy_spike(day: usize, slot: usize, people: f64) -> ScenarioInput {
    let mut occ = vec![0.0; 10];
    occ[slot] = people;
    ScenarioInput::new(day, vec![1.0; 10], occ.clone(), occ)
}

/// An office-like day: people in room 1 in the morning, room 2 after noon.
pub fn office_day(day: usize) -> ScenarioInput {
    ScenarioInput::new(
        day,
        price_curve(),
        vec![0.0, 4.0, 12.0, 20.0, 20.0, 8.0, 0.0, 0.0, 2.0, 0.0],
        vec![0.0, 0.0, 2.0, 6.0, 30.0, 40.0, 35.0, 10.0, 0.0, 0.0],
    )
}

pub fn solve(params: &ParameterSet, scenario: &ScenarioInput) -> DayResult {
    MilpScheduler::default()
        .solve_day(params, scenario)
        .expect("day should solve")
}
