use serde::{Deserialize, Serialize};

use super::{PerRoom, Room};
use crate::error::ScheduleError;

/// One scenario-day: the hourly electricity price and the number of people
/// in each room. Consumed by exactly one optimization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInput {
    /// Zero-based row of the day in the scenario source.
    pub day: usize,
    pub price: Vec<f64>,
    pub occupancy: PerRoom<Vec<f64>>,
}

impl ScenarioInput {
    pub fn new(day: usize, price: Vec<f64>, occupancy_room1: Vec<f64>, occupancy_room2: Vec<f64>) -> Self {
        Self {
            day,
            price,
            occupancy: PerRoom::new(occupancy_room1, occupancy_room2),
        }
    }

    pub fn occupancy(&self, room: Room) -> &[f64] {
        self.occupancy.get(room)
    }

    /// Occupants of both rooms at `slot`; humidity is shared by the rooms.
    pub fn total_occupancy(&self, slot: usize) -> f64 {
        Room::ALL.iter().map(|&room| self.occupancy(room)[slot]).sum()
    }

    /// Every series must cover exactly `horizon` slots.
    pub fn check_shape(&self, horizon: usize) -> Result<(), ScheduleError> {
        let series = [
            ("price", self.price.len()),
            ("occupancy_room1", self.occupancy(Room::One).len()),
            ("occupancy_room2", self.occupancy(Room::Two).len()),
        ];

        match series.iter().find(|(_, len)| *len != horizon) {
            Some((name, actual)) => Err(ScheduleError::InputShape {
                day: self.day,
                series: name.to_string(),
                expected: horizon,
                actual: *actual,
            }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_shape_accepts_matching_series() {
        let scenario = ScenarioInput::new(0, vec![1.0; 4], vec![0.0; 4], vec![2.0; 4]);
        assert!(scenario.check_shape(4).is_ok());
        assert_eq!(scenario.total_occupancy(3), 2.0);
    }

    #[test]
    fn test_check_shape_names_the_offending_series() {
        let scenario = ScenarioInput::new(7, vec![1.0; 4], vec![0.0; 4], vec![2.0; 3]);
        let err = scenario.check_shape(4).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::InputShape {
                day: 7,
                series: "occupancy_room2".into(),
                expected: 4,
                actual: 3,
            }
        );
        assert!(err.to_string().contains("day 7"));
    }
}
