//! Interval bounds of the model's state variables.
//!
//! Propagates `[lo, hi]` through the temperature and humidity dynamics with
//! the heater anywhere in `[0, Pmax]` and the ventilation anywhere in
//! `[0, 1]`. Every feasible trajectory stays inside these intervals, so the
//! largest threshold gap over them is a safe big-M.

use crate::domain::{ParameterSet, PerRoom, Room, ScenarioInput};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub lo: f64,
    pub hi: f64,
}

impl Interval {
    pub fn point(x: f64) -> Self {
        Self { lo: x, hi: x }
    }

    pub fn new(lo: f64, hi: f64) -> Self {
        Self { lo, hi }
    }

    fn scale(self, k: f64) -> Self {
        if k >= 0.0 {
            Self::new(k * self.lo, k * self.hi)
        } else {
            Self::new(k * self.hi, k * self.lo)
        }
    }

    fn shift(self, c: f64) -> Self {
        Self::new(self.lo + c, self.hi + c)
    }

    fn add(self, other: Self) -> Self {
        Self::new(self.lo + other.lo, self.hi + other.hi)
    }

    pub fn contains(&self, x: f64, tolerance: f64) -> bool {
        x >= self.lo - tolerance && x <= self.hi + tolerance
    }

    /// Largest `|x − threshold|` over the interval.
    pub fn max_gap(&self, threshold: f64) -> f64 {
        (self.lo - threshold).abs().max((self.hi - threshold).abs())
    }
}

#[derive(Debug, Clone)]
pub struct StateBounds {
    pub temperature: PerRoom<Vec<Interval>>,
    pub humidity: Vec<Interval>,
}

impl StateBounds {
    pub fn propagate(params: &ParameterSet, scenario: &ScenarioInput) -> Self {
        let h = params.horizon;
        let mut temperature = PerRoom::new(Vec::with_capacity(h), Vec::with_capacity(h));
        let mut humidity = Vec::with_capacity(h);

        for room in Room::ALL {
            temperature.get_mut(room).push(Interval::point(params.initial_temperature));
        }
        humidity.push(Interval::point(params.initial_humidity));

        let heater = Interval::new(0.0, params.heating_max_power);
        let vent = Interval::new(0.0, 1.0);
        let keep = 1.0 - params.thermal_loss_coeff - params.heat_exchange_coeff;

        for t in 1..h {
            let prev = PerRoom::new(temperature[Room::One][t - 1], temperature[Room::Two][t - 1]);
            for room in Room::ALL {
                let next = prev[room]
                    .scale(keep)
                    .add(prev[room.other()].scale(params.heat_exchange_coeff))
                    .add(heater.scale(params.heating_efficiency_coeff))
                    .add(vent.scale(-params.heat_vent_coeff))
                    .shift(
                        params.thermal_loss_coeff * params.outdoor(t - 1)
                            + params.heat_occupancy_coeff * scenario.occupancy(room)[t - 1],
                    );
                temperature.get_mut(room).push(next);
            }

            let next = humidity[t - 1]
                .add(vent.scale(-params.humidity_vent_coeff))
                .shift(params.humidity_occupancy_coeff * scenario.total_occupancy(t - 1));
            humidity.push(Interval::new(next.lo.max(0.0), next.hi.max(0.0)));
        }

        Self { temperature, humidity }
    }

    /// Largest gap between any bounded state and any threshold it is compared to.
    pub fn max_threshold_gap(&self, params: &ParameterSet) -> f64 {
        let temp_thresholds = [
            params.temp_min_comfort_threshold,
            params.temp_ok_threshold,
            params.temp_max_comfort_threshold,
        ];
        let temp_gap = Room::ALL
            .iter()
            .flat_map(|&room| self.temperature[room].iter())
            .flat_map(|iv| temp_thresholds.iter().map(move |&th| iv.max_gap(th)))
            .fold(0.0_f64, f64::max);
        let hum_gap = self
            .humidity
            .iter()
            .map(|iv| iv.max_gap(params.humidity_threshold))
            .fold(0.0_f64, f64::max);
        temp_gap.max(hum_gap)
    }
}

/// Smallest safe big-M for one day, with a unit margin on top of `epsilon`.
pub fn derive_big_m(params: &ParameterSet, scenario: &ScenarioInput, epsilon: f64) -> f64 {
    StateBounds::propagate(params, scenario).max_threshold_gap(params) + epsilon + 1.0
}
