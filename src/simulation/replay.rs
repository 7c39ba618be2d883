//! Forward replay of a solved day.
//!
//! Re-applies the building dynamics to the solved controls and runs each
//! overrule controller as an explicit two-state machine over the solved
//! trajectory. Anything the solver returned that the physical plant or the
//! controllers would not have produced is reported as a [`Violation`].

use thiserror::Error;

use crate::domain::{
    DayResult, HysteresisBand, OverruleKind, OverruleState, ParameterSet, Room, ScenarioInput,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Violation {
    #[error("slot 0: {quantity} is {actual}, initial value is {expected}")]
    InitialCondition {
        quantity: String,
        expected: f64,
        actual: f64,
    },

    #[error("slot {hour}: {quantity} is {actual}, dynamics give {expected}")]
    Dynamics {
        hour: usize,
        quantity: String,
        expected: f64,
        actual: f64,
    },

    #[error("slot {hour}: {kind} overrule should be active{}", room_suffix(.room))]
    MissingActivation {
        hour: usize,
        kind: OverruleKind,
        room: Option<Room>,
    },

    #[error("slot {hour}: {kind} overrule should be inactive{}", room_suffix(.room))]
    StuckActive {
        hour: usize,
        kind: OverruleKind,
        room: Option<Room>,
    },

    #[error("slot {hour}: {kind} overrule is active but its action is not applied{}", room_suffix(.room))]
    ForcingIgnored {
        hour: usize,
        kind: OverruleKind,
        room: Option<Room>,
    },

    #[error("slot {hour}: low and high temperature overrules both active in {room}")]
    ConflictingOverrules { hour: usize, room: Room },

    #[error("slot {hour}: ventilation switched off before its minimum up-time")]
    MinimumUpTime { hour: usize },
}

fn room_suffix(room: &Option<Room>) -> String {
    room.map(|r| format!(" in {r}")).unwrap_or_default()
}

/// Replays solved days against the building model.
#[derive(Debug, Clone, Copy)]
pub struct ReplayVerifier {
    /// Hold tolerance the model was built with.
    pub epsilon: f64,
    /// Absolute slack for solver round-off.
    pub tolerance: f64,
}

impl Default for ReplayVerifier {
    fn default() -> Self {
        Self {
            epsilon: 0.01,
            tolerance: 1e-6,
        }
    }
}

impl ReplayVerifier {
    pub fn new(epsilon: f64, tolerance: f64) -> Self {
        Self { epsilon, tolerance }
    }

    pub fn verify(
        &self,
        params: &ParameterSet,
        scenario: &ScenarioInput,
        result: &DayResult,
    ) -> Vec<Violation> {
        let mut violations = Vec::new();
        self.check_initial_conditions(params, result, &mut violations);
        self.check_dynamics(params, scenario, result, &mut violations);
        self.check_overrules(params, result, &mut violations);
        check_minimum_up_time(params, result, &mut violations);
        violations
    }

    fn close(&self, expected: f64, actual: f64) -> bool {
        (expected - actual).abs() <= self.tolerance * expected.abs().max(1.0)
    }

    fn check_initial_conditions(&self, params: &ParameterSet, result: &DayResult, out: &mut Vec<Violation>) {
        let Some(first) = result.hours.first() else {
            return;
        };
        for room in Room::ALL {
            if !self.close(params.initial_temperature, first.temperature[room]) {
                out.push(Violation::InitialCondition {
                    quantity: format!("temperature of {room}"),
                    expected: params.initial_temperature,
                    actual: first.temperature[room],
                });
            }
        }
        if !self.close(params.initial_humidity, first.humidity) {
            out.push(Violation::InitialCondition {
                quantity: "humidity".into(),
                expected: params.initial_humidity,
                actual: first.humidity,
            });
        }
    }

    fn check_dynamics(
        &self,
        params: &ParameterSet,
        scenario: &ScenarioInput,
        result: &DayResult,
        out: &mut Vec<Violation>,
    ) {
        for (t, pair) in result.hours.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            let hour = t + 1;

            for room in Room::ALL {
                let expected = prev.temperature[room]
                    + params.heating_efficiency_coeff * prev.heater_power[room]
                    - params.thermal_loss_coeff * (prev.temperature[room] - params.outdoor(t))
                    + params.heat_exchange_coeff
                        * (prev.temperature[room.other()] - prev.temperature[room])
                    - params.heat_vent_coeff * prev.ventilation
                    + params.heat_occupancy_coeff * scenario.occupancy(room)[t];
                if !self.close(expected, next.temperature[room]) {
                    out.push(Violation::Dynamics {
                        hour,
                        quantity: format!("temperature of {room}"),
                        expected,
                        actual: next.temperature[room],
                    });
                }
            }

            let expected = prev.humidity
                + params.humidity_occupancy_coeff * scenario.total_occupancy(t)
                - params.humidity_vent_coeff * prev.ventilation;
            if !self.close(expected, next.humidity) {
                out.push(Violation::Dynamics {
                    hour,
                    quantity: "humidity".into(),
                    expected,
                    actual: next.humidity,
                });
            }
        }
    }

    fn check_overrules(&self, params: &ParameterSet, result: &DayResult, out: &mut Vec<Violation>) {
        let low = HysteresisBand::low_temperature(params);
        let high = HysteresisBand::high_temperature(params);
        let humid = HysteresisBand::humidity(params);

        for room in Room::ALL {
            let temp = result.temperature(room);
            let low_flags: Vec<bool> = result.hours.iter().map(|h| h.overrule.low_temperature[room]).collect();
            let high_flags: Vec<bool> = result.hours.iter().map(|h| h.overrule.high_temperature[room]).collect();
            self.check_band(&low, &temp, &low_flags, Some(room), out);
            self.check_band(&high, &temp, &high_flags, Some(room), out);

            for (hour, h) in result.hours.iter().enumerate() {
                let p = h.heater_power[room];
                if h.overrule.low_temperature[room] && h.overrule.high_temperature[room] {
                    out.push(Violation::ConflictingOverrules { hour, room });
                }
                if h.overrule.low_temperature[room] && p < params.heating_max_power - self.tolerance {
                    out.push(Violation::ForcingIgnored {
                        hour,
                        kind: OverruleKind::LowTemperature,
                        room: Some(room),
                    });
                }
                if h.overrule.high_temperature[room] && p > self.tolerance {
                    out.push(Violation::ForcingIgnored {
                        hour,
                        kind: OverruleKind::HighTemperature,
                        room: Some(room),
                    });
                }
            }
        }

        let hum_flags: Vec<bool> = result.hours.iter().map(|h| h.overrule.humidity).collect();
        self.check_band(&humid, &result.humidity(), &hum_flags, None, out);
        for (hour, h) in result.hours.iter().enumerate() {
            if h.overrule.humidity && !h.ventilation_on() {
                out.push(Violation::ForcingIgnored {
                    hour,
                    kind: OverruleKind::Humidity,
                    room: None,
                });
            }
        }
    }

    /// Step the controller's state machine from each solved flag and compare
    /// the least-active successor with the next solved flag.
    fn check_band(
        &self,
        band: &HysteresisBand,
        signal: &[f64],
        flags: &[bool],
        room: Option<Room>,
        out: &mut Vec<Violation>,
    ) {
        if flags.first() == Some(&true) {
            out.push(Violation::StuckActive {
                hour: 0,
                kind: band.kind,
                room,
            });
        }

        for t in 1..flags.len() {
            let prev = OverruleState::from_flag(flags[t - 1]);
            let x = signal[t];
            let required = prev.next(band, x, self.epsilon, self.tolerance).is_active();

            if required && !flags[t] {
                out.push(Violation::MissingActivation {
                    hour: t,
                    kind: band.kind,
                    room,
                });
            }
            if flags[t] && OverruleState::must_release(band, x, self.epsilon, self.tolerance) {
                out.push(Violation::StuckActive {
                    hour: t,
                    kind: band.kind,
                    room,
                });
            }
        }
    }
}

/// Replay `result` with the default hold tolerance of the model.
pub fn verify_day(
    params: &ParameterSet,
    scenario: &ScenarioInput,
    result: &DayResult,
    tolerance: f64,
) -> Vec<Violation> {
    ReplayVerifier {
        tolerance,
        ..Default::default()
    }
    .verify(params, scenario, result)
}

fn check_minimum_up_time(params: &ParameterSet, result: &DayResult, out: &mut Vec<Violation>) {
    let on = result.ventilation();
    let min_up = params.vent_min_up_time;

    for t in 1..on.len() {
        let falling = on[t - 1] && !on[t];
        if !falling {
            continue;
        }
        if t < min_up || !on[t - min_up..t].iter().all(|&v| v) {
            out.push(Violation::MinimumUpTime { hour: t });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HourRecord, OverruleFlags, PerRoom};

    /// Trajectory of a building left alone: no heat, no ventilation, nobody in.
    fn idle_day(params: &ParameterSet) -> (ScenarioInput, DayResult) {
        let h = params.horizon;
        let scenario = ScenarioInput::new(0, vec![1.0; h], vec![0.0; h], vec![0.0; h]);
        let mut temp = params.initial_temperature;
        let hours = (0..h)
            .map(|t| {
                let record = HourRecord {
                    hour: t,
                    price: 1.0,
                    occupancy: PerRoom::new(0.0, 0.0),
                    temperature: PerRoom::new(temp, temp),
                    heater_power: PerRoom::new(0.0, 0.0),
                    ventilation: 0.0,
                    humidity: params.initial_humidity,
                    overrule: OverruleFlags::default(),
                };
                temp -= params.thermal_loss_coeff * (temp - params.outdoor(t));
                record
            })
            .collect();
        let result = DayResult {
            day: 0,
            total_cost: 0.0,
            big_m: 100.0,
            hours,
        };
        (scenario, result)
    }

    fn warm_params() -> ParameterSet {
        ParameterSet {
            outdoor_temperature: vec![21.0; 10],
            ..Default::default()
        }
    }

    #[test]
    fn test_consistent_day_has_no_violations() {
        let params = warm_params();
        let (scenario, result) = idle_day(&params);
        assert!(ReplayVerifier::default().verify(&params, &scenario, &result).is_empty());
    }

    #[test]
    fn test_detects_tampered_temperature() {
        let params = warm_params();
        let (scenario, mut result) = idle_day(&params);
        result.hours[4].temperature.0[1] += 0.5;

        let violations = ReplayVerifier::default().verify(&params, &scenario, &result);
        assert!(violations.iter().any(|v| matches!(v, Violation::Dynamics { hour: 4, .. })));
    }

    #[test]
    fn test_detects_missing_low_temperature_activation() {
        let params = ParameterSet {
            outdoor_temperature: vec![-40.0; 10],
            ..Default::default()
        };
        let (scenario, result) = idle_day(&params);

        let violations = ReplayVerifier::default().verify(&params, &scenario, &result);
        assert!(violations.contains(&Violation::MissingActivation {
            hour: 1,
            kind: OverruleKind::LowTemperature,
            room: Some(Room::One),
        }));
    }

    #[test]
    fn test_detects_short_ventilation_run() {
        let params = warm_params();
        let (scenario, mut result) = idle_day(&params);
        result.hours[4].ventilation = 1.0;
        result.hours[5].ventilation = 1.0;

        let mut out = Vec::new();
        check_minimum_up_time(&params, &result, &mut out);
        assert_eq!(out, vec![Violation::MinimumUpTime { hour: 6 }]);

        // the replay also sees the cooling and drying that never happened
        assert!(ReplayVerifier::default().verify(&params, &scenario, &result).len() > 1);
    }

    #[test]
    fn test_detects_conflicting_and_unapplied_overrules() {
        let params = warm_params();
        let (scenario, mut result) = idle_day(&params);
        result.hours[3].overrule.low_temperature = PerRoom::new(true, false);
        result.hours[3].overrule.high_temperature = PerRoom::new(true, false);

        let violations = ReplayVerifier::default().verify(&params, &scenario, &result);
        assert!(violations.contains(&Violation::ConflictingOverrules { hour: 3, room: Room::One }));
        assert!(violations.contains(&Violation::ForcingIgnored {
            hour: 3,
            kind: OverruleKind::LowTemperature,
            room: Some(Room::One),
        }));
    }

    #[test]
    fn test_violation_display() {
        let v = Violation::MissingActivation {
            hour: 2,
            kind: OverruleKind::Humidity,
            room: None,
        };
        assert_eq!(v.to_string(), "slot 2: humidity overrule should be active");
    }
}
