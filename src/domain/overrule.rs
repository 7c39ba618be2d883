//! Overrule (safety) controllers.
//!
//! Each controller watches one continuous signal (a room temperature or the
//! humidity) and, while active, overrides the scheduled control action. The
//! same [`HysteresisBand`] drives both the big-M encoding in the optimizer and
//! the explicit state machine used to replay solved days.

use serde::{Deserialize, Serialize};

use super::ParameterSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum OverruleKind {
    /// Room too cold: heater forced to full power.
    LowTemperature,
    /// Room too warm: heater forced off.
    HighTemperature,
    /// Air too humid: ventilation forced on.
    Humidity,
}

/// Which side of the trip threshold is unsafe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnsafeSide {
    Below,
    Above,
}

impl UnsafeSide {
    fn sign(self) -> f64 {
        match self {
            UnsafeSide::Below => -1.0,
            UnsafeSide::Above => 1.0,
        }
    }
}

/// Trip and release thresholds of one controller.
///
/// With `memory`, an active controller stays active until the signal has
/// crossed `release` by more than the model tolerance; without it the
/// controller follows the release threshold directly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HysteresisBand {
    pub kind: OverruleKind,
    pub side: UnsafeSide,
    pub trip: f64,
    pub release: f64,
    pub memory: bool,
}

impl HysteresisBand {
    pub fn low_temperature(params: &ParameterSet) -> Self {
        Self {
            kind: OverruleKind::LowTemperature,
            side: UnsafeSide::Below,
            trip: params.temp_min_comfort_threshold,
            release: params.temp_ok_threshold,
            memory: true,
        }
    }

    pub fn high_temperature(params: &ParameterSet) -> Self {
        Self {
            kind: OverruleKind::HighTemperature,
            side: UnsafeSide::Above,
            trip: params.temp_max_comfort_threshold,
            release: params.temp_max_comfort_threshold,
            memory: false,
        }
    }

    pub fn humidity(params: &ParameterSet) -> Self {
        Self {
            kind: OverruleKind::Humidity,
            side: UnsafeSide::Above,
            trip: params.humidity_threshold,
            release: params.humidity_threshold,
            memory: false,
        }
    }

    /// +1 / −1 factor turning `x − threshold` into "distance into the unsafe side".
    pub fn sign(&self) -> f64 {
        self.side.sign()
    }

    /// Positive exactly when the signal is on the unsafe side of `trip`.
    pub fn trigger(&self, x: f64) -> f64 {
        self.sign() * (x - self.trip)
    }

    /// Positive while the signal has not yet got back past `release`.
    pub fn hold_gap(&self, x: f64) -> f64 {
        self.sign() * (x - self.release)
    }

    /// Positive exactly when the signal is safely past `release`.
    pub fn release_margin(&self, x: f64) -> f64 {
        -self.hold_gap(x)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverruleState {
    #[default]
    Inactive,
    Active,
}

impl OverruleState {
    pub fn from_flag(active: bool) -> Self {
        if active {
            Self::Active
        } else {
            Self::Inactive
        }
    }

    pub fn is_active(self) -> bool {
        self == Self::Active
    }

    /// Least-active successor state for signal value `x`.
    ///
    /// `epsilon` is the hold tolerance of memory bands and `tolerance` absorbs
    /// solver round-off when `x` sits on a threshold.
    pub fn next(self, band: &HysteresisBand, x: f64, epsilon: f64, tolerance: f64) -> Self {
        let tripped = band.trigger(x) > tolerance;
        let held = band.memory && self.is_active() && band.hold_gap(x) + epsilon > tolerance;
        Self::from_flag(tripped || held)
    }

    /// Whether the controller is required to be inactive at `x`.
    pub fn must_release(band: &HysteresisBand, x: f64, epsilon: f64, tolerance: f64) -> bool {
        let shift = if band.memory { epsilon } else { 0.0 };
        band.release_margin(x) - shift > tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 0.01;
    const TOL: f64 = 1e-9;

    fn run(band: &HysteresisBand, signal: &[f64]) -> Vec<bool> {
        let mut state = OverruleState::Inactive;
        signal
            .iter()
            .map(|&x| {
                state = state.next(band, x, EPS, TOL);
                state.is_active()
            })
            .collect()
    }

    #[test]
    fn test_low_temperature_band_holds_until_ok() {
        let band = HysteresisBand::low_temperature(&ParameterSet::default());
        let active = run(&band, &[21.0, 17.5, 19.0, 22.0, 22.5, 20.0]);
        assert_eq!(active, vec![false, true, true, true, false, false]);
    }

    #[test]
    fn test_high_temperature_band_is_stateless() {
        let band = HysteresisBand::high_temperature(&ParameterSet::default());
        let active = run(&band, &[25.0, 26.5, 25.9, 27.0]);
        assert_eq!(active, vec![false, true, false, true]);
    }

    #[test]
    fn test_release_is_shifted_by_epsilon_for_memory_bands() {
        let params = ParameterSet::default();
        let low = HysteresisBand::low_temperature(&params);
        assert!(!OverruleState::must_release(&low, 22.005, EPS, TOL));
        assert!(OverruleState::must_release(&low, 22.02, EPS, TOL));

        let humidity = HysteresisBand::humidity(&params);
        assert!(OverruleState::must_release(&humidity, 69.0, EPS, TOL));
        assert!(!OverruleState::must_release(&humidity, 70.0, EPS, TOL));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(OverruleKind::LowTemperature.to_string(), "low_temperature");
    }
}
