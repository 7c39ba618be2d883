use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

/// Fixed physical and economic constants of the building.
///
/// Built once at start-up and shared read-only (behind an `Arc`) by every
/// day's model. Field names follow the keys of the building configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "validate_parameter_set", skip_on_field_errors = false))]
pub struct ParameterSet {
    /// Number of hourly slots in one day's horizon.
    #[validate(range(min = 1))]
    pub horizon: usize,

    /// Temperature of both rooms at slot 0 (°C), every day.
    pub initial_temperature: f64,
    /// Indoor humidity at slot 0 (%), every day.
    #[validate(range(min = 0.0))]
    pub initial_humidity: f64,

    /// Upper bound of each room heater (kW).
    #[validate(range(min = 0.0))]
    pub heating_max_power: f64,
    /// °C per hour per °C difference between the two rooms.
    pub heat_exchange_coeff: f64,
    /// °C per hour per kW of heating.
    pub heating_efficiency_coeff: f64,
    /// Fraction of the indoor-outdoor difference lost per hour.
    pub thermal_loss_coeff: f64,
    /// °C drop per hour of ventilation.
    pub heat_vent_coeff: f64,
    /// °C gain per hour per occupant.
    pub heat_occupancy_coeff: f64,

    /// Below this the low-temperature overrule forces the heater to full power.
    pub temp_min_comfort_threshold: f64,
    /// The low-temperature overrule releases once the room is back above this.
    pub temp_ok_threshold: f64,
    /// Above this the high-temperature overrule forces the heater off.
    pub temp_max_comfort_threshold: f64,

    /// Outdoor temperature per slot (°C). Left empty in configuration files
    /// to have it generated from the configured outdoor profile.
    #[serde(default)]
    pub outdoor_temperature: Vec<f64>,

    /// Electrical draw of the ventilation when on (kW).
    #[validate(range(min = 0.0))]
    pub ventilation_power: f64,
    /// Above this humidity (%) the ventilation is forced on.
    pub humidity_threshold: f64,
    /// % humidity gain per hour per occupant.
    pub humidity_occupancy_coeff: f64,
    /// % humidity drop per hour of ventilation.
    pub humidity_vent_coeff: f64,
    /// Consecutive hours the ventilation stays on once started.
    #[validate(range(min = 1))]
    pub vent_min_up_time: usize,
}

impl Default for ParameterSet {
    fn default() -> Self {
        let horizon = 10;
        Self {
            horizon,
            initial_temperature: 21.0,
            initial_humidity: 40.0,
            heating_max_power: 3.0,
            heat_exchange_coeff: 0.6,
            heating_efficiency_coeff: 1.0,
            thermal_loss_coeff: 0.1,
            heat_vent_coeff: 0.7,
            heat_occupancy_coeff: 0.02,
            temp_min_comfort_threshold: 18.0,
            temp_ok_threshold: 22.0,
            temp_max_comfort_threshold: 26.0,
            outdoor_temperature: OutdoorProfile::default().series(horizon),
            ventilation_power: 2.0,
            humidity_threshold: 70.0,
            humidity_occupancy_coeff: 0.18,
            humidity_vent_coeff: 15.0,
            vent_min_up_time: 3,
        }
    }
}

impl ParameterSet {
    pub fn outdoor(&self, slot: usize) -> f64 {
        self.outdoor_temperature[slot]
    }
}

fn validate_parameter_set(params: &ParameterSet) -> Result<(), ValidationError> {
    if !(params.temp_min_comfort_threshold < params.temp_ok_threshold
        && params.temp_ok_threshold < params.temp_max_comfort_threshold)
    {
        let mut err = ValidationError::new("temperature_thresholds");
        err.message = Some(Cow::from(format!(
            "expected low < ok < high, got {} / {} / {}",
            params.temp_min_comfort_threshold,
            params.temp_ok_threshold,
            params.temp_max_comfort_threshold
        )));
        return Err(err);
    }

    if params.outdoor_temperature.len() != params.horizon {
        let mut err = ValidationError::new("outdoor_temperature_length");
        err.message = Some(Cow::from(format!(
            "outdoor temperature has {} values, horizon is {}",
            params.outdoor_temperature.len(),
            params.horizon
        )));
        return Err(err);
    }

    Ok(())
}

/// Sinusoidal daily outdoor temperature, coldest at slot 0:
/// `mean + amplitude * sin(2πt/H − π/2)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutdoorProfile {
    pub mean: f64,
    pub amplitude: f64,
}

impl Default for OutdoorProfile {
    fn default() -> Self {
        Self {
            mean: 0.0,
            amplitude: 3.0,
        }
    }
}

impl OutdoorProfile {
    pub fn series(&self, horizon: usize) -> Vec<f64> {
        let h = horizon as f64;
        (0..horizon)
            .map(|t| {
                let phase = 2.0 * std::f64::consts::PI * t as f64 / h - std::f64::consts::FRAC_PI_2;
                self.mean + self.amplitude * phase.sin()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_parameters_are_valid() {
        let params = ParameterSet::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.outdoor_temperature.len(), 10);
    }

    #[test]
    fn test_outdoor_profile_shape() {
        let series = OutdoorProfile::default().series(10);
        assert!((series[0] + 3.0).abs() < 1e-12, "coldest at slot 0");
        assert!((series[5] - 3.0).abs() < 1e-12, "warmest at mid-horizon");
    }

    #[test]
    fn test_rejects_unordered_thresholds() {
        let params = ParameterSet {
            temp_ok_threshold: 17.0,
            ..Default::default()
        };
        let errors = params.validate().unwrap_err();
        assert!(errors.to_string().contains("low < ok < high"));
    }

    #[test]
    fn test_rejects_outdoor_length_mismatch() {
        let params = ParameterSet {
            horizon: 12,
            ..Default::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_horizon_and_min_up_time() {
        let params = ParameterSet {
            horizon: 0,
            outdoor_temperature: vec![],
            vent_min_up_time: 0,
            ..Default::default()
        };
        let errors = params.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("horizon"));
        assert!(fields.contains_key("vent_min_up_time"));
    }
}
