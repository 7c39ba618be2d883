use anyhow::{Context, Result};
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use validator::Validate;

use crate::domain::{OutdoorProfile, ParameterSet};
use crate::error::ConfigError;
use crate::optimizer::{BigM, ModelSettings};

pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub building: ParameterSet,
    /// Used when `building.outdoor_temperature` is left empty.
    pub outdoor: OutdoorProfile,
    pub solver: SolverConfig,
    pub batch: BatchConfig,
    pub data: DataConfig,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // expanded from `outdoor` for whatever horizon ends up configured
            building: ParameterSet {
                outdoor_temperature: Vec::new(),
                ..Default::default()
            },
            outdoor: OutdoorProfile::default(),
            solver: SolverConfig::default(),
            batch: BatchConfig::default(),
            data: DataConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Fixed big-M; derived per day when unset.
    pub big_m: Option<f64>,
    pub epsilon: f64,
    pub time_limit_seconds: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            big_m: None,
            epsilon: 0.01,
            time_limit_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Concurrent solves; the number of CPUs when unset.
    pub workers: Option<usize>,
    /// Replay every solved day and log disagreements.
    pub verify: bool,
    pub verify_tolerance: f64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            workers: None,
            verify: true,
            verify_tolerance: 1e-6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub prices: PathBuf,
    pub occupancy_room1: PathBuf,
    pub occupancy_room2: PathBuf,
    /// Leading non-hourly columns in the scenario files.
    pub index_columns: usize,
    pub output_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            prices: "data/PriceData.csv".into(),
            occupancy_room1: "data/OccupancyRoom1.csv".into(),
            occupancy_room2: "data/OccupancyRoom2.csv".into(),
            index_columns: 0,
            output_dir: "results".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
    /// `EnvFilter` directives, overridden by `RUST_LOG`.
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            json: false,
            filter: "info".into(),
        }
    }
}

impl Config {
    /// The TOML file (if present) over the defaults, then `HVAC__`
    /// environment variables with `__` separating nested keys.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("HVAC__").split("__"));
        figment
            .extract()
            .with_context(|| format!("Failed to load configuration ({})", path.display()))
    }

    /// Validated building parameters, with the outdoor series expanded from
    /// the profile when not given explicitly.
    pub fn parameter_set(&self) -> Result<ParameterSet, ConfigError> {
        let mut params = self.building.clone();
        if params.outdoor_temperature.is_empty() {
            params.outdoor_temperature = self.outdoor.series(params.horizon);
        }
        params.validate()?;
        Ok(params)
    }

    pub fn model_settings(&self) -> Result<ModelSettings, ConfigError> {
        let settings = ModelSettings {
            big_m: self.solver.big_m.map_or(BigM::Derived, BigM::Fixed),
            epsilon: self.solver.epsilon,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn time_limit(&self) -> Duration {
        Duration::from_secs(self.solver.time_limit_seconds.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_defaults_without_file() {
        Jail::expect_with(|_jail| {
            let cfg = Config::load_from("missing.toml").unwrap();
            let params = cfg.parameter_set().unwrap();
            assert_eq!(params, ParameterSet::default());
            assert_eq!(cfg.model_settings().unwrap(), ModelSettings::default());
            assert!(cfg.batch.verify);
            Ok(())
        });
    }

    #[test]
    fn test_file_and_env_layers() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "hvac.toml",
                r#"
                [building]
                horizon = 4
                heating_max_power = 5.0

                [outdoor]
                mean = 10.0
                amplitude = 0.0

                [solver]
                big_m = 250.0
                "#,
            )?;
            jail.set_env("HVAC__BATCH__WORKERS", "3");
            jail.set_env("HVAC__BUILDING__INITIAL_TEMPERATURE", "19.5");

            let cfg = Config::load_from("hvac.toml").unwrap();
            let params = cfg.parameter_set().unwrap();
            assert_eq!(params.horizon, 4);
            assert_eq!(params.heating_max_power, 5.0);
            assert_eq!(params.initial_temperature, 19.5);
            assert_eq!(params.outdoor_temperature, vec![10.0; 4]);
            // untouched keys keep their defaults
            assert_eq!(params.humidity_threshold, 70.0);
            assert_eq!(cfg.batch.workers, Some(3));
            assert_eq!(cfg.model_settings().unwrap().big_m, BigM::Fixed(250.0));
            Ok(())
        });
    }

    #[test]
    fn test_invalid_thresholds_are_rejected() {
        let mut cfg = Config::default();
        cfg.building.temp_ok_threshold = 30.0;
        assert!(matches!(
            cfg.parameter_set(),
            Err(ConfigError::InvalidParameters(_))
        ));
    }

    #[test]
    fn test_explicit_outdoor_series_must_match_horizon() {
        let mut cfg = Config::default();
        cfg.building.outdoor_temperature = vec![0.0; 3];
        assert!(cfg.parameter_set().is_err());
    }

    #[test]
    fn test_invalid_solver_settings() {
        let mut cfg = Config::default();
        cfg.solver.epsilon = 0.0;
        assert!(matches!(
            cfg.model_settings(),
            Err(ConfigError::InvalidSolverSettings(_))
        ));
    }
}
