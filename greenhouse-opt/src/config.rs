//! TOML-based scenario configuration and preset definitions.

use std::fs;
use std::path::{Path, PathBuf};

use greenhouse_model::greenhouse::{GreenhouseParameters, LampParameters, LampSchedule};
use greenhouse_model::system::{ConventionalParameters, FutureParameters};
use greenhouse_model::technology::{HeatPumpParameters, RotorParameters, TurbineCostInputs};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level scenario configuration parsed from TOML.
///
/// Every section falls back to its defaults, so an empty file describes the
/// baseline scenario. Load with [`ScenarioConfig::from_toml_file`] or start
/// from one of the presets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScenarioConfig {
    /// Input and output files, year and horizon.
    pub data: DataConfig,
    pub greenhouse: GreenhouseParameters,
    pub lamps: LampParameters,
    pub lamp_schedule: LampSchedule,
    pub heat_pump: HeatPumpParameters,
    pub conventional: ConventionalParameters,
    pub future: FutureParameters,
    pub rotor: RotorParameters,
    pub turbine_cost: TurbineCostInputs,
}

/// File locations of the raw data and the derived series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    /// Directory that relative paths below are resolved against.
    pub base_dir: PathBuf,
    /// Year the series are restricted to.
    pub year: i32,
    /// Optimize only the first `horizon_hours` snapshots.
    pub horizon_hours: Option<usize>,
    /// Hourly DWD air temperature.
    pub temperature: PathBuf,
    /// Hourly DWD irradiance of the main station.
    pub solar_primary: PathBuf,
    /// Hourly DWD irradiance used to fill gaps of the main station.
    pub solar_fallback: PathBuf,
    pub sun_times: PathBuf,
    /// Simulated turbine output.
    pub wind_output: PathBuf,
    pub heat_load: PathBuf,
    pub cop: PathBuf,
    pub lamp_demand: PathBuf,
    pub solar_clean: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            year: 2019,
            horizon_hours: None,
            temperature: PathBuf::from("Temperatur Köln.csv"),
            solar_primary: PathBuf::from("Solareinstrahlung_Bochum.csv"),
            solar_fallback: PathBuf::from("Solareinstrahlung_Bremen.csv"),
            sun_times: PathBuf::from("sunrise_sunset_2019.csv"),
            wind_output: PathBuf::from("Windanlage Leistungsdaten.csv"),
            heat_load: PathBuf::from("heizlast_2019.csv"),
            cop: PathBuf::from("heatpump_cop_2019.csv"),
            lamp_demand: PathBuf::from("hourly_lamp_energy_2019.csv"),
            solar_clean: PathBuf::from("Solareinstrahlung_Bochum_Bremen.csv"),
        }
    }
}

impl DataConfig {
    /// Resolves a configured path against `base_dir`.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"data.year"`).
    pub field: String,
    pub message: String,
}

impl ScenarioConfig {
    /// Parameter sets of the stand-alone system studies.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Parameter sets of the system comparison: every component sized by the optimization.
    pub fn comparison() -> Self {
        Self {
            conventional: ConventionalParameters::comparison(),
            future: FutureParameters::comparison(),
            ..Self::default()
        }
    }

    pub const PRESETS: &[&str] = &["baseline", "comparison"];

    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "comparison" => Ok(Self::comparison()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a scenario from a TOML file. Relative data paths are resolved
    /// against the file's directory unless `data.base_dir` is set.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "scenario".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        let mut config = Self::from_toml_str(&content)?;
        if let Some(dir) = path.parent() {
            config.data.base_dir = dir.join(&config.data.base_dir);
        }
        Ok(config)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all sections and returns every problem found.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut check = |field: &str, result: Result<(), greenhouse_model::ParameterError>| {
            if let Err(e) = result {
                errors.push(ConfigError {
                    field: field.to_string(),
                    message: e.to_string(),
                });
            }
        };

        check("greenhouse", self.greenhouse.validate());
        check("lamps", self.lamps.validate());
        check("lamp_schedule", self.lamp_schedule.validate());
        check("heat_pump", self.heat_pump.validate());
        check("conventional", self.conventional.validate());
        check("future", self.future.validate());
        check("rotor", self.rotor.validate());

        if self.data.horizon_hours == Some(0) {
            errors.push(ConfigError {
                field: "data.horizon_hours".into(),
                message: "must be > 0".into(),
            });
        }
        errors
    }
}
