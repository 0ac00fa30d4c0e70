//! Greenhouse energy systems built on top of the network model.

pub mod comparison;
pub mod conventional;
pub mod future;

use chrono::NaiveDateTime;
use greenhouse_model::ParameterError;

use crate::error::{DataError, NetworkError};
use crate::general::timeseries::{HourlySeries, align};

pub const BUS_ELECTRICITY: &str = "Strom";
pub const BUS_HEAT: &str = "Waerme";
pub const BUS_GAS: &str = "Gas";
pub const BUS_WIND: &str = "Wind";

pub const LOAD_ELECTRICITY: &str = "Stromlast";
pub const LOAD_HEAT: &str = "Waermelast";

pub const GRID_IMPORT: &str = "Netz_Import";
pub const GRID_EXPORT: &str = "Netz_Export";
pub const GAS_SUPPLY: &str = "Gas_Versorgung";
pub const GAS_BOILER: &str = "Gaskessel";
pub const WIND_TURBINE: &str = "Windkraftanlage";
pub const WIND_SELF_USE: &str = "Wind_Eigenverbrauch";
pub const HEAT_PUMP: &str = "Waermepumpe";
pub const HEAT_STORE: &str = "Waermespeicher";
pub const ELECTRICITY_STORE: &str = "Stromspeicher";

/// Hourly inputs of the system models on a common set of snapshots.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemInputs {
    pub snapshots: Vec<NaiveDateTime>,
    /// Heating load in kW.
    pub heat_demand_kw: Vec<f64>,
    /// Lamp electricity demand in kW.
    pub electricity_demand_kw: Vec<f64>,
    /// Heat pump COP, needed by the future system.
    pub cop: Option<Vec<f64>>,
    /// Turbine output in kW, needed by the future system.
    pub wind_kw: Option<Vec<f64>>,
}

/// Statistics of the model inputs, printed before a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputOverview {
    pub hours: usize,
    pub first: Option<NaiveDateTime>,
    pub last: Option<NaiveDateTime>,
    pub heat_mean_kw: f64,
    pub heat_max_kw: f64,
    pub heat_min_kw: f64,
    pub electricity_mean_kw: f64,
    pub electricity_max_kw: f64,
    pub cop_mean: Option<f64>,
    pub wind_mean_kw: Option<f64>,
    pub wind_max_kw: Option<f64>,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn max(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}

fn min(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

impl SystemInputs {
    /// Restricts all series to the timestamps they have in common.
    pub fn align(
        heat_demand_kw: &HourlySeries,
        electricity_demand_kw: &HourlySeries,
        cop: Option<&HourlySeries>,
        wind_kw: Option<&HourlySeries>,
    ) -> Result<Self, DataError> {
        let mut series = vec![heat_demand_kw, electricity_demand_kw];
        series.extend(cop);
        series.extend(wind_kw);

        let aligned = align(&series)?;
        let mut values = aligned.values.into_iter();
        let heat = values.next().unwrap_or_default();
        let electricity = values.next().unwrap_or_default();
        let cop = cop.and_then(|_| values.next());
        let wind = wind_kw.and_then(|_| values.next());

        Ok(Self {
            snapshots: aligned.snapshots,
            heat_demand_kw: heat,
            electricity_demand_kw: electricity,
            cop,
            wind_kw: wind,
        })
    }

    /// Keeps only the first `hours` snapshots.
    pub fn truncate(&mut self, hours: usize) {
        self.snapshots.truncate(hours);
        self.heat_demand_kw.truncate(hours);
        self.electricity_demand_kw.truncate(hours);
        if let Some(cop) = &mut self.cop {
            cop.truncate(hours);
        }
        if let Some(wind) = &mut self.wind_kw {
            wind.truncate(hours);
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn overview(&self) -> InputOverview {
        InputOverview {
            hours: self.len(),
            first: self.snapshots.first().copied(),
            last: self.snapshots.last().copied(),
            heat_mean_kw: mean(&self.heat_demand_kw),
            heat_max_kw: max(&self.heat_demand_kw),
            heat_min_kw: min(&self.heat_demand_kw),
            electricity_mean_kw: mean(&self.electricity_demand_kw),
            electricity_max_kw: max(&self.electricity_demand_kw),
            cop_mean: self.cop.as_deref().map(mean),
            wind_mean_kw: self.wind_kw.as_deref().map(mean),
            wind_max_kw: self.wind_kw.as_deref().map(max),
        }
    }

    pub(crate) fn require_cop(&self) -> Result<&[f64], NetworkError> {
        self.cop.as_deref().ok_or(NetworkError::MissingSeries("cop"))
    }

    pub(crate) fn require_wind(&self) -> Result<&[f64], NetworkError> {
        self.wind_kw
            .as_deref()
            .ok_or(NetworkError::MissingSeries("wind_kw"))
    }
}

pub(crate) fn invalid_system(system: &str, source: ParameterError) -> NetworkError {
    NetworkError::InvalidParameter {
        component: "system",
        name: system.to_string(),
        source,
    }
}

/// Mean, maximum and minimum of a store level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelStats {
    pub mean_kwh: f64,
    pub max_kwh: f64,
    pub min_kwh: f64,
}

impl LevelStats {
    pub fn from_levels(levels: &[f64]) -> Self {
        Self {
            mean_kwh: mean(levels),
            max_kwh: max(levels),
            min_kwh: min(levels),
        }
    }
}
