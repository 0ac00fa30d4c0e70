use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::capacity::Capacity;
use crate::error::{ParameterError, ensure_non_negative, ensure_positive};
use crate::system::StoreParameters;

/// Wind turbine feeding its own bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[serde(default, deny_unknown_fields)]
#[ts(export, export_to = "./system.ts")]
pub struct WindPlant {
    /// Nameplate power of the turbine the output data was recorded for, in kW.
    /// Hourly output divided by this value gives the per-unit availability.
    pub nameplate_kw: f64,
    /// Installed capacity in kW.
    pub capacity: Capacity,
    /// Operating cost in €/kWh.
    pub marginal_cost: f64,
    /// Annualized capital cost in €/kW/a. The default turbine already exists and carries none.
    pub capital_cost: f64,
}

impl Default for WindPlant {
    fn default() -> Self {
        Self {
            nameplate_kw: 6000.0,
            capacity: Capacity::fixed(6000.0),
            marginal_cost: 0.01,
            capital_cost: 0.0,
        }
    }
}

/// Heat pump converting electricity into heat with an hourly COP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[serde(default, deny_unknown_fields)]
#[ts(export, export_to = "./system.ts")]
pub struct HeatPumpUnit {
    /// Electrical capacity in kW.
    pub capacity: Capacity,
    /// Operating cost in €/kWh of electricity.
    pub marginal_cost: f64,
    /// Annualized capital cost in €/kW/a. Zero for the default unit, as for the turbine.
    pub capital_cost: f64,
}

impl Default for HeatPumpUnit {
    fn default() -> Self {
        Self {
            capacity: Capacity::fixed(2000.0),
            marginal_cost: 0.005,
            capital_cost: 0.0,
        }
    }
}

/// Sale of surplus wind power to the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[serde(default, deny_unknown_fields)]
#[ts(export, export_to = "./system.ts")]
pub struct GridExportParameters {
    /// Feed-in revenue in €/kWh.
    pub revenue: f64,
    /// Export capacity in kW.
    pub capacity: Capacity,
}

impl Default for GridExportParameters {
    fn default() -> Self {
        Self {
            revenue: 0.08,
            capacity: Capacity::fixed(5000.0),
        }
    }
}

/// Future greenhouse: wind power, heat pump, storage and grid backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[serde(default, deny_unknown_fields)]
#[ts(export, export_to = "./system.ts")]
pub struct FutureParameters {
    pub wind: WindPlant,
    /// Capacity of the connection from the wind bus to the greenhouse bus, in kW.
    pub wind_self_use_capacity: Capacity,
    pub heat_pump: HeatPumpUnit,
    pub heat_store: Option<StoreParameters>,
    pub electricity_store: Option<StoreParameters>,
    /// Grid import price in €/kWh.
    pub grid_import_price: f64,
    /// Grid import capacity in kW.
    pub grid_import_capacity: Capacity,
    pub grid_export: Option<GridExportParameters>,
}

impl Default for FutureParameters {
    fn default() -> Self {
        Self::fixed_fleet()
    }
}

impl FutureParameters {
    /// Fixed component sizes with surplus export. No component is built, so the
    /// annual investment of this fleet is zero.
    pub fn fixed_fleet() -> Self {
        Self {
            wind: WindPlant::default(),
            wind_self_use_capacity: Capacity::fixed(6000.0),
            heat_pump: HeatPumpUnit::default(),
            heat_store: Some(StoreParameters {
                capacity: Capacity::fixed(5000.0),
                capital_cost: 0.0,
                standing_loss: 0.001,
                cyclic: true,
            }),
            electricity_store: None,
            grid_import_price: 0.25,
            grid_import_capacity: Capacity::fixed(5000.0),
            grid_export: Some(GridExportParameters::default()),
        }
    }

    /// All components sized by the optimization; used for the system comparison.
    pub fn comparison() -> Self {
        Self {
            wind: WindPlant {
                nameplate_kw: 6000.0,
                capacity: Capacity::extendable(),
                marginal_cost: 0.0,
                capital_cost: 150.0,
            },
            wind_self_use_capacity: Capacity::extendable(),
            heat_pump: HeatPumpUnit {
                capacity: Capacity::extendable(),
                marginal_cost: 0.0,
                capital_cost: 480.0,
            },
            heat_store: Some(StoreParameters {
                capacity: Capacity::extendable(),
                capital_cost: 5.0,
                standing_loss: 0.005,
                cyclic: true,
            }),
            electricity_store: Some(StoreParameters {
                capacity: Capacity::extendable(),
                capital_cost: 45.0,
                standing_loss: 0.0001,
                cyclic: true,
            }),
            grid_import_price: 0.25,
            grid_import_capacity: Capacity::Unbounded,
            grid_export: None,
        }
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        ensure_positive("wind.nameplate_kw", self.wind.nameplate_kw)?;
        self.wind.capacity.validate()?;
        ensure_non_negative("wind.capital_cost", self.wind.capital_cost)?;
        self.wind_self_use_capacity.validate()?;
        self.heat_pump.capacity.validate()?;
        ensure_non_negative("heat_pump.capital_cost", self.heat_pump.capital_cost)?;
        for store in [&self.heat_store, &self.electricity_store].into_iter().flatten() {
            store.validate()?;
        }
        ensure_non_negative("grid_import_price", self.grid_import_price)?;
        self.grid_import_capacity.validate()?;
        if let Some(export) = &self.grid_export {
            ensure_non_negative("grid_export.revenue", export.revenue)?;
            export.capacity.validate()?;
        }
        Ok(())
    }
}
