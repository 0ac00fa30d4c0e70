use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::capacity::Capacity;
use crate::error::{ParameterError, ensure_in_range, ensure_non_negative};
use crate::system::StoreParameters;

/// Baseline greenhouse: electricity from the public grid, heat from a gas boiler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[serde(default, deny_unknown_fields)]
#[ts(export, export_to = "./system.ts")]
pub struct ConventionalParameters {
    /// Grid electricity price in €/kWh.
    pub grid_price: f64,
    /// Grid import capacity in kW.
    pub grid_capacity: Capacity,
    /// Natural gas price in €/kWh.
    pub gas_price: f64,
    /// Gas supply capacity in kW.
    pub gas_supply_capacity: Capacity,
    /// Boiler efficiency (heat out per gas in).
    pub boiler_efficiency: f64,
    /// Boiler capacity in kW of gas input.
    pub boiler_capacity: Capacity,
    /// Annualized boiler capital cost in €/kW/a.
    pub boiler_capital_cost: f64,
    /// Optional heat store on the heat bus.
    pub heat_store: Option<StoreParameters>,
}

impl Default for ConventionalParameters {
    fn default() -> Self {
        Self::baseline()
    }
}

impl ConventionalParameters {
    /// Unlimited grid, boiler sized by the optimization, no storage.
    pub fn baseline() -> Self {
        Self {
            grid_price: 0.1361,
            grid_capacity: Capacity::Unbounded,
            gas_price: 0.03,
            gas_supply_capacity: Capacity::fixed(5000.0),
            boiler_efficiency: 0.95,
            boiler_capacity: Capacity::extendable(),
            boiler_capital_cost: 7.0,
            heat_store: None,
        }
    }

    /// Parameter set used for the side-by-side comparison with the future system.
    pub fn comparison() -> Self {
        Self {
            grid_price: 0.25,
            grid_capacity: Capacity::fixed(10000.0),
            gas_price: 0.08,
            gas_supply_capacity: Capacity::fixed(5000.0),
            boiler_efficiency: 0.95,
            boiler_capacity: Capacity::fixed(1500.0),
            boiler_capital_cost: 7.0,
            heat_store: Some(StoreParameters {
                capacity: Capacity::extendable(),
                capital_cost: 10.0,
                standing_loss: 0.005,
                cyclic: true,
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        ensure_non_negative("grid_price", self.grid_price)?;
        self.grid_capacity.validate()?;
        ensure_non_negative("gas_price", self.gas_price)?;
        self.gas_supply_capacity.validate()?;
        ensure_in_range("boiler_efficiency", self.boiler_efficiency, 0.0, 1.0)?;
        self.boiler_capacity.validate()?;
        ensure_non_negative("boiler_capital_cost", self.boiler_capital_cost)?;
        if let Some(store) = &self.heat_store {
            store.validate()?;
        }
        Ok(())
    }
}
