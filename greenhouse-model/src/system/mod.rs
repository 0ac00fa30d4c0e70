pub mod conventional;
pub mod future;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::capacity::Capacity;
use crate::error::{ParameterError, ensure_in_range, ensure_non_negative};

pub use conventional::ConventionalParameters;
pub use future::{FutureParameters, GridExportParameters, HeatPumpUnit, WindPlant};

/// Energy storage attached to a single bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[serde(default, deny_unknown_fields)]
#[ts(export, export_to = "./system.ts")]
pub struct StoreParameters {
    /// Energy capacity in kWh.
    pub capacity: Capacity,
    /// Annualized capital cost in €/kWh/a, charged on the built capacity.
    pub capital_cost: f64,
    /// Fraction of the stored energy lost per hour.
    pub standing_loss: f64,
    /// Force the level at the end of the horizon to equal the level at the start.
    pub cyclic: bool,
}

impl Default for StoreParameters {
    fn default() -> Self {
        Self {
            capacity: Capacity::extendable(),
            capital_cost: 0.0,
            standing_loss: 0.0,
            cyclic: true,
        }
    }
}

impl StoreParameters {
    pub fn validate(&self) -> Result<(), ParameterError> {
        self.capacity.validate()?;
        ensure_non_negative("capital_cost", self.capital_cost)?;
        ensure_in_range("standing_loss", self.standing_loss, 0.0, 1.0)
    }
}
