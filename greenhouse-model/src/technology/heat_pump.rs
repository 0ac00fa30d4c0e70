use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::{ParameterError, ensure_in_range, ensure_positive};

pub const KELVIN_OFFSET: f64 = 273.15;

/// Air-source heat pump described by a Carnot quality grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[serde(default, deny_unknown_fields)]
#[ts(export, export_to = "./technology.ts")]
pub struct HeatPumpParameters {
    /// Supply (sink) temperature in °C, e.g. 35 °C for floor heating.
    pub supply_temperature_c: f64,
    /// Quality grade relative to the Carnot COP (typically 0.4-0.6).
    pub carnot_efficiency: f64,
    /// Upper limit of the COP; also used when the source is warmer than the sink.
    pub cop_ceiling: f64,
}

impl Default for HeatPumpParameters {
    fn default() -> Self {
        Self {
            supply_temperature_c: 35.0,
            carnot_efficiency: 0.5,
            cop_ceiling: 10.0,
        }
    }
}

impl HeatPumpParameters {
    /// COP for a given source (ambient) temperature in °C.
    pub fn cop(&self, source_temperature_c: f64) -> f64 {
        let sink = self.supply_temperature_c + KELVIN_OFFSET;
        let source = source_temperature_c + KELVIN_OFFSET;
        let lift = sink - source;
        if lift <= 0.0 {
            return self.cop_ceiling;
        }
        (self.carnot_efficiency * sink / lift).min(self.cop_ceiling)
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        ensure_in_range("carnot_efficiency", self.carnot_efficiency, 0.0, 1.0)?;
        ensure_positive("cop_ceiling", self.cop_ceiling)
    }
}
