use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::{ParameterError, ensure_in_range, ensure_positive};
use crate::technology::heat_pump::KELVIN_OFFSET;

/// Rotor and site properties for the power extracted from wind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[serde(default, deny_unknown_fields)]
#[ts(export, export_to = "./technology.ts")]
pub struct RotorParameters {
    /// Air pressure at hub height in Pa.
    pub air_pressure_pa: f64,
    /// Specific gas constant of dry air in J/(kg·K).
    pub gas_constant: f64,
    /// Air temperature in °C.
    pub air_temperature_c: f64,
    /// Power coefficient c_p (Betz limit 0.593).
    pub power_coefficient: f64,
    /// Rotor diameter in m.
    pub rotor_diameter_m: f64,
    /// Below this wind speed (m/s) the turbine does not produce.
    pub cut_in_speed: f64,
    /// Above this wind speed (m/s) the turbine is shut down.
    pub cut_out_speed: f64,
}

impl Default for RotorParameters {
    fn default() -> Self {
        Self {
            air_pressure_pa: 101_325.0,
            gas_constant: 287.05,
            air_temperature_c: 20.0,
            power_coefficient: 0.5,
            rotor_diameter_m: 120.0,
            cut_in_speed: 3.0,
            cut_out_speed: 20.0,
        }
    }
}

impl RotorParameters {
    /// Air density in kg/m³ from the ideal gas law.
    pub fn air_density(&self) -> f64 {
        self.air_pressure_pa / (self.gas_constant * (self.air_temperature_c + KELVIN_OFFSET))
    }

    /// Swept rotor area in m².
    pub fn rotor_area(&self) -> f64 {
        PI * self.rotor_diameter_m.powi(2) / 4.0
    }

    /// Power extracted from the wind in W at the given speed in m/s.
    pub fn power_w(&self, wind_speed: f64) -> f64 {
        if wind_speed < self.cut_in_speed || wind_speed > self.cut_out_speed {
            return 0.0;
        }
        self.power_coefficient * 0.5 * self.air_density() * self.rotor_area() * wind_speed.powi(3)
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        ensure_positive("air_pressure_pa", self.air_pressure_pa)?;
        ensure_positive("gas_constant", self.gas_constant)?;
        ensure_in_range("power_coefficient", self.power_coefficient, 0.0, 16.0 / 27.0)?;
        ensure_positive("rotor_diameter_m", self.rotor_diameter_m)?;
        ensure_in_range(
            "cut_in_speed",
            self.cut_in_speed,
            0.0,
            self.cut_out_speed,
        )
    }
}

/// Inputs of the regression for the main investment cost of an onshore turbine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[serde(default, deny_unknown_fields)]
#[ts(export, export_to = "./technology.ts")]
pub struct TurbineCostInputs {
    /// Rated power in MW.
    pub rated_power_mw: f64,
    /// Specific rating (rated power per swept area) in W/m².
    pub specific_rating_w_m2: f64,
    /// Hub height in m.
    pub hub_height_m: f64,
}

impl Default for TurbineCostInputs {
    fn default() -> Self {
        Self {
            rated_power_mw: 4.2,
            specific_rating_w_m2: 283.0,
            hub_height_m: 120.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export, export_to = "./technology.ts")]
pub struct InvestmentCost {
    /// Specific main investment cost in €/kW.
    pub specific_eur_per_kw: f64,
    /// Main investment cost of the turbine in €.
    pub total_eur: f64,
}

impl TurbineCostInputs {
    /// Main investment cost:
    /// `hik = 1743.95 - 81.21·P - 1.66·SFL + 2.91·NH` in €/kW, total `hik·P·1000`.
    pub fn main_investment_cost(&self) -> Result<InvestmentCost, ParameterError> {
        ensure_positive("rated_power_mw", self.rated_power_mw)?;
        ensure_positive("specific_rating_w_m2", self.specific_rating_w_m2)?;
        ensure_positive("hub_height_m", self.hub_height_m)?;

        let specific_eur_per_kw = 1743.95 - 81.21 * self.rated_power_mw
            - 1.66 * self.specific_rating_w_m2
            + 2.91 * self.hub_height_m;

        Ok(InvestmentCost {
            specific_eur_per_kw,
            total_eur: specific_eur_per_kw * self.rated_power_mw * 1000.0,
        })
    }
}
