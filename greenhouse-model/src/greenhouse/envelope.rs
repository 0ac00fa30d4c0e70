use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::{ParameterError, ensure_in_range, ensure_non_negative, ensure_positive};

/// Geometry and thermal properties of a greenhouse with a square footprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[serde(default, deny_unknown_fields)]
#[ts(export, export_to = "./greenhouse.ts")]
pub struct GreenhouseParameters {
    /// Floor area in m².
    pub floor_area_m2: f64,
    /// Eaves height in m.
    pub height_m: f64,
    /// U-value of the cover in W/(m²·K).
    pub u_value: f64,
    /// Indoor set-point temperature in °C.
    pub indoor_temperature_c: f64,
    /// Air change rate in 1/h.
    pub air_change_rate: f64,
    /// Volumetric heat capacity of air in Wh/(m³·K).
    pub air_heat_capacity: f64,
    /// Solar transmittance of the roof (0-1).
    pub solar_transmittance: f64,
}

impl Default for GreenhouseParameters {
    fn default() -> Self {
        Self {
            floor_area_m2: 10000.0,
            height_m: 4.5,
            u_value: 4.0,
            indoor_temperature_c: 20.0,
            air_change_rate: 0.5,
            air_heat_capacity: 0.33333,
            solar_transmittance: 0.8,
        }
    }
}

impl GreenhouseParameters {
    /// Air volume in m³.
    pub fn volume(&self) -> f64 {
        self.floor_area_m2 * self.height_m
    }

    pub fn side_length(&self) -> f64 {
        self.floor_area_m2.sqrt()
    }

    /// Area of the four side walls in m².
    pub fn wall_area(&self) -> f64 {
        4.0 * self.side_length() * self.height_m
    }

    /// The roof is flat and covers the whole floor.
    pub fn roof_area(&self) -> f64 {
        self.floor_area_m2
    }

    /// Total heat-transferring envelope (roof and walls) in m².
    pub fn envelope_area(&self) -> f64 {
        self.wall_area() + self.roof_area()
    }

    /// Transmission heat loss coefficient U·A in W/K.
    pub fn transmission_coefficient(&self) -> f64 {
        self.u_value * self.envelope_area()
    }

    /// Ventilation heat loss coefficient V·n·c_p in W/K.
    pub fn ventilation_coefficient(&self) -> f64 {
        self.volume() * self.air_change_rate * self.air_heat_capacity
    }

    /// Net heating load in kW for one hour, never negative.
    ///
    /// `irradiance_w_m2` is the global horizontal irradiance entering through the roof.
    pub fn heating_load_kw(&self, ambient_c: f64, irradiance_w_m2: f64) -> f64 {
        let delta_t = self.indoor_temperature_c - ambient_c;
        let transmission = self.transmission_coefficient() * delta_t;
        let ventilation = self.ventilation_coefficient() * delta_t;
        let solar_gain = irradiance_w_m2 * self.roof_area() * self.solar_transmittance;

        ((transmission + ventilation - solar_gain) / 1000.0).max(0.0)
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        ensure_positive("floor_area_m2", self.floor_area_m2)?;
        ensure_positive("height_m", self.height_m)?;
        ensure_non_negative("u_value", self.u_value)?;
        ensure_non_negative("air_change_rate", self.air_change_rate)?;
        ensure_non_negative("air_heat_capacity", self.air_heat_capacity)?;
        ensure_in_range("solar_transmittance", self.solar_transmittance, 0.0, 1.0)
    }
}
