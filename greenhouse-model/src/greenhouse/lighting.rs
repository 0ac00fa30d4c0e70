use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::{ParameterError, ensure_in_range, ensure_non_negative, ensure_positive};

/// Supplementary grow lights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[serde(default, deny_unknown_fields)]
#[ts(export, export_to = "./greenhouse.ts")]
pub struct LampParameters {
    /// Electrical power of a single lamp in W.
    pub power_per_lamp_w: f64,
    /// Floor area lit by one lamp in m².
    pub coverage_per_lamp_m2: f64,
    /// Floor area to be lit in m².
    pub lit_area_m2: f64,
}

impl Default for LampParameters {
    fn default() -> Self {
        Self {
            power_per_lamp_w: 632.0,
            coverage_per_lamp_m2: 2.5,
            lit_area_m2: 10000.0,
        }
    }
}

impl LampParameters {
    /// Number of lamps, rounded up so the whole area is covered.
    pub fn lamp_count(&self) -> u64 {
        (self.lit_area_m2 / self.coverage_per_lamp_m2).ceil() as u64
    }

    /// Power draw with all lamps switched on, in W.
    pub fn total_power_w(&self) -> f64 {
        self.lamp_count() as f64 * self.power_per_lamp_w
    }

    /// Energy drawn per minute of full operation, in Wh.
    pub fn energy_per_minute_wh(&self) -> f64 {
        self.total_power_w() / 60.0
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        ensure_non_negative("power_per_lamp_w", self.power_per_lamp_w)?;
        ensure_positive("coverage_per_lamp_m2", self.coverage_per_lamp_m2)?;
        ensure_non_negative("lit_area_m2", self.lit_area_m2)
    }
}

/// Rule deciding how many minutes per hour the lamps are on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "./greenhouse.ts")]
pub enum LampSchedule {
    /// Lamps run from sunset to sunrise, interpolated to the minute.
    #[default]
    SunriseSunset,
    /// Lamps run during a fixed photoperiod whenever the sun is too weak.
    DaylightWindow {
        /// First hour of the window (0-23, inclusive).
        start_hour: u32,
        /// End of the window (1-24, exclusive). A value below `start_hour` wraps past midnight.
        end_hour: u32,
        /// Lamps switch on below this global irradiance in W/m².
        irradiance_threshold_w_m2: f64,
    },
}

impl LampSchedule {
    pub fn validate(&self) -> Result<(), ParameterError> {
        match *self {
            Self::SunriseSunset => Ok(()),
            Self::DaylightWindow {
                start_hour,
                end_hour,
                irradiance_threshold_w_m2,
            } => {
                ensure_in_range("start_hour", start_hour as f64, 0.0, 23.0)?;
                ensure_in_range("end_hour", end_hour as f64, 0.0, 24.0)?;
                ensure_non_negative("irradiance_threshold_w_m2", irradiance_threshold_w_m2)
            }
        }
    }

    /// Whether `hour` (0-23) lies inside a daylight window.
    pub fn window_contains(start_hour: u32, end_hour: u32, hour: u32) -> bool {
        if start_hour <= end_hour {
            (start_hour..end_hour).contains(&hour)
        } else {
            hour >= start_hour || hour < end_hour
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lamp_count_and_power() {
        let lamps = LampParameters::default();
        assert_eq!(lamps.lamp_count(), 4000);
        assert_eq!(lamps.total_power_w(), 2_528_000.0);

        let odd = LampParameters {
            lit_area_m2: 10.0,
            coverage_per_lamp_m2: 3.0,
            ..Default::default()
        };
        assert_eq!(odd.lamp_count(), 4);
    }

    #[test]
    fn test_window_contains() {
        assert!(LampSchedule::window_contains(6, 22, 6));
        assert!(!LampSchedule::window_contains(6, 22, 22));
        assert!(LampSchedule::window_contains(22, 4, 23));
        assert!(LampSchedule::window_contains(22, 4, 0));
        assert!(!LampSchedule::window_contains(22, 4, 12));
    }

    #[test]
    fn test_validate_schedule() {
        let window = LampSchedule::DaylightWindow {
            start_hour: 25,
            end_hour: 3,
            irradiance_threshold_w_m2: 100.0,
        };
        assert!(window.validate().is_err());
        assert!(LampSchedule::SunriseSunset.validate().is_ok());
    }
}
