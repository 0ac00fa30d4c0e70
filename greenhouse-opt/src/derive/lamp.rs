use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Result, bail};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use greenhouse_model::greenhouse::{LampParameters, LampSchedule};
use tracing::{info, warn};

use crate::general::timeseries::{
    HourlySeries, column_index, format_stamp, open_csv, parse_decimal, parse_stamp, write_csv,
};
use crate::general::weather::SunTimes;

pub const TIME_COLUMN: &str = "DateTime";
pub const ENERGY_WH_COLUMN: &str = "Energy_Wh";
pub const ENERGY_KW_COLUMN: &str = "Energy_kW";

/// Inputs a lamp schedule may need.
#[derive(Debug, Clone, Copy, Default)]
pub struct LampInputs<'a> {
    pub sun_times: Option<&'a BTreeMap<NaiveDate, SunTimes>>,
    pub irradiance_w_m2: Option<&'a HourlySeries>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LampDemand {
    /// Minutes the lamps are on in each hour.
    pub minutes_on: HourlySeries,
    /// Electrical energy per hour in Wh, rounded to 2 decimals.
    pub energy_wh: HourlySeries,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LampSummary {
    pub lamp_count: u64,
    pub total_power_kw: f64,
    pub hours: usize,
    pub hours_on: usize,
    pub annual_kwh: f64,
    pub full_load_hours: f64,
}

/// Every hour of a calendar year.
pub fn hours_of_year(year: i32) -> Vec<NaiveDateTime> {
    let (Some(start), Some(end)) = (
        NaiveDate::from_ymd_opt(year, 1, 1),
        NaiveDate::from_ymd_opt(year + 1, 1, 1),
    ) else {
        return Vec::new();
    };
    let start = start.and_time(chrono::NaiveTime::MIN);
    let end = end.and_time(chrono::NaiveTime::MIN);
    std::iter::successors(Some(start), |t| Some(*t + TimeDelta::hours(1)))
        .take_while(|t| *t < end)
        .collect()
}

/// Minutes of darkness within the hour starting at `hour_start`.
pub fn minutes_dark(hour_start: NaiveDateTime, sun: &SunTimes) -> f64 {
    let hour_end = hour_start + TimeDelta::hours(1);
    let minutes = |delta: TimeDelta| delta.num_seconds() as f64 / 60.0;

    if hour_start < sun.sunrise && sun.sunrise <= hour_end {
        minutes(sun.sunrise - hour_start)
    } else if hour_start < sun.sunset && sun.sunset <= hour_end {
        minutes(hour_end - sun.sunset)
    } else if hour_end <= sun.sunrise || hour_start >= sun.sunset {
        60.0
    } else {
        0.0
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Hourly lamp operation and energy demand.
#[derive(Debug, Clone)]
pub struct LampModel {
    lamps: LampParameters,
    schedule: LampSchedule,
}

impl LampModel {
    pub fn new(lamps: LampParameters, schedule: LampSchedule) -> Result<Self> {
        lamps.validate()?;
        schedule.validate()?;
        Ok(Self { lamps, schedule })
    }

    /// Computes the demand for `hours`.
    ///
    /// The sunrise/sunset rule skips hours of days missing from the sun table. The
    /// daylight-window rule uses the irradiance series and skips hours without a reading.
    pub fn compute(&self, hours: &[NaiveDateTime], inputs: LampInputs<'_>) -> Result<LampDemand> {
        let mut minutes = Vec::with_capacity(hours.len());
        let mut skipped = 0usize;

        match self.schedule {
            LampSchedule::SunriseSunset => {
                let Some(sun_times) = inputs.sun_times else {
                    bail!("sunrise/sunset lamp schedule needs a sun time table");
                };
                for &hour in hours {
                    match sun_times.get(&hour.date()) {
                        Some(sun) => minutes.push((hour, minutes_dark(hour, sun))),
                        None => skipped += 1,
                    }
                }
            }
            LampSchedule::DaylightWindow {
                start_hour,
                end_hour,
                irradiance_threshold_w_m2,
            } => {
                let Some(irradiance) = inputs.irradiance_w_m2 else {
                    bail!("daylight-window lamp schedule needs an irradiance series");
                };
                for &hour in hours {
                    let Some(solar) = irradiance.get(&hour) else {
                        skipped += 1;
                        continue;
                    };
                    let on = LampSchedule::window_contains(start_hour, end_hour, hour.hour())
                        && solar < irradiance_threshold_w_m2;
                    minutes.push((hour, if on { 60.0 } else { 0.0 }));
                }
            }
        }

        if skipped > 0 {
            warn!("Lamp demand: {skipped} hours skipped for lack of input data");
        }

        let per_minute_wh = self.lamps.energy_per_minute_wh();
        let energy = minutes
            .iter()
            .map(|(hour, on)| (*hour, round2(on * per_minute_wh)))
            .collect();
        let demand = LampDemand {
            minutes_on: HourlySeries::new("lamp_minutes", minutes)?,
            energy_wh: HourlySeries::new("lamp_energy_wh", energy)?,
        };
        info!(
            "Lamp demand computed for {} hours ({} lamps)",
            demand.energy_wh.len(),
            self.lamps.lamp_count()
        );
        Ok(demand)
    }

    pub fn summary(&self, demand: &LampDemand) -> LampSummary {
        let total_power_kw = self.lamps.total_power_w() / 1000.0;
        let annual_kwh = demand.energy_wh.sum() / 1000.0;
        LampSummary {
            lamp_count: self.lamps.lamp_count(),
            total_power_kw,
            hours: demand.energy_wh.len(),
            hours_on: demand.minutes_on.count_where(|m| m > 0.0),
            annual_kwh,
            full_load_hours: if total_power_kw > 0.0 {
                annual_kwh / total_power_kw
            } else {
                0.0
            },
        }
    }
}

impl LampDemand {
    pub fn energy_kw(&self) -> HourlySeries {
        self.energy_wh.map("lamp_energy_kw", |wh| wh / 1000.0)
    }
}

pub fn write_lamp_demand(path: &Path, demand: &LampDemand) -> Result<()> {
    let rows = demand.energy_wh.points().iter().map(|(timestamp, wh)| {
        vec![
            format_stamp(timestamp),
            wh.to_string(),
            (wh / 1000.0).to_string(),
        ]
    });
    write_csv(
        path,
        b';',
        &[TIME_COLUMN, ENERGY_WH_COLUMN, ENERGY_KW_COLUMN],
        rows,
    )?;
    info!("Lamp demand written to {}", path.display());
    Ok(())
}

/// Reads lamp electricity demand in kW. Files with only `Energy_Wh` are converted.
pub fn read_lamp_demand(path: &Path) -> Result<HourlySeries> {
    let mut reader = open_csv(path, b';')?;
    let headers = reader.headers()?.clone();
    let time_idx = column_index(&headers, TIME_COLUMN, path)?;
    let (value_idx, scale) = match column_index(&headers, ENERGY_KW_COLUMN, path) {
        Ok(idx) => (idx, 1.0),
        Err(_) => (column_index(&headers, ENERGY_WH_COLUMN, path)?, 1.0 / 1000.0),
    };

    let mut points = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let timestamp = parse_stamp(record.get(time_idx).unwrap_or_default())?;
        let raw = record.get(value_idx).unwrap_or_default();
        let Some(value) = parse_decimal(raw) else {
            bail!(
                "{}: failed to parse lamp energy on line {}: '{raw}'",
                path.display(),
                row + 2
            );
        };
        points.push((timestamp, value * scale));
    }
    Ok(HourlySeries::new("electricity_demand_kw", points)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn sun_table() -> BTreeMap<NaiveDate, SunTimes> {
        let day = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
        BTreeMap::from([(
            day,
            SunTimes {
                sunrise: at(8, 30),
                sunset: at(16, 15),
            },
        )])
    }

    #[test]
    fn test_minutes_dark() {
        let sun = sun_table()[&NaiveDate::from_ymd_opt(2019, 1, 1).unwrap()];
        assert_eq!(minutes_dark(at(7, 0), &sun), 60.0);
        assert_eq!(minutes_dark(at(8, 0), &sun), 30.0);
        assert_eq!(minutes_dark(at(12, 0), &sun), 0.0);
        assert_eq!(minutes_dark(at(16, 0), &sun), 45.0);
        assert_eq!(minutes_dark(at(17, 0), &sun), 60.0);
    }

    #[test]
    fn test_hours_of_year() {
        let hours = hours_of_year(2019);
        assert_eq!(hours.len(), 8760);
        assert_eq!(hours[0], at(0, 0));
        assert_eq!(hours_of_year(2020).len(), 8784);
    }

    #[test]
    fn test_sunrise_sunset_demand() {
        let model = LampModel::new(LampParameters::default(), LampSchedule::SunriseSunset).unwrap();
        let table = sun_table();
        let mut hours: Vec<NaiveDateTime> = (0..24).map(|h| at(h, 0)).collect();
        // second day is not in the table
        hours.push(at(0, 0) + TimeDelta::days(1));

        let demand = model
            .compute(
                &hours,
                LampInputs {
                    sun_times: Some(&table),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(demand.energy_wh.len(), 24);
        let wh = demand.energy_wh.values();
        assert_eq!(wh[0], 2_528_000.0);
        assert_eq!(wh[8], 1_264_000.0);
        assert_eq!(wh[12], 0.0);
        assert_eq!(wh[16], 1_896_000.0);

        let summary = model.summary(&demand);
        assert_eq!(summary.lamp_count, 4000);
        // 8 h before sunrise + 0.5 + 0.75 + 7 h after 17:00
        assert!((summary.full_load_hours - 16.25).abs() < 1e-9);
        assert_eq!(summary.hours_on, 17);
    }

    #[test]
    fn test_daylight_window_demand() {
        let schedule = LampSchedule::DaylightWindow {
            start_hour: 6,
            end_hour: 22,
            irradiance_threshold_w_m2: 50.0,
        };
        let model = LampModel::new(LampParameters::default(), schedule).unwrap();
        let irradiance = HourlySeries::new(
            "g",
            vec![(at(5, 0), 0.0), (at(6, 0), 10.0), (at(12, 0), 300.0)],
        )
        .unwrap();
        let hours = [at(5, 0), at(6, 0), at(12, 0), at(13, 0)];

        let demand = model
            .compute(
                &hours,
                LampInputs {
                    irradiance_w_m2: Some(&irradiance),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(demand.minutes_on.values(), vec![0.0, 60.0, 0.0]);

        assert!(model.compute(&hours, LampInputs::default()).is_err());
    }

    #[test]
    fn test_write_and_read() {
        let model = LampModel::new(LampParameters::default(), LampSchedule::SunriseSunset).unwrap();
        let table = sun_table();
        let demand = model
            .compute(
                &[at(7, 0), at(8, 0)],
                LampInputs {
                    sun_times: Some(&table),
                    ..Default::default()
                },
            )
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hourly_lamp_energy_2019.csv");
        write_lamp_demand(&path, &demand).unwrap();
        let kw = read_lamp_demand(&path).unwrap();
        assert_eq!(kw.values(), vec![2528.0, 1264.0]);

        // files with only the Wh column
        let legacy = dir.path().join("legacy.csv");
        std::fs::write(&legacy, "DateTime;Energy_Wh\n2019010100;2528000.0\n").unwrap();
        assert_eq!(read_lamp_demand(&legacy).unwrap().values(), vec![2528.0]);
    }
}
