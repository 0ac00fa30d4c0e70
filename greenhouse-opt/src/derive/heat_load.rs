use std::path::Path;

use anyhow::Result;
use greenhouse_model::ParameterError;
use greenhouse_model::greenhouse::GreenhouseParameters;
use tracing::info;

use crate::error::DataError;
use crate::general::timeseries::{
    HourlySeries, align, column_index, format_stamp, open_csv, parse_decimal, parse_stamp,
    write_csv,
};

pub const TIME_COLUMN: &str = "MESS_DATUM";
pub const TEMPERATURE_COLUMN: &str = "T_aussen_C";
pub const HEAT_LOAD_COLUMN: &str = "Heizlast_kW";

/// Hourly heating load of a greenhouse from ambient temperature and irradiance.
#[derive(Debug, Clone)]
pub struct HeatLoadModel {
    greenhouse: GreenhouseParameters,
}

/// Heating load together with the temperatures it was computed from.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatLoadResult {
    pub temperature: HourlySeries,
    pub heat_load: HourlySeries,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatLoadSummary {
    pub hours: usize,
    pub max_kw: f64,
    pub mean_kw: f64,
    pub annual_kwh: f64,
    pub hours_without_demand: usize,
}

impl HeatLoadModel {
    pub fn new(greenhouse: GreenhouseParameters) -> Result<Self, ParameterError> {
        greenhouse.validate()?;
        Ok(Self { greenhouse })
    }

    /// Computes the load for every hour present in both inputs.
    pub fn compute(
        &self,
        temperature_c: &HourlySeries,
        solar_w_m2: &HourlySeries,
    ) -> Result<HeatLoadResult, DataError> {
        let aligned = align(&[temperature_c, solar_w_m2])?;
        let temperatures = &aligned.values[0];
        let irradiance = &aligned.values[1];

        let load: Vec<f64> = temperatures
            .iter()
            .zip(irradiance)
            .map(|(&ambient, &solar)| self.greenhouse.heating_load_kw(ambient, solar))
            .collect();

        let result = HeatLoadResult {
            temperature: HourlySeries::from_parts("temperature_c", &aligned.snapshots, temperatures)?,
            heat_load: HourlySeries::from_parts("heat_load_kw", &aligned.snapshots, &load)?,
        };
        info!("Heating load computed for {} hours", result.heat_load.len());
        Ok(result)
    }
}

impl HeatLoadResult {
    pub fn summary(&self) -> HeatLoadSummary {
        HeatLoadSummary {
            hours: self.heat_load.len(),
            max_kw: self.heat_load.max().unwrap_or(0.0),
            mean_kw: self.heat_load.mean().unwrap_or(0.0),
            annual_kwh: self.heat_load.sum(),
            hours_without_demand: self.heat_load.count_where(|q| q == 0.0),
        }
    }
}

pub fn write_heating_load(path: &Path, result: &HeatLoadResult) -> Result<()> {
    let rows = result
        .heat_load
        .points()
        .iter()
        .map(|(timestamp, load)| {
            let temperature = result.temperature.get(timestamp).unwrap_or(f64::NAN);
            vec![
                format_stamp(timestamp),
                temperature.to_string(),
                load.to_string(),
            ]
        });
    write_csv(
        path,
        b',',
        &[TIME_COLUMN, TEMPERATURE_COLUMN, HEAT_LOAD_COLUMN],
        rows,
    )?;
    info!("Heating load written to {}", path.display());
    Ok(())
}

/// Reads the heating load (kW) column of a derived heating-load file.
pub fn read_heating_load(path: &Path) -> Result<HourlySeries> {
    read_derived_column(path, HEAT_LOAD_COLUMN, "heat_load_kw")
}

/// Reads one numeric column of a `,`-separated derived file keyed by `MESS_DATUM`.
pub(crate) fn read_derived_column(path: &Path, column: &str, name: &str) -> Result<HourlySeries> {
    let mut reader = open_csv(path, b',')?;
    let headers = reader.headers()?.clone();
    let time_idx = column_index(&headers, TIME_COLUMN, path)?;
    let value_idx = column_index(&headers, column, path)?;

    let mut points = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let line = row + 2;
        let record = record?;
        let timestamp = parse_stamp(record.get(time_idx).unwrap_or_default())?;
        let raw = record.get(value_idx).unwrap_or_default();
        let value = parse_decimal(raw).ok_or_else(|| {
            anyhow::anyhow!(
                "{}: failed to parse {column} on line {line}: '{raw}'",
                path.display()
            )
        })?;
        points.push((timestamp, value));
    }
    Ok(HourlySeries::new(name, points)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn model() -> HeatLoadModel {
        HeatLoadModel::new(GreenhouseParameters::default()).unwrap()
    }

    #[test]
    fn test_compute_on_common_hours() {
        let temperature =
            HourlySeries::new("t", vec![(ts(0), 0.0), (ts(1), 0.0), (ts(2), 25.0)]).unwrap();
        let solar = HourlySeries::new("g", vec![(ts(1), 100.0), (ts(2), 0.0), (ts(3), 0.0)])
            .unwrap();

        let result = model().compute(&temperature, &solar).unwrap();
        assert_eq!(result.heat_load.timestamps(), vec![ts(1), ts(2)]);
        let load = result.heat_load.values();
        assert!((load[0] - 293.9985).abs() < 1e-6);
        assert_eq!(load[1], 0.0);

        let summary = result.summary();
        assert_eq!(summary.hours, 2);
        assert_eq!(summary.hours_without_demand, 1);
        assert!((summary.max_kw - 293.9985).abs() < 1e-6);
        assert!((summary.annual_kwh - 293.9985).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_invalid_greenhouse() {
        let greenhouse = GreenhouseParameters {
            height_m: -1.0,
            ..Default::default()
        };
        assert!(HeatLoadModel::new(greenhouse).is_err());
    }

    #[test]
    fn test_write_and_read() {
        let temperature = HourlySeries::new("t", vec![(ts(0), -5.0), (ts(1), 0.0)]).unwrap();
        let solar = HourlySeries::new("g", vec![(ts(0), 0.0), (ts(1), 0.0)]).unwrap();
        let result = model().compute(&temperature, &solar).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("heizlast_2019.csv");
        write_heating_load(&path, &result).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("MESS_DATUM,T_aussen_C,Heizlast_kW\n2019010100,-5,"));

        let loaded = read_heating_load(&path).unwrap();
        assert_eq!(loaded.timestamps(), vec![ts(0), ts(1)]);
        assert!((loaded.values()[1] - 1093.9985).abs() < 1e-6);
    }
}
