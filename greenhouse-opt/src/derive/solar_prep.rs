use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Result, bail};
use chrono::NaiveDateTime;
use tracing::info;

use crate::general::timeseries::{
    HourlySeries, column_index, format_stamp, open_csv, parse_decimal, parse_stamp, write_csv,
};
use crate::general::weather::{J_PER_H_CM2_TO_W_PER_M2, SolarReading};

pub const TIME_COLUMN: &str = "DateTime";
pub const SOLAR_COLUMN: &str = "Solar_W_m2";

/// Where the merged values came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SolarMergeStats {
    pub primary: usize,
    pub fallback: usize,
    pub previous: usize,
}

impl SolarMergeStats {
    pub fn total(&self) -> usize {
        self.primary + self.fallback + self.previous
    }
}

/// Merges two stations into one irradiance series (W/m², 2 decimals) on the hours of `primary`.
///
/// A missing primary reading is taken from the fallback station. If that is missing too,
/// or a reading cannot be parsed, the last valid value is repeated (0 before the first one).
pub fn merge_solar(
    primary: &BTreeMap<NaiveDateTime, SolarReading>,
    fallback: &BTreeMap<NaiveDateTime, SolarReading>,
) -> Result<(HourlySeries, SolarMergeStats)> {
    let mut stats = SolarMergeStats::default();
    let mut last_valid = 0.0;
    let mut points = Vec::with_capacity(primary.len());

    for (timestamp, reading) in primary {
        let value = match (reading, fallback.get(timestamp)) {
            (SolarReading::Value(v), _) => {
                stats.primary += 1;
                Some(*v)
            }
            (SolarReading::Missing, Some(SolarReading::Value(v))) => {
                stats.fallback += 1;
                Some(*v)
            }
            _ => {
                stats.previous += 1;
                None
            }
        };
        if let Some(value) = value {
            last_valid = value * J_PER_H_CM2_TO_W_PER_M2;
        }
        points.push((*timestamp, (last_valid * 100.0).round() / 100.0));
    }

    info!(
        "Solar data merged: {} primary, {} fallback, {} previous values",
        stats.primary, stats.fallback, stats.previous
    );
    Ok((HourlySeries::new("solar_w_m2", points)?, stats))
}

pub fn write_solar_clean(path: &Path, solar_w_m2: &HourlySeries) -> Result<()> {
    let rows = solar_w_m2
        .points()
        .iter()
        .map(|(timestamp, value)| vec![format_stamp(timestamp), value.to_string()]);
    write_csv(path, b';', &[TIME_COLUMN, SOLAR_COLUMN], rows)?;
    info!("Cleaned solar data written to {}", path.display());
    Ok(())
}

pub fn read_solar_clean(path: &Path) -> Result<HourlySeries> {
    let mut reader = open_csv(path, b';')?;
    let headers = reader.headers()?.clone();
    let time_idx = column_index(&headers, TIME_COLUMN, path)?;
    let value_idx = column_index(&headers, SOLAR_COLUMN, path)?;

    let mut points = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let timestamp = parse_stamp(record.get(time_idx).unwrap_or_default())?;
        let raw = record.get(value_idx).unwrap_or_default();
        let Some(value) = parse_decimal(raw) else {
            bail!(
                "{}: failed to parse irradiance on line {}: '{raw}'",
                path.display(),
                row + 2
            );
        };
        points.push((timestamp, value));
    }
    Ok(HourlySeries::new("solar_w_m2", points)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_merge_with_fallback() {
        let primary = BTreeMap::from([
            (ts(0), SolarReading::Missing),
            (ts(1), SolarReading::Value(36.0)),
            (ts(2), SolarReading::Missing),
            (ts(3), SolarReading::Missing),
            (ts(4), SolarReading::Invalid),
        ]);
        let fallback = BTreeMap::from([
            (ts(0), SolarReading::Missing),
            (ts(2), SolarReading::Value(72.0)),
            (ts(4), SolarReading::Value(1.0)),
        ]);

        let (series, stats) = merge_solar(&primary, &fallback).unwrap();
        assert_eq!(series.values(), vec![0.0, 100.0, 200.0, 200.0, 200.0]);
        assert_eq!(
            stats,
            SolarMergeStats {
                primary: 1,
                fallback: 1,
                previous: 3
            }
        );
        assert_eq!(stats.total(), series.len());
    }

    #[test]
    fn test_values_rounded_and_round_trip() {
        let primary = BTreeMap::from([(ts(0), SolarReading::Value(1.0))]);
        let (series, _) = merge_solar(&primary, &BTreeMap::new()).unwrap();
        assert_eq!(series.values(), vec![2.78]);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solar.csv");
        write_solar_clean(&path, &series).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "DateTime;Solar_W_m2\n2019010100;2.78\n"
        );
        assert_eq!(read_solar_clean(&path).unwrap(), series);
    }
}
