use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, info, warn};

use crate::error::DataError;
use crate::general::timeseries::{
    HourlySeries, column_index, open_csv, parse_decimal, parse_stamp,
};

/// Marker DWD uses for missing measurements.
pub const DWD_MISSING: f64 = -999.0;

/// Conversion from J/(h·cm²) to W/m².
pub const J_PER_H_CM2_TO_W_PER_M2: f64 = 10000.0 / 3600.0;

/// One raw `FG_LBERG` reading of a DWD solar file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolarReading {
    /// Global irradiation in J/(h·cm²).
    Value(f64),
    /// The station reported `-999`.
    Missing,
    /// The field could not be parsed.
    Invalid,
}

impl SolarReading {
    fn parse(raw: &str) -> Self {
        match parse_decimal(raw) {
            Some(value) if value == DWD_MISSING => Self::Missing,
            Some(value) => Self::Value(value),
            None => Self::Invalid,
        }
    }
}

/// Sunrise and sunset of one day, in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SunTimes {
    pub sunrise: NaiveDateTime,
    pub sunset: NaiveDateTime,
}

fn in_year(timestamp: &NaiveDateTime, year: Option<i32>) -> bool {
    use chrono::Datelike;
    year.is_none_or(|year| timestamp.year() == year)
}

/// Loads hourly air temperature (°C) from a DWD `;` file with `MESS_DATUM` and `TT_TU`.
///
/// Missing values (`-999`) are replaced by the last valid reading. Missing values
/// before the first valid reading are dropped.
pub fn load_dwd_temperature(path: &Path, year: Option<i32>) -> Result<HourlySeries> {
    let mut reader = open_csv(path, b';')?;
    let headers = reader.headers()?.clone();
    let time_idx = column_index(&headers, "MESS_DATUM", path)?;
    let value_idx = column_index(&headers, "TT_TU", path)?;

    let mut points = Vec::new();
    let mut last_valid: Option<f64> = None;
    let mut filled = 0usize;
    let mut dropped = 0usize;

    for (row, record) in reader.records().enumerate() {
        let line = row + 2;
        let record = record.with_context(|| format!("Failed to read line {line}"))?;
        let raw_time = record.get(time_idx).unwrap_or_default();
        let timestamp = parse_stamp(raw_time)
            .with_context(|| format!("{}: line {line}", path.display()))?;
        if !in_year(&timestamp, year) {
            continue;
        }
        let raw_value = record.get(value_idx).unwrap_or_default();
        let value = parse_decimal(raw_value).with_context(|| {
            format!(
                "{}: failed to parse temperature on line {line}: '{raw_value}'",
                path.display()
            )
        })?;

        if value == DWD_MISSING {
            match last_valid {
                Some(previous) => {
                    filled += 1;
                    points.push((timestamp, previous));
                }
                None => dropped += 1,
            }
        } else {
            last_valid = Some(value);
            points.push((timestamp, value));
        }
    }

    if filled > 0 || dropped > 0 {
        warn!(
            "{}: {filled} missing temperatures filled with the previous value, {dropped} dropped",
            path.display()
        );
    }
    if points.is_empty() {
        return Err(DataError::Empty {
            path: path.display().to_string(),
        }
        .into());
    }
    info!("Loaded {} temperature records from {}", points.len(), path.display());
    Ok(HourlySeries::new("temperature_c", points)?)
}

/// Loads raw `FG_LBERG` readings from a DWD solar file, keyed by hour.
///
/// Only the first ten characters of `MESS_DATUM` are used. Rows with an unreadable
/// timestamp are skipped.
pub fn load_dwd_solar_raw(
    path: &Path,
    year: Option<i32>,
) -> Result<BTreeMap<NaiveDateTime, SolarReading>> {
    let mut reader = open_csv(path, b';')?;
    let headers = reader.headers()?.clone();
    let time_idx = column_index(&headers, "MESS_DATUM", path)?;
    let value_idx = column_index(&headers, "FG_LBERG", path)?;

    let mut readings = BTreeMap::new();
    let mut skipped = 0usize;
    for (row, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read line {}", row + 2))?;
        let (Some(raw_time), Some(raw_value)) = (record.get(time_idx), record.get(value_idx))
        else {
            skipped += 1;
            continue;
        };
        let Ok(timestamp) = parse_stamp(raw_time) else {
            skipped += 1;
            continue;
        };
        if in_year(&timestamp, year) {
            readings.insert(timestamp, SolarReading::parse(raw_value));
        }
    }

    if skipped > 0 {
        debug!("{}: skipped {skipped} unreadable rows", path.display());
    }
    info!("Loaded {} solar records from {}", readings.len(), path.display());
    Ok(readings)
}

/// Loads global irradiance in W/m². Missing and negative readings count as no sun.
pub fn load_dwd_solar_w_m2(path: &Path, year: Option<i32>) -> Result<HourlySeries> {
    let readings = load_dwd_solar_raw(path, year)?;
    let mut invalid = 0usize;
    let points = readings
        .into_iter()
        .map(|(timestamp, reading)| {
            let value = match reading {
                SolarReading::Value(value) => value.max(0.0),
                SolarReading::Missing => 0.0,
                SolarReading::Invalid => {
                    invalid += 1;
                    0.0
                }
            };
            (timestamp, value * J_PER_H_CM2_TO_W_PER_M2)
        })
        .collect();
    if invalid > 0 {
        warn!("{}: {invalid} unparseable solar values set to 0", path.display());
    }
    Ok(HourlySeries::new("solar_w_m2", points)?)
}

/// Loads a `;` table of `YYYYMMDD;HH:MM:SS;HH:MM:SS` (date, sunrise, sunset) after one header line.
pub fn load_sun_times(path: &Path) -> Result<BTreeMap<NaiveDate, SunTimes>> {
    let mut reader = open_csv(path, b';')?;
    let mut days = BTreeMap::new();

    for (row, record) in reader.records().enumerate() {
        let line = row + 2;
        let record = record.with_context(|| format!("Failed to read line {line}"))?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        let field = |i: usize| record.get(i).unwrap_or_default();
        let date = NaiveDate::parse_from_str(field(0), "%Y%m%d")
            .with_context(|| format!("{}: invalid date on line {line}", path.display()))?;
        let sunrise = NaiveTime::parse_from_str(field(1), "%H:%M:%S")
            .with_context(|| format!("{}: invalid sunrise on line {line}", path.display()))?;
        let sunset = NaiveTime::parse_from_str(field(2), "%H:%M:%S")
            .with_context(|| format!("{}: invalid sunset on line {line}", path.display()))?;
        days.insert(
            date,
            SunTimes {
                sunrise: date.and_time(sunrise),
                sunset: date.and_time(sunset),
            },
        );
    }

    info!("Loaded sun times for {} days from {}", days.len(), path.display());
    Ok(days)
}

/// Parses the timestamp formats found in wind output exports. Offsets are dropped and
/// the wall-clock time is kept.
pub fn parse_wind_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.naive_local());
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

/// Loads hourly turbine output (kW) from a `time`/`electricity` table.
///
/// Metadata lines before the header row (the first line with a `time` field) are
/// skipped, as are `#` comments. The delimiter is `;` unless the header only splits on `,`.
pub fn load_wind_output(path: &Path) -> Result<HourlySeries> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let lines: Vec<&str> = content.lines().collect();

    let is_header = |line: &str, delimiter: char| {
        line.split(delimiter)
            .any(|field| field.trim().trim_matches('"') == "time")
    };
    let (header_line, delimiter) = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| !line.trim_start().starts_with('#'))
        .find_map(|(i, line)| {
            if is_header(line, ';') {
                Some((i, b';'))
            } else if is_header(line, ',') {
                Some((i, b','))
            } else {
                None
            }
        })
        .ok_or_else(|| DataError::HeaderNotFound {
            path: path.display().to_string(),
            column: "time".to_string(),
        })?;
    debug!(
        "{}: header on line {}, {} metadata lines skipped",
        path.display(),
        header_line + 1,
        header_line
    );

    let body = lines[header_line..].join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(body.as_bytes());
    let headers = reader.headers()?.clone();
    let time_idx = column_index(&headers, "time", path)?;
    let value_idx = column_index(&headers, "electricity", path)?;

    let mut points = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let line = header_line + row + 2;
        let record = record.with_context(|| format!("Failed to read line {line}"))?;
        let raw_time = record.get(time_idx).unwrap_or_default();
        if raw_time.is_empty() {
            continue;
        }
        let timestamp = parse_wind_time(raw_time).with_context(|| {
            format!("{}: invalid time '{raw_time}' on line {line}", path.display())
        })?;
        let raw_value = record.get(value_idx).unwrap_or_default();
        let value = parse_decimal(raw_value).with_context(|| {
            format!(
                "{}: failed to parse electricity on line {line}: '{raw_value}'",
                path.display()
            )
        })?;
        points.push((timestamp, value));
    }

    info!("Loaded {} wind output records from {}", points.len(), path.display());
    Ok(HourlySeries::new("wind_kw", points)?)
}
