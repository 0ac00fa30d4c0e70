use std::collections::BTreeSet;
use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::error::DataError;

/// Format of the hour stamps used in all data files.
pub const STAMP_FORMAT: &str = "%Y%m%d%H";

/// Parses a `YYYYMMDDHH` stamp. Trailing characters (e.g. `:MM` in DWD solar files) are ignored.
pub fn parse_stamp(raw: &str) -> Result<NaiveDateTime, DataError> {
    let raw = raw.trim();
    let invalid = || DataError::InvalidTimestamp(raw.to_string());
    if raw.len() < 10 || !raw.bytes().take(10).all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let date = NaiveDate::parse_from_str(&raw[..8], "%Y%m%d").map_err(|_| invalid())?;
    let hour: u32 = raw[8..10].parse().map_err(|_| invalid())?;
    date.and_hms_opt(hour, 0, 0).ok_or_else(invalid)
}

pub fn format_stamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(STAMP_FORMAT).to_string()
}

/// Parses a number that may use a decimal comma.
pub fn parse_decimal(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    raw.replace(',', ".").parse::<f64>().ok()
}

/// Named hourly time series, sorted by timestamp without duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlySeries {
    name: String,
    points: Vec<(NaiveDateTime, f64)>,
}

/// Descriptive statistics of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub count: usize,
    pub sum: f64,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl HourlySeries {
    pub fn new(
        name: impl Into<String>,
        mut points: Vec<(NaiveDateTime, f64)>,
    ) -> Result<Self, DataError> {
        let name = name.into();
        points.sort_by_key(|(timestamp, _)| *timestamp);
        if let Some(pair) = points.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(DataError::DuplicateTimestamp {
                name,
                timestamp: pair[0].0,
            });
        }
        Ok(Self { name, points })
    }

    /// Builds a series on the given timestamps. Extra values are dropped.
    pub fn from_parts(
        name: impl Into<String>,
        timestamps: &[NaiveDateTime],
        values: &[f64],
    ) -> Result<Self, DataError> {
        let points = timestamps
            .iter()
            .copied()
            .zip(values.iter().copied())
            .collect();
        Self::new(name, points)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[(NaiveDateTime, f64)] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|(_, value)| *value).collect()
    }

    pub fn timestamps(&self) -> Vec<NaiveDateTime> {
        self.points.iter().map(|(timestamp, _)| *timestamp).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, timestamp: &NaiveDateTime) -> Option<f64> {
        self.points
            .binary_search_by_key(timestamp, |(t, _)| *t)
            .ok()
            .map(|index| self.points[index].1)
    }

    /// Keeps only the records of one calendar year.
    pub fn filter_year(mut self, year: i32) -> Self {
        self.points.retain(|(timestamp, _)| timestamp.year() == year);
        self
    }

    /// Keeps the first `n` records.
    pub fn truncate(&mut self, n: usize) {
        self.points.truncate(n);
    }

    /// New series with `f` applied to every value.
    pub fn map(&self, name: impl Into<String>, f: impl Fn(f64) -> f64) -> Self {
        Self {
            name: name.into(),
            points: self
                .points
                .iter()
                .map(|(timestamp, value)| (*timestamp, f(*value)))
                .collect(),
        }
    }

    pub fn sum(&self) -> f64 {
        self.points.iter().map(|(_, value)| value).sum()
    }

    pub fn mean(&self) -> Option<f64> {
        if self.points.is_empty() {
            None
        } else {
            Some(self.sum() / self.points.len() as f64)
        }
    }

    pub fn min(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|(_, value)| *value)
            .reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.points
            .iter()
            .map(|(_, value)| *value)
            .reduce(f64::max)
    }

    pub fn count_where(&self, predicate: impl Fn(f64) -> bool) -> usize {
        self.points
            .iter()
            .filter(|(_, value)| predicate(*value))
            .count()
    }

    pub fn stats(&self) -> Option<SeriesStats> {
        Some(SeriesStats {
            count: self.len(),
            sum: self.sum(),
            mean: self.mean()?,
            min: self.min()?,
            max: self.max()?,
        })
    }
}

/// Several series restricted to their common timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    pub snapshots: Vec<NaiveDateTime>,
    /// One value vector per input series, in input order.
    pub values: Vec<Vec<f64>>,
}

/// Intersects the timestamps of all series, in chronological order.
pub fn align(series: &[&HourlySeries]) -> Result<AlignedSeries, DataError> {
    let Some((first, rest)) = series.split_first() else {
        return Err(DataError::EmptyIntersection);
    };
    let mut common: BTreeSet<NaiveDateTime> = first.timestamps().into_iter().collect();
    for other in rest {
        common.retain(|timestamp| other.get(timestamp).is_some());
    }
    if common.is_empty() {
        return Err(DataError::EmptyIntersection);
    }
    for s in series {
        if s.len() > common.len() {
            debug!(
                "{}: {} of {} hours outside the common range",
                s.name(),
                s.len() - common.len(),
                s.len()
            );
        }
    }

    let values = series
        .iter()
        .map(|s| {
            s.points
                .iter()
                .filter(|(timestamp, _)| common.contains(timestamp))
                .map(|(_, value)| *value)
                .collect()
        })
        .collect();

    Ok(AlignedSeries {
        snapshots: common.into_iter().collect(),
        values,
    })
}

/// Opens a delimited file with a header row. Fields are trimmed and rows may vary in length.
pub(crate) fn open_csv(path: &Path, delimiter: u8) -> Result<csv::Reader<File>> {
    csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))
}

pub(crate) fn column_index(
    headers: &csv::StringRecord,
    column: &str,
    path: &Path,
) -> Result<usize, DataError> {
    headers
        .iter()
        .position(|header| header.trim() == column)
        .ok_or_else(|| DataError::MissingColumn {
            path: path.display().to_string(),
            column: column.to_string(),
        })
}

/// Writes a header and rows to a delimited file, creating parent directories.
pub(crate) fn write_csv<I>(path: &Path, delimiter: u8, header: &[&str], rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    writer.write_record(header)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2019, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_parse_stamp() {
        assert_eq!(parse_stamp("2019010105").unwrap(), ts(1, 5));
        assert_eq!(parse_stamp(" 2019010223:00 ").unwrap(), ts(2, 23));
        assert!(parse_stamp("20190101").is_err());
        assert!(parse_stamp("2019013124x").is_err());
        assert!(parse_stamp("2019023012").is_err());
        assert_eq!(format_stamp(&ts(3, 7)), "2019010307");
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("12,5"), Some(12.5));
        assert_eq!(parse_decimal(" -999 "), Some(-999.0));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("n/a"), None);
    }

    #[test]
    fn test_series_sorted_and_unique() {
        let series =
            HourlySeries::new("t", vec![(ts(1, 2), 2.0), (ts(1, 0), 0.0), (ts(1, 1), 1.0)])
                .unwrap();
        assert_eq!(series.values(), vec![0.0, 1.0, 2.0]);
        assert_eq!(series.get(&ts(1, 1)), Some(1.0));
        assert_eq!(series.get(&ts(1, 5)), None);

        let duplicate = HourlySeries::new("t", vec![(ts(1, 0), 0.0), (ts(1, 0), 1.0)]);
        assert!(matches!(
            duplicate,
            Err(DataError::DuplicateTimestamp { .. })
        ));
    }

    #[test]
    fn test_statistics() {
        let series =
            HourlySeries::new("q", vec![(ts(1, 0), 0.0), (ts(1, 1), 4.0), (ts(1, 2), 2.0)])
                .unwrap();
        let stats = series.stats().unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.sum, 6.0);
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.min, 0.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(series.count_where(|v| v == 0.0), 1);
        assert!(HourlySeries::new("e", vec![]).unwrap().stats().is_none());
    }

    #[test]
    fn test_filter_year() {
        let last = NaiveDate::from_ymd_opt(2018, 12, 31)
            .unwrap()
            .and_hms_opt(23, 0, 0)
            .unwrap();
        let series = HourlySeries::new("t", vec![(last, 1.0), (ts(1, 0), 2.0)])
            .unwrap()
            .filter_year(2019);
        assert_eq!(series.values(), vec![2.0]);
    }

    #[test]
    fn test_align_intersection() {
        let a = HourlySeries::new("a", vec![(ts(1, 0), 1.0), (ts(1, 1), 2.0), (ts(1, 2), 3.0)])
            .unwrap();
        let b = HourlySeries::new("b", vec![(ts(1, 1), 20.0), (ts(1, 2), 30.0), (ts(1, 3), 40.0)])
            .unwrap();
        let aligned = align(&[&a, &b]).unwrap();
        assert_eq!(aligned.snapshots, vec![ts(1, 1), ts(1, 2)]);
        assert_eq!(aligned.values, vec![vec![2.0, 3.0], vec![20.0, 30.0]]);
        assert_eq!(a.name(), "a");

        let c = HourlySeries::new("c", vec![(ts(2, 0), 1.0)]).unwrap();
        assert!(matches!(
            align(&[&a, &c]),
            Err(DataError::EmptyIntersection)
        ));
        assert!(align(&[]).is_err());
    }
}
