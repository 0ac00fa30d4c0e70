use std::path::Path;

use anyhow::Result;
use greenhouse_model::technology::HeatPumpParameters;
use tracing::info;

use crate::derive::heat_load::{TEMPERATURE_COLUMN, TIME_COLUMN, read_derived_column};
use crate::general::timeseries::{HourlySeries, format_stamp, write_csv};

pub const COP_COLUMN: &str = "COP";

#[derive(Debug, Clone, PartialEq)]
pub struct CopResult {
    pub temperature: HourlySeries,
    pub cop: HourlySeries,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CopSummary {
    pub hours: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Hourly COP with the ambient air as heat source.
pub fn compute_cop(heat_pump: &HeatPumpParameters, temperature_c: &HourlySeries) -> CopResult {
    let cop = temperature_c.map("cop", |ambient| heat_pump.cop(ambient));
    info!("COP computed for {} hours", cop.len());
    CopResult {
        temperature: temperature_c.clone(),
        cop,
    }
}

impl CopResult {
    pub fn summary(&self) -> CopSummary {
        CopSummary {
            hours: self.cop.len(),
            mean: self.cop.mean().unwrap_or(0.0),
            min: self.cop.min().unwrap_or(0.0),
            max: self.cop.max().unwrap_or(0.0),
        }
    }
}

pub fn write_cop(path: &Path, result: &CopResult) -> Result<()> {
    let rows = result.cop.points().iter().map(|(timestamp, cop)| {
        vec![
            format_stamp(timestamp),
            result
                .temperature
                .get(timestamp)
                .unwrap_or(f64::NAN)
                .to_string(),
            cop.to_string(),
        ]
    });
    write_csv(
        path,
        b',',
        &[TIME_COLUMN, TEMPERATURE_COLUMN, COP_COLUMN],
        rows,
    )?;
    info!("COP written to {}", path.display());
    Ok(())
}

pub fn read_cop(path: &Path) -> Result<HourlySeries> {
    read_derived_column(path, COP_COLUMN, "cop")
}
