//! Side-by-side cost comparison of the conventional and the future system.

use good_lp::Solver;
use greenhouse_model::system::{ConventionalParameters, FutureParameters};
use tracing::info;

use super::SystemInputs;
use super::conventional::{self, ConventionalSummary};
use super::future::{self, FutureSummary};
use crate::error::NetworkError;

/// Annual cost figures of one system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SystemCosts {
    pub grid_import_kwh: f64,
    pub import_cost: f64,
    /// `None` for systems without gas.
    pub gas_cost: Option<f64>,
    pub operational_cost: f64,
    pub annual_investment: f64,
    pub total_annual_cost: f64,
}

impl From<&ConventionalSummary> for SystemCosts {
    fn from(summary: &ConventionalSummary) -> Self {
        Self {
            grid_import_kwh: summary.grid_import_kwh,
            import_cost: summary.electricity_cost,
            gas_cost: Some(summary.gas_cost),
            operational_cost: summary.operational_cost,
            annual_investment: summary.annual_investment,
            total_annual_cost: summary.total_annual_cost,
        }
    }
}

impl From<&FutureSummary> for SystemCosts {
    fn from(summary: &FutureSummary) -> Self {
        Self {
            grid_import_kwh: summary.grid_import_kwh,
            import_cost: summary.import_cost,
            gas_cost: None,
            operational_cost: summary.operational_cost,
            annual_investment: summary.annual_investment,
            total_annual_cost: summary.total_annual_cost,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comparison {
    pub conventional: SystemCosts,
    pub future: SystemCosts,
    /// Conventional minus future total annual cost; positive if the future system is cheaper.
    pub savings: f64,
    /// Savings relative to the conventional total, 0 if that total is not positive.
    pub savings_percent: f64,
}

impl Comparison {
    pub fn new(conventional: SystemCosts, future: SystemCosts) -> Self {
        let savings = conventional.total_annual_cost - future.total_annual_cost;
        let savings_percent = if conventional.total_annual_cost > 0.0 {
            savings / conventional.total_annual_cost * 100.0
        } else {
            0.0
        };
        Self {
            conventional,
            future,
            savings,
            savings_percent,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComparisonOutcome {
    pub conventional: ConventionalSummary,
    pub future: FutureSummary,
    pub comparison: Comparison,
}

/// Optimizes both systems on the same inputs and compares their annual costs.
pub fn compare<S: Solver + Clone>(
    inputs: &SystemInputs,
    conventional_params: &ConventionalParameters,
    future_params: &FutureParameters,
    solver: S,
) -> Result<ComparisonOutcome, NetworkError> {
    info!("Optimizing conventional system over {} hours", inputs.len());
    let (_, conventional) = conventional::run(inputs, conventional_params, solver.clone())?;
    info!("Optimizing future system over {} hours", inputs.len());
    let (_, future) = future::run(inputs, future_params, solver)?;

    let comparison = Comparison::new((&conventional).into(), (&future).into());
    info!(
        "Annual savings of the future system: {:.2} EUR ({:.1} %)",
        comparison.savings, comparison.savings_percent
    );
    Ok(ComparisonOutcome {
        conventional,
        future,
        comparison,
    })
}
