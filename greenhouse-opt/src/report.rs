//! Plain-text result blocks with right-aligned numeric columns.

use greenhouse_model::technology::{InvestmentCost, RotorParameters, TurbineCostInputs};

use crate::derive::cop::CopSummary;
use crate::derive::heat_load::HeatLoadSummary;
use crate::derive::lamp::LampSummary;
use crate::derive::solar_prep::SolarMergeStats;
use crate::general::timeseries::HourlySeries;
use crate::systems::comparison::{Comparison, SystemCosts};
use crate::systems::conventional::ConventionalSummary;
use crate::systems::future::FutureSummary;
use crate::systems::{InputOverview, LevelStats};

const LABEL_WIDTH: usize = 34;
const VALUE_WIDTH: usize = 14;
const RULE_WIDTH: usize = 60;

struct Block(String);

impl Block {
    fn new(title: &str) -> Self {
        let rule = "=".repeat(RULE_WIDTH);
        Self(format!("{rule}\n{title}\n{rule}\n"))
    }

    fn section(&mut self, title: &str) -> &mut Self {
        self.0.push_str(&format!("\n{title}\n"));
        self
    }

    fn value(&mut self, label: &str, value: f64, unit: &str) -> &mut Self {
        self.0.push_str(&format!(
            "  {label:<LABEL_WIDTH$}{value:>VALUE_WIDTH$.2} {unit}\n"
        ));
        self
    }

    fn count(&mut self, label: &str, value: usize, unit: &str) -> &mut Self {
        self.0.push_str(&format!(
            "  {label:<LABEL_WIDTH$}{value:>VALUE_WIDTH$} {unit}\n"
        ));
        self
    }

    fn text(&mut self, label: &str, value: &str) -> &mut Self {
        self.0.push_str(&format!("  {label:<LABEL_WIDTH$}{value:>VALUE_WIDTH$}\n"));
        self
    }

    fn optional(&mut self, label: &str, value: Option<f64>, unit: &str) -> &mut Self {
        match value {
            Some(value) => self.value(label, value, unit),
            None => self.text(label, "unbounded"),
        }
    }

    fn levels(&mut self, title: &str, levels: Option<LevelStats>) -> &mut Self {
        if let Some(levels) = levels {
            self.section(title)
                .value("Mean level", levels.mean_kwh, "kWh")
                .value("Max level", levels.max_kwh, "kWh")
                .value("Min level", levels.min_kwh, "kWh");
        }
        self
    }

    fn finish(self) -> String {
        self.0
    }
}

pub fn input_overview(overview: &InputOverview) -> String {
    let mut block = Block::new("MODEL INPUTS");
    block.count("Snapshots", overview.hours, "h");
    if let (Some(first), Some(last)) = (overview.first, overview.last) {
        block.text("First snapshot", &first.format("%Y-%m-%d %H:%M").to_string());
        block.text("Last snapshot", &last.format("%Y-%m-%d %H:%M").to_string());
    }
    block
        .section("Heat demand")
        .value("Mean", overview.heat_mean_kw, "kW")
        .value("Max", overview.heat_max_kw, "kW")
        .value("Min", overview.heat_min_kw, "kW")
        .section("Electricity demand")
        .value("Mean", overview.electricity_mean_kw, "kW")
        .value("Max", overview.electricity_max_kw, "kW");
    if let Some(cop) = overview.cop_mean {
        block.section("Heat pump").value("Mean COP", cop, "");
    }
    if let (Some(mean), Some(max)) = (overview.wind_mean_kw, overview.wind_max_kw) {
        block
            .section("Wind turbine")
            .value("Mean output", mean, "kW")
            .value("Max output", max, "kW");
    }
    block.finish()
}

pub fn conventional_report(summary: &ConventionalSummary) -> String {
    let mut block = Block::new("CONVENTIONAL SYSTEM");
    block
        .section("Electricity")
        .value("Grid import", summary.grid_import_kwh, "kWh")
        .value("Lamp demand", summary.electricity_load_kwh, "kWh")
        .section("Heat")
        .value("Boiler heat", summary.boiler_heat_kwh, "kWh")
        .value("Heat demand", summary.heat_load_kwh, "kWh")
        .value("Gas used", summary.gas_used_kwh, "kWh")
        .section("Capacities")
        .optional("Gas boiler", summary.boiler_capacity_kw, "kW");
    if summary.heat_store_level.is_some() {
        block.optional("Heat store", summary.heat_store_capacity_kwh, "kWh");
    }
    block
        .levels("Heat store", summary.heat_store_level)
        .section("Costs")
        .value("Electricity", summary.electricity_cost, "EUR")
        .value("Gas", summary.gas_cost, "EUR")
        .value("Operational", summary.operational_cost, "EUR")
        .value("Annual investment", summary.annual_investment, "EUR/a")
        .value("Total annual cost", summary.total_annual_cost, "EUR/a")
        .value("Objective", summary.objective, "EUR");
    block.finish()
}

pub fn future_report(summary: &FutureSummary) -> String {
    let mut block = Block::new("FUTURE SYSTEM");
    block
        .section("Wind")
        .value("Generation", summary.wind_generation_kwh, "kWh")
        .value("Own use", summary.wind_self_use_kwh, "kWh")
        .value("Grid export", summary.grid_export_kwh, "kWh")
        .section("Electricity")
        .value("Grid import", summary.grid_import_kwh, "kWh")
        .value("Lamp demand", summary.electricity_load_kwh, "kWh")
        .value("Heat pump input", summary.heat_pump_electricity_kwh, "kWh")
        .value("Self-sufficiency", summary.self_sufficiency_percent, "%")
        .section("Heat")
        .value("Heat pump output", summary.heat_pump_heat_kwh, "kWh")
        .value("Heat demand", summary.heat_load_kwh, "kWh")
        .value("Realized COP", summary.realized_cop, "")
        .section("Capacities")
        .optional("Wind turbine", summary.wind_capacity_kw, "kW")
        .optional("Heat pump", summary.heat_pump_capacity_kw, "kW");
    if summary.heat_store_level.is_some() {
        block.optional("Heat store", summary.heat_store_capacity_kwh, "kWh");
    }
    if summary.electricity_store_level.is_some() {
        block.optional(
            "Electricity store",
            summary.electricity_store_capacity_kwh,
            "kWh",
        );
    }
    block
        .levels("Heat store", summary.heat_store_level)
        .levels("Electricity store", summary.electricity_store_level)
        .section("Costs")
        .value("Grid import", summary.import_cost, "EUR")
        .value("Export revenue", summary.export_revenue, "EUR")
        .value("Net grid cost", summary.net_grid_cost, "EUR")
        .value("Annual investment", summary.annual_investment, "EUR/a")
        .value("Total annual cost", summary.total_annual_cost, "EUR/a")
        .value("Objective", summary.objective, "EUR");
    block.finish()
}

fn comparison_row(out: &mut String, label: &str, conventional: &str, future: &str, unit: &str) {
    out.push_str(&format!(
        "{label:<24}{conventional:>VALUE_WIDTH$}{future:>VALUE_WIDTH$}  {unit}\n"
    ));
}

fn cost_rows(out: &mut String, conventional: &SystemCosts, future: &SystemCosts) {
    let money = |value: f64| format!("{value:.2}");
    let gas = |costs: &SystemCosts| costs.gas_cost.map_or_else(|| "---".to_string(), money);

    comparison_row(
        out,
        "Grid import",
        &money(conventional.grid_import_kwh),
        &money(future.grid_import_kwh),
        "kWh",
    );
    comparison_row(
        out,
        "Import cost",
        &money(conventional.import_cost),
        &money(future.import_cost),
        "EUR",
    );
    comparison_row(out, "Gas cost", &gas(conventional), &gas(future), "EUR");
    comparison_row(
        out,
        "Operational cost",
        &money(conventional.operational_cost),
        &money(future.operational_cost),
        "EUR",
    );
    comparison_row(
        out,
        "Annual investment",
        &money(conventional.annual_investment),
        &money(future.annual_investment),
        "EUR/a",
    );
    comparison_row(
        out,
        "Total annual cost",
        &money(conventional.total_annual_cost),
        &money(future.total_annual_cost),
        "EUR/a",
    );
}

pub fn comparison_report(comparison: &Comparison) -> String {
    let mut out = Block::new("SYSTEM COMPARISON").finish();
    comparison_row(&mut out, "", "Conventional", "Future", "");
    out.push_str(&format!("{}\n", "-".repeat(RULE_WIDTH + 8)));
    cost_rows(&mut out, &comparison.conventional, &comparison.future);
    out.push_str(&format!("{}\n", "-".repeat(RULE_WIDTH + 8)));

    let verdict = if comparison.savings >= 0.0 {
        "Future system saves"
    } else {
        "Future system costs more"
    };
    out.push_str(&format!(
        "{verdict}: {:.2} EUR/a ({:.1} %)\n",
        comparison.savings.abs(),
        comparison.savings_percent.abs()
    ));
    out
}

pub fn heat_load_report(summary: &HeatLoadSummary) -> String {
    let mut block = Block::new("HEATING LOAD");
    block
        .count("Hours", summary.hours, "h")
        .value("Max load", summary.max_kw, "kW")
        .value("Mean load", summary.mean_kw, "kW")
        .value("Annual heat demand", summary.annual_kwh, "kWh")
        .count("Hours without demand", summary.hours_without_demand, "h");
    block.finish()
}

pub fn cop_report(summary: &CopSummary) -> String {
    let mut block = Block::new("HEAT PUMP COP");
    block
        .count("Hours", summary.hours, "h")
        .value("Mean COP", summary.mean, "")
        .value("Min COP", summary.min, "")
        .value("Max COP", summary.max, "");
    block.finish()
}

pub fn lamp_report(summary: &LampSummary) -> String {
    let mut block = Block::new("LAMP ELECTRICITY DEMAND");
    block
        .count("Lamps", summary.lamp_count as usize, "")
        .value("Installed power", summary.total_power_kw, "kW")
        .count("Hours", summary.hours, "h")
        .count("Hours with lamps on", summary.hours_on, "h")
        .value("Annual demand", summary.annual_kwh, "kWh")
        .value("Full-load hours", summary.full_load_hours, "h");
    block.finish()
}

pub fn solar_merge_report(stats: &SolarMergeStats) -> String {
    let mut block = Block::new("SOLAR DATA MERGE");
    block
        .count("Primary station", stats.primary, "h")
        .count("Fallback station", stats.fallback, "h")
        .count("Previous value repeated", stats.previous, "h")
        .count("Total", stats.total(), "h");
    block.finish()
}

/// Mean availability and full-load hours of a turbine output series.
pub fn wind_output_report(output_kw: &HourlySeries, nameplate_kw: f64) -> String {
    let mut block = Block::new("WIND TURBINE OUTPUT");
    let energy = output_kw.sum();
    let availability = output_kw
        .mean()
        .map_or(0.0, |mean| (mean / nameplate_kw).clamp(0.0, 1.0) * 100.0);
    block
        .count("Hours", output_kw.len(), "h")
        .value("Nameplate", nameplate_kw, "kW")
        .value("Generation", energy, "kWh")
        .value("Mean availability", availability, "%")
        .value("Full-load hours", energy / nameplate_kw, "h");
    block.finish()
}

pub fn wind_power_report(rotor: &RotorParameters, speeds: &[f64]) -> String {
    let mut block = Block::new("ROTOR POWER");
    block
        .value("Air density", rotor.air_density(), "kg/m3")
        .value("Rotor area", rotor.rotor_area(), "m2")
        .section("Extracted power");
    for speed in speeds {
        block.value(&format!("{speed:.1} m/s"), rotor.power_w(*speed) / 1000.0, "kW");
    }
    block.finish()
}

pub fn wind_cost_report(inputs: &TurbineCostInputs, cost: &InvestmentCost) -> String {
    let mut block = Block::new("TURBINE MAIN INVESTMENT COST");
    block
        .value("Rated power", inputs.rated_power_mw, "MW")
        .value("Specific rating", inputs.specific_rating_w_m2, "W/m2")
        .value("Hub height", inputs.hub_height_m, "m")
        .value("Specific cost", cost.specific_eur_per_kw, "EUR/kW")
        .value("Investment", cost.total_eur, "EUR");
    block.finish()
}
