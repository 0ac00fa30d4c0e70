//! Future supply: wind power for own use and export, a heat pump and storage.

use good_lp::Solver;
use greenhouse_model::system::{FutureParameters, StoreParameters};
use tracing::{info, warn};

use super::{
    BUS_ELECTRICITY, BUS_HEAT, BUS_WIND, ELECTRICITY_STORE, GRID_EXPORT, GRID_IMPORT, HEAT_PUMP,
    HEAT_STORE, LOAD_ELECTRICITY, LOAD_HEAT, LevelStats, SystemInputs, WIND_SELF_USE,
    WIND_TURBINE, invalid_system,
};
use crate::error::NetworkError;
use crate::network::solution::NetworkSolution;
use crate::network::{Generator, Link, Network, Store};

#[derive(Debug, Clone, PartialEq)]
pub struct FutureSummary {
    pub objective: f64,
    pub wind_generation_kwh: f64,
    pub wind_self_use_kwh: f64,
    pub grid_export_kwh: f64,
    pub grid_import_kwh: f64,
    pub heat_pump_electricity_kwh: f64,
    pub heat_pump_heat_kwh: f64,
    pub electricity_load_kwh: f64,
    pub heat_load_kwh: f64,
    pub import_cost: f64,
    pub export_revenue: f64,
    /// Import cost minus export revenue.
    pub net_grid_cost: f64,
    pub wind_capacity_kw: Option<f64>,
    pub heat_pump_capacity_kw: Option<f64>,
    pub heat_store_capacity_kwh: Option<f64>,
    pub electricity_store_capacity_kwh: Option<f64>,
    pub heat_store_level: Option<LevelStats>,
    pub electricity_store_level: Option<LevelStats>,
    /// Share of own wind in the electricity taken from wind and grid, in percent.
    pub self_sufficiency_percent: f64,
    /// Heat delivered per unit of heat pump electricity.
    pub realized_cop: f64,
    pub operational_cost: f64,
    pub annual_investment: f64,
    pub total_annual_cost: f64,
}

/// Turbine output relative to the nameplate rating, clipped to [0, 1].
pub fn wind_availability(wind_kw: &[f64], nameplate_kw: f64) -> Vec<f64> {
    wind_kw
        .iter()
        .map(|p| (p / nameplate_kw).clamp(0.0, 1.0))
        .collect()
}

fn add_store(
    network: &mut Network,
    name: &str,
    bus: &str,
    params: &StoreParameters,
) -> Result<(), NetworkError> {
    network.add_store(
        Store::new(name, bus)
            .with_energy_capacity(params.capacity)
            .with_capital_cost(params.capital_cost)
            .with_standing_loss(params.standing_loss)
            .cyclic(params.cyclic),
    )
}

pub fn build(inputs: &SystemInputs, params: &FutureParameters) -> Result<Network, NetworkError> {
    params.validate().map_err(|e| invalid_system("future", e))?;
    let cop = inputs.require_cop()?;
    let wind_kw = inputs.require_wind()?;

    let p_max_pu = wind_availability(wind_kw, params.wind.nameplate_kw);
    let clipped = wind_kw
        .iter()
        .filter(|p| **p < 0.0 || **p > params.wind.nameplate_kw)
        .count();
    if clipped > 0 {
        warn!(
            "{clipped} wind values outside [0, {}] kW were clipped",
            params.wind.nameplate_kw
        );
    }

    let mut network = Network::new(inputs.snapshots.clone())?;
    network.add_bus(BUS_ELECTRICITY, "strom")?;
    network.add_bus(BUS_WIND, "wind")?;
    network.add_bus(BUS_HEAT, "waerme")?;

    network.add_load(
        LOAD_ELECTRICITY,
        BUS_ELECTRICITY,
        inputs.electricity_demand_kw.clone(),
    )?;
    network.add_load(LOAD_HEAT, BUS_HEAT, inputs.heat_demand_kw.clone())?;

    network.add_generator(
        Generator::new(WIND_TURBINE, BUS_WIND)
            .with_capacity(params.wind.capacity)
            .with_p_max_pu(p_max_pu)
            .with_marginal_cost(params.wind.marginal_cost)
            .with_capital_cost(params.wind.capital_cost)
            .with_carrier("wind"),
    )?;
    if let Some(export) = &params.grid_export {
        network.add_generator(
            Generator::new(GRID_EXPORT, BUS_WIND)
                .with_capacity(export.capacity)
                .with_marginal_cost(-export.revenue)
                .as_sink()
                .with_carrier("grid_export"),
        )?;
    }
    network.add_link(
        Link::new(WIND_SELF_USE, BUS_WIND, BUS_ELECTRICITY)
            .with_capacity(params.wind_self_use_capacity),
    )?;
    network.add_link(
        Link::new(HEAT_PUMP, BUS_ELECTRICITY, BUS_HEAT)
            .with_capacity(params.heat_pump.capacity)
            .with_efficiency(cop.to_vec())
            .with_marginal_cost(params.heat_pump.marginal_cost)
            .with_capital_cost(params.heat_pump.capital_cost),
    )?;
    if let Some(store) = &params.electricity_store {
        add_store(&mut network, ELECTRICITY_STORE, BUS_ELECTRICITY, store)?;
    }
    if let Some(store) = &params.heat_store {
        add_store(&mut network, HEAT_STORE, BUS_HEAT, store)?;
    }
    network.add_generator(
        Generator::new(GRID_IMPORT, BUS_ELECTRICITY)
            .with_capacity(params.grid_import_capacity)
            .with_marginal_cost(params.grid_import_price)
            .with_carrier("grid"),
    )?;

    let counts = network.counts();
    info!(
        "Future network built: {} buses, {} generators, {} links, {} stores, {} snapshots",
        counts.buses,
        counts.generators,
        counts.links,
        counts.stores,
        network.snapshot_count()
    );
    Ok(network)
}

pub fn summarize(
    solution: &NetworkSolution,
    params: &FutureParameters,
) -> Result<FutureSummary, NetworkError> {
    let wind = solution.generator(WIND_TURBINE)?;
    let heat_pump = solution.link(HEAT_PUMP)?;
    let heat_store = solution.stores.get(HEAT_STORE);
    let electricity_store = solution.stores.get(ELECTRICITY_STORE);

    let wind_self_use_kwh = solution.link_input_energy(WIND_SELF_USE);
    let grid_import_kwh = solution.generator_energy(GRID_IMPORT);
    let grid_export_kwh = solution.generator_energy(GRID_EXPORT);
    let heat_pump_electricity_kwh = solution.link_input_energy(HEAT_PUMP);
    let heat_pump_heat_kwh = solution.link_output_energy(HEAT_PUMP);

    let import_cost = grid_import_kwh * params.grid_import_price;
    let export_revenue = params
        .grid_export
        .as_ref()
        .map_or(0.0, |export| grid_export_kwh * export.revenue);
    let net_grid_cost = import_cost - export_revenue;

    let supplied = wind_self_use_kwh + grid_import_kwh;
    let self_sufficiency_percent = if supplied > 0.0 {
        wind_self_use_kwh / supplied * 100.0
    } else {
        0.0
    };
    let realized_cop = if heat_pump_electricity_kwh > 0.0 {
        heat_pump_heat_kwh / heat_pump_electricity_kwh
    } else {
        0.0
    };
    let annual_investment = solution.annual_capital_cost();

    Ok(FutureSummary {
        objective: solution.objective,
        wind_generation_kwh: wind.p.iter().sum(),
        wind_self_use_kwh,
        grid_export_kwh,
        grid_import_kwh,
        heat_pump_electricity_kwh,
        heat_pump_heat_kwh,
        electricity_load_kwh: solution.load_energy(LOAD_ELECTRICITY),
        heat_load_kwh: solution.load_energy(LOAD_HEAT),
        import_cost,
        export_revenue,
        net_grid_cost,
        wind_capacity_kw: wind.p_nom_opt,
        heat_pump_capacity_kw: heat_pump.p_nom_opt,
        heat_store_capacity_kwh: heat_store.and_then(|s| s.e_nom_opt),
        electricity_store_capacity_kwh: electricity_store.and_then(|s| s.e_nom_opt),
        heat_store_level: heat_store.map(|s| LevelStats::from_levels(&s.e)),
        electricity_store_level: electricity_store.map(|s| LevelStats::from_levels(&s.e)),
        self_sufficiency_percent,
        realized_cop,
        operational_cost: net_grid_cost,
        annual_investment,
        total_annual_cost: net_grid_cost + annual_investment,
    })
}

/// Builds, solves and summarizes the future system.
pub fn run<S: Solver>(
    inputs: &SystemInputs,
    params: &FutureParameters,
    solver: S,
) -> Result<(NetworkSolution, FutureSummary), NetworkError> {
    let network = build(inputs, params)?;
    let solution = network.optimize(solver)?;
    let summary = summarize(&solution, params)?;
    info!(
        "Future system: net grid cost {:.2} EUR, self-sufficiency {:.1} %",
        summary.net_grid_cost, summary.self_sufficiency_percent
    );
    Ok((solution, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Profile;
    use crate::systems::test_support::{assert_close, inputs};
    use good_lp::clarabel;
    use greenhouse_model::Capacity;
    use greenhouse_model::system::{GridExportParameters, HeatPumpUnit, WindPlant};

    fn small_fleet() -> FutureParameters {
        FutureParameters {
            wind: WindPlant {
                nameplate_kw: 100.0,
                capacity: Capacity::fixed(100.0),
                marginal_cost: 0.0,
                capital_cost: 0.0,
            },
            wind_self_use_capacity: Capacity::fixed(100.0),
            heat_pump: HeatPumpUnit {
                capacity: Capacity::fixed(100.0),
                marginal_cost: 0.0,
                capital_cost: 0.0,
            },
            heat_store: None,
            electricity_store: None,
            grid_import_price: 1.0,
            grid_import_capacity: Capacity::Unbounded,
            grid_export: Some(GridExportParameters {
                revenue: 0.5,
                capacity: Capacity::fixed(100.0),
            }),
        }
    }

    fn small_inputs() -> SystemInputs {
        let mut inputs = inputs(vec![30.0, 30.0], vec![10.0, 10.0]);
        inputs.cop = Some(vec![3.0, 3.0]);
        inputs.wind_kw = Some(vec![50.0, 0.0]);
        inputs
    }

    #[test]
    fn test_wind_availability_is_clipped() {
        assert_eq!(
            wind_availability(&[-5.0, 0.0, 300.0, 700.0], 600.0),
            vec![0.0, 0.0, 0.5, 1.0]
        );
    }

    #[test]
    fn test_network_topology() {
        let network = build(&small_inputs(), &small_fleet()).unwrap();

        let carriers: Vec<&str> = network
            .buses()
            .values()
            .map(|bus| bus.carrier.as_str())
            .collect();
        assert_eq!(carriers, ["strom", "wind", "waerme"]);
        assert_eq!(
            network.generators().keys().collect::<Vec<_>>(),
            [WIND_TURBINE, GRID_EXPORT, GRID_IMPORT]
        );

        let wind = &network.generators()[WIND_TURBINE];
        assert_eq!(wind.carrier, "wind");
        assert_eq!(wind.p_max_pu, Profile::Series(vec![0.5, 0.0]));
        let export = &network.generators()[GRID_EXPORT];
        assert_eq!(export.sign, -1.0);
        assert_eq!(export.marginal_cost, -0.5);
        assert_eq!(export.carrier, "grid_export");

        let heat_pump = &network.links()[HEAT_PUMP];
        assert_eq!(heat_pump.bus0, BUS_ELECTRICITY);
        assert_eq!(heat_pump.efficiency, Profile::Series(vec![3.0, 3.0]));
        assert!(network.stores().is_empty());
        assert_eq!(network.loads()[LOAD_ELECTRICITY].p_set, vec![10.0, 10.0]);
    }

    #[test]
    fn test_fixed_fleet_has_no_investment() {
        let mut inputs = small_inputs();
        inputs.wind_kw = Some(vec![3000.0, 0.0]);
        let (_, summary) = run(&inputs, &FutureParameters::fixed_fleet(), clarabel).unwrap();

        assert_eq!(summary.annual_investment, 0.0);
        assert_close(summary.total_annual_cost, summary.net_grid_cost);
        assert_eq!(summary.wind_capacity_kw, Some(6000.0));
    }

    #[test]
    fn test_surplus_wind_is_exported() {
        let (solution, summary) = run(&small_inputs(), &small_fleet(), clarabel).unwrap();

        assert_close(summary.wind_generation_kwh, 50.0);
        assert_close(summary.wind_self_use_kwh, 20.0);
        assert_close(summary.grid_export_kwh, 30.0);
        assert_close(summary.grid_import_kwh, 20.0);
        assert_close(summary.heat_pump_electricity_kwh, 20.0);
        assert_close(summary.heat_pump_heat_kwh, 60.0);
        assert_close(summary.import_cost, 20.0);
        assert_close(summary.export_revenue, 15.0);
        assert_close(summary.net_grid_cost, 5.0);
        assert_close(solution.objective, 5.0);
        assert_close(summary.self_sufficiency_percent, 50.0);
        assert_close(summary.realized_cop, 3.0);
        assert_eq!(summary.annual_investment, 0.0);
        assert_eq!(summary.heat_store_level, None);
    }

    #[test]
    fn test_without_export_wind_is_curtailed() {
        let params = FutureParameters {
            grid_export: None,
            ..small_fleet()
        };
        let (_, summary) = run(&small_inputs(), &params, clarabel).unwrap();

        assert_close(summary.wind_self_use_kwh, 20.0);
        assert_close(summary.grid_export_kwh, 0.0);
        assert_close(summary.net_grid_cost, 20.0);
    }

    #[test]
    fn test_heat_store_moves_wind_heat() {
        let params = FutureParameters {
            grid_export: None,
            heat_store: Some(StoreParameters {
                capacity: Capacity::fixed(100.0),
                capital_cost: 0.0,
                standing_loss: 0.0,
                cyclic: true,
            }),
            ..small_fleet()
        };
        let (solution, summary) = run(&small_inputs(), &params, clarabel).unwrap();

        // 10 kW lamps at night must still come from the grid
        assert_close(summary.grid_import_kwh, 10.0);
        assert_close(solution.objective, 10.0);
        assert_close(summary.heat_pump_heat_kwh, 60.0);
        assert_close(summary.wind_self_use_kwh, 30.0);
        assert_close(summary.self_sufficiency_percent, 75.0);
        assert!(summary.heat_store_level.is_some());
    }

    #[test]
    fn test_missing_series_is_reported() {
        let mut inputs = small_inputs();
        inputs.wind_kw = None;
        assert!(matches!(
            build(&inputs, &small_fleet()),
            Err(NetworkError::MissingSeries("wind_kw"))
        ));

        inputs.cop = None;
        assert!(matches!(
            build(&inputs, &small_fleet()),
            Err(NetworkError::MissingSeries("cop"))
        ));
    }
}
