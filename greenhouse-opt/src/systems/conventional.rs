//! Conventional supply: grid electricity for the lamps and a gas boiler for heat.

use good_lp::Solver;
use greenhouse_model::system::ConventionalParameters;
use tracing::info;

use super::{
    BUS_ELECTRICITY, BUS_GAS, BUS_HEAT, GAS_BOILER, GAS_SUPPLY, GRID_IMPORT, HEAT_STORE,
    LOAD_ELECTRICITY, LOAD_HEAT, LevelStats, SystemInputs, invalid_system,
};
use crate::error::NetworkError;
use crate::network::solution::NetworkSolution;
use crate::network::{Generator, Link, Network, Store};

#[derive(Debug, Clone, PartialEq)]
pub struct ConventionalSummary {
    pub objective: f64,
    pub grid_import_kwh: f64,
    pub electricity_load_kwh: f64,
    pub heat_load_kwh: f64,
    pub boiler_heat_kwh: f64,
    pub gas_used_kwh: f64,
    /// Built boiler capacity (kW).
    pub boiler_capacity_kw: Option<f64>,
    pub heat_store_capacity_kwh: Option<f64>,
    pub heat_store_level: Option<LevelStats>,
    pub electricity_cost: f64,
    pub gas_cost: f64,
    pub operational_cost: f64,
    pub annual_investment: f64,
    pub total_annual_cost: f64,
}

pub fn build(
    inputs: &SystemInputs,
    params: &ConventionalParameters,
) -> Result<Network, NetworkError> {
    params
        .validate()
        .map_err(|e| invalid_system("conventional", e))?;

    let mut network = Network::new(inputs.snapshots.clone())?;
    network.add_bus(BUS_ELECTRICITY, "strom")?;
    network.add_bus(BUS_HEAT, "waerme")?;
    network.add_bus(BUS_GAS, "gas")?;

    network.add_load(
        LOAD_ELECTRICITY,
        BUS_ELECTRICITY,
        inputs.electricity_demand_kw.clone(),
    )?;
    network.add_load(LOAD_HEAT, BUS_HEAT, inputs.heat_demand_kw.clone())?;

    network.add_generator(
        Generator::new(GRID_IMPORT, BUS_ELECTRICITY)
            .with_capacity(params.grid_capacity)
            .with_marginal_cost(params.grid_price)
            .with_carrier("grid"),
    )?;
    network.add_generator(
        Generator::new(GAS_SUPPLY, BUS_GAS)
            .with_capacity(params.gas_supply_capacity)
            .with_marginal_cost(params.gas_price)
            .with_carrier("gas"),
    )?;
    network.add_link(
        Link::new(GAS_BOILER, BUS_GAS, BUS_HEAT)
            .with_capacity(params.boiler_capacity)
            .with_efficiency(params.boiler_efficiency)
            .with_capital_cost(params.boiler_capital_cost),
    )?;

    if let Some(store) = &params.heat_store {
        network.add_store(
            Store::new(HEAT_STORE, BUS_HEAT)
                .with_energy_capacity(store.capacity)
                .with_capital_cost(store.capital_cost)
                .with_standing_loss(store.standing_loss)
                .cyclic(store.cyclic),
        )?;
    }

    let counts = network.counts();
    info!(
        "Conventional network built: {} buses, {} generators, {} links, {} stores, {} snapshots",
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
    params: &ConventionalParameters,
) -> Result<ConventionalSummary, NetworkError> {
    let boiler = solution.link(GAS_BOILER)?;
    let heat_store = solution.stores.get(HEAT_STORE);

    let grid_import_kwh = solution.generator_energy(GRID_IMPORT);
    let gas_used_kwh = solution.link_input_energy(GAS_BOILER);
    let electricity_cost = grid_import_kwh * params.grid_price;
    let gas_cost = gas_used_kwh * params.gas_price;
    let operational_cost = electricity_cost + gas_cost;
    let annual_investment = solution.annual_capital_cost();

    Ok(ConventionalSummary {
        objective: solution.objective,
        grid_import_kwh,
        electricity_load_kwh: solution.load_energy(LOAD_ELECTRICITY),
        heat_load_kwh: solution.load_energy(LOAD_HEAT),
        boiler_heat_kwh: solution.link_output_energy(GAS_BOILER),
        gas_used_kwh,
        boiler_capacity_kw: boiler.p_nom_opt,
        heat_store_capacity_kwh: heat_store.and_then(|s| s.e_nom_opt),
        heat_store_level: heat_store.map(|s| LevelStats::from_levels(&s.e)),
        electricity_cost,
        gas_cost,
        operational_cost,
        annual_investment,
        total_annual_cost: operational_cost + annual_investment,
    })
}

/// Builds, solves and summarizes the conventional system.
pub fn run<S: Solver>(
    inputs: &SystemInputs,
    params: &ConventionalParameters,
    solver: S,
) -> Result<(NetworkSolution, ConventionalSummary), NetworkError> {
    let network = build(inputs, params)?;
    let solution = network.optimize(solver)?;
    let summary = summarize(&solution, params)?;
    info!(
        "Conventional system: operational cost {:.2} EUR, total {:.2} EUR/a",
        summary.operational_cost, summary.total_annual_cost
    );
    Ok((solution, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::test_support::{assert_close, inputs};
    use good_lp::clarabel;
    use greenhouse_model::Capacity;
    use greenhouse_model::system::StoreParameters;

    #[test]
    fn test_baseline_sizes_boiler_for_peak() {
        let inputs = inputs(vec![95.0, 47.5, 19.0], vec![10.0, 20.0, 30.0]);
        let params = ConventionalParameters::baseline();

        let (solution, summary) = run(&inputs, &params, clarabel).unwrap();

        assert_close(summary.grid_import_kwh, 60.0);
        assert_close(summary.gas_used_kwh, 170.0);
        assert_close(summary.boiler_heat_kwh, 161.5);
        assert_close(summary.heat_load_kwh, 161.5);
        assert_close(summary.boiler_capacity_kw.unwrap(), 100.0);
        assert_close(summary.electricity_cost, 60.0 * 0.1361);
        assert_close(summary.gas_cost, 5.1);
        assert_close(summary.annual_investment, 700.0);
        assert_close(summary.total_annual_cost, 713.266);
        assert_close(solution.objective, 713.266);
        assert_eq!(summary.heat_store_capacity_kwh, None);
        assert!(solution.generator(GRID_IMPORT).unwrap().p_nom_opt.is_none());
        assert_eq!(
            solution.load(LOAD_ELECTRICITY).unwrap(),
            &[10.0, 20.0, 30.0]
        );
    }

    #[test]
    fn test_network_topology() {
        let inputs = inputs(vec![10.0, 20.0], vec![1.0, 2.0]);
        let network = build(&inputs, &ConventionalParameters::baseline()).unwrap();

        assert_eq!(network.snapshots(), inputs.snapshots.as_slice());
        let carriers: Vec<&str> = network
            .buses()
            .values()
            .map(|bus| bus.carrier.as_str())
            .collect();
        assert_eq!(carriers, ["strom", "waerme", "gas"]);
        assert_eq!(network.loads()[LOAD_HEAT].bus, BUS_HEAT);
        assert_eq!(network.loads()[LOAD_HEAT].p_set, vec![10.0, 20.0]);

        let gas = &network.generators()[GAS_SUPPLY];
        assert_eq!(gas.bus, BUS_GAS);
        assert_eq!(gas.carrier, "gas");
        let boiler = &network.links()[GAS_BOILER];
        assert_eq!((boiler.bus0.as_str(), boiler.bus1.as_str()), (BUS_GAS, BUS_HEAT));
        assert!(network.stores().is_empty());
    }

    #[test]
    fn test_heat_store_shaves_boiler_peak() {
        let inputs = inputs(vec![95.0, 0.0], vec![0.0, 0.0]);
        let params = ConventionalParameters {
            heat_store: Some(StoreParameters {
                capacity: Capacity::extendable(),
                capital_cost: 1.0,
                standing_loss: 0.0,
                cyclic: true,
            }),
            ..ConventionalParameters::baseline()
        };

        let (solution, summary) = run(&inputs, &params, clarabel).unwrap();

        assert_close(summary.boiler_capacity_kw.unwrap(), 50.0);
        assert_close(summary.heat_store_capacity_kwh.unwrap(), 47.5);
        assert_close(summary.gas_used_kwh, 100.0);
        assert_close(summary.annual_investment, 397.5);
        assert_close(solution.objective, 400.5);

        let store = solution.store(HEAT_STORE).unwrap();
        assert_close(store.p[0], 47.5);
        assert_close(store.p[1], -47.5);
        let level = summary.heat_store_level.unwrap();
        assert_close(level.max_kwh, 47.5);
    }

    #[test]
    fn test_fixed_boiler_too_small_is_infeasible() {
        let inputs = inputs(vec![95.0], vec![0.0]);
        let params = ConventionalParameters {
            boiler_capacity: Capacity::fixed(10.0),
            ..ConventionalParameters::baseline()
        };
        assert!(matches!(
            run(&inputs, &params, clarabel),
            Err(NetworkError::Solve(_))
        ));
    }

    #[test]
    fn test_invalid_efficiency_rejected() {
        let inputs = inputs(vec![1.0], vec![1.0]);
        let params = ConventionalParameters {
            boiler_efficiency: 1.5,
            ..ConventionalParameters::baseline()
        };
        assert!(matches!(
            build(&inputs, &params),
            Err(NetworkError::InvalidParameter { .. })
        ));
    }
}
