use good_lp::{
    Expression, ProblemVariables, Solution, Solver, SolverModel, Variable, constraint, variable,
};
use greenhouse_model::Capacity;
use indexmap::IndexMap;
use tracing::{debug, info};

use crate::error::NetworkError;
use crate::network::Network;
use crate::network::solution::{GeneratorResult, LinkResult, NetworkSolution, StoreResult};

/// Nominal capacity as seen by the LP.
#[derive(Debug, Clone, Copy)]
enum Nominal {
    Fixed(f64),
    Unbounded,
    Optimized(Variable),
}

impl Nominal {
    fn new(vars: &mut ProblemVariables, capacity: &Capacity) -> Self {
        match *capacity {
            Capacity::Fixed { value } => Self::Fixed(value),
            Capacity::Unbounded => Self::Unbounded,
            Capacity::Extendable { min, max } => {
                let mut definition = variable().min(min);
                if let Some(max) = max {
                    definition = definition.max(max);
                }
                Self::Optimized(vars.add(definition))
            }
        }
    }

    /// Non-negative variable limited to `scale` times the capacity. For an optimized
    /// capacity the limit is added later by [`Nominal::limit`].
    fn bounded(self, vars: &mut ProblemVariables, scale: f64) -> Variable {
        match self {
            Self::Fixed(value) => vars.add(variable().min(0.0).max(scale * value)),
            Self::Unbounded | Self::Optimized(_) => vars.add(variable().min(0.0)),
        }
    }

    fn limit<M: SolverModel>(self, model: M, flow: Variable, scale: f64) -> M {
        match self {
            Self::Optimized(nominal) => model.with(constraint!(flow <= scale * nominal)),
            Self::Fixed(_) | Self::Unbounded => model,
        }
    }

    fn variable(self) -> Option<Variable> {
        match self {
            Self::Optimized(nominal) => Some(nominal),
            Self::Fixed(_) | Self::Unbounded => None,
        }
    }

    fn value(self, solution: &impl Solution) -> Option<f64> {
        match self {
            Self::Fixed(value) => Some(value),
            Self::Unbounded => None,
            Self::Optimized(nominal) => Some(solution.value(nominal)),
        }
    }
}

struct GeneratorVariables {
    nominal: Nominal,
    p: Vec<Variable>,
}

struct LinkVariables {
    nominal: Nominal,
    p0: Vec<Variable>,
}

struct StoreVariables {
    nominal: Nominal,
    e: Vec<Variable>,
    p: Vec<Variable>,
}

struct NetworkVariables {
    generators: Vec<GeneratorVariables>,
    links: Vec<LinkVariables>,
    stores: Vec<StoreVariables>,
}

impl Network {
    fn bus_index(&self, component: &'static str, name: &str, bus: &str) -> Result<usize, NetworkError> {
        self.buses
            .get_index_of(bus)
            .ok_or_else(|| NetworkError::UnknownBus {
                component,
                name: name.to_string(),
                bus: bus.to_string(),
            })
    }

    fn add_variables(&self, vars: &mut ProblemVariables) -> NetworkVariables {
        let n = self.snapshot_count();

        let mut generators = Vec::with_capacity(self.generators.len());
        for generator in self.generators.values() {
            let nominal = Nominal::new(vars, &generator.capacity);
            let mut p = Vec::with_capacity(n);
            for t in 0..n {
                p.push(nominal.bounded(vars, generator.p_max_pu.at(t)));
            }
            generators.push(GeneratorVariables { nominal, p });
        }

        let mut links = Vec::with_capacity(self.links.len());
        for link in self.links.values() {
            let nominal = Nominal::new(vars, &link.capacity);
            let mut p0 = Vec::with_capacity(n);
            for _ in 0..n {
                p0.push(nominal.bounded(vars, 1.0));
            }
            links.push(LinkVariables { nominal, p0 });
        }

        let mut stores = Vec::with_capacity(self.stores.len());
        for store in self.stores.values() {
            let nominal = Nominal::new(vars, &store.energy_capacity);
            let mut e = Vec::with_capacity(n);
            let mut p = Vec::with_capacity(n);
            for _ in 0..n {
                e.push(nominal.bounded(vars, 1.0));
                // dispatch is free in both directions
                p.push(vars.add(variable()));
            }
            stores.push(StoreVariables { nominal, e, p });
        }

        NetworkVariables {
            generators,
            links,
            stores,
        }
    }

    fn build_objective(&self, vars: &NetworkVariables) -> Expression {
        let mut objective = Expression::default();

        for (generator, v) in self.generators.values().zip(&vars.generators) {
            if generator.marginal_cost != 0.0 {
                for &p in &v.p {
                    objective += generator.marginal_cost * p;
                }
            }
            if let Some(nominal) = v.nominal.variable() {
                objective += generator.capital_cost * nominal;
            }
        }
        for (link, v) in self.links.values().zip(&vars.links) {
            if link.marginal_cost != 0.0 {
                for &p0 in &v.p0 {
                    objective += link.marginal_cost * p0;
                }
            }
            if let Some(nominal) = v.nominal.variable() {
                objective += link.capital_cost * nominal;
            }
        }
        for (store, v) in self.stores.values().zip(&vars.stores) {
            if store.marginal_cost != 0.0 {
                for &p in &v.p {
                    objective += store.marginal_cost * p;
                }
            }
            if let Some(nominal) = v.nominal.variable() {
                objective += store.capital_cost * nominal;
            }
        }

        objective
    }

    /// Capacity limits of optimized components and store continuity.
    fn add_component_constraints<M: SolverModel>(&self, mut model: M, vars: &NetworkVariables) -> M {
        for (generator, v) in self.generators.values().zip(&vars.generators) {
            for (t, &p) in v.p.iter().enumerate() {
                model = v.nominal.limit(model, p, generator.p_max_pu.at(t));
            }
        }

        for v in &vars.links {
            for &p0 in &v.p0 {
                model = v.nominal.limit(model, p0, 1.0);
            }
        }

        for (store, v) in self.stores.values().zip(&vars.stores) {
            let retention = 1.0 - store.standing_loss;
            let last = v.e.len() - 1;
            for t in 0..v.e.len() {
                model = v.nominal.limit(model, v.e[t], 1.0);

                // e[t] = retention * e[t-1] - p[t]
                let previous = if t > 0 {
                    Some(v.e[t - 1])
                } else if store.cyclic {
                    Some(v.e[last])
                } else {
                    None
                };
                model = match previous {
                    Some(previous) => model.with(constraint!(
                        v.e[t] - retention * previous + v.p[t] == 0.0
                    )),
                    None => model.with(constraint!(
                        v.e[t] + v.p[t] == retention * store.e_initial
                    )),
                };
            }
        }

        model
    }

    /// Energy balance of every bus in every snapshot.
    fn add_bus_balances<M: SolverModel>(
        &self,
        mut model: M,
        vars: &NetworkVariables,
    ) -> Result<M, NetworkError> {
        let n = self.snapshot_count();
        let mut balance = vec![vec![Expression::default(); n]; self.buses.len()];
        let mut attached = vec![false; self.buses.len()];

        for (generator, v) in self.generators.values().zip(&vars.generators) {
            let b = self.bus_index("generator", &generator.name, &generator.bus)?;
            attached[b] = true;
            for (t, &p) in v.p.iter().enumerate() {
                balance[b][t] += generator.sign * p;
            }
        }
        for (link, v) in self.links.values().zip(&vars.links) {
            let b0 = self.bus_index("link", &link.name, &link.bus0)?;
            let b1 = self.bus_index("link", &link.name, &link.bus1)?;
            attached[b0] = true;
            attached[b1] = true;
            for (t, &p0) in v.p0.iter().enumerate() {
                balance[b0][t] -= p0;
                balance[b1][t] += link.efficiency.at(t) * p0;
            }
        }
        for (store, v) in self.stores.values().zip(&vars.stores) {
            let b = self.bus_index("store", &store.name, &store.bus)?;
            attached[b] = true;
            for (t, &p) in v.p.iter().enumerate() {
                balance[b][t] += p;
            }
        }

        for ((bus, rows), attached) in self.buses.keys().zip(balance).zip(attached) {
            let demand = self.bus_demand(bus);
            if !attached && demand.iter().all(|d| *d == 0.0) {
                debug!("Bus {bus} has no components, skipping its balance");
                continue;
            }
            for (supply, demand) in rows.into_iter().zip(demand) {
                model = model.with(constraint!(supply == demand));
            }
        }

        Ok(model)
    }

    /// Solves the dispatch and capacity expansion problem with the given solver.
    pub fn optimize<S: Solver>(&self, solver: S) -> Result<NetworkSolution, NetworkError> {
        let counts = self.counts();
        info!(
            "Optimizing network: {} snapshots, {} buses, {} generators, {} links, {} stores, {} loads",
            self.snapshot_count(),
            counts.buses,
            counts.generators,
            counts.links,
            counts.stores,
            counts.loads
        );

        let mut problem = ProblemVariables::new();
        let vars = self.add_variables(&mut problem);
        let objective = self.build_objective(&vars);
        debug!(
            "LP built: {} generator, {} link and {} store variables per snapshot",
            vars.generators.len(),
            vars.links.len(),
            2 * vars.stores.len()
        );

        let mut model = problem.minimise(objective).using(solver);
        model = self.add_component_constraints(model, &vars);
        model = self.add_bus_balances(model, &vars)?;

        // Time the optimization
        let start_time = std::time::Instant::now();
        let result = model.solve();
        let solve_duration = start_time.elapsed();

        let solution = result.map_err(|e| NetworkError::Solve(e.to_string()))?;
        let extracted = self.extract_solution(&solution, &vars, solve_duration);
        info!(
            "Optimization finished in {} ms, objective {:.2}",
            solve_duration.as_millis(),
            extracted.objective
        );
        Ok(extracted)
    }

    fn extract_solution(
        &self,
        solution: &impl Solution,
        vars: &NetworkVariables,
        solve_duration: std::time::Duration,
    ) -> NetworkSolution {
        let values = |variables: &[Variable]| -> Vec<f64> {
            variables.iter().map(|&var| solution.value(var)).collect()
        };
        let mut objective = 0.0;

        let mut generators = IndexMap::with_capacity(self.generators.len());
        for (generator, v) in self.generators.values().zip(&vars.generators) {
            let p = values(&v.p);
            let p_nom_opt = v.nominal.value(solution);
            objective += generator.marginal_cost * p.iter().sum::<f64>();
            if v.nominal.variable().is_some() {
                objective += generator.capital_cost * p_nom_opt.unwrap_or(0.0);
            }
            generators.insert(
                generator.name.clone(),
                GeneratorResult {
                    p,
                    p_nom_opt,
                    capital_cost: generator.capital_cost,
                },
            );
        }

        let mut links = IndexMap::with_capacity(self.links.len());
        for (link, v) in self.links.values().zip(&vars.links) {
            let p0 = values(&v.p0);
            let p1 = p0
                .iter()
                .enumerate()
                .map(|(t, p)| link.efficiency.at(t) * p)
                .collect();
            let p_nom_opt = v.nominal.value(solution);
            objective += link.marginal_cost * p0.iter().sum::<f64>();
            if v.nominal.variable().is_some() {
                objective += link.capital_cost * p_nom_opt.unwrap_or(0.0);
            }
            links.insert(
                link.name.clone(),
                LinkResult {
                    p0,
                    p1,
                    p_nom_opt,
                    capital_cost: link.capital_cost,
                },
            );
        }

        let mut stores = IndexMap::with_capacity(self.stores.len());
        for (store, v) in self.stores.values().zip(&vars.stores) {
            let p = values(&v.p);
            let e_nom_opt = v.nominal.value(solution);
            objective += store.marginal_cost * p.iter().sum::<f64>();
            if v.nominal.variable().is_some() {
                objective += store.capital_cost * e_nom_opt.unwrap_or(0.0);
            }
            stores.insert(
                store.name.clone(),
                StoreResult {
                    e: values(&v.e),
                    p,
                    e_nom_opt,
                    capital_cost: store.capital_cost,
                },
            );
        }

        let loads = self
            .loads
            .values()
            .map(|load| (load.name.clone(), load.p_set.clone()))
            .collect();

        NetworkSolution {
            objective,
            snapshots: self.snapshots.clone(),
            generators,
            links,
            stores,
            loads,
            solve_duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{Generator, Link, Store};
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    const TOL: f64 = 1e-4;

    fn snapshots(n: usize) -> Vec<NaiveDateTime> {
        let start = NaiveDate::from_ymd_opt(2019, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n).map(|h| start + TimeDelta::hours(h as i64)).collect()
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < TOL * expected.abs().max(1.0),
            "expected {expected}, got {actual}"
        );
    }

    fn single_bus(load: Vec<f64>) -> Network {
        let mut network = Network::new(snapshots(load.len())).unwrap();
        network.add_bus("el", "electricity").unwrap();
        network.add_load("demand", "el", load).unwrap();
        network
    }

    #[test]
    fn test_merit_order_dispatch() {
        let mut network = single_bus(vec![10.0, 20.0]);
        network
            .add_generator(
                Generator::new("cheap", "el")
                    .with_capacity(Capacity::fixed(15.0))
                    .with_marginal_cost(1.0),
            )
            .unwrap();
        network
            .add_generator(
                Generator::new("backup", "el")
                    .with_capacity(Capacity::Unbounded)
                    .with_marginal_cost(3.0),
            )
            .unwrap();

        let solution = network.optimize(good_lp::clarabel).unwrap();
        assert_close(solution.objective, 40.0);
        let cheap = solution.generator("cheap").unwrap();
        assert_close(cheap.p[0], 10.0);
        assert_close(cheap.p[1], 15.0);
        assert_eq!(cheap.p_nom_opt, Some(15.0));
        assert_eq!(solution.generator("backup").unwrap().p_nom_opt, None);
        assert_close(solution.generator_energy("backup"), 5.0);
    }

    #[test]
    fn test_capacity_expansion() {
        let mut network = single_bus(vec![10.0, 20.0]);
        network
            .add_generator(
                Generator::new("plant", "el")
                    .with_capacity(Capacity::extendable())
                    .with_marginal_cost(1.0)
                    .with_capital_cost(2.0),
            )
            .unwrap();
        network
            .add_generator(
                Generator::new("backup", "el")
                    .with_capacity(Capacity::Unbounded)
                    .with_marginal_cost(5.0),
            )
            .unwrap();

        let solution = network.optimize(good_lp::clarabel).unwrap();
        assert_close(solution.generator("plant").unwrap().p_nom_opt.unwrap(), 20.0);
        assert_close(solution.objective, 70.0);
        assert_close(solution.annual_capital_cost(), 40.0);
    }

    #[test]
    fn test_expansion_stops_at_max() {
        let mut network = single_bus(vec![10.0, 20.0]);
        network
            .add_generator(
                Generator::new("plant", "el")
                    .with_capacity(Capacity::Extendable {
                        min: 0.0,
                        max: Some(12.0),
                    })
                    .with_marginal_cost(1.0)
                    .with_capital_cost(2.0),
            )
            .unwrap();
        network
            .add_generator(
                Generator::new("backup", "el")
                    .with_capacity(Capacity::Unbounded)
                    .with_marginal_cost(5.0),
            )
            .unwrap();

        let solution = network.optimize(good_lp::clarabel).unwrap();
        assert_close(solution.generator("plant").unwrap().p_nom_opt.unwrap(), 12.0);
        assert_close(solution.generator_energy("backup"), 8.0);
        // 22 kWh plant, 8 kWh backup, 12 kW capacity
        assert_close(solution.objective, 86.0);
    }

    #[test]
    fn test_expansion_starts_at_min() {
        let mut network = single_bus(vec![1.0, 1.0]);
        network
            .add_generator(
                Generator::new("plant", "el")
                    .with_capacity(Capacity::Extendable {
                        min: 30.0,
                        max: None,
                    })
                    .with_marginal_cost(1.0)
                    .with_capital_cost(2.0),
            )
            .unwrap();

        let solution = network.optimize(good_lp::clarabel).unwrap();
        let plant = solution.generator("plant").unwrap();
        assert_close(plant.p_nom_opt.unwrap(), 30.0);
        assert_close(plant.p[0], 1.0);
        assert_close(solution.objective, 62.0);
    }

    #[test]
    fn test_cyclic_store_shifts_energy() {
        let mut network = single_bus(vec![5.0, 5.0]);
        network
            .add_generator(
                Generator::new("cheap", "el")
                    .with_capacity(Capacity::fixed(10.0))
                    .with_p_max_pu(vec![1.0, 0.0])
                    .with_marginal_cost(1.0),
            )
            .unwrap();
        network
            .add_generator(
                Generator::new("backup", "el")
                    .with_capacity(Capacity::Unbounded)
                    .with_marginal_cost(10.0),
            )
            .unwrap();
        network
            .add_store(
                Store::new("battery", "el")
                    .with_energy_capacity(Capacity::fixed(100.0))
                    .cyclic(true),
            )
            .unwrap();

        let solution = network.optimize(good_lp::clarabel).unwrap();
        assert_close(solution.objective, 10.0);
        let battery = solution.store("battery").unwrap();
        assert_close(battery.p[0], -5.0);
        assert_close(battery.p[1], 5.0);
        assert_close(battery.e[0] - battery.e[1], 5.0);
    }

    #[test]
    fn test_store_initial_level_and_standing_loss() {
        let mut network = single_bus(vec![3.0, 3.0]);
        network
            .add_generator(
                Generator::new("backup", "el")
                    .with_capacity(Capacity::Unbounded)
                    .with_marginal_cost(10.0),
            )
            .unwrap();
        network
            .add_store(
                Store::new("tank", "el")
                    .with_energy_capacity(Capacity::fixed(10.0))
                    .with_standing_loss(0.5)
                    .with_e_initial(10.0),
            )
            .unwrap();

        let solution = network.optimize(good_lp::clarabel).unwrap();
        // 5 kWh left after the first hour's loss, 3 used, 1 of the remaining 2 left after the second loss
        assert_close(solution.objective, 20.0);
        let tank = solution.store("tank").unwrap();
        assert_close(tank.e[0], 2.0);
        assert!(tank.e[1].abs() < 1e-3);
    }

    #[test]
    fn test_link_efficiency_profile() {
        let mut network = Network::new(snapshots(2)).unwrap();
        network.add_bus("el", "electricity").unwrap();
        network.add_bus("heat", "heat").unwrap();
        network.add_load("heat_demand", "heat", vec![6.0, 8.0]).unwrap();
        network
            .add_generator(
                Generator::new("grid", "el")
                    .with_capacity(Capacity::Unbounded)
                    .with_marginal_cost(1.0),
            )
            .unwrap();
        network
            .add_link(
                Link::new("heat_pump", "el", "heat")
                    .with_capacity(Capacity::fixed(10.0))
                    .with_efficiency(vec![3.0, 4.0]),
            )
            .unwrap();

        let solution = network.optimize(good_lp::clarabel).unwrap();
        assert_close(solution.objective, 4.0);
        let heat_pump = solution.link("heat_pump").unwrap();
        assert_close(heat_pump.p0[0], 2.0);
        assert_close(heat_pump.p1[1], 8.0);
        assert_close(solution.link_output_energy("heat_pump"), 14.0);
    }

    #[test]
    fn test_sink_earns_revenue() {
        let mut network = Network::new(snapshots(1)).unwrap();
        network.add_bus("wind", "wind").unwrap();
        network.add_bus("el", "electricity").unwrap();
        network.add_load("demand", "el", vec![3.0]).unwrap();
        network
            .add_generator(Generator::new("turbine", "wind").with_capacity(Capacity::fixed(10.0)))
            .unwrap();
        network
            .add_generator(
                Generator::new("export", "wind")
                    .with_capacity(Capacity::fixed(4.0))
                    .with_marginal_cost(-1.0)
                    .as_sink(),
            )
            .unwrap();
        network
            .add_link(Link::new("self_use", "wind", "el").with_capacity(Capacity::fixed(10.0)))
            .unwrap();
        network
            .add_generator(
                Generator::new("grid", "el")
                    .with_capacity(Capacity::Unbounded)
                    .with_marginal_cost(5.0),
            )
            .unwrap();

        let solution = network.optimize(good_lp::clarabel).unwrap();
        assert_close(solution.objective, -4.0);
        assert_close(solution.generator("export").unwrap().p[0], 4.0);
        assert_close(solution.link("self_use").unwrap().p0[0], 3.0);
        assert!(solution.generator("grid").unwrap().p[0].abs() < 1e-3);
    }

    #[test]
    fn test_infeasible_network() {
        let mut network = single_bus(vec![10.0]);
        network
            .add_generator(Generator::new("small", "el").with_capacity(Capacity::fixed(5.0)))
            .unwrap();
        assert!(matches!(
            network.optimize(good_lp::clarabel),
            Err(NetworkError::Solve(_))
        ));
    }
}
