use std::time::Duration;

use chrono::NaiveDateTime;
use indexmap::IndexMap;

use crate::error::NetworkError;

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorResult {
    /// Output per snapshot in kW (always >= 0, also for sinks).
    pub p: Vec<f64>,
    /// Built capacity; `None` for unbounded generators.
    pub p_nom_opt: Option<f64>,
    pub capital_cost: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkResult {
    /// Withdrawal from `bus0` per snapshot.
    pub p0: Vec<f64>,
    /// Delivery to `bus1` per snapshot.
    pub p1: Vec<f64>,
    pub p_nom_opt: Option<f64>,
    pub capital_cost: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoreResult {
    /// Level at the end of each snapshot in kWh.
    pub e: Vec<f64>,
    /// Dispatch per snapshot; positive values discharge into the bus.
    pub p: Vec<f64>,
    pub e_nom_opt: Option<f64>,
    pub capital_cost: f64,
}

/// Optimal dispatch and capacities of a network.
#[derive(Debug, Clone)]
pub struct NetworkSolution {
    /// Value of the objective: marginal costs plus capital costs of extendable components.
    pub objective: f64,
    pub snapshots: Vec<NaiveDateTime>,
    pub generators: IndexMap<String, GeneratorResult>,
    pub links: IndexMap<String, LinkResult>,
    pub stores: IndexMap<String, StoreResult>,
    /// Demand per load and snapshot.
    pub loads: IndexMap<String, Vec<f64>>,
    pub solve_duration: Duration,
}

impl NetworkSolution {
    pub fn generator(&self, name: &str) -> Result<&GeneratorResult, NetworkError> {
        self.generators
            .get(name)
            .ok_or_else(|| NetworkError::UnknownComponent(name.to_string()))
    }

    pub fn link(&self, name: &str) -> Result<&LinkResult, NetworkError> {
        self.links
            .get(name)
            .ok_or_else(|| NetworkError::UnknownComponent(name.to_string()))
    }

    pub fn store(&self, name: &str) -> Result<&StoreResult, NetworkError> {
        self.stores
            .get(name)
            .ok_or_else(|| NetworkError::UnknownComponent(name.to_string()))
    }

    pub fn load(&self, name: &str) -> Result<&[f64], NetworkError> {
        self.loads
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| NetworkError::UnknownComponent(name.to_string()))
    }

    /// Total output of a generator over all snapshots (0 if absent).
    pub fn generator_energy(&self, name: &str) -> f64 {
        self.generators
            .get(name)
            .map_or(0.0, |g| g.p.iter().sum())
    }

    pub fn link_input_energy(&self, name: &str) -> f64 {
        self.links.get(name).map_or(0.0, |l| l.p0.iter().sum())
    }

    pub fn link_output_energy(&self, name: &str) -> f64 {
        self.links.get(name).map_or(0.0, |l| l.p1.iter().sum())
    }

    pub fn load_energy(&self, name: &str) -> f64 {
        self.loads.get(name).map_or(0.0, |p| p.iter().sum())
    }

    /// Annualized investment: built capacity times capital cost over all components.
    pub fn annual_capital_cost(&self) -> f64 {
        let generators = self
            .generators
            .values()
            .map(|g| g.p_nom_opt.unwrap_or(0.0) * g.capital_cost);
        let links = self
            .links
            .values()
            .map(|l| l.p_nom_opt.unwrap_or(0.0) * l.capital_cost);
        let stores = self
            .stores
            .values()
            .map(|s| s.e_nom_opt.unwrap_or(0.0) * s.capital_cost);
        generators.chain(links).chain(stores).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annual_capital_cost_and_lookups() {
        let solution = NetworkSolution {
            objective: 0.0,
            snapshots: vec![],
            generators: IndexMap::from([
                (
                    "Wind".to_string(),
                    GeneratorResult {
                        p: vec![1.0, 2.0],
                        p_nom_opt: Some(10.0),
                        capital_cost: 100.0,
                    },
                ),
                (
                    "Grid".to_string(),
                    GeneratorResult {
                        p: vec![0.0, 0.0],
                        p_nom_opt: None,
                        capital_cost: 50.0,
                    },
                ),
            ]),
            links: IndexMap::new(),
            stores: IndexMap::from([(
                "Heat".to_string(),
                StoreResult {
                    e: vec![0.0, 1.0],
                    p: vec![0.0, -1.0],
                    e_nom_opt: Some(4.0),
                    capital_cost: 5.0,
                },
            )]),
            loads: IndexMap::new(),
            solve_duration: Duration::ZERO,
        };

        assert_eq!(solution.annual_capital_cost(), 1020.0);
        assert_eq!(solution.generator_energy("Wind"), 3.0);
        assert_eq!(solution.generator_energy("Missing"), 0.0);
        assert!(matches!(
            solution.link("Missing"),
            Err(NetworkError::UnknownComponent(_))
        ));
    }
}
