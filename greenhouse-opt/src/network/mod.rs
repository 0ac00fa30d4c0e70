//! Energy network of buses, loads, generators, links and stores.
//!
//! Power is in kW and energy in kWh; every snapshot is one hour.

pub mod optimize;
pub mod solution;

use chrono::NaiveDateTime;
use greenhouse_model::{Capacity, ParameterError};
use indexmap::IndexMap;
use tracing::debug;

use crate::error::NetworkError;

/// Per-snapshot parameter that is either constant or given for every snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Profile {
    Constant(f64),
    Series(Vec<f64>),
}

impl Profile {
    pub fn at(&self, t: usize) -> f64 {
        match self {
            Self::Constant(value) => *value,
            Self::Series(values) => values.get(t).copied().unwrap_or(f64::NAN),
        }
    }

    fn check(
        &self,
        snapshots: usize,
        component: &'static str,
        name: &str,
        field: &'static str,
    ) -> Result<(), NetworkError> {
        let values: &[f64] = match self {
            Self::Constant(value) => std::slice::from_ref(value),
            Self::Series(values) => {
                if values.len() != snapshots {
                    return Err(NetworkError::ProfileLength {
                        component,
                        name: name.to_string(),
                        field,
                        expected: snapshots,
                        actual: values.len(),
                    });
                }
                values
            }
        };
        check_values(values, component, name, field)
    }
}

impl Default for Profile {
    fn default() -> Self {
        Self::Constant(1.0)
    }
}

impl From<f64> for Profile {
    fn from(value: f64) -> Self {
        Self::Constant(value)
    }
}

impl From<Vec<f64>> for Profile {
    fn from(values: Vec<f64>) -> Self {
        Self::Series(values)
    }
}

fn check_values(
    values: &[f64],
    component: &'static str,
    name: &str,
    field: &'static str,
) -> Result<(), NetworkError> {
    if values.iter().all(|v| v.is_finite() && *v >= 0.0) {
        Ok(())
    } else {
        Err(NetworkError::InvalidValue {
            component,
            name: name.to_string(),
            field,
        })
    }
}

fn check_parameter(
    component: &'static str,
    name: &str,
    result: Result<(), ParameterError>,
) -> Result<(), NetworkError> {
    result.map_err(|source| NetworkError::InvalidParameter {
        component,
        name: name.to_string(),
        source,
    })
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ParameterError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ParameterError::Negative { name, value })
    }
}

fn finite(name: &'static str, value: f64) -> Result<(), ParameterError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ParameterError::OutOfRange {
            name,
            value,
            min: f64::MIN,
            max: f64::MAX,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bus {
    pub name: String,
    pub carrier: String,
}

/// Fixed demand at a bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Load {
    pub name: String,
    pub bus: String,
    /// Demand in kW per snapshot.
    pub p_set: Vec<f64>,
}

/// Supply (or with `sign = -1` a sink) at a bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Generator {
    pub name: String,
    pub bus: String,
    pub capacity: Capacity,
    /// Available output per unit of capacity.
    pub p_max_pu: Profile,
    /// Cost per kWh of output. Negative values are revenues.
    pub marginal_cost: f64,
    /// Annualized cost per kW of capacity.
    pub capital_cost: f64,
    pub sign: f64,
    pub carrier: String,
}

impl Generator {
    pub fn new(name: impl Into<String>, bus: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bus: bus.into(),
            capacity: Capacity::default(),
            p_max_pu: Profile::default(),
            marginal_cost: 0.0,
            capital_cost: 0.0,
            sign: 1.0,
            carrier: String::new(),
        }
    }

    pub fn with_capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_p_max_pu(mut self, p_max_pu: impl Into<Profile>) -> Self {
        self.p_max_pu = p_max_pu.into();
        self
    }

    pub fn with_marginal_cost(mut self, marginal_cost: f64) -> Self {
        self.marginal_cost = marginal_cost;
        self
    }

    pub fn with_capital_cost(mut self, capital_cost: f64) -> Self {
        self.capital_cost = capital_cost;
        self
    }

    /// Turns the generator into a sink that withdraws power from its bus.
    pub fn as_sink(mut self) -> Self {
        self.sign = -1.0;
        self
    }

    pub fn with_carrier(mut self, carrier: impl Into<String>) -> Self {
        self.carrier = carrier.into();
        self
    }
}

/// Directed conversion: withdraws `p0` from `bus0` and delivers `efficiency * p0` to `bus1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub name: String,
    pub bus0: String,
    pub bus1: String,
    /// Capacity on the input side in kW.
    pub capacity: Capacity,
    pub efficiency: Profile,
    pub marginal_cost: f64,
    pub capital_cost: f64,
}

impl Link {
    pub fn new(name: impl Into<String>, bus0: impl Into<String>, bus1: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bus0: bus0.into(),
            bus1: bus1.into(),
            capacity: Capacity::default(),
            efficiency: Profile::default(),
            marginal_cost: 0.0,
            capital_cost: 0.0,
        }
    }

    pub fn with_capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_efficiency(mut self, efficiency: impl Into<Profile>) -> Self {
        self.efficiency = efficiency.into();
        self
    }

    pub fn with_marginal_cost(mut self, marginal_cost: f64) -> Self {
        self.marginal_cost = marginal_cost;
        self
    }

    pub fn with_capital_cost(mut self, capital_cost: f64) -> Self {
        self.capital_cost = capital_cost;
        self
    }
}

/// Energy reservoir at a bus. Positive dispatch `p` discharges into the bus.
#[derive(Debug, Clone, PartialEq)]
pub struct Store {
    pub name: String,
    pub bus: String,
    /// Energy capacity in kWh.
    pub energy_capacity: Capacity,
    /// Fraction of the level lost per snapshot.
    pub standing_loss: f64,
    /// Level before the first snapshot equals the level after the last one.
    pub cyclic: bool,
    /// Level before the first snapshot when not cyclic.
    pub e_initial: f64,
    pub marginal_cost: f64,
    /// Annualized cost per kWh of capacity.
    pub capital_cost: f64,
}

impl Store {
    pub fn new(name: impl Into<String>, bus: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bus: bus.into(),
            energy_capacity: Capacity::default(),
            standing_loss: 0.0,
            cyclic: false,
            e_initial: 0.0,
            marginal_cost: 0.0,
            capital_cost: 0.0,
        }
    }

    pub fn with_energy_capacity(mut self, capacity: Capacity) -> Self {
        self.energy_capacity = capacity;
        self
    }

    pub fn with_standing_loss(mut self, standing_loss: f64) -> Self {
        self.standing_loss = standing_loss;
        self
    }

    pub fn cyclic(mut self, cyclic: bool) -> Self {
        self.cyclic = cyclic;
        self
    }

    pub fn with_e_initial(mut self, e_initial: f64) -> Self {
        self.e_initial = e_initial;
        self
    }

    pub fn with_capital_cost(mut self, capital_cost: f64) -> Self {
        self.capital_cost = capital_cost;
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComponentCounts {
    pub buses: usize,
    pub loads: usize,
    pub generators: usize,
    pub links: usize,
    pub stores: usize,
}

/// Network over a fixed set of snapshots. Component names are unique per kind
/// and components keep their insertion order.
#[derive(Debug, Clone)]
pub struct Network {
    snapshots: Vec<NaiveDateTime>,
    buses: IndexMap<String, Bus>,
    loads: IndexMap<String, Load>,
    generators: IndexMap<String, Generator>,
    links: IndexMap<String, Link>,
    stores: IndexMap<String, Store>,
}

impl Network {
    pub fn new(snapshots: Vec<NaiveDateTime>) -> Result<Self, NetworkError> {
        if snapshots.is_empty() {
            return Err(NetworkError::EmptySnapshots);
        }
        Ok(Self {
            snapshots,
            buses: IndexMap::new(),
            loads: IndexMap::new(),
            generators: IndexMap::new(),
            links: IndexMap::new(),
            stores: IndexMap::new(),
        })
    }

    pub fn snapshots(&self) -> &[NaiveDateTime] {
        &self.snapshots
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    pub fn buses(&self) -> &IndexMap<String, Bus> {
        &self.buses
    }

    pub fn loads(&self) -> &IndexMap<String, Load> {
        &self.loads
    }

    pub fn generators(&self) -> &IndexMap<String, Generator> {
        &self.generators
    }

    pub fn links(&self) -> &IndexMap<String, Link> {
        &self.links
    }

    pub fn stores(&self) -> &IndexMap<String, Store> {
        &self.stores
    }

    pub fn counts(&self) -> ComponentCounts {
        ComponentCounts {
            buses: self.buses.len(),
            loads: self.loads.len(),
            generators: self.generators.len(),
            links: self.links.len(),
            stores: self.stores.len(),
        }
    }

    fn require_bus(&self, component: &'static str, name: &str, bus: &str) -> Result<(), NetworkError> {
        if self.buses.contains_key(bus) {
            Ok(())
        } else {
            Err(NetworkError::UnknownBus {
                component,
                name: name.to_string(),
                bus: bus.to_string(),
            })
        }
    }

    fn require_unique<T>(
        map: &IndexMap<String, T>,
        component: &'static str,
        name: &str,
    ) -> Result<(), NetworkError> {
        if map.contains_key(name) {
            Err(NetworkError::Duplicate {
                component,
                name: name.to_string(),
            })
        } else {
            Ok(())
        }
    }

    pub fn add_bus(
        &mut self,
        name: impl Into<String>,
        carrier: impl Into<String>,
    ) -> Result<(), NetworkError> {
        let bus = Bus {
            name: name.into(),
            carrier: carrier.into(),
        };
        Self::require_unique(&self.buses, "bus", &bus.name)?;
        debug!("Bus {} ({})", bus.name, bus.carrier);
        self.buses.insert(bus.name.clone(), bus);
        Ok(())
    }

    pub fn add_load(
        &mut self,
        name: impl Into<String>,
        bus: impl Into<String>,
        p_set: Vec<f64>,
    ) -> Result<(), NetworkError> {
        const KIND: &str = "load";
        let load = Load {
            name: name.into(),
            bus: bus.into(),
            p_set,
        };
        Self::require_unique(&self.loads, KIND, &load.name)?;
        self.require_bus(KIND, &load.name, &load.bus)?;
        Profile::Series(load.p_set.clone()).check(self.snapshot_count(), KIND, &load.name, "p_set")?;
        self.loads.insert(load.name.clone(), load);
        Ok(())
    }

    pub fn add_generator(&mut self, generator: Generator) -> Result<(), NetworkError> {
        const KIND: &str = "generator";
        let name = generator.name.as_str();
        Self::require_unique(&self.generators, KIND, name)?;
        self.require_bus(KIND, name, &generator.bus)?;
        check_parameter(KIND, name, generator.capacity.validate())?;
        check_parameter(KIND, name, finite("marginal_cost", generator.marginal_cost))?;
        check_parameter(KIND, name, non_negative("capital_cost", generator.capital_cost))?;
        if generator.sign != 1.0 && generator.sign != -1.0 {
            return Err(NetworkError::InvalidValue {
                component: KIND,
                name: name.to_string(),
                field: "sign",
            });
        }
        generator
            .p_max_pu
            .check(self.snapshot_count(), KIND, name, "p_max_pu")?;
        debug!(
            "Generator {name} ({}) at bus {}",
            generator.carrier, generator.bus
        );
        self.generators.insert(generator.name.clone(), generator);
        Ok(())
    }

    pub fn add_link(&mut self, link: Link) -> Result<(), NetworkError> {
        const KIND: &str = "link";
        let name = link.name.as_str();
        Self::require_unique(&self.links, KIND, name)?;
        self.require_bus(KIND, name, &link.bus0)?;
        self.require_bus(KIND, name, &link.bus1)?;
        check_parameter(KIND, name, link.capacity.validate())?;
        check_parameter(KIND, name, finite("marginal_cost", link.marginal_cost))?;
        check_parameter(KIND, name, non_negative("capital_cost", link.capital_cost))?;
        link.efficiency
            .check(self.snapshot_count(), KIND, name, "efficiency")?;
        self.links.insert(link.name.clone(), link);
        Ok(())
    }

    pub fn add_store(&mut self, store: Store) -> Result<(), NetworkError> {
        const KIND: &str = "store";
        let name = store.name.as_str();
        Self::require_unique(&self.stores, KIND, name)?;
        self.require_bus(KIND, name, &store.bus)?;
        check_parameter(KIND, name, store.energy_capacity.validate())?;
        if !(0.0..=1.0).contains(&store.standing_loss) {
            return Err(NetworkError::InvalidParameter {
                component: KIND,
                name: name.to_string(),
                source: ParameterError::OutOfRange {
                    name: "standing_loss",
                    value: store.standing_loss,
                    min: 0.0,
                    max: 1.0,
                },
            });
        }
        check_parameter(KIND, name, non_negative("e_initial", store.e_initial))?;
        check_parameter(KIND, name, finite("marginal_cost", store.marginal_cost))?;
        check_parameter(KIND, name, non_negative("capital_cost", store.capital_cost))?;
        self.stores.insert(store.name.clone(), store);
        Ok(())
    }

    /// Sum of all loads at `bus` for every snapshot.
    pub fn bus_demand(&self, bus: &str) -> Vec<f64> {
        let mut demand = vec![0.0; self.snapshot_count()];
        for load in self.loads.values().filter(|load| load.bus == bus) {
            for (total, p) in demand.iter_mut().zip(&load.p_set) {
                *total += p;
            }
        }
        demand
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snapshots(n: usize) -> Vec<NaiveDateTime> {
        let start = NaiveDate::from_ymd_opt(2019, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        (0..n)
            .map(|h| start + chrono::TimeDelta::hours(h as i64))
            .collect()
    }

    #[test]
    fn test_empty_snapshots_rejected() {
        assert!(matches!(
            Network::new(vec![]),
            Err(NetworkError::EmptySnapshots)
        ));
    }

    #[test]
    fn test_add_components() {
        let mut network = Network::new(snapshots(2)).unwrap();
        network.add_bus("Strom", "electricity").unwrap();
        network.add_bus("Waerme", "heat").unwrap();
        network.add_load("Stromlast", "Strom", vec![1.0, 2.0]).unwrap();
        network
            .add_generator(Generator::new("Netz_Import", "Strom").with_capacity(Capacity::Unbounded))
            .unwrap();
        network
            .add_link(Link::new("Waermepumpe", "Strom", "Waerme").with_efficiency(vec![3.0, 4.0]))
            .unwrap();
        network.add_store(Store::new("Waermespeicher", "Waerme")).unwrap();

        assert_eq!(
            network.counts(),
            ComponentCounts {
                buses: 2,
                loads: 1,
                generators: 1,
                links: 1,
                stores: 1
            }
        );
        assert_eq!(network.bus_demand("Strom"), vec![1.0, 2.0]);
        assert_eq!(network.bus_demand("Waerme"), vec![0.0, 0.0]);
        assert_eq!(network.buses().keys().collect::<Vec<_>>(), ["Strom", "Waerme"]);
    }

    #[test]
    fn test_validation_errors() {
        let mut network = Network::new(snapshots(2)).unwrap();
        network.add_bus("Strom", "electricity").unwrap();

        assert!(matches!(
            network.add_bus("Strom", "electricity"),
            Err(NetworkError::Duplicate { .. })
        ));
        assert!(matches!(
            network.add_load("Last", "Gas", vec![1.0, 1.0]),
            Err(NetworkError::UnknownBus { .. })
        ));
        assert!(matches!(
            network.add_load("Last", "Strom", vec![1.0]),
            Err(NetworkError::ProfileLength {
                expected: 2,
                actual: 1,
                ..
            })
        ));
        assert!(matches!(
            network.add_load("Last", "Strom", vec![1.0, f64::NAN]),
            Err(NetworkError::InvalidValue { .. })
        ));
        assert!(matches!(
            network.add_generator(Generator::new("G", "Strom").with_capacity(Capacity::fixed(-1.0))),
            Err(NetworkError::InvalidParameter { .. })
        ));
        assert!(matches!(
            network.add_generator(Generator::new("G", "Strom").with_p_max_pu(-0.5)),
            Err(NetworkError::InvalidValue { .. })
        ));
        assert!(matches!(
            network.add_store(Store::new("S", "Strom").with_standing_loss(1.5)),
            Err(NetworkError::InvalidParameter { .. })
        ));
        assert_eq!(network.counts().generators, 0);
    }
}
