pub mod heat_pump;
pub mod wind;

pub use heat_pump::HeatPumpParameters;
pub use wind::{InvestmentCost, RotorParameters, TurbineCostInputs};
