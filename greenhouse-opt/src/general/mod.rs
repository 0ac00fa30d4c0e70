pub mod timeseries;
pub mod weather;
