//! Hourly series derived from weather data with closed-form formulas.
//!
//! Each step writes its result to a CSV file that later steps (and the
//! system models) read back, and can also be used in-process.

pub mod cop;
pub mod heat_load;
pub mod lamp;
pub mod solar_prep;
