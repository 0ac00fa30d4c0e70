pub mod envelope;
pub mod lighting;

pub use envelope::GreenhouseParameters;
pub use lighting::{LampParameters, LampSchedule};
