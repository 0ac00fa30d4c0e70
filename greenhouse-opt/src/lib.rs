pub mod config;
pub mod derive;
pub mod error;
pub mod general;
pub mod network;
pub mod report;
pub mod systems;

// Re-export commonly used items for convenience
pub use error::{DataError, NetworkError};
pub use general::timeseries::{AlignedSeries, HourlySeries, align};
pub use network::Network;
pub use network::solution::NetworkSolution;
pub use systems::SystemInputs;
