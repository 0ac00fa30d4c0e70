pub mod capacity;
pub mod error;
pub mod greenhouse;
pub mod system;
pub mod technology;

pub use capacity::Capacity;
pub use error::ParameterError;
