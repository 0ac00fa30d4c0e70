use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::{ParameterError, ensure_non_negative};

/// Nominal capacity of a network component (kW for power, kWh for energy).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "./capacity.ts")]
pub enum Capacity {
    /// Capacity is given and not changed by the optimization.
    Fixed {
        /// Nominal capacity.
        value: f64,
    },
    /// No upper limit at all (e.g. a public grid connection).
    Unbounded,
    /// Capacity is a decision variable of the optimization.
    Extendable {
        /// Lower bound of the built capacity.
        #[serde(default)]
        min: f64,
        /// Optional upper bound of the built capacity.
        #[serde(default)]
        max: Option<f64>,
    },
}

impl Capacity {
    pub fn fixed(value: f64) -> Self {
        Self::Fixed { value }
    }

    /// Extendable from zero without an upper bound.
    pub fn extendable() -> Self {
        Self::Extendable { min: 0.0, max: None }
    }

    pub fn validate(&self) -> Result<(), ParameterError> {
        match *self {
            Self::Fixed { value } => ensure_non_negative("capacity", value),
            Self::Unbounded => Ok(()),
            Self::Extendable { min, max } => {
                ensure_non_negative("capacity.min", min)?;
                match max {
                    Some(max) if max < min => Err(ParameterError::OutOfRange {
                        name: "capacity.max",
                        value: max,
                        min,
                        max: f64::INFINITY,
                    }),
                    _ => Ok(()),
                }
            }
        }
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Self::Fixed { value: 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_capacity() {
        assert!(Capacity::fixed(10.0).validate().is_ok());
        assert!(Capacity::Unbounded.validate().is_ok());
        assert!(Capacity::extendable().validate().is_ok());
        assert!(Capacity::fixed(-1.0).validate().is_err());
        assert!(
            Capacity::Extendable {
                min: 5.0,
                max: Some(2.0)
            }
            .validate()
            .is_err()
        );
    }
}
