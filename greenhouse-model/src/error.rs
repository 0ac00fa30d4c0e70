use thiserror::Error;

/// Invalid model parameter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("{name} must be > 0, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("{name} must be >= 0, got {value}")]
    Negative { name: &'static str, value: f64 },
    #[error("{name} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<(), ParameterError> {
    // NaN fails this check as well
    if value > 0.0 {
        Ok(())
    } else {
        Err(ParameterError::NonPositive { name, value })
    }
}

pub(crate) fn ensure_non_negative(name: &'static str, value: f64) -> Result<(), ParameterError> {
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ParameterError::Negative { name, value })
    }
}

pub(crate) fn ensure_in_range(
    name: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ParameterError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ParameterError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}
