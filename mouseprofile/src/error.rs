use core::fmt;

use uom::si::{
    f32::{Length, Time},
    length::meter,
    time::second,
};

/// A single input that violates a precondition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InvalidParameter {
    pub name: &'static str,
    pub value: f32,
    pub expected: &'static str,
}

impl InvalidParameter {
    pub(crate) fn new(name: &'static str, value: f32, expected: &'static str) -> Self {
        Self {
            name,
            value,
            expected,
        }
    }
}

impl fmt::Display for InvalidParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid parameter `{}` = {}, must be {}.",
            self.name, self.value, self.expected
        )
    }
}

/// Error on velocity profile simulation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProfileError {
    InvalidParameter(InvalidParameter),
    /// The step bound was hit before the target distance was covered.
    NonTermination { steps: usize, position: Length },
    CapacityExceeded { capacity: usize },
}

impl From<InvalidParameter> for ProfileError {
    fn from(value: InvalidParameter) -> Self {
        Self::InvalidParameter(value)
    }
}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter(inner) => inner.fmt(f),
            Self::NonTermination { steps, position } => write!(
                f,
                "profile did not reach the target after {} steps (stopped at {} m).",
                steps,
                position.get::<meter>()
            ),
            Self::CapacityExceeded { capacity } => {
                write!(f, "profile does not fit in {} states.", capacity)
            }
        }
    }
}

/// Error on polynomial trajectory solving.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SolveError {
    InvalidParameter(InvalidParameter),
    SingularSystem { duration: Time },
}

impl From<InvalidParameter> for SolveError {
    fn from(value: InvalidParameter) -> Self {
        Self::InvalidParameter(value)
    }
}

impl fmt::Display for SolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter(inner) => inner.fmt(f),
            Self::SingularSystem { duration } => write!(
                f,
                "boundary system is singular for duration {} s.",
                duration.get::<second>()
            ),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InvalidParameter {}

#[cfg(feature = "std")]
impl std::error::Error for ProfileError {}

#[cfg(feature = "std")]
impl std::error::Error for SolveError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter_display() {
        let error = ProfileError::from(InvalidParameter::new("distance", -1.0, "positive"));
        assert_eq!(
            error.to_string(),
            "invalid parameter `distance` = -1, must be positive."
        );
    }

    #[test]
    fn test_singular_display() {
        let error = SolveError::SingularSystem {
            duration: Time::new::<second>(0.0),
        };
        assert_eq!(
            error.to_string(),
            "boundary system is singular for duration 0 s."
        );
    }
}
