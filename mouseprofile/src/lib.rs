#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod error;
mod linalg;
pub mod polynomial;
pub mod profile;
pub mod trajectory;

pub use error::{InvalidParameter, ProfileError, SolveError};
pub use polynomial::{solve_axes, BoundaryCondition, CubicCoefficients};
pub use profile::{simulate, summarize, MotionState, ProfileParameters};
