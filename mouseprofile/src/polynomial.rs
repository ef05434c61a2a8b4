//! Cubic interpolation between two boundary conditions over a fixed duration.
//!
//! q(t) = a0 + a1 t + a2 t^2 + a3 t^3, solved from q(0), q'(0), q(t_f) and q'(t_f).
//! Values are unit-agnostic f32 in SI base units; time is a [`Time`].

#[allow(unused_imports)]
use micromath::F32Ext;
use serde::{Deserialize, Serialize};
use uom::si::{f32::Time, time::second};

use crate::error::{InvalidParameter, SolveError};
use crate::linalg::solve4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundaryCondition {
    pub position: f32,
    pub velocity: f32,
}

impl BoundaryCondition {
    pub fn new(position: f32, velocity: f32) -> Self {
        Self { position, velocity }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CubicCoefficients {
    pub a0: f32,
    pub a1: f32,
    pub a2: f32,
    pub a3: f32,
}

impl CubicCoefficients {
    pub fn solve(
        start: BoundaryCondition,
        end: BoundaryCondition,
        t_f: Time,
    ) -> Result<Self, SolveError> {
        let tf = t_f.get::<second>();
        // also rejects NaN
        if !(tf > 0.0) || !tf.is_finite() {
            return Err(SolveError::SingularSystem { duration: t_f });
        }
        check_finite("start.position", start.position)?;
        check_finite("start.velocity", start.velocity)?;
        check_finite("end.position", end.position)?;
        check_finite("end.velocity", end.velocity)?;

        let tf2 = tf * tf;
        let tf3 = tf2 * tf;
        let m = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [1.0, tf, tf2, tf3],
            [0.0, 1.0, 2.0 * tf, 3.0 * tf2],
        ];
        let b = [start.position, start.velocity, end.position, end.velocity];
        let [a0, a1, a2, a3] =
            solve4(m, b).ok_or(SolveError::SingularSystem { duration: t_f })?;
        log::debug!(
            "cubic solved over {} s: a0={}, a1={}, a2={}, a3={}",
            tf,
            a0,
            a1,
            a2,
            a3
        );
        Ok(Self { a0, a1, a2, a3 })
    }

    pub fn position(&self, t: Time) -> f32 {
        let t = t.get::<second>();
        ((self.a3 * t + self.a2) * t + self.a1) * t + self.a0
    }

    pub fn velocity(&self, t: Time) -> f32 {
        let t = t.get::<second>();
        (3.0 * self.a3 * t + 2.0 * self.a2) * t + self.a1
    }

    pub fn acceleration(&self, t: Time) -> f32 {
        6.0 * self.a3 * t.get::<second>() + 2.0 * self.a2
    }

    pub fn jerk(&self) -> f32 {
        6.0 * self.a3
    }

    /// Samples the polynomial at `0, step, 2 step, ...` up to `t_f`.
    ///
    /// Evaluating outside `[0, t_f]` is possible through [`Self::position`] but carries
    /// no physical meaning, so the sampler never goes past `t_f`.
    pub fn samples(&self, t_f: Time, step: Time) -> Result<CubicSamples, SolveError> {
        let len = sample_count(t_f, step, "step")?;
        Ok(CubicSamples {
            coefficients: *self,
            t_f,
            step,
            index: 0,
            len,
        })
    }
}

fn check_finite(name: &'static str, value: f32) -> Result<(), InvalidParameter> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(InvalidParameter::new(name, value, "finite"))
    }
}

// number of grid points in [0, t_f] inclusive, tolerating rounding in t_f / step
pub(crate) fn sample_count(
    t_f: Time,
    step: Time,
    name: &'static str,
) -> Result<usize, SolveError> {
    let tf = t_f.get::<second>();
    let dt = step.get::<second>();
    if !(tf > 0.0) || !tf.is_finite() {
        return Err(SolveError::SingularSystem { duration: t_f });
    }
    if !(dt > 0.0) || !dt.is_finite() {
        return Err(InvalidParameter::new(name, dt, "positive and finite").into());
    }
    const TOLERANCE: f32 = 1e-4;
    let count = tf / dt + TOLERANCE;
    let too_fine =
        || SolveError::from(InvalidParameter::new(name, dt, "large enough for a countable grid"));
    if !count.is_finite() {
        return Err(too_fine());
    }
    // `as` saturates, so an unrepresentable count fails the addition
    (count as usize).checked_add(1).ok_or_else(too_fine)
}

/// Solves every axis with the same duration.
pub fn solve_axes<const N: usize>(
    start: [BoundaryCondition; N],
    end: [BoundaryCondition; N],
    t_f: Time,
) -> Result<[CubicCoefficients; N], SolveError> {
    let mut coefficients = [CubicCoefficients::default(); N];
    for (i, coefficient) in coefficients.iter_mut().enumerate() {
        *coefficient = CubicCoefficients::solve(start[i], end[i], t_f)?;
    }
    Ok(coefficients)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub t: Time,
    pub position: f32,
    pub velocity: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CubicSamples {
    coefficients: CubicCoefficients,
    t_f: Time,
    step: Time,
    index: usize,
    len: usize,
}

impl Iterator for CubicSamples {
    type Item = Sample;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.len {
            return None;
        }
        let t = self.step * self.index as f32;
        let t = if t > self.t_f { self.t_f } else { t };
        self.index += 1;
        Some(Sample {
            t,
            position: self.coefficients.position(t),
            velocity: self.coefficients.velocity(t),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.len - self.index;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for CubicSamples {}
