//! Time-stepped trapezoidal velocity profile.
//!
//! The robot starts at `v_start`, accelerates at `acceleration` until it reaches `v_max`
//! or has to brake, and brakes so that it crosses `distance` at `v_end`.

use core::marker::PhantomData;

#[allow(unused_imports)]
use micromath::F32Ext;
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;
use uom::si::{
    acceleration::meter_per_second_squared,
    f32::{Acceleration, Length, Time, Velocity},
    length::meter,
    time::second,
    velocity::meter_per_second,
};

use crate::error::{InvalidParameter, ProfileError};

const DEFAULT_BUFFER_DISTANCE: Length = Length {
    value: 0.003,
    dimension: PhantomData,
    units: PhantomData,
};
const DEFAULT_PERIOD: Time = Time {
    value: 0.01,
    dimension: PhantomData,
    units: PhantomData,
};
/// Lower bound of the derived step limit, see [`ProfileParameters::step_limit`].
pub const DEFAULT_MAX_STEPS: usize = 100_000;

fn default_buffer_distance() -> Length {
    DEFAULT_BUFFER_DISTANCE
}

fn default_period() -> Time {
    DEFAULT_PERIOD
}

/// Inputs of one simulation run.
#[derive(Clone, Copy, Debug, PartialEq, TypedBuilder, Serialize, Deserialize)]
pub struct ProfileParameters {
    pub v_start: Velocity,
    pub v_end: Velocity,
    pub v_max: Velocity,
    pub distance: Length,
    /// Magnitude used for both acceleration and braking.
    pub acceleration: Acceleration,
    /// Margin added to the braking distance to absorb the one-step delay of the check.
    #[builder(default = DEFAULT_BUFFER_DISTANCE)]
    #[serde(default = "default_buffer_distance")]
    pub buffer_distance: Length,
    #[builder(default = DEFAULT_PERIOD)]
    #[serde(default = "default_period")]
    pub period: Time,
    /// Explicit step bound. Derived from the run's scale when `None`.
    #[builder(default, setter(strip_option))]
    #[serde(default)]
    pub max_steps: Option<usize>,
}

impl ProfileParameters {
    pub fn validate(&self) -> Result<(), InvalidParameter> {
        let v_start = self.v_start.get::<meter_per_second>();
        let v_end = self.v_end.get::<meter_per_second>();
        let v_max = self.v_max.get::<meter_per_second>();
        let distance = self.distance.get::<meter>();
        let acceleration = self.acceleration.get::<meter_per_second_squared>();
        let buffer = self.buffer_distance.get::<meter>();
        let period = self.period.get::<second>();

        // negated comparisons so that NaN is rejected as well
        let checks = [
            ("acceleration", acceleration, acceleration > 0.0, "positive"),
            ("distance", distance, distance > 0.0, "positive"),
            ("period", period, period > 0.0, "positive"),
            ("v_max", v_max, v_max.is_finite(), "finite"),
            ("v_end", v_end, v_end >= 0.0, "non-negative"),
            ("v_end", v_end, v_end <= v_max, "at most v_max"),
            ("v_start", v_start, v_start >= 0.0, "non-negative"),
            ("buffer_distance", buffer, buffer >= 0.0, "non-negative"),
            (
                "max_steps",
                self.max_steps.unwrap_or(DEFAULT_MAX_STEPS) as f32,
                self.max_steps != Some(0),
                "positive",
            ),
        ];
        for (name, value, ok, expected) in checks {
            if !ok || !value.is_finite() {
                return Err(InvalidParameter::new(name, value, expected));
            }
        }
        Ok(())
    }

    /// Whether a braking step can fail to advance the position.
    ///
    /// A step moves by `v dt - A dt^2 / 2`, which is not positive once the velocity has
    /// been clamped to `v_end <= A dt / 2`.
    pub fn may_stall(&self) -> bool {
        self.v_end <= self.acceleration * self.period / 2.0
    }

    /// Number of steps after which a run is reported as [`ProfileError::NonTermination`].
    ///
    /// Without an explicit `max_steps`, every step after the first advances at least
    /// `v_end dt - A dt^2 / 2`, which bounds a run that cannot stall. A run that may stall
    /// gets twice the time of a full ramp up, cruise and ramp down. Never below
    /// [`DEFAULT_MAX_STEPS`].
    pub fn step_limit(&self) -> usize {
        if let Some(max_steps) = self.max_steps {
            return max_steps;
        }
        let v_end = self.v_end.get::<meter_per_second>();
        let v_max = self.v_max.get::<meter_per_second>();
        let distance = self.distance.get::<meter>();
        let acceleration = self.acceleration.get::<meter_per_second_squared>();
        let period = self.period.get::<second>();

        let steps = if self.may_stall() {
            2.0 * (2.0 * v_max / acceleration + distance / v_max) / period
        } else {
            distance / (v_end * period - acceleration * period * period / 2.0) + 2.0
        };
        if steps.is_finite() {
            (steps as usize).max(DEFAULT_MAX_STEPS)
        } else {
            DEFAULT_MAX_STEPS
        }
    }
}

/// Distance needed to change speed from `v` to `v_end` at constant `acceleration`.
pub fn ramp_distance(v: Velocity, v_end: Velocity, acceleration: Acceleration) -> Length {
    (v * v - v_end * v_end) / (2.0 * acceleration)
}

/// Time needed to change speed from `v` to `v_end` at constant `acceleration`.
pub fn ramp_time(v: Velocity, v_end: Velocity, acceleration: Acceleration) -> Time {
    (v - v_end) / acceleration
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MotionState {
    pub t: Time,
    pub x: Length,
    pub v: Velocity,
    pub a: Acceleration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Accelerate,
    Cruise,
    Brake,
}

/// Iterator over the states of one run.
///
/// The first item is the initial state with `v = v_start` as given, every further item is
/// one integration step with `v` in `[v_end, v_max]`.
/// A clone continues independently from the current step; [`simulate`] restarts the run.
#[derive(Clone, Debug)]
pub struct ProfileSimulation {
    params: ProfileParameters,
    state: MotionState,
    phase: Phase,
    steps: usize,
    max_steps: usize,
    started: bool,
    finished: bool,
}

/// Validates `params` and returns the lazily evaluated profile.
pub fn simulate(params: ProfileParameters) -> Result<ProfileSimulation, ProfileError> {
    params.validate()?;
    log::debug!("simulating profile: {:?}", params);
    if params.may_stall() {
        log::warn!(
            "v_end = {} m/s is at most A dt / 2, braking steps may not advance",
            params.v_end.get::<meter_per_second>()
        );
    }
    Ok(ProfileSimulation {
        params,
        state: MotionState {
            t: Default::default(),
            x: Default::default(),
            v: params.v_start,
            a: params.acceleration,
        },
        phase: Phase::Accelerate,
        steps: 0,
        max_steps: params.step_limit(),
        started: false,
        finished: false,
    })
}

impl ProfileSimulation {
    pub fn parameters(&self) -> &ProfileParameters {
        &self.params
    }

    /// Collects the whole run into a fixed capacity vector.
    pub fn collect_into<const N: usize>(
        self,
    ) -> Result<heapless::Vec<MotionState, N>, ProfileError> {
        let mut states = heapless::Vec::new();
        for state in self {
            states
                .push(state?)
                .map_err(|_| ProfileError::CapacityExceeded { capacity: N })?;
        }
        Ok(states)
    }

    fn step(&mut self) -> MotionState {
        let ProfileParameters {
            v_end,
            v_max,
            distance,
            acceleration,
            buffer_distance,
            period,
            ..
        } = self.params;
        let MotionState { mut x, mut v, a, .. } = self.state;

        x = x + v * period + a * period * period / 2.0;
        v += a * period;

        // checked against the updated velocity, buffer_distance absorbs the one-step delay.
        // braking is latched once started.
        let ramp = ramp_distance(v, v_end, acceleration);
        let phase = if self.phase == Phase::Brake || distance - x < ramp + buffer_distance {
            Phase::Brake
        } else if v < v_max {
            Phase::Accelerate
        } else {
            Phase::Cruise
        };
        if phase != self.phase {
            log::debug!(
                "{:?} -> {:?} at x = {} m, v = {} m/s",
                self.phase,
                phase,
                x.get::<meter>(),
                v.get::<meter_per_second>()
            );
            self.phase = phase;
        }
        let a = match phase {
            Phase::Accelerate => acceleration,
            Phase::Cruise => Default::default(),
            Phase::Brake => -acceleration,
        };

        if v > v_max {
            v = v_max;
        } else if v < v_end {
            v = v_end;
        }

        self.steps += 1;
        self.state = MotionState {
            t: period * self.steps as f32,
            x,
            v,
            a,
        };
        self.state
    }
}

impl Iterator for ProfileSimulation {
    type Item = Result<MotionState, ProfileError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(Ok(self.state));
        }
        if self.state.x >= self.params.distance {
            self.finished = true;
            return None;
        }
        if self.steps >= self.max_steps {
            self.finished = true;
            log::warn!(
                "profile stopped after {} steps at x = {} m",
                self.steps,
                self.state.x.get::<meter>()
            );
            return Some(Err(ProfileError::NonTermination {
                steps: self.steps,
                position: self.state.x,
            }));
        }
        let state = self.step();
        log::trace!(
            "t = {} s, x = {} m, v = {} m/s, a = {} m/s^2",
            state.t.get::<second>(),
            state.x.get::<meter>(),
            state.v.get::<meter_per_second>(),
            state.a.get::<meter_per_second_squared>()
        );
        Some(Ok(state))
    }
}

impl core::iter::FusedIterator for ProfileSimulation {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileShape {
    /// `v_max` was reached.
    Trapezoid,
    /// Braking started before `v_max` was reached.
    Triangle,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub steps: usize,
    pub duration: Time,
    pub peak_velocity: Velocity,
    pub last: MotionState,
    pub shape: ProfileShape,
}

/// Runs the whole profile and reports its overall characteristics.
pub fn summarize(params: ProfileParameters) -> Result<ProfileSummary, ProfileError> {
    let mut last = MotionState::default();
    let mut peak_velocity = Velocity::default();
    let mut steps = 0;
    for (i, state) in simulate(params)?.enumerate() {
        let state = state?;
        if state.v > peak_velocity {
            peak_velocity = state.v;
        }
        steps = i;
        last = state;
    }
    let shape = if peak_velocity >= params.v_max {
        ProfileShape::Trapezoid
    } else {
        ProfileShape::Triangle
    };
    Ok(ProfileSummary {
        steps,
        duration: last.t,
        peak_velocity,
        last,
        shape,
    })
}
