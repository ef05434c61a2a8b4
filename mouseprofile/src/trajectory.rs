#[allow(unused_imports)]
use micromath::F32Ext;
use serde::{Deserialize, Serialize};
use uom::si::{
    acceleration::meter_per_second_squared,
    angle::radian,
    angular_acceleration::radian_per_second_squared,
    angular_jerk::radian_per_second_cubed,
    angular_velocity::radian_per_second,
    f32::{
        Acceleration, Angle, AngularAcceleration, AngularJerk, AngularVelocity, Jerk, Length,
        Time, Velocity,
    },
    jerk::meter_per_second_cubed,
    length::meter,
    velocity::meter_per_second,
};

use crate::error::SolveError;
use crate::polynomial::{sample_count, solve_axes, BoundaryCondition, CubicCoefficients};

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub x: Length,
    pub y: Length,
    pub theta: Angle,
}

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseVelocity {
    pub x: Velocity,
    pub y: Velocity,
    pub theta: AngularVelocity,
}

#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseBoundary {
    pub pose: Pose,
    pub velocity: PoseVelocity,
}

impl PoseBoundary {
    pub fn at_rest(pose: Pose) -> Self {
        Self {
            pose,
            velocity: Default::default(),
        }
    }

    fn axes(&self) -> [BoundaryCondition; 3] {
        [
            BoundaryCondition::new(
                self.pose.x.get::<meter>(),
                self.velocity.x.get::<meter_per_second>(),
            ),
            BoundaryCondition::new(
                self.pose.y.get::<meter>(),
                self.velocity.y.get::<meter_per_second>(),
            ),
            BoundaryCondition::new(
                self.pose.theta.get::<radian>(),
                self.velocity.theta.get::<radian_per_second>(),
            ),
        ]
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Target {
    pub x: LengthTarget,
    pub y: LengthTarget,
    pub theta: AngleTarget,
}

impl Target {
    /// Sideways velocity in the robot frame.
    ///
    /// Each axis is interpolated independently, so nothing keeps the motion aligned with
    /// the heading. A differential drive robot can only follow targets where this is zero.
    pub fn lateral_velocity(&self) -> Velocity {
        let sin_th = self.theta.x.value.sin();
        let cos_th = self.theta.x.value.cos();
        self.y.v * cos_th - self.x.v * sin_th
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LengthTarget {
    pub x: Length,
    pub v: Velocity,
    pub a: Acceleration,
    pub j: Jerk,
}

impl LengthTarget {
    fn from_cubic(coefficients: &CubicCoefficients, t: Time) -> Self {
        Self {
            x: Length::new::<meter>(coefficients.position(t)),
            v: Velocity::new::<meter_per_second>(coefficients.velocity(t)),
            a: Acceleration::new::<meter_per_second_squared>(coefficients.acceleration(t)),
            j: Jerk::new::<meter_per_second_cubed>(coefficients.jerk()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AngleTarget {
    pub x: Angle,
    pub v: AngularVelocity,
    pub a: AngularAcceleration,
    pub j: AngularJerk,
}

impl AngleTarget {
    fn from_cubic(coefficients: &CubicCoefficients, t: Time) -> Self {
        Self {
            x: Angle::new::<radian>(coefficients.position(t)),
            v: AngularVelocity::new::<radian_per_second>(coefficients.velocity(t)),
            a: AngularAcceleration::new::<radian_per_second_squared>(
                coefficients.acceleration(t),
            ),
            j: AngularJerk::new::<radian_per_second_cubed>(coefficients.jerk()),
        }
    }
}

/// Generates `[x, y, theta]` trajectories sampled every `period`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoseTrajectoryGenerator {
    period: Time,
}

impl PoseTrajectoryGenerator {
    pub fn new(period: Time) -> Self {
        Self { period }
    }

    pub fn generate(
        &self,
        start: &PoseBoundary,
        end: &PoseBoundary,
        t_f: Time,
    ) -> Result<PoseTrajectory, SolveError> {
        let len = sample_count(t_f, self.period, "period")?;
        let [x, y, theta] = solve_axes(start.axes(), end.axes(), t_f)?;
        Ok(PoseTrajectory {
            x,
            y,
            theta,
            t_f,
            period: self.period,
            index: 0,
            len,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PoseTrajectory {
    x: CubicCoefficients,
    y: CubicCoefficients,
    theta: CubicCoefficients,
    t_f: Time,
    period: Time,
    index: usize,
    len: usize,
}

impl PoseTrajectory {
    pub fn duration(&self) -> Time {
        self.t_f
    }

    pub fn coefficients(&self) -> [CubicCoefficients; 3] {
        [self.x, self.y, self.theta]
    }

    pub fn at(&self, t: Time) -> Target {
        Target {
            x: LengthTarget::from_cubic(&self.x, t),
            y: LengthTarget::from_cubic(&self.y, t),
            theta: AngleTarget::from_cubic(&self.theta, t),
        }
    }
}

impl Iterator for PoseTrajectory {
    type Item = Target;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.len {
            return None;
        }
        let t = self.period * self.index as f32;
        let t = if t > self.t_f { self.t_f } else { t };
        self.index += 1;
        Some(self.at(t))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rest = self.len - self.index;
        (rest, Some(rest))
    }
}

impl ExactSizeIterator for PoseTrajectory {}
