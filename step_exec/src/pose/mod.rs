//! # Robot Pose
//!
//! Foot poses come from a [`PoseSource`], which resolves a foot frame in the world frame. The
//! [`PoseTracker`] keeps the last known pose of each foot so the executable can carry on with a
//! slightly stale pose when a lookup fails.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod tracker;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use nalgebra::{UnitQuaternion, Vector3};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

use crate::footstep::{FootstepState, Leg};

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use tracker::{PoseTracker, RobotPoseSnapshot};

// ------------------------------------------------------------------------------------------------
// TYPES
// ------------------------------------------------------------------------------------------------

/// The robot's clock, as stamped on pose messages.
pub type RobotTime = DateTime<Utc>;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// A source of foot poses.
pub trait PoseSource: Send + Sync {
    /// Resolve `foot_frame_id` in `world_frame_id`, waiting at most `timeout` for a transform
    /// valid at `at`.
    fn lookup(
        &self,
        foot_frame_id: &str,
        world_frame_id: &str,
        at: LookupTime,
        timeout: Duration,
    ) -> Result<FootTransform, PoseError>;

    /// Time of the most recent robot pose estimate, if the source tracks one.
    fn latest_robot_time(&self) -> Option<RobotTime> {
        None
    }
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The pose of a foot in the world frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FootTransform {
    /// Units: meters
    pub position_m: Vector3<f64>,

    pub attitude_q: UnitQuaternion<f64>,

    /// Time the transform was valid, if known
    pub stamp: Option<RobotTime>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Which transform a lookup should return.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LookupTime {
    /// The most recent transform available
    Latest,

    /// A transform valid at or after the given time
    At(RobotTime),
}

#[derive(Debug, Error)]
pub enum PoseError {
    #[error("No transform from {foot} to {world} was available within the timeout")]
    Timeout { foot: String, world: String },

    #[error("The pose source has stopped")]
    SourceStopped,

    #[error("Could not get the {0} foot pose")]
    FootUnavailable(Leg),

    #[error("Pose data poisoned, a thread panicked while holding the lock")]
    PoisonError,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FootTransform {
    pub fn new(position_m: Vector3<f64>, attitude_q: UnitQuaternion<f64>) -> Self {
        Self {
            position_m,
            attitude_q,
            stamp: None,
        }
    }

    /// Build a flat transform from a 2D pose, useful when the foot is known to be on the ground.
    pub fn from_planar(x_m: f64, y_m: f64, theta_rad: f64) -> Self {
        Self::new(
            Vector3::new(x_m, y_m, 0.0),
            UnitQuaternion::from_euler_angles(0.0, 0.0, theta_rad),
        )
    }

    /// Heading of the foot about the world z axis.
    pub fn yaw(&self) -> f64 {
        self.attitude_q.euler_angles().2
    }

    /// Project the transform onto the ground plane.
    pub fn to_footstep_state(&self, leg: Leg) -> FootstepState {
        FootstepState::new(self.position_m[0], self.position_m[1], self.yaw(), leg)
    }
}

impl<T> From<std::sync::PoisonError<T>> for PoseError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        PoseError::PoisonError
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_yaw_ignores_small_tilt() {
        let tf = FootTransform::new(
            Vector3::new(1.0, -0.5, 0.02),
            UnitQuaternion::from_euler_angles(0.01, -0.02, 0.7),
        );

        let state = tf.to_footstep_state(Leg::Left);

        assert!((state.x_m - 1.0).abs() < 1e-12);
        assert!((state.y_m + 0.5).abs() < 1e-12);
        assert!((state.theta_rad - 0.7).abs() < 1e-9);
        assert_eq!(state.leg, Leg::Left);
    }
}
