//! # Footsteps
//!
//! Absolute foot placements as produced by the planner, steps relative to the support foot as
//! consumed by the robot, and the paths which chain placements together.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod geometry;
mod path;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{eqpt::step::StepTarget, nav::FootPlacement};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use comms_if::eqpt::step::Leg;
pub use path::{PathError, PlannedPath};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An absolute foot placement in the world frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FootstepState {
    /// Units: meters
    pub x_m: f64,

    /// Units: meters
    pub y_m: f64,

    /// Heading of the foot, in (-pi, pi].
    ///
    /// Units: radians
    pub theta_rad: f64,

    /// The leg which is placed here
    pub leg: Leg,
}

/// A step expressed in the frame of the support foot.
///
/// The lateral and angular parts are mirrored for right-leg steps, so a step outwards from the
/// support foot has the same sign whichever leg swings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativeFootstep {
    /// Units: meters
    pub dx_m: f64,

    /// Units: meters
    pub dy_m: f64,

    /// Units: radians
    pub dtheta_rad: f64,

    /// The leg which swings
    pub leg: Leg,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl FootstepState {
    /// Create a new placement, wrapping the heading into (-pi, pi].
    pub fn new(x_m: f64, y_m: f64, theta_rad: f64, leg: Leg) -> Self {
        Self {
            x_m,
            y_m,
            theta_rad: util::maths::wrap_to_pi(theta_rad),
            leg,
        }
    }
}

impl From<FootPlacement> for FootstepState {
    fn from(p: FootPlacement) -> Self {
        Self::new(p.x_m, p.y_m, p.theta_rad, p.leg)
    }
}

impl From<FootstepState> for FootPlacement {
    fn from(s: FootstepState) -> Self {
        Self {
            x_m: s.x_m,
            y_m: s.y_m,
            theta_rad: s.theta_rad,
            leg: s.leg,
        }
    }
}

impl std::fmt::Display for FootstepState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at ({:.3}, {:.3}, {:.3})",
            self.leg, self.x_m, self.y_m, self.theta_rad
        )
    }
}

impl From<StepTarget> for RelativeFootstep {
    fn from(t: StepTarget) -> Self {
        Self {
            dx_m: t.x_m,
            dy_m: t.y_m,
            dtheta_rad: t.theta_rad,
            leg: t.leg,
        }
    }
}

impl From<RelativeFootstep> for StepTarget {
    fn from(s: RelativeFootstep) -> Self {
        Self {
            x_m: s.dx_m,
            y_m: s.dy_m,
            theta_rad: s.dtheta_rad,
            leg: s.leg,
        }
    }
}

impl std::fmt::Display for RelativeFootstep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} step ({:.3}, {:.3}, {:.3})",
            self.leg, self.dx_m, self.dy_m, self.dtheta_rad
        )
    }
}
