//! Step feasibility checking.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::StepServiceError;
use crate::footstep::RelativeFootstep;

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

/// Anything which can tell what part of a step the robot is able to perform.
pub trait FeasibilityCheck: Send {
    /// Return the closest step to `request` which the robot can perform.
    fn clip(&mut self, request: &RelativeFootstep) -> Result<RelativeFootstep, StepServiceError>;
}

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// How far a clipped step may be from the request and still count as the same step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipTolerance {
    /// Units: meters
    pub x_m: f64,

    /// Units: meters
    pub y_m: f64,

    /// Units: radians
    pub theta_rad: f64,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Outcome of checking a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepVerdict {
    /// The step can be performed, the clipped values should be sent to the robot
    Performable(RelativeFootstep),

    /// The step cannot be performed. `clipped` is empty if the clipping service did not answer.
    Rejected {
        requested: RelativeFootstep,
        clipped: Option<RelativeFootstep>,
    },
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for ClipTolerance {
    fn default() -> Self {
        Self {
            x_m: 0.005,
            y_m: 0.005,
            theta_rad: 0.05,
        }
    }
}

impl ClipTolerance {
    /// Whether the clipped step is close enough to the request to be performed in its place.
    ///
    /// Bounds are inclusive and the legs must match.
    pub fn performable(&self, requested: &RelativeFootstep, clipped: &RelativeFootstep) -> bool {
        requested.leg == clipped.leg
            && (requested.dx_m - clipped.dx_m).abs() <= self.x_m
            && (requested.dy_m - clipped.dy_m).abs() <= self.y_m
            && (requested.dtheta_rad - clipped.dtheta_rad).abs() <= self.theta_rad
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Ask the checker to clip `request` and decide if the result is still the requested step.
///
/// A service failure is treated as a rejection.
pub fn check_step(
    checker: &mut dyn FeasibilityCheck,
    request: &RelativeFootstep,
    tolerance: &ClipTolerance,
) -> StepVerdict {
    let clipped = match checker.clip(request) {
        Ok(c) => c,
        Err(e) => {
            warn!("Could not check {}: {}", request, e);
            return StepVerdict::Rejected {
                requested: *request,
                clipped: None,
            };
        }
    };

    debug!("Requested {}, clipped to {}", request, clipped);

    if tolerance.performable(request, &clipped) {
        StepVerdict::Performable(clipped)
    } else {
        StepVerdict::Rejected {
            requested: *request,
            clipped: Some(clipped),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::footstep::Leg;

    /// Moves every request by a fixed offset, or fails if no offset is given.
    struct OffsetClipper(Option<(f64, f64, f64)>);

    impl FeasibilityCheck for OffsetClipper {
        fn clip(
            &mut self,
            request: &RelativeFootstep,
        ) -> Result<RelativeFootstep, StepServiceError> {
            match self.0 {
                Some((dx, dy, dt)) => Ok(RelativeFootstep {
                    dx_m: request.dx_m + dx,
                    dy_m: request.dy_m + dy,
                    dtheta_rad: request.dtheta_rad + dt,
                    leg: request.leg,
                }),
                None => Err(StepServiceError::Timeout),
            }
        }
    }

    fn step(dx: f64, dy: f64, dtheta: f64) -> RelativeFootstep {
        RelativeFootstep {
            dx_m: dx,
            dy_m: dy,
            dtheta_rad: dtheta,
            leg: Leg::Left,
        }
    }

    #[test]
    fn test_performable_bounds() {
        let tol = ClipTolerance::default();
        let req = step(0.1, 0.05, 0.0);

        assert!(tol.performable(&req, &req));
        assert!(tol.performable(&req, &step(0.104, 0.046, 0.049)));
        assert!(!tol.performable(&req, &step(0.106, 0.05, 0.0)));
        assert!(!tol.performable(&req, &step(0.1, 0.044, 0.0)));
        assert!(!tol.performable(&req, &step(0.1, 0.05, -0.06)));

        let mut other_leg = req;
        other_leg.leg = Leg::Right;
        assert!(!tol.performable(&req, &other_leg));
    }

    #[test]
    fn test_tighter_tolerance_is_stricter() {
        let loose = ClipTolerance::default();
        let tight = ClipTolerance {
            x_m: 0.001,
            y_m: 0.001,
            theta_rad: 0.01,
        };
        let req = step(0.2, -0.1, 0.3);

        let candidates = [
            step(0.2, -0.1, 0.3),
            step(0.2009, -0.1, 0.3),
            step(0.203, -0.098, 0.33),
            step(0.21, -0.1, 0.3),
        ];

        for c in candidates.iter() {
            if tight.performable(&req, c) {
                assert!(loose.performable(&req, c));
            }
        }
    }

    #[test]
    fn test_check_step_uses_clipped_values() {
        let mut clipper = OffsetClipper(Some((0.003, 0.0, 0.0)));
        let req = step(0.1, 0.05, 0.0);

        match check_step(&mut clipper, &req, &ClipTolerance::default()) {
            StepVerdict::Performable(s) => assert!((s.dx_m - 0.103).abs() < 1e-12),
            v => panic!("Expected a performable step, got {:?}", v),
        }
    }

    #[test]
    fn test_check_step_rejections() {
        let req = step(0.1, 0.05, 0.0);

        let mut far = OffsetClipper(Some((0.01, 0.0, 0.0)));
        match check_step(&mut far, &req, &ClipTolerance::default()) {
            StepVerdict::Rejected { clipped: Some(c), .. } => {
                assert!((c.dx_m - 0.11).abs() < 1e-12)
            }
            v => panic!("Expected a rejection, got {:?}", v),
        }

        let mut silent = OffsetClipper(None);
        assert_eq!(
            check_step(&mut silent, &req, &ClipTolerance::default()),
            StepVerdict::Rejected {
                requested: req,
                clipped: None
            }
        );
    }
}
