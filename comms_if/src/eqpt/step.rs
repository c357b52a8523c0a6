//! # Step Equipment Commands
//!
//! Requests and responses exchanged with the robot's step clipping and step actuation services.
//! All steps are relative footsteps, expressed in the frame of the support foot which stays on the
//! ground while the other leg swings.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A relative footstep as understood by the robot.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct StepTarget {
    /// Forward displacement of the swing foot in the support foot frame.
    ///
    /// Units: meters
    pub x_m: f64,

    /// Lateral displacement of the swing foot in the support foot frame, mirrored so that positive
    /// is always away from the support foot.
    ///
    /// Units: meters
    pub y_m: f64,

    /// Rotation of the swing foot relative to the support foot, mirrored like `y_m`.
    ///
    /// Units: radians
    pub theta_rad: f64,

    /// The leg which swings to perform the step.
    pub leg: Leg,
}

/// Request sent to the clipping service.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct ClipRequest {
    pub step: StepTarget,
}

/// The closest step to the request which the robot is able to perform.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct ClipResponse {
    pub step: StepTarget,
}

/// Request sent to the step actuation service.
#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct StepRequest {
    pub step: StepTarget,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A leg of the robot.
#[derive(Serialize, Deserialize, Debug, Hash, Eq, PartialEq, Copy, Clone)]
pub enum Leg {
    Left,
    Right,
}

/// Response from the step actuation service.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Eq, PartialEq)]
pub enum StepResponse {
    /// The step was accepted and will be executed
    StepOk,

    /// The step was invalid and has been rejected
    StepInvalid,

    /// Equipment is invalid so the step cannot be actuated
    EqptInvalid,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Leg {
    /// Return the other leg.
    pub fn opposite(self) -> Self {
        match self {
            Leg::Left => Leg::Right,
            Leg::Right => Leg::Left,
        }
    }
}

impl std::fmt::Display for Leg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Leg::Left => write!(f, "LEFT"),
            Leg::Right => write!(f, "RIGHT"),
        }
    }
}
