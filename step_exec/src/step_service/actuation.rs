//! Step actuation.

use super::StepServiceError;
use crate::footstep::RelativeFootstep;

/// Anything which can make the robot perform a step.
pub trait StepActuator: Send {
    /// Perform the step. Returns once the robot has accepted it.
    fn perform(&mut self, step: &RelativeFootstep) -> Result<(), StepServiceError>;
}
