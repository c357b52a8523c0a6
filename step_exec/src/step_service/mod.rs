//! # Step Services
//!
//! The robot exposes two services for walking: a clipping service which returns the closest step
//! to a request that the robot can physically perform, and an actuation service which performs
//! it.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod actuation;
mod feasibility;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{eqpt::step::StepResponse, net::RequestError};
use thiserror::Error;

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use actuation::StepActuator;
pub use feasibility::{check_step, ClipTolerance, FeasibilityCheck, StepVerdict};

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StepServiceError {
    #[error("The service did not respond in time")]
    Timeout,

    #[error("The service is not connected")]
    NotConnected,

    #[error("The robot refused the step: {0:?}")]
    Refused(StepResponse),

    #[error("Could not communicate with the service: {0}")]
    Transport(RequestError),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl From<RequestError> for StepServiceError {
    fn from(e: RequestError) -> Self {
        match e {
            RequestError::Timeout => StepServiceError::Timeout,
            RequestError::NotConnected => StepServiceError::NotConnected,
            e => StepServiceError::Transport(e),
        }
    }
}
