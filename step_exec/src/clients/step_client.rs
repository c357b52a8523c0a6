//! # Step Client
//!
//! Sends steps to the robot's actuation service.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::step::{StepRequest, StepResponse},
    net::{zmq, MonitoredSocket, NetParams, SocketOptions},
};

use super::ClientError;
use crate::{
    footstep::RelativeFootstep,
    step_service::{StepActuator, StepServiceError},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct StepClient {
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl StepClient {
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, ClientError> {
        let socket = MonitoredSocket::new(
            ctx,
            zmq::REQ,
            SocketOptions::service_client(params.service_timeout_ms),
            &params.step_endpoint,
        )?;

        Ok(Self { socket })
    }
}

impl StepActuator for StepClient {
    fn perform(&mut self, step: &RelativeFootstep) -> Result<(), StepServiceError> {
        let response: StepResponse = self.socket.request(&StepRequest {
            step: (*step).into(),
        })?;

        match response {
            StepResponse::StepOk => Ok(()),
            r => Err(StepServiceError::Refused(r)),
        }
    }
}
