//! # Clip Client
//!
//! Asks the robot's clipping service for the closest performable step.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    eqpt::step::{ClipRequest, ClipResponse},
    net::{zmq, MonitoredSocket, NetParams, SocketOptions},
};

use super::ClientError;
use crate::{
    footstep::RelativeFootstep,
    step_service::{FeasibilityCheck, StepServiceError},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct ClipClient {
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl ClipClient {
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, ClientError> {
        let socket = MonitoredSocket::new(
            ctx,
            zmq::REQ,
            SocketOptions::service_client(params.service_timeout_ms),
            &params.clip_endpoint,
        )?;

        Ok(Self { socket })
    }
}

impl FeasibilityCheck for ClipClient {
    fn clip(&mut self, request: &RelativeFootstep) -> Result<RelativeFootstep, StepServiceError> {
        let response: ClipResponse = self.socket.request(&ClipRequest {
            step: (*request).into(),
        })?;

        Ok(response.step.into())
    }
}
