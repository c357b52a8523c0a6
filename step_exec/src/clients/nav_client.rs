//! # Navigation Client
//!
//! Receives goals and maps. The executable binds the socket so any number of publishers can
//! connect to it.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    nav::NavInput,
    net::{zmq, MonitoredSocket, NetParams, SocketOptions},
};

use super::ClientError;

// ------------------------------------------------------------------------------------------------
// CONSTANTS
// ------------------------------------------------------------------------------------------------

/// How long a call to `recv_input` waits for a message.
const RECV_TIMEOUT_MS: i32 = 10;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct NavClient {
    socket: MonitoredSocket,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl NavClient {
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, ClientError> {
        let socket = MonitoredSocket::new(
            ctx,
            zmq::SUB,
            SocketOptions {
                bind: true,
                ..SocketOptions::subscriber(RECV_TIMEOUT_MS)
            },
            &params.nav_endpoint,
        )?;

        Ok(Self { socket })
    }

    /// Get the next goal or map, or `None` if nothing has arrived.
    pub fn recv_input(&self) -> Result<Option<NavInput>, ClientError> {
        Ok(self.socket.recv_json()?)
    }
}
