//! # Clients
//!
//! Network clients for the services the executable depends on. Each client implements one of the
//! collaborator traits so the execution manager never sees the transport.
//!
//! | Client           | Socket | Implements         |
//! |------------------|--------|--------------------|
//! | [`ClipClient`]   | REQ    | `FeasibilityCheck` |
//! | [`StepClient`]   | REQ    | `StepActuator`     |
//! | [`PlannerClient`]| REQ    | `Planner`          |
//! | [`PoseClient`]   | SUB    | `PoseSource`       |
//! | [`NavClient`]    | SUB    | -                  |

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

mod clip_client;
mod nav_client;
mod planner_client;
mod pose_client;
mod step_client;

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::net::{MonitoredSocketError, RequestError};

// ------------------------------------------------------------------------------------------------
// EXPORTS
// ------------------------------------------------------------------------------------------------

pub use clip_client::ClipClient;
pub use nav_client::NavClient;
pub use planner_client::PlannerClient;
pub use pose_client::PoseClient;
pub use step_client::StepClient;

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Socket error: {0}")]
    SocketError(#[from] MonitoredSocketError),

    #[error("Could not start the background thread: {0}")]
    SpawnError(std::io::Error),

    #[error("Could not receive a message: {0}")]
    RecvError(#[from] RequestError),
}
