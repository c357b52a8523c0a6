//! # Planner Client
//!
//! Runs footstep searches on the remote planner. The goal and start are kept locally and sent
//! along with each search request.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    nav::{FootPlacement, NavGoal, OccupancyGrid, PlannerRequest, PlannerResponse},
    net::{zmq, MonitoredSocket, NetParams, SocketOptions},
};
use log::debug;

use super::ClientError;
use crate::{
    footstep::{FootstepState, PlannedPath},
    planner::{Planner, PlannerError},
};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

pub struct PlannerClient {
    socket: MonitoredSocket,

    goal: Option<NavGoal>,

    /// `(right, left)` start feet
    start: Option<(FootPlacement, FootPlacement)>,

    path: PlannedPath,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PlannerClient {
    pub fn new(ctx: &zmq::Context, params: &NetParams) -> Result<Self, ClientError> {
        let socket = MonitoredSocket::new(
            ctx,
            zmq::REQ,
            SocketOptions::service_client(params.planner_timeout_ms),
            &params.planner_endpoint,
        )?;

        Ok(Self {
            socket,
            goal: None,
            start: None,
            path: PlannedPath::default(),
        })
    }

    fn search(&mut self, replan: bool) -> Result<(), PlannerError> {
        let goal = self.goal.ok_or(PlannerError::NoGoal)?;
        let (start_right, start_left) = self.start.ok_or(PlannerError::NoStart)?;

        let request = if replan {
            PlannerRequest::Replan {
                start_right,
                start_left,
                goal,
            }
        } else {
            PlannerRequest::Plan {
                start_right,
                start_left,
                goal,
            }
        };

        let response: PlannerResponse = self.socket.request(&request)?;
        self.path = path_from_response(response)?;

        debug!("Planner returned {} placements", self.path.len());

        Ok(())
    }
}

impl Planner for PlannerClient {
    fn set_goal(&mut self, goal: &NavGoal) -> Result<(), PlannerError> {
        if !(goal.x_m.is_finite() && goal.y_m.is_finite() && goal.theta_rad.is_finite()) {
            return Err(PlannerError::InvalidGoal(*goal));
        }

        self.goal = Some(*goal);
        Ok(())
    }

    fn set_start(
        &mut self,
        right: &FootstepState,
        left: &FootstepState,
    ) -> Result<(), PlannerError> {
        self.start = Some(((*right).into(), (*left).into()));
        Ok(())
    }

    fn plan(&mut self) -> Result<(), PlannerError> {
        self.search(false)
    }

    fn replan(&mut self) -> Result<(), PlannerError> {
        self.search(true)
    }

    fn path(&self) -> &PlannedPath {
        &self.path
    }

    fn set_map(&mut self, map: OccupancyGrid) -> Result<(), PlannerError> {
        let response: PlannerResponse = self.socket.request(&PlannerRequest::SetMap(map))?;

        match response {
            PlannerResponse::Ack => Ok(()),
            _ => Err(PlannerError::Rejected),
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn path_from_response(response: PlannerResponse) -> Result<PlannedPath, PlannerError> {
    match response {
        PlannerResponse::Path(placements) => Ok(PlannedPath::new(
            placements.into_iter().map(FootstepState::from).collect(),
        )?),
        PlannerResponse::NoPath => Err(PlannerError::NoPathFound),
        PlannerResponse::Ack | PlannerResponse::Invalid => Err(PlannerError::Rejected),
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
