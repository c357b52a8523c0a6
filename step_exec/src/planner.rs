//! # Footstep Planner Interface
//!
//! The planner searches for a sequence of foot placements from the current start feet to a goal.
//! The executable never looks inside the search, it only sets up the problem and reads the
//! resulting path.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use comms_if::{
    nav::{NavGoal, OccupancyGrid},
    net::RequestError,
};
use thiserror::Error;

use crate::footstep::{FootstepState, PathError, PlannedPath};

// ------------------------------------------------------------------------------------------------
// TRAITS
// ------------------------------------------------------------------------------------------------

pub trait Planner: Send {
    /// Set the goal of the next search.
    fn set_goal(&mut self, goal: &NavGoal) -> Result<(), PlannerError>;

    /// Set the start feet of the next search.
    fn set_start(&mut self, right: &FootstepState, left: &FootstepState)
        -> Result<(), PlannerError>;

    /// Search from scratch. On success [`Planner::path`] holds the new path.
    fn plan(&mut self) -> Result<(), PlannerError>;

    /// Search again from the current start, reusing what is left from the previous search.
    fn replan(&mut self) -> Result<(), PlannerError>;

    /// The last path found.
    fn path(&self) -> &PlannedPath;

    /// Replace the map the planner searches in.
    fn set_map(&mut self, map: OccupancyGrid) -> Result<(), PlannerError>;
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("No goal has been set")]
    NoGoal,

    #[error("No start has been set")]
    NoStart,

    #[error("The goal is not valid: {0:?}")]
    InvalidGoal(NavGoal),

    #[error("No path exists between the start and the goal")]
    NoPathFound,

    #[error("The planner rejected the request")]
    Rejected,

    #[error("The planner returned an invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("Could not communicate with the planner: {0}")]
    ServiceError(#[from] RequestError),
}
