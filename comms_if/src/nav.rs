//! # Navigation Interface
//!
//! Goals and maps arriving at the footstep executable, and the protocol used to talk to the
//! footstep planner.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::StructOpt;

use crate::eqpt::step::Leg;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An absolute goal pose in the world frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, StructOpt)]
#[structopt(setting = structopt::clap::AppSettings::AllowNegativeNumbers)]
pub struct NavGoal {
    /// The x-coordinate of the goal in the world frame (meters).
    pub x_m: f64,

    /// The y-coordinate of the goal in the world frame (meters).
    pub y_m: f64,

    /// The heading of the goal in the world frame (radians).
    pub theta_rad: f64,
}

/// An occupancy grid map. The contents are opaque to the footstep executable, which only reads
/// the frame id before forwarding the map to the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupancyGrid {
    /// Frame in which the map is expressed
    pub frame_id: String,

    /// Size of each cell
    ///
    /// Units: meters
    pub resolution_m: f64,

    /// Number of cells along the x axis
    pub width: u32,

    /// Number of cells along the y axis
    pub height: u32,

    /// Pose of cell (0, 0) in the map frame as `[x, y, theta]`
    pub origin: [f64; 3],

    /// Row-major occupancy values, -1 for unknown, 0 to 100 otherwise
    pub data: Vec<i8>,
}

/// An absolute foot placement on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FootPlacement {
    pub x_m: f64,
    pub y_m: f64,
    pub theta_rad: f64,
    pub leg: Leg,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Inputs arriving asynchronously at the executable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum NavInput {
    /// A new goal to walk to
    Goal(NavGoal),

    /// A new map of the environment
    Map(OccupancyGrid),
}

/// Requests sent to the footstep planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlannerRequest {
    /// Replace the planner's map
    SetMap(OccupancyGrid),

    /// Plan from scratch between the start feet and the goal
    Plan {
        start_right: FootPlacement,
        start_left: FootPlacement,
        goal: NavGoal,
    },

    /// Plan again from a new start, reusing whatever the planner kept from the last search
    Replan {
        start_right: FootPlacement,
        start_left: FootPlacement,
        goal: NavGoal,
    },
}

/// Responses from the footstep planner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PlannerResponse {
    /// The request was accepted and has no further payload
    Ack,

    /// A path was found, starting with the support foot placement
    Path(Vec<FootPlacement>),

    /// No path exists between start and goal
    NoPath,

    /// The request could not be handled
    Invalid,
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_goal_wire_format() {
        let input: NavInput =
            serde_json::from_str(r#"{"Goal":{"x_m":1.5,"y_m":-0.2,"theta_rad":0.3}}"#).unwrap();

        match input {
            NavInput::Goal(g) => assert_eq!(
                g,
                NavGoal {
                    x_m: 1.5,
                    y_m: -0.2,
                    theta_rad: 0.3
                }
            ),
            i => panic!("Expected a goal, got {:?}", i),
        }
    }

    #[test]
    fn test_planner_path_wire_format() {
        let resp: PlannerResponse = serde_json::from_str(
            r#"{"Path":[
                {"x_m":0.0,"y_m":-0.1,"theta_rad":0.0,"leg":"Right"},
                {"x_m":0.1,"y_m":0.1,"theta_rad":0.0,"leg":"Left"}
            ]}"#,
        )
        .unwrap();

        match resp {
            PlannerResponse::Path(p) => {
                assert_eq!(p.len(), 2);
                assert_eq!(p[0].leg, Leg::Right);
                assert_eq!(p[1].leg, Leg::Left);
            }
            r => panic!("Expected a path, got {:?}", r),
        }
    }
}
