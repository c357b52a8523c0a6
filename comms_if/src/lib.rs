//! # Communications interface crate.
//!
//! Provides the wire types exchanged between the footstep executable and the robot-side services,
//! along with the networking layer used to carry them.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Request and response definitions for robot equipment (step clipping, step actuation, poses)
pub mod eqpt;

/// Navigation inputs (goals, maps) and the planner protocol
pub mod nav;

/// Network module
pub mod net;
