//! # Footstep execution library.
//!
//! Walks a biped robot along a planned footstep path. Each planned placement is turned into a step
//! relative to the foot the robot is currently standing on, checked against what the robot can
//! physically perform, and handed to the robot. Steps the robot cannot perform trigger a replan
//! from wherever the feet actually are.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Footstep types, relative step geometry and planned paths
pub mod footstep;

/// Robot pose tracking - foot transforms and the shared pose snapshot
pub mod pose;

/// Footstep planner interface
pub mod planner;

/// Step services - feasibility checking (clipping) and actuation
pub mod step_service;

/// Execution manager - the walking state machine
pub mod exec_mgr;

/// Network clients for the robot-side services
pub mod clients;

/// Executable parameters
pub mod params;
