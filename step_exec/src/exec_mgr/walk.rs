//! Records of each walk, saved into the session for later analysis.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use comms_if::nav::NavGoal;
use serde::Serialize;

use super::WalkOutcome;
use crate::footstep::{FootstepState, PlannedPath, RelativeFootstep};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Everything that happened while walking towards one goal.
#[derive(Debug, Clone, Serialize)]
pub struct WalkRecord {
    pub goal: NavGoal,

    pub start_time: DateTime<Utc>,

    pub end_time: Option<DateTime<Utc>>,

    /// The initial path followed by one path per replan
    pub paths: Vec<PlannedPath>,

    pub steps: Vec<StepRecord>,

    pub outcome: Option<WalkOutcome>,
}

/// One step of a walk.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// Where the path expected the support foot to be
    pub planned_support: FootstepState,

    /// Where the support foot actually was
    pub actual_support: FootstepState,

    pub target: FootstepState,

    pub requested: RelativeFootstep,

    /// Empty if the clipping service did not respond
    pub clipped: Option<RelativeFootstep>,

    /// If the step was handed to the robot and accepted
    pub performed: bool,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl WalkRecord {
    pub fn new(goal: NavGoal) -> Self {
        Self {
            goal,
            start_time: Utc::now(),
            end_time: None,
            paths: Vec::new(),
            steps: Vec::new(),
            outcome: None,
        }
    }

    pub fn num_replans(&self) -> usize {
        self.paths.len().saturating_sub(1)
    }

    pub fn finish(&mut self, outcome: WalkOutcome) {
        self.end_time = Some(Utc::now());
        self.outcome = Some(outcome);
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
