//! Shared tracking of the robot's foot poses.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, warn};
use serde::Serialize;
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use super::{FootTransform, LookupTime, PoseError, PoseSource, RobotTime};
use crate::footstep::{FootstepState, Leg};
use crate::params::StepExecParams;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// The last known pose of each foot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RobotPoseSnapshot {
    pub left: Option<FootTransform>,

    pub right: Option<FootTransform>,

    /// Robot time the start poses were taken at
    pub stamp: Option<RobotTime>,
}

/// Keeps the pose snapshot and the frames used to look it up.
///
/// All access to the snapshot goes through its lock, lookups on the source are made without
/// holding it.
pub struct PoseTracker {
    snapshot: Mutex<RobotPoseSnapshot>,

    robot_time: Mutex<Option<RobotTime>>,

    world_frame_id: RwLock<String>,

    rfoot_frame_id: String,

    lfoot_frame_id: String,

    lookup_timeout: Duration,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RobotPoseSnapshot {
    pub fn foot(&self, leg: Leg) -> Option<&FootTransform> {
        match leg {
            Leg::Left => self.left.as_ref(),
            Leg::Right => self.right.as_ref(),
        }
    }

    fn set_foot(&mut self, leg: Leg, tf: FootTransform) {
        match leg {
            Leg::Left => self.left = Some(tf),
            Leg::Right => self.right = Some(tf),
        }
    }
}

impl PoseTracker {
    pub fn new(params: &StepExecParams) -> Self {
        Self {
            snapshot: Mutex::new(RobotPoseSnapshot::default()),
            robot_time: Mutex::new(None),
            world_frame_id: RwLock::new(params.world_frame_id.clone()),
            rfoot_frame_id: params.rfoot_frame_id.clone(),
            lfoot_frame_id: params.lfoot_frame_id.clone(),
            lookup_timeout: params.pose_lookup_timeout(),
        }
    }

    /// Get a copy of the current snapshot.
    pub fn read(&self) -> Result<RobotPoseSnapshot, PoseError> {
        Ok(self.snapshot.lock()?.clone())
    }

    /// Modify the snapshot while holding its lock.
    pub fn write<T, F>(&self, f: F) -> Result<T, PoseError>
    where
        F: FnOnce(&mut RobotPoseSnapshot) -> T,
    {
        Ok(f(&mut *self.snapshot.lock()?))
    }

    /// Record that the robot produced a pose estimate at `time`. Older times are ignored.
    pub fn set_robot_time(&self, time: RobotTime) -> Result<(), PoseError> {
        let mut robot_time = self.robot_time.lock()?;
        if robot_time.map_or(true, |t| time > t) {
            *robot_time = Some(time);
        }
        Ok(())
    }

    /// The latest robot time known either to the tracker or to the source.
    pub fn robot_time(&self, source: &dyn PoseSource) -> Result<Option<RobotTime>, PoseError> {
        let own = *self.robot_time.lock()?;
        Ok(match (own, source.latest_robot_time()) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        })
    }

    pub fn world_frame_id(&self) -> Result<String, PoseError> {
        Ok(self.world_frame_id.read()?.clone())
    }

    pub fn set_world_frame_id(&self, frame_id: &str) -> Result<(), PoseError> {
        let mut world = self.world_frame_id.write()?;
        if *world != frame_id {
            debug!("World frame changed from {} to {}", world, frame_id);
            *world = frame_id.to_string();
        }
        Ok(())
    }

    pub fn foot_frame_id(&self, leg: Leg) -> &str {
        match leg {
            Leg::Left => &self.lfoot_frame_id,
            Leg::Right => &self.rfoot_frame_id,
        }
    }

    /// Look up both feet at the latest robot time and store them as the new snapshot.
    ///
    /// Returns the `(right, left)` start placements. If either lookup fails the failed foot keeps
    /// its previous pose in the snapshot and an error is returned.
    pub fn update_start(
        &self,
        source: &dyn PoseSource,
    ) -> Result<(FootstepState, FootstepState), PoseError> {
        let robot_time = self.robot_time(source)?;
        let at = match robot_time {
            Some(t) => LookupTime::At(t),
            None => LookupTime::Latest,
        };

        let right = self.lookup(source, Leg::Right, at);
        let left = self.lookup(source, Leg::Left, at);

        self.write(|snapshot| {
            if let Some(ref tf) = right {
                snapshot.set_foot(Leg::Right, *tf);
            }
            if let Some(ref tf) = left {
                snapshot.set_foot(Leg::Left, *tf);
            }
            if right.is_some() && left.is_some() {
                snapshot.stamp = robot_time;
            }
        })?;

        match (right, left) {
            (Some(r), Some(l)) => Ok((
                r.to_footstep_state(Leg::Right),
                l.to_footstep_state(Leg::Left),
            )),
            (None, _) => Err(PoseError::FootUnavailable(Leg::Right)),
            (_, None) => Err(PoseError::FootUnavailable(Leg::Left)),
        }
    }

    /// Get the current pose of the support foot.
    ///
    /// On a failed lookup the last known pose is used, `None` means the foot has never been seen.
    pub fn support_foot(
        &self,
        source: &dyn PoseSource,
        leg: Leg,
    ) -> Result<Option<FootstepState>, PoseError> {
        let fresh = self.lookup(source, leg, LookupTime::Latest);

        self.write(|snapshot| {
            if let Some(tf) = fresh {
                snapshot.set_foot(leg, tf);
            }

            snapshot.foot(leg).map(|tf| tf.to_footstep_state(leg))
        })
    }

    fn lookup(&self, source: &dyn PoseSource, leg: Leg, at: LookupTime) -> Option<FootTransform> {
        let world = match self.world_frame_id() {
            Ok(w) => w,
            Err(e) => {
                warn!("Cannot read the world frame: {}", e);
                return None;
            }
        };

        match source.lookup(self.foot_frame_id(leg), &world, at, self.lookup_timeout) {
            Ok(tf) => Some(tf),
            Err(e) => {
                warn!("Failed to get the {} foot pose: {}", leg, e);
                None
            }
        }
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
