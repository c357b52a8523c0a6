//! # Pose Messages
//!
//! Messages published by the robot's pose server. Foot transforms are published for every tracked
//! frame, and a robot pose stamp is published whenever the localisation produces a new estimate.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A transform of one frame expressed in its parent frame at a given time.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StampedTransform {
    /// The frame being described, for example `/LFoot_link`
    pub frame_id: String,

    /// The frame the transform is expressed in, for example `map`
    pub parent_frame_id: String,

    /// Time at which the transform was valid
    pub stamp: DateTime<Utc>,

    /// Position of the frame origin in the parent frame
    ///
    /// Units: meters
    pub position_m: [f64; 3],

    /// Attitude of the frame in the parent frame, as a quaternion ordered `[x, y, z, w]`
    pub attitude_q: [f64; 4],
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Data published by the pose server
#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum PoseMsg {
    /// Latest transform of a tracked frame
    Transform(StampedTransform),

    /// The localisation produced a new robot pose at the given time
    RobotPose { stamp: DateTime<Utc> },
}
