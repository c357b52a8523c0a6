//! Footstep execution parameters, loaded from `step_exec.toml`.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::step_service::ClipTolerance;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StepExecParams {
    /// Frame id of the right foot
    pub rfoot_frame_id: String,

    /// Frame id of the left foot
    pub lfoot_frame_id: String,

    /// Frame in which foot poses are looked up. Replaced by the frame of each received map.
    pub world_frame_id: String,

    /// Maximum time to wait for a foot transform
    ///
    /// Units: seconds
    pub pose_lookup_timeout_s: f64,

    /// Accepted difference between a requested step and its clipped counterpart
    pub accuracy: ClipTolerance,

    /// Period of the executable's main loop
    ///
    /// Units: seconds
    pub cycle_period_s: f64,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for StepExecParams {
    fn default() -> Self {
        Self {
            rfoot_frame_id: "/RFoot_link".into(),
            lfoot_frame_id: "/LFoot_link".into(),
            world_frame_id: "map".into(),
            pose_lookup_timeout_s: 0.1,
            accuracy: ClipTolerance::default(),
            cycle_period_s: 0.1,
        }
    }
}

impl StepExecParams {
    pub fn pose_lookup_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.pose_lookup_timeout_s.max(0.0))
    }

    pub fn cycle_period(&self) -> Duration {
        Duration::from_secs_f64(self.cycle_period_s.max(0.0))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_partial_params_use_defaults() {
        let params: StepExecParams = util::params::from_str(
            r#"
            world_frame_id = "odom"

            [accuracy]
            theta_rad = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(params.world_frame_id, "odom");
        assert_eq!(params.rfoot_frame_id, "/RFoot_link");
        assert_eq!(params.lfoot_frame_id, "/LFoot_link");
        assert!((params.accuracy.x_m - 0.005).abs() < 1e-12);
        assert!((params.accuracy.theta_rad - 0.1).abs() < 1e-12);
        assert_eq!(params.pose_lookup_timeout(), Duration::from_millis(100));
    }
}
