//! Conversion between absolute placements and relative footsteps.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use util::maths::{get_ang_dist, wrap_to_pi};

use super::{FootstepState, Leg, RelativeFootstep};

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl RelativeFootstep {
    /// Compute the step taking the swing leg from anywhere to `target`, while standing on
    /// `support`.
    ///
    /// The swing leg is `target.leg`. Only the pose of `support` is used, its leg field is
    /// ignored.
    pub fn between(support: &FootstepState, target: &FootstepState) -> Self {
        let (sin_t, cos_t) = support.theta_rad.sin_cos();
        let dx_w = target.x_m - support.x_m;
        let dy_w = target.y_m - support.y_m;

        let dx_m = cos_t * dx_w + sin_t * dy_w;
        let dy_m = -sin_t * dx_w + cos_t * dy_w;
        let dtheta_rad = get_ang_dist(support.theta_rad, target.theta_rad);

        let (dy_m, dtheta_rad) = mirror(target.leg, dy_m, dtheta_rad);

        Self {
            dx_m,
            dy_m,
            dtheta_rad,
            leg: target.leg,
        }
    }

    /// Where the swing foot lands when this step is taken from `support`.
    pub fn apply_to(&self, support: &FootstepState) -> FootstepState {
        let (dy_m, dtheta_rad) = mirror(self.leg, self.dy_m, self.dtheta_rad);
        let (sin_t, cos_t) = support.theta_rad.sin_cos();

        FootstepState {
            x_m: support.x_m + cos_t * self.dx_m - sin_t * dy_m,
            y_m: support.y_m + sin_t * self.dx_m + cos_t * dy_m,
            theta_rad: wrap_to_pi(support.theta_rad + dtheta_rad),
            leg: self.leg,
        }
    }
}

// ------------------------------------------------------------------------------------------------
// FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Steps of the right leg are mirrored about the support foot's x axis. The operation is its own
/// inverse.
fn mirror(swing: Leg, dy_m: f64, dtheta_rad: f64) -> (f64, f64) {
    match swing {
        Leg::Left => (dy_m, dtheta_rad),
        Leg::Right => (-dy_m, -dtheta_rad),
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
