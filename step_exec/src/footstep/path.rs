//! Planned footstep paths.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::Serialize;
use thiserror::Error;

use super::FootstepState;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// An ordered sequence of foot placements, legs alternating.
///
/// The first placement is where the support foot already stands, it is never commanded.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlannedPath {
    states: Vec<FootstepState>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq)]
pub enum PathError {
    #[error("Placement {0} is followed by another placement for the {1} leg")]
    LegsNotAlternating(usize, super::Leg),
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl PlannedPath {
    pub fn new(states: Vec<FootstepState>) -> Result<Self, PathError> {
        for (i, pair) in states.windows(2).enumerate() {
            if pair[0].leg == pair[1].leg {
                return Err(PathError::LegsNotAlternating(i, pair[0].leg));
            }
        }

        Ok(Self { states })
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn states(&self) -> &[FootstepState] {
        &self.states
    }

    /// Number of steps which would be commanded to walk this path.
    pub fn num_steps(&self) -> usize {
        self.states.len().saturating_sub(1)
    }

    /// Iterate over the steps of the path as `(planned support, target)` pairs, skipping the
    /// initial support placement.
    pub fn steps(&self) -> impl Iterator<Item = (&FootstepState, &FootstepState)> {
        self.states.windows(2).map(|w| (&w[0], &w[1]))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
