//! Hypothesis-based patch tracking for event cameras.
//!
//! An event camera reports per-pixel brightness changes `(t, x, y, p)`
//! instead of frames. A [`HypothesisTracker`] follows a small image patch
//! around a seeded feature through such a stream, producing a trajectory of
//! patch states `(t, x, y, theta)`. Four tracker variants share one
//! per-event state machine and differ in how they score candidate patch
//! poses against a learned brightness template.

use nalgebra::{SMatrix, SVector};

pub mod event_window;
pub mod hypotheses;
pub mod initialize;
pub mod interpolator;
pub mod tracker;

mod correlation_tracker;
mod errors;
mod haste_correlation_tracker;
mod haste_difference_tracker;
mod haste_difference_star_tracker;

pub use crate::correlation_tracker::CorrelationTracker;
pub use crate::errors::{Error, Result};
pub use crate::event_window::{EventWindow, WindowEvent};
pub use crate::haste_correlation_tracker::HasteCorrelationTracker;
pub use crate::haste_difference_star_tracker::HasteDifferenceStarTracker;
pub use crate::haste_difference_tracker::HasteDifferenceTracker;
pub use crate::hypotheses::{Hypotheses, Hypothesis, HypothesisPerturbation};
pub use crate::tracker::{EventUpdate, HypothesisTracker, TrackerStatus};

pub use patch_tracker_types::{Location, Orientation, Time};

/// Floating type of templates, models, weights and scores.
pub type Scalar = f32;

/// Side length of the tracked patch, in pixels.
pub const PATCH_SIZE: usize = 31;

/// Half patch side, truncated. Doubles as the spatial gating radius.
pub const PATCH_SIZE_HALF: usize = PATCH_SIZE / 2;

/// Number of events retained in the window: `2 * floor(0.2 * P^2 / 2) + 1`.
pub const EVENT_WINDOW_SIZE: usize = 2 * (PATCH_SIZE * PATCH_SIZE / 10) + 1;

/// Index of the temporally centered event in a full window.
pub const MIDDLE_EVENT_IDX: usize = (EVENT_WINDOW_SIZE - 1) / 2;

/// Number of candidate hypotheses scored per event.
pub const NUM_HYPOTHESES: usize = hypotheses::PERTURBATIONS.len();

/// Index of the null (current-state) hypothesis.
pub const NULL_HYPOTHESIS_IDX: usize = 0;

/// Minimum normalized score margin required to depart from the null
/// hypothesis.
pub const HYSTERESIS_FACTOR: Scalar = 0.05;

/// Boost applied to the middle-event weight when updating the template.
pub const TEMPLATE_UPDATE_FACTOR: Scalar = 4.0;

/// Uniform per-event template weight, `1 / N`.
pub const UNITARY_EVENT_WEIGHT: Scalar = 1.0 / EVENT_WINDOW_SIZE as Scalar;

/// A `P x P` patch-shaped array, indexed `(x, y)`.
pub type Patch = SMatrix<Scalar, PATCH_SIZE, PATCH_SIZE>;

/// A vector parallel to the event window, ordered oldest to newest.
pub type WindowVector = SVector<Scalar, EVENT_WINDOW_SIZE>;

/// Per-hypothesis score vector.
pub type ScoreVector = SVector<Scalar, NUM_HYPOTHESES>;

/// Per-hypothesis, per-window-event template samples.
pub type SamplesStack = SMatrix<Scalar, NUM_HYPOTHESES, EVENT_WINDOW_SIZE>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_constants_derive_from_patch_size() {
        assert_eq!(PATCH_SIZE, 31);
        assert_eq!(PATCH_SIZE_HALF, 15);
        assert_eq!(EVENT_WINDOW_SIZE, 193);
        assert_eq!(MIDDLE_EVENT_IDX, 96);
        assert_eq!(NUM_HYPOTHESES, 11);
    }
}
